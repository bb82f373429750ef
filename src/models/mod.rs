mod chat;
mod paper;
mod workspace;

pub use chat::*;
pub use paper::*;
pub use workspace::*;
