mod chat_session;
mod document_set;
mod notify;

pub use chat_session::*;
pub use document_set::*;
pub use notify::*;
