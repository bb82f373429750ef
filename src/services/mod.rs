pub mod api_client;
pub mod auth_service;
pub mod config_service;
pub mod error;
pub mod file_service;

pub use api_client::{ApiClient, StaticToken, TokenSource};
pub use error::{ApiError, ApiResult};
