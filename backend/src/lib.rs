pub mod config;
pub mod db;
pub mod detector;
pub mod error;
pub mod files;
pub mod imaging;
pub mod routes;
pub mod services;
pub mod storage;

pub use config::Config;
pub use error::{ApiError, ApiResult};
