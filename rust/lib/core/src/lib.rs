pub mod config;
pub mod error;
pub mod types;

pub use config::{ConfigError, ServiceConfig};
pub use error::ServiceError;
pub use types::{new_id, now_rfc3339};
