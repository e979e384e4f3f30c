pub mod config;
pub mod error;
pub mod types;

pub use config::PriemConfig;
pub use error::ConfigError;
pub use types::{Message, Role, UserId};
