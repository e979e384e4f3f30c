use thiserror::Error;

/// Startup failures. Every variant is fatal: the process exits before
/// serving any traffic.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("backend client construction failed: {0}")]
    Client(String),

    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}

impl ConfigError {
    /// Short error code for log correlation.
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Missing(_) => "CONFIG_MISSING",
            ConfigError::Invalid(_) => "CONFIG_INVALID",
            ConfigError::Client(_) => "CLIENT_BUILD_FAILED",
            ConfigError::Load(_) => "CONFIG_LOAD_FAILED",
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
