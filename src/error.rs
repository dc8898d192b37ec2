use thiserror::Error;

use crate::config::ConfigError;
use crate::filter::FilterError;
use crate::guard::ValidationError;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Any failure raised by the retrieval layer.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Filter could not be compiled.
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),
    /// Query text was refused.
    #[error("query rejected: {0}")]
    Validation(#[from] ValidationError),
    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl RetrievalError {
    /// Machine-readable code of the underlying error.
    pub fn code(&self) -> &'static str {
        match self {
            RetrievalError::Filter(err) => err.code(),
            RetrievalError::Validation(err) => err.code(),
            RetrievalError::Config(_) => "ConfigError",
        }
    }
}
