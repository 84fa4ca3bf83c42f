use crate::config::ConfigError;
use crate::core::entry::ValidationError;
use crate::store::StoreError;
use thiserror::Error;

/// Failure reported by the messaging gateway while publishing a summary.
#[derive(Debug, Error)]
#[error("summary publish failed: {0}")]
pub struct SinkError(pub String);

/// Top-level error of ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
