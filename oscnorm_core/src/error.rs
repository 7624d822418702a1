use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum OscNormError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid state: {0}")]
    State(String),
    #[error("io error: {0}")]
    Io(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("sample window must hold at least one sample")]
    ZeroWindow,
    #[error("listener queue depth must be >= 1")]
    ZeroQueue,
}

/// Why a configuration entry was not turned into a channel.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("null dataset reference")]
    NullReference,
    #[error("row {row:?} not found in table {table:?}")]
    RowNotFound { table: String, row: String },
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
