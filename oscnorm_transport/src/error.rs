use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("malformed OSC packet: {0}")]
    Decode(String),
    #[error("cannot encode OSC message: {0}")]
    Encode(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;

pub(crate) fn decode_err(msg: impl Into<String>) -> TransportError {
    TransportError::Decode(msg.into())
}
