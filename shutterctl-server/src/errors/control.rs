use super::{StorageError, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Unknown window {0}")]
    UnknownWindow(usize),
}
