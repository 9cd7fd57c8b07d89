#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("State file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Timestamp format error: {0}")]
    Timestamp(#[from] time::error::Format),
}
