use thiserror::Error;

#[derive(Debug, Error)]
pub enum ElectionError {
    #[error("storage error: {0}")]
    Storage(#[from] pemilu_store::StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid data: {0}")]
    Invalid(String),
}
