use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("request to sync endpoint failed: {0}")]
    Http(String),

    #[error("sync endpoint returned HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("sync endpoint rejected the envelope: {0}")]
    Rejected(String),

    #[error("snapshot collection failed: {0}")]
    Snapshot(#[from] pemilu_election::ElectionError),
}
