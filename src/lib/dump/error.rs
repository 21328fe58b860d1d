use std::path::PathBuf;

use super::format::DumpFormat;

pub type Result<T> = std::result::Result<T, DumpError>;

#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decompress gzip stream: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("Dump is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unrecognized dump format: expected a top-level \"peerConnections\" or \"PeerConnections\" object")]
    UnrecognizedFormat,

    #[error("Malformed {format} dump: {reason}")]
    Shape { format: DumpFormat, reason: String },
}
