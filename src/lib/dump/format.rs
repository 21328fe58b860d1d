use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level key holding the connections of an rtcstats-style event log dump.
pub const EVENT_LOG_KEY: &str = "peerConnections";
/// Top-level key holding the connections of a webrtc-internals style dump.
pub const SPARSE_LOG_KEY: &str = "PeerConnections";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DumpFormat {
    /// Each connection is an ordered list of events, snapshots included.
    EventLog,
    /// Each connection is an update log plus per-metric value histories.
    SparseLog,
}

impl DumpFormat {
    pub fn connections_key(&self) -> &'static str {
        match self {
            Self::EventLog => EVENT_LOG_KEY,
            Self::SparseLog => SPARSE_LOG_KEY,
        }
    }
}

impl std::fmt::Display for DumpFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EventLog => write!(f, "event-log"),
            Self::SparseLog => write!(f, "sparse-log"),
        }
    }
}

/// Classify a raw document by the shape of its top-level connection map.
pub fn detect(document: &Value) -> Option<DumpFormat> {
    let object = document.as_object()?;

    [DumpFormat::EventLog, DumpFormat::SparseLog]
        .into_iter()
        .find(|format| {
            object
                .get(format.connections_key())
                .is_some_and(Value::is_object)
        })
}
