use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::format::DumpFormat;

/// One entry of a connection trace, as written by the capture layer.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(from = "RawTraceEvent")]
pub struct TraceEvent {
    #[serde(rename = "type")]
    pub typ: String,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

/// Wire form of [`TraceEvent`]: webrtc-internals writes `time`, rtcstats
/// writes `timestamp`, and some captures carry both.
#[derive(Deserialize)]
struct RawTraceEvent {
    #[serde(rename = "type", default)]
    typ: String,
    #[serde(default)]
    value: Value,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    timestamp: Option<f64>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    time: Option<f64>,
}

impl From<RawTraceEvent> for TraceEvent {
    fn from(raw: RawTraceEvent) -> Self {
        Self {
            typ: raw.typ,
            value: raw.value,
            timestamp: raw.timestamp.or(raw.time),
        }
    }
}

impl TraceEvent {
    pub fn new(typ: impl Into<String>, value: Value) -> Self {
        Self {
            typ: typ.into(),
            value,
            timestamp: None,
        }
    }
}

/// History of one metric in the sparse format: its declared record type and
/// the encoded array of readings, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct SparseSeries {
    #[serde(rename = "statsType", default)]
    pub stats_type: String,
    #[serde(default)]
    pub values: Value,
}

impl SparseSeries {
    pub fn new(stats_type: impl Into<String>, values: Value) -> Self {
        Self {
            stats_type: stats_type.into(),
            values,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SparseTrace {
    pub update_log: Vec<TraceEvent>,
    /// Keyed by the encoded `<recordId>-<property>` key.
    pub stats: BTreeMap<String, SparseSeries>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConnectionTrace {
    EventLog(Vec<TraceEvent>),
    SparseLog(SparseTrace),
}

impl ConnectionTrace {
    /// Structural events of the connection, in order of occurrence.
    pub fn events(&self) -> &[TraceEvent] {
        match self {
            Self::EventLog(events) => events,
            Self::SparseLog(trace) => &trace.update_log,
        }
    }

    pub fn format(&self) -> DumpFormat {
        match self {
            Self::EventLog(_) => DumpFormat::EventLog,
            Self::SparseLog(_) => DumpFormat::SparseLog,
        }
    }
}

/// A fully materialized dump. All connections share the same format, which is
/// guaranteed by construction.
#[derive(Clone, Debug, PartialEq)]
pub struct DumpDocument {
    format: DumpFormat,
    connections: BTreeMap<String, ConnectionTrace>,
}

impl DumpDocument {
    pub fn event_log(connections: impl IntoIterator<Item = (String, Vec<TraceEvent>)>) -> Self {
        Self {
            format: DumpFormat::EventLog,
            connections: connections
                .into_iter()
                .map(|(id, events)| (id, ConnectionTrace::EventLog(events)))
                .collect(),
        }
    }

    pub fn sparse_log(connections: impl IntoIterator<Item = (String, SparseTrace)>) -> Self {
        Self {
            format: DumpFormat::SparseLog,
            connections: connections
                .into_iter()
                .map(|(id, trace)| (id, ConnectionTrace::SparseLog(trace)))
                .collect(),
        }
    }

    pub fn format(&self) -> DumpFormat {
        self.format
    }

    pub fn connections(&self) -> impl Iterator<Item = (&str, &ConnectionTrace)> {
        self.connections
            .iter()
            .map(|(id, trace)| (id.as_str(), trace))
    }

    pub fn connection(&self, id: &str) -> Option<&ConnectionTrace> {
        self.connections.get(id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

/// Numbers pass through, numeric strings are parsed, anything else is dropped.
pub(crate) fn timestamp_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(timestamp_from_value))
}
