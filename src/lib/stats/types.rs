use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::dump::types::timestamp_from_value;

/// One statistics object (`inbound-rtp`, `candidate-pair`, ...) at one instant.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StatsRecord {
    #[serde(rename = "type")]
    pub typ: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    /// Field names may carry a derived-rate form such as `[bytesSent_in_bits/s]`.
    pub fields: BTreeMap<String, Value>,
}

impl StatsRecord {
    pub fn new(typ: impl Into<String>) -> Self {
        Self {
            typ: typ.into(),
            ..Default::default()
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Build a record from a `getStats` entry. `type` and `timestamp` are
    /// lifted out of the fields.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;

        let mut record = Self::new(object.get("type").map(scalar_text).unwrap_or_default());
        record.timestamp = object.get("timestamp").and_then(timestamp_from_value);
        record.fields = object
            .iter()
            .filter(|(name, _)| !matches!(name.as_str(), "type" | "timestamp"))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Some(record)
    }

    /// Only JSON numbers count, numeric strings do not.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(Value::as_f64)
    }

    /// The first of `names` holding a number.
    pub fn first_number(&self, names: &[&str]) -> Option<f64> {
        names.iter().find_map(|name| self.number(name))
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.fields.get(name).and_then(Value::as_bool)
    }

    /// Scalar field rendered as text, for identifiers that some captures
    /// store as numbers.
    pub fn label(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .filter(|value| !value.is_null())
            .map(scalar_text)
    }
}

pub(crate) fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// All statistics known for one connection at one instant, keyed by record id.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Snapshot {
    records: BTreeMap<String, StatsRecord>,
}

impl Snapshot {
    /// Reinterpret a `getStats` payload. Payloads given as a JSON string are
    /// parsed first. Entries that are not objects are ignored.
    pub fn from_payload(payload: &Value) -> Self {
        match payload {
            Value::Object(entries) => entries
                .iter()
                .filter_map(|(id, value)| Some((id.clone(), StatsRecord::from_value(value)?)))
                .collect(),
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(parsed @ Value::Object(_)) => Self::from_payload(&parsed),
                _ => Self::default(),
            },
            _ => Self::default(),
        }
    }

    pub fn records(&self) -> impl Iterator<Item = (&str, &StatsRecord)> {
        self.records.iter().map(|(id, record)| (id.as_str(), record))
    }

    pub fn record(&self, id: &str) -> Option<&StatsRecord> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<(String, StatsRecord)> for Snapshot {
    fn from_iter<T: IntoIterator<Item = (String, StatsRecord)>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum TrackDirection {
    Inbound,
    Outbound,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct TrackDescriptor {
    pub direction: TrackDirection,
    pub kind: Option<String>,
    pub mid: Option<String>,
    pub codec_id: Option<String>,
}

/// Quality metrics of one connection, or of all connections combined.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionMetrics {
    pub packet_loss_pct: f64,
    pub jitter_ms_avg: f64,
    pub bitrate_kbps: f64,
    pub frame_drop_pct: f64,
    pub retransmit_pct: f64,
    pub avg_rtt_ms: f64,
    pub encode_ms_per_frame: f64,
    pub decode_ms_per_frame: f64,
    pub jitter_buffer_delay_ms: f64,
    pub playout_delay_ms: f64,
    pub audio_level_rms: f64,
    pub psnr_y: f64,
    pub pause_count: u32,
    pub limitation_reasons: BTreeMap<String, u32>,
    pub tracks: Vec<TrackDescriptor>,
}

/// Composite quality, 0 (unusable) to 100 (no penalty applied).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize, TS)]
#[serde(from = "u8", into = "u8")]
pub struct QualityScore(u8);

impl QualityScore {
    pub const MAX: Self = Self(100);

    /// Values above 100 saturate.
    pub fn new(value: u8) -> Self {
        Self(value.min(Self::MAX.0))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl From<u8> for QualityScore {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl From<QualityScore> for u8 {
    fn from(score: QualityScore) -> Self {
        score.0
    }
}

impl std::fmt::Display for QualityScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Connectivity {
    /// ICE and peer connection states, in order of occurrence.
    pub states: Vec<String>,
    pub pass: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionReport {
    pub metrics: ConnectionMetrics,
    pub score: QualityScore,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub label: Option<String>,
    pub connectivity: Connectivity,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct OverallReport {
    pub metrics: ConnectionMetrics,
    /// Scored on the combined metrics, not averaged from per-connection scores.
    pub score: QualityScore,
    #[ts(type = "number")]
    pub connection_count: usize,
    pub connectivity_pass: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub connections: BTreeMap<String, ConnectionReport>,
    pub overall: OverallReport,
}
