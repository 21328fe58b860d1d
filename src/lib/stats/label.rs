use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dump::types::TraceEvent;

pub const TRANSCEIVER_MODIFIED_EVENT: &str = "transceiverModified";

lazy_static! {
    // webrtc-internals describes transceivers as text, e.g.
    // `receiver:{track:'a0', streams:['cam-1','mic-1']}`
    static ref RECEIVER_STREAMS: Regex =
        Regex::new(r#"receiver:\s*\{[^}]*?streams:\s*\[([^\]]*)\]"#).unwrap();
    static ref QUOTED: Regex = Regex::new(r#"'([^']*)'|"([^"]*)""#).unwrap();
}

/// A stream id pattern and the label given to connections receiving it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct LabelRule {
    pub pattern: String,
    pub label: String,
}

impl LabelRule {
    pub fn new(pattern: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            label: label.into(),
        }
    }

    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("(?i)camera", "Cameras"),
            Self::new("(?i)stream", "Streaming"),
        ]
    }
}

/// Names connections after the streams they receive. Advisory only.
#[derive(Clone, Debug)]
pub struct Labeler {
    rules: Vec<(Regex, String)>,
}

impl Default for Labeler {
    fn default() -> Self {
        Self::new(&LabelRule::defaults()).expect("default label rules are valid regexes")
    }
}

impl Labeler {
    pub fn new(rules: &[LabelRule]) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|rule| Ok((Regex::new(&rule.pattern)?, rule.label.clone())))
            .collect::<Result<_, regex::Error>>()?;

        Ok(Self { rules })
    }

    /// Label from the most recent transceiver update listing receiver
    /// streams. The first rule matching any stream id wins.
    pub fn label(&self, events: &[TraceEvent]) -> Option<String> {
        let stream_ids = events
            .iter()
            .rev()
            .filter(|event| event.typ == TRANSCEIVER_MODIFIED_EVENT)
            .map(|event| receiver_stream_ids(&event.value))
            .find(|ids| !ids.is_empty())?;

        self.rules
            .iter()
            .find(|(pattern, _)| stream_ids.iter().any(|id| pattern.is_match(id)))
            .map(|(_, label)| label.clone())
    }
}

/// Stream ids of a transceiver's receiver, from either a structured payload
/// (`{"receiver": {"streams": [...]}}`) or the textual description.
pub fn receiver_stream_ids(payload: &Value) -> Vec<String> {
    match payload {
        Value::Object(_) => payload
            .pointer("/receiver/streams")
            .and_then(Value::as_array)
            .map(|streams| {
                streams
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        Value::String(description) => RECEIVER_STREAMS
            .captures(description)
            .and_then(|captures| captures.get(1))
            .map(|streams| {
                QUOTED
                    .captures_iter(streams.as_str())
                    .filter_map(|quoted| quoted.get(1).or_else(|| quoted.get(2)))
                    .map(|id| id.as_str().to_string())
                    .filter(|id| !id.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}
