use serde_json::Value;

use super::types::Connectivity;
use crate::dump::types::ConnectionTrace;

/// State change events recorded by rtcstats.
const EVENT_LOG_STATE_EVENTS: &[&str] = &["oniceconnectionstatechange", "onconnectionstatechange"];
/// State change events recorded by webrtc-internals.
const SPARSE_LOG_STATE_EVENTS: &[&str] = &["iceconnectionstatechange", "connectionstatechange"];

fn state_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.replace('"', ""),
        Value::Null => String::new(),
        other => other.to_string().replace('"', ""),
    }
}

/// A connection passes once it reached `connected` or `completed`, unless it
/// ever `failed`.
pub fn connectivity(trace: &ConnectionTrace) -> Connectivity {
    let state_events = match trace {
        ConnectionTrace::EventLog(_) => EVENT_LOG_STATE_EVENTS,
        ConnectionTrace::SparseLog(_) => SPARSE_LOG_STATE_EVENTS,
    };

    let states: Vec<String> = trace
        .events()
        .iter()
        .filter(|event| state_events.contains(&event.typ.as_str()))
        .map(|event| state_text(&event.value))
        .collect();

    let reached = states
        .iter()
        .any(|state| matches!(state.as_str(), "connected" | "completed"));
    let failed = states.iter().any(|state| state == "failed");

    Connectivity {
        states,
        pass: reached && !failed,
    }
}
