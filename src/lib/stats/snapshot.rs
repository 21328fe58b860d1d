use std::collections::BTreeMap;

use serde_json::Value;
use tracing::*;

use super::types::{scalar_text, Snapshot, StatsRecord};
use crate::dump::types::{timestamp_from_value, ConnectionTrace, SparseSeries, TraceEvent};

pub const GET_STATS_EVENT: &str = "getStats";

const TYPE_PROPERTY: &str = "type";
const TIMESTAMP_PROPERTY: &str = "timestamp";

/// Most recent statistics snapshot of a connection, if it has any.
pub fn extract(trace: &ConnectionTrace) -> Option<Snapshot> {
    match trace {
        ConnectionTrace::EventLog(events) => latest_get_stats(events),
        ConnectionTrace::SparseLog(trace) => {
            latest_get_stats(&trace.update_log).or_else(|| reconstruct(&trace.stats))
        }
    }
}

fn latest_get_stats(events: &[TraceEvent]) -> Option<Snapshot> {
    events
        .iter()
        .rev()
        .find(|event| event.typ == GET_STATS_EVENT)
        .map(|event| Snapshot::from_payload(&event.value))
}

/// Split an encoded sparse key into `(record id, property)`.
///
/// `RTCInboundRTPVideoStream_1-[bytesReceived_in_bits/s]` splits at the first
/// `[`, keeping the brackets in the property; `RTCCodec_1-mimeType` splits at
/// the last `-`. Keys yielding an empty half do not decode.
pub fn decode_key(key: &str) -> Option<(&str, &str)> {
    let (id, property) = match key.find('[') {
        Some(position) => (key[..position].trim_end_matches('-'), &key[position..]),
        None => key.rsplit_once('-')?,
    };

    if id.is_empty() || property.is_empty() {
        return None;
    }

    Some((id, property))
}

/// Latest reading of an encoded value history, which is either a JSON array
/// or a string holding one.
fn latest_reading(values: &Value) -> Option<Value> {
    match values {
        Value::Array(readings) => readings.last().cloned(),
        Value::String(encoded) => match serde_json::from_str::<Vec<Value>>(encoded) {
            Ok(mut readings) => readings.pop(),
            Err(error) => {
                debug!("Failed to parse readings {encoded:?}: {error}");
                None
            }
        },
        other => {
            debug!("Unexpected readings value: {other}");
            None
        }
    }
}

/// Rebuild a snapshot from per-metric histories, keeping only the latest
/// reading of each property.
pub fn reconstruct(stats: &BTreeMap<String, SparseSeries>) -> Option<Snapshot> {
    let mut records: BTreeMap<String, StatsRecord> = BTreeMap::new();

    for (key, series) in stats {
        let Some((id, property)) = decode_key(key) else {
            debug!("Skipping undecodable stats key {key:?}");
            continue;
        };

        if property == TIMESTAMP_PROPERTY {
            continue;
        }

        let Some(latest) = latest_reading(&series.values) else {
            debug!("Skipping stats key {key:?}: no readable values");
            continue;
        };

        let record = records
            .entry(id.to_string())
            .or_insert_with(|| StatsRecord::new(series.stats_type.as_str()));

        if property == TYPE_PROPERTY {
            record.typ = scalar_text(&latest);
        } else {
            record.fields.insert(property.to_string(), latest);
        }

        if record.timestamp.is_none() {
            record.timestamp = stats
                .get(&format!("{id}-{TIMESTAMP_PROPERTY}"))
                .and_then(|series| latest_reading(&series.values))
                .as_ref()
                .and_then(timestamp_from_value);
        }
    }

    if records.is_empty() {
        return None;
    }

    trace!("Reconstructed {} record(s) from sparse stats", records.len());

    Some(records.into_iter().collect())
}
