use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::*;

use super::{
    error::{DumpError, Result},
    format::{self, DumpFormat},
    types::{DumpDocument, SparseSeries, SparseTrace, TraceEvent},
};

const UPDATE_LOG_KEY: &str = "updateLog";
const STATS_KEY: &str = "stats";

impl DumpDocument {
    /// Sniff the format of `document` and decode it.
    pub fn from_value(document: &Value) -> Result<Self> {
        let format = format::detect(document).ok_or(DumpError::UnrecognizedFormat)?;
        Self::from_value_as(document, format)
    }

    /// Decode `document` as `format`, without sniffing.
    ///
    /// Decoding is best effort below the connection map: every connection is
    /// kept, a malformed trace decodes as an empty one, and events and stats
    /// entries that do not decode are skipped.
    #[instrument(level = "debug", skip(document))]
    pub fn from_value_as(document: &Value, format: DumpFormat) -> Result<Self> {
        let connections = document
            .get(format.connections_key())
            .and_then(Value::as_object)
            .ok_or_else(|| DumpError::Shape {
                format,
                reason: format!("missing \"{}\" object", format.connections_key()),
            })?;

        let document = match format {
            DumpFormat::EventLog => Self::event_log(
                connections
                    .iter()
                    .map(|(id, trace)| (id.clone(), decode_event_log(id, trace))),
            ),
            DumpFormat::SparseLog => Self::sparse_log(
                connections
                    .iter()
                    .map(|(id, trace)| (id.clone(), decode_sparse_log(id, trace))),
            ),
        };

        debug!("Decoded {} connection(s)", document.len());

        Ok(document)
    }
}

fn decode_event_log(id: &str, trace: &Value) -> Vec<TraceEvent> {
    let Some(events) = trace.as_array() else {
        debug!("Connection {id:?} has no event list, keeping it empty");
        return Vec::new();
    };

    decode_events(id, events)
}

fn decode_sparse_log(id: &str, trace: &Value) -> SparseTrace {
    let update_log = match trace.get(UPDATE_LOG_KEY) {
        None => Vec::new(),
        Some(Value::Array(events)) => decode_events(id, events),
        Some(other) => {
            debug!("Connection {id:?} has a malformed {UPDATE_LOG_KEY:?}, keeping it empty: {other}");
            Vec::new()
        }
    };

    let stats = match trace.get(STATS_KEY) {
        None => BTreeMap::new(),
        Some(Value::Object(stats)) => stats
            .iter()
            .filter_map(|(key, series)| match SparseSeries::deserialize(series) {
                Ok(series) => Some((key.clone(), series)),
                Err(error) => {
                    debug!("Skipping stats key {key:?} of connection {id:?}: {error}");
                    None
                }
            })
            .collect(),
        Some(other) => {
            debug!("Connection {id:?} has malformed {STATS_KEY:?}, keeping them empty: {other}");
            BTreeMap::new()
        }
    };

    SparseTrace { update_log, stats }
}

fn decode_events(id: &str, events: &[Value]) -> Vec<TraceEvent> {
    events
        .iter()
        .enumerate()
        .filter_map(|(index, event)| match TraceEvent::deserialize(event) {
            Ok(event) => Some(event),
            Err(error) => {
                debug!("Skipping event #{index} of connection {id:?}: {error}");
                None
            }
        })
        .collect()
}
