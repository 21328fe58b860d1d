//! Quality pipeline: snapshot extraction, classification, aggregation and
//! scoring of every connection in a dump, plus the combined overall view.
//!
//! The pipeline is pure and total. Connections without usable statistics end
//! up with zeroed metrics, which score 100: missing data is indistinguishable
//! from a perfect connection.

pub mod aggregate;
pub mod classifier;
pub mod connectivity;
pub mod label;
pub mod score;
pub mod snapshot;
pub mod types;

use tracing::*;

use crate::dump::types::{ConnectionTrace, DumpDocument};
use label::Labeler;
use types::{ConnectionMetrics, ConnectionReport, OverallReport, PipelineResult};

/// Compute metrics and scores for every connection of `document`.
pub fn compute(document: &DumpDocument) -> PipelineResult {
    compute_with(document, &Labeler::default())
}

#[instrument(level = "debug", skip_all, fields(format = %document.format(), connections = document.len()))]
pub fn compute_with(document: &DumpDocument, labeler: &Labeler) -> PipelineResult {
    let connections = document
        .connections()
        .map(|(id, trace)| (id.to_string(), analyze_connection(id, trace, labeler)))
        .collect::<std::collections::BTreeMap<_, _>>();

    let metrics = aggregate::combine(connections.values().map(|report| &report.metrics));
    let overall = OverallReport {
        score: score::score(&metrics),
        metrics,
        connection_count: connections.len(),
        connectivity_pass: connections
            .values()
            .all(|report| report.connectivity.pass),
    };

    debug!("Overall score: {}", overall.score);

    PipelineResult {
        connections,
        overall,
    }
}

#[instrument(level = "debug", skip(trace, labeler))]
pub fn analyze_connection(id: &str, trace: &ConnectionTrace, labeler: &Labeler) -> ConnectionReport {
    let metrics = match snapshot::extract(trace) {
        Some(snapshot) => aggregate::aggregate(&classifier::classify(&snapshot)),
        None => {
            debug!("No statistics snapshot found");
            ConnectionMetrics::default()
        }
    };

    let report = ConnectionReport {
        score: score::score(&metrics),
        metrics,
        label: labeler.label(trace.events()),
        connectivity: connectivity::connectivity(trace),
    };

    debug!(
        "Score {} (loss {:.2}%, jitter {:.2}ms, {} pause event(s))",
        report.score,
        report.metrics.packet_loss_pct,
        report.metrics.jitter_ms_avg,
        report.metrics.pause_count
    );

    report
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::dump::types::TraceEvent;

    fn get_stats(value: serde_json::Value) -> TraceEvent {
        TraceEvent::new(snapshot::GET_STATS_EVENT, value)
    }

    #[test]
    fn scores_each_connection_and_the_combination() {
        let document = DumpDocument::event_log([
            (
                "lossy".to_string(),
                vec![get_stats(json!({
                    "in": {"type": "inbound-rtp", "packetsLost": 10, "packetsReceived": 90}
                }))],
            ),
            (
                "worse".to_string(),
                vec![get_stats(json!({
                    "in": {"type": "inbound-rtp", "packetsLost": 20, "packetsReceived": 80},
                    "out": {"type": "outbound-rtp", "[bytesSent_in_bits/s]": 64000}
                }))],
            ),
        ]);

        let result = compute(&document);
        assert_eq!(result.connections["lossy"].score.value(), 80);
        assert_eq!(result.connections["worse"].score.value(), 60);

        let overall = &result.overall;
        assert_eq!(overall.connection_count, 2);
        assert!((overall.metrics.packet_loss_pct - 15.0).abs() < 1e-9);
        assert!((overall.metrics.bitrate_kbps - 64.0).abs() < 1e-9);
        assert_eq!(overall.score.value(), 70);
    }

    #[test]
    fn jitter_alone_costs_ten_points() {
        let document = DumpDocument::event_log([(
            "jittery".to_string(),
            vec![get_stats(json!({
                "in": {"type": "inbound-rtp", "jitter": 0.05}
            }))],
        )]);

        let report = &compute(&document).connections["jittery"];
        assert!((report.metrics.jitter_ms_avg - 50.0).abs() < 1e-9);
        assert_eq!(report.metrics.packet_loss_pct, 0.0);
        assert_eq!(report.metrics.pause_count, 0);
        assert_eq!(report.score.value(), 90);
    }

    #[test]
    fn connection_without_snapshot_scores_100() {
        let document = DumpDocument::event_log([(
            "silent".to_string(),
            vec![TraceEvent::new("createOffer", json!(null))],
        )]);

        let result = compute(&document);
        let report = &result.connections["silent"];
        assert_eq!(report.metrics, ConnectionMetrics::default());
        assert_eq!(report.score.value(), 100);
        assert_eq!(report.label, None);
        assert!(!report.connectivity.pass);
        assert!(!result.overall.connectivity_pass);
    }

    #[test]
    fn empty_document() {
        let result = compute(&DumpDocument::event_log([]));
        assert!(result.connections.is_empty());
        assert_eq!(result.overall.metrics, ConnectionMetrics::default());
        assert_eq!(result.overall.score.value(), 100);
        assert_eq!(result.overall.connection_count, 0);
        assert!(result.overall.connectivity_pass);
    }
}
