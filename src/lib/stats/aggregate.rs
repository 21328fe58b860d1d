use std::collections::BTreeMap;

use super::{
    classifier::Buckets,
    types::{ConnectionMetrics, StatsRecord, TrackDescriptor, TrackDirection},
};

// Cumulative counters.
const PACKETS_LOST: &str = "packetsLost";
const PACKETS_RECEIVED: &str = "packetsReceived";
const FRAMES_DROPPED: &str = "framesDropped";
const FRAMES_RECEIVED: &str = "framesReceived";
const PACKETS_SENT: &str = "packetsSent";
const RETRANSMITTED_PACKETS_SENT: &str = "retransmittedPacketsSent";
const JITTER: &str = "jitter";

// Derived fields computed by the capture layer, first match wins.
const BITRATE_BPS: &[&str] = &["[bytesSent_in_bits/s]", "[bytesSent/s]"];
const ROUND_TRIP_TIME_S: &[&str] = &[
    "[totalRoundTripTime/responsesReceived]",
    "[totalRoundTripTime/roundTripTimeMeasurements]",
];
const ENCODE_MS_PER_FRAME: &[&str] = &["[totalEncodeTime/framesEncoded_in_ms]"];
const DECODE_MS_PER_FRAME: &[&str] = &["[totalDecodeTime/framesDecoded_in_ms]"];
const JITTER_BUFFER_DELAY_MS: &[&str] = &["[jitterBufferDelay/jitterBufferEmittedCount_in_ms]"];
const PLAYOUT_DELAY_S: &[&str] = &["[totalPlayoutDelay/totalSamplesCount]"];
const AUDIO_LEVEL_RMS: &[&str] = &["[Audio_Level_in_RMS]"];
const PSNR_Y: &[&str] = &["[psnrSum.y/psnrMeasurements]"];

const ACTIVE: &str = "active";
const QUALITY_LIMITATION_REASON: &str = "qualityLimitationReason";
const NO_LIMITATION: &str = "none";

/// Running mean that reads as zero until something is pushed.
#[derive(Clone, Copy, Debug, Default)]
struct Mean {
    sum: f64,
    count: u32,
}

impl Mean {
    fn of<'a>(records: impl IntoIterator<Item = &'a StatsRecord>, fields: &[&str]) -> Self {
        records
            .into_iter()
            .filter_map(|record| record.first_number(fields))
            .fold(Self::default(), |mean, value| Self {
                sum: mean.sum + value,
                count: mean.count + 1,
            })
    }

    fn value(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum / self.count as f64
    }
}

fn sum(records: &[&StatsRecord], field: &str) -> f64 {
    records.iter().filter_map(|record| record.number(field)).sum()
}

/// `100 * part / total`, zero when there is no total, bounded to [0, 100].
fn percentage(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    (100.0 * part / total).clamp(0.0, 100.0)
}

fn limitation_reason(record: &StatsRecord) -> Option<&str> {
    record
        .text(QUALITY_LIMITATION_REASON)
        .filter(|reason| !reason.is_empty() && *reason != NO_LIMITATION)
}

/// An inactive sender/receiver and a reported quality limitation count as
/// separate pause-like events, so one record can contribute two.
fn pause_events(record: &StatsRecord) -> u32 {
    let inactive = record.boolean(ACTIVE) == Some(false);
    inactive as u32 + limitation_reason(record).is_some() as u32
}

fn track(direction: TrackDirection, record: &StatsRecord) -> TrackDescriptor {
    TrackDescriptor {
        direction,
        kind: record.label("kind"),
        mid: record.label("mid"),
        codec_id: record.label("codecId"),
    }
}

pub fn aggregate(buckets: &Buckets) -> ConnectionMetrics {
    let inbound = buckets.inbound.as_slice();
    let outbound = buckets.outbound.as_slice();

    let packets_lost = sum(inbound, PACKETS_LOST);
    let packets_received = sum(inbound, PACKETS_RECEIVED);
    let frames_dropped = sum(inbound, FRAMES_DROPPED);
    let frames_received = sum(inbound, FRAMES_RECEIVED);
    let packets_sent = sum(outbound, PACKETS_SENT);
    let retransmitted = sum(outbound, RETRANSMITTED_PACKETS_SENT);

    let bitrate_bps: f64 = outbound
        .iter()
        .filter_map(|record| record.first_number(BITRATE_BPS))
        .sum();

    let limitation_reasons = outbound.iter().filter_map(|record| limitation_reason(record)).fold(
        BTreeMap::new(),
        |mut reasons, reason| {
            *reasons.entry(reason.to_string()).or_insert(0) += 1;
            reasons
        },
    );

    let tracks = inbound
        .iter()
        .map(|record| track(TrackDirection::Inbound, record))
        .chain(
            outbound
                .iter()
                .map(|record| track(TrackDirection::Outbound, record)),
        )
        .collect();

    ConnectionMetrics {
        packet_loss_pct: percentage(packets_lost, packets_lost + packets_received),
        jitter_ms_avg: Mean::of(inbound.iter().copied(), &[JITTER]).value() * 1000.0,
        bitrate_kbps: bitrate_bps / 1000.0,
        frame_drop_pct: percentage(frames_dropped, frames_dropped + frames_received),
        retransmit_pct: percentage(retransmitted, packets_sent),
        avg_rtt_ms: Mean::of(
            outbound.iter().chain(&buckets.candidate_pair).copied(),
            ROUND_TRIP_TIME_S,
        )
        .value()
            * 1000.0,
        encode_ms_per_frame: Mean::of(outbound.iter().copied(), ENCODE_MS_PER_FRAME).value(),
        decode_ms_per_frame: Mean::of(inbound.iter().copied(), DECODE_MS_PER_FRAME).value(),
        jitter_buffer_delay_ms: Mean::of(inbound.iter().copied(), JITTER_BUFFER_DELAY_MS).value(),
        playout_delay_ms: Mean::of(buckets.playout.iter().copied(), PLAYOUT_DELAY_S).value() * 1000.0,
        audio_level_rms: Mean::of(inbound.iter().copied(), AUDIO_LEVEL_RMS).value(),
        psnr_y: Mean::of(outbound.iter().copied(), PSNR_Y).value(),
        pause_count: inbound
            .iter()
            .chain(outbound)
            .map(|record| pause_events(record))
            .sum(),
        limitation_reasons,
        tracks,
    }
}

/// Combine per-connection metrics into one overall set: bitrate, pause count
/// and limitation reasons add up, every other metric is averaged.
pub fn combine<'a>(metrics: impl IntoIterator<Item = &'a ConnectionMetrics>) -> ConnectionMetrics {
    let (total, count) = metrics.into_iter().fold(
        (ConnectionMetrics::default(), 0_u32),
        |(mut total, count), metrics| {
            total.packet_loss_pct += metrics.packet_loss_pct;
            total.jitter_ms_avg += metrics.jitter_ms_avg;
            total.bitrate_kbps += metrics.bitrate_kbps;
            total.frame_drop_pct += metrics.frame_drop_pct;
            total.retransmit_pct += metrics.retransmit_pct;
            total.avg_rtt_ms += metrics.avg_rtt_ms;
            total.encode_ms_per_frame += metrics.encode_ms_per_frame;
            total.decode_ms_per_frame += metrics.decode_ms_per_frame;
            total.jitter_buffer_delay_ms += metrics.jitter_buffer_delay_ms;
            total.playout_delay_ms += metrics.playout_delay_ms;
            total.audio_level_rms += metrics.audio_level_rms;
            total.psnr_y += metrics.psnr_y;
            total.pause_count += metrics.pause_count;
            for (reason, occurrences) in &metrics.limitation_reasons {
                *total.limitation_reasons.entry(reason.clone()).or_insert(0) += occurrences;
            }
            total.tracks.extend(metrics.tracks.iter().cloned());
            (total, count + 1)
        },
    );

    let n = count.max(1) as f64;

    ConnectionMetrics {
        packet_loss_pct: total.packet_loss_pct / n,
        jitter_ms_avg: total.jitter_ms_avg / n,
        frame_drop_pct: total.frame_drop_pct / n,
        retransmit_pct: total.retransmit_pct / n,
        avg_rtt_ms: total.avg_rtt_ms / n,
        encode_ms_per_frame: total.encode_ms_per_frame / n,
        decode_ms_per_frame: total.decode_ms_per_frame / n,
        jitter_buffer_delay_ms: total.jitter_buffer_delay_ms / n,
        playout_delay_ms: total.playout_delay_ms / n,
        audio_level_rms: total.audio_level_rms / n,
        psnr_y: total.psnr_y / n,
        ..total
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::stats::{
        classifier::classify,
        types::{Snapshot, StatsRecord},
    };

    const EPSILON: f64 = 1e-9;

    fn metrics_of(records: Vec<StatsRecord>) -> ConnectionMetrics {
        let snapshot: Snapshot = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| (format!("r{index}"), record))
            .collect();
        aggregate(&classify(&snapshot))
    }

    fn inbound() -> StatsRecord {
        StatsRecord::new("inbound-rtp")
    }

    fn outbound() -> StatsRecord {
        StatsRecord::new("outbound-rtp")
    }

    #[test]
    fn empty_buckets_give_zero_metrics() {
        assert_eq!(metrics_of(Vec::new()), ConnectionMetrics::default());
    }

    #[test]
    fn packet_loss_and_jitter() {
        let metrics = metrics_of(vec![inbound()
            .with_field("packetsLost", 5)
            .with_field("packetsReceived", 95)
            .with_field("jitter", 0.01)]);

        assert!((metrics.packet_loss_pct - 5.0).abs() < EPSILON);
        assert!((metrics.jitter_ms_avg - 10.0).abs() < EPSILON);
        assert_eq!(
            ConnectionMetrics {
                packet_loss_pct: 0.0,
                jitter_ms_avg: 0.0,
                tracks: Vec::new(),
                ..metrics
            },
            ConnectionMetrics::default()
        );
    }

    #[test]
    fn counters_sum_across_records() {
        let metrics = metrics_of(vec![
            inbound()
                .with_field("packetsLost", 10)
                .with_field("packetsReceived", 90)
                .with_field("framesDropped", 3)
                .with_field("framesReceived", 27)
                .with_field("jitter", 0.02),
            inbound()
                .with_field("packetsLost", 0)
                .with_field("packetsReceived", 100)
                .with_field("framesReceived", 30)
                .with_field("jitter", "0.5"),
        ]);

        assert!((metrics.packet_loss_pct - 5.0).abs() < EPSILON);
        assert!((metrics.frame_drop_pct - 5.0).abs() < EPSILON);
        // The string jitter does not count towards the mean.
        assert!((metrics.jitter_ms_avg - 20.0).abs() < EPSILON);
    }

    #[test]
    fn ratios_with_zero_totals_are_zero() {
        let metrics = metrics_of(vec![
            inbound().with_field("packetsLost", 0).with_field("packetsReceived", 0),
            outbound().with_field("retransmittedPacketsSent", 4),
        ]);

        assert_eq!(metrics.packet_loss_pct, 0.0);
        assert_eq!(metrics.frame_drop_pct, 0.0);
        assert_eq!(metrics.retransmit_pct, 0.0);
    }

    #[test]
    fn ratios_stay_within_percent_bounds() {
        let metrics = metrics_of(vec![
            inbound().with_field("packetsLost", -20).with_field("packetsReceived", 10),
            outbound()
                .with_field("packetsSent", 10)
                .with_field("retransmittedPacketsSent", 30),
        ]);

        assert!((0.0..=100.0).contains(&metrics.packet_loss_pct));
        assert_eq!(metrics.retransmit_pct, 100.0);
    }

    #[test]
    fn outbound_bitrate_and_retransmissions() {
        let metrics = metrics_of(vec![
            outbound()
                .with_field("packetsSent", 200)
                .with_field("retransmittedPacketsSent", 10)
                .with_field("[bytesSent_in_bits/s]", 1_500_000),
            outbound()
                .with_field("packetsSent", 200)
                .with_field("[bytesSent/s]", 500_000),
            outbound().with_field("bytesSent", 123_456),
        ]);

        assert!((metrics.retransmit_pct - 2.5).abs() < EPSILON);
        assert!((metrics.bitrate_kbps - 2000.0).abs() < EPSILON);
    }

    #[test]
    fn derived_means() {
        let metrics = metrics_of(vec![
            outbound()
                .with_field("[totalRoundTripTime/roundTripTimeMeasurements]", 0.04)
                .with_field("[totalEncodeTime/framesEncoded_in_ms]", 4.0)
                .with_field("[psnrSum.y/psnrMeasurements]", 38.0),
            StatsRecord::new("candidate-pair")
                .with_field("[totalRoundTripTime/responsesReceived]", 0.02),
            inbound()
                .with_field("[totalDecodeTime/framesDecoded_in_ms]", 2.0)
                .with_field("[jitterBufferDelay/jitterBufferEmittedCount_in_ms]", 60.0)
                .with_field("[Audio_Level_in_RMS]", 0.25),
            inbound().with_field("[totalDecodeTime/framesDecoded_in_ms]", 4.0),
            StatsRecord::new("media-playout")
                .with_field("[totalPlayoutDelay/totalSamplesCount]", 0.015),
        ]);

        assert!((metrics.avg_rtt_ms - 30.0).abs() < EPSILON);
        assert!((metrics.encode_ms_per_frame - 4.0).abs() < EPSILON);
        assert!((metrics.decode_ms_per_frame - 3.0).abs() < EPSILON);
        assert!((metrics.jitter_buffer_delay_ms - 60.0).abs() < EPSILON);
        assert!((metrics.playout_delay_ms - 15.0).abs() < EPSILON);
        assert!((metrics.audio_level_rms - 0.25).abs() < EPSILON);
        assert!((metrics.psnr_y - 38.0).abs() < EPSILON);
    }

    #[test]
    fn inactive_and_limited_record_counts_twice() {
        // Both conditions on one record add up; this is the reference behavior.
        let metrics = metrics_of(vec![outbound()
            .with_field("active", false)
            .with_field("qualityLimitationReason", "cpu")]);

        assert_eq!(metrics.pause_count, 2);
        assert_eq!(metrics.limitation_reasons, BTreeMap::from([("cpu".to_string(), 1)]));
    }

    #[test]
    fn limitation_reasons_only_come_from_outbound() {
        let metrics = metrics_of(vec![
            inbound().with_field("qualityLimitationReason", "bandwidth"),
            outbound().with_field("qualityLimitationReason", "bandwidth"),
            outbound().with_field("qualityLimitationReason", "bandwidth"),
            outbound().with_field("qualityLimitationReason", "none"),
            outbound().with_field("active", true),
        ]);

        assert_eq!(metrics.pause_count, 3);
        assert_eq!(
            metrics.limitation_reasons,
            BTreeMap::from([("bandwidth".to_string(), 2)])
        );
    }

    #[test]
    fn tracks_copy_descriptors() {
        let metrics = metrics_of(vec![
            inbound()
                .with_field("kind", "audio")
                .with_field("mid", "0")
                .with_field("codecId", "CIT01_111"),
            outbound().with_field("kind", "video").with_field("mid", json!(1)),
        ]);

        assert_eq!(
            metrics.tracks,
            vec![
                TrackDescriptor {
                    direction: TrackDirection::Inbound,
                    kind: Some("audio".into()),
                    mid: Some("0".into()),
                    codec_id: Some("CIT01_111".into()),
                },
                TrackDescriptor {
                    direction: TrackDirection::Outbound,
                    kind: Some("video".into()),
                    mid: Some("1".into()),
                    codec_id: None,
                },
            ]
        );
    }

    #[test]
    fn combine_averages_and_sums() {
        let first = ConnectionMetrics {
            packet_loss_pct: 10.0,
            jitter_ms_avg: 20.0,
            bitrate_kbps: 300.0,
            pause_count: 1,
            limitation_reasons: BTreeMap::from([("cpu".to_string(), 1)]),
            ..Default::default()
        };
        let second = ConnectionMetrics {
            packet_loss_pct: 20.0,
            jitter_ms_avg: 40.0,
            bitrate_kbps: 700.0,
            pause_count: 2,
            limitation_reasons: BTreeMap::from([
                ("cpu".to_string(), 2),
                ("bandwidth".to_string(), 1),
            ]),
            ..Default::default()
        };

        let overall = combine([&first, &second]);
        assert!((overall.packet_loss_pct - 15.0).abs() < EPSILON);
        assert!((overall.jitter_ms_avg - 30.0).abs() < EPSILON);
        assert!((overall.bitrate_kbps - 1000.0).abs() < EPSILON);
        assert_eq!(overall.pause_count, 3);
        assert_eq!(
            overall.limitation_reasons,
            BTreeMap::from([("bandwidth".to_string(), 1), ("cpu".to_string(), 3)])
        );
    }

    #[test]
    fn combine_nothing_is_zero() {
        assert_eq!(combine([]), ConnectionMetrics::default());
    }
}
