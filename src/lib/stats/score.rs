use super::types::{ConnectionMetrics, QualityScore};

/// Loss costs two points per percent, up to this cap.
const PACKET_LOSS_CAP: f64 = 50.0;

const JITTER_THRESHOLD_MS: f64 = 30.0;
const JITTER_CAP: f64 = 25.0;

const FRAME_DROP_THRESHOLD_PCT: f64 = 5.0;
const FRAME_DROP_CAP: f64 = 15.0;

const RETRANSMIT_THRESHOLD_PCT: f64 = 2.0;
const RETRANSMIT_CAP: f64 = 10.0;

const PAUSE_CAP: f64 = 10.0;

/// Penalty-based quality score. Each factor is capped on its own, the sum of
/// the caps (110) can exceed 100 so the result is clamped.
pub fn score(metrics: &ConnectionMetrics) -> QualityScore {
    let mut points = 100.0;

    points -= PACKET_LOSS_CAP.min(metrics.packet_loss_pct * 2.0);

    if metrics.jitter_ms_avg > JITTER_THRESHOLD_MS {
        points -= JITTER_CAP.min((metrics.jitter_ms_avg - JITTER_THRESHOLD_MS) / 2.0);
    }

    if metrics.frame_drop_pct > FRAME_DROP_THRESHOLD_PCT {
        points -= FRAME_DROP_CAP.min((metrics.frame_drop_pct - FRAME_DROP_THRESHOLD_PCT) * 2.0);
    }

    if metrics.retransmit_pct > RETRANSMIT_THRESHOLD_PCT {
        points -= RETRANSMIT_CAP.min((metrics.retransmit_pct - RETRANSMIT_THRESHOLD_PCT) * 2.0);
    }

    if metrics.pause_count > 0 {
        points -= PAUSE_CAP.min(metrics.pause_count as f64 * 2.0);
    }

    // `round` goes half away from zero; NaN saturates to 0 in the cast.
    QualityScore::new(f64::round(points).clamp(0.0, 100.0) as u8)
}
