use std::io::{self, Write};

use crate::stats::types::{PipelineResult, QualityScore};

const BAR_CELLS: usize = 20;

const HEADERS: [&str; 8] = [
    "Connection",
    "PacketLoss %",
    "Jitter ms (avg)",
    "Bitrate kbps (sum)",
    "FrameDrop %",
    "Retransmit %",
    "Pause Count",
    "Score",
];

/// `[################....]  80`, one cell per 5 points.
pub fn score_bar(score: QualityScore) -> String {
    let filled = (score.value() as usize * BAR_CELLS + 50) / 100;
    format!(
        "[{}{}] {:>3}",
        "#".repeat(filled),
        ".".repeat(BAR_CELLS - filled),
        score.value()
    )
}

fn pass_fail(pass: bool) -> &'static str {
    if pass {
        "PASS"
    } else {
        "FAIL"
    }
}

fn write_table(writer: &mut impl Write, rows: &[Vec<String>]) -> io::Result<()> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|column| {
            rows.iter()
                .filter_map(|row| row.get(column))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    for row in rows {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        writeln!(writer, "{}", line.trim_end())?;
    }

    Ok(())
}

pub fn render(result: &PipelineResult, writer: &mut impl Write) -> io::Result<()> {
    let overall = &result.overall;

    writeln!(writer, "Quality Report")?;
    writeln!(writer)?;
    writeln!(writer, "Overall Score {}", score_bar(overall.score))?;
    writeln!(writer)?;

    let mut rows: Vec<Vec<String>> =
        vec![HEADERS.iter().map(|header| header.to_string()).collect()];
    rows.extend(result.connections.iter().map(|(id, report)| {
        let metrics = &report.metrics;
        vec![
            report.label.clone().unwrap_or_else(|| id.clone()),
            format!("{:.2}", metrics.packet_loss_pct),
            format!("{:.2}", metrics.jitter_ms_avg),
            format!("{:.2}", metrics.bitrate_kbps),
            format!("{:.2}", metrics.frame_drop_pct),
            format!("{:.2}", metrics.retransmit_pct),
            metrics.pause_count.to_string(),
            score_bar(report.score),
        ]
    }));
    write_table(writer, &rows)?;

    let metrics = &overall.metrics;
    writeln!(writer)?;
    writeln!(writer, "Analytics")?;
    writeln!(
        writer,
        "- Average packet loss across connections: {:.2}%",
        metrics.packet_loss_pct
    )?;
    writeln!(
        writer,
        "- Average jitter across connections: {:.2} ms",
        metrics.jitter_ms_avg
    )?;
    writeln!(writer, "- Total outbound bitrate: {:.2} kbps", metrics.bitrate_kbps)?;
    writeln!(
        writer,
        "- Average frame drop percentage: {:.2}%",
        metrics.frame_drop_pct
    )?;
    writeln!(
        writer,
        "- Average retransmission percentage: {:.2}%",
        metrics.retransmit_pct
    )?;
    writeln!(
        writer,
        "- Total pause-like events detected: {}",
        metrics.pause_count
    )?;
    if !metrics.limitation_reasons.is_empty() {
        let reasons = metrics
            .limitation_reasons
            .iter()
            .map(|(reason, count)| format!("{reason} x{count}"))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(writer, "- Quality limitation reasons: {reasons}")?;
    }

    writeln!(writer)?;
    writeln!(writer, "Connectivity: {}", pass_fail(overall.connectivity_pass))?;
    let mut rows = vec![vec![
        "Connection".to_string(),
        "ICE states".to_string(),
        "Result".to_string(),
    ]];
    rows.extend(result.connections.iter().map(|(id, report)| {
        vec![
            id.clone(),
            report.connectivity.states.join(" => "),
            pass_fail(report.connectivity.pass).to_string(),
        ]
    }));
    write_table(writer, &rows)
}
