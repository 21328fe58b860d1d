//! Rendering of a [`PipelineResult`] for people (text) or programs (JSON).

pub mod text;

use std::io::Write;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::stats::types::PipelineResult;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub fn render(result: &PipelineResult, format: OutputFormat, writer: &mut impl Write) -> Result<()> {
    match format {
        OutputFormat::Table => text::render(result, writer).context("Failed to write report"),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, result)
                .context("Failed to serialize report")?;
            writeln!(writer).context("Failed to write report")
        }
    }
}
