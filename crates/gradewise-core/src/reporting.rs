use anyhow::{Context, Result};
use std::path::Path;

use crate::publisher::ScoreOutput;

/// Write the score document in pretty JSON format.
pub fn write_score_output_json(path: &Path, output: &ScoreOutput) -> Result<()> {
    let content = serde_json::to_string_pretty(output).context("serialize score output")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Read a score document written by [`write_score_output_json`].
pub fn read_score_output_json(path: &Path) -> Result<ScoreOutput> {
    let content = std::fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("parse score output {:?}", path))
}

/// Write the plain-text summary next to the JSON document.
pub fn write_human_summary(path: &Path, output: &ScoreOutput) -> Result<()> {
    std::fs::write(path, &output.human_summary).with_context(|| format!("write {:?}", path))?;
    Ok(())
}
