use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::NormalizedRecord;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Table,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            other => anyhow::bail!("unknown output format '{other}' (expected text, json or table)"),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Table => "table",
        })
    }
}

pub fn render_records(records: &[NormalizedRecord], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(records)),
        OutputFormat::Json => render_json(records),
        OutputFormat::Table => Ok(render_table(records)),
    }
}

pub fn render_text(records: &[NormalizedRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&format!("File: {} [{}]\n", record.origin, record.format));
        for (key, value) in &record.settings {
            out.push_str(&format!("  {key} = {value}\n"));
        }
        if !record.is_stdin() {
            out.push_str("---\n");
        }
    }
    out
}

pub fn render_json(records: &[NormalizedRecord]) -> Result<String> {
    let mut payload =
        serde_json::to_string_pretty(records).context("failed to serialize scan results")?;
    payload.push('\n');
    Ok(payload)
}

pub fn render_table(records: &[NormalizedRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<40} | {:<20} | {:<30} | {:<8}\n",
        "File", "Setting", "Value", "Format"
    ));
    out.push_str(&"-".repeat(110));
    out.push('\n');
    for record in records {
        for (key, value) in &record.settings {
            out.push_str(&format!(
                "{:<40} | {:<20} | {:<30} | {:<8}\n",
                record.origin,
                key,
                value.to_string(),
                record.format.as_str()
            ));
        }
    }
    out
}
