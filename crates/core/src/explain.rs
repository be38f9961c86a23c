use serde::{Deserialize, Serialize};

use crate::model::{Format, NormalizedRecord, ERROR_KEY};

const SENSITIVE_MARKERS: &[&str] = &["password", "secret", "token", "credential", "api_key"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Explanation {
    pub origin: String,
    pub format: Format,
    pub key_count: usize,
    pub notes: Vec<String>,
}

pub fn explain_record(record: &NormalizedRecord) -> Explanation {
    let mut notes = Vec::new();

    if let Some(error) = record.error() {
        notes.push(format!("Could not be parsed as {}: {error}", record.format));
    }
    if record.settings.values().any(|value| value.is_tree()) {
        notes.push("XML content is kept as a single structured tree.".to_string());
    }
    if record.format == Format::Raw {
        notes.push("No known structure detected; content is shown raw.".to_string());
    }
    if let Some(key) = record
        .settings
        .keys()
        .find(|key| last_segment(key).eq_ignore_ascii_case("debug"))
    {
        notes.push(format!(
            "Debug flag present ({key} = {}); disable in production.",
            record.settings[key]
        ));
    }

    let sensitive = record
        .settings
        .keys()
        .filter(|key| key.as_str() != ERROR_KEY)
        .filter(|key| {
            let lowered = key.to_lowercase();
            SENSITIVE_MARKERS.iter().any(|marker| lowered.contains(marker))
        })
        .cloned()
        .collect::<Vec<_>>();
    if !sensitive.is_empty() {
        notes.push(format!(
            "Possibly sensitive keys: {}; ensure values are not exposed.",
            sensitive.join(", ")
        ));
    }

    Explanation {
        origin: record.origin.clone(),
        format: record.format,
        key_count: record.settings.len(),
        notes,
    }
}

fn last_segment(key: &str) -> &str {
    key.rsplit('.').next().unwrap_or(key)
}
