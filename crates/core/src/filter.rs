use serde::{Deserialize, Serialize};

use crate::model::{NormalizedRecord, Settings};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub filename: String,
}

impl FilterCriteria {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            filename: filename.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty() && self.value.is_empty() && self.filename.is_empty()
    }

    fn reduces_settings(&self) -> bool {
        !self.key.is_empty() || !self.value.is_empty()
    }

    pub fn reduce(&self, settings: &Settings) -> Settings {
        if !self.reduces_settings() {
            return settings.clone();
        }
        let key = self.key.to_lowercase();
        let value = self.value.to_lowercase();
        settings
            .iter()
            .filter(|(k, v)| {
                contains_folded(k, &key)
                    && (value.is_empty() || contains_folded(&v.to_string(), &value))
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn matches_origin(&self, origin: &str) -> bool {
        contains_folded(origin, &self.filename.to_lowercase())
    }

    pub fn apply(&self, record: &NormalizedRecord) -> Option<NormalizedRecord> {
        let settings = self.reduce(&record.settings);
        if settings.is_empty() || !self.matches_origin(&record.origin) {
            return None;
        }
        Some(NormalizedRecord {
            origin: record.origin.clone(),
            format: record.format,
            settings,
        })
    }
}

fn contains_folded(haystack: &str, lowered_needle: &str) -> bool {
    lowered_needle.is_empty() || haystack.to_lowercase().contains(lowered_needle)
}

pub fn filter(records: &[NormalizedRecord], criteria: &FilterCriteria) -> Vec<NormalizedRecord> {
    records
        .iter()
        .filter_map(|record| criteria.apply(record))
        .collect()
}

pub fn filter_stream(record: &NormalizedRecord, criteria: &FilterCriteria) -> NormalizedRecord {
    NormalizedRecord {
        origin: record.origin.clone(),
        format: record.format,
        settings: criteria.reduce(&record.settings),
    }
}
