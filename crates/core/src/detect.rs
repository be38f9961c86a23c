use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::DecodeError;
use crate::flatten::{flatten, yaml_to_json};
use crate::model::{
    DiscoveredFile, Format, NormalizedRecord, SettingValue, Settings, ERROR_KEY, RAW_KEY,
    STDIN_ORIGIN, XML_KEY,
};
use crate::xml::parse_xml_tree;

#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub text: &'a str,
    pub trimmed: &'a str,
}

impl<'a> Candidate<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            trimmed: text.trim(),
        }
    }
}

pub struct Detector {
    pub format: Format,
    pub applies: fn(&Candidate<'_>) -> bool,
    pub parse: fn(&Candidate<'_>) -> Result<Settings, DecodeError>,
}

// JSON must stay ahead of YAML: a JSON object is also valid YAML flow syntax
pub const DETECTORS: &[Detector] = &[
    Detector {
        format: Format::Json,
        applies: looks_like_json,
        parse: sniff_json,
    },
    Detector {
        format: Format::Yaml,
        applies: looks_like_yaml,
        parse: sniff_yaml,
    },
    Detector {
        format: Format::Xml,
        applies: looks_like_xml,
        parse: sniff_xml,
    },
    Detector {
        format: Format::Text,
        applies: always,
        parse: sniff_key_values,
    },
];

pub fn detect_and_parse(bytes: &[u8]) -> (Settings, Format) {
    let text = String::from_utf8_lossy(bytes);
    let candidate = Candidate::new(&text);

    for detector in DETECTORS {
        if !(detector.applies)(&candidate) {
            continue;
        }
        match (detector.parse)(&candidate) {
            Ok(settings) => return (settings, detector.format),
            Err(err) => debug!(format = %detector.format, "detector rejected input: {err}"),
        }
    }

    let mut settings = Settings::new();
    settings.insert(RAW_KEY.to_string(), SettingValue::text(candidate.trimmed));
    (settings, Format::Raw)
}

pub fn format_for_path(path: &Path) -> Format {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "json" => Format::Json,
        "yaml" | "yml" => Format::Yaml,
        "xml" => Format::Xml,
        _ => Format::Text,
    }
}

pub fn parse_file(path: &Path) -> (Settings, Format) {
    let format = format_for_path(path);
    let settings = match read_and_decode(path, format) {
        Ok(settings) => settings,
        Err(err) => {
            debug!(path = %path.display(), "failed to normalize file: {err}");
            let mut settings = Settings::new();
            settings.insert(ERROR_KEY.to_string(), SettingValue::text(err.to_string()));
            settings
        }
    };
    (settings, format)
}

pub fn normalize_file(file: &DiscoveredFile) -> NormalizedRecord {
    let (settings, format) = parse_file(&file.path);
    NormalizedRecord::new(file.path.to_string_lossy(), format, settings)
}

pub fn normalize_bytes(bytes: &[u8]) -> NormalizedRecord {
    let (settings, format) = detect_and_parse(bytes);
    NormalizedRecord::new(STDIN_ORIGIN, format, settings)
}

fn read_and_decode(path: &Path, format: Format) -> Result<Settings, DecodeError> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    match format {
        Format::Json => mapping_or_empty(serde_json::from_str(&text)?, "JSON"),
        Format::Yaml => mapping_or_empty(yaml_to_json(&first_yaml_document(&text)?), "YAML"),
        Format::Xml => xml_settings(text.trim()),
        Format::Text | Format::Raw => Ok(parse_key_values(&text)),
    }
}

fn mapping_or_empty(value: Value, label: &'static str) -> Result<Settings, DecodeError> {
    match value {
        Value::Object(map) => Ok(flatten(&map)),
        Value::Null => Ok(Settings::new()),
        _ => Err(DecodeError::NotAMapping(label)),
    }
}

fn xml_settings(text: &str) -> Result<Settings, DecodeError> {
    let tree = parse_xml_tree(text)?;
    let mut settings = Settings::new();
    settings.insert(XML_KEY.to_string(), SettingValue::Tree(tree));
    Ok(settings)
}

pub fn parse_key_values(text: &str) -> Settings {
    let mut settings = Settings::new();
    for line in text.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        settings.insert(key.to_string(), SettingValue::text(value.trim()));
    }
    settings
}

fn looks_like_json(candidate: &Candidate<'_>) -> bool {
    candidate.trimmed.starts_with('{') || candidate.trimmed.starts_with('[')
}

fn looks_like_yaml(candidate: &Candidate<'_>) -> bool {
    candidate.trimmed.contains(':')
}

fn looks_like_xml(candidate: &Candidate<'_>) -> bool {
    candidate.trimmed.starts_with('<') && candidate.trimmed.ends_with('>')
}

fn always(_: &Candidate<'_>) -> bool {
    true
}

fn sniff_json(candidate: &Candidate<'_>) -> Result<Settings, DecodeError> {
    match serde_json::from_str(candidate.trimmed)? {
        Value::Object(map) => Ok(flatten(&map)),
        _ => Err(DecodeError::NotAMapping("JSON")),
    }
}

fn sniff_yaml(candidate: &Candidate<'_>) -> Result<Settings, DecodeError> {
    // untrimmed: leading indentation is significant
    match yaml_to_json(&first_yaml_document(candidate.text)?) {
        Value::Object(map) if map.is_empty() => Err(DecodeError::EmptyMapping("YAML")),
        Value::Object(map) => Ok(flatten(&map)),
        _ => Err(DecodeError::NotAMapping("YAML")),
    }
}

// later `---` documents in a stream are ignored
fn first_yaml_document(text: &str) -> Result<serde_yaml::Value, DecodeError> {
    match serde_yaml::Deserializer::from_str(text).next() {
        Some(document) => Ok(serde_yaml::Value::deserialize(document)?),
        None => Ok(serde_yaml::Value::Null),
    }
}

fn sniff_xml(candidate: &Candidate<'_>) -> Result<Settings, DecodeError> {
    xml_settings(candidate.trimmed)
}

fn sniff_key_values(candidate: &Candidate<'_>) -> Result<Settings, DecodeError> {
    let settings = parse_key_values(candidate.trimmed);
    if settings.is_empty() {
        return Err(DecodeError::NoPairs);
    }
    Ok(settings)
}
