use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

pub const REPORT_VERSION: &str = "1.0.0";

pub const STDIN_ORIGIN: &str = "stdin";

pub const ERROR_KEY: &str = "error";

pub const XML_KEY: &str = "parsed_xml";

pub const RAW_KEY: &str = "raw";

pub type Settings = BTreeMap<String, SettingValue>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    Json,
    Yaml,
    Xml,
    Text,
    Raw,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Xml => "xml",
            Format::Text => "text",
            Format::Raw => "raw",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum SettingValue {
    Tree(XmlNode),
    Scalar(serde_json::Value),
}

impl SettingValue {
    pub fn text(value: impl Into<String>) -> Self {
        SettingValue::Scalar(serde_json::Value::String(value.into()))
    }

    pub fn as_scalar(&self) -> Option<&serde_json::Value> {
        match self {
            SettingValue::Scalar(value) => Some(value),
            SettingValue::Tree(_) => None,
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, SettingValue::Tree(_))
    }
}

impl<'de> Deserialize<'de> for SettingValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        // flattened settings never hold a mapping, so an object is an XML tree
        if value.is_object() {
            if let Ok(node) = serde_json::from_value::<XmlNode>(value.clone()) {
                return Ok(SettingValue::Tree(node));
            }
        }
        Ok(SettingValue::Scalar(value))
    }
}

impl From<serde_json::Value> for SettingValue {
    fn from(value: serde_json::Value) -> Self {
        SettingValue::Scalar(value)
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Scalar(serde_json::Value::String(text)) => f.write_str(text),
            SettingValue::Scalar(value) => write!(f, "{value}"),
            SettingValue::Tree(node) => write!(f, "{node}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct XmlNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<XmlNode>,
}

impl fmt::Display for XmlNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (name, value) in &self.attributes {
            write!(f, " {name}=\"{value}\"")?;
        }
        f.write_str(">")?;
        if let Some(text) = &self.text {
            f.write_str(text)?;
        }
        for child in &self.children {
            write!(f, "{child}")?;
        }
        write!(f, "</{}>", self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedRecord {
    #[serde(rename = "file")]
    pub origin: String,
    pub format: Format,
    pub settings: Settings,
}

impl NormalizedRecord {
    pub fn new(origin: impl Into<String>, format: Format, settings: Settings) -> Self {
        Self {
            origin: origin.into(),
            format,
            settings,
        }
    }

    pub fn is_stdin(&self) -> bool {
        self.origin == STDIN_ORIGIN
    }

    pub fn error(&self) -> Option<&SettingValue> {
        self.settings.get(ERROR_KEY)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanError {
    pub path: String,
    pub message: String,
}

impl ScanError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanReport {
    pub report_version: String,
    pub scan_id: String,
    pub generated_at: String,
    pub roots: Vec<String>,
    pub extensions: Vec<String>,
    #[serde(default)]
    pub metrics: ScanMetrics,
    pub records: Vec<NormalizedRecord>,
    pub errors: Vec<ScanError>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ScanMetrics {
    #[serde(default)]
    pub discovered_files: u64,
    #[serde(default)]
    pub matched_records: u64,
    #[serde(default)]
    pub scan_errors: u64,
    #[serde(default)]
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::{Format, NormalizedRecord, SettingValue, Settings, XmlNode};

    #[test]
    fn scalar_strings_display_without_quotes() {
        assert_eq!(SettingValue::text("production").to_string(), "production");
        assert_eq!(SettingValue::from(json!(8080)).to_string(), "8080");
        assert_eq!(SettingValue::from(json!(["a", "b"])).to_string(), r#"["a","b"]"#);
        assert_eq!(SettingValue::from(json!(null)).to_string(), "null");
    }

    #[test]
    fn xml_tree_displays_as_markup() {
        let node = XmlNode {
            name: "server".to_string(),
            attributes: BTreeMap::from([("port".to_string(), "80".to_string())]),
            text: None,
            children: vec![XmlNode {
                name: "host".to_string(),
                text: Some("prod.local".to_string()),
                ..XmlNode::default()
            }],
        };
        assert_eq!(
            SettingValue::Tree(node).to_string(),
            r#"<server port="80"><host>prod.local</host></server>"#
        );
    }

    #[test]
    fn arrays_deserialize_as_scalars_and_objects_as_trees() {
        let scalar: SettingValue = serde_json::from_value(json!(["a"])).expect("deserializes");
        assert_eq!(scalar, SettingValue::from(json!(["a"])));

        let tree: SettingValue =
            serde_json::from_value(json!({"name": "a", "text": "1"})).expect("deserializes");
        assert!(tree.is_tree());
    }

    #[test]
    fn record_serializes_with_file_field() {
        let mut settings = Settings::new();
        settings.insert("debug".to_string(), json!(true).into());
        let record = NormalizedRecord::new("a.json", Format::Json, settings);

        let value = serde_json::to_value(&record).expect("record serializes");
        assert_eq!(
            value,
            json!({"file": "a.json", "format": "json", "settings": {"debug": true}})
        );
    }
}
