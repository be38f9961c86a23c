use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SettingsError;
use crate::filter::FilterCriteria;

pub const SETTINGS_FILE_NAME: &str = ".konfetti.yaml";

const DEFAULT_OUTPUT: &str = "text";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub defaults: ScanDefaults,
    #[serde(default)]
    pub profiles: BTreeMap<String, ScanProfile>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanDefaults {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub no_warn: bool,
    #[serde(default)]
    pub filter: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanProfile {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub no_warn: bool,
    #[serde(default)]
    pub filter: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOverrides {
    pub path: Option<String>,
    pub output: Option<String>,
    pub no_warn: Option<bool>,
    pub filter: Option<String>,
    pub key: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScan {
    pub path: Option<PathBuf>,
    pub output: String,
    pub no_warn: bool,
    pub criteria: FilterCriteria,
}

impl SettingsFile {
    pub fn builtin() -> Self {
        Self {
            defaults: ScanDefaults {
                output: DEFAULT_OUTPUT.to_string(),
                ..ScanDefaults::default()
            },
            profiles: BTreeMap::new(),
        }
    }

    pub fn default_path() -> Result<PathBuf, SettingsError> {
        dirs::home_dir()
            .map(|home| home.join(SETTINGS_FILE_NAME))
            .ok_or(SettingsError::HomeDirUnavailable)
    }

    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            debug!(path = %path.display(), "settings file not found; using built-in defaults");
            return Ok(Self::builtin());
        }

        let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        // an empty document deserializes as unit, not as a mapping
        if content.trim().is_empty() {
            return Ok(Self::builtin());
        }
        let mut settings: SettingsFile = serde_yaml::from_str(content)?;
        if settings.defaults.output.is_empty() {
            settings.defaults.output = DEFAULT_OUTPUT.to_string();
        }
        Ok(settings)
    }

    // a selected profile always decides no_warn, even when false
    pub fn resolve(
        &self,
        profile: Option<&str>,
        overrides: &ScanOverrides,
    ) -> Result<ResolvedScan, SettingsError> {
        let defaults = &self.defaults;
        let mut path = defaults.path.clone();
        let mut output = defaults.output.clone();
        let mut no_warn = defaults.no_warn;
        let mut filter = defaults.filter.clone();
        let mut key = defaults.key.clone();
        let mut value = defaults.value.clone();

        if let Some(name) = profile.filter(|name| !name.is_empty()) {
            let selected = self
                .profiles
                .get(name)
                .ok_or_else(|| SettingsError::ProfileNotFound(name.to_string()))?;
            replace_if_set(&mut path, &selected.path);
            replace_if_set(&mut output, &selected.output);
            replace_if_set(&mut filter, &selected.filter);
            replace_if_set(&mut key, &selected.key);
            replace_if_set(&mut value, &selected.value);
            no_warn = selected.no_warn;
        }

        if let Some(explicit) = &overrides.path {
            path = explicit.clone();
        }
        if let Some(explicit) = &overrides.output {
            output = explicit.clone();
        }
        if let Some(explicit) = overrides.no_warn {
            no_warn = explicit;
        }
        if let Some(explicit) = &overrides.filter {
            filter = explicit.clone();
        }
        if let Some(explicit) = &overrides.key {
            key = explicit.clone();
        }
        if let Some(explicit) = &overrides.value {
            value = explicit.clone();
        }

        if output.is_empty() {
            output = DEFAULT_OUTPUT.to_string();
        }

        Ok(ResolvedScan {
            path: (!path.is_empty()).then(|| PathBuf::from(path)),
            output,
            no_warn,
            criteria: FilterCriteria::new(key, value, filter),
        })
    }
}

fn replace_if_set(slot: &mut String, candidate: &str) {
    if !candidate.is_empty() {
        *slot = candidate.to_string();
    }
}

pub fn write_sample_settings(path: &Path, force: bool) -> Result<(), SettingsError> {
    if path.exists() && !force {
        return Err(SettingsError::AlreadyExists(path.to_path_buf()));
    }
    fs::write(path, SAMPLE_SETTINGS).map_err(|source| SettingsError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub const SAMPLE_SETTINGS: &str = r#"# Konfetti settings file
# Save this as ~/.konfetti.yaml

# Default settings applied to all scans (can be overridden by CLI flags)
defaults:
  output: text        # Default output format: text, json, table
  no_warn: false      # Suppress warning messages
  # path: /etc        # Default scan path (omit to use current directory)
  # filter: ""        # Default filename filter
  # key: ""           # Default key filter
  # value: ""         # Default value filter

# Named profiles for common scanning scenarios
profiles:
  # Scan for debug settings across all configs
  debug:
    description: "Find all debug-related settings"
    key: debug
    output: table
    no_warn: true

  # Find production configs
  prod:
    description: "Find production environment settings"
    value: prod
    output: json
    no_warn: true

  # Scan system-wide configs
  system:
    description: "Scan system configuration directories"
    path: /etc
    output: text
    no_warn: false

  # Docker configs
  docker:
    description: "Find Docker-related configurations"
    filter: docker
    output: table

  # Find potentially sensitive keys
  security:
    description: "Find keys that look like passwords"
    key: password
    output: table
    no_warn: true

# Usage:
#   konfetti scan                                  # Uses defaults
#   konfetti scan --profile debug                  # Uses debug profile
#   konfetti scan --profile prod --output table    # Profile + CLI override
"#;
