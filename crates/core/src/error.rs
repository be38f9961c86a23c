use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("{0}")]
    Read(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Xml(#[from] roxmltree::Error),

    #[error("top-level {0} document is not a mapping")]
    NotAMapping(&'static str),

    #[error("top-level {0} mapping is empty")]
    EmptyMapping(&'static str),

    #[error("no key=value pairs found")]
    NoPairs,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("could not determine home directory")]
    HomeDirUnavailable,

    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to write settings file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings file already exists at {0}. Use --force to overwrite")]
    AlreadyExists(PathBuf),

    #[error("profile '{0}' not found in ~/.konfetti.yaml")]
    ProfileNotFound(String),
}
