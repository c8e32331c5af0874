use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading project or tool configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("'{0}' file is missing in the project directory")]
    Missing(PathBuf),

    #[error("Failed to parse build info YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Failed to serialize build info YAML: {0}")]
    Serialize(String),

    #[error("Required field '{0}' is missing or empty in build-info.yaml")]
    MissingField(&'static str),

    #[error("Failed to parse tool settings: {0}")]
    Settings(#[from] toml::de::Error),

    #[error("Could not determine the current user name (USERNAME and USER are unset)")]
    UsernameUnavailable,
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}
