//! Host tool settings (`wixpkg.toml`)
//!
//! Settings describe where the external toolchain lives on this machine and how
//! long external commands may run. They are independent of any one project.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use which::which;

/// Default WiX Toolset binary directory
pub const DEFAULT_WIX_BIN_PATH: &str = r"C:\Program Files\WiX Toolset v5.0\bin";

/// Default RFC 3161 timestamp server used when signing
pub const DEFAULT_TIMESTAMP_URL: &str = "http://timestamp.digicert.com";

/// Default upper bound for any single external command
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 600;

const SIGNTOOL: &str = "signtool";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wix_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signtool_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_timeout_secs: Option<u64>,
}

impl ToolSettings {
    pub fn path() -> PathBuf {
        // Honor explicit override via WIXPKG_CONFIG for tests / isolated runs.
        if let Ok(env_path) = std::env::var("WIXPKG_CONFIG") {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return PathBuf::from(trimmed);
            }
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("wixpkg")
            .join("wixpkg.toml")
    }

    /// Load settings from the default location, returning defaults if the file doesn't exist
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(&Self::path())
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(ToolSettings::default());
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Ok(toml::from_str(&content)?)
    }

    /// WiX binary directory: command-line override, then settings, then the default install
    pub fn wix_bin_dir(&self, cli_override: Option<&Path>) -> PathBuf {
        cli_override.map_or_else(
            || {
                PathBuf::from(
                    self.wix_path
                        .as_deref()
                        .unwrap_or(DEFAULT_WIX_BIN_PATH),
                )
            },
            Path::to_path_buf,
        )
    }

    /// Signing utility: configured path, then a PATH lookup, then the bare program name
    pub fn signtool(&self) -> PathBuf {
        if let Some(path) = &self.signtool_path {
            return PathBuf::from(path);
        }
        which(SIGNTOOL).unwrap_or_else(|_| PathBuf::from(SIGNTOOL))
    }

    pub fn timestamp_url(&self) -> &str {
        self.timestamp_url
            .as_deref()
            .unwrap_or(DEFAULT_TIMESTAMP_URL)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(
            self.command_timeout_secs
                .unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let settings = ToolSettings::load_from_path(&dir.path().join("absent.toml"));
        assert!(settings.as_ref().is_ok_and(|s| *s == ToolSettings::default()));
        let Ok(settings) = settings else {
            return;
        };
        assert_eq!(settings.timestamp_url(), DEFAULT_TIMESTAMP_URL);
        assert_eq!(settings.command_timeout(), Duration::from_secs(600));
        assert_eq!(settings.wix_bin_dir(None), PathBuf::from(DEFAULT_WIX_BIN_PATH));
    }

    #[test]
    fn test_values_from_file() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let path = dir.path().join("wixpkg.toml");
        let written = fs::write(
            &path,
            r#"
wix_path = 'D:\WiX\bin'
signtool_path = 'D:\Kits\signtool.exe'
command_timeout_secs = 30
"#,
        );
        if written.is_err() {
            return;
        }

        let Ok(settings) = ToolSettings::load_from_path(&path) else {
            assert!(false, "settings should parse");
            return;
        };
        assert_eq!(settings.wix_bin_dir(None), PathBuf::from(r"D:\WiX\bin"));
        assert_eq!(
            settings.wix_bin_dir(Some(Path::new("E:/wix"))),
            PathBuf::from("E:/wix")
        );
        assert_eq!(settings.signtool(), PathBuf::from(r"D:\Kits\signtool.exe"));
        assert_eq!(settings.command_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let path = dir.path().join("wixpkg.toml");
        if fs::write(&path, "command_timeout_secs = \"soon\"").is_err() {
            return;
        }
        assert!(matches!(
            ToolSettings::load_from_path(&path),
            Err(ConfigError::Settings(_))
        ));
    }
}
