//! Project build description loaded from `build-info.yaml`

use crate::errors::ConfigError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the project description inside a project directory
pub const BUILD_INFO_FILE: &str = "build-info.yaml";

/// Placeholder in `install_path` replaced by the current user name
pub const USERNAME_PLACEHOLDER: &str = "[username]";

/// Product metadata block of `build-info.yaml`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub version: String,
    pub manufacturer: String,
    pub identifier: String,
}

/// Package description for one generation run
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub product: Product,
    pub install_path: String,
    /// Signing identity passed to the signing utility
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    /// Reserved; loaded and reported but not consumed by manifest generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postinstall_action: Option<String>,
}

impl Default for BuildInfo {
    fn default() -> Self {
        BuildInfo {
            product: Product {
                name: "PkgName".to_string(),
                version: "1.0.0".to_string(),
                manufacturer: "MyCompany".to_string(),
                identifier: "com.domain.winadmins.package_name".to_string(),
            },
            install_path: r"C:\Program Files\PkgName".to_string(),
            identity: None,
            postinstall_action: Some("none".to_string()),
        }
    }
}

impl BuildInfo {
    /// Path of `build-info.yaml` inside a project directory
    pub fn path(project_dir: &Path) -> PathBuf {
        project_dir.join(BUILD_INFO_FILE)
    }

    /// Load and validate `build-info.yaml` from a project directory
    pub fn load(project_dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::path(project_dir);
        tracing::debug!("Reading build info from {}", path.display());

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::Missing(path));
            }
            Err(err) => return Err(ConfigError::io(path, err)),
        };

        Self::from_yaml(&content)
    }

    /// Parse and validate a build description from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let info: BuildInfo = serde_yaml::from_str(content)?;
        info.validate()?;
        Ok(info)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("product.name", &self.product.name),
            ("product.version", &self.product.version),
            ("product.manufacturer", &self.product.manufacturer),
            ("product.identifier", &self.product.identifier),
            ("install_path", &self.install_path),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField(field));
            }
        }
        Ok(())
    }

    /// Install path with the `[username]` placeholder replaced
    pub fn expanded_install_path(&self, username: &str) -> String {
        self.install_path.replace(USERNAME_PLACEHOLDER, username)
    }

    /// Signing identity, if one is configured and non-blank
    pub fn signing_identity(&self) -> Option<&str> {
        self.identity
            .as_deref()
            .map(str::trim)
            .filter(|identity| !identity.is_empty())
    }

    /// Serialize the default scaffold description
    pub fn template_yaml() -> Result<String, ConfigError> {
        serde_yaml::to_string(&BuildInfo::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Write the default scaffold description into a project directory
    pub fn write_template(project_dir: &Path) -> Result<PathBuf, ConfigError> {
        let path = Self::path(project_dir);
        let content = Self::template_yaml()?;
        fs::write(&path, content).map_err(|e| ConfigError::io(&path, e))?;
        Ok(path)
    }
}

/// Current user name, used for `[username]` expansion and per-user roots
pub fn current_username() -> Result<String, ConfigError> {
    ["USERNAME", "USER"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .ok_or(ConfigError::UsernameUnavailable)
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a version string, found {:?}",
            other
        ))),
    }
}
