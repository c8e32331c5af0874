use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while generating, writing or verifying a manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error(
        "Invalid version format: '{0}'. Expected format: 'YYYY.MM.DD', 'X.Y.Z', or 'X.Y.Z.B'"
    )]
    VersionFormat(String),

    #[error("Unsupported architecture: {0}")]
    UnsupportedArchitecture(String),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Scripts were scheduled but no WixToolset.Util helper binary was supplied")]
    MissingHelperBinary,

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Manifest {path} is missing necessary elements: {}", missing.join(", "))]
    Verification { path: PathBuf, missing: Vec<String> },
}

impl ManifestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ManifestError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn xml(err: impl std::fmt::Display) -> Self {
        ManifestError::Xml(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_error_lists_accepted_shapes() {
        let err = ManifestError::VersionFormat("1.2".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid version format: '1.2'. Expected format: 'YYYY.MM.DD', 'X.Y.Z', or 'X.Y.Z.B'"
        );
    }

    #[test]
    fn test_verification_error_lists_elements() {
        let err = ManifestError::Verification {
            path: PathBuf::from("Package.wxs"),
            missing: vec!["Component".to_string(), "ComponentRef".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Manifest Package.wxs is missing necessary elements: Component, ComponentRef"
        );
    }
}
