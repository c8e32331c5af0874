//! Error types for the wixpkg command line

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use wixpkg_config::ConfigError;
use wixpkg_manifest::ManifestError;

/// Errors that can occur while scaffolding, building or signing a package
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Project directory {0} does not exist")]
    ProjectNotFound(PathBuf),

    #[error("Neither payload nor scripts directory exists in {0}")]
    NoContent(PathBuf),

    #[error("build-info.yaml not found in {0}")]
    MissingBuildInfo(PathBuf),

    #[error("Directory {0} already exists. Use --force to reuse it")]
    ProjectExists(PathBuf),

    #[error("WiX Toolset not found at {0}")]
    WixNotFound(PathBuf),

    #[error("WiX extension {0} could not be installed")]
    ExtensionUnavailable(String),

    #[error("WixToolset.Util extension DLL not found; it is required to run install scripts")]
    HelperNotFound,

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Command failed (exit code {status:?}): {command}\n{stderr}")]
    CommandFailed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Command timed out after {}s: {command}", timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    #[error("{0} already exists. Use --force to overwrite it")]
    OutputExists(PathBuf),

    #[error("Signing {path} failed: {reason}")]
    Signing { path: PathBuf, reason: String },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}
