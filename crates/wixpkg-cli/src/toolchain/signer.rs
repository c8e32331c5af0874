//! Authenticode signing via signtool

use super::{command_line, ToolRunner};
use crate::errors::BuildError;
use crate::logger;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub struct Signer<'a, R: ToolRunner> {
    signtool: PathBuf,
    timestamp_url: String,
    runner: &'a R,
}

impl<'a, R: ToolRunner> Signer<'a, R> {
    pub fn new(signtool: impl Into<PathBuf>, timestamp_url: impl Into<String>, runner: &'a R) -> Self {
        Signer {
            signtool: signtool.into(),
            timestamp_url: timestamp_url.into(),
            runner,
        }
    }

    /// Sign `msi` with the certificate whose subject name is `identity`, SHA-256 with a timestamp
    pub fn sign(&self, msi: &Path, identity: &str) -> Result<(), BuildError> {
        let args: Vec<OsString> = vec![
            "sign".into(),
            "/n".into(),
            identity.into(),
            "/fd".into(),
            "SHA256".into(),
            "/tr".into(),
            self.timestamp_url.as_str().into(),
            "/td".into(),
            "SHA256".into(),
            msi.into(),
        ];
        let command = command_line(&self.signtool, &args);

        let output = self.runner.run(&self.signtool, &args).map_err(|e| match e {
            BuildError::Spawn { source, .. } => BuildError::Signing {
                path: msi.to_path_buf(),
                reason: format!("could not run {}: {}", self.signtool.display(), source),
            },
            other => other,
        })?;
        if !output.success {
            logger::debug(&format!("Signing command failed: {}", command));
            return Err(BuildError::Signing {
                path: msi.to_path_buf(),
                reason: output.stderr.trim().to_string(),
            });
        }

        logger::success(&format!("Signed {}", msi.display()));
        Ok(())
    }
}
