//! WiX Toolset v5 command-line driver

use super::locate::find_extension_package;
use super::{command_line, ToolRunner};
use crate::errors::BuildError;
use crate::logger;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

const WIX_EXE: &str = "wix.exe";

pub struct WixToolset<'a, R: ToolRunner> {
    bin_dir: PathBuf,
    runner: &'a R,
    /// Program Files roots searched for bundled extension packages
    roots: Vec<PathBuf>,
}

impl<'a, R: ToolRunner> WixToolset<'a, R> {
    pub fn new(bin_dir: impl Into<PathBuf>, runner: &'a R, roots: Vec<PathBuf>) -> Self {
        WixToolset {
            bin_dir: bin_dir.into(),
            runner,
            roots,
        }
    }

    pub fn exe(&self) -> PathBuf {
        self.bin_dir.join(WIX_EXE)
    }

    /// Fail unless wix.exe exists in the configured directory
    pub fn check(&self) -> Result<(), BuildError> {
        let exe = self.exe();
        logger::debug(&format!("Checking for WiX Toolset at {}", exe.display()));
        if exe.is_file() {
            Ok(())
        } else {
            Err(BuildError::WixNotFound(exe))
        }
    }

    pub fn is_extension_installed(&self, name: &str) -> Result<bool, BuildError> {
        let output = self.run(vec!["extension".into(), "list".into()])?;
        if !output.success {
            logger::warn("Failed to list WiX extensions");
            return Ok(false);
        }
        Ok(output.stdout.contains(name))
    }

    /// Add an extension by name, falling back to the package bundled with the WiX install
    pub fn add_extension(&self, name: &str) -> Result<(), BuildError> {
        let by_name = self.run(vec!["extension".into(), "add".into(), name.into()])?;
        if by_name.success {
            logger::info(&format!("WiX extension {} added by name", name));
            return Ok(());
        }

        let Some(package) = find_extension_package(name, &self.roots) else {
            logger::warn(&format!("Could not find the extension package for {}", name));
            return Err(BuildError::ExtensionUnavailable(name.to_string()));
        };

        let by_path = self.run(vec![
            "extension".into(),
            "add".into(),
            package.into_os_string(),
        ])?;
        if by_path.success {
            logger::info(&format!("WiX extension {} added from package", name));
            Ok(())
        } else {
            Err(BuildError::ExtensionUnavailable(name.to_string()))
        }
    }

    pub fn ensure_extension(&self, name: &str) -> Result<(), BuildError> {
        if self.is_extension_installed(name)? {
            logger::debug(&format!("WiX extension {} is installed", name));
            return Ok(());
        }
        logger::info(&format!(
            "WiX extension {} is not installed. Attempting to add it.",
            name
        ));
        self.add_extension(name)
    }

    /// Compile `wxs` into `msi` with the given extension loaded
    pub fn build(
        &self,
        wxs: &Path,
        msi: &Path,
        extension: &str,
        verbose: bool,
    ) -> Result<(), BuildError> {
        let mut args: Vec<OsString> = vec![
            "build".into(),
            "-ext".into(),
            extension.into(),
            "-out".into(),
            msi.into(),
            wxs.into(),
        ];
        if verbose {
            args.push("-v".into());
        }
        let command = command_line(&self.exe(), &args);
        self.run(args)?.into_result(command)?;
        Ok(())
    }

    fn run(&self, args: Vec<OsString>) -> Result<super::CommandOutput, BuildError> {
        self.runner.run(&self.exe(), &args)
    }
}
