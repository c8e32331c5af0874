//! Install-time script scheduling
//!
//! Scripts in the top level of the scripts directory become deferred custom
//! actions run through the WixToolset.Util `WixQuietExec` helper.

use crate::builder::absolute_dir;
use crate::errors::ManifestError;
use crate::identity;
use crate::tree::DirectoryTree;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Extension of scripts that can be scheduled
pub const SCRIPT_EXTENSION: &str = "js";

/// Run condition restricting actions to first-time installs
pub const FRESH_INSTALL_CONDITION: &str = "NOT Installed";

/// Helper DLL entry point that runs a command line without a console window
pub const QUIET_EXEC_ENTRY: &str = "WixQuietExec";

/// Host CPU architecture, selecting the helper binary variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X64,
    X86,
    Arm64,
}

impl Arch {
    /// Map a machine name (`std::env::consts::ARCH` or `PROCESSOR_ARCHITECTURE` style)
    pub fn from_machine(machine: &str) -> Result<Self, ManifestError> {
        let lower = machine.to_lowercase();
        match lower.as_str() {
            "x86_64" | "amd64" | "x64" => Ok(Arch::X64),
            "x86" | "i386" | "i586" | "i686" => Ok(Arch::X86),
            "aarch64" | "arm64" => Ok(Arch::Arm64),
            other if other.contains("arm") => Ok(Arch::Arm64),
            _ => Err(ManifestError::UnsupportedArchitecture(machine.to_string())),
        }
    }

    pub fn host() -> Result<Self, ManifestError> {
        Self::from_machine(std::env::consts::ARCH)
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Arch::X64 => "x64",
            Arch::X86 => "x86",
            Arch::Arm64 => "arm64",
        }
    }

    /// Id of the helper binary resource, e.g. `Wix4UtilCA_x64`
    pub fn binary_id(self) -> String {
        format!("Wix4UtilCA_{}", self.suffix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptPhase {
    PreInstall,
    PostInstall,
}

impl ScriptPhase {
    /// Classify a script by case-insensitive substring of its file stem
    pub fn classify(stem: &str) -> Option<Self> {
        let lower = stem.to_lowercase();
        if lower.contains("preinstall") {
            Some(ScriptPhase::PreInstall)
        } else if lower.contains("postinstall") {
            Some(ScriptPhase::PostInstall)
        } else {
            None
        }
    }

    fn id_prefix(self) -> &'static str {
        match self {
            ScriptPhase::PreInstall => "PreInstall",
            ScriptPhase::PostInstall => "PostInstall",
        }
    }

    /// Pre-install runs right after `InstallInitialize`, post-install right before `InstallFinalize`
    pub fn anchor(self) -> SequenceAnchor {
        match self {
            ScriptPhase::PreInstall => SequenceAnchor {
                relation: Relation::After,
                action: "InstallInitialize",
            },
            ScriptPhase::PostInstall => SequenceAnchor {
                relation: Relation::Before,
                action: "InstallFinalize",
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Before,
    After,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Before => f.write_str("Before"),
            Relation::After => f.write_str("After"),
        }
    }
}

/// Position of a custom action relative to a standard sequence action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceAnchor {
    pub relation: Relation,
    pub action: &'static str,
}

/// One scheduled script
#[derive(Debug, Clone)]
pub struct ActionSpec {
    pub id: String,
    pub phase: ScriptPhase,
    pub script: PathBuf,
    /// Command line assigned to the action's property for `WixQuietExec`
    pub command: String,
    pub anchor: SequenceAnchor,
    pub condition: &'static str,
}

/// Result of a scheduler pass
#[derive(Debug, Clone)]
pub struct ScheduledActions {
    pub arch: Arch,
    pub actions: Vec<ActionSpec>,
}

impl ScheduledActions {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

fn script_command(file_id: &str) -> String {
    format!(r#""[SystemFolder]cscript.exe" //NoLogo "[#{}]""#, file_id)
}

/// Schedule every recognized script in the top level of `scripts_dir`
///
/// `tree` must already contain the scripts so the command lines can reference
/// their installed file ids. A missing directory schedules nothing.
pub fn schedule_actions(
    scripts_dir: &Path,
    machine: &str,
    tree: &DirectoryTree,
) -> Result<Option<ScheduledActions>, ManifestError> {
    if !scripts_dir.is_dir() {
        tracing::info!("No scripts directory found. Skipping custom actions.");
        return Ok(None);
    }

    let arch = Arch::from_machine(machine)?;
    let root = absolute_dir(scripts_dir)?;

    let mut entries: Vec<PathBuf> = fs::read_dir(&root)
        .map_err(|e| ManifestError::io(&root, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()
        .map_err(|e| ManifestError::io(&root, e))?;
    entries.sort();

    let mut actions = Vec::new();
    for path in entries {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if !path.is_file() {
            tracing::debug!("{} is not a file. Skipping.", file_name);
            continue;
        }

        let is_script = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(SCRIPT_EXTENSION));
        if !is_script {
            tracing::info!("File {} is not a supported script type. Skipping.", file_name);
            continue;
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let Some(phase) = ScriptPhase::classify(&stem) else {
            tracing::info!(
                "Script {} is neither a preinstall nor a postinstall script. Skipping.",
                file_name
            );
            continue;
        };

        let file_id = match tree.file_id(&path) {
            Some(id) => id.to_string(),
            None => {
                tracing::warn!(
                    "Script {} is not part of the install tree; it will not be installed",
                    file_name
                );
                continue;
            }
        };

        let action = ActionSpec {
            id: identity::prefixed_id(phase.id_prefix()),
            phase,
            command: script_command(&file_id),
            anchor: phase.anchor(),
            condition: FRESH_INSTALL_CONDITION,
            script: path,
        };
        tracing::debug!(
            "Scheduled {} {} {} as {}",
            file_name,
            action.anchor.relation,
            action.anchor.action,
            action.id
        );
        actions.push(action);
    }

    if actions.is_empty() {
        tracing::info!("No valid scripts found in the scripts directory.");
    } else {
        tracing::info!(
            "Added custom actions for {} scripts using {}",
            actions.len(),
            QUIET_EXEC_ENTRY
        );
    }

    Ok(Some(ScheduledActions { arch, actions }))
}
