//! wixpkg manifest generation
//!
//! Turns a project's `build-info.yaml`, payload and scripts into a WiX v4
//! `Package.wxs` source:
//!
//! - [`version`] encodes product versions into the installer's `major.minor.build` limits
//! - [`directories`] maps an install path onto a standard Windows directory root
//! - [`tree`] and [`builder`] build the directory/component tree from the filesystem
//! - [`actions`] schedules pre/post-install scripts as deferred custom actions
//! - [`manifest`] assembles the document and [`verify`] checks a written one

pub mod actions;
pub mod builder;
pub mod directories;
pub mod document;
pub mod errors;
pub mod identity;
pub mod manifest;
pub mod tree;
pub mod verify;
pub mod version;

pub use actions::{schedule_actions, ActionSpec, Arch, ScheduledActions, ScriptPhase};
pub use builder::build_tree;
pub use directories::{ResolvedInstallTarget, StandardDirectoryTable, SYNTHETIC_ROOT_ID};
pub use document::{Document, Element};
pub use errors::ManifestError;
pub use manifest::{generate, GenerateOptions, GeneratedManifest};
pub use tree::DirectoryTree;
pub use verify::verify_manifest;
pub use version::{encode_version, VersionTriple};

/// File name of the generated manifest inside the project's `src/` directory
pub const MANIFEST_FILE: &str = "Package.wxs";
