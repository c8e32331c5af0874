//! Configuration management for wixpkg
//!
//! Two sources feed a build: the per-project `build-info.yaml` describing the
//! product, and the per-host `wixpkg.toml` describing the toolchain.

pub mod build_info;
pub mod errors;
pub mod settings;

pub use build_info::{current_username, BuildInfo, Product, BUILD_INFO_FILE, USERNAME_PLACEHOLDER};
pub use errors::ConfigError;
pub use settings::{ToolSettings, DEFAULT_WIX_BIN_PATH};
