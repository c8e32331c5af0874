//! wixpkg library - expose modules for testing
//!
//! The binary is a thin argument parser over [`commands`]; external tools are
//! reached only through [`toolchain::ToolRunner`].

pub mod commands;
pub mod common;
pub mod errors;
pub mod toolchain;

pub use common::GlobalOpts;
pub use errors::BuildError;
pub use wixpkg_logger as logger;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Route library `tracing` events to stderr, honoring `RUST_LOG` over the CLI verbosity
pub fn init_tracing() {
    let level = logger::verbosity_to_filter();
    let default_filter = format!(
        "wixpkg={level},wixpkg_manifest={level},wixpkg_config={level}",
        level = level
    );
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .try_init();
}
