use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use wixpkg::commands::{build, create};
use wixpkg::{init_tracing, logger, GlobalOpts};

#[derive(Parser)]
#[command(name = "wixpkg")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Build MSI packages on Windows",
    long_about = "wixpkg turns a project directory (payload/, scripts/ and build-info.yaml) into a WiX manifest, compiles it into an MSI and optionally signs it."
)]
struct Cli {
    /// The project directory to build or create
    #[arg(default_value = ".")]
    project_dir: PathBuf,

    /// Create a new project directory with default settings
    #[arg(long)]
    create: bool,

    /// Output directory for the built MSI package (default: <PROJECT_DIR>/build)
    #[arg(long, value_name = "DIRECTORY")]
    output: Option<PathBuf>,

    /// Path to the WiX Toolset bin directory
    #[arg(long, value_name = "WIX_DIRECTORY")]
    wix_path: Option<PathBuf>,

    /// Skip MSI signing even if an identity is configured
    #[arg(long)]
    no_sign: bool,

    /// Overwrite existing files
    #[arg(short, long)]
    force: bool,

    /// Only generate and verify src/Package.wxs, without compiling
    #[arg(long)]
    no_build: bool,

    #[command(flatten)]
    global: GlobalOpts,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::init_with_verbosity(cli.global.verbosity_level()) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }
    init_tracing();

    if let Err(e) = run(cli) {
        logger::error(&format!("{:#}", e));
        logger::show_log_path();
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.create {
        create::create_project(&cli.project_dir, cli.force).with_context(|| {
            format!(
                "Failed to create a new project directory at {}",
                cli.project_dir.display()
            )
        })?;
        return Ok(());
    }

    let options = build::BuildOptions {
        project_dir: cli.project_dir,
        output: cli.output,
        wix_path: cli.wix_path,
        no_sign: cli.no_sign,
        force: cli.force,
        no_build: cli.no_build,
    };
    let outcome = build::run_build(&options, &cli.global)
        .context("An error occurred during the MSI creation process")?;

    match outcome.msi {
        Some(msi) if outcome.signed => {
            logger::success(&format!("Signed MSI package: {}", msi.display()));
        }
        Some(msi) => logger::success(&format!("MSI package: {}", msi.display())),
        None => logger::info(&format!(
            "Build skipped; manifest left at {}",
            outcome.manifest.display()
        )),
    }
    Ok(())
}
