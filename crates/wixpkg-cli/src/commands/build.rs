//! Build command: generate, verify, compile, sign and clean up

use crate::errors::BuildError;
use crate::logger;
use crate::toolchain::locate::{
    find_util_extension_dll, has_script_files, program_files_roots, UTIL_EXTENSION,
};
use crate::toolchain::signer::Signer;
use crate::toolchain::wix::WixToolset;
use crate::toolchain::{ProcessRunner, ToolRunner};
use crate::GlobalOpts;
use std::fs;
use std::path::{Path, PathBuf};
use wixpkg_config::{current_username, BuildInfo, ToolSettings, BUILD_INFO_FILE};
use wixpkg_manifest::{generate, verify_manifest, GenerateOptions, MANIFEST_FILE};

const SRC_DIR: &str = "src";
const DEFAULT_OUTPUT_DIR: &str = "build";

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub project_dir: PathBuf,
    /// Output directory for the MSI, defaults to `<project>/build`
    pub output: Option<PathBuf>,
    /// WiX bin directory overriding settings
    pub wix_path: Option<PathBuf>,
    pub no_sign: bool,
    pub force: bool,
    /// Stop after writing and verifying the manifest
    pub no_build: bool,
}

/// Host-specific inputs of a build
pub struct BuildContext<'a, R: ToolRunner> {
    pub settings: &'a ToolSettings,
    pub runner: &'a R,
    pub program_files: Vec<PathBuf>,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub manifest: PathBuf,
    pub msi: Option<PathBuf>,
    pub signed: bool,
}

/// A buildable project has `build-info.yaml` and at least one of `payload/` or `scripts/`
pub fn verify_project_structure(project_dir: &Path) -> Result<(), BuildError> {
    if !project_dir.is_dir() {
        return Err(BuildError::ProjectNotFound(project_dir.to_path_buf()));
    }
    if !project_dir.join("payload").is_dir() && !project_dir.join("scripts").is_dir() {
        return Err(BuildError::NoContent(project_dir.to_path_buf()));
    }
    if !project_dir.join(BUILD_INFO_FILE).is_file() {
        return Err(BuildError::MissingBuildInfo(project_dir.to_path_buf()));
    }
    Ok(())
}

/// Build with host settings and real child processes
pub fn run_build(options: &BuildOptions, global: &GlobalOpts) -> Result<BuildOutcome, BuildError> {
    let settings = ToolSettings::load()?;
    logger::debug(&format!("Loaded settings from {}", ToolSettings::path().display()));
    let runner = ProcessRunner::new(settings.command_timeout());
    let context = BuildContext {
        settings: &settings,
        runner: &runner,
        program_files: program_files_roots(),
        username: current_username()?,
    };
    run_build_with(options, global, &context)
}

pub fn run_build_with<R: ToolRunner>(
    options: &BuildOptions,
    global: &GlobalOpts,
    context: &BuildContext<'_, R>,
) -> Result<BuildOutcome, BuildError> {
    let project_dir = options.project_dir.as_path();
    verify_project_structure(project_dir)?;

    let info = BuildInfo::load(project_dir)?;
    logger::info(&format!(
        "Building {} {} for {}",
        info.product.name, info.product.version, context.username
    ));

    let mut generate_options = GenerateOptions::for_project(project_dir, &context.username);
    if has_script_files(&generate_options.scripts_dir) {
        let helper =
            find_util_extension_dll(&context.program_files).ok_or(BuildError::HelperNotFound)?;
        generate_options.helper_binary = Some(helper);
    }

    logger::step("Generating manifest");
    let generated = generate(&info, &generate_options)?;
    let src_dir = project_dir.join(SRC_DIR);
    let manifest = src_dir.join(MANIFEST_FILE);
    generated.document.write_to_path(&manifest)?;
    if let Ok(content) = fs::read_to_string(&manifest) {
        logger::debug(&format!("Contents of {}:\n{}", manifest.display(), content));
    }

    verify_manifest(&manifest, generated.has_actions())?;
    logger::info(&format!("Manifest verified: {}", manifest.display()));

    if options.no_build {
        logger::success(&format!("Generated {}", manifest.display()));
        return Ok(BuildOutcome {
            manifest,
            msi: None,
            signed: false,
        });
    }

    let wix = WixToolset::new(
        context.settings.wix_bin_dir(options.wix_path.as_deref()),
        context.runner,
        context.program_files.clone(),
    );
    wix.check()?;
    wix.ensure_extension(UTIL_EXTENSION)?;

    let output_dir = options
        .output
        .clone()
        .unwrap_or_else(|| project_dir.join(DEFAULT_OUTPUT_DIR));
    fs::create_dir_all(&output_dir).map_err(|e| BuildError::io(&output_dir, e))?;
    let msi = output_dir.join(format!("{}.msi", info.product.name));
    if msi.exists() {
        if !options.force {
            return Err(BuildError::OutputExists(msi));
        }
        logger::warn(&format!("Overwriting {}", msi.display()));
    }

    logger::spinner_start(&format!("Compiling {}", msi.display()));
    if let Err(e) = wix.build(&manifest, &msi, UTIL_EXTENSION, global.is_verbose()) {
        logger::spinner_error("Failed to create MSI package");
        return Err(e);
    }
    logger::spinner_success(&format!("MSI package created at {}", msi.display()));

    let signed = match info.signing_identity() {
        Some(_) if options.no_sign => {
            logger::info("Skipping signing (--no-sign)");
            false
        }
        Some(identity) => {
            Signer::new(
                context.settings.signtool(),
                context.settings.timestamp_url(),
                context.runner,
            )
            .sign(&msi, identity)?;
            true
        }
        None => false,
    };

    clean_up(&src_dir, &output_dir.join(format!("{}.wixpdb", info.product.name)));

    Ok(BuildOutcome {
        manifest,
        msi: Some(msi),
        signed,
    })
}

/// Remove intermediate build files; failures only warn
fn clean_up(src_dir: &Path, wixpdb: &Path) {
    match fs::remove_dir_all(src_dir) {
        Ok(()) => logger::debug(&format!("Removed {}", src_dir.display())),
        Err(e) => logger::warn(&format!("Failed to clean up {}: {}", src_dir.display(), e)),
    }
    if wixpdb.exists() {
        match fs::remove_file(wixpdb) {
            Ok(()) => logger::debug(&format!("Removed {}", wixpdb.display())),
            Err(e) => logger::warn(&format!("Failed to remove {}: {}", wixpdb.display(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::fake::FakeRunner;
    use tempfile::TempDir;

    const BUILD_INFO: &str = r#"product:
  name: Acme
  version: 2024.03.15
  manufacturer: Acme Corp
  identifier: com.acme.tools
install_path: C:\Program Files\Acme
identity: Acme Code Signing
"#;

    struct Fixture {
        dir: TempDir,
        settings: ToolSettings,
    }

    impl Fixture {
        fn new(build_info: &str) -> Option<Self> {
            let dir = TempDir::new().ok()?;
            let project = dir.path().join("project");
            fs::create_dir_all(project.join("payload").join("bin")).ok()?;
            fs::write(project.join("payload").join("bin").join("acme.exe"), b"MZ").ok()?;
            fs::write(project.join(BUILD_INFO_FILE), build_info).ok()?;

            let bin = dir.path().join("wix-bin");
            fs::create_dir_all(&bin).ok()?;
            fs::write(bin.join("wix.exe"), b"").ok()?;

            let settings = ToolSettings {
                wix_path: Some(bin.to_string_lossy().into_owned()),
                signtool_path: Some("signtool.exe".to_string()),
                ..ToolSettings::default()
            };
            Some(Fixture { dir, settings })
        }

        fn project(&self) -> PathBuf {
            self.dir.path().join("project")
        }

        fn options(&self) -> BuildOptions {
            BuildOptions {
                project_dir: self.project(),
                ..BuildOptions::default()
            }
        }

        fn context<'a>(&'a self, runner: &'a FakeRunner) -> BuildContext<'a, FakeRunner> {
            BuildContext {
                settings: &self.settings,
                runner,
                program_files: vec![self.dir.path().join("program-files")],
                username: "alice".to_string(),
            }
        }
    }

    #[test]
    fn test_project_structure_checks() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        assert!(matches!(
            verify_project_structure(&dir.path().join("missing")),
            Err(BuildError::ProjectNotFound(_))
        ));
        assert!(matches!(
            verify_project_structure(dir.path()),
            Err(BuildError::NoContent(_))
        ));
        if fs::create_dir(dir.path().join("scripts")).is_err() {
            return;
        }
        assert!(matches!(
            verify_project_structure(dir.path()),
            Err(BuildError::MissingBuildInfo(_))
        ));
        if fs::write(dir.path().join(BUILD_INFO_FILE), "").is_err() {
            return;
        }
        assert!(verify_project_structure(dir.path()).is_ok());
    }

    #[test]
    fn test_no_build_writes_manifest_without_toolchain() {
        let Some(fixture) = Fixture::new(BUILD_INFO) else {
            return;
        };
        let runner = FakeRunner::default();
        let options = BuildOptions {
            no_build: true,
            ..fixture.options()
        };

        let Ok(outcome) = run_build_with(&options, &GlobalOpts::default(), &fixture.context(&runner))
        else {
            assert!(false, "build should succeed");
            return;
        };
        assert_eq!(outcome.msi, None);
        assert_eq!(runner.call_count(), 0);

        let content = fs::read_to_string(&outcome.manifest).unwrap_or_default();
        assert!(content.contains(r#"Version="24.3.15""#));
        assert!(content.contains(r#"<StandardDirectory Id="ProgramFilesFolder">"#));
        assert!(content.contains("acme.exe"));
    }

    #[test]
    fn test_full_build_compiles_signs_and_cleans_up() {
        let Some(fixture) = Fixture::new(BUILD_INFO) else {
            return;
        };
        let runner = FakeRunner::default();
        runner.respond(true, "WixToolset.Util.wixext 5.0.2");

        let Ok(outcome) =
            run_build_with(&fixture.options(), &GlobalOpts::default(), &fixture.context(&runner))
        else {
            assert!(false, "build should succeed");
            return;
        };

        let msi = fixture.project().join("build").join("Acme.msi");
        assert_eq!(outcome.msi, Some(msi.clone()));
        assert!(outcome.signed);
        assert!(!fixture.project().join(SRC_DIR).exists());

        // extension list, build, sign
        assert_eq!(runner.call_count(), 3);
        assert_eq!(runner.call(1)[1], "build");
        assert_eq!(runner.call(1)[5], msi.to_string_lossy());
        assert_eq!(runner.call(2)[0], "signtool.exe");
        assert_eq!(runner.call(2)[3], "Acme Code Signing");
    }

    #[test]
    fn test_no_sign_skips_signtool() {
        let Some(fixture) = Fixture::new(BUILD_INFO) else {
            return;
        };
        let runner = FakeRunner::default();
        runner.respond(true, "WixToolset.Util.wixext");
        let options = BuildOptions {
            no_sign: true,
            ..fixture.options()
        };

        let outcome = run_build_with(&options, &GlobalOpts::default(), &fixture.context(&runner));
        assert!(outcome.is_ok_and(|o| !o.signed));
        assert_eq!(runner.call_count(), 2);
    }

    #[test]
    fn test_existing_msi_requires_force() {
        let Some(fixture) = Fixture::new(BUILD_INFO) else {
            return;
        };
        let output = fixture.dir.path().join("out");
        if fs::create_dir_all(&output).is_err() || fs::write(output.join("Acme.msi"), b"").is_err()
        {
            return;
        }
        let runner = FakeRunner::default();
        runner.respond(true, "WixToolset.Util.wixext");
        let options = BuildOptions {
            output: Some(output.clone()),
            ..fixture.options()
        };
        assert!(matches!(
            run_build_with(&options, &GlobalOpts::default(), &fixture.context(&runner)),
            Err(BuildError::OutputExists(_))
        ));

        let runner = FakeRunner::default();
        runner.respond(true, "WixToolset.Util.wixext");
        let options = BuildOptions {
            output: Some(output),
            force: true,
            no_sign: true,
            ..fixture.options()
        };
        assert!(run_build_with(&options, &GlobalOpts::default(), &fixture.context(&runner)).is_ok());
    }

    #[test]
    fn test_scripts_without_helper_dll_fail() {
        let Some(fixture) = Fixture::new(BUILD_INFO) else {
            return;
        };
        let scripts = fixture.project().join("scripts");
        if fs::create_dir_all(&scripts).is_err()
            || fs::write(scripts.join("postinstall.js"), b"").is_err()
        {
            return;
        }
        let runner = FakeRunner::default();
        let options = BuildOptions {
            no_build: true,
            ..fixture.options()
        };
        assert!(matches!(
            run_build_with(&options, &GlobalOpts::default(), &fixture.context(&runner)),
            Err(BuildError::HelperNotFound)
        ));
    }

    #[test]
    fn test_scripts_with_helper_dll_schedule_actions() {
        let Some(fixture) = Fixture::new(BUILD_INFO) else {
            return;
        };
        let scripts = fixture.project().join("scripts");
        let dll = fixture
            .dir
            .path()
            .join("program-files")
            .join("Common Files")
            .join("WixToolset")
            .join("extensions")
            .join(UTIL_EXTENSION)
            .join("5.0.2")
            .join("wixext5")
            .join(format!("{}.dll", UTIL_EXTENSION));
        let created = fs::create_dir_all(&scripts).is_ok()
            && fs::write(scripts.join("PreInstall.js"), b"").is_ok()
            && dll.parent().is_some_and(|p| fs::create_dir_all(p).is_ok())
            && fs::write(&dll, b"").is_ok();
        if !created {
            return;
        }

        let runner = FakeRunner::default();
        let options = BuildOptions {
            no_build: true,
            ..fixture.options()
        };
        let Ok(outcome) = run_build_with(&options, &GlobalOpts::default(), &fixture.context(&runner))
        else {
            assert!(false, "build should succeed");
            return;
        };
        let content = fs::read_to_string(&outcome.manifest).unwrap_or_default();
        assert!(content.contains("<InstallExecuteSequence>"));
        assert!(content.contains(r#"After="InstallInitialize""#));
        assert!(content.contains(&dll.to_string_lossy().into_owned()));
    }
}
