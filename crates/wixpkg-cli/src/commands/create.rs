use crate::errors::BuildError;
use crate::logger;
use colored::Colorize;
use std::fs;
use std::path::Path;
use wixpkg_config::BuildInfo;

const PROJECT_SUBDIRS: [&str; 2] = ["payload", "scripts"];

/// Scaffold a new project: `payload/`, `scripts/` and a template `build-info.yaml`
///
/// An existing directory is only reused with `force`, in which case missing
/// subdirectories are created and `build-info.yaml` is overwritten.
pub fn create_project(project_dir: &Path, force: bool) -> Result<(), BuildError> {
    logger::debug(&format!("Creating project at {}", project_dir.display()));

    if project_dir.exists() {
        if !force {
            return Err(BuildError::ProjectExists(project_dir.to_path_buf()));
        }
        logger::warn(&format!(
            "Reusing existing directory {}",
            project_dir.display()
        ));
    }

    for subdir in PROJECT_SUBDIRS {
        let path = project_dir.join(subdir);
        fs::create_dir_all(&path).map_err(|e| BuildError::io(&path, e))?;
    }
    let build_info = BuildInfo::write_template(project_dir)?;

    logger::success(&format!(
        "Created new project directory at {}",
        project_dir.display()
    ));
    eprintln!();
    eprintln!("Next steps:");
    eprintln!(
        "  1. Edit {} with your product details",
        build_info.display().to_string().bold()
    );
    eprintln!("  2. Put the files to install under payload/");
    eprintln!("  3. Optionally add preinstall/postinstall .js scripts under scripts/");
    eprintln!("  4. Build: wixpkg {}", project_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wixpkg_config::BUILD_INFO_FILE;

    #[test]
    fn test_create_scaffolds_project() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let project = dir.path().join("Acme");
        assert!(create_project(&project, false).is_ok());
        assert!(project.join("payload").is_dir());
        assert!(project.join("scripts").is_dir());

        let info = BuildInfo::load(&project);
        assert!(info.is_ok_and(|i| i.product.name == "PkgName"
            && i.install_path == r"C:\Program Files\PkgName"));
    }

    #[test]
    fn test_existing_directory_requires_force() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        assert!(matches!(
            create_project(dir.path(), false),
            Err(BuildError::ProjectExists(_))
        ));
        assert!(!dir.path().join(BUILD_INFO_FILE).exists());

        if fs::write(dir.path().join(BUILD_INFO_FILE), "stale: true\n").is_err() {
            return;
        }
        assert!(create_project(dir.path(), true).is_ok());
        assert!(dir.path().join("payload").is_dir());
        assert!(BuildInfo::load(dir.path()).is_ok());
    }
}
