//! Locating WiX Toolset artifacts under the Program Files roots

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use wixpkg_manifest::actions::SCRIPT_EXTENSION;

pub const UTIL_EXTENSION: &str = "WixToolset.Util.wixext";

const WIX_INSTALL_DIR: &str = "WiX Toolset v5.0";

/// `%ProgramFiles%` and `%ProgramFiles(x86)%`, with their usual defaults
pub fn program_files_roots() -> Vec<PathBuf> {
    [
        ("ProgramFiles", r"C:\Program Files"),
        ("ProgramFiles(x86)", r"C:\Program Files (x86)"),
    ]
    .into_iter()
    .map(|(var, default)| {
        std::env::var_os(var).map_or_else(|| PathBuf::from(default), PathBuf::from)
    })
    .collect()
}

/// Extension package shipped with the WiX install, e.g.
/// `C:\Program Files\WiX Toolset v5.0\extensions\WixToolset.Util.wixext`
pub fn find_extension_package(name: &str, roots: &[PathBuf]) -> Option<PathBuf> {
    roots
        .iter()
        .map(|root| root.join(WIX_INSTALL_DIR).join("extensions").join(name))
        .find(|path| path.exists())
}

/// Numeric segments of the `<version>` directory two levels above `dll`
///
/// Non-numeric segments count as 0, so `5.0.10` sorts after `5.0.2`.
fn version_key(dll: &Path) -> Vec<u64> {
    dll.parent()
        .and_then(Path::parent)
        .and_then(Path::file_name)
        .map(|version| {
            version
                .to_string_lossy()
                .split('.')
                .map(|segment| segment.parse().unwrap_or(0))
                .collect()
        })
        .unwrap_or_default()
}

/// Latest installed `WixToolset.Util.wixext.dll` in the shared extension cache
///
/// Matches `<root>\Common Files\WixToolset\extensions\WixToolset.Util.wixext\*\*\WixToolset.Util.wixext.dll`
/// across all roots and picks the highest version directory, ties broken by path.
pub fn find_util_extension_dll(roots: &[PathBuf]) -> Option<PathBuf> {
    let dll_name = format!("{}.dll", UTIL_EXTENSION);
    let latest = roots
        .iter()
        .map(|root| {
            root.join("Common Files")
                .join("WixToolset")
                .join("extensions")
                .join(UTIL_EXTENSION)
        })
        .filter(|base| base.is_dir())
        .flat_map(|base| {
            WalkDir::new(base)
                .min_depth(3)
                .max_depth(3)
                .into_iter()
                .filter_map(Result::ok)
        })
        .filter(|entry| {
            entry.file_type().is_file() && entry.file_name() == dll_name.as_str()
        })
        .map(|entry| {
            let path = entry.into_path();
            (version_key(&path), path)
        })
        .max()
        .map(|(_, path)| path);

    match &latest {
        Some(path) => {
            tracing::info!(
                "Found extension DLL for {} at {}",
                UTIL_EXTENSION,
                path.display()
            );
        }
        None => {
            tracing::warn!(
                "Extension DLL for {} not found in known locations",
                UTIL_EXTENSION
            );
        }
    }
    latest
}

/// Whether the top level of `scripts_dir` holds any script that could be scheduled
pub fn has_script_files(scripts_dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(scripts_dir) else {
        return false;
    };
    entries.filter_map(Result::ok).any(|entry| {
        let path = entry.path();
        path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(SCRIPT_EXTENSION))
    })
}
