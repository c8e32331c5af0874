//! Tree construction from the payload and scripts directories

use crate::directories::ResolvedInstallTarget;
use crate::errors::ManifestError;
use crate::tree::{DirectoryTree, NodeId};
use std::fs::File;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Absolute form of a source directory without resolving symlinks or UNC prefixes
pub(crate) fn absolute_dir(dir: &Path) -> Result<PathBuf, ManifestError> {
    std::path::absolute(dir).map_err(|e| ManifestError::io(dir, e))
}

/// Build the install tree for `target`, adding every regular file under each source directory
///
/// Sources are walked in order, each name-sorted, so directory and file ids are
/// deterministic for identical input. Missing source directories are skipped.
/// Symlinks are followed; a dangling link or an unreadable file aborts the walk.
pub fn build_tree(
    target: &ResolvedInstallTarget,
    sources: &[&Path],
) -> Result<DirectoryTree, ManifestError> {
    let mut tree = DirectoryTree::new(target.root_id());
    let install_dir = tree.ensure_path(DirectoryTree::ROOT, target.chain());

    for source in sources {
        if !source.is_dir() {
            tracing::debug!("Source directory {} not found, skipping", source.display());
            continue;
        }
        let root = absolute_dir(source)?;
        let added = add_directory(&mut tree, install_dir, &root)?;
        tracing::debug!("Added {} files from {}", added, root.display());
    }

    Ok(tree)
}

fn add_directory(
    tree: &mut DirectoryTree,
    install_dir: NodeId,
    root: &Path,
) -> Result<usize, ManifestError> {
    let mut added = 0;

    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| ManifestError::Walk {
            path: e.path().unwrap_or(root).to_path_buf(),
            source: e,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        // Every listed file must be readable when wix.exe compiles the manifest
        File::open(entry.path()).map_err(|e| ManifestError::io(entry.path(), e))?;

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let segments: Vec<String> = relative
            .parent()
            .into_iter()
            .flat_map(Path::components)
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        let dir = tree.ensure_path(install_dir, &segments);
        let component = tree.add_file(dir, entry.path());
        tracing::trace!(
            "{} -> {} ({})",
            entry.path().display(),
            component.id,
            component.file.id
        );
        added += 1;
    }

    Ok(added)
}
