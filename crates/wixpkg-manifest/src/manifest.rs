//! Manifest assembly
//!
//! Runs the generation pipeline (version, directory resolution, tree, actions)
//! for one `BuildInfo` and renders the WiX `Package.wxs` document.

use crate::actions::{schedule_actions, ActionSpec, Arch, ScheduledActions, QUIET_EXEC_ENTRY};
use crate::builder::build_tree;
use crate::directories::{ResolvedInstallTarget, StandardDirectoryTable};
use crate::document::{Document, Element};
use crate::errors::ManifestError;
use crate::identity;
use crate::tree::{DirectoryTree, NodeId};
use crate::version::{encode_version, VersionTriple};
use std::path::{Path, PathBuf};
use uuid::Uuid;
use wixpkg_config::BuildInfo;

pub const WIX_NAMESPACE: &str = "http://wixtoolset.org/schemas/v4/wxs";
pub const UTIL_NAMESPACE: &str = "http://wixtoolset.org/schemas/v4/wxs/util";

pub const FEATURE_ID: &str = "MainFeature";
const FEATURE_TITLE: &str = "Main Feature";
const INSTALLER_VERSION: &str = "500";
const CABINET: &str = "product.cab";
const DOWNGRADE_MESSAGE: &str = "A newer version of [ProductName] is already installed.";

/// Inputs of one generation run besides the build description
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub payload_dir: PathBuf,
    pub scripts_dir: PathBuf,
    /// Current user, for `[username]` expansion and per-user roots
    pub username: String,
    /// Host machine architecture name
    pub machine: String,
    /// WixToolset.Util helper binary, required only when scripts are scheduled
    pub helper_binary: Option<PathBuf>,
}

impl GenerateOptions {
    /// Options for the conventional `payload/` and `scripts/` project layout on this host
    pub fn for_project(project_dir: &Path, username: &str) -> Self {
        GenerateOptions {
            payload_dir: project_dir.join("payload"),
            scripts_dir: project_dir.join("scripts"),
            username: username.to_string(),
            machine: std::env::consts::ARCH.to_string(),
            helper_binary: None,
        }
    }
}

/// Everything produced by one generation run
#[derive(Debug, Clone)]
pub struct GeneratedManifest {
    pub document: Document,
    pub version: VersionTriple,
    pub target: ResolvedInstallTarget,
    pub tree: DirectoryTree,
    pub actions: Vec<ActionSpec>,
    pub arch: Option<Arch>,
    pub upgrade_code: Uuid,
    pub product_code: Uuid,
}

impl GeneratedManifest {
    pub fn has_actions(&self) -> bool {
        !self.actions.is_empty()
    }
}

/// Generate the installer manifest for `info`
pub fn generate(
    info: &BuildInfo,
    options: &GenerateOptions,
) -> Result<GeneratedManifest, ManifestError> {
    let version = encode_version(&info.product.version)?;

    let install_path = info.expanded_install_path(&options.username);
    let table = StandardDirectoryTable::for_user(&options.username);
    let target = table.resolve(&install_path);

    if let Some(action) = &info.postinstall_action {
        tracing::debug!("postinstall_action '{}' is reserved and not applied", action);
    }

    let tree = build_tree(
        &target,
        &[options.payload_dir.as_path(), options.scripts_dir.as_path()],
    )?;
    tracing::info!(
        "Install tree has {} directories and {} components",
        tree.directory_count(),
        tree.component_count()
    );

    let scheduled = schedule_actions(&options.scripts_dir, &options.machine, &tree)?;
    let (arch, actions) = match scheduled {
        Some(ScheduledActions { arch, actions }) => (Some(arch), actions),
        None => (None, Vec::new()),
    };

    let helper = match (actions.is_empty(), &options.helper_binary) {
        (true, _) => None,
        (false, Some(path)) => Some(path.as_path()),
        (false, None) => return Err(ManifestError::MissingHelperBinary),
    };

    let upgrade_code = identity::upgrade_code(&info.product.identifier);
    let product_code = identity::product_code();

    let mut package = Element::new("Package")
        .attr("Name", &info.product.name)
        .attr("Version", version.to_string())
        .attr("Manufacturer", &info.product.manufacturer)
        .attr("UpgradeCode", upgrade_code.to_string())
        .attr("ProductCode", product_code.to_string())
        .attr("InstallerVersion", INSTALLER_VERSION)
        .attr("Compressed", "yes")
        .child(Element::new("MajorUpgrade").attr("DowngradeErrorMessage", DOWNGRADE_MESSAGE))
        .child(
            Element::new("Media")
                .attr("Id", "1")
                .attr("Cabinet", CABINET)
                .attr("EmbedCab", "yes"),
        )
        .child(standard_directory_element(&tree))
        .child(feature_element(&tree));

    if let (Some(arch), Some(helper)) = (arch, helper) {
        append_action_elements(&mut package, &actions, arch, helper);
    }

    let root = Element::new("Wix")
        .attr("xmlns", WIX_NAMESPACE)
        .attr("xmlns:util", UTIL_NAMESPACE)
        .child(package);

    Ok(GeneratedManifest {
        document: Document::new(root),
        version,
        target,
        tree,
        actions,
        arch,
        upgrade_code,
        product_code,
    })
}

fn standard_directory_element(tree: &DirectoryTree) -> Element {
    let root = tree.root();
    let mut element = Element::new("StandardDirectory").attr("Id", &root.id);
    fill_directory(tree, DirectoryTree::ROOT, &mut element);
    element
}

fn directory_element(tree: &DirectoryTree, id: NodeId) -> Element {
    let node = tree.node(id);
    let mut element = Element::new("Directory")
        .attr("Id", &node.id)
        .attr("Name", &node.name);
    fill_directory(tree, id, &mut element);
    element
}

fn fill_directory(tree: &DirectoryTree, id: NodeId, element: &mut Element) {
    let node = tree.node(id);
    for &child in &node.children {
        element.push(directory_element(tree, child));
    }
    for component in &node.components {
        element.push(
            Element::new("Component")
                .attr("Id", &component.id)
                .attr("Guid", component.guid.to_string())
                .child(
                    Element::new("File")
                        .attr("Id", &component.file.id)
                        .attr("Source", component.file.source.to_string_lossy())
                        .attr("KeyPath", "yes"),
                ),
        );
    }
}

fn feature_element(tree: &DirectoryTree) -> Element {
    tree.feature_refs().iter().fold(
        Element::new("Feature")
            .attr("Id", FEATURE_ID)
            .attr("Title", FEATURE_TITLE)
            .attr("Level", "1"),
        |feature, component_id| feature.child(Element::new("ComponentRef").attr("Id", component_id)),
    )
}

fn append_action_elements(package: &mut Element, actions: &[ActionSpec], arch: Arch, helper: &Path) {
    let binary_id = arch.binary_id();
    let mut sequence = Element::new("InstallExecuteSequence");

    for action in actions {
        package.push(
            Element::new("SetProperty")
                .attr("Id", &action.id)
                .attr("Value", &action.command)
                .attr("Before", &action.id)
                .attr("Sequence", "execute"),
        );
        package.push(
            Element::new("CustomAction")
                .attr("Id", &action.id)
                .attr("BinaryRef", &binary_id)
                .attr("DllEntry", QUIET_EXEC_ENTRY)
                .attr("Execute", "deferred")
                .attr("Impersonate", "no")
                .attr("Return", "check"),
        );
        sequence.push(
            Element::new("Custom")
                .attr("Action", &action.id)
                .attr(action.anchor.relation.to_string(), action.anchor.action)
                .attr("Condition", action.condition),
        );
    }

    package.push(sequence);
    package.push(
        Element::new("Binary")
            .attr("Id", binary_id)
            .attr("SourceFile", helper.to_string_lossy()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use wixpkg_config::Product;

    fn build_info(version: &str, install_path: &str) -> BuildInfo {
        BuildInfo {
            product: Product {
                name: "Reporter".to_string(),
                version: version.to_string(),
                manufacturer: "Example Corp".to_string(),
                identifier: "com.example.reporter".to_string(),
            },
            install_path: install_path.to_string(),
            identity: None,
            postinstall_action: Some("none".to_string()),
        }
    }

    struct Project {
        _dir: TempDir,
        options: GenerateOptions,
    }

    fn project(payload: &[&str], scripts: &[&str]) -> Option<Project> {
        let dir = TempDir::new().ok()?;
        let mut options = GenerateOptions::for_project(dir.path(), "alice");
        options.machine = "x86_64".to_string();
        for (root, names) in [(&options.payload_dir, payload), (&options.scripts_dir, scripts)] {
            for name in names {
                let path = root.join(name);
                fs::create_dir_all(path.parent()?).ok()?;
                fs::write(&path, b"content").ok()?;
            }
        }
        Some(Project { _dir: dir, options })
    }

    fn package(generated: &GeneratedManifest) -> Option<&Element> {
        generated.document.root.find("Package")
    }

    #[test]
    fn test_end_to_end_documents_postinstall() {
        let Some(mut project) = project(&["report.exe"], &["postinstall.js"]) else {
            return;
        };
        project.options.helper_binary = Some(PathBuf::from(
            r"C:\Program Files\Common Files\WixToolset\extensions\WixToolset.Util.wixext.dll",
        ));
        let info = build_info("2025.1.2", r"C:\Users\[username]\Documents\Reporter");

        let Ok(generated) = generate(&info, &project.options) else {
            assert!(false, "generation should succeed");
            return;
        };
        let Some(package) = package(&generated) else {
            assert!(false, "Package element missing");
            return;
        };

        assert_eq!(package.attribute("Version"), Some("25.1.2"));
        assert_eq!(
            package.attribute("UpgradeCode"),
            Some(identity::upgrade_code("com.example.reporter").to_string().as_str())
        );

        let standard = package.find("StandardDirectory");
        assert!(standard.is_some_and(|s| s.attribute("Id") == Some("PersonalFolder")));
        let directories = package.descendants("Directory");
        assert_eq!(directories.len(), 1);
        assert_eq!(directories[0].attribute("Name"), Some("Reporter"));

        let components = package.descendants("Component");
        assert_eq!(components.len(), 2);
        let payload_components: Vec<_> = package
            .descendants("File")
            .into_iter()
            .filter(|f| f.attribute("Source").is_some_and(|s| s.ends_with("report.exe")))
            .collect();
        assert_eq!(payload_components.len(), 1);

        let customs = package.descendants("Custom");
        assert_eq!(customs.len(), 1);
        assert_eq!(customs[0].attribute("Before"), Some("InstallFinalize"));
        assert_eq!(customs[0].attribute("Condition"), Some("NOT Installed"));
        assert!(customs[0]
            .attribute("Action")
            .is_some_and(|a| a.starts_with("PostInstall_")));

        let custom_action = package.find("CustomAction");
        assert!(custom_action.is_some_and(|c| c.attribute("BinaryRef") == Some("Wix4UtilCA_x64")
            && c.attribute("Execute") == Some("deferred")
            && c.attribute("Impersonate") == Some("no")
            && c.attribute("Return") == Some("check")));
        assert!(package
            .find("Binary")
            .is_some_and(|b| b.attribute("Id") == Some("Wix4UtilCA_x64")));
        assert!(package
            .find("SetProperty")
            .and_then(|s| s.attribute("Value"))
            .is_some_and(|v| v.contains("[#File_postinstall.js]")));
    }

    #[test]
    fn test_feature_references_every_component_once() {
        let Some(project) = project(&["a.txt", "sub/b.txt", "sub/deeper/c.txt", "sub/d.txt"], &[])
        else {
            return;
        };
        let info = build_info("1.2.3", r"C:\Program Files\Acme");
        let Ok(generated) = generate(&info, &project.options) else {
            assert!(false, "generation should succeed");
            return;
        };
        let Some(package) = package(&generated) else {
            return;
        };

        let mut component_ids: Vec<&str> = package
            .descendants("Component")
            .iter()
            .filter_map(|c| c.attribute("Id"))
            .collect();
        let mut refs: Vec<&str> = package
            .find("Feature")
            .map(|f| f.children.iter().filter_map(|c| c.attribute("Id")).collect())
            .unwrap_or_default();
        component_ids.sort_unstable();
        refs.sort_unstable();
        assert_eq!(component_ids.len(), 4);
        assert_eq!(component_ids, refs);

        // Acme, sub, deeper
        assert_eq!(package.descendants("Directory").len(), 3);
        assert!(package.find("InstallExecuteSequence").is_none());
        assert!(package.find("Binary").is_none());
        assert!(!generated.has_actions());
    }

    #[test]
    fn test_literal_install_path_uses_synthetic_root() {
        let Some(project) = project(&["tool.exe"], &[]) else {
            return;
        };
        let info = build_info("1.0.0", r"D:\Tools\Acme");
        let Ok(generated) = generate(&info, &project.options) else {
            assert!(false, "generation should succeed");
            return;
        };
        assert_eq!(generated.tree.root().id, "INSTALLFOLDER");
        let names: Vec<&str> = package(&generated)
            .map(|p| {
                p.descendants("Directory")
                    .iter()
                    .filter_map(|d| d.attribute("Name"))
                    .collect()
            })
            .unwrap_or_default();
        assert_eq!(names, vec!["D", "Tools", "Acme"]);
    }

    #[test]
    fn test_scheduled_scripts_require_helper_binary() {
        let Some(project) = project(&[], &["preinstall.js"]) else {
            return;
        };
        let info = build_info("1.0.0", r"C:\Program Files\Acme");
        assert!(matches!(
            generate(&info, &project.options),
            Err(ManifestError::MissingHelperBinary)
        ));
    }

    #[test]
    fn test_bad_version_aborts_generation() {
        let Some(project) = project(&["a.txt"], &[]) else {
            return;
        };
        let info = build_info("1.2", r"C:\Program Files\Acme");
        assert!(matches!(
            generate(&info, &project.options),
            Err(ManifestError::VersionFormat(_))
        ));
    }

    #[test]
    fn test_product_code_is_fresh_and_upgrade_code_stable() {
        let Some(project) = project(&["a.txt"], &[]) else {
            return;
        };
        let info = build_info("1.0.0", r"C:\Program Files\Acme");
        let (Ok(first), Ok(second)) = (
            generate(&info, &project.options),
            generate(&info, &project.options),
        ) else {
            assert!(false, "generation should succeed");
            return;
        };
        assert_eq!(first.upgrade_code, second.upgrade_code);
        assert_ne!(first.product_code, second.product_code);
        assert_eq!(
            first.tree.root().children.len(),
            second.tree.root().children.len()
        );
    }
}
