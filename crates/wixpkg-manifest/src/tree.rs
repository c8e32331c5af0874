//! Installed directory tree
//!
//! Nodes live in an arena; each node keeps its children in insertion order plus
//! an index keyed by the segment-derived id, so sibling lookup is O(1) and two
//! siblings can never share an id.

use crate::identity;
use ahash::{AHashMap, AHashSet};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Index of a node in the tree arena
pub type NodeId = usize;

/// Name used for a segment that is empty once separators are removed
pub const ROOT_SENTINEL: &str = "ROOT";

/// A file to install, always the key path of its component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub id: String,
    pub source: PathBuf,
}

/// Installer component holding exactly one file
#[derive(Debug, Clone)]
pub struct ComponentNode {
    pub id: String,
    pub guid: Uuid,
    pub file: FileEntry,
}

#[derive(Debug, Clone)]
pub struct DirectoryNode {
    /// Id derived from the path segment; the sibling lookup key
    pub key: String,
    /// Id emitted in the manifest, unique across the whole tree
    pub id: String,
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub components: Vec<ComponentNode>,
    child_index: AHashMap<String, NodeId>,
}

impl DirectoryNode {
    fn new(key: String, id: String, name: String, parent: Option<NodeId>) -> Self {
        DirectoryNode {
            key,
            id,
            name,
            parent,
            children: Vec::new(),
            components: Vec::new(),
            child_index: AHashMap::new(),
        }
    }

    /// Child with the given segment-derived id, if any
    pub fn child(&self, key: &str) -> Option<NodeId> {
        self.child_index.get(key).copied()
    }
}

/// Derive `(id, name)` for one path segment
///
/// The id strips separators and the drive colon and replaces spaces with `_`;
/// the name strips the same characters but keeps spaces.
pub fn directory_id_name(segment: &str) -> (String, String) {
    let stripped: String = segment
        .chars()
        .filter(|c| !matches!(c, '\\' | '/' | ':'))
        .collect();
    let id = format!("dir_{}", stripped.replace(' ', "_"));
    let name = if stripped.is_empty() {
        ROOT_SENTINEL.to_string()
    } else {
        stripped
    };
    (id, name)
}

fn file_id_base(file_name: &str) -> String {
    let sanitized: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("File_{}", sanitized)
}

fn claim_unique(used: &mut AHashSet<String>, base: String) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", base, n);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Directory/component tree rooted at one standard (or synthetic) directory
#[derive(Debug, Clone)]
pub struct DirectoryTree {
    nodes: Vec<DirectoryNode>,
    directory_ids: AHashSet<String>,
    file_ids: AHashSet<String>,
    file_index: AHashMap<PathBuf, String>,
    feature: Vec<String>,
}

impl DirectoryTree {
    pub const ROOT: NodeId = 0;

    pub fn new(root_id: &str) -> Self {
        let mut directory_ids = AHashSet::new();
        directory_ids.insert(root_id.to_string());
        DirectoryTree {
            nodes: vec![DirectoryNode::new(
                root_id.to_string(),
                root_id.to_string(),
                String::new(),
                None,
            )],
            directory_ids,
            file_ids: AHashSet::new(),
            file_index: AHashMap::new(),
            feature: Vec::new(),
        }
    }

    pub fn root(&self) -> &DirectoryNode {
        &self.nodes[Self::ROOT]
    }

    pub fn node(&self, id: NodeId) -> &DirectoryNode {
        &self.nodes[id]
    }

    /// Number of directory nodes, excluding the root
    pub fn directory_count(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn component_count(&self) -> usize {
        self.nodes.iter().map(|n| n.components.len()).sum()
    }

    /// Iterate over every component in the tree
    pub fn components(&self) -> impl Iterator<Item = &ComponentNode> {
        self.nodes.iter().flat_map(|n| n.components.iter())
    }

    /// Component ids referenced by the single feature, in creation order
    pub fn feature_refs(&self) -> &[String] {
        &self.feature
    }

    /// File id assigned to a source file, if it was added
    pub fn file_id(&self, source: &Path) -> Option<&str> {
        self.file_index.get(source).map(String::as_str)
    }

    /// Find or create the child of `parent` for one path segment
    pub fn ensure_child(&mut self, parent: NodeId, segment: &str) -> NodeId {
        let (key, name) = directory_id_name(segment);
        if let Some(existing) = self.nodes[parent].child(&key) {
            return existing;
        }

        let id = claim_unique(&mut self.directory_ids, key.clone());
        let idx = self.nodes.len();
        self.nodes.push(DirectoryNode::new(key.clone(), id, name, Some(parent)));
        let parent_node = &mut self.nodes[parent];
        parent_node.children.push(idx);
        parent_node.child_index.insert(key, idx);
        idx
    }

    /// Find or create the chain of directories for `segments` under `parent`
    pub fn ensure_path<I, S>(&mut self, parent: NodeId, segments: I) -> NodeId
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        segments.into_iter().fold(parent, |current, segment| {
            self.ensure_child(current, segment.as_ref())
        })
    }

    /// Add one file as a new component of `directory` and reference it from the feature
    pub fn add_file(&mut self, directory: NodeId, source: &Path) -> &ComponentNode {
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_id = claim_unique(&mut self.file_ids, file_id_base(&file_name));
        self.file_index.insert(source.to_path_buf(), file_id.clone());

        let component = ComponentNode {
            id: identity::component_id(),
            guid: identity::component_guid(),
            file: FileEntry {
                id: file_id,
                source: source.to_path_buf(),
            },
        };
        self.feature.push(component.id.clone());

        let components = &mut self.nodes[directory].components;
        components.push(component);
        &components[components.len() - 1]
    }
}
