//! Minimal XML element tree and its serialization

use crate::errors::ManifestError;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Builder-style child
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First direct child with the given name
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All descendants (depth-first, excluding self) with the given name
    pub fn descendants(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        for child in &self.children {
            if child.name == name {
                found.push(child);
            }
            child.collect_descendants(name, found);
        }
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<(), ManifestError> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() {
            writer
                .write_event(Event::Empty(start))
                .map_err(ManifestError::xml)?;
            return Ok(());
        }

        writer
            .write_event(Event::Start(start))
            .map_err(ManifestError::xml)?;
        for child in &self.children {
            child.write_to(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(ManifestError::xml)?;
        Ok(())
    }
}

/// A complete manifest document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Document { root }
    }

    /// Serialize with an XML declaration and two-space indentation
    pub fn to_xml_string(&self) -> Result<String, ManifestError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(ManifestError::xml)?;
        self.root.write_to(&mut writer)?;

        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).map_err(ManifestError::xml)
    }

    /// Write the document, replacing any existing file only once fully written
    pub fn write_to_path(&self, path: &Path) -> Result<(), ManifestError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ManifestError::io(parent, e))?;
        }

        let content = self.to_xml_string()?;

        // Atomic write: write to temp file then rename
        let temp_path = path.with_extension("wxs.tmp");
        {
            let file =
                std::fs::File::create(&temp_path).map_err(|e| ManifestError::io(&temp_path, e))?;
            let mut writer = std::io::BufWriter::new(file);
            writer
                .write_all(content.as_bytes())
                .and_then(|()| writer.flush())
                .map_err(|e| ManifestError::io(&temp_path, e))?;
        }

        std::fs::rename(&temp_path, path).map_err(|e| ManifestError::io(path, e))?;
        tracing::info!("Generated and saved WXS file to {}", path.display());
        Ok(())
    }
}
