//! Post-generation manifest check
//!
//! Re-reads a written manifest and confirms the elements the compiler needs are present.

use crate::errors::ManifestError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;

const REQUIRED: &[&str] = &["Package", "Component", "ComponentRef"];
const REQUIRED_WITH_SCRIPTS: &[&str] = &["CustomAction", "InstallExecuteSequence"];
const DIRECTORY_ELEMENTS: &[&str] = &["Directory", "StandardDirectory"];

/// Names of required elements missing from `content`, in a stable order
pub fn missing_elements(content: &str, has_scripts: bool) -> Result<Vec<String>, ManifestError> {
    let mut seen = Vec::<String>::new();
    let mut reader = Reader::from_str(content);

    loop {
        match reader.read_event().map_err(ManifestError::xml)? {
            Event::Start(e) | Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if !seen.contains(&name) {
                    seen.push(name);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let mut missing: Vec<String> = REQUIRED
        .iter()
        .filter(|name| !contains(&seen, name))
        .map(|name| (*name).to_string())
        .collect();

    if !DIRECTORY_ELEMENTS.iter().any(|name| contains(&seen, name)) {
        missing.push(DIRECTORY_ELEMENTS.join(" or "));
    }

    if has_scripts {
        missing.extend(
            REQUIRED_WITH_SCRIPTS
                .iter()
                .filter(|name| !contains(&seen, name))
                .map(|name| (*name).to_string()),
        );
    }

    Ok(missing)
}

fn contains(seen: &[String], name: &str) -> bool {
    seen.iter().any(|s| s == name)
}

/// Verify the manifest at `path`, failing with the list of missing elements
pub fn verify_manifest(path: &Path, has_scripts: bool) -> Result<(), ManifestError> {
    let content = std::fs::read_to_string(path).map_err(|e| ManifestError::io(path, e))?;
    let missing = missing_elements(&content, has_scripts)?;
    if !missing.is_empty() {
        return Err(ManifestError::Verification {
            path: path.to_path_buf(),
            missing,
        });
    }
    tracing::info!("WXS file verified successfully");
    Ok(())
}
