//! Resolution of install paths against well-known Windows Installer roots
//!
//! Install paths are Windows paths regardless of the host the manifest is
//! generated on, so they are handled as strings split on either separator
//! rather than through `std::path`.

/// Synthetic top-level directory used when the install path is not under a known root
pub const SYNTHETIC_ROOT_ID: &str = "INSTALLFOLDER";

/// One well-known root: canonical absolute path and its symbolic directory id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardDirectory {
    pub path: String,
    pub token: &'static str,
}

/// Ordered table of well-known installation roots for one host and user
#[derive(Debug, Clone)]
pub struct StandardDirectoryTable {
    entries: Vec<StandardDirectory>,
}

impl StandardDirectoryTable {
    pub fn new(entries: Vec<StandardDirectory>) -> Self {
        StandardDirectoryTable { entries }
    }

    /// Windows Installer standard directories, with per-user folders for `username`
    pub fn for_user(username: &str) -> Self {
        let user = |rest: &str| format!(r"C:\Users\{}\{}", username, rest);
        let entries = vec![
            (r"C:\Program Files".to_string(), "ProgramFilesFolder"),
            (r"C:\Program Files (x86)".to_string(), "ProgramFiles6432Folder"),
            (r"C:\Program Files\Common Files".to_string(), "CommonFilesFolder"),
            (
                r"C:\Program Files\Common Files (x86)".to_string(),
                "CommonFiles6432Folder",
            ),
            (r"C:\ProgramData".to_string(), "CommonAppDataFolder"),
            (r"C:\Windows".to_string(), "WindowsFolder"),
            (r"C:\Windows\System32".to_string(), "SystemFolder"),
            (r"C:\Windows\SysWOW64".to_string(), "System64Folder"),
            (r"C:\Windows\Fonts".to_string(), "FontsFolder"),
            (user(r"AppData\Local"), "LocalAppDataFolder"),
            (user(r"AppData\Roaming"), "AppDataFolder"),
            (user("Desktop"), "DesktopFolder"),
            (user("Documents"), "PersonalFolder"),
            (user("Favorites"), "FavoritesFolder"),
            (user("My Pictures"), "MyPicturesFolder"),
            (user("NetHood"), "NetHoodFolder"),
            (user("PrintHood"), "PrintHoodFolder"),
            (user("Recent"), "RecentFolder"),
            (user("SendTo"), "SendToFolder"),
            (user("Start Menu"), "StartMenuFolder"),
            (user("Startup"), "StartupFolder"),
            (r"C:\Windows\System".to_string(), "System16Folder"),
            (r"C:\Windows\Temp".to_string(), "TempFolder"),
            (
                r"C:\Windows\System32\config\systemprofile\AppData\Local".to_string(),
                "LocalAppDataFolder",
            ),
        ];

        StandardDirectoryTable::new(
            entries
                .into_iter()
                .map(|(path, token)| StandardDirectory { path, token })
                .collect(),
        )
    }

    pub fn entries(&self) -> &[StandardDirectory] {
        &self.entries
    }

    /// Map an install path onto the most specific known root, or fall back to the literal path
    pub fn resolve(&self, install_path: &str) -> ResolvedInstallTarget {
        let input = path_segments(install_path);

        let mut candidates: Vec<(&StandardDirectory, Vec<String>)> = self
            .entries
            .iter()
            .map(|entry| (entry, path_segments(&entry.path)))
            .collect();
        // Longest path first so nested roots win over their parents; stable for ties
        candidates.sort_by_key(|(_, segments)| std::cmp::Reverse(segments.join("\\").len()));

        for (entry, root) in candidates {
            if root.is_empty() || root.len() > input.len() {
                continue;
            }
            let is_prefix = root
                .iter()
                .zip(&input)
                .all(|(a, b)| a.to_lowercase() == b.to_lowercase());
            if is_prefix {
                let remainder = input[root.len()..].join("\\");
                tracing::debug!(
                    "Install path '{}' resolved to {} with remainder '{}'",
                    install_path,
                    entry.token,
                    remainder
                );
                return ResolvedInstallTarget::Standard {
                    token: entry.token,
                    remainder,
                };
            }
        }

        tracing::debug!(
            "Install path '{}' is not under a standard directory; using literal path",
            install_path
        );
        ResolvedInstallTarget::Literal {
            path: install_path.to_string(),
        }
    }
}

/// Where the install tree is rooted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedInstallTarget {
    /// Under a known root; `remainder` is empty for an exact match
    Standard {
        token: &'static str,
        remainder: String,
    },
    /// Not under any known root; the whole path becomes a directory chain
    Literal { path: String },
}

impl ResolvedInstallTarget {
    /// Id of the top-level `StandardDirectory` element
    pub fn root_id(&self) -> &str {
        match self {
            ResolvedInstallTarget::Standard { token, .. } => token,
            ResolvedInstallTarget::Literal { .. } => SYNTHETIC_ROOT_ID,
        }
    }

    /// Directory segments to create beneath the root before any payload
    pub fn chain(&self) -> Vec<String> {
        match self {
            ResolvedInstallTarget::Standard { remainder, .. } => path_segments(remainder),
            ResolvedInstallTarget::Literal { path } => {
                let mut chain = Vec::new();
                // A rooted path without a drive starts at the filesystem root
                if path.starts_with(['\\', '/']) {
                    chain.push(String::new());
                }
                chain.extend(path_segments(path));
                chain
            }
        }
    }
}

/// Split a Windows-style path into normalized, case-preserving segments
///
/// Both separators are accepted, empty and `.` segments are dropped and `..`
/// removes the previous segment (never a drive).
pub fn path_segments(path: &str) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();
    for part in path.split(['\\', '/']) {
        match part {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| !last.ends_with(':')) {
                    segments.pop();
                }
            }
            _ => segments.push(part.to_string()),
        }
    }
    segments
}
