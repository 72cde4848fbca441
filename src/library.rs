//! Steam root and library folder discovery
//!
//! A Steam root is a directory holding `steamapps/`. Every root is itself the
//! default library; additional libraries are listed in
//! `steamapps/libraryfolders.vdf`:
//!
//! ```text
//! "libraryfolders"
//! {
//!     "0" { "path" "/home/user/.local/share/Steam" ... }
//!     "1" { "path" "/mnt/games/SteamLibrary" ... }
//! }
//! ```
//!
//! Older clients write `"1" "/mnt/games/SteamLibrary"` directly; both shapes are
//! accepted.

use crate::vdf::{self, Node};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory under every root and library holding manifests and content
pub const STEAMAPPS_DIR: &str = "steamapps";

/// Library list, relative to a root
pub const LIBRARY_LIST_FILE: &str = "steamapps/libraryfolders.vdf";

/// Environment variable that overrides root detection
pub const STEAM_ROOT_ENV: &str = "STEAM_ROOT";

/// Where to look for Steam installations
#[derive(Debug, Clone, Default)]
pub struct SteamConfig {
    /// Well-known install locations, highest priority first
    pub candidate_roots: Vec<PathBuf>,
    /// Caller-supplied root, checked before the candidates
    pub override_root: Option<PathBuf>,
    /// Keep Proton and Steam Linux Runtime entries in the catalog
    pub include_tools: bool,
}

impl SteamConfig {
    /// Default Linux install locations plus `$STEAM_ROOT` if set
    pub fn detect() -> Self {
        let candidate_roots = dirs::home_dir()
            .map(|home| default_candidates(&home))
            .unwrap_or_default();
        let override_root = std::env::var_os(STEAM_ROOT_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Self {
            candidate_roots,
            override_root,
            include_tools: false,
        }
    }

    pub fn with_override(mut self, root: Option<PathBuf>) -> Self {
        if root.is_some() {
            self.override_root = root;
        }
        self
    }

    pub fn with_tools(mut self, include_tools: bool) -> Self {
        self.include_tools = include_tools;
        self
    }

    /// Override first, then candidates in priority order
    pub fn search_order(&self) -> Vec<PathBuf> {
        self.override_root
            .iter()
            .chain(self.candidate_roots.iter())
            .cloned()
            .collect()
    }
}

fn default_candidates(home: &Path) -> Vec<PathBuf> {
    vec![
        home.join(".local").join("share").join("Steam"),
        home.join(".steam").join("steam"),
        home.join(".steam").join("debian-installation"),
    ]
}

/// Result of library discovery
#[derive(Debug, Clone, Default, Serialize)]
pub struct Libraries {
    /// Platform roots that were found, deduplicated
    pub roots: Vec<PathBuf>,
    /// Library folders across all roots, deduplicated, roots' default libraries included
    pub paths: Vec<PathBuf>,
}

impl Libraries {
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Highest-priority root, used for user-level data such as playtime
    pub fn primary_root(&self) -> Option<&Path> {
        self.roots.first().map(PathBuf::as_path)
    }
}

/// Resolve every library reachable from the configured roots
pub fn resolve_libraries(config: &SteamConfig) -> Libraries {
    resolve_libraries_from(&config.search_order())
}

/// Steam roots that exist among the configured locations, deduplicated, in
/// search order
pub fn platform_roots(config: &SteamConfig) -> Vec<PathBuf> {
    roots_from(&config.search_order())
}

fn roots_from(candidates: &[PathBuf]) -> Vec<PathBuf> {
    let mut roots = Vec::new();
    let mut seen = HashSet::new();

    for candidate in candidates {
        let Some(root) = normalize(candidate) else {
            debug!("No Steam root at {}", candidate.display());
            continue;
        };
        if !root.join(STEAMAPPS_DIR).is_dir() {
            debug!("{} has no {} directory", root.display(), STEAMAPPS_DIR);
            continue;
        }
        if seen.insert(root.clone()) {
            debug!("Found Steam root {}", root.display());
            roots.push(root);
        }
    }

    roots
}

/// Resolve libraries from an explicit candidate list.
///
/// Never fails: missing roots and malformed list files are logged and skipped.
pub fn resolve_libraries_from(candidates: &[PathBuf]) -> Libraries {
    let roots = roots_from(candidates);
    let mut paths = Vec::new();
    let mut seen = HashSet::new();

    for root in &roots {
        // The root is always a library, even without a list file
        if seen.insert(root.clone()) {
            paths.push(root.clone());
        }

        for path in read_library_list(root) {
            let Some(normalized) = normalize(&path) else {
                warn!(
                    "Library folder {} listed in {} does not exist",
                    path.display(),
                    root.join(LIBRARY_LIST_FILE).display()
                );
                continue;
            };
            if seen.insert(normalized.clone()) {
                paths.push(normalized);
            }
        }
    }

    Libraries { roots, paths }
}

/// Paths listed in a root's `libraryfolders.vdf`, in file order.
///
/// A missing file yields nothing; a malformed one is logged and yields nothing.
pub fn read_library_list(root: &Path) -> Vec<PathBuf> {
    let list_path = root.join(LIBRARY_LIST_FILE);
    let contents = match fs::read_to_string(&list_path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return vec![],
        Err(e) => {
            warn!("Cannot read {}: {}", list_path.display(), e);
            return vec![];
        }
    };

    match vdf::parse(&contents) {
        Ok(doc) => library_entries(&doc),
        Err(e) => {
            warn!("Ignoring malformed {}: {}", list_path.display(), e);
            vec![]
        }
    }
}

fn library_entries(doc: &Node) -> Vec<PathBuf> {
    let Some(folders) = doc.get("libraryfolders") else {
        return vec![];
    };

    folders
        .entries()
        .iter()
        .filter(|(key, _)| !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|(_, entry)| match entry {
            Node::Leaf(path) => Some(path.as_str()),
            Node::Map(_) => entry.get("path").and_then(Node::as_str),
        })
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Resolve symlinks and strip trailing separators; `None` if the path is gone
fn normalize(path: &Path) -> Option<PathBuf> {
    fs::canonicalize(path).ok()
}
