//! Installed game discovery - reading `appmanifest_*.acf` files
//!
//! Each library folder looks like:
//!
//! ```text
//! <library>/steamapps/
//!     appmanifest_<appid>.acf     manifest, the client's "installed" signal
//!     common/<installdir>/        game files
//!     compatdata/<appid>/         Proton prefix
//!     shadercache/<appid>/        compiled shaders
//! ```
//!
//! Every manifest is read independently; a bad one is recorded as a diagnostic
//! and never stops discovery of the rest.

use crate::error::{Result, SweepError};
use crate::library::STEAMAPPS_DIR;
use crate::size::reclaimable_size;
use crate::vdf::{self, Node};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const MANIFEST_PREFIX: &str = "appmanifest_";
const MANIFEST_SUFFIX: &str = ".acf";
const CONTENT_DIR: &str = "common";

/// Per-game directories kept outside the install folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuxiliaryKind {
    /// Proton / Wine prefix
    CompatData,
    ShaderCache,
}

impl AuxiliaryKind {
    pub const ALL: [AuxiliaryKind; 2] = [AuxiliaryKind::CompatData, AuxiliaryKind::ShaderCache];

    pub fn dir_name(self) -> &'static str {
        match self {
            AuxiliaryKind::CompatData => "compatdata",
            AuxiliaryKind::ShaderCache => "shadercache",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AuxiliaryKind::CompatData => "Proton data",
            AuxiliaryKind::ShaderCache => "shader cache",
        }
    }
}

/// An auxiliary directory found on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuxiliaryPath {
    pub kind: AuxiliaryKind,
    pub path: PathBuf,
    pub size: u64,
}

/// Problems worth flagging on an otherwise listable item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogWarning {
    /// Manifest present but the install folder is gone
    MissingContent,
}

impl CatalogWarning {
    pub fn describe(self) -> &'static str {
        match self {
            CatalogWarning::MissingContent => "game folder missing",
        }
    }
}

/// One installed game in one library
#[derive(Debug, Clone, Serialize)]
pub struct InventoryItem {
    pub appid: String,
    pub name: String,
    pub install_dir: String,
    pub library: PathBuf,
    pub manifest_path: PathBuf,
    pub content_path: PathBuf,
    /// Auxiliary directories that existed at discovery time
    pub auxiliary: Vec<AuxiliaryPath>,
    pub content_size: u64,
    /// Measured size of content plus auxiliary directories
    pub size_on_disk: u64,
    /// `SizeOnDisk` as written in the manifest; informational only
    pub declared_size: Option<u64>,
    /// Has a Proton prefix on disk
    pub uses_compat_layer: bool,
    pub playtime_minutes: u64,
    pub warnings: Vec<CatalogWarning>,
}

impl InventoryItem {
    /// Location of an auxiliary directory, whether or not it exists
    pub fn auxiliary_path(&self, kind: AuxiliaryKind) -> PathBuf {
        auxiliary_dir(&self.library, kind, &self.appid)
    }

    /// Proton and Steam runtimes install like games but are client tools
    pub fn is_tool(&self) -> bool {
        is_tool_name(&self.name)
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

fn is_tool_name(name: &str) -> bool {
    name.contains("Proton") || name.contains("Runtime")
}

fn auxiliary_dir(library: &Path, kind: AuxiliaryKind, appid: &str) -> PathBuf {
    library.join(STEAMAPPS_DIR).join(kind.dir_name()).join(appid)
}

/// Discovery knobs
#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    pub include_tools: bool,
    /// Minutes played per appid
    pub playtime: HashMap<String, u64>,
}

/// A manifest or library that could not be read
#[derive(Debug)]
pub struct Diagnostic {
    pub path: PathBuf,
    pub error: SweepError,
}

/// Outcome of one discovery pass
#[derive(Debug, Default)]
pub struct Catalog {
    pub items: Vec<InventoryItem>,
    pub diagnostics: Vec<Diagnostic>,
    /// Tool entries left out by `CatalogOptions::include_tools`
    pub skipped_tools: usize,
}

impl Catalog {
    pub fn total_size(&self) -> u64 {
        self.items.iter().map(|item| item.size_on_disk).sum()
    }
}

/// Build the inventory for a set of library folders.
///
/// Manifests are read in parallel. Items come back sorted by name, then appid,
/// then library.
pub fn build_catalog(libraries: &[PathBuf], options: &CatalogOptions) -> Catalog {
    let mut catalog = Catalog::default();
    let mut manifests = Vec::new();

    for library in libraries {
        match list_manifests(library) {
            Ok(found) => {
                debug!("{} manifests in {}", found.len(), library.display());
                manifests.extend(found.into_iter().map(|m| (library.as_path(), m)));
            }
            Err(error) => {
                warn!("Cannot list manifests in {}: {}", library.display(), error);
                catalog.diagnostics.push(Diagnostic {
                    path: library.clone(),
                    error,
                });
            }
        }
    }

    let results: Vec<(PathBuf, Result<InventoryItem>)> = manifests
        .par_iter()
        .map(|(library, manifest)| (manifest.clone(), read_manifest(manifest, library)))
        .collect();

    for (path, result) in results {
        match result {
            Ok(item) if item.is_tool() && !options.include_tools => {
                debug!("Skipping tool {} ({})", item.name, item.appid);
                catalog.skipped_tools += 1;
            }
            Ok(mut item) => {
                item.playtime_minutes = options.playtime.get(&item.appid).copied().unwrap_or(0);
                catalog.items.push(item);
            }
            Err(error) => {
                warn!("Skipping manifest {}: {}", path.display(), error);
                catalog.diagnostics.push(Diagnostic { path, error });
            }
        }
    }

    catalog.items.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.appid.cmp(&b.appid))
            .then_with(|| a.library.cmp(&b.library))
    });

    catalog
}

/// Manifest files in a library, sorted by file name
pub fn list_manifests(library: &Path) -> Result<Vec<PathBuf>> {
    let dir = library.join(STEAMAPPS_DIR);
    let mut manifests = Vec::new();

    for entry in fs::read_dir(&dir).map_err(|e| SweepError::path_access(&dir, e))? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if name.starts_with(MANIFEST_PREFIX)
            && name.ends_with(MANIFEST_SUFFIX)
            && entry.file_type().map(|t| t.is_file()).unwrap_or(false)
        {
            manifests.push(entry.path());
        }
    }

    manifests.sort();
    Ok(manifests)
}

/// Read one manifest and measure the game it describes
pub fn read_manifest(manifest: &Path, library: &Path) -> Result<InventoryItem> {
    let contents = fs::read(manifest).map_err(|e| SweepError::path_access(manifest, e))?;
    let doc = vdf::parse_bytes(&contents)?;
    let state = doc.get("AppState").ok_or_else(|| SweepError::MissingField {
        field: "AppState",
        path: manifest.to_path_buf(),
    })?;

    let appid = required(state, "appid", manifest)?;
    if appid.parse::<u32>().is_err() {
        return Err(SweepError::InvalidField {
            field: "appid",
            value: appid.to_string(),
            path: manifest.to_path_buf(),
        });
    }
    let name = required(state, "name", manifest)?;
    let install_dir = required(state, "installdir", manifest)?;
    if install_dir.contains('/') || install_dir == "." || install_dir == ".." {
        return Err(SweepError::InvalidField {
            field: "installdir",
            value: install_dir.to_string(),
            path: manifest.to_path_buf(),
        });
    }

    let declared_size = state
        .get("SizeOnDisk")
        .and_then(Node::as_str)
        .and_then(|s| s.parse::<u64>().ok());

    let content_path = library.join(STEAMAPPS_DIR).join(CONTENT_DIR).join(install_dir);
    let content_exists = content_path.exists();
    // A symlinked install folder frees nothing beyond the link itself
    let content_size = reclaimable_size(&content_path);

    let auxiliary: Vec<AuxiliaryPath> = AuxiliaryKind::ALL
        .iter()
        .map(|&kind| (kind, auxiliary_dir(library, kind, appid)))
        .filter(|(_, path)| path.exists())
        .map(|(kind, path)| AuxiliaryPath {
            kind,
            size: reclaimable_size(&path),
            path,
        })
        .collect();

    let uses_compat_layer = auxiliary
        .iter()
        .any(|aux| aux.kind == AuxiliaryKind::CompatData);
    let size_on_disk = content_size + auxiliary.iter().map(|aux| aux.size).sum::<u64>();

    let mut warnings = Vec::new();
    if !content_exists {
        warnings.push(CatalogWarning::MissingContent);
    }

    Ok(InventoryItem {
        appid: appid.to_string(),
        name: name.to_string(),
        install_dir: install_dir.to_string(),
        library: library.to_path_buf(),
        manifest_path: manifest.to_path_buf(),
        content_path,
        auxiliary,
        content_size,
        size_on_disk,
        declared_size,
        uses_compat_layer,
        playtime_minutes: 0,
        warnings,
    })
}

fn required<'a>(state: &'a Node, field: &'static str, manifest: &Path) -> Result<&'a str> {
    state
        .get(field)
        .and_then(Node::as_str)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| SweepError::MissingField {
            field,
            path: manifest.to_path_buf(),
        })
}
