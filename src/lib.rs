//! Library interface for steamsweep
//!
//! Discovers installed Steam games across every library folder, measures what
//! they occupy on disk, and removes them in the same order the Steam client
//! does, so removed games show up as "not installed" rather than corrupted.
//!
//! ```no_run
//! use steamsweep::{CatalogOptions, SteamConfig, build_catalog, resolve_libraries};
//!
//! let config = SteamConfig::detect();
//! let libraries = resolve_libraries(&config);
//! let catalog = build_catalog(&libraries.paths, &CatalogOptions::default());
//! for item in &catalog.items {
//!     println!("{} {} {}", item.appid, item.name, item.size_on_disk);
//! }
//! ```

pub mod catalog;
pub mod error;
pub mod library;
pub mod playtime;
pub mod process;
pub mod size;
pub mod uninstall;
pub mod vdf;

// Re-export commonly used items
pub use catalog::{Catalog, CatalogOptions, InventoryItem, build_catalog};
pub use error::{Result, SweepError};
pub use library::{Libraries, SteamConfig, platform_roots, resolve_libraries};
pub use process::{ProcessProbe, SteamProcessProbe};
pub use size::{format_size, reclaimable_size, size_of};
pub use uninstall::{
    CancelToken, SelectionSet, UninstallEvent, UninstallOptions, UninstallResult,
    UninstallStatus, UninstallSummary, Uninstaller,
};
