//! Command implementations for the steamsweep CLI
//!
//! - **list**: installed games with sizes and Proton usage
//! - **libraries**: Steam roots and library folders that were found
//! - **uninstall**: remove selected games
//! - **completions**: shell completion scripts

pub mod completions;
pub mod libraries;
pub mod list;
pub mod uninstall;

pub use completions::completions;
pub use libraries::libraries;
pub use list::list;
pub use uninstall::{UninstallArgs, uninstall};

use anyhow::{Result, bail};
use steamsweep::{Catalog, CatalogOptions, Libraries, SteamConfig, build_catalog, playtime};

/// Everything one discovery pass found
pub(crate) struct Discovery {
    pub libraries: Libraries,
    pub catalog: Catalog,
}

/// Find Steam, its libraries, and every installed game
pub(crate) fn discover(config: &SteamConfig) -> Result<Discovery> {
    let libraries = steamsweep::resolve_libraries(config);
    if libraries.is_empty() {
        let checked: Vec<String> = config
            .search_order()
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        bail!(
            "Could not find a Steam installation. Checked: {}",
            checked.join(", ")
        );
    }

    let playtime = libraries
        .primary_root()
        .map(playtime::load)
        .unwrap_or_default();
    let options = CatalogOptions {
        include_tools: config.include_tools,
        playtime,
    };
    let catalog = build_catalog(&libraries.paths, &options);

    Ok(Discovery { libraries, catalog })
}

/// Cut `text` to `width` characters, marking the cut with an ellipsis
pub(crate) fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
