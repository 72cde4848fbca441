//! Playtime lookup from per-user `localconfig.vdf` files

use crate::vdf;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

const APPS_PATH: &[&str] = &["UserLocalConfigStore", "Software", "Valve", "Steam", "apps"];

/// Minutes played per appid, highest value across all local accounts.
///
/// Missing or unreadable user data yields an empty map.
pub fn load(root: &Path) -> HashMap<String, u64> {
    let mut playtime = HashMap::new();

    let Ok(users) = fs::read_dir(root.join("userdata")) else {
        return playtime;
    };

    for user in users.flatten() {
        let config = user.path().join("config").join("localconfig.vdf");
        let contents = match fs::read_to_string(&config) {
            Ok(c) => c,
            Err(_) => continue,
        };
        let doc = match vdf::parse(&contents) {
            Ok(doc) => doc,
            Err(e) => {
                debug!("Skipping {}: {}", config.display(), e);
                continue;
            }
        };
        let Some(apps) = doc.get_path(APPS_PATH) else {
            continue;
        };

        for (appid, app) in apps.entries() {
            let Some(minutes) = app
                .get("Playtime")
                .and_then(|n| n.as_str())
                .and_then(|s| s.parse::<u64>().ok())
            else {
                continue;
            };
            let entry = playtime.entry(appid.clone()).or_insert(0);
            *entry = (*entry).max(minutes);
        }
    }

    playtime
}

/// `"-"` for never played, otherwise hours with one decimal
pub fn format_playtime(minutes: u64) -> String {
    if minutes == 0 {
        return "-".to_string();
    }
    format!("{:.1}h", minutes as f64 / 60.0)
}
