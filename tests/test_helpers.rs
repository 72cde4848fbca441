// Test helpers for isolated testing
// Builds fake Steam installations inside temporary directories
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Paths belonging to one fake installed game
#[derive(Debug, Clone)]
pub struct GamePaths {
    pub manifest: PathBuf,
    pub content: PathBuf,
    pub compatdata: PathBuf,
    pub shadercache: PathBuf,
}

impl GamePaths {
    pub fn all(&self) -> [&PathBuf; 4] {
        [&self.shadercache, &self.compatdata, &self.content, &self.manifest]
    }
}

/// Isolated Steam root using temporary directories
/// Automatically cleaned up when dropped (RAII pattern)
///
/// Layout:
/// - temp/
///   - Steam/steamapps/     (root, also the default library)
///   - <extra libraries>/steamapps/
pub struct TestSteam {
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl TestSteam {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("Steam");
        fs::create_dir_all(root.join("steamapps")).unwrap();
        let root = fs::canonicalize(root).unwrap();

        Self { temp_dir, root }
    }

    /// Create another library folder next to the root
    pub fn add_library(&self, name: &str) -> PathBuf {
        let library = self.temp_dir.path().join(name);
        fs::create_dir_all(library.join("steamapps")).unwrap();
        fs::canonicalize(library).unwrap()
    }

    /// Write `libraryfolders.vdf` listing `libraries` under keys "0", "1", ...
    pub fn write_library_list(&self, libraries: &[&Path]) {
        let mut text = String::from("\"libraryfolders\"\n{\n");
        for (index, library) in libraries.iter().enumerate() {
            text.push_str(&format!(
                "\t\"{}\"\n\t{{\n\t\t\"path\"\t\t\"{}\"\n\t\t\"label\"\t\t\"\"\n\t\t\"apps\"\n\t\t{{\n\t\t}}\n\t}}\n",
                index,
                library.display()
            ));
        }
        text.push_str("}\n");
        fs::write(self.root.join("steamapps/libraryfolders.vdf"), text).unwrap();
    }

    /// Install a fake game: manifest plus `content_bytes` of game files
    pub fn add_game(
        &self,
        library: &Path,
        appid: &str,
        name: &str,
        installdir: &str,
        content_bytes: usize,
    ) -> GamePaths {
        let steamapps = library.join("steamapps");
        let paths = GamePaths {
            manifest: steamapps.join(format!("appmanifest_{appid}.acf")),
            content: steamapps.join("common").join(installdir),
            compatdata: steamapps.join("compatdata").join(appid),
            shadercache: steamapps.join("shadercache").join(appid),
        };

        fs::write(&paths.manifest, manifest(appid, name, installdir)).unwrap();
        write_file(&paths.content.join("data").join("game.pak"), content_bytes);
        paths
    }

    /// Populate an auxiliary directory (`compatdata` or `shadercache`)
    pub fn add_aux(&self, path: &Path, bytes: usize) {
        write_file(&path.join("nested").join("blob"), bytes);
    }
}

impl Default for TestSteam {
    fn default() -> Self {
        Self::new()
    }
}

pub fn manifest(appid: &str, name: &str, installdir: &str) -> String {
    format!(
        "\"AppState\"\n{{\n\t\"appid\"\t\t\"{appid}\"\n\t\"Universe\"\t\t\"1\"\n\t\"name\"\t\t\"{name}\"\n\t\"StateFlags\"\t\t\"4\"\n\t\"installdir\"\t\t\"{installdir}\"\n\t\"SizeOnDisk\"\t\t\"0\"\n}}\n"
    )
}

pub fn write_file(path: &Path, len: usize) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, vec![0u8; len]).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steam_creates_steamapps() {
        let steam = TestSteam::new();
        assert!(steam.root.join("steamapps").is_dir());
    }

    #[test]
    fn test_environment_cleanup() {
        let root = {
            let steam = TestSteam::new();
            steam.root.clone()
        };

        // After steam is dropped, temp directory should be cleaned up
        assert!(!root.exists());
    }

    #[test]
    fn test_add_game_layout() {
        let steam = TestSteam::new();
        let game = steam.add_game(&steam.root, "100", "Game A", "gamea", 10);
        assert!(game.manifest.is_file());
        assert!(game.content.join("data/game.pak").is_file());
        assert!(!game.compatdata.exists());
    }
}
