//! On-disk size accounting for game directories

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Total size in bytes of every regular file under `path`.
///
/// A missing path is 0. Symlinks are followed, but each directory is visited at
/// most once, so link cycles and duplicate links cannot inflate the total.
/// Unreadable subtrees contribute 0 and are logged.
pub fn size_of(path: &Path) -> u64 {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return 0,
        Err(e) => {
            warn!("Cannot stat {}: {}", path.display(), e);
            return 0;
        }
    };

    if metadata.is_file() {
        return metadata.len();
    }
    if !metadata.is_dir() {
        return 0;
    }

    let mut visited = HashSet::new();
    let mut total = 0u64;
    let mut walker = WalkDir::new(path).follow_links(true).max_open(64).into_iter();

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                if let Some(ancestor) = e.loop_ancestor() {
                    warn!(
                        "Symlink loop under {} back to {}, not counted",
                        path.display(),
                        ancestor.display()
                    );
                } else {
                    warn!("Skipping unreadable entry under {}: {}", path.display(), e);
                }
                continue;
            }
        };

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                debug!("Cannot stat {}: {}", entry.path().display(), e);
                continue;
            }
        };

        if metadata.is_dir() {
            if let Some(id) = identity(&metadata) {
                if !visited.insert(id) {
                    debug!("Already counted {}, skipping", entry.path().display());
                    walker.skip_current_dir();
                }
            }
        } else if metadata.is_file() {
            total += metadata.len();
        }
    }

    total
}

#[cfg(unix)]
fn identity(metadata: &fs::Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((metadata.dev(), metadata.ino()))
}

#[cfg(not(unix))]
fn identity(_metadata: &fs::Metadata) -> Option<(u64, u64)> {
    None
}

/// Bytes that removing `path` itself would free.
///
/// A symlink counts as 0 because only the link is removed, never its target.
/// Directories are measured with [`size_of`].
pub fn reclaimable_size(path: &Path) -> u64 {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_symlink() => 0,
        Ok(metadata) if metadata.is_file() => metadata.len(),
        Ok(_) => size_of(path),
        Err(_) => 0,
    }
}

/// Human-readable byte count
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, len: usize) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, vec![0u8; len]).unwrap();
    }

    #[test]
    fn test_missing_path_is_zero() {
        let temp = TempDir::new().unwrap();
        assert_eq!(size_of(&temp.path().join("nope")), 0);
    }

    #[test]
    fn test_single_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.bin");
        write(&file, 123);
        assert_eq!(size_of(&file), 123);
    }

    #[test]
    fn test_sum_of_children() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("game");
        write(&root.join("top.pak"), 100);
        write(&root.join("data/one.pak"), 200);
        write(&root.join("data/deep/two.pak"), 50);
        write(&root.join("bin/game.x86_64"), 7);
        fs::create_dir_all(root.join("empty")).unwrap();

        let children: u64 = fs::read_dir(&root)
            .unwrap()
            .map(|e| size_of(&e.unwrap().path()))
            .sum();

        assert_eq!(size_of(&root), 357);
        assert_eq!(size_of(&root), children);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_terminates() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("game");
        write(&root.join("sub/file"), 10);
        std::os::unix::fs::symlink(&root, root.join("sub/loop")).unwrap();

        assert_eq!(size_of(&root), 10);
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_linked_twice_counted_once() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("game");
        write(&root.join("real/file"), 40);
        std::os::unix::fs::symlink(root.join("real"), root.join("alias")).unwrap();

        assert_eq!(size_of(&root), 40);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subtree_contributes_zero() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let root = temp.path().join("game");
        write(&root.join("ok.pak"), 30);
        write(&root.join("locked/hidden.pak"), 70);

        let locked = root.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        // root ignores directory permissions
        let readable = fs::read_dir(&locked).is_ok();

        let size = size_of(&root);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if !readable {
            assert_eq!(size, 30);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_reclaimable_size_ignores_link_targets() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("elsewhere");
        write(&target.join("big.pak"), 90);
        let link = temp.path().join("linked");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert_eq!(size_of(&link), 90);
        assert_eq!(reclaimable_size(&link), 0);
        assert_eq!(reclaimable_size(&target), 90);
        assert_eq!(reclaimable_size(&target.join("big.pak")), 90);
        assert_eq!(reclaimable_size(&temp.path().join("nope")), 0);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }
}
