use crate::app::Event;
use crate::error::{Error, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// One immediate child of the cache root.
///
/// `file_name` is the name on disk and identifies the entry within a scan;
/// `name` is its lossy rendering for display and may collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub name: String,
    pub file_name: OsString,
    pub size_bytes: u64,
    pub is_dir: bool,
    pub selected: bool,
}

impl CacheEntry {
    pub fn new(name: impl Into<String>, size_bytes: u64, is_dir: bool) -> Self {
        let name = name.into();
        Self {
            file_name: OsString::from(&name),
            name,
            size_bytes,
            is_dir,
            selected: false,
        }
    }

    pub fn from_file_name(file_name: OsString, size_bytes: u64, is_dir: bool) -> Self {
        Self {
            name: file_name.to_string_lossy().into_owned(),
            file_name,
            size_bytes,
            is_dir,
            selected: false,
        }
    }
}

/// Entries in filesystem enumeration order.
pub type Inventory = Vec<CacheEntry>;

#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Leave out directories whose aggregated size is zero.
    pub skip_empty_dirs: bool,
}

/// Sum of regular file lengths beneath `path`. Unreadable subtrees are
/// skipped and whatever was already counted is kept.
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!(root = %path.display(), error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

pub fn scan(root: &Path, options: &ScanOptions) -> Result<Inventory> {
    let read_dir = fs::read_dir(root).map_err(|source| Error::Scan {
        path: root.to_path_buf(),
        source,
    })?;

    let mut inventory = Inventory::new();

    for dir_entry in read_dir {
        let dir_entry = match dir_entry {
            Ok(e) => e,
            Err(err) => {
                warn!(root = %root.display(), error = %err, "skipping unreadable child");
                continue;
            }
        };

        let file_name = dir_entry.file_name();
        let name = file_name.to_string_lossy().into_owned();

        // DirEntry::file_type and DirEntry::metadata do not follow symlinks
        let file_type = match dir_entry.file_type() {
            Ok(t) => t,
            Err(err) => {
                warn!(name = %name, error = %err, "skipping child without file type");
                continue;
            }
        };

        if file_type.is_dir() {
            let size_bytes = dir_size(&dir_entry.path());
            if size_bytes == 0 && options.skip_empty_dirs {
                debug!(name = %name, "skipping empty directory");
                continue;
            }
            inventory.push(CacheEntry::from_file_name(file_name, size_bytes, true));
        } else {
            match dir_entry.metadata() {
                Ok(meta) => inventory.push(CacheEntry::from_file_name(file_name, meta.len(), false)),
                Err(err) => warn!(name = %name, error = %err, "skipping child without metadata"),
            }
        }
    }

    info!(
        root = %root.display(),
        entries = inventory.len(),
        total = total_size(&inventory),
        "scan finished"
    );
    Ok(inventory)
}

/// Runs [`scan`] off the caller's thread and posts exactly one
/// `Event::ScanFinished` to `sink`.
pub fn spawn_scan(root: PathBuf, options: ScanOptions, sink: Sender<Event>) -> JoinHandle<()> {
    thread::spawn(move || {
        info!(root = %root.display(), "scan started");
        let result = scan(&root, &options);
        // the receiver is gone once the controller has quit
        let _ = sink.send(Event::ScanFinished(result));
    })
}

pub fn total_size(entries: &[CacheEntry]) -> u64 {
    entries.iter().map(|e| e.size_bytes).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use tempfile::TempDir;

    fn write_bytes(path: &Path, len: usize) {
        fs::write(path, vec![0u8; len]).unwrap();
    }

    fn find<'a>(inventory: &'a [CacheEntry], name: &str) -> &'a CacheEntry {
        inventory
            .iter()
            .find(|e| e.name == name)
            .unwrap_or_else(|| panic!("missing entry {name}"))
    }

    #[test]
    fn test_scan_aggregates_directory_sizes() {
        let tmp = TempDir::new().unwrap();
        write_bytes(&tmp.path().join("file"), 100);
        fs::create_dir(tmp.path().join("subdir")).unwrap();
        write_bytes(&tmp.path().join("subdir/a"), 30);
        write_bytes(&tmp.path().join("subdir/b"), 70);

        let inventory = scan(tmp.path(), &ScanOptions::default()).unwrap();

        assert_eq!(inventory.len(), 2);
        assert_eq!(find(&inventory, "file"), &CacheEntry::new("file", 100, false));
        assert_eq!(find(&inventory, "subdir"), &CacheEntry::new("subdir", 100, true));
        assert_eq!(total_size(&inventory), 200);
    }

    #[test]
    fn test_scan_preserves_enumeration_order() {
        let tmp = TempDir::new().unwrap();
        write_bytes(&tmp.path().join("small"), 1);
        write_bytes(&tmp.path().join("large"), 500);
        write_bytes(&tmp.path().join("medium"), 50);

        let expected: Vec<String> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        let inventory = scan(tmp.path(), &ScanOptions::default()).unwrap();
        let names: Vec<String> = inventory.into_iter().map(|e| e.name).collect();

        assert_eq!(names, expected);
    }

    #[test]
    fn test_dir_size_counts_nested_files_only() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("a/b/c")).unwrap();
        write_bytes(&tmp.path().join("a/one"), 10);
        write_bytes(&tmp.path().join("a/b/two"), 20);
        write_bytes(&tmp.path().join("a/b/c/three"), 30);

        assert_eq!(dir_size(&tmp.path().join("a")), 60);
    }

    #[test]
    fn test_empty_directories_kept_by_default() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("empty")).unwrap();
        fs::create_dir_all(tmp.path().join("nested/empty")).unwrap();

        let inventory = scan(tmp.path(), &ScanOptions::default()).unwrap();
        assert_eq!(inventory.len(), 2);
        assert!(inventory.iter().all(|e| e.is_dir && e.size_bytes == 0));
    }

    #[test]
    fn test_skip_empty_dirs_option() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("empty")).unwrap();
        fs::create_dir(tmp.path().join("full")).unwrap();
        write_bytes(&tmp.path().join("full/data"), 5);
        write_bytes(&tmp.path().join("zero-file"), 0);

        let options = ScanOptions {
            skip_empty_dirs: true,
        };
        let inventory = scan(tmp.path(), &options).unwrap();
        let mut names: Vec<&str> = inventory.iter().map(|e| e.name.as_str()).collect();
        names.sort_unstable();

        // zero-length files are not directories and stay listed
        assert_eq!(names, vec!["full", "zero-file"]);
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("does-not-exist");

        let err = scan(&missing, &ScanOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Scan { ref path, .. } if path == &missing));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_do_not_contribute() {
        let tmp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        write_bytes(&outside.path().join("big"), 4096);
        fs::create_dir(tmp.path().join("dir")).unwrap();
        write_bytes(&tmp.path().join("dir/real"), 8);
        std::os::unix::fs::symlink(outside.path().join("big"), tmp.path().join("dir/link"))
            .unwrap();
        std::os::unix::fs::symlink(outside.path(), tmp.path().join("dir/linkdir")).unwrap();

        assert_eq!(dir_size(&tmp.path().join("dir")), 8);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subtree_keeps_partial_sum() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let cache = tmp.path().join("cache");
        fs::create_dir_all(cache.join("locked")).unwrap();
        write_bytes(&cache.join("visible"), 40);
        write_bytes(&cache.join("locked/hidden"), 1000);
        fs::set_permissions(cache.join("locked"), fs::Permissions::from_mode(0o000)).unwrap();

        let still_readable = fs::read_dir(cache.join("locked")).is_ok();
        let result = scan(tmp.path(), &ScanOptions::default());
        fs::set_permissions(cache.join("locked"), fs::Permissions::from_mode(0o755)).unwrap();

        if still_readable {
            // privileged users ignore directory permissions
            return;
        }
        let inventory = result.unwrap();
        assert_eq!(find(&inventory, "cache").size_bytes, 40);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_stay_distinct() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = TempDir::new().unwrap();
        let raw = OsStr::from_bytes(b"junk\xff");
        write_bytes(&tmp.path().join(raw), 5);
        write_bytes(&tmp.path().join("junk\u{FFFD}"), 7);

        let inventory = scan(tmp.path(), &ScanOptions::default()).unwrap();

        assert_eq!(inventory.len(), 2);
        assert!(inventory.iter().all(|e| e.name == "junk\u{FFFD}"));
        let entry = inventory.iter().find(|e| e.file_name.as_os_str() == raw).unwrap();
        assert_eq!(entry.size_bytes, 5);
    }

    #[test]
    fn test_spawn_scan_posts_one_message() {
        let tmp = TempDir::new().unwrap();
        write_bytes(&tmp.path().join("file"), 3);
        let (tx, rx) = mpsc::channel();

        spawn_scan(tmp.path().to_path_buf(), ScanOptions::default(), tx)
            .join()
            .unwrap();

        match rx.recv().unwrap() {
            Event::ScanFinished(Ok(inventory)) => assert_eq!(total_size(&inventory), 3),
            other => panic!("unexpected event {other:?}"),
        }
        // the worker dropped its sender after the single message
        assert!(rx.recv().is_err());
    }
}
