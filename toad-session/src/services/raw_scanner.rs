//! Raw slice file scanner
//!
//! Lists the immediate children of an acquisition directory and counts the raw
//! per-slice files they hold. Both session classification and the uncombined
//! session probe go through this scanner so they agree on what a raw file is.

use std::ffi::OsStr;
use std::fs::FileType;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use toad_common::ScanConfig;
use walkdir::{DirEntry, WalkDir};

/// Acquisition directory scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Directory could not be listed
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Kind of a directory child after following symlinks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    /// Sockets, fifos, devices
    Other,
}

/// One immediate child of a scanned directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    pub path: PathBuf,
    pub name: String,
    pub kind: EntryKind,
}

impl ChildEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Scanner matching raw slice files by extension and echo folders by name prefix
#[derive(Debug, Clone)]
pub struct RawFileScanner {
    raw_extension: String,
    echo_marker: String,
}

impl RawFileScanner {
    /// Create a scanner from validated scan rules
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            raw_extension: config.raw_extension.clone(),
            echo_marker: config.echo_marker.clone(),
        }
    }

    /// List the immediate children of `dir`, sorted by file name
    ///
    /// Symlinks are resolved; dangling links are skipped with a warning.
    /// Entry names are converted lossily to UTF-8, so two siblings whose names
    /// are not valid UTF-8 may map to the same name; classification then
    /// reports them as a duplicate sequence.
    pub fn list_children(&self, dir: &Path) -> Result<Vec<ChildEntry>, ScanError> {
        if !dir.exists() {
            return Err(ScanError::PathNotFound(dir.to_path_buf()));
        }

        if !dir.is_dir() {
            return Err(ScanError::NotADirectory(dir.to_path_buf()));
        }

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        let mut children = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(dir).to_path_buf();
                ScanError::Io {
                    path,
                    source: io::Error::from(e),
                }
            })?;

            if let Some(kind) = resolve_kind(&entry) {
                children.push(ChildEntry {
                    path: entry.path().to_path_buf(),
                    name: entry.file_name().to_string_lossy().into_owned(),
                    kind,
                });
            }
        }

        Ok(children)
    }

    /// Count raw slice files directly inside `dir` (no recursion)
    pub fn count_raw_files(&self, dir: &Path) -> Result<usize, ScanError> {
        let count = self
            .list_children(dir)?
            .iter()
            .filter(|child| child.is_file() && self.is_raw_file_name(OsStr::new(&child.name)))
            .count();
        Ok(count)
    }

    /// Whether a file name matches the raw slice pattern
    ///
    /// Hidden files never match.
    pub fn is_raw_file_name(&self, name: &OsStr) -> bool {
        let name = Path::new(name);
        let hidden = name
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false);
        !hidden && name.extension() == Some(OsStr::new(&self.raw_extension))
    }

    /// Whether a directory name marks one echo of a multi-echo run
    pub fn is_echo_dir_name(&self, name: &str) -> bool {
        name.starts_with(&self.echo_marker)
    }
}

impl Default for RawFileScanner {
    fn default() -> Self {
        Self::new(&ScanConfig::default())
    }
}

fn resolve_kind(entry: &DirEntry) -> Option<EntryKind> {
    let file_type = entry.file_type();
    if !file_type.is_symlink() {
        return Some(kind_of(file_type));
    }

    match std::fs::metadata(entry.path()) {
        Ok(metadata) => Some(kind_of(metadata.file_type())),
        Err(e) => {
            tracing::warn!("Skipping dangling link {}: {}", entry.path().display(), e);
            None
        }
    }
}

fn kind_of(file_type: FileType) -> EntryKind {
    if file_type.is_dir() {
        EntryKind::Directory
    } else if file_type.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_raw_file_name_detection() {
        let scanner = RawFileScanner::default();
        assert!(scanner.is_raw_file_name(OsStr::new("IM0001.dcm")));
        assert!(scanner.is_raw_file_name(OsStr::new("slice.001.dcm")));
        assert!(!scanner.is_raw_file_name(OsStr::new("IM0001.DCM")));
        assert!(!scanner.is_raw_file_name(OsStr::new(".hidden.dcm")));
        assert!(!scanner.is_raw_file_name(OsStr::new("notes.txt")));
        assert!(!scanner.is_raw_file_name(OsStr::new("dcm")));
    }

    #[test]
    fn test_echo_dir_name_detection() {
        let scanner = RawFileScanner::default();
        assert!(scanner.is_echo_dir_name("echo_1"));
        assert!(scanner.is_echo_dir_name("echo_"));
        assert!(!scanner.is_echo_dir_name("my_echo_1"));
    }

    #[test]
    fn test_custom_extension() {
        let config = ScanConfig {
            raw_extension: "ima".to_string(),
            echo_marker: "te".to_string(),
        };
        let scanner = RawFileScanner::new(&config);
        assert!(scanner.is_raw_file_name(OsStr::new("a.ima")));
        assert!(!scanner.is_raw_file_name(OsStr::new("a.dcm")));
        assert!(scanner.is_echo_dir_name("te2"));
    }

    #[test]
    fn test_list_nonexistent_path() {
        let scanner = RawFileScanner::default();
        let result = scanner.list_children(Path::new("/nonexistent/toad/path"));
        match result.unwrap_err() {
            ScanError::PathNotFound(_) => {}
            other => panic!("Expected PathNotFound error, got {other:?}"),
        }
    }

    #[test]
    fn test_list_file_as_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("plain.txt");
        fs::write(&file, b"x").unwrap();

        let scanner = RawFileScanner::default();
        match scanner.list_children(&file).unwrap_err() {
            ScanError::NotADirectory(_) => {}
            other => panic!("Expected NotADirectory error, got {other:?}"),
        }
    }

    #[test]
    fn test_children_sorted_and_typed() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir(temp_dir.path().join("b_dir")).unwrap();
        fs::write(temp_dir.path().join("a_file.dcm"), b"").unwrap();
        fs::create_dir(temp_dir.path().join("c_dir")).unwrap();

        let scanner = RawFileScanner::default();
        let children = scanner.list_children(temp_dir.path()).unwrap();
        let names: Vec<&str> = children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a_file.dcm", "b_dir", "c_dir"]);
        assert!(children[0].is_file());
        assert!(children[1].is_dir());
    }

    #[test]
    fn test_count_raw_files_ignores_nested_and_other() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        for i in 0..4 {
            fs::write(root.join(format!("IM{i}.dcm")), b"").unwrap();
        }
        fs::write(root.join("readme.txt"), b"").unwrap();
        fs::create_dir(root.join("nested.dcm")).unwrap();
        fs::write(root.join("nested.dcm").join("deep.dcm"), b"").unwrap();

        let scanner = RawFileScanner::default();
        assert_eq!(scanner.count_raw_files(root).unwrap(), 4);
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_link_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        std::os::unix::fs::symlink(root.join("missing"), root.join("broken.dcm")).unwrap();
        fs::write(root.join("ok.dcm"), b"").unwrap();

        let scanner = RawFileScanner::default();
        assert_eq!(scanner.count_raw_files(root).unwrap(), 1);
    }
}
