//! Acquisition sequence
//!
//! One acquisition run found in a session directory, or one echo of a
//! multi-echo run (named `"parent/echo"`).
//!
//! A sequence is created by session classification and shared through
//! `Arc<Sequence>`: a filtered session points at the same sequences as the
//! session that discovered them. Only the prefix is mutable after creation and
//! every write goes through the sequence's own lock, so at most one writer
//! touches a given prefix at a time.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

pub struct Sequence {
    name: String,
    directory: PathBuf,
    element_count: usize,
    prefix: RwLock<Option<String>>,
}

impl Sequence {
    pub fn new(
        name: impl Into<String>,
        directory: impl Into<PathBuf>,
        element_count: usize,
    ) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
            element_count,
            prefix: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Folder holding this sequence's raw slice files
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Number of raw slice files found in [`Self::directory`]
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// Token summarizing this sequence's shape for session fingerprints
    ///
    /// Changes whenever the name or the element count changes. The name is
    /// length-prefixed so concatenated tokens stay unambiguous even when names
    /// contain `:` or `;`.
    pub fn comparable(&self) -> String {
        format!("{}:{}:{};", self.name.len(), self.name, self.element_count)
    }

    pub fn prefix(&self) -> Option<String> {
        self.prefix
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set_prefix(&self, prefix: Option<String>) {
        let mut guard = self
            .prefix
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = prefix;
    }

    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.prefix
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_deref()
            == Some(prefix)
    }
}

/// Equal name, directory and element count. The prefix is a label and does
/// not take part.
impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.directory == other.directory
            && self.element_count == other.element_count
    }
}

impl Eq for Sequence {}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("name", &self.name)
            .field("directory", &self.directory)
            .field("element_count", &self.element_count)
            .field("prefix", &self.prefix())
            .finish()
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} images, {})",
            self.name,
            self.element_count,
            self.directory.display()
        )?;
        if let Some(prefix) = self.prefix() {
            write!(f, " prefix={}", prefix)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_equality_ignores_prefix() {
        let a = Sequence::new("dwi", "/data/s1/dwi", 60);
        let b = Sequence::new("dwi", "/data/s1/dwi", 60);
        b.set_prefix(Some("dwi".to_string()));
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_uses_directory_and_count() {
        let a = Sequence::new("dwi", "/data/s1/dwi", 60);
        assert_ne!(a, Sequence::new("dwi", "/data/s2/dwi", 60));
        assert_ne!(a, Sequence::new("dwi", "/data/s1/dwi", 61));
        assert_ne!(a, Sequence::new("t1", "/data/s1/dwi", 60));
    }

    #[test]
    fn test_comparable_tracks_count() {
        let a = Sequence::new("t1", "/a/t1", 176);
        let b = Sequence::new("t1", "/b/t1", 176);
        let c = Sequence::new("t1", "/a/t1", 175);
        assert_eq!(a.comparable(), b.comparable());
        assert_ne!(a.comparable(), c.comparable());
    }

    #[test]
    fn test_comparable_separators_in_name() {
        let plain = Sequence::new("a", "/a/a", 1);
        let tricky = Sequence::new("a:1;b", "/b/a:1;b", 2);
        assert_eq!(plain.comparable(), "1:a:1;");
        assert_eq!(tricky.comparable(), "5:a:1;b:2;");
    }

    #[test]
    fn test_prefix_shared_through_arc() {
        let sequence = Arc::new(Sequence::new("b0", "/a/b0", 1));
        let alias = Arc::clone(&sequence);
        assert!(sequence.prefix().is_none());

        alias.set_prefix(Some("b0_ap".to_string()));
        assert!(sequence.has_prefix("b0_ap"));
        assert!(!sequence.has_prefix("b0_pa"));
    }
}
