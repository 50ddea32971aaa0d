//! Subject acquisition session
//!
//! A session is one subject's acquisition directory reduced to a set of named
//! sequences:
//!
//! ```text
//! subject/
//!   t1_mprage/       IM0001.dcm ...        → sequence "t1_mprage"
//!   gre_field_map/
//!     echo_1/        IM0001.dcm ...        → sequence "gre_field_map/echo_1"
//!     echo_2/        IM0001.dcm ...        → sequence "gre_field_map/echo_2"
//!   localizer_notes/ notes.txt             → skipped
//! ```
//!
//! Construction never touches the filesystem. [`Session::initialize_sequences`]
//! classifies the tree and computes the comparable fingerprint; every query
//! after that works on the in-memory model.

use crate::error::{SessionError, SessionResult};
use crate::models::Sequence;
use crate::services::{ChildEntry, RawFileScanner};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Session {
    /// Identity key: two sessions are equal iff their directories are equal
    directory: PathBuf,
    name: String,
    name_from_user: Option<String>,
    /// Set when the session was materialized from an archive
    archive_name: Option<String>,
    /// Fingerprint, `None` until classification completes
    comparable: Option<String>,
    checked: bool,
    /// Keyed by sequence name; the ordered map gives name-ordered iteration
    sequences: BTreeMap<String, Arc<Sequence>>,
}

impl Session {
    /// Create an unclassified session for a subject directory
    ///
    /// The name defaults to the last path component.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        let directory = directory.into();
        let name = directory
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| directory.to_string_lossy().into_owned());

        Self {
            directory,
            name,
            name_from_user: None,
            archive_name: None,
            comparable: None,
            checked: false,
            sequences: BTreeMap::new(),
        }
    }

    /// Create an unclassified session extracted from an archive
    pub fn from_archive(directory: impl Into<PathBuf>, archive_name: impl Into<String>) -> Self {
        let mut session = Self::new(directory);
        session.archive_name = Some(archive_name.into());
        session
    }

    /// Shell copy: identity, names, archive and fingerprint, but no sequences
    /// and not checked
    pub fn shell_of(other: &Session) -> Self {
        Self {
            directory: other.directory.clone(),
            name: other.name.clone(),
            name_from_user: other.name_from_user.clone(),
            archive_name: other.archive_name.clone(),
            comparable: other.comparable.clone(),
            checked: false,
            sequences: BTreeMap::new(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn name_from_user(&self) -> Option<&str> {
        self.name_from_user.as_deref()
    }

    pub fn set_name_from_user(&mut self, name: Option<String>) {
        self.name_from_user = name;
    }

    pub fn archive_name(&self) -> Option<&str> {
        self.archive_name.as_deref()
    }

    pub fn is_from_archive(&self) -> bool {
        self.archive_name.is_some()
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    pub fn set_checked(&mut self, checked: bool) {
        self.checked = checked;
    }

    /// Session fingerprint, `None` before classification
    pub fn comparable(&self) -> Option<&str> {
        self.comparable.as_deref()
    }

    pub fn is_classified(&self) -> bool {
        self.comparable.is_some()
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Classify the session directory into sequences
    ///
    /// Each immediate child directory becomes either a simple sequence (raw
    /// files directly inside), a multi-echo parent (one sequence per
    /// sub-directory holding raw files, provided at least one echo-marked
    /// sub-directory does), or nothing. Plain files at the top level are
    /// ignored.
    ///
    /// Any filesystem error or name collision aborts the whole classification
    /// and leaves the session as it was.
    pub fn initialize_sequences(&mut self, scanner: &RawFileScanner) -> SessionResult<()> {
        let mut sequences: BTreeMap<String, Arc<Sequence>> = BTreeMap::new();

        for child in scanner.list_children(&self.directory)? {
            if !child.is_dir() {
                continue;
            }

            for sequence in classify_child(scanner, &child)? {
                insert_unique(&mut sequences, Arc::new(sequence))?;
            }
        }

        let comparable: String = sequences.values().map(|s| s.comparable()).collect();

        info!(
            "Classified session {} ({}): {} sequences",
            self.name,
            self.directory.display(),
            sequences.len()
        );

        self.sequences = sequences;
        self.comparable = Some(comparable);
        Ok(())
    }

    /// Probe whether the directory holds an uncombined session
    ///
    /// False as soon as a top-level entry is a plain file or carries the echo
    /// marker; otherwise true iff the top-level directories hold at least one
    /// raw file between them. Does not require nor modify classification.
    pub fn is_unf_session(&self, scanner: &RawFileScanner) -> SessionResult<bool> {
        let mut raw_files = 0;

        for child in scanner.list_children(&self.directory)? {
            if child.is_file() {
                return Ok(false);
            }
            if scanner.is_echo_dir_name(&child.name) {
                return Ok(false);
            }
            if child.is_dir() {
                raw_files += scanner.count_raw_files(&child.path)?;
            }
        }

        Ok(raw_files > 0)
    }

    /// Sequences ordered by name
    pub fn sequences(&self) -> impl Iterator<Item = &Arc<Sequence>> + '_ {
        self.sequences.values()
    }

    /// Look up the sequence carrying the same name as `name_source`
    pub fn sequence(&self, name_source: &Sequence) -> Option<&Arc<Sequence>> {
        self.sequence_by_name(name_source.name())
    }

    pub fn sequence_by_name(&self, name: &str) -> Option<&Arc<Sequence>> {
        self.sequences.get(name)
    }

    /// Whether an equal sequence (name, directory, element count) is present
    pub fn has_sequence(&self, candidate: &Sequence) -> bool {
        self.sequences.values().any(|s| s.as_ref() == candidate)
    }

    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.sequences.values().any(|s| s.has_prefix(prefix))
    }

    /// Tag the named sequence with a prefix; false if no such sequence
    pub fn assign_prefix(&self, name: &str, prefix: impl Into<String>) -> bool {
        match self.sequences.get(name) {
            Some(sequence) => {
                sequence.set_prefix(Some(prefix.into()));
                true
            }
            None => false,
        }
    }

    /// Add a sequence; a name already present is rejected
    pub fn append_sequence(&mut self, sequence: Arc<Sequence>) -> SessionResult<()> {
        insert_unique(&mut self.sequences, sequence)
    }

    /// Whether both sessions have the same fingerprint
    ///
    /// Both sessions must have been classified.
    pub fn is_comparable(&self, other: &Session) -> SessionResult<bool> {
        match (self.comparable(), other.comparable()) {
            (Some(mine), Some(theirs)) => Ok(mine == theirs),
            (None, _) => Err(SessionError::ComparisonNotReady(self.name.clone())),
            (_, None) => Err(SessionError::ComparisonNotReady(other.name.clone())),
        }
    }

    /// Keep only the sequences `reference` also has, relabeled with its prefixes
    ///
    /// The result is a shell of `self` holding `self`'s own sequences (not
    /// copies): their prefixes are overwritten in place, so the change is also
    /// visible through `self`.
    pub fn filter_sequences_and_prefix_by_session(&self, reference: &Session) -> Session {
        let mut filtered = Session::shell_of(self);

        for reference_sequence in reference.sequences() {
            let Some(sequence) = self.sequence(reference_sequence) else {
                debug!(
                    "Sequence {} absent from {}, skipped",
                    reference_sequence.name(),
                    self.name
                );
                continue;
            };

            sequence.set_prefix(reference_sequence.prefix());
            filtered
                .sequences
                .insert(sequence.name().to_string(), Arc::clone(sequence));
        }

        filtered
    }
}

impl From<&Session> for Session {
    fn from(other: &Session) -> Self {
        Session::shell_of(other)
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.directory == other.directory
    }
}

impl Eq for Session {}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Session: name={}, directory={}",
            self.name,
            self.directory.display()
        )?;
        if let Some(archive) = &self.archive_name {
            write!(f, ", archive={}", archive)?;
        }
        if self.checked {
            write!(f, ", checked")?;
        }
        for sequence in self.sequences.values() {
            write!(f, "\n  {}", sequence)?;
        }
        Ok(())
    }
}

/// Sequences contributed by one top-level child directory
fn classify_child(scanner: &RawFileScanner, child: &ChildEntry) -> SessionResult<Vec<Sequence>> {
    let raw_files = scanner.count_raw_files(&child.path)?;
    if raw_files > 0 {
        debug!("{}: simple sequence, {} images", child.name, raw_files);
        return Ok(vec![Sequence::new(&child.name, &child.path, raw_files)]);
    }

    // Count every sub-directory once; the echo check and the per-echo
    // sequences both use these counts.
    let mut counted = Vec::new();
    for sub in scanner.list_children(&child.path)? {
        if sub.is_dir() {
            let count = scanner.count_raw_files(&sub.path)?;
            counted.push((sub, count));
        }
    }

    let is_multi_echo = counted
        .iter()
        .any(|(sub, count)| *count > 0 && scanner.is_echo_dir_name(&sub.name));
    if !is_multi_echo {
        debug!("{}: no raw files, skipped", child.name);
        return Ok(Vec::new());
    }

    let sequences: Vec<Sequence> = counted
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(sub, count)| Sequence::new(format!("{}/{}", child.name, sub.name), sub.path, count))
        .collect();

    debug!("{}: multi-echo parent, {} echoes", child.name, sequences.len());
    Ok(sequences)
}

fn insert_unique(
    sequences: &mut BTreeMap<String, Arc<Sequence>>,
    sequence: Arc<Sequence>,
) -> SessionResult<()> {
    match sequences.entry(sequence.name().to_string()) {
        Entry::Occupied(entry) => Err(SessionError::DuplicateSequence(entry.key().clone())),
        Entry::Vacant(entry) => {
            entry.insert(sequence);
            Ok(())
        }
    }
}
