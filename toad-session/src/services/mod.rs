//! Filesystem services used by session classification

pub mod raw_scanner;

pub use raw_scanner::{ChildEntry, EntryKind, RawFileScanner, ScanError};
