//! toad-session: acquisition directory discovery
//!
//! Reduces a subject's raw acquisition tree to a [`Session`] of named
//! [`Sequence`]s that pipeline stages can query, compare and filter.

pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{SessionError, SessionResult};
pub use crate::models::{Sequence, SequenceSummary, Session, SessionSummary};
pub use crate::services::RawFileScanner;
