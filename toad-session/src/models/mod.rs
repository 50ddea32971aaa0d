//! Session data model

pub mod sequence;
pub mod session;
pub mod summary;

pub use sequence::Sequence;
pub use session::Session;
pub use summary::{SequenceSummary, SessionSummary};
