//! Serializable snapshots of a session for reporting

use crate::models::{Sequence, Session};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceSummary {
    pub name: String,
    pub directory: PathBuf,
    pub element_count: usize,
    pub prefix: Option<String>,
    pub comparable: String,
}

impl From<&Sequence> for SequenceSummary {
    fn from(sequence: &Sequence) -> Self {
        Self {
            name: sequence.name().to_string(),
            directory: sequence.directory().to_path_buf(),
            element_count: sequence.element_count(),
            prefix: sequence.prefix(),
            comparable: sequence.comparable(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub name: String,
    pub directory: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_from_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_name: Option<String>,
    pub checked: bool,
    /// `None` when the session was never classified
    pub comparable: Option<String>,
    /// Ordered by name
    pub sequences: Vec<SequenceSummary>,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            name: session.name().to_string(),
            directory: session.directory().to_path_buf(),
            name_from_user: session.name_from_user().map(str::to_string),
            archive_name: session.archive_name().map(str::to_string),
            checked: session.is_checked(),
            comparable: session.comparable().map(str::to_string),
            sequences: session
                .sequences()
                .map(|s| SequenceSummary::from(s.as_ref()))
                .collect(),
        }
    }
}
