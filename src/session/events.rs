//! Events a session reports to whoever is watching it

use crate::state::ResourceKey;
use std::fmt;
use std::time::Duration;

/// Emitted after each page has been durably stored
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub resource: ResourceKey,

    /// 1-based page number within this session
    pub page_index: u32,

    /// Items in the page just stored
    pub page_records: usize,

    /// Total records stored for the resource, including earlier sessions
    pub records_fetched: u64,

    pub estimated_total: Option<u64>,
    pub fraction_complete: f64,
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,

    /// Stopped on request; stored state stays resumable
    Cancelled,

    /// Stopped on an error; stored state stays resumable
    Failed(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Emitted exactly once when a session's loop exits
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalEvent {
    pub resource: ResourceKey,
    pub outcome: Outcome,
    pub records_fetched: u64,
    pub fetched_this_session: u64,
    pub elapsed: Duration,
}

impl TerminalEvent {
    pub fn is_completed(&self) -> bool {
        self.outcome == Outcome::Completed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Progress(ProgressEvent),
    Finished(TerminalEvent),
}
