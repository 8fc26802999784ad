use std::fmt;

/// Why a reference was left out of the mapping without being an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Listed verbatim in the skip set.
    SkipList,
    /// Local path while local processing is off and no base URL is configured.
    LocalNotAllowed,
}

/// What happened to a single reference during a run.
///
/// Fatal failures never become an outcome; they abort the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceOutcome {
    Mapped {
        document_path: String,
        /// `false` when deduplication pointed at an already written file.
        written: bool,
    },
    Skipped(SkipReason),
    /// Fetch or read failed but the run continued because errors are skipped.
    Recovered { message: String },
}

impl ReferenceOutcome {
    pub fn document_path(&self) -> Option<&str> {
        match self {
            ReferenceOutcome::Mapped { document_path, .. } => Some(document_path),
            _ => None,
        }
    }
}

impl fmt::Display for ReferenceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceOutcome::Mapped {
                document_path,
                written: true,
            } => write!(f, "saved as {document_path}"),
            ReferenceOutcome::Mapped {
                document_path,
                written: false,
            } => write!(f, "reused {document_path}"),
            ReferenceOutcome::Skipped(SkipReason::SkipList) => write!(f, "skipped (skip list)"),
            ReferenceOutcome::Skipped(SkipReason::LocalNotAllowed) => {
                write!(f, "skipped (local image)")
            }
            ReferenceOutcome::Recovered { message } => write!(f, "failed: {message}"),
        }
    }
}
