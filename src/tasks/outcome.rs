use std::fmt;

use serde::Serialize;

/// Terminal state of a task node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failure,
    Skipped,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Success => "success",
            Status::Failure => "failure",
            Status::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Result of one unit of work
///
/// Outcomes are built once, when the node completes, and are never changed
/// afterwards; there are no setters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    status: Status,
    detail: Option<String>,
}

impl Outcome {
    pub fn success(detail: Option<String>) -> Self {
        Self {
            status: Status::Success,
            detail,
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            status: Status::Failure,
            detail: Some(reason.into()),
        }
    }

    pub fn skipped() -> Self {
        Self {
            status: Status::Skipped,
            detail: None,
        }
    }

    pub fn skipped_because(reason: impl Into<String>) -> Self {
        Self {
            status: Status::Skipped,
            detail: Some(reason.into()),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn is_failure(&self) -> bool {
        self.status == Status::Failure
    }
}
