use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Progress of an extraction as reported by the remote service.
///
/// Each extraction flows through: QUEUED → PROCESSING → FINISHED | FAILED.
/// An extraction may also fail straight out of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Queued,
    /// The service has historically called this state `STARTED`.
    #[serde(alias = "STARTED")]
    Processing,
    Finished,
    Failed,
}

impl Status {
    /// `Finished` and `Failed` are terminal: nothing transitions out of them.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Finished | Status::Failed)
    }

    /// Whether the lifecycle graph allows moving from `self` to `next`.
    ///
    /// Staying in the same non-terminal state is allowed (a poll that
    /// observes no progress).
    pub fn can_transition_to(self, next: Status) -> bool {
        match self {
            Status::Queued => true,
            Status::Processing => next != Status::Queued,
            Status::Finished | Status::Failed => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Queued => "QUEUED",
            Status::Processing => "PROCESSING",
            Status::Finished => "FINISHED",
            Status::Failed => "FAILED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "QUEUED" => Ok(Status::Queued),
            "PROCESSING" | "STARTED" => Ok(Status::Processing),
            "FINISHED" => Ok(Status::Finished),
            "FAILED" => Ok(Status::Failed),
            other => Err(format!("unknown extraction status: {other}")),
        }
    }
}
