use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::status::Status;

/// Open mapping of whatever fields the service attaches to a finished
/// extraction (`data`, `bboxes`, timings, ...).
pub type ResultPayload = Map<String, Value>;

/// A document submitted for extraction, tracked through its lifecycle.
///
/// Status and result are only written by the crate's poller, which keeps
/// `result().is_some() == (status() == Status::Finished)` at all times.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    id: String,
    status: Status,
    result: Option<ResultPayload>,
    queued_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl Extraction {
    /// Track an extraction the service already knows about, e.g. one
    /// submitted by an earlier process.
    ///
    /// A `Finished` status cannot be resumed without its result, so it is
    /// tracked as `Processing` and the next poll fetches the payload.
    pub fn new(id: impl Into<String>, status: Status) -> Self {
        let status = if status == Status::Finished {
            Status::Processing
        } else {
            status
        };
        let now = Utc::now();
        Self {
            id: id.into(),
            status,
            result: None,
            queued_at: now,
            finished_at: if status.is_terminal() { Some(now) } else { None },
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn result(&self) -> Option<&ResultPayload> {
        self.result.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn queued_at(&self) -> DateTime<Utc> {
        self.queued_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Consume the extraction, yielding its result if it finished.
    pub fn into_result(self) -> Option<ResultPayload> {
        self.result
    }

    /// Apply one observation from the service.
    ///
    /// Returns `false` and leaves the extraction untouched when the
    /// observation would move it backwards or out of a terminal state.
    pub(crate) fn apply(&mut self, status: Status, payload: Option<ResultPayload>) -> bool {
        if !self.status.can_transition_to(status) {
            return false;
        }

        self.status = status;
        match status {
            Status::Finished => {
                self.result = Some(payload.unwrap_or_default());
                self.finished_at = Some(Utc::now());
            }
            Status::Failed => {
                self.finished_at = Some(Utc::now());
            }
            Status::Queued | Status::Processing => {}
        }
        true
    }
}

impl std::fmt::Display for Extraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Extraction: Id={} Status={}>", self.id, self.status)
    }
}
