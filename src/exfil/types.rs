//! Request and response bodies for the extraction endpoints.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::extraction::{ResultPayload, Status};

/// Optional parts of a submission beyond the document bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    /// File name reported for the uploaded part.
    pub file_name: Option<String>,
    /// Guid of a specific model version to extract with. The project's
    /// default model is used when absent.
    pub model: Option<String>,
}

impl SubmitOptions {
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn with_model(mut self, guid: impl Into<String>) -> Self {
        self.model = Some(guid.into());
        self
    }
}

/// Body returned by `POST projects/extractions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub extraction_guid: String,
    /// The service normally reports `QUEUED`; an omitted status is read
    /// as `QUEUED` too.
    #[serde(default = "queued")]
    pub status: Status,
}

fn queued() -> Status {
    Status::Queued
}

/// Body returned by `GET extractions/{id}/data`.
///
/// Everything besides `status` is kept as-is; once the extraction has
/// finished those fields are its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: Status,
    #[serde(flatten)]
    pub fields: ResultPayload,
}

impl StatusResponse {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            fields: ResultPayload::new(),
        }
    }

    pub fn with_fields(status: Status, fields: ResultPayload) -> Self {
        Self { status, fields }
    }

    /// Number of bounding boxes detected so far, if the service sent any.
    pub fn bbox_count(&self) -> Option<usize> {
        self.fields
            .get("bboxes")
            .and_then(|v| v.as_array())
            .map(|boxes| boxes.len())
    }

    /// Rough remaining processing time for an in-progress extraction.
    pub fn estimated_duration(&self) -> Option<Duration> {
        if self.status != Status::Processing {
            return None;
        }
        self.bbox_count().map(estimate_processing_time)
    }

    /// The result payload, present only for a finished extraction.
    pub fn into_result(self) -> Option<ResultPayload> {
        (self.status == Status::Finished).then_some(self.fields)
    }
}

/// Empirical fit of processing time against bounding-box count.
pub fn estimate_processing_time(bbox_count: usize) -> Duration {
    let n = bbox_count as f64;
    Duration::from_secs_f64(0.000014 * n * n + 0.02255 * n + 1.08)
}
