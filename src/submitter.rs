//! Turns document bytes into a tracked [`Extraction`].

use tracing::info;

use crate::error::{Result, UnmandError};
use crate::exfil::{ExtractionApi, SubmitOptions};
use crate::extraction::Extraction;

/// Submits documents for extraction.
pub struct Submitter<A> {
    api: A,
}

impl<A: ExtractionApi> Submitter<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Submit with the project's default model.
    pub async fn submit(&self, file: &[u8]) -> Result<Extraction> {
        self.submit_with(file, &SubmitOptions::default()).await
    }

    /// Submit a document, issuing exactly one request.
    ///
    /// Empty content is rejected before anything is sent. A failed
    /// submission never produces an [`Extraction`].
    pub async fn submit_with(&self, file: &[u8], options: &SubmitOptions) -> Result<Extraction> {
        if file.is_empty() {
            return Err(UnmandError::Validation(
                "file content must not be empty".into(),
            ));
        }

        let response = self.api.submit(file, options).await?;
        let extraction = Extraction::new(response.extraction_guid, response.status);
        info!(
            id = extraction.id(),
            status = %extraction.status(),
            bytes = file.len(),
            "extraction submitted"
        );
        Ok(extraction)
    }
}
