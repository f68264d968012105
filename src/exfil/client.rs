use reqwest::multipart::{Form, Part};
use tracing::debug;

use super::types::{StatusResponse, SubmitOptions, SubmitResponse};
use crate::api::{ApiClient, ApiError, Environment};

pub const PRODUCTION_URL: &str = "https://exfil.unmand.app/";
pub const TEST_URL: &str = "https://exfil-uat.unmand.app/";

/// The two remote operations the extraction lifecycle is built on.
///
/// Implemented over HTTP by [`ExfilClient`]; tests substitute scripted
/// implementations.
#[allow(async_fn_in_trait)]
pub trait ExtractionApi {
    /// Upload a document, returning the service-assigned id and initial status.
    async fn submit(
        &self,
        file: &[u8],
        options: &SubmitOptions,
    ) -> Result<SubmitResponse, ApiError>;

    /// Ask for the current status (and, once finished, the result) of an extraction.
    async fn fetch_status(&self, id: &str) -> Result<StatusResponse, ApiError>;
}

impl<T: ExtractionApi> ExtractionApi for &T {
    async fn submit(
        &self,
        file: &[u8],
        options: &SubmitOptions,
    ) -> Result<SubmitResponse, ApiError> {
        (**self).submit(file, options).await
    }

    async fn fetch_status(&self, id: &str) -> Result<StatusResponse, ApiError> {
        (**self).fetch_status(id).await
    }
}

/// HTTP client for the Exfil extraction service.
#[derive(Debug, Clone)]
pub struct ExfilClient {
    api: ApiClient,
}

impl ExfilClient {
    pub fn new(token: impl Into<String>, environment: Environment) -> Result<Self, ApiError> {
        Self::with_base_url(token, environment.select(TEST_URL, PRODUCTION_URL))
    }

    /// Create a client pointing at a custom base URL (useful for testing).
    pub fn with_base_url(
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            api: ApiClient::new(token, base_url)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.api.base_url()
    }
}

impl ExtractionApi for ExfilClient {
    async fn submit(
        &self,
        file: &[u8],
        options: &SubmitOptions,
    ) -> Result<SubmitResponse, ApiError> {
        let file_name = options
            .file_name
            .clone()
            .unwrap_or_else(|| "document".to_string());
        let mut form = Form::new()
            .part("file", Part::bytes(file.to_vec()).file_name(file_name))
            .text("source", "API");
        if let Some(model) = &options.model {
            debug!(model = %model, "using specified model version");
            form = form.text("model", model.clone());
        }

        let req = self.api.post(&["projects", "extractions"]).multipart(form);
        let response = self.api.send(req, "extraction submission").await?;
        let status = response.status().as_u16();
        let body = response.json::<SubmitResponse>().await?;

        if body.extraction_guid.trim().is_empty() {
            return Err(ApiError::Remote {
                status,
                message: "submission response carried an empty extractionGuid".into(),
            });
        }
        Ok(body)
    }

    async fn fetch_status(&self, id: &str) -> Result<StatusResponse, ApiError> {
        let req = self.api.get(&["extractions", id, "data"]);
        let response = self.api.send(req, &format!("extraction {id}")).await?;
        Ok(response.json::<StatusResponse>().await?)
    }
}
