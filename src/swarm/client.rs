use reqwest::StatusCode;
use serde_json::Value;
use tracing::{error, info};

use super::task::Task;
use crate::api::{ApiClient, ApiError, Environment};

pub const PRODUCTION_URL: &str = "https://swarm.unmand.app/";
pub const TEST_URL: &str = "https://swarm-uat.unmand.app/";

/// Fire-and-forget reporting of task outcomes to Swarm.
///
/// Each call is a single request. Nothing is retried or tracked.
#[derive(Debug, Clone)]
pub struct SwarmClient {
    api: ApiClient,
}

impl SwarmClient {
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

    /// Create a task record. The service answers `201 Created` with the
    /// stored record.
    pub async fn upload_task(&self, task: &Task) -> Result<Value, ApiError> {
        let req = self.api.post(&["tasks", "create"]).json(task);
        let body = self
            .send_expecting(req, StatusCode::CREATED, &format!("task {}", task.guid()))
            .await?;
        info!(guid = task.guid(), "swarm task uploaded");
        Ok(body)
    }

    /// Replace an existing task record.
    pub async fn update_task(&self, task: &Task) -> Result<Value, ApiError> {
        let req = self.api.put(&["tasks", task.guid()]).json(task);
        let body = self
            .send_expecting(req, StatusCode::OK, &format!("task {}", task.guid()))
            .await?;
        info!(guid = task.guid(), "swarm task updated");
        Ok(body)
    }

    async fn send_expecting(
        &self,
        req: reqwest::RequestBuilder,
        expected: StatusCode,
        resource: &str,
    ) -> Result<Value, ApiError> {
        let response = self.api.send(req, resource).await.inspect_err(|e| {
            error!(resource, error = %e, "swarm request failed");
        })?;

        let status = response.status();
        if status != expected {
            error!(resource, status = status.as_u16(), "API returned {status}");
            return Err(ApiError::Remote {
                status: status.as_u16(),
                message: format!("expected {expected}, got {status}"),
            });
        }
        Ok(response.json::<Value>().await?)
    }
}
