use std::fmt;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};

use super::error::ApiError;

/// Which deployment of the Unmand services a client talks to.
///
/// Fixed for the lifetime of a client; test and production never share a
/// base address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Test,
    #[default]
    Production,
}

impl Environment {
    pub fn from_test_flag(test: bool) -> Self {
        if test {
            Environment::Test
        } else {
            Environment::Production
        }
    }

    /// Pick the address for this environment out of a service's pair.
    pub fn select<'a>(self, test_url: &'a str, production_url: &'a str) -> &'a str {
        match self {
            Environment::Test => test_url,
            Environment::Production => production_url,
        }
    }
}

/// Authenticated HTTP access to one Unmand service.
///
/// Holds the opaque credential, the base address and a pooled `reqwest`
/// client. Every request built through it carries the credential.
/// Performs no retries.
#[derive(Clone)]
pub struct ApiClient {
    token: HeaderValue,
    base_url: Url,
    http: Client,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<redacted>")
            .finish()
    }
}

impl ApiClient {
    /// Fails with [`ApiError::InvalidRequest`] when the credential cannot be
    /// sent as a header or the base address cannot take a path.
    pub fn new(token: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ApiError> {
        // The service expects the raw token, not a `Bearer` scheme.
        let mut token = HeaderValue::from_str(&token.into()).map_err(|_| {
            ApiError::InvalidRequest("credential is not a valid header value".into())
        })?;
        token.set_sensitive(true);

        let base_url = base_url.into();
        let base_url = Url::parse(&base_url)
            .map_err(|e| ApiError::InvalidRequest(format!("base URL {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidRequest(format!(
                "base URL {base_url} cannot carry a path"
            )));
        }

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            token,
            base_url,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Append `segments` to the base address, percent-encoding each one so
    /// ids holding `/`, `?` or `#` stay inside their own segment.
    pub fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub fn get(&self, segments: &[&str]) -> RequestBuilder {
        self.authorize(self.http.get(self.url(segments)))
    }

    pub fn post(&self, segments: &[&str]) -> RequestBuilder {
        self.authorize(self.http.post(self.url(segments)))
    }

    pub fn put(&self, segments: &[&str]) -> RequestBuilder {
        self.authorize(self.http.put(self.url(segments)))
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        req.header(AUTHORIZATION, self.token.clone())
    }

    /// Send a request and classify any non-success answer.
    ///
    /// `resource` names what was asked for, and ends up in
    /// [`ApiError::NotFound`].
    pub async fn send(&self, req: RequestBuilder, resource: &str) -> Result<Response, ApiError> {
        let response = req.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Auth {
                status: status.as_u16(),
                message,
            },
            StatusCode::NOT_FOUND => ApiError::NotFound {
                resource: resource.to_string(),
            },
            _ => ApiError::Remote {
                status: status.as_u16(),
                message,
            },
        })
    }
}
