//! Configuration loaded from `unmand.toml`.
//!
//! [`UnmandConfig`] holds the credential, the environment selection and the
//! polling defaults. Values missing from the file fall back to defaults.
//! The environment variables `UNMAND_API_TOKEN`, `EXFIL_API_URL` and
//! `SWARM_API_URL` take precedence over the file; they are read once, at
//! load time.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;

use crate::api::Environment;
use crate::error::UnmandError;
use crate::exfil::ExfilClient;
use crate::poller::{PollConfig, RetryConfig};
use crate::swarm::SwarmClient;

/// Top-level configuration loaded from `unmand.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnmandConfig {
    /// Opaque credential attached to every request.
    #[serde(default)]
    pub api_token: String,

    /// Talk to the test deployment instead of production.
    #[serde(default)]
    pub test: bool,

    /// Explicit Exfil base address, overriding the environment's.
    #[serde(default)]
    pub exfil_url: Option<String>,

    /// Explicit Swarm base address, overriding the environment's.
    #[serde(default)]
    pub swarm_url: Option<String>,

    /// Wait between status queries, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Status observations before a poll gives up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Overall poll budget in seconds; `0` disables the wall-clock bound.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Transport retries within one status query.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay in milliseconds for exponential backoff.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    10_000
}

fn default_max_attempts() -> u32 {
    100
}

fn default_timeout_secs() -> u64 {
    1_200
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

impl Default for UnmandConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            test: false,
            exfil_url: None,
            swarm_url: None,
            poll_interval_ms: default_poll_interval_ms(),
            max_attempts: default_max_attempts(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl UnmandConfig {
    /// Loads `unmand.toml` from the current directory.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("unmand.toml"))
    }

    /// Loads the given file, using defaults if it does not exist, then
    /// applies environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<UnmandConfig>(&contents)?
        } else {
            Self::default()
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    // Non-empty variables win over the file.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        if let Some(token) = var("UNMAND_API_TOKEN") {
            self.api_token = token;
        }
        if let Some(url) = var("EXFIL_API_URL") {
            self.exfil_url = Some(url);
        }
        if let Some(url) = var("SWARM_API_URL") {
            self.swarm_url = Some(url);
        }
    }

    /// Fails when no credential was configured anywhere.
    pub fn require_token(&self) -> Result<&str, UnmandError> {
        if self.api_token.trim().is_empty() {
            return Err(UnmandError::Config(
                "no API token: set api_token in unmand.toml, UNMAND_API_TOKEN or --token".into(),
            ));
        }
        Ok(&self.api_token)
    }

    pub fn environment(&self) -> Environment {
        Environment::from_test_flag(self.test)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            base_delay_ms: self.base_delay_ms,
        }
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.max_attempts,
            timeout: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
            suppress_output: false,
            retry: self.retry_config(),
        }
    }

    pub fn exfil_client(&self) -> Result<ExfilClient, UnmandError> {
        let client = match &self.exfil_url {
            Some(url) => ExfilClient::with_base_url(self.api_token.clone(), url.clone()),
            None => ExfilClient::new(self.api_token.clone(), self.environment()),
        };
        Ok(client?)
    }

    pub fn swarm_client(&self) -> Result<SwarmClient, UnmandError> {
        let client = match &self.swarm_url {
            Some(url) => SwarmClient::with_base_url(self.api_token.clone(), url.clone()),
            None => SwarmClient::new(self.api_token.clone(), self.environment()),
        };
        Ok(client?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_values() {
        let config = UnmandConfig::default();
        assert!(config.api_token.is_empty());
        assert!(!config.test);
        assert_eq!(config.poll_interval_ms, 10_000);
        assert_eq!(config.max_attempts, 100);
        assert_eq!(config.timeout_secs, 1_200);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_delay_ms, 1000);
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            api_token = "tok-123"
            test = true
            max_attempts = 5
        "#;
        let config: UnmandConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api_token, "tok-123");
        assert!(config.test);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.poll_interval_ms, 10_000);
        assert_eq!(config.environment(), Environment::Test);
    }

    #[test]
    fn poll_config_from_values() {
        let config = UnmandConfig {
            poll_interval_ms: 250,
            timeout_secs: 0,
            max_retries: 1,
            ..Default::default()
        };
        let poll = config.poll_config();
        assert_eq!(poll.interval, Duration::from_millis(250));
        assert_eq!(poll.timeout, None);
        assert_eq!(poll.retry.max_retries, 1);
        assert_eq!(poll.max_attempts, 100);
    }

    #[test]
    fn env_overrides_file_values() {
        let vars: HashMap<&str, &str> = [
            ("UNMAND_API_TOKEN", "from-env"),
            ("EXFIL_API_URL", "http://localhost:9000/"),
            ("SWARM_API_URL", ""),
        ]
        .into_iter()
        .collect();

        let mut config = UnmandConfig {
            api_token: "from-file".into(),
            swarm_url: Some("http://swarm.local/".into()),
            ..Default::default()
        };
        config.apply_env(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.api_token, "from-env");
        assert_eq!(config.exfil_url.as_deref(), Some("http://localhost:9000/"));
        // Empty variables are ignored.
        assert_eq!(config.swarm_url.as_deref(), Some("http://swarm.local/"));
    }

    #[test]
    fn explicit_urls_override_environment() {
        let config = UnmandConfig {
            exfil_url: Some("http://localhost:9000".into()),
            test: true,
            ..Default::default()
        };
        let exfil = config.exfil_client().unwrap();
        assert_eq!(exfil.base_url(), "http://localhost:9000/");
        let swarm = config.swarm_client().unwrap();
        assert_eq!(swarm.base_url(), crate::swarm::client::TEST_URL);
    }

    #[test]
    fn malformed_token_is_rejected_before_any_request() {
        let config = UnmandConfig {
            api_token: "tok\nen".into(),
            ..Default::default()
        };
        assert!(config.exfil_client().unwrap_err().is_validation());
        assert!(config.swarm_client().unwrap_err().is_validation());
    }

    #[test]
    fn missing_token_is_a_config_error() {
        let config = UnmandConfig::default();
        let err = config.require_token().unwrap_err();
        assert!(matches!(err, UnmandError::Config(_)));

        let config = UnmandConfig {
            api_token: "tok".into(),
            ..Default::default()
        };
        assert_eq!(config.require_token().unwrap(), "tok");
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unmand.toml");
        std::fs::write(&path, "poll_interval_ms = 500\nmax_retries = 7\n").unwrap();

        let config = UnmandConfig::load_from(&path).unwrap();
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.max_retries, 7);
    }

    #[test]
    fn load_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = UnmandConfig::load_from(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.max_attempts, 100);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unmand.toml");
        std::fs::write(&path, "max_attempts = \"many\"").unwrap();
        assert!(UnmandConfig::load_from(&path).is_err());
    }
}
