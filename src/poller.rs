//! Drives an [`Extraction`] to a terminal status by polling the service.
//!
//! One [`Poller::poll`] call issues strictly sequential status queries for
//! one extraction and applies each answer before issuing the next. Between
//! queries it waits [`PollConfig::interval`]; that wait is also the only
//! point where an external cancellation signal is honoured.
//!
//! Transport failures of a single query are retried with exponential
//! backoff ([`RetryConfig`]). Rejections (bad credential, unknown id, any
//! other error answer) abort the loop immediately as [`UnmandError::Poll`],
//! which names the extraction and its last known status. Running out of attempts
//! or time yields [`UnmandError::PollTimeout`] and leaves the extraction in
//! the last status the service reported.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, warn};

use crate::error::{Result, UnmandError};
use crate::exfil::{ExtractionApi, StatusResponse};
use crate::extraction::{Extraction, Status};

/// Backoff policy for transport failures within one status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first failed try; `0` surfaces the first failure.
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

impl RetryConfig {
    /// delay = base_delay_ms * 2^(attempt - 1)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }
}

/// How long and how often to poll.
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    /// Wait between two status queries.
    pub interval: Duration,
    /// Status observations allowed before giving up.
    pub max_attempts: u32,
    /// Overall wall-clock budget for one `poll` call, if any.
    pub timeout: Option<Duration>,
    /// Skip progress notifications entirely.
    pub suppress_output: bool,
    pub retry: RetryConfig,
}

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20 * 60);

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout: Some(DEFAULT_TIMEOUT),
            suppress_output: false,
            retry: RetryConfig::default(),
        }
    }
}

/// Emitted after every status observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub id: String,
    pub status: Status,
    /// 1-based number of the observation within this `poll` call.
    pub attempt: u32,
    /// Advisory estimate of remaining processing time.
    pub estimate: Option<Duration>,
}

/// Receives progress notifications from a [`Poller`].
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Default sink: reports progress as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        match event.estimate {
            Some(estimate) => info!(
                id = %event.id,
                status = %event.status,
                attempt = event.attempt,
                "Extraction running: estimated extraction length {:.1}s",
                estimate.as_secs_f64()
            ),
            None => info!(
                id = %event.id,
                status = %event.status,
                attempt = event.attempt,
                "extraction status"
            ),
        }
    }
}

/// Polls extractions until they reach `Finished` or `Failed`.
pub struct Poller<A> {
    api: A,
    config: PollConfig,
    sink: Box<dyn ProgressSink>,
    cancel: Option<watch::Receiver<bool>>,
}

impl<A: ExtractionApi> Poller<A> {
    pub fn new(api: A) -> Self {
        Self::with_config(api, PollConfig::default())
    }

    pub fn with_config(api: A, config: PollConfig) -> Self {
        Self {
            api,
            config,
            sink: Box::new(TracingProgress),
            cancel: None,
        }
    }

    /// Replace the progress sink.
    pub fn with_sink(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Stop polling once `signal` turns `true`; checked between queries.
    pub fn with_cancellation(mut self, signal: watch::Receiver<bool>) -> Self {
        self.cancel = Some(signal);
        self
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll until `job` reaches a terminal status.
    ///
    /// An already terminal `job` is returned untouched without any query.
    /// On error the job keeps the last status observed; it is never forced
    /// to `Failed`.
    pub async fn poll<'j>(&self, job: &'j mut Extraction) -> Result<&'j mut Extraction> {
        if job.is_terminal() {
            debug!(id = job.id(), status = %job.status(), "already terminal, skipping poll");
            return Ok(job);
        }

        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            let response = self.fetch_with_retry(job).await?;
            attempts += 1;

            let reported = response.status;
            let estimate = response.estimated_duration();
            if !job.apply(reported, response.into_result()) {
                warn!(
                    id = job.id(),
                    current = %job.status(),
                    reported = %reported,
                    "ignoring out-of-order status report"
                );
            }
            debug!(id = job.id(), status = %job.status(), attempt = attempts, "status observed");

            if !self.config.suppress_output {
                self.sink.on_progress(&ProgressEvent {
                    id: job.id().to_string(),
                    status: job.status(),
                    attempt: attempts,
                    estimate,
                });
            }

            match job.status() {
                Status::Finished => {
                    info!(id = job.id(), attempts, "extraction completed");
                    return Ok(job);
                }
                Status::Failed => {
                    error!(id = job.id(), attempts, "extraction failed");
                    return Ok(job);
                }
                Status::Queued | Status::Processing => {}
            }

            if attempts >= self.config.max_attempts || self.out_of_time(started) {
                warn!(
                    id = job.id(),
                    status = %job.status(),
                    attempts,
                    "giving up on extraction, still in progress"
                );
                return Err(UnmandError::PollTimeout {
                    id: job.id().to_string(),
                    last_status: job.status(),
                    attempts,
                });
            }

            if self.wait(self.config.interval).await {
                info!(id = job.id(), status = %job.status(), "polling cancelled");
                return Err(UnmandError::Cancelled {
                    id: job.id().to_string(),
                    last_status: job.status(),
                });
            }
        }
    }

    /// One status query, retrying transport failures only.
    async fn fetch_with_retry(&self, job: &Extraction) -> Result<StatusResponse> {
        let retry = &self.config.retry;
        let mut retries: u32 = 0;

        loop {
            match self.api.fetch_status(job.id()).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && retries < retry.max_retries => {
                    retries += 1;
                    let delay = retry.delay_for_attempt(retries);
                    warn!(
                        id = job.id(),
                        error = %e,
                        "retrying status query {retries}/{} in {}ms",
                        retry.max_retries,
                        delay.as_millis()
                    );
                    sleep(delay).await;
                }
                Err(e) => {
                    error!(
                        id = job.id(),
                        last_status = %job.status(),
                        retries,
                        error = %e,
                        "status query failed"
                    );
                    return Err(match UnmandError::from(e) {
                        UnmandError::Api(source) => UnmandError::Poll {
                            id: job.id().to_string(),
                            last_status: job.status(),
                            source,
                        },
                        other => other,
                    });
                }
            }
        }
    }

    // Whether another interval would push past the overall timeout.
    fn out_of_time(&self, started: Instant) -> bool {
        self.config
            .timeout
            .is_some_and(|limit| started.elapsed() + self.config.interval > limit)
    }

    // Returns true when cancelled before the interval elapsed.
    async fn wait(&self, interval: Duration) -> bool {
        let Some(signal) = &self.cancel else {
            sleep(interval).await;
            return false;
        };

        let mut signal = signal.clone();
        if *signal.borrow() {
            return true;
        }
        tokio::select! {
            _ = sleep(interval) => false,
            Ok(_) = signal.wait_for(|cancelled| *cancelled) => true,
        }
    }
}
