//! # unmand
//!
//! Client for the Unmand document extraction API. Submit a document, then
//! poll the service until the extraction finishes or fails:
//!
//! ```no_run
//! use unmand::api::Environment;
//! use unmand::exfil::ExfilClient;
//! use unmand::{Poller, Submitter};
//!
//! # async fn example() -> unmand::Result<()> {
//! let client = ExfilClient::new("my-token", Environment::Test)?;
//!
//! let mut job = Submitter::new(&client).submit(b"%PDF-1.4...").await?;
//! Poller::new(&client).poll(&mut job).await?;
//!
//! if let Some(result) = job.result() {
//!     println!("{}", serde_json::to_string_pretty(result)?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Task outcomes can be reported separately through [`swarm::SwarmClient`].

pub mod api;
pub mod config;
pub mod error;
pub mod exfil;
pub mod extraction;
pub mod logging;
pub mod poller;
pub mod submitter;
pub mod swarm;
pub mod ui;

pub use error::{Result, UnmandError};
pub use extraction::{Extraction, ResultPayload, Status};
pub use poller::{PollConfig, Poller, ProgressEvent, ProgressSink, RetryConfig};
pub use submitter::Submitter;
