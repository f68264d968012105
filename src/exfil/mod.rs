pub mod client;
pub mod types;

pub use client::{ExfilClient, ExtractionApi};
pub use types::{StatusResponse, SubmitOptions, SubmitResponse, estimate_processing_time};
