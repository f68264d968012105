pub mod client;
pub mod error;

pub use client::{ApiClient, Environment};
pub use error::ApiError;
