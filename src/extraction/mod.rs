mod job;
mod status;

pub use job::{Extraction, ResultPayload};
pub use status::Status;
