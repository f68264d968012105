pub mod client;
pub mod task;

pub use client::SwarmClient;
pub use task::{NewTask, Task, TaskEnvironment, TaskStatus};
