//! The Swarm task record: the outcome of one automated task run, uploaded
//! once for reporting.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Result, UnmandError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Success,
    Failure,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Success => write!(f, "SUCCESS"),
            TaskStatus::Failure => write!(f, "FAILURE"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = UnmandError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SUCCESS" => Ok(TaskStatus::Success),
            "FAILURE" => Ok(TaskStatus::Failure),
            _ => Err(UnmandError::Validation(format!(
                r#"status must be one of "FAILURE" or "SUCCESS", got "{s}""#
            ))),
        }
    }
}

/// Deployment a task ran against. `UAT` is reported as `TEST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskEnvironment {
    #[serde(alias = "UAT")]
    Test,
    Prod,
}

impl FromStr for TaskEnvironment {
    type Err = UnmandError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "TEST" | "UAT" => Ok(TaskEnvironment::Test),
            "PROD" => Ok(TaskEnvironment::Prod),
            _ => Err(UnmandError::Validation(format!(
                r#"environment must be one of "TEST", "UAT", or "PROD", got "{s}""#
            ))),
        }
    }
}

impl fmt::Display for TaskEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskEnvironment::Test => write!(f, "TEST"),
            TaskEnvironment::Prod => write!(f, "PROD"),
        }
    }
}

/// Caller-facing description of a finished task, validated by [`Task::new`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewTask {
    /// Generated when a description file leaves it out.
    #[serde(default = "generate_task_id")]
    pub id: String,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finish: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub environment: TaskEnvironment,
    /// Short human-readable outcome, starting with an uppercase letter.
    pub response: String,
    /// Detailed response; a JSON object or array.
    #[serde(default)]
    pub details: Option<Value>,
    #[serde(default)]
    pub custom_column1: Option<String>,
    #[serde(default)]
    pub custom_column2: Option<String>,
    #[serde(default)]
    pub custom_column3: Option<String>,
}

fn generate_task_id() -> String {
    Uuid::new_v4().to_string()
}

/// A validated task record in the shape the Swarm service stores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    guid: String,
    created: Option<DateTime<Utc>>,
    updated: Option<DateTime<Utc>>,
    status: TaskStatus,
    environment: TaskEnvironment,
    stages: Vec<Value>,
    outcome: String,
    data: Option<Value>,
    swarm_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_column1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_column2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_column3: Option<String>,
}

impl Task {
    pub fn new(task: NewTask) -> Result<Self> {
        if task.id.trim().is_empty() {
            return Err(UnmandError::Validation("task id must not be empty".into()));
        }

        if !task.response.chars().next().is_some_and(char::is_uppercase) {
            return Err(UnmandError::Validation(
                "first letter of response must be upper case".into(),
            ));
        }

        let data = match task.details {
            None | Some(Value::Null) => None,
            Some(details @ (Value::Object(_) | Value::Array(_))) => Some(details),
            Some(_) => {
                return Err(UnmandError::Validation(
                    "details must be JSON compatible: list or dictionary".into(),
                ));
            }
        };

        Ok(Self {
            guid: task.id,
            created: task.start,
            updated: task.finish,
            status: task.status,
            environment: task.environment,
            stages: Vec::new(),
            outcome: task.response,
            data,
            swarm_version: "N/A".to_string(),
            custom_column1: task.custom_column1,
            custom_column2: task.custom_column2,
            custom_column3: task.custom_column3,
        })
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn environment(&self) -> TaskEnvironment {
        self.environment
    }

    pub fn outcome(&self) -> &str {
        &self.outcome
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Task: Id={} Status={}>", self.guid, self.status)
    }
}
