use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StepError;

/// Outcome of a single step, written once to the result channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub message: String,
    /// Extra keys such as artifact paths and counts.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl StepResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            payload: Map::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            payload: Map::new(),
        }
    }

    pub fn from_error(err: &StepError) -> Self {
        Self::failure(err.to_string())
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    pub fn u64_field(&self, key: &str) -> Option<u64> {
        self.payload.get(key).and_then(Value::as_u64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    Success,
    Error,
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessStatus::Success => f.write_str("success"),
            ProcessStatus::Error => f.write_str("error"),
        }
    }
}

/// Artifact paths and counts collected over a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessArtifacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seeder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records_seeded: Option<u64>,
}

/// Outcome of a whole pipeline run, written once to the result channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResult {
    pub status: ProcessStatus,
    pub message: String,
    #[serde(flatten)]
    pub artifacts: ProcessArtifacts,
}

impl ProcessResult {
    pub fn success(message: impl Into<String>, artifacts: ProcessArtifacts) -> Self {
        Self {
            status: ProcessStatus::Success,
            message: message.into(),
            artifacts,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ProcessStatus::Error,
            message: message.into(),
            artifacts: ProcessArtifacts::default(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ProcessStatus::Success
    }
}
