use rmq_core::{HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// Structured output of one remote command, as tables of per-instance rows.
pub struct RemoteResult {
    #[serde(rename = "Tables", default)]
    pub tables: Vec<RemoteTable>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteTable {
    #[serde(rename = "Content", default)]
    pub content: String,
    #[serde(rename = "Rows", default)]
    pub rows: Vec<RemoteRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    // Emitted as a string by the BOSH CLI, as a number by some wrappers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<Value>,
}

impl RemoteRow {
    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: Some(stdout.into()),
            ..Self::default()
        }
    }

    pub fn exit_code(&self) -> Option<i64> {
        match self.exit_code.as_ref()? {
            Value::Number(number) => number.as_i64(),
            Value::String(raw) => raw.trim().parse().ok(),
            _ => None,
        }
    }
}

impl RemoteResult {
    /// Single table holding a single row with `stdout`.
    pub fn single(stdout: impl Into<String>) -> Self {
        Self {
            tables: vec![RemoteTable {
                content: String::new(),
                rows: vec![RemoteRow::with_stdout(stdout)],
            }],
        }
    }

    pub fn from_json_str(raw: &str) -> HarnessResult<Self> {
        serde_json::from_str(raw).map_err(|error| {
            HarnessError::MalformedResult(format!("remote result is not valid JSON: {error}"))
        })
    }

    pub fn first_row(&self) -> HarnessResult<&RemoteRow> {
        let table = self
            .tables
            .first()
            .ok_or_else(|| HarnessError::MalformedResult("result has no tables".to_string()))?;
        table
            .rows
            .first()
            .ok_or_else(|| HarnessError::MalformedResult("first table has no rows".to_string()))
    }
}

/// Stdout of the first row of the first table.
pub fn extract_stdout(result: &RemoteResult) -> HarnessResult<String> {
    result.first_row()?.stdout.clone().ok_or_else(|| {
        HarnessError::MalformedResult("first row has no stdout field".to_string())
    })
}
