use thiserror::Error;

#[derive(Debug, Error)]
/// Enumerates supported `HarnessError` values.
pub enum HarnessError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("malformed remote result: {0}")]
    MalformedResult(String),
    #[error("deployment failed: {0}")]
    Deployment(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("manifest codec error: {0}")]
    Manifest(#[from] serde_yaml::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Stable lowercase label used in reports and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            HarnessError::NotFound(_) => "not_found",
            HarnessError::TypeMismatch { .. } => "type_mismatch",
            HarnessError::MalformedResult(_) => "malformed_result",
            HarnessError::Deployment(_) => "deployment",
            HarnessError::Transport(_) => "transport",
            HarnessError::InvalidInput(_) => "invalid_input",
            HarnessError::Manifest(_) => "manifest",
            HarnessError::Io(_) => "io",
        }
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;

/// Shortens collected text for error messages and report lines.
pub fn truncate_for_display(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect::<String>() + "..."
}
