use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
/// Response body, decoded when the server labelled it JSON.
pub enum HttpBody {
    Json(Value),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Status and body of one management API request.
pub struct HttpEvidence {
    pub status: u16,
    pub body: HttpBody,
}

impl HttpEvidence {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            HttpBody::Json(value) => Some(value),
            HttpBody::Text(_) => None,
        }
    }

    /// Body as text; JSON bodies are re-serialized compactly.
    pub fn text(&self) -> String {
        match &self.body {
            HttpBody::Json(value) => value.to_string(),
            HttpBody::Text(text) => text.clone(),
        }
    }
}
