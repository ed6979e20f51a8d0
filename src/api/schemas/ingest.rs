use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IngestResponse {
    #[must_use]
    pub fn ok(amount: usize) -> Self {
        Self { status: "ok".to_string(), amount: Some(amount), error: None }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self { status: "error".to_string(), amount: None, error: Some(message.into()) }
    }
}
