//! Error envelope shared by the platform's REST APIs.
//!
//! ```json
//! {"error": {"code": 404, "message": "...", "status": "NOT_FOUND", "details": [...]}}
//! ```

use reqwest::StatusCode;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: ApiError,
}

/// Decoded `error` object of a failed call.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiError {
    #[serde(default)]
    pub(crate) code: u16,
    #[serde(default)]
    pub(crate) message: String,
    /// Canonical status name, e.g. `NOT_FOUND`.
    #[serde(default)]
    pub(crate) status: String,
    #[serde(default)]
    pub(crate) details: Vec<serde_json::Value>,
}

impl ApiError {
    /// Parse an error body. Bodies that are not the JSON envelope keep their
    /// text as the message.
    pub(crate) fn parse(status: StatusCode, body: &str) -> Self {
        let mut error = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|envelope| envelope.error)
            .unwrap_or_else(|_| ApiError {
                message: body.trim().to_string(),
                ..ApiError::default()
            });
        if error.code == 0 {
            error.code = status.as_u16();
        }
        if error.message.is_empty() {
            error.message = status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string();
        }
        error
    }

    /// `errorCode` of the first detail whose `@type` ends with `type_suffix`.
    pub(crate) fn detail_code(&self, type_suffix: &str) -> Option<&str> {
        self.details
            .iter()
            .filter(|d| {
                d.get("@type")
                    .and_then(serde_json::Value::as_str)
                    .is_some_and(|t| t.ends_with(type_suffix))
            })
            .find_map(|d| d.get("errorCode").and_then(serde_json::Value::as_str))
    }
}
