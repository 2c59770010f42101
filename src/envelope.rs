//! Uniform `{ success, message, data, error, timestamp }` response wrapper.
//!
//! Handlers return an [`ApiResponse`] and errors render through
//! [`crate::error::AppError`]; both end up as an [`Envelope`] so every JSON
//! body leaving the service has the same shape.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Wire shape shared by every JSON response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub timestamp: String,
}

/// Error section of a failed envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl<T> Envelope<T> {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            success: status.as_u16() < 400,
            message: message.into(),
            data: None,
            error: None,
            timestamp: now_iso8601(),
        }
    }
}

/// Current UTC time with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Successful handler result, rendered as an [`Envelope`]
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    message: String,
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            message: "Success".to_string(),
            data: Some(data),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn into_envelope(self) -> Envelope<T> {
        let mut envelope = Envelope::new(self.status, self.message);
        envelope.data = self.data;
        envelope
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self.into_envelope())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_shape() {
        let envelope = ApiResponse::ok(json!({ "chatId": "shop42" }))
            .with_message("Welcome message retrieved")
            .into_envelope();

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "Welcome message retrieved");
        assert_eq!(value["data"]["chatId"], "shop42");
        assert!(value.get("error").is_none());
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_success_flag_follows_status() {
        let envelope = ApiResponse::ok(())
            .with_status(StatusCode::BAD_REQUEST)
            .into_envelope();
        assert!(!envelope.success);

        let envelope = ApiResponse::ok(()).with_status(StatusCode::CREATED).into_envelope();
        assert!(envelope.success);
    }

    #[test]
    fn test_timestamp_is_rfc3339() {
        let ts = now_iso8601();
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
