use axum::{
    Json,
    extract::{
        State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::app::AppState;
use crate::auth::AuthError;
use crate::envelope::{Envelope, ErrorBody};

/// Detail-free rendering of an error response, swapped in by
/// [`redact_error_details`] when running in production
#[derive(Debug, Clone)]
struct RedactedEnvelope(Envelope<()>);

/// A single failed field check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// Custom error type for the application
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(Vec<FieldViolation>),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("invalid id: {0}")]
    InvalidId(String),

    // Optional auth downgrades bad tokens to anonymous, so the two token
    // variants only surface from callers that require an identity.
    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    TokenExpired,

    #[error("duplicate entry")]
    Duplicate(String),

    #[error("foreign key violation")]
    ForeignKey(String),

    #[error("route {method} {path} not found")]
    NotFound { method: String, path: String },

    #[error("too many requests")]
    TooManyRequests,

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("{message}: {details}")]
    Internal { message: String, details: String },
}

impl AppError {
    pub fn internal(message: impl Into<String>, details: impl ToString) -> Self {
        AppError::Internal {
            message: message.into(),
            details: details.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::BadRequest(_)
            | AppError::InvalidId(_)
            | AppError::ForeignKey(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidToken | AppError::TokenExpired => StatusCode::UNAUTHORIZED,
            AppError::Duplicate(_) => StatusCode::CONFLICT,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AppError::Database(_) | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// User-facing message plus the optional detail payload
    fn public_parts(&self) -> (String, Option<serde_json::Value>) {
        match self {
            AppError::Validation(violations) => {
                ("Validation failed".to_string(), Some(json!(violations)))
            }
            AppError::BadRequest(reason) => ("Invalid request".to_string(), Some(json!(reason))),
            AppError::InvalidId(reason) => ("Invalid ID format".to_string(), Some(json!(reason))),
            AppError::InvalidToken => ("Invalid token".to_string(), None),
            AppError::TokenExpired => ("Token expired".to_string(), None),
            AppError::Duplicate(reason) => ("Duplicate entry".to_string(), Some(json!(reason))),
            AppError::ForeignKey(reason) => (
                "Referenced record does not exist".to_string(),
                Some(json!(reason)),
            ),
            AppError::NotFound { method, path } => {
                (format!("Route {method} {path} not found"), None)
            }
            AppError::TooManyRequests => (
                "Too many requests, please try again later.".to_string(),
                None,
            ),
            AppError::Database(err) => {
                ("Internal server error".to_string(), Some(json!(err.to_string())))
            }
            AppError::Internal { message, details } => (message.clone(), Some(json!(details))),
        }
    }

    /// Builds the envelope for this error. Details are dropped when
    /// `expose_details` is false, except for validation violations which
    /// describe the caller's own input.
    pub fn to_envelope(&self, expose_details: bool) -> Envelope<()> {
        let status = self.status();
        let (message, details) = self.public_parts();
        let details = match self {
            AppError::Validation(_) => details,
            _ if expose_details => details,
            _ => None,
        };

        let mut envelope = Envelope::new(status, message.clone());
        envelope.error = Some(ErrorBody { message, details });
        envelope
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Server error: {}", self);
        } else {
            warn!("Client error: {}", self);
        }

        let redacted = RedactedEnvelope(self.to_envelope(false));
        let mut response = (status, Json(self.to_envelope(true))).into_response();
        response.extensions_mut().insert(redacted);
        response
    }
}

/// Response mapper hiding error details when the service runs in production
pub async fn redact_error_details(State(state): State<AppState>, response: Response) -> Response {
    if !state.config.environment.is_production() {
        return response;
    }
    match response.extensions().get::<RedactedEnvelope>().cloned() {
        Some(RedactedEnvelope(envelope)) => (response.status(), Json(envelope)).into_response(),
        None => response,
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return AppError::Duplicate(db_err.message().to_string());
            }
            if db_err.is_foreign_key_violation() {
                return AppError::ForeignKey(db_err.message().to_string());
            }
        }
        AppError::Database(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Expired => AppError::TokenExpired,
            AuthError::Malformed(_) | AuthError::InvalidSignature | AuthError::MissingSubject => {
                AppError::InvalidToken
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidId(rejection.body_text())
    }
}

/// Result type for application handlers
pub type AppResult<T> = Result<T, AppError>;
