use std::time::Instant;

use axum::{
    extract::{OriginalUri, State},
    http::Method,
};
use once_cell::sync::Lazy;
use tracing::{debug, info};

use crate::app::AppState;
use crate::auth::CurrentUser;
use crate::chat::welcome_message;
use crate::envelope::{ApiResponse, now_iso8601};
use crate::error::{AppError, AppResult};
use crate::extract::{ChatId, ValidatedJson};
use crate::models::{
    ChatMessageRequest, ChatMessageResponse, ChatWelcomeResponse, DatabaseStatus, HealthResponse,
    ServerHealth, ServiceInfo,
};

pub const SERVICE_NAME: &str = "NetZero Chat Server";
pub const CHAT_SERVICE_NAME: &str = "chat-service";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

static STARTED_AT: Lazy<Instant> = Lazy::new(Instant::now);

/// Starts the uptime clock; later calls are no-ops
pub fn mark_started() {
    Lazy::force(&STARTED_AT);
}

fn uptime_secs() -> f64 {
    STARTED_AT.elapsed().as_secs_f64()
}

/// Chat health handler
/// Reports static service metadata without checking any dependency
pub async fn chat_health() -> AppResult<ApiResponse<HealthResponse>> {
    debug!("Chat health endpoint called");

    let response = HealthResponse {
        service: CHAT_SERVICE_NAME.to_string(),
        status: "healthy".to_string(),
        version: SERVICE_VERSION.to_string(),
        uptime: uptime_secs(),
        timestamp: now_iso8601(),
    };

    Ok(ApiResponse::ok(response).with_message("Chat service is healthy"))
}

/// Welcome handler for a chat context
pub async fn chat_welcome(
    user: CurrentUser,
    ChatId(chat_id): ChatId,
) -> AppResult<ApiResponse<ChatWelcomeResponse>> {
    let user_id = user.user_id_or_anonymous();
    info!(user_id = %user_id, chat_id = %chat_id, "Chat welcome requested");

    let response = ChatWelcomeResponse {
        message: welcome_message(&chat_id),
        chat_id,
        user_id,
    };

    Ok(ApiResponse::ok(response).with_message("Welcome message retrieved successfully"))
}

/// Message handler
/// Accepts a user message and replies with the chat's welcome text
pub async fn chat_message(
    user: CurrentUser,
    ChatId(chat_id): ChatId,
    ValidatedJson(payload): ValidatedJson<ChatMessageRequest>,
) -> AppResult<ApiResponse<ChatMessageResponse>> {
    let user_message = payload.message.ok_or_else(|| {
        AppError::internal("Failed to process message", "message missing after validation")
    })?;
    let user_id = user.user_id_or_anonymous();
    info!(
        user_id = %user_id,
        chat_id = %chat_id,
        length = user_message.chars().count(),
        "Chat message received"
    );

    let response = ChatMessageResponse {
        bot_response: welcome_message(&chat_id),
        chat_id,
        user_id,
        user_message,
    };

    Ok(ApiResponse::ok(response).with_message("Message processed successfully"))
}

/// Top-level health check handler
pub async fn health_check(State(state): State<AppState>) -> AppResult<ApiResponse<ServerHealth>> {
    debug!("Health check endpoint called");

    let response = ServerHealth {
        status: "OK",
        service: SERVICE_NAME,
        environment: state.config.environment.to_string(),
        timestamp: now_iso8601(),
    };

    Ok(ApiResponse::ok(response).with_message("Server is running"))
}

/// Root handler listing the available endpoints
pub async fn service_info(State(state): State<AppState>) -> AppResult<ApiResponse<ServiceInfo>> {
    let base = state.config.chat_base_path();
    let response = ServiceInfo {
        service: SERVICE_NAME,
        version: SERVICE_VERSION,
        endpoints: vec![
            "GET /health".to_string(),
            "GET /db-test".to_string(),
            format!("GET {base}/health"),
            format!("GET {base}/:chatid"),
            format!("POST {base}/:chatid/message"),
        ],
    };

    Ok(ApiResponse::ok(response).with_message(format!("{SERVICE_NAME} is running")))
}

/// Diagnostic handler probing the database pool
pub async fn db_test(State(state): State<AppState>) -> AppResult<ApiResponse<DatabaseStatus>> {
    info!("Database connectivity test requested");
    state.database.ping().await?;

    Ok(ApiResponse::ok(DatabaseStatus { connected: true })
        .with_message("Database connection successful"))
}

/// Fallback for unmatched routes and methods, reporting the full request path
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> AppError {
    AppError::NotFound {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Identity;
    use crate::config::Config;
    use axum::http::Uri;
    use std::time::Duration;

    #[tokio::test]
    async fn test_chat_health() {
        let response = chat_health().await.unwrap().into_envelope();
        assert!(response.success);
        let data = response.data.unwrap();
        assert_eq!(data.status, "healthy");
        assert_eq!(data.service, CHAT_SERVICE_NAME);
        assert!(data.uptime >= 0.0);
    }

    #[tokio::test]
    async fn test_uptime_counts_from_state_creation() {
        let _state = AppState::new(Config::default());
        tokio::time::sleep(Duration::from_millis(20)).await;

        let data = chat_health().await.unwrap().into_envelope().data.unwrap();
        assert!(data.uptime >= 0.02);
    }

    #[tokio::test]
    async fn test_chat_welcome_anonymous() {
        let response = chat_welcome(CurrentUser(None), ChatId("shop42".to_string()))
            .await
            .unwrap()
            .into_envelope();

        let data = response.data.unwrap();
        assert_eq!(data.chat_id, "shop42");
        assert_eq!(data.user_id, "anonymous");
        assert_eq!(data.message, "Welcome to shop42! How can I help you today?");
    }

    #[tokio::test]
    async fn test_chat_message_ignores_content() {
        let user = CurrentUser(Some(Identity {
            user_id: "u-1".to_string(),
            email: None,
            role: None,
        }));
        let request = ChatMessageRequest {
            message: Some("please refund my order".to_string()),
        };

        let response = chat_message(user, ChatId("shop42".to_string()), ValidatedJson(request))
            .await
            .unwrap()
            .into_envelope();

        let data = response.data.unwrap();
        assert_eq!(data.user_id, "u-1");
        assert_eq!(data.user_message, "please refund my order");
        assert_eq!(data.bot_response, welcome_message("shop42"));
    }

    #[tokio::test]
    async fn test_not_found() {
        let uri = OriginalUri(Uri::from_static("/missing?x=1"));
        let err = not_found(Method::PATCH, uri).await;
        assert!(matches!(
            err,
            AppError::NotFound { ref method, ref path } if method == "PATCH" && path == "/missing"
        ));
    }
}
