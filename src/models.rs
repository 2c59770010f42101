use serde::{Deserialize, Serialize};
use validator::Validate;

/// Response payload for `GET /chat/{chatId}`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatWelcomeResponse {
    pub chat_id: String,
    pub user_id: String,
    pub message: String,
}

/// Request payload for `POST /chat/{chatId}/message`
#[derive(Debug, Deserialize, Validate)]
pub struct ChatMessageRequest {
    #[validate(
        required(message = "Message is required"),
        length(min = 1, max = 1000, message = "Message must be between 1 and 1000 characters")
    )]
    pub message: Option<String>,
}

/// Response payload for `POST /chat/{chatId}/message`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageResponse {
    pub chat_id: String,
    pub user_id: String,
    pub user_message: String,
    pub bot_response: String,
}

/// Response payload for the chat health endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub service: String,
    pub status: String,
    pub version: String,
    /// Process uptime in seconds
    pub uptime: f64,
    pub timestamp: String,
}

/// Response payload for the top-level `/health` endpoint
#[derive(Debug, Serialize)]
pub struct ServerHealth {
    pub status: &'static str,
    pub service: &'static str,
    pub environment: String,
    pub timestamp: String,
}

/// Response payload for `GET /`
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<String>,
}

/// Response payload for `GET /db-test`
#[derive(Debug, Serialize)]
pub struct DatabaseStatus {
    pub connected: bool,
}
