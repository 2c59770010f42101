use crate::app::AppState;
use crate::auth::optional_auth;
use crate::handlers::{
    chat_health, chat_message, chat_welcome, db_test, health_check, not_found, service_info,
};
use crate::rate_limit::rate_limit;
use axum::{Router, middleware, routing::get, routing::post};

/// Chat routes, mounted under `{API_PREFIX}/{API_VERSION}/chat`
pub fn chat_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(chat_health))
        .route("/{chatid}", get(chat_welcome))
        .route("/{chatid}/message", post(chat_message))
        .method_not_allowed_fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), optional_auth))
        .layer(middleware::from_fn_with_state(state, rate_limit))
}

/// Creates and configures all application routes
pub fn create_routes(state: AppState) -> Router<AppState> {
    let chat_base = state.config.chat_base_path();

    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health_check))
        .route("/db-test", get(db_test))
        .nest(&chat_base, chat_routes(state))
        .method_not_allowed_fallback(not_found)
        .fallback(not_found)
}
