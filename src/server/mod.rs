//! OpenAI-compatible HTTP surface
//!
//! - `POST /v1/chat/completions` (JSON or SSE)
//! - `GET /v1/models`
//! - `GET /health`
//!
//! `/v1` routes sit behind the bearer-key check when an API key is configured.

pub mod auth;
pub mod chat;
pub mod error;
pub mod health;
pub mod models;
pub mod openai;
pub mod state;

#[cfg(test)]
mod tests;

pub use error::ApiError;
pub use state::AppState;

use crate::error::{ErrorCode, GatewayError, Result};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub fn build_router(state: AppState) -> Router {
    let v1 = Router::new()
        .route("/chat/completions", post(chat::completions))
        .route("/models", get(models::list_models))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .nest("/v1", v1)
        .route("/health", get(health::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(state: AppState) -> Result<()> {
    let addr = state.config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        GatewayError::server(
            ErrorCode::SERVER_BIND_FAILED,
            format!("Failed to bind {addr}"),
        )
        .with_source(e)
    })?;

    info!(
        "Serving model '{}' on http://{}",
        state.model_id(),
        addr
    );

    let client = state.client.clone();
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutting down, refusing new inference work");
            client.close();
        })
        .await
        .map_err(|e| {
            GatewayError::server(ErrorCode::SERVER_SHUTDOWN_FAILED, "Server terminated abnormally")
                .with_source(e)
        })
}
