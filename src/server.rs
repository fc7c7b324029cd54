//! HTTP front end: `POST /check-url` runs one evaluation per request.

use crate::config::Config;
use crate::error::EvalError;
use crate::evaluator::Evaluator;
use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

#[derive(Clone)]
pub struct AppState {
    pub evaluator: Arc<Evaluator>,
}

#[derive(Debug, Deserialize)]
pub struct CheckUrlBody {
    pub url: Option<String>,
}

pub fn router(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/check-url", post(handle_check_url))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(config.server.max_body_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.request_timeout_secs),
        ))
}

/// Bind `host:port` from `config` and serve until shutdown.
pub async fn run_server(config: Config) -> Result<()> {
    let addr = (config.server.host.as_str(), config.server.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| {
            format!(
                "failed to bind {}:{}",
                config.server.host, config.server.port
            )
        })?;
    run_server_with_listener(listener, config).await
}

/// Serve on an already-bound listener.
pub async fn run_server_with_listener(
    listener: tokio::net::TcpListener,
    config: Config,
) -> Result<()> {
    let evaluator = Evaluator::new(&config.fetch).context("failed to build http client")?;
    let state = AppState {
        evaluator: Arc::new(evaluator),
    };

    let local = listener.local_addr()?;
    tracing::info!(addr = %local, "server running");

    axum::serve(listener, router(state, &config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

/// GET /: liveness text.
async fn handle_root() -> &'static str {
    "PhishGuard Backend is Running!"
}

/// POST /check-url
async fn handle_check_url(
    State(state): State<AppState>,
    body: Result<Json<CheckUrlBody>, JsonRejection>,
) -> Response {
    let url = match body {
        Ok(Json(body)) => body.url,
        Err(e) => {
            tracing::debug!(error = %e, "unreadable check-url body");
            None
        }
    };

    match state.evaluator.evaluate(url.as_deref()).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(EvalError::MissingUrl) => {
            tracing::info!("no url provided");
            error_response(StatusCode::BAD_REQUEST, "URL is required")
        }
        Err(e @ EvalError::Internal(_)) => {
            tracing::error!(url = url.as_deref().unwrap_or(""), error = %e, "error checking url");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_url_is_optional() {
        let parsed: CheckUrlBody = serde_json::from_str("{}").unwrap();
        assert!(parsed.url.is_none());

        let parsed: CheckUrlBody = serde_json::from_str(r#"{"url": "https://a.com"}"#).unwrap();
        assert_eq!(parsed.url.as_deref(), Some("https://a.com"));
    }

    #[test]
    fn non_string_url_is_a_rejection() {
        let parsed: Result<CheckUrlBody, _> = serde_json::from_str(r#"{"url": 42}"#);
        assert!(parsed.is_err());
    }
}
