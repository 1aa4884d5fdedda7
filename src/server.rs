//! Inbound HTTP surface: route registration and the relay pipeline.
//!
//! Each POST handler:
//! 1. Enforces the body size cap.
//! 2. Verifies the HMAC-SHA256 signature over the raw body bytes.
//! 3. Parses the JSON payload.
//! 4. Normalizes it into a Discord message and forwards it.
//!
//! Requests are stateless and independent; the only shared state is the
//! immutable configuration behind an `Arc`.

use crate::config::Config;
use crate::error::RelayError;
use crate::forwarder::{self, ForwardOutcome};
use crate::normalize;
use crate::rewrite::LinkRewriter;
use crate::signature;
use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::{ConnectInfo, DefaultBodyLimit, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;

/// Signature header names tried in order.
const SIGNATURE_HEADERS: &[&str] = &["x-nansen-signature", "x-signature"];

/// A hung inbound connection may not occupy a handler slot forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct AppState {
    pub config: Config,
    pub rewriter: LinkRewriter,
}

/// Build the relay router.
///
/// The two `/api/webhooks/...` shapes exist so a Discord-style caller can
/// point its native webhook URL at this relay unchanged; their path
/// parameters are ignored and success is an empty 204.
pub fn router(config: Config) -> Router {
    let max_body = config.max_body_bytes;
    let rewriter = LinkRewriter::new(&config);
    let state = Arc::new(AppState { config, rewriter });

    Router::new()
        .route("/", get(health))
        .route("/nansen", post(handle_nansen))
        .route("/api/webhooks/{id}/{token}", post(handle_discord_compat))
        .route(
            "/discord.com/api/webhooks/{id}/{token}",
            post(handle_discord_compat),
        )
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .with_state(state)
}

/// Bind and serve until ctrl-c.
pub async fn run(bind: SocketAddr, config: Config) -> Result<()> {
    let app = router(config);
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!("relay listening on {bind}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

// ── Route handlers ────────────────────────────────────────────────────────────

/// GET / — liveness probe, no auth.
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// POST /nansen — the primary relay endpoint.
async fn handle_nansen(
    State(state): State<Arc<AppState>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, RelayError> {
    relay(&state, remote, &headers, &body).await?;
    Ok(Json(json!({ "status": "ok" })))
}

/// POST /api/webhooks/{id}/{token} — Discord-URL-shaped variant.
async fn handle_discord_compat(
    State(state): State<Arc<AppState>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    Path((_id, _token)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, RelayError> {
    relay(&state, remote, &headers, &body).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Relay pipeline ────────────────────────────────────────────────────────────

async fn relay(
    state: &AppState,
    remote: SocketAddr,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<ForwardOutcome, RelayError> {
    enforce_body_cap(&state.config, headers, remote, body.len())?;

    if !signature::verify(
        state.config.signing_secret.as_deref(),
        body,
        signature_header(headers),
    ) {
        tracing::warn!("rejected request from {remote}: invalid or missing signature");
        return Err(RelayError::Unauthorized);
    }

    let payload: Value = serde_json::from_slice(body).map_err(|e| {
        tracing::warn!("rejected request from {remote}: body is not valid JSON: {e}");
        RelayError::InvalidPayload
    })?;

    let message = normalize::normalize(&payload, &state.rewriter);
    let outcome = forwarder::forward(
        state.config.discord_webhook.as_deref(),
        state.config.forward_timeout,
        &message,
    )
    .await?;

    if outcome == ForwardOutcome::Failed {
        tracing::warn!("forward failed for request from {remote}, acknowledging anyway");
    }
    Ok(outcome)
}

/// Reject oversized payloads before any parsing: first on the declared
/// `Content-Length`, then on the bytes actually read (chunked senders).
fn enforce_body_cap(
    config: &Config,
    headers: &HeaderMap,
    remote: SocketAddr,
    body_len: usize,
) -> Result<(), RelayError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    if declared.is_some_and(|len| len > config.max_body_bytes) || body_len > config.max_body_bytes {
        tracing::warn!(
            "rejected request from {remote}: payload of {} bytes exceeds cap of {}",
            declared.unwrap_or(body_len),
            config.max_body_bytes
        );
        return Err(RelayError::PayloadTooLarge);
    }
    Ok(())
}

fn signature_header(headers: &HeaderMap) -> Option<&str> {
    SIGNATURE_HEADERS
        .iter()
        .find_map(|name| headers.get(*name)?.to_str().ok())
}
