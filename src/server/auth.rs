//! Bearer-token gate and presence heartbeat for the processor surface.
//!
//! Every processor call must carry a valid `Authorization: Bearer <token>`
//! header; as a side effect it also refreshes the caller's worker presence
//! entry using the `X-Worker-Id` / `X-Worker-Kinds` headers (comma-separated
//! kinds), per the presence model in `archivist::presence`.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use archivist::error::AppError;

use super::AppState;

pub async fn require_processor_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if token != Some(state.bearer_token.as_str()) {
        return Err(AppError::Unauthorized);
    }

    let worker_id = request
        .headers()
        .get("x-worker-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let kinds: Vec<String> = request
        .headers()
        .get("x-worker-kinds")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').map(|k| k.trim().to_string()).filter(|k| !k.is_empty()).collect())
        .unwrap_or_default();

    if let Some(worker_id) = worker_id {
        state.workers.heartbeat(&worker_id, kinds).await;
    }

    Ok(next.run(request).await)
}

/// Refresh scraper presence on every ingest call, keyed by the
/// `X-Source-System` header. Unauthenticated by design (the ingest surface
/// has no bearer token), so a missing header just means no heartbeat for
/// that request rather than a rejected one.
pub async fn track_scraper_presence(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let source_system = request
        .headers()
        .get("x-source-system")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let records_ingested = request
        .headers()
        .get("x-records-ingested")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);
    let pages_ingested = request
        .headers()
        .get("x-pages-ingested")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    if let Some(source_system) = source_system {
        state
            .scrapers
            .heartbeat(&source_system, records_ingested, pages_ingested)
            .await;
    }

    next.run(request).await
}
