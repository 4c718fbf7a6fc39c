//! Router wiring for the three HTTP surfaces: ingest, processor, catalog.

use axum::routing::{delete, get, post};
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;

use super::{auth, handlers, AppState};

pub fn create_router(state: AppState) -> Router {
    let ingest_routes = Router::new()
        .route("/ingest/records", post(handlers::upsert_record))
        .route("/ingest/records/:id/pages", post(handlers::attach_page))
        .route("/ingest/records/:id/pdf", post(handlers::attach_pdf))
        .route(
            "/ingest/records/:id/text-pdf",
            post(handlers::attach_text_pdf),
        )
        .route(
            "/ingest/records/:id/repair",
            post(handlers::repair_record),
        )
        .route(
            "/ingest/records/:id/complete",
            post(handlers::complete_ingest),
        )
        .route("/ingest/records/:id", delete(handlers::delete_record))
        .route(
            "/ingest/status/:source_system/:source_record_id",
            get(handlers::ingest_status),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::track_scraper_presence,
        ));

    let processor_routes = Router::new()
        .route("/processor/jobs/events", get(handlers::job_events))
        .route("/processor/jobs/claim", post(handlers::claim_job))
        .route(
            "/processor/jobs/:job_id/complete",
            post(handlers::complete_job),
        )
        .route("/processor/jobs/:job_id/fail", post(handlers::fail_job))
        .route(
            "/processor/pages/:page_id/image",
            get(handlers::page_image),
        )
        .route("/processor/ocr/:page_id", post(handlers::post_ocr_text))
        .route(
            "/processor/ocr/:page_id/artifact",
            post(handlers::post_ocr_artifact),
        )
        .route(
            "/processor/records/:id/searchable-pdf",
            post(handlers::post_searchable_pdf),
        )
        .route(
            "/processor/entities/:page_id",
            post(handlers::post_entities),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_processor_token,
        ));

    let catalog_routes = Router::new()
        .route("/records", get(handlers::list_records))
        .route("/records/events", get(handlers::record_events))
        .route("/records/:id", get(handlers::get_record))
        .route("/records/:id/pages", get(handlers::list_record_pages))
        .route("/records/:id/pdf", get(handlers::get_record_pdf))
        .route("/files/:attachment_id", get(handlers::get_file))
        .route("/search", get(handlers::search_records));

    Router::new()
        .merge(ingest_routes)
        .merge(processor_routes)
        .merge(catalog_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
