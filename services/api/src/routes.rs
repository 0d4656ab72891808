use crate::infra::{AppState, InMemoryHiringService};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use chrono::Utc;
use fairhire::error::AppError;
use fairhire::workflows::hiring::{
    actor_from_headers, hiring_router, MatchImporter, MemoryStore, Role,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct MatchImportRequest {
    /// Offline matcher export with a `user_id,job_id,rank,match_percent,match_reason` header.
    pub(crate) csv: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct MatchImportResponse {
    pub(crate) users_updated: usize,
}

pub(crate) fn with_hiring_routes(service: Arc<InMemoryHiringService>) -> axum::Router {
    hiring_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/matches/import",
            axum::routing::post(match_import_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Replaces match lists wholesale, so only the gateway's operator identity may call it.
pub(crate) async fn match_import_endpoint(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
    Json(payload): Json<MatchImportRequest>,
) -> Response {
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    if let Err(response) = actor.require(Role::Operator) {
        return response;
    }

    match import_csv(state.store.as_ref(), payload.csv) {
        Ok(users_updated) => Json(MatchImportResponse { users_updated }).into_response(),
        Err(error) => error.into_response(),
    }
}

fn import_csv(store: &MemoryStore, csv: String) -> Result<usize, AppError> {
    let lists = MatchImporter::from_reader(Cursor::new(csv.into_bytes()), Utc::now())?;
    Ok(MatchImporter::store_all(store, lists)?)
}
