//! Route handlers.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::Engine as _;
use chrono::Local;
use focusmode_core::export::{self, ExportFormat};
use focusmode_core::stats::{self, StatsRange};
use focusmode_core::{EndSession, SessionRecord, SessionStarted, StartSession};
use serde::Deserialize;

use crate::error::ApiError;
use crate::AppState;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatsQuery {
    user_id: Option<String>,
    range: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExportRequest {
    format: String,
    user_id: String,
    range: Option<String>,
}

fn require_user(user_id: Option<String>) -> ApiResult<String> {
    match user_id {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(ApiError::bad_request("missing 'userId' parameter")),
    }
}

/// Parse an optional `range`, falling back to `default` when absent.
fn parse_range(range: Option<&str>, default: StatsRange) -> ApiResult<StatsRange> {
    Ok(range
        .map(str::parse::<StatsRange>)
        .transpose()?
        .unwrap_or(default))
}

/// Records needed to summarize `range` for `user_id` as of now.
fn records_for(
    state: &AppState,
    user_id: &str,
    range: StatsRange,
    now: &chrono::DateTime<Local>,
) -> ApiResult<Vec<SessionRecord>> {
    let start = stats::query_start(range, now);
    Ok(state
        .sessions
        .store()
        .query_by_user(user_id, Some(start), None)?)
}

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    ApiError::new(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// POST /start
pub(crate) async fn handle_start(
    State(state): State<Arc<AppState>>,
    body: Result<Json<StartSession>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let session_id = state.sessions.start(request)?;
    Ok((StatusCode::CREATED, Json(SessionStarted { session_id })))
}

/// POST /end
pub(crate) async fn handle_end(
    State(state): State<Arc<AppState>>,
    body: Result<Json<EndSession>, JsonRejection>,
) -> ApiResult<Json<SessionRecord>> {
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    Ok(Json(state.sessions.end(request)?))
}

/// GET /stats?userId=..&range=today|week|month
pub(crate) async fn handle_stats(
    State(state): State<Arc<AppState>>,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let user_id = require_user(query.user_id)?;
    let range = parse_range(query.range.as_deref(), StatsRange::Today)?;

    let now = Local::now();
    let records = records_for(&state, &user_id, range, &now)?;
    Ok(Json(stats::summarize(&records, range, &now)))
}

/// POST /export
///
/// Without a `range` the last 30 days are exported. CSV comes back as an attachment; PDF as `{content, filename}` with the
/// document base64-encoded.
pub(crate) async fn handle_export(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ExportRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let format: ExportFormat = request.format.parse()?;
    let user_id = require_user(Some(request.user_id))?;
    let range = parse_range(request.range.as_deref(), StatsRange::Month)?;

    let now = Local::now();
    let records = records_for(&state, &user_id, range, &now)?;
    let report = export::render(format, &user_id, range, &records, &now);

    let response = match format {
        ExportFormat::Csv => (
            [
                (header::CONTENT_TYPE, report.content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", report.filename),
                ),
            ],
            report.bytes,
        )
            .into_response(),
        ExportFormat::Pdf => Json(serde_json::json!({
            "content": base64::engine::general_purpose::STANDARD.encode(&report.bytes),
            "filename": report.filename,
        }))
        .into_response(),
    };
    Ok(response)
}
