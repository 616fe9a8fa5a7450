// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Report routes: upload, listing, authority review, notifications.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Progress, Report, RoadLocation, SeenStatus};
use crate::services::{ReportFilter, ReportStats};
use crate::time_utils::{format_utc_rfc3339, parse_rfc3339_utc};
use crate::workflow::NewReport;
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Uploads carry the image inline as base64.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Report routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/reports",
            get(list_own_reports)
                .post(create_report)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/reports/all", get(list_all_reports))
        .route("/api/reports/stats", get(get_stats))
        .route("/api/reports/{id}", get(get_report))
        .route("/api/reports/{id}/seen", post(mark_seen))
        .route("/api/reports/{id}/progress", put(set_progress))
        .route("/api/notifications", get(get_notifications))
}

// ─── Responses ───────────────────────────────────────────────

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReportResponse {
    pub id: String,
    pub submitter_email: String,
    pub image_name: String,
    pub image_url: String,
    pub predicted_image_url: Option<String>,
    pub classification: String,
    pub confidence: f64,
    pub road_location: RoadLocation,
    pub status: SeenStatus,
    pub progress: Progress,
    pub created_at: String,
    pub resolved_at: Option<String>,
}

impl From<Report> for ReportResponse {
    fn from(r: Report) -> Self {
        Self {
            id: r.id,
            submitter_email: r.submitter_email,
            image_name: r.image_name,
            image_url: r.image_url,
            predicted_image_url: r.predicted_image_url,
            classification: r.classification,
            confidence: r.confidence,
            road_location: r.road_location,
            status: r.status,
            progress: r.progress,
            created_at: format_utc_rfc3339(r.created_at),
            resolved_at: r.resolved_at.map(format_utc_rfc3339),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReportsResponse {
    pub reports: Vec<ReportResponse>,
    pub total: u32,
}

impl From<Vec<Report>> for ReportsResponse {
    fn from(reports: Vec<Report>) -> Self {
        let reports: Vec<ReportResponse> = reports.into_iter().map(Into::into).collect();
        Self {
            total: reports.len() as u32,
            reports,
        }
    }
}

// ─── Upload ──────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
struct CreateReportRequest {
    #[validate(length(min = 1, max = 255))]
    image_name: String,
    /// Where the client stored the original image
    #[validate(url)]
    image_url: String,
    /// Image bytes for classification: base64, optionally as a data URI
    #[validate(length(min = 1))]
    image_data: String,
    #[serde(default)]
    #[validate(url)]
    predicted_image_url: Option<String>,
}

/// Decode the inline image, accepting a `data:<mime>;base64,` prefix.
fn decode_image(raw: &str) -> Result<Vec<u8>> {
    let payload = match raw.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => raw,
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| AppError::BadRequest("'image_data' is not valid base64".to_string()))?;

    if bytes.is_empty() {
        return Err(AppError::BadRequest("'image_data' is empty".to_string()));
    }
    Ok(bytes)
}

/// Classify and file a new report for the current user.
async fn create_report(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateReportRequest>,
) -> Result<(StatusCode, Json<ReportResponse>)> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let image = decode_image(&body.image_data)?;

    tracing::debug!(
        email = %user.email,
        image_name = %body.image_name,
        bytes = image.len(),
        "Report upload received"
    );

    let upload = NewReport {
        image_name: body.image_name,
        image_url: body.image_url,
        predicted_image_url: body.predicted_image_url,
    };

    let report = state
        .reports
        .create_report(&user.actor(), upload, image)
        .await?;

    Ok((StatusCode::CREATED, Json(report.into())))
}

// ─── Listing ─────────────────────────────────────────────────

/// Current user's reports, newest first.
async fn list_own_reports(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ReportsResponse>> {
    let reports = state.reports.list_own(&user.actor()).await?;
    Ok(Json(reports.into()))
}

#[derive(Deserialize)]
struct ListAllQuery {
    progress: Option<String>,
    status: Option<String>,
}

impl ListAllQuery {
    fn into_filter(self) -> Result<ReportFilter> {
        let progress = self
            .progress
            .map(|p| p.parse::<Progress>())
            .transpose()
            .map_err(AppError::BadRequest)?;
        let status = self
            .status
            .map(|s| s.parse::<SeenStatus>())
            .transpose()
            .map_err(AppError::BadRequest)?;
        Ok(ReportFilter { progress, status })
    }
}

/// All reports, optionally filtered (authority only).
async fn list_all_reports(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ListAllQuery>,
) -> Result<Json<ReportsResponse>> {
    let filter = params.into_filter()?;
    tracing::debug!(
        email = %user.email,
        progress = ?filter.progress,
        status = ?filter.status,
        "Listing all reports"
    );

    let reports = state.reports.list_all(&user.actor(), filter).await?;
    Ok(Json(reports.into()))
}

/// Dashboard counters (authority only).
async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ReportStats>> {
    Ok(Json(state.reports.stats(&user.actor()).await?))
}

async fn get_report(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ReportResponse>> {
    let report = state.reports.get(&user.actor(), &id).await?;
    Ok(Json(report.into()))
}

// ─── Authority Review ────────────────────────────────────────

/// Mark a report as seen (authority only). Idempotent.
async fn mark_seen(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ReportResponse>> {
    let report = state.reports.mark_seen(&user.actor(), &id).await?;
    Ok(Json(report.into()))
}

#[derive(Deserialize)]
struct SetProgressRequest {
    progress: Progress,
}

/// Move a report forward in the workflow (authority only).
async fn set_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(body): Json<SetProgressRequest>,
) -> Result<Json<ReportResponse>> {
    let report = state
        .reports
        .set_progress(&user.actor(), &id, body.progress)
        .await?;
    Ok(Json(report.into()))
}

// ─── Notifications ───────────────────────────────────────────

#[derive(Deserialize)]
struct NotificationsQuery {
    /// Client watermark (RFC3339). Absent on the first poll.
    since: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NotificationsResponse {
    pub reports: Vec<ReportResponse>,
    pub count: u32,
    /// Store this as the next `since`.
    pub checked_at: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub poll_interval_secs: u64,
}

/// Reports of the current user resolved since the client's watermark.
async fn get_notifications(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<NotificationsQuery>,
) -> Result<Json<NotificationsResponse>> {
    let since: DateTime<Utc> = match params.since.as_deref() {
        Some(raw) => parse_rfc3339_utc(raw).ok_or_else(|| {
            AppError::BadRequest("Invalid 'since' parameter: must be RFC3339 datetime".to_string())
        })?,
        None => DateTime::<Utc>::UNIX_EPOCH,
    };

    let (reports, checked_at) = state.reports.newly_resolved(&user.actor(), since).await?;

    let reports: Vec<ReportResponse> = reports.into_iter().map(Into::into).collect();
    Ok(Json(NotificationsResponse {
        count: reports.len() as u32,
        reports,
        checked_at: format_utc_rfc3339(checked_at),
        poll_interval_secs: state.config.notification_poll_secs,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_image_plain_and_data_uri() {
        let encoded = STANDARD.encode(b"jpeg-bytes");
        assert_eq!(decode_image(&encoded).unwrap(), b"jpeg-bytes");
        let uri = format!("data:image/jpeg;base64,{}", encoded);
        assert_eq!(decode_image(&uri).unwrap(), b"jpeg-bytes");
    }

    #[test]
    fn test_decode_image_rejects_garbage() {
        assert!(matches!(
            decode_image("%%%not base64%%%"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_list_query_parsing() {
        let filter = ListAllQuery {
            progress: Some("pending".to_string()),
            status: Some("Seen".to_string()),
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.progress, Some(Progress::Unresolved));
        assert_eq!(filter.status, Some(SeenStatus::Seen));

        let err = ListAllQuery {
            progress: Some("closed".to_string()),
            status: None,
        }
        .into_filter()
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
