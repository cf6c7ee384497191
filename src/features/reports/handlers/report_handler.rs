use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::{sse::Event, IntoResponse, Response, Sse},
    Json,
};
use chrono::Local;
use tokio_stream::{wrappers::WatchStream, StreamExt};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::AdminSession;
use crate::features::auth::RequireAdmin;
use crate::features::reports::clients::Publicizer;
use crate::features::reports::dtos::{ExportDocumentDto, FilterQuery, ReportRowDto, SetStatusDto};
use crate::features::reports::models::ReportTable;
use crate::features::reports::services::{
    apply_filters, ExportService, LifecycleService, RenderService,
};
use crate::features::users::models::UserTable;
use crate::modules::store::LiveTable;
use crate::shared::types::{ApiResponse, Meta};

/// State for report handlers
#[derive(Clone)]
pub struct ReportState {
    pub reports: Arc<LiveTable<ReportTable>>,
    pub users: Arc<LiveTable<UserTable>>,
    pub render_service: Arc<RenderService>,
    pub lifecycle_service: Arc<LifecycleService>,
    pub export_service: Arc<ExportService>,
    pub publicizer: Arc<dyn Publicizer>,
}

/// Filtered reports table, most recent first
#[utoipa::path(
    get,
    path = "/api/reports",
    params(FilterQuery),
    responses(
        (status = 200, description = "Filtered report rows", body = ApiResponse<Vec<ReportRowDto>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn list_reports(
    session: AdminSession,
    State(state): State<ReportState>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<ApiResponse<Vec<ReportRowDto>>>> {
    let config = query.into_config();
    let reports = state.reports.load();
    let users = state.users.load();
    let now = Local::now();

    let ids = apply_filters(&reports, &config, &now);
    let rows = state
        .render_service
        .render_rows(&ids, &reports, &users, &now, session.is_admin())
        .await;

    let total = rows.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(rows),
        None,
        Some(Meta { total }),
    )))
}

/// Live view of the filtered table over SSE
///
/// Emits a full `reports` frame whenever the report or user collection
/// changes, starting with the current state.
#[utoipa::path(
    get,
    path = "/api/reports/live",
    params(FilterQuery),
    responses(
        (status = 200, description = "SSE stream of report row frames"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn live_reports(
    session: AdminSession,
    State(state): State<ReportState>,
    Query(query): Query<FilterQuery>,
) -> Result<Response> {
    let config = query.into_config();
    let can_publicize = session.is_admin();

    let ticks = WatchStream::new(state.reports.watch())
        .map(|_| ())
        .merge(WatchStream::new(state.users.watch()).map(|_| ()));

    let stream = ticks.then(move |_| {
        let state = state.clone();
        let config = config.clone();
        async move {
            let reports = state.reports.load();
            let users = state.users.load();
            let now = Local::now();
            let ids = apply_filters(&reports, &config, &now);
            let rows = state
                .render_service
                .render_rows(&ids, &reports, &users, &now, can_publicize)
                .await;
            Event::default().event("reports").json_data(&rows)
        }
    });

    let sse = Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(std::time::Duration::from_secs(15))
            .text("ping"),
    );

    Ok(sse.into_response())
}

/// Print layout of the currently filtered table
#[utoipa::path(
    get,
    path = "/api/reports/export",
    params(FilterQuery),
    responses(
        (status = 200, description = "Positioned-text document", body = ApiResponse<ExportDocumentDto>),
        (status = 400, description = "No reports match the filters"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn export_reports(
    _session: AdminSession,
    State(state): State<ReportState>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<ApiResponse<ExportDocumentDto>>> {
    let config = query.into_config();
    let reports = state.reports.load();
    let now = Local::now();

    let ids = apply_filters(&reports, &config, &now);
    let document = state.export_service.build_document(&ids, &reports, &now)?;

    Ok(Json(ApiResponse::success(Some(document), None, None)))
}

/// Move a report through its lifecycle
#[utoipa::path(
    patch,
    path = "/api/reports/{id}/status",
    params(
        ("id" = String, Path, description = "Report id")
    ),
    request_body = SetStatusDto,
    responses(
        (status = 200, description = "Status updated"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Report not found"),
        (status = 409, description = "Transition not allowed from the current status")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn set_report_status(
    _session: AdminSession,
    State(state): State<ReportState>,
    Path(id): Path<String>,
    AppJson(dto): AppJson<SetStatusDto>,
) -> Result<Json<ApiResponse<()>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    state.lifecycle_service.set_status(&id, &dto).await?;

    Ok(Json(ApiResponse::success(
        None,
        Some("Report status updated".to_string()),
        None,
    )))
}

/// Broadcast a report beyond its reporter (admin only)
#[utoipa::path(
    post,
    path = "/api/reports/{id}/publicize",
    params(
        ("id" = String, Path, description = "Report id")
    ),
    responses(
        (status = 200, description = "Report publicized"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Report not found"),
        (status = 502, description = "Broadcast endpoint failed")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn publicize_report(
    RequireAdmin(_session): RequireAdmin,
    State(state): State<ReportState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    if state.reports.load().get(&id).is_none() {
        return Err(AppError::NotFound(format!("Report {} not found", id)));
    }

    state.publicizer.publicize(&id).await?;

    Ok(Json(ApiResponse::success(
        None,
        Some("Report publicized".to_string()),
        None,
    )))
}
