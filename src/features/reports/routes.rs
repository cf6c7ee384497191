use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::features::reports::clients::Publicizer;
use crate::features::reports::handlers::{self, ReportState};
use crate::features::reports::models::ReportTable;
use crate::features::reports::services::{ExportService, LifecycleService, RenderService};
use crate::features::users::models::UserTable;
use crate::modules::store::LiveTable;

/// Create routes for the reports feature
///
/// All routes require the auth middleware to be applied by the caller
pub fn routes(
    reports: Arc<LiveTable<ReportTable>>,
    users: Arc<LiveTable<UserTable>>,
    render_service: Arc<RenderService>,
    lifecycle_service: Arc<LifecycleService>,
    export_service: Arc<ExportService>,
    publicizer: Arc<dyn Publicizer>,
) -> Router {
    let state = ReportState {
        reports,
        users,
        render_service,
        lifecycle_service,
        export_service,
        publicizer,
    };

    Router::new()
        .route("/api/reports", get(handlers::list_reports))
        .route("/api/reports/live", get(handlers::live_reports))
        .route("/api/reports/export", get(handlers::export_reports))
        .route(
            "/api/reports/{id}/status",
            patch(handlers::set_report_status),
        )
        .route(
            "/api/reports/{id}/publicize",
            post(handlers::publicize_report),
        )
        .with_state(state)
}
