use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::dashboard::handlers::dashboard_handler;
use crate::features::dashboard::services::DashboardService;

pub fn routes(service: Arc<DashboardService>) -> Router {
    Router::new()
        .route(
            "/api/dashboard/summary",
            get(dashboard_handler::get_summary),
        )
        .with_state(service)
}
