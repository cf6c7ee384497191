use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::dashboard::{dtos as dashboard_dtos, handlers as dashboard_handlers};
use crate::features::reports::{
    dtos as reports_dtos, handlers as reports_handlers, models as reports_models,
    services as reports_services,
};
use crate::features::users::{dtos as users_dtos, handlers::user_handler};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Reports
        reports_handlers::list_reports,
        reports_handlers::live_reports,
        reports_handlers::export_reports,
        reports_handlers::set_report_status,
        reports_handlers::publicize_report,
        // Users
        user_handler::list_users,
        user_handler::get_user,
        user_handler::approve_user,
        user_handler::resubmit_id,
        user_handler::disable_user,
        user_handler::get_user_auth,
        // Dashboard
        dashboard_handlers::dashboard_handler::get_summary,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Reports
            reports_models::ReportStatus,
            reports_services::DateFilter,
            reports_dtos::ReportRowDto,
            reports_dtos::SetStatusDto,
            reports_dtos::ExportLineDto,
            reports_dtos::ExportPageDto,
            reports_dtos::ExportDocumentDto,
            ApiResponse<Vec<reports_dtos::ReportRowDto>>,
            ApiResponse<reports_dtos::ExportDocumentDto>,
            // Users
            users_dtos::UserCardDto,
            users_dtos::UserDetailDto,
            users_dtos::EmergencyContactDto,
            users_dtos::DisableUserDto,
            users_dtos::AuthRecordDto,
            ApiResponse<Vec<users_dtos::UserCardDto>>,
            ApiResponse<users_dtos::UserDetailDto>,
            ApiResponse<users_dtos::AuthRecordDto>,
            // Dashboard
            dashboard_dtos::EmergencyCountDto,
            dashboard_dtos::DashboardSummaryDto,
            ApiResponse<dashboard_dtos::DashboardSummaryDto>,
        )
    ),
    tags(
        (name = "reports", description = "Emergency report listing, lifecycle, and export"),
        (name = "users", description = "User directory and approval queue"),
        (name = "dashboard", description = "Dashboard header stats"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "MP-Alertify Admin API",
        version = "0.1.0",
        description = "API documentation for the MP-Alertify admin dashboard",
    )
)]
pub struct ApiDoc;

/// Adds the bearer-token security scheme to the OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
