use serde::Serialize;
use utoipa::ToSchema;

/// Count of reports carrying one emergency label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyCountDto {
    pub label: String,
    pub report_count: i64,
}

/// Lightweight stats for the dashboard header.
///
/// Week and month windows follow the report list filters: weeks start on
/// Sunday, and a report only lands in a window when it carries a usable
/// timestamp.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummaryDto {
    pub total_reports: i64,
    pub pending_count: i64,
    pub respond_count: i64,
    pub on_route_count: i64,
    pub responded_count: i64,
    pub rejected_count: i64,
    pub reports_this_week: i64,
    pub reports_this_month: i64,
    pub emergency_breakdown: Vec<EmergencyCountDto>,
}
