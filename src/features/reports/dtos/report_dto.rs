use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::features::reports::models::ReportStatus;
use crate::features::reports::services::{DateFilter, FilterConfig};

/// Query params for the filtered reports table
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct FilterQuery {
    /// Date window (default: all)
    #[serde(default)]
    pub date_filter: DateFilter,
    /// Custom range start (YYYY-MM-DD), only used when dateFilter=custom
    pub start_date: Option<NaiveDate>,
    /// Custom range end (YYYY-MM-DD), only used when dateFilter=custom
    pub end_date: Option<NaiveDate>,
    /// Emergency label to match, or "all"
    pub emergency: Option<String>,
}

impl FilterQuery {
    pub fn into_config(self) -> FilterConfig {
        FilterConfig {
            date_filter: self.date_filter,
            start_date: self.start_date,
            end_date: self.end_date,
            emergency: self.emergency.filter(|e| !e.is_empty() && e != "all"),
        }
    }
}

/// One row of the admin reports table, fully resolved for display
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportRowDto {
    pub id: String,
    pub reporter_name: String,
    pub contact: String,
    pub organization: String,
    pub emergency: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub location: String,
    pub status: ReportStatus,
    pub status_color: String,
    pub formatted_timestamp: String,
    /// Transitions legal from the current status
    pub actions: Vec<ReportStatus>,
    pub can_publicize: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reject_reason: Option<String>,
}

/// Request body for a status transition
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusDto {
    /// Target status
    pub status: ReportStatus,

    /// Rejection reason, persisted when status=Rejected
    #[validate(length(max = 500, message = "Reason must not exceed 500 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Also raise the reporter's warn count
    #[serde(default)]
    pub warn: bool,

    /// Extra sentence appended to the notification body
    #[validate(length(max = 500, message = "Custom message must not exceed 500 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_message: Option<String>,
}

/// One positioned text line of the export document
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportLineDto {
    pub x: i32,
    pub y: i32,
    pub font_size: u8,
    pub text: String,
}

/// One page of the export document
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportPageDto {
    pub lines: Vec<ExportLineDto>,
}

/// Print-ready layout of the currently filtered table
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocumentDto {
    pub file_name: String,
    pub report_count: usize,
    pub pages: Vec<ExportPageDto>,
}
