use std::fmt::Display;
use std::sync::Arc;

use chrono::{DateTime, TimeZone};

use crate::features::reports::dtos::ReportRowDto;
use crate::features::reports::models::{LocationRef, LocationType, Report, ReportTable};
use crate::features::reports::services::GeocodingService;
use crate::features::users::models::{User, UserTable};
use crate::shared::constants::{
    NOT_AVAILABLE, NO_DESCRIPTION, NO_HOME_ADDRESS, NO_PRESENT_ADDRESS, UNKNOWN_LOCATION,
    UNKNOWN_USER,
};

/// Builds display rows for the admin table by joining each report to its
/// submitter and resolving every field to presentable text. A report
/// referencing a missing user still renders, on placeholders.
pub struct RenderService {
    geocoding: Arc<GeocodingService>,
}

impl RenderService {
    pub fn new(geocoding: Arc<GeocodingService>) -> Self {
        Self { geocoding }
    }

    /// One row per id, in the given order. Ids that dropped out of the
    /// table between filtering and rendering are skipped.
    pub async fn render_rows<Tz>(
        &self,
        ids: &[String],
        reports: &ReportTable,
        users: &UserTable,
        now: &DateTime<Tz>,
        can_publicize: bool,
    ) -> Vec<ReportRowDto>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut rows = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(report) = reports.get(id) {
                rows.push(
                    self.render_row(id, report, users, now, can_publicize)
                        .await,
                );
            }
        }
        rows
    }

    async fn render_row<Tz>(
        &self,
        id: &str,
        report: &Report,
        users: &UserTable,
        now: &DateTime<Tz>,
        can_publicize: bool,
    ) -> ReportRowDto
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let user = report.reporter.as_deref().and_then(|uid| users.get(uid));

        let formatted_timestamp = report
            .timestamp
            .and_then(|ms| now.timezone().timestamp_millis_opt(ms).single())
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        ReportRowDto {
            id: id.to_string(),
            reporter_name: field_or(user.and_then(|u| u.name.as_deref()), UNKNOWN_USER),
            contact: field_or(user.and_then(|u| u.contact.as_deref()), NOT_AVAILABLE),
            organization: field_or(user.and_then(|u| u.organization.as_deref()), NOT_AVAILABLE),
            emergency: field_or(report.emergency_label(), NOT_AVAILABLE),
            description: field_or(report.additional_message.as_deref(), NO_DESCRIPTION),
            image_url: report.image_url.clone().filter(|url| !url.is_empty()),
            location: self.location_display(report, user).await,
            status: report.status,
            status_color: report.status.badge_color().to_string(),
            formatted_timestamp,
            actions: report.status.next_actions().to_vec(),
            can_publicize,
            reject_reason: report.reject_reason.clone(),
        }
    }

    async fn location_display(&self, report: &Report, user: Option<&User>) -> String {
        match &report.location {
            Some(LocationRef::HomeAddress) => {
                field_or(user.and_then(|u| u.home_address.as_deref()), NO_HOME_ADDRESS)
            }
            Some(LocationRef::PresentAddress) => field_or(
                user.and_then(|u| u.present_address.as_deref()),
                NO_PRESENT_ADDRESS,
            ),
            Some(LocationRef::Coordinates { lat, lng }) => {
                self.geocoding.reverse(*lat, *lng).await
            }
            Some(LocationRef::FreeText(text)) => text.clone(),
            None => match report.location_type {
                // The report claimed a device location but carried none.
                Some(LocationType::CurrentLocation) | Some(LocationType::CustomLocation) => {
                    UNKNOWN_LOCATION.to_string()
                }
                _ => NOT_AVAILABLE.to_string(),
            },
        }
    }
}

/// Empty strings fall back the same way missing fields do.
fn field_or(value: Option<&str>, fallback: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}
