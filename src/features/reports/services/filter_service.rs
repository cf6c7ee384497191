use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::reports::models::{Report, ReportTable};

/// Date window selection for the reports table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DateFilter {
    #[default]
    All,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Custom,
}

/// The admin's current filter selection.
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    pub date_filter: DateFilter,
    /// Custom range bounds, inclusive of both end dates.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// `None` passes every emergency type.
    pub emergency: Option<String>,
}

/// Ids of reports passing `config`, most recent first.
///
/// A report without a usable timestamp never passes. Ties keep the
/// table's insertion order, which follows the store's chronological push
/// ids. Date comparisons use the calendar of `now`'s timezone.
pub fn apply_filters<Tz: TimeZone>(
    reports: &ReportTable,
    config: &FilterConfig,
    now: &DateTime<Tz>,
) -> Vec<String> {
    let mut selected: Vec<(String, i64)> = reports
        .iter()
        .filter_map(|(id, report)| {
            let ts = report.timestamp?;
            if !passes_date_filter(ts, config, now) {
                return None;
            }
            if !passes_emergency_filter(report, config) {
                return None;
            }
            Some((id.to_string(), ts))
        })
        .collect();

    // Stable sort keeps insertion order for equal timestamps.
    selected.sort_by_key(|(_, ts)| std::cmp::Reverse(*ts));
    selected.into_iter().map(|(id, _)| id).collect()
}

fn passes_date_filter<Tz: TimeZone>(
    ts_millis: i64,
    config: &FilterConfig,
    now: &DateTime<Tz>,
) -> bool {
    let report_date = match report_date(ts_millis, now) {
        Some(date) => date,
        None => return false,
    };
    let today = now.date_naive();

    match config.date_filter {
        DateFilter::All => true,
        DateFilter::Daily => report_date == today,
        DateFilter::Weekly => {
            // Week runs Sunday through Saturday.
            let days_from_sunday = today.weekday().num_days_from_sunday() as i64;
            let week_start = today - Duration::days(days_from_sunday);
            let week_end = week_start + Duration::days(6);
            report_date >= week_start && report_date <= week_end
        }
        DateFilter::Monthly => {
            report_date.month() == today.month() && report_date.year() == today.year()
        }
        DateFilter::Yearly => report_date.year() == today.year(),
        DateFilter::Custom => match (config.start_date, config.end_date) {
            (Some(start), Some(end)) => report_date >= start && report_date <= end,
            // A missing bound passes everything. Longstanding dashboard
            // behavior the export flow depends on; do not tighten.
            _ => true,
        },
    }
}

fn passes_emergency_filter(report: &Report, config: &FilterConfig) -> bool {
    match config.emergency.as_deref() {
        None | Some("all") => true,
        Some(wanted) => report.emergency_label() == Some(wanted),
    }
}

/// Calendar date of an epoch-millisecond instant in `now`'s timezone.
fn report_date<Tz: TimeZone>(ts_millis: i64, now: &DateTime<Tz>) -> Option<NaiveDate> {
    now.timezone()
        .timestamp_millis_opt(ts_millis)
        .single()
        .map(|dt| dt.date_naive())
}
