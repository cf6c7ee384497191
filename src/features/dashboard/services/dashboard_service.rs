use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, TimeZone};

use crate::features::dashboard::dtos::{DashboardSummaryDto, EmergencyCountDto};
use crate::features::reports::models::{ReportStatus, ReportTable};
use crate::modules::store::LiveTable;

/// Aggregates the live report cache into header stats.
pub struct DashboardService {
    reports: Arc<LiveTable<ReportTable>>,
}

impl DashboardService {
    pub fn new(reports: Arc<LiveTable<ReportTable>>) -> Self {
        Self { reports }
    }

    /// Summary for the dashboard header, computed from the cache without
    /// touching the store.
    ///
    /// The week window is Sunday-based and the month window is the current
    /// calendar month, both in the zone of `now`. Reports without a usable
    /// timestamp count toward totals and statuses but never toward a
    /// window.
    pub fn summary<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DashboardSummaryDto {
        let table = self.reports.load();
        let today = now.date_naive();
        let week_start = today - Duration::days(today.weekday().num_days_from_sunday() as i64);
        let week_end = week_start + Duration::days(6);

        let mut summary = DashboardSummaryDto {
            total_reports: table.len() as i64,
            ..DashboardSummaryDto::default()
        };
        let mut by_label: HashMap<String, i64> = HashMap::new();

        for (_, report) in table.iter() {
            match report.status {
                ReportStatus::Pending => summary.pending_count += 1,
                ReportStatus::Respond => summary.respond_count += 1,
                ReportStatus::OnRoute => summary.on_route_count += 1,
                ReportStatus::Responded => summary.responded_count += 1,
                ReportStatus::Rejected => summary.rejected_count += 1,
            }

            if let Some(label) = report.emergency_label().filter(|l| !l.is_empty()) {
                *by_label.entry(label.to_string()).or_insert(0) += 1;
            }

            let date = report
                .timestamp
                .and_then(|ts| now.timezone().timestamp_millis_opt(ts).single())
                .map(|dt| dt.date_naive());
            if let Some(date) = date {
                if date >= week_start && date <= week_end {
                    summary.reports_this_week += 1;
                }
                if date.year() == today.year() && date.month() == today.month() {
                    summary.reports_this_month += 1;
                }
            }
        }

        let mut breakdown: Vec<EmergencyCountDto> = by_label
            .into_iter()
            .map(|(label, report_count)| EmergencyCountDto {
                label,
                report_count,
            })
            .collect();
        breakdown.sort_by(|a, b| {
            b.report_count
                .cmp(&a.report_count)
                .then_with(|| a.label.cmp(&b.label))
        });
        summary.emergency_breakdown = breakdown;

        summary
    }
}
