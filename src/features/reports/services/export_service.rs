use std::fmt::Display;

use chrono::{DateTime, TimeZone};

use crate::core::error::{AppError, Result};
use crate::features::reports::dtos::{ExportDocumentDto, ExportLineDto, ExportPageDto};
use crate::features::reports::models::ReportTable;
use crate::shared::constants::NOT_AVAILABLE;

const EXPORT_TITLE: &str = "MP-Alertify – Filtered Reports";
const EXPORT_FILE_NAME: &str = "filtered-reports.pdf";

const MARGIN_X: i32 = 10;
const TOP_Y: i32 = 10;
const TITLE_FONT: u8 = 14;
const BODY_FONT: u8 = 11;
const TITLE_GAP: i32 = 10;
const LINE_GAP: i32 = 6;
const BLOCK_GAP: i32 = 10;
/// A page breaks once the cursor passes this, checked after each block.
const PAGE_BREAK_Y: i32 = 270;

/// Lays out the filtered table as a positioned-text document the client
/// hands straight to its PDF widget.
#[derive(Default)]
pub struct ExportService;

impl ExportService {
    pub fn new() -> Self {
        Self
    }

    /// Builds the print layout for `ids` in their given order.
    ///
    /// An empty selection is a user error, not an empty document.
    pub fn build_document<Tz>(
        &self,
        ids: &[String],
        reports: &ReportTable,
        now: &DateTime<Tz>,
    ) -> Result<ExportDocumentDto>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        if ids.is_empty() {
            return Err(AppError::Validation(
                "No reports to export for the selected filters.".to_string(),
            ));
        }

        let mut pages = vec![Vec::new()];
        let mut y = TOP_Y;

        push_line(&mut pages, MARGIN_X, y, TITLE_FONT, EXPORT_TITLE.to_string());
        y += TITLE_GAP;

        let mut count = 0usize;
        for id in ids {
            let report = match reports.get(id) {
                Some(report) => report,
                None => continue,
            };
            count += 1;

            let emergency = report.emergency_label().unwrap_or(NOT_AVAILABLE);
            let description = report
                .additional_message
                .as_deref()
                .filter(|m| !m.is_empty())
                .unwrap_or(NOT_AVAILABLE);
            let reported_at = report
                .timestamp
                .and_then(|ms| now.timezone().timestamp_millis_opt(ms).single())
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());

            push_line(&mut pages, MARGIN_X, y, BODY_FONT, format!("Report #{}", count));
            y += LINE_GAP;
            push_line(&mut pages, MARGIN_X, y, BODY_FONT, format!("Emergency: {}", emergency));
            y += LINE_GAP;
            push_line(
                &mut pages,
                MARGIN_X,
                y,
                BODY_FONT,
                format!("Description: {}", description),
            );
            y += LINE_GAP;
            push_line(
                &mut pages,
                MARGIN_X,
                y,
                BODY_FONT,
                format!("Reported At: {}", reported_at),
            );
            y += BLOCK_GAP;

            if y > PAGE_BREAK_Y {
                pages.push(Vec::new());
                y = TOP_Y;
            }
        }

        Ok(ExportDocumentDto {
            file_name: EXPORT_FILE_NAME.to_string(),
            report_count: count,
            pages: pages
                .into_iter()
                .map(|lines| ExportPageDto { lines })
                .collect(),
        })
    }
}

fn push_line(pages: &mut [Vec<ExportLineDto>], x: i32, y: i32, font_size: u8, text: String) {
    if let Some(page) = pages.last_mut() {
        page.push(ExportLineDto {
            x,
            y,
            font_size,
            text,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use serde_json::{json, Map, Value};

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 15, 12, 0, 0)
            .unwrap()
    }

    fn table_of(n: usize) -> (Vec<String>, ReportTable) {
        let mut map = Map::new();
        let mut ids = Vec::new();
        for i in 0..n {
            let id = format!("r{:02}", i);
            map.insert(
                id.clone(),
                json!({"emergency": "Fire", "timestamp": 1705300000000i64 + i as i64}),
            );
            ids.push(id);
        }
        (ids, ReportTable::from_snapshot(&Value::Object(map)))
    }

    #[test]
    fn test_empty_selection_is_a_user_error() {
        let (_, reports) = table_of(0);
        let err = ExportService::new()
            .build_document(&[], &reports, &now())
            .unwrap_err();
        match err {
            AppError::Validation(message) => {
                assert_eq!(message, "No reports to export for the selected filters.");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_single_report_layout() {
        let reports = ReportTable::from_snapshot(&json!({
            "r1": {
                "emergency": "Others",
                "otherEmergency": "Landslide",
                "additionalMessage": "Road blocked near the bridge",
                "timestamp": now().timestamp_millis(),
            }
        }));
        let doc = ExportService::new()
            .build_document(&["r1".to_string()], &reports, &now())
            .unwrap();

        assert_eq!(doc.file_name, "filtered-reports.pdf");
        assert_eq!(doc.report_count, 1);
        assert_eq!(doc.pages.len(), 1);

        let lines = &doc.pages[0].lines;
        assert_eq!(lines.len(), 5);
        assert_eq!(
            lines[0],
            ExportLineDto {
                x: 10,
                y: 10,
                font_size: 14,
                text: "MP-Alertify – Filtered Reports".to_string(),
            }
        );
        assert_eq!(lines[1].text, "Report #1");
        assert_eq!(lines[1].y, 20);
        assert_eq!(lines[1].font_size, 11);
        assert_eq!(lines[2].text, "Emergency: Landslide");
        assert_eq!(lines[2].y, 26);
        assert_eq!(lines[3].text, "Description: Road blocked near the bridge");
        assert_eq!(lines[3].y, 32);
        assert_eq!(lines[4].text, "Reported At: 2024-01-15 12:00:00");
        assert_eq!(lines[4].y, 38);
    }

    #[test]
    fn test_missing_description_prints_na() {
        let reports = ReportTable::from_snapshot(&json!({
            "r1": {"emergency": "Fire", "timestamp": 1i64}
        }));
        let doc = ExportService::new()
            .build_document(&["r1".to_string()], &reports, &now())
            .unwrap();
        assert_eq!(doc.pages[0].lines[3].text, "Description: N/A");
    }

    #[test]
    fn test_nine_blocks_fill_the_first_page() {
        // Nine 28pt blocks from y=20 land the cursor at 272, past the
        // 270 threshold, so a fresh page opens even with nothing left.
        let (ids, reports) = table_of(9);
        let doc = ExportService::new()
            .build_document(&ids, &reports, &now())
            .unwrap();
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.pages[0].lines.len(), 1 + 9 * 4);
        assert!(doc.pages[1].lines.is_empty());
    }

    #[test]
    fn test_tenth_block_starts_the_second_page() {
        let (ids, reports) = table_of(10);
        let doc = ExportService::new()
            .build_document(&ids, &reports, &now())
            .unwrap();
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.pages[1].lines.len(), 4);
        assert_eq!(doc.pages[1].lines[0].text, "Report #10");
        assert_eq!(doc.pages[1].lines[0].y, 10);
        assert_eq!(doc.report_count, 10);
    }

    #[test]
    fn test_vanished_ids_keep_numbering_dense() {
        let (mut ids, reports) = table_of(2);
        ids.insert(1, "gone".to_string());
        let doc = ExportService::new()
            .build_document(&ids, &reports, &now())
            .unwrap();
        assert_eq!(doc.report_count, 2);
        let texts: Vec<&str> = doc.pages[0]
            .lines
            .iter()
            .filter(|l| l.text.starts_with("Report #"))
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(texts, vec!["Report #1", "Report #2"]);
    }
}
