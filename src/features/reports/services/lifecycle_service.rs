use std::sync::Arc;

use serde_json::{json, Value};

use crate::core::error::{AppError, Result};
use crate::features::reports::dtos::SetStatusDto;
use crate::features::reports::models::{Report, ReportStatus};
use crate::features::users::models::UserTable;
use crate::modules::notify::{Notifier, PushData};
use crate::modules::store::{LiveTable, RealtimeStore};

/// Applies status transitions, the one report write path this dashboard
/// owns. Transition legality is checked here against the stored status,
/// so every caller goes through the same table.
pub struct LifecycleService {
    store: Arc<dyn RealtimeStore>,
    notifier: Arc<dyn Notifier>,
    users: Arc<LiveTable<UserTable>>,
}

impl LifecycleService {
    pub fn new(
        store: Arc<dyn RealtimeStore>,
        notifier: Arc<dyn Notifier>,
        users: Arc<LiveTable<UserTable>>,
    ) -> Self {
        Self {
            store,
            notifier,
            users,
        }
    }

    /// Moves a report to `dto.status`.
    ///
    /// Persists the status (plus `rejectReason` on a rejection that
    /// carries one), raises the reporter's warn count when asked, then
    /// notifies the reporter. The warn increment and the notification
    /// are best-effort: once the status write has succeeded, their
    /// failures are logged and never roll it back.
    pub async fn set_status(&self, report_id: &str, dto: &SetStatusDto) -> Result<()> {
        let path = format!("reports/{}", report_id);
        let value = self.store.get(&path).await?;
        if value.is_null() {
            return Err(AppError::NotFound(format!("Report {} not found", report_id)));
        }
        let report = Report::from_value(&value)
            .map_err(|e| AppError::Store(format!("Malformed report {}: {}", report_id, e)))?;

        if !report.status.can_transition_to(dto.status) {
            return Err(AppError::Conflict(format!(
                "Report {} cannot move from {} to {}",
                report_id, report.status, dto.status
            )));
        }

        let reason = dto.reason.as_deref().filter(|r| !r.is_empty());
        let mut fields = json!({ "status": dto.status.as_str() });
        if dto.status == ReportStatus::Rejected {
            if let Some(reason) = reason {
                fields["rejectReason"] = json!(reason);
            }
        }
        self.store.update(&path, fields).await?;

        tracing::info!(
            "Report {} moved from {} to {}",
            report_id,
            report.status,
            dto.status
        );

        if dto.warn {
            self.raise_warn_count(report_id, report.reporter.as_deref())
                .await;
        }

        self.notify_reporter(report_id, &report, dto, reason).await;

        Ok(())
    }

    async fn raise_warn_count(&self, report_id: &str, reporter: Option<&str>) {
        let uid = match reporter {
            Some(uid) => uid,
            None => {
                tracing::warn!("Report {} has no reporter to warn", report_id);
                return;
            }
        };
        let path = format!("users/{}/warnCount", uid);
        match self
            .store
            .transaction(&path, Box::new(bump_warn_count))
            .await
        {
            Ok(next) => tracing::info!("Warn count for {} is now {}", uid, next),
            Err(e) => tracing::error!("Failed to raise warn count for {}: {}", uid, e),
        }
    }

    async fn notify_reporter(
        &self,
        report_id: &str,
        report: &Report,
        dto: &SetStatusDto,
        reason: Option<&str>,
    ) {
        let users = self.users.load();
        let token = report
            .reporter
            .as_deref()
            .and_then(|uid| users.get(uid))
            .and_then(|u| u.fcm_token.as_deref())
            .filter(|t| !t.is_empty());

        let token = match token {
            Some(token) => token,
            None => {
                tracing::debug!(
                    "Reporter of {} has no push destination, skipping notification",
                    report_id
                );
                return;
            }
        };

        let (title, mut body) = dto.status.notification_copy(reason);
        if let Some(extra) = dto.custom_message.as_deref().filter(|m| !m.is_empty()) {
            body = format!("{} {}", body, extra);
        }
        let data = PushData {
            report_id: report_id.to_string(),
            status: dto.status.as_str().to_string(),
            icon_type: dto.status.icon_type().to_string(),
        };

        if let Err(e) = self.notifier.send(token, &title, &body, data).await {
            tracing::warn!("Failed to dispatch notification for {}: {}", report_id, e);
        }
    }
}

/// Transaction body for the warn counter. Treats anything non-numeric
/// as zero so a corrupted field heals instead of wedging the increment.
fn bump_warn_count(current: Value) -> Value {
    let count = current
        .as_i64()
        .or_else(|| current.as_f64().map(|f| f as i64))
        .unwrap_or(0);
    json!(count + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::notify::RecordingNotifier;
    use crate::modules::store::MemoryStore;
    use async_trait::async_trait;

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send(&self, _: &str, _: &str, _: &str, _: PushData) -> Result<()> {
            Err(AppError::ExternalServiceError("relay down".to_string()))
        }
    }

    fn seeded_store() -> MemoryStore {
        MemoryStore::with_tree(json!({
            "reports": {
                "r1": {"reporter": "u1", "emergency": "Fire", "status": "pending", "timestamp": 1i64},
                "r2": {"reporter": "u1", "emergency": "Flood", "status": "pending", "timestamp": 2i64},
                "done": {"reporter": "u1", "status": "Responded", "timestamp": 3i64},
                "orphan": {"status": "pending", "timestamp": 4i64},
            },
            "users": {
                "u1": {"fcmToken": "tok-1", "warnCount": 0},
            },
        }))
    }

    fn users_cache() -> Arc<LiveTable<UserTable>> {
        let cache = Arc::new(LiveTable::default());
        cache.replace(UserTable::from_snapshot(
            &json!({"u1": {"fcmToken": "tok-1"}}),
        ));
        cache
    }

    fn service_with(
        store: MemoryStore,
        notifier: Arc<dyn Notifier>,
    ) -> (LifecycleService, MemoryStore) {
        let service = LifecycleService::new(Arc::new(store.clone()), notifier, users_cache());
        (service, store)
    }

    fn dto(status: ReportStatus) -> SetStatusDto {
        SetStatusDto {
            status,
            reason: None,
            warn: false,
            custom_message: None,
        }
    }

    #[tokio::test]
    async fn test_legal_transition_persists_and_notifies() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (service, store) = service_with(seeded_store(), notifier.clone());

        service
            .set_status("r1", &dto(ReportStatus::Respond))
            .await
            .unwrap();

        let status = store.get("reports/r1/status").await.unwrap();
        assert_eq!(status, json!("Respond"));

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].token, "tok-1");
        assert_eq!(sent[0].title, "Report Verified - On Route");
        assert_eq!(sent[0].body, "Your report is verified and help is on the way.");
        assert_eq!(sent[0].data.report_id, "r1");
        assert_eq!(sent[0].data.status, "Respond");
        assert_eq!(sent[0].data.icon_type, "respond");
    }

    #[tokio::test]
    async fn test_illegal_transition_is_a_conflict() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (service, store) = service_with(seeded_store(), notifier.clone());

        let err = service
            .set_status("done", &dto(ReportStatus::Respond))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let status = store.get("reports/done/status").await.unwrap();
        assert_eq!(status, json!("Responded"));
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_report_is_not_found() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (service, _) = service_with(seeded_store(), notifier);

        let err = service
            .set_status("missing", &dto(ReportStatus::Respond))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rejection_with_reason_persists_it() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (service, store) = service_with(seeded_store(), notifier.clone());

        let mut dto = dto(ReportStatus::Rejected);
        dto.reason = Some("Duplicate of an earlier report".to_string());
        service.set_status("r1", &dto).await.unwrap();

        let report = store.get("reports/r1").await.unwrap();
        assert_eq!(report["status"], json!("Rejected"));
        assert_eq!(report["rejectReason"], json!("Duplicate of an earlier report"));

        let sent = notifier.sent();
        assert_eq!(sent[0].title, "Report Rejected");
        assert_eq!(
            sent[0].body,
            "Your report has been rejected by the admin. Reason: Duplicate of an earlier report"
        );
    }

    #[tokio::test]
    async fn test_rejection_without_reason_leaves_field_unset() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (service, store) = service_with(seeded_store(), notifier.clone());

        let mut dto = dto(ReportStatus::Rejected);
        dto.reason = Some(String::new());
        service.set_status("r1", &dto).await.unwrap();

        let report = store.get("reports/r1").await.unwrap();
        assert!(report.get("rejectReason").is_none());
        assert_eq!(
            notifier.sent()[0].body,
            "Your report has been rejected by the admin."
        );
    }

    #[tokio::test]
    async fn test_custom_message_is_appended() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (service, _) = service_with(seeded_store(), notifier.clone());

        let mut dto = dto(ReportStatus::Respond);
        dto.custom_message = Some("ETA 10 minutes.".to_string());
        service.set_status("r1", &dto).await.unwrap();

        assert_eq!(
            notifier.sent()[0].body,
            "Your report is verified and help is on the way. ETA 10 minutes."
        );
    }

    #[tokio::test]
    async fn test_warn_increments_once_per_call_under_concurrency() {
        let notifier: Arc<dyn Notifier> = Arc::new(RecordingNotifier::default());
        let store = seeded_store();
        let service = Arc::new(LifecycleService::new(
            Arc::new(store.clone()),
            notifier,
            users_cache(),
        ));

        let mut warn_dto = dto(ReportStatus::Rejected);
        warn_dto.warn = true;

        let a = {
            let service = service.clone();
            let dto = warn_dto.clone();
            tokio::spawn(async move { service.set_status("r1", &dto).await })
        };
        let b = {
            let service = service.clone();
            let dto = warn_dto.clone();
            tokio::spawn(async move { service.set_status("r2", &dto).await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let count = store.get("users/u1/warnCount").await.unwrap();
        assert_eq!(count, json!(2));
    }

    #[tokio::test]
    async fn test_missing_token_skips_notification() {
        let notifier = Arc::new(RecordingNotifier::default());
        let store = seeded_store();
        let users = Arc::new(LiveTable::default());
        users.replace(UserTable::from_snapshot(&json!({"u1": {}})));
        let service = LifecycleService::new(Arc::new(store.clone()), notifier.clone(), users);

        service
            .set_status("r1", &dto(ReportStatus::Respond))
            .await
            .unwrap();

        assert!(notifier.sent().is_empty());
        let status = store.get("reports/r1/status").await.unwrap();
        assert_eq!(status, json!("Respond"));
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_the_transition() {
        let (service, store) = service_with(seeded_store(), Arc::new(FailingNotifier));

        service
            .set_status("r1", &dto(ReportStatus::Respond))
            .await
            .unwrap();

        let status = store.get("reports/r1/status").await.unwrap();
        assert_eq!(status, json!("Respond"));
    }

    #[tokio::test]
    async fn test_warn_without_reporter_is_logged_not_fatal() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (service, store) = service_with(seeded_store(), notifier);

        let mut warn_dto = dto(ReportStatus::Rejected);
        warn_dto.warn = true;
        service.set_status("orphan", &warn_dto).await.unwrap();

        let status = store.get("reports/orphan/status").await.unwrap();
        assert_eq!(status, json!("Rejected"));
    }

    #[test]
    fn test_bump_warn_count_heals_garbage() {
        assert_eq!(bump_warn_count(json!(2)), json!(3));
        assert_eq!(bump_warn_count(json!(2.0)), json!(3));
        assert_eq!(bump_warn_count(Value::Null), json!(1));
        assert_eq!(bump_warn_count(json!("many")), json!(1));
    }
}
