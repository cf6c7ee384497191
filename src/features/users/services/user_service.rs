use std::sync::Arc;

use serde_json::json;

use crate::core::error::{AppError, Result};
use crate::features::auth::clients::AuthGateway;
use crate::features::users::dtos::{AuthRecordDto, UserCardDto, UserDetailDto};
use crate::features::users::models::UserTable;
use crate::modules::store::{LiveTable, RealtimeStore};
use crate::shared::constants::ROLE_USER;

/// Approval-queue operations over the user directory.
///
/// Reads come from the live cache; writes go to the store, and sign-in
/// toggles go to the auth provider first so the store never claims a state
/// the provider refused.
pub struct UserService {
    store: Arc<dyn RealtimeStore>,
    gateway: Arc<dyn AuthGateway>,
    users: Arc<LiveTable<UserTable>>,
}

impl UserService {
    pub fn new(
        store: Arc<dyn RealtimeStore>,
        gateway: Arc<dyn AuthGateway>,
        users: Arc<LiveTable<UserTable>>,
    ) -> Self {
        Self {
            store,
            gateway,
            users,
        }
    }

    /// List end-user accounts as approval cards, in store order.
    ///
    /// Admin and staff records are not part of the queue. Email
    /// verification comes from the auth provider per account; a failed
    /// lookup renders as unverified rather than failing the whole list.
    pub async fn list(&self) -> Result<Vec<UserCardDto>> {
        let table = self.users.load();
        let mut cards = Vec::new();

        for (uid, user) in table.iter() {
            if user.role.as_deref() != Some(ROLE_USER) {
                continue;
            }

            let email_verified = match self.gateway.get_auth_record(uid).await {
                Ok(record) => record.email_verified,
                Err(e) => {
                    tracing::warn!("Auth lookup for {} failed: {:?}", uid, e);
                    false
                }
            };

            cards.push(UserCardDto::from_user(uid, user, email_verified));
        }

        Ok(cards)
    }

    /// Full profile for one account.
    pub fn detail(&self, uid: &str) -> Result<UserDetailDto> {
        let table = self.users.load();
        let user = table
            .get(uid)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", uid)))?;
        Ok(UserDetailDto::from_user(uid, user))
    }

    /// Mark one account as approved.
    pub async fn approve(&self, uid: &str) -> Result<String> {
        let display = self.display_name(uid)?;
        self.store
            .set(&format!("users/{}/isApproved", uid), json!(true))
            .await?;
        tracing::info!("User {} approved", uid);
        Ok(format!("{} has been approved.", display))
    }

    /// Ask one account to resubmit their ID documents. Clears approval in
    /// the same merge so the card drops back into the pending queue.
    pub async fn require_resubmit(&self, uid: &str) -> Result<String> {
        let display = self.display_name(uid)?;
        self.store
            .update(
                &format!("users/{}", uid),
                json!({ "resubmitID": true, "isApproved": false }),
            )
            .await?;
        tracing::info!("User {} flagged for ID resubmission", uid);
        Ok(format!("{} must now resubmit ID. Approval reset.", display))
    }

    /// Toggle sign-in for one account. The auth provider is updated first;
    /// only a successful toggle is mirrored into the store.
    pub async fn set_disabled(&self, uid: &str, disable: bool) -> Result<String> {
        self.ensure_known(uid)?;
        self.gateway.set_disabled(uid, disable).await?;
        self.store
            .set(&format!("users/{}/disabled", uid), json!(disable))
            .await?;

        let state = if disable { "disabled" } else { "enabled" };
        tracing::info!("User {} {}", uid, state);
        Ok(format!("User {} has been {}", uid, state))
    }

    /// One-shot auth-provider lookup for one account.
    pub async fn auth_record(&self, uid: &str) -> Result<AuthRecordDto> {
        let record = self.gateway.get_auth_record(uid).await?;
        Ok(record.into())
    }

    fn ensure_known(&self, uid: &str) -> Result<()> {
        if self.users.load().get(uid).is_none() {
            return Err(AppError::NotFound(format!("User {} not found", uid)));
        }
        Ok(())
    }

    /// Username for status messages, falling back to the uid.
    fn display_name(&self, uid: &str) -> Result<String> {
        let table = self.users.load();
        let user = table
            .get(uid)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", uid)))?;
        Ok(user
            .username
            .clone()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| uid.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::clients::{AuthRecord, VerifiedIdentity};
    use crate::modules::store::MemoryStore;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;

    /// Gateway stub with scripted per-uid verification state.
    #[derive(Default)]
    struct StubGateway {
        verified: Vec<String>,
        failing: Vec<String>,
        disabled_calls: Mutex<Vec<(String, bool)>>,
        fail_disable: bool,
    }

    #[async_trait]
    impl AuthGateway for StubGateway {
        async fn verify_token(&self, _token: &str) -> Result<VerifiedIdentity> {
            Err(AppError::Unauthorized("not under test".to_string()))
        }

        async fn get_auth_record(&self, uid: &str) -> Result<AuthRecord> {
            if self.failing.iter().any(|u| u == uid) {
                return Err(AppError::ExternalServiceError("lookup down".to_string()));
            }
            Ok(AuthRecord {
                uid: uid.to_string(),
                email: Some(format!("{}@example.com", uid)),
                email_verified: self.verified.iter().any(|u| u == uid),
                disabled: false,
            })
        }

        async fn set_disabled(&self, uid: &str, disabled: bool) -> Result<()> {
            self.disabled_calls
                .lock()
                .unwrap()
                .push((uid.to_string(), disabled));
            if self.fail_disable {
                return Err(AppError::ExternalServiceError("update down".to_string()));
            }
            Ok(())
        }
    }

    fn seeded_tree() -> Value {
        json!({
            "users": {
                "u1": {"username": "jdoe", "role": "user", "isApproved": false, "warnCount": 3},
                "u2": {"username": "msantos", "role": "user", "isApproved": true},
                "admin-1": {"username": "root", "role": "admin"},
                "u3": {"username": "npark", "role": "user"},
            }
        })
    }

    fn service_with(gateway: StubGateway, tree: Value) -> (UserService, MemoryStore) {
        let store = MemoryStore::with_tree(tree.clone());
        let users = Arc::new(LiveTable::default());
        users.replace(UserTable::from_snapshot(&tree["users"]));
        let service = UserService::new(Arc::new(store.clone()), Arc::new(gateway), users);
        (service, store)
    }

    #[tokio::test]
    async fn test_list_skips_non_user_roles() {
        let gateway = StubGateway {
            verified: vec!["u1".to_string()],
            ..StubGateway::default()
        };
        let (service, _) = service_with(gateway, seeded_tree());

        let cards = service.list().await.unwrap();
        let uids: Vec<&str> = cards.iter().map(|c| c.uid.as_str()).collect();
        assert_eq!(uids, vec!["u1", "u2", "u3"]);

        assert!(cards[0].email_verified);
        assert!(cards[0].warn_flag);
        assert!(!cards[1].email_verified);
    }

    #[tokio::test]
    async fn test_list_treats_failed_auth_lookup_as_unverified() {
        let gateway = StubGateway {
            verified: vec!["u1".to_string(), "u2".to_string()],
            failing: vec!["u2".to_string()],
            ..StubGateway::default()
        };
        let (service, _) = service_with(gateway, seeded_tree());

        let cards = service.list().await.unwrap();
        assert!(cards[0].email_verified);
        assert!(!cards[1].email_verified);
    }

    #[tokio::test]
    async fn test_detail_and_missing_user() {
        let (service, _) = service_with(StubGateway::default(), seeded_tree());

        let detail = service.detail("u1").unwrap();
        assert_eq!(detail.username.as_deref(), Some("jdoe"));
        assert_eq!(detail.warn_count, 3);

        let err = service.detail("ghost").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_approve_persists_flag() {
        let (service, store) = service_with(StubGateway::default(), seeded_tree());

        let message = service.approve("u1").await.unwrap();
        assert_eq!(message, "jdoe has been approved.");
        let value = store.get("users/u1/isApproved").await.unwrap();
        assert_eq!(value, json!(true));
    }

    #[tokio::test]
    async fn test_approve_unknown_uid_is_not_found() {
        let (service, store) = service_with(StubGateway::default(), seeded_tree());

        let err = service.approve("ghost").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        // Nothing written for the unknown account.
        let value = store.get("users/ghost").await.unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn test_resubmit_clears_approval_in_one_merge() {
        let (service, store) = service_with(StubGateway::default(), seeded_tree());

        let message = service.require_resubmit("u2").await.unwrap();
        assert_eq!(message, "msantos must now resubmit ID. Approval reset.");
        let user = store.get("users/u2").await.unwrap();
        assert_eq!(user["resubmitID"], json!(true));
        assert_eq!(user["isApproved"], json!(false));
        // The merge leaves unrelated fields alone.
        assert_eq!(user["username"], json!("msantos"));
    }

    #[tokio::test]
    async fn test_disable_updates_provider_then_store() {
        let (service, store) = service_with(StubGateway::default(), seeded_tree());

        let message = service.set_disabled("u1", true).await.unwrap();
        assert_eq!(message, "User u1 has been disabled");
        assert_eq!(store.get("users/u1/disabled").await.unwrap(), json!(true));

        let message = service.set_disabled("u1", false).await.unwrap();
        assert_eq!(message, "User u1 has been enabled");
        assert_eq!(store.get("users/u1/disabled").await.unwrap(), json!(false));
    }

    #[tokio::test]
    async fn test_provider_failure_keeps_store_untouched() {
        let gateway = StubGateway {
            fail_disable: true,
            ..StubGateway::default()
        };
        let (service, store) = service_with(gateway, seeded_tree());

        let err = service.set_disabled("u1", true).await.unwrap_err();
        assert!(matches!(err, AppError::ExternalServiceError(_)));
        assert_eq!(store.get("users/u1/disabled").await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_auth_record_passthrough() {
        let gateway = StubGateway {
            verified: vec!["u1".to_string()],
            ..StubGateway::default()
        };
        let (service, _) = service_with(gateway, seeded_tree());

        let record = service.auth_record("u1").await.unwrap();
        assert_eq!(record.uid, "u1");
        assert!(record.email_verified);
        assert_eq!(record.email.as_deref(), Some("u1@example.com"));
    }
}
