use crate::features::users::handlers::user_handler;
use crate::features::users::services::UserService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn routes(service: Arc<UserService>) -> Router {
    Router::new()
        .route("/api/users", get(user_handler::list_users))
        .route("/api/users/{uid}", get(user_handler::get_user))
        .route("/api/users/{uid}/approve", post(user_handler::approve_user))
        .route(
            "/api/users/{uid}/resubmit-id",
            post(user_handler::resubmit_id),
        )
        .route("/api/users/{uid}/disable", post(user_handler::disable_user))
        .route("/api/users/{uid}/auth", get(user_handler::get_user_auth))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Result;
    use crate::features::auth::clients::{AuthGateway, AuthRecord, VerifiedIdentity};
    use crate::features::auth::model::Role;
    use crate::features::users::models::UserTable;
    use crate::modules::store::{LiveTable, MemoryStore, RealtimeStore};
    use crate::shared::test_helpers::with_session;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};

    struct StubGateway;

    #[async_trait]
    impl AuthGateway for StubGateway {
        async fn verify_token(&self, _token: &str) -> Result<VerifiedIdentity> {
            Ok(VerifiedIdentity {
                uid: "admin-1".to_string(),
                email: None,
            })
        }

        async fn get_auth_record(&self, uid: &str) -> Result<AuthRecord> {
            Ok(AuthRecord {
                uid: uid.to_string(),
                email: None,
                email_verified: uid == "u1",
                disabled: false,
            })
        }

        async fn set_disabled(&self, _uid: &str, _disabled: bool) -> Result<()> {
            Ok(())
        }
    }

    fn harness(authed: bool) -> (TestServer, MemoryStore) {
        let tree = json!({
            "users": {
                "u1": {"username": "jdoe", "role": "user", "warnCount": 3},
                "u2": {"username": "msantos", "role": "user", "isApproved": true},
                "admin-1": {"username": "root", "role": "admin"},
            }
        });
        let store = MemoryStore::with_tree(tree.clone());
        let users = Arc::new(LiveTable::default());
        users.replace(UserTable::from_snapshot(&tree["users"]));

        let service = Arc::new(UserService::new(
            Arc::new(store.clone()),
            Arc::new(StubGateway),
            users,
        ));

        let mut app = routes(service);
        if authed {
            app = with_session(app, Role::Admin);
        }

        (TestServer::new(app).unwrap(), store)
    }

    #[tokio::test]
    async fn test_list_returns_cards_for_user_role_only() {
        let (server, _) = harness(true);
        let res = server.get("/api/users").await;
        assert_eq!(res.status_code(), StatusCode::OK);

        let body: Value = res.json();
        assert_eq!(body["meta"]["total"], json!(2));
        let cards = body["data"].as_array().unwrap();
        assert_eq!(cards[0]["uid"], json!("u1"));
        assert_eq!(cards[0]["emailVerified"], json!(true));
        assert_eq!(cards[0]["warnFlag"], json!(true));
        assert_eq!(cards[1]["emailVerified"], json!(false));
    }

    #[tokio::test]
    async fn test_unauthenticated_request_is_rejected() {
        let (server, _) = harness(false);
        let res = server.get("/api/users").await;
        assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_detail_unknown_uid_is_404() {
        let (server, _) = harness(true);
        let res = server.get("/api/users/ghost").await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_approve_writes_flag_and_reports() {
        let (server, store) = harness(true);
        let res = server.post("/api/users/u1/approve").await;
        assert_eq!(res.status_code(), StatusCode::OK);

        let body: Value = res.json();
        assert_eq!(body["message"], json!("jdoe has been approved."));
        assert_eq!(
            store.get("users/u1/isApproved").await.unwrap(),
            json!(true)
        );
    }

    #[tokio::test]
    async fn test_disable_without_field_is_400() {
        let (server, _) = harness(true);
        let res = server
            .post("/api/users/u1/disable")
            .json(&json!({}))
            .await;
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);

        let body: Value = res.json();
        assert_eq!(body["message"], json!("Missing uid or disable field"));
    }

    #[tokio::test]
    async fn test_disable_mirrors_flag_into_store() {
        let (server, store) = harness(true);
        let res = server
            .post("/api/users/u1/disable")
            .json(&json!({"disable": true}))
            .await;
        assert_eq!(res.status_code(), StatusCode::OK);

        let body: Value = res.json();
        assert_eq!(body["message"], json!("User u1 has been disabled"));
        assert_eq!(store.get("users/u1/disabled").await.unwrap(), json!(true));
    }

    #[tokio::test]
    async fn test_auth_record_endpoint() {
        let (server, _) = harness(true);
        let res = server.get("/api/users/u1/auth").await;
        assert_eq!(res.status_code(), StatusCode::OK);

        let body: Value = res.json();
        assert_eq!(body["data"]["uid"], json!("u1"));
        assert_eq!(body["data"]["emailVerified"], json!(true));
    }
}
