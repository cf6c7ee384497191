//! Helpers shared by route tests.

use axum::{extract::Request, middleware::Next, Router};

use crate::features::auth::model::{AdminSession, Role};

/// Wrap a router so every request carries an already-resolved session,
/// bypassing bearer token verification.
pub fn with_session(router: Router, role: Role) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut req: Request, next: Next| async move {
            req.extensions_mut().insert(AdminSession {
                uid: "admin-1".to_string(),
                role,
            });
            next.run(req).await
        },
    ))
}
