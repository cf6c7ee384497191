//! Authorization guards for admin-only operations.
//!
//! Guards pull the resolved [`AdminSession`] from request extensions (set
//! by the auth middleware) and reject the request when the role is not
//! sufficient.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::core::error::AppError;
use crate::features::auth::model::AdminSession;

/// Guard for operations restricted to admins, such as publicizing reports.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireAdmin(session): RequireAdmin) { ... }
/// ```
pub struct RequireAdmin(pub AdminSession);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<AdminSession>()
            .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))?;

        if !session.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        Ok(RequireAdmin(session.clone()))
    }
}
