use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::constants::ROLE_ADMIN;

/// Dashboard role. Anything the store does not mark as admin resolves to
/// the least-privileged role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    /// Resolve a role from the raw store value at `users/{uid}/role`.
    pub fn from_store_value(value: &serde_json::Value) -> Self {
        match value.as_str() {
            Some(role) if role == ROLE_ADMIN => Role::Admin,
            _ => Role::User,
        }
    }
}

/// Identity of the acting dashboard user, resolved once per bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminSession {
    pub uid: String,
    pub role: Role,
}

impl AdminSession {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
