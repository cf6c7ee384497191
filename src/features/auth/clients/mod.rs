mod gateway_client;

use async_trait::async_trait;

use crate::core::error::Result;

pub use gateway_client::AuthGatewayClient;

/// Identity attached to a verified bearer token.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub uid: String,
    #[allow(dead_code)]
    pub email: Option<String>,
}

/// Provider-side account record, distinct from the profile kept in the
/// report/user store.
#[derive(Debug, Clone)]
pub struct AuthRecord {
    pub uid: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub disabled: bool,
}

/// Contract of the external auth provider.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Verify a bearer token and resolve the account it belongs to.
    async fn verify_token(&self, token: &str) -> Result<VerifiedIdentity>;

    /// Fetch the provider-side record for one account.
    async fn get_auth_record(&self, uid: &str) -> Result<AuthRecord>;

    /// Enable or disable sign-in for one account at the provider.
    async fn set_disabled(&self, uid: &str, disabled: bool) -> Result<()>;
}
