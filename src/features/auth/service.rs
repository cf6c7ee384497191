use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::core::error::Result;
use crate::features::auth::clients::AuthGateway;
use crate::features::auth::model::{AdminSession, Role};
use crate::modules::store::RealtimeStore;

struct CachedSession {
    session: AdminSession,
    resolved_at: Instant,
}

impl CachedSession {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.resolved_at.elapsed() < ttl
    }
}

/// Resolves bearer tokens into dashboard sessions.
///
/// The gateway verifies the token once per TTL window; the role then comes
/// from the user's store record. Within the window a session costs no
/// round-trips. Once an entry ages past the TTL the token is verified
/// again, so provider-side revocation and role changes take effect at the
/// next request past the deadline.
pub struct SessionService {
    gateway: Arc<dyn AuthGateway>,
    store: Arc<dyn RealtimeStore>,
    cache: RwLock<HashMap<String, CachedSession>>,
    cache_ttl: Duration,
}

impl SessionService {
    pub fn new(
        gateway: Arc<dyn AuthGateway>,
        store: Arc<dyn RealtimeStore>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            gateway,
            store,
            cache: RwLock::new(HashMap::new()),
            cache_ttl,
        }
    }

    pub async fn resolve(&self, token: &str) -> Result<AdminSession> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(token) {
                if cached.is_fresh(self.cache_ttl) {
                    return Ok(cached.session.clone());
                }
            }
        }

        // Cache miss or expired entry: verify against the gateway again
        let identity = match self.gateway.verify_token(token).await {
            Ok(identity) => identity,
            Err(e) => {
                // A token the provider no longer accepts loses its entry
                self.cache.write().await.remove(token);
                return Err(e);
            }
        };
        let role = self.resolve_role(&identity.uid).await;

        let session = AdminSession {
            uid: identity.uid,
            role,
        };

        let mut cache = self.cache.write().await;
        cache.retain(|_, cached| cached.is_fresh(self.cache_ttl));
        cache.insert(
            token.to_string(),
            CachedSession {
                session: session.clone(),
                resolved_at: Instant::now(),
            },
        );
        Ok(session)
    }

    /// Role from `users/{uid}/role`, least privilege when unresolved.
    async fn resolve_role(&self, uid: &str) -> Role {
        match self.store.get(&format!("users/{}/role", uid)).await {
            Ok(value) => Role::from_store_value(&value),
            Err(e) => {
                tracing::warn!("Failed to resolve role for {}: {}", uid, e);
                Role::User
            }
        }
    }

    #[cfg(test)]
    pub(crate) async fn cached_session_count(&self) -> usize {
        self.cache.read().await.len()
    }
}
