//! Lease de ejecución única para la sincronización
//!
//! Dos ejecuciones solapadas no producen duplicados (el INSERT es
//! idempotente) pero desperdician trabajo; el lease evita que arranquen.

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::cache::RedisClient;
use crate::utils::errors::AppResult;

/// Prueba de titularidad de un lease
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseToken(String);

impl LeaseToken {
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
pub trait SyncLease: Send + Sync {
    /// `None` si otra ejecución ya tiene el lease
    async fn try_acquire(&self) -> AppResult<Option<LeaseToken>>;

    async fn release(&self, token: LeaseToken) -> AppResult<()>;
}

/// Lease dentro de un solo proceso
#[derive(Default)]
pub struct LocalSyncLease {
    holder: Mutex<Option<LeaseToken>>,
}

impl LocalSyncLease {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SyncLease for LocalSyncLease {
    async fn try_acquire(&self) -> AppResult<Option<LeaseToken>> {
        let mut holder = self.holder.lock().await;
        if holder.is_some() {
            return Ok(None);
        }

        let token = LeaseToken::generate();
        *holder = Some(token.clone());
        Ok(Some(token))
    }

    async fn release(&self, token: LeaseToken) -> AppResult<()> {
        let mut holder = self.holder.lock().await;
        if holder.as_ref() == Some(&token) {
            *holder = None;
        }
        Ok(())
    }
}

/// Lease compartido entre instancias mediante Redis.
///
/// El TTL libera el lease si el proceso titular muere a mitad de ejecución.
pub struct RedisSyncLease {
    redis: RedisClient,
    key: String,
    ttl_secs: u64,
}

impl RedisSyncLease {
    /// El TTL sale de `CacheConfig::default_ttl`
    pub fn new(redis: RedisClient, name: &str) -> Self {
        let key = redis.lease_key(name);
        let ttl_secs = redis.config().default_ttl;
        Self {
            redis,
            key,
            ttl_secs,
        }
    }
}

#[async_trait]
impl SyncLease for RedisSyncLease {
    async fn try_acquire(&self) -> AppResult<Option<LeaseToken>> {
        let token = LeaseToken::generate();
        let acquired = self
            .redis
            .try_acquire_lease(&self.key, token.as_str(), self.ttl_secs)
            .await?;

        Ok(acquired.then_some(token))
    }

    async fn release(&self, token: LeaseToken) -> AppResult<()> {
        if !self.redis.release_lease(&self.key, token.as_str()).await? {
            log::warn!("⚠️ Lease {} ya había expirado al liberarlo", self.key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_lease_is_exclusive() {
        let lease = LocalSyncLease::new();

        let first = lease.try_acquire().await.unwrap().unwrap();
        assert!(lease.try_acquire().await.unwrap().is_none());

        lease.release(first).await.unwrap();
        assert!(lease.try_acquire().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_stale_token_does_not_release() {
        let lease = LocalSyncLease::new();

        let token = lease.try_acquire().await.unwrap().unwrap();
        lease.release(LeaseToken::generate()).await.unwrap();
        assert!(lease.try_acquire().await.unwrap().is_none());

        lease.release(token).await.unwrap();
        assert!(lease.try_acquire().await.unwrap().is_some());
    }
}
