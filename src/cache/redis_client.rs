use redis::{aio::ConnectionManager, RedisResult, Script};
use tracing::{debug, info, warn};

use super::CacheConfig;
use crate::utils::errors::AppResult;

/// Borra la clave solo si sigue perteneciendo al mismo titular
const RELEASE_LEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// Cliente Redis con connection manager y operaciones async
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
    config: CacheConfig,
}

impl RedisClient {
    /// Crear nuevo cliente Redis
    pub async fn new(config: CacheConfig) -> AppResult<Self> {
        info!("🔗 Conectando a Redis: {}", config.redis_url);

        let client = redis::Client::open(config.redis_url.clone())?;
        let manager = ConnectionManager::new(client).await?;

        // Test de conexión usando un comando simple
        let mut conn = manager.clone();
        let _: () = redis::cmd("PING").query_async(&mut conn).await?;

        info!("✅ Redis conectado exitosamente");

        Ok(Self { manager, config })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Generar clave con prefijo
    fn make_key(&self, prefix: &str, identifier: &str) -> String {
        format!("{}:{}:{}", self.config.key_prefix, prefix, identifier)
    }

    /// Generar clave de lease
    pub fn lease_key(&self, name: &str) -> String {
        self.make_key("lease", name)
    }

    /// Tomar un lease con `SET NX EX`; `false` si otro titular lo tiene
    pub async fn try_acquire_lease(&self, key: &str, holder: &str, ttl_secs: u64) -> AppResult<bool> {
        let mut conn = self.manager.clone();

        let result: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(holder)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await?;

        let acquired = result.is_some();
        debug!("🔒 Lease {} para {}: {}", key, holder, acquired);
        Ok(acquired)
    }

    /// Liberar un lease solo si `holder` sigue siendo su titular
    pub async fn release_lease(&self, key: &str, holder: &str) -> AppResult<bool> {
        let mut conn = self.manager.clone();

        let result: RedisResult<i64> = Script::new(RELEASE_LEASE_SCRIPT)
            .key(key)
            .arg(holder)
            .invoke_async(&mut conn)
            .await;

        match result {
            Ok(deleted) => {
                debug!("🔓 Lease {} liberado (eliminados: {})", key, deleted);
                Ok(deleted > 0)
            }
            Err(e) => {
                warn!("⚠️ Error liberando lease {}: {}", key, e);
                Err(e.into())
            }
        }
    }
}
