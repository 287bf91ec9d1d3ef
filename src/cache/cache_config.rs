//! Configuración de cache
//!
//! Este módulo contiene la configuración para la conexión Redis que
//! coordina las ejecuciones de la sincronización entre instancias.

use serde::{Deserialize, Serialize};

/// Configuración del cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub redis_url: String,
    pub key_prefix: String,
    /// TTL por defecto de los leases, en segundos
    pub default_ttl: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            key_prefix: "fleet_reminders".to_string(),
            default_ttl: 900, // 15 minutos
        }
    }
}
