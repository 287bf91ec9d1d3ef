//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y del job de
//! sincronización de recordatorios.

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub log_level: tracing::Level,
    /// Sin REDIS_URL el lease de sincronización es local al proceso
    pub redis_url: Option<String>,
    pub reminder_sync_interval_secs: u64,
    pub reminder_sync_on_startup: bool,
    pub reminder_sync_lease_ttl_secs: u64,
}

/// Leer una variable opcional, usando `default` si no está definida
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid value, got '{}'", key, value)),
        Err(_) => Ok(default),
    }
}

impl EnvironmentConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            port: env_or("PORT", 3000)?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            log_level: env_or("LOG_LEVEL", tracing::Level::INFO)?,
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty()),
            reminder_sync_interval_secs: env_or("REMINDER_SYNC_INTERVAL_SECS", 3600)?,
            reminder_sync_on_startup: env_or("REMINDER_SYNC_ON_STARTUP", true)?,
            reminder_sync_lease_ttl_secs: env_or("REMINDER_SYNC_LEASE_TTL_SECS", 900)?,
        };

        if config.reminder_sync_interval_secs == 0 {
            anyhow::bail!("REMINDER_SYNC_INTERVAL_SECS must be greater than zero");
        }

        Ok(config)
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_parses_and_defaults() {
        env::set_var("FLEET_REMINDERS_TEST_NUMBER", " 42 ");
        assert_eq!(env_or::<u64>("FLEET_REMINDERS_TEST_NUMBER", 7).unwrap(), 42);
        assert_eq!(env_or::<u64>("FLEET_REMINDERS_TEST_MISSING", 7).unwrap(), 7);

        env::set_var("FLEET_REMINDERS_TEST_BAD", "soon");
        assert!(env_or::<bool>("FLEET_REMINDERS_TEST_BAD", true).is_err());
    }
}
