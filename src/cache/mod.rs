//! Cache
//!
//! Este módulo contiene el cliente Redis usado para el lease de
//! sincronización compartido entre instancias.

pub mod cache_config;
pub mod redis_client;

pub use cache_config::CacheConfig;
pub use redis_client::RedisClient;
