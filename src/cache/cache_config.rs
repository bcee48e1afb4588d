//! Cache configuration

use serde::{Deserialize, Serialize};

use crate::config::env_or;

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub redis_url: String,
    /// Lifetime of a cached travel estimate, in seconds
    pub travel_ttl: u64,
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            travel_ttl: 7 * 24 * 3600,
            key_prefix: "collection_routing".to_string(),
        }
    }
}

impl CacheConfig {
    pub fn from_env(redis_url: String) -> anyhow::Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            redis_url,
            travel_ttl: env_or("CACHE_TRAVEL_TTL_SECS", defaults.travel_ttl)?,
            key_prefix: env_or("CACHE_KEY_PREFIX", defaults.key_prefix)?,
        })
    }
}
