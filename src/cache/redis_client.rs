use anyhow::Result;
use redis::aio::ConnectionManager;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, info, warn};

use super::CacheConfig;

/// Redis client over a multiplexed connection manager
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
    config: CacheConfig,
}

impl RedisClient {
    /// Connect and check the server answers
    pub async fn new(config: CacheConfig) -> Result<Self> {
        info!("🔗 Connecting to Redis: {}", config.redis_url);

        let client = redis::Client::open(config.redis_url.clone())?;
        let manager = ConnectionManager::new(client).await?;

        let mut conn = manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        info!("✅ Redis connected");

        Ok(Self { manager, config })
    }

    fn make_key(&self, prefix: &str, identifier: &str) -> String {
        format!("{}:{}:{}", self.config.key_prefix, prefix, identifier)
    }

    /// Key of a travel estimate between two coordinates
    pub fn travel_key(&self, pair: &str) -> String {
        self.make_key("travel", pair)
    }

    pub fn travel_ttl(&self) -> u64 {
        self.config.travel_ttl
    }

    /// Read a JSON value. Read failures count as misses.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.manager.clone();

        match redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<String>>(&mut conn)
            .await
        {
            Ok(Some(value)) => {
                debug!("📥 Cache HIT for key: {}", key);
                Ok(Some(serde_json::from_str(&value)?))
            }
            Ok(None) => {
                debug!("❌ Cache MISS for key: {}", key);
                Ok(None)
            }
            Err(e) => {
                warn!("⚠️ Error reading cache key {}: {}", key, e);
                Ok(None)
            }
        }
    }

    /// Store a JSON value with an expiry
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: u64) -> Result<()> {
        let mut conn = self.manager.clone();
        let serialized = serde_json::to_string(value)?;

        let result = redis::cmd("SET")
            .arg(key)
            .arg(serialized)
            .arg("EX")
            .arg(ttl)
            .query_async::<_, ()>(&mut conn)
            .await;

        match result {
            Ok(()) => {
                debug!("💾 Cache SET for key: {} (TTL: {}s)", key, ttl);
                Ok(())
            }
            Err(e) => {
                error!("❌ Error writing cache key {}: {}", key, e);
                Err(anyhow::anyhow!("Redis error: {}", e))
            }
        }
    }

    pub async fn is_connected(&self) -> bool {
        let mut conn = self.manager.clone();
        match redis::cmd("PING").query_async::<_, String>(&mut conn).await {
            Ok(response) => response == "PONG",
            Err(_) => false,
        }
    }
}
