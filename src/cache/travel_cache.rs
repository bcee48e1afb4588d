//! Travel estimate cache
//!
//! Estimates are keyed by the origin/destination pair rounded to 6 decimals.
//! Concurrent writers of the same key store equal values, so the last write
//! simply wins. Failed estimates are never stored.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::RedisClient;
use crate::algorithms::travel::TravelLeg;

#[derive(Clone, Default)]
pub struct TravelCache {
    memory: Arc<RwLock<HashMap<String, TravelLeg>>>,
    redis: Option<RedisClient>,
}

impl TravelCache {
    pub fn new(redis: Option<RedisClient>) -> Self {
        Self {
            memory: Arc::new(RwLock::new(HashMap::new())),
            redis,
        }
    }

    /// Process-local cache only
    pub fn in_memory() -> Self {
        Self::new(None)
    }

    pub fn has_redis(&self) -> bool {
        self.redis.is_some()
    }

    pub async fn get(&self, key: &str) -> Option<TravelLeg> {
        if let Some(leg) = self.memory.read().await.get(key).copied() {
            return Some(leg);
        }

        let redis = self.redis.as_ref()?;
        match redis.get::<TravelLeg>(&redis.travel_key(key)).await {
            Ok(Some(leg)) => {
                self.memory.write().await.insert(key.to_string(), leg);
                Some(leg)
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("⚠️ Discarding unreadable cached estimate {}: {}", key, e);
                None
            }
        }
    }

    pub async fn put(&self, key: &str, leg: TravelLeg) {
        self.memory.write().await.insert(key.to_string(), leg);

        if let Some(redis) = &self.redis {
            if let Err(e) = redis.set(&redis.travel_key(key), &leg, redis.travel_ttl()).await {
                log::warn!("⚠️ Could not share estimate {} through Redis: {}", key, e);
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.memory.read().await.len()
    }
}
