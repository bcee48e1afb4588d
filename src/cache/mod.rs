//! Cache
//!
//! Memoization of travel estimates: an in-process map backed by an optional
//! Redis instance shared between service replicas.

pub mod cache_config;
pub mod redis_client;
pub mod travel_cache;

pub use cache_config::CacheConfig;
pub use redis_client::RedisClient;
pub use travel_cache::TravelCache;
