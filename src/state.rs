//! Shared application state
//!
//! Everything the routers need is cloned into each handler through
//! `State<AppState>`: the pool, the configuration and the travel estimator
//! with its process-wide cache.

use std::sync::Arc;

use sqlx::PgPool;

use crate::cache::TravelCache;
use crate::config::environment::EnvironmentConfig;
use crate::config::EngineConfig;
use crate::repositories::schedule_repository::PgScheduleStore;
use crate::services::schedule_store::ScheduleStore;
use crate::services::travel_estimator::TravelEstimator;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub engine: Arc<EngineConfig>,
    pub estimator: Arc<dyn TravelEstimator>,
    pub travel_cache: TravelCache,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        config: EnvironmentConfig,
        engine: EngineConfig,
        estimator: Arc<dyn TravelEstimator>,
        travel_cache: TravelCache,
    ) -> Self {
        Self {
            pool,
            config,
            engine: Arc::new(engine),
            estimator,
            travel_cache,
        }
    }

    /// Schedule store over the shared pool
    pub fn schedule_store(&self) -> Arc<dyn ScheduleStore> {
        Arc::new(PgScheduleStore::new(self.pool.clone()))
    }
}
