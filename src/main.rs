use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use collection_routing::cache::{CacheConfig, RedisClient, TravelCache};
use collection_routing::config::database::DatabaseConfig;
use collection_routing::config::environment::EnvironmentConfig;
use collection_routing::config::EngineConfig;
use collection_routing::create_app;
use collection_routing::services::travel_estimator::{CachedTravelEstimator, OrsDirectionsClient};
use collection_routing::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🚛 Collection Routing - sweep clustering and route planning");

    let config = EnvironmentConfig::from_env()?;
    let engine = EngineConfig::from_env()?;
    info!(
        "⚙️ Depot ({}, {}), {} km/h, {} h work day, {} clusters per day, horizon {} days",
        engine.depot.latitude,
        engine.depot.longitude,
        engine.speed_kmh,
        engine.max_work_hours,
        engine.max_clusters_per_day,
        engine.horizon_days
    );

    let database = DatabaseConfig::from_env()?;
    let pool = match database.create_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Database connection failed: {}", e);
            return Err(anyhow::anyhow!("Database error: {}", e));
        }
    };
    info!("✅ Database connected");

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("✅ Migrations applied");

    let redis = match config.redis_url.clone() {
        Some(url) => match RedisClient::new(CacheConfig::from_env(url)?).await {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("⚠️ Redis unavailable, travel estimates cached in memory only: {}", e);
                None
            }
        },
        None => {
            info!("💾 REDIS_URL not set, travel estimates cached in memory only");
            None
        }
    };
    let travel_cache = TravelCache::new(redis);

    let directions = OrsDirectionsClient::new(&config.travel)?;
    let estimator = Arc::new(CachedTravelEstimator::new(directions, travel_cache.clone()));

    let addr: SocketAddr = config.server_url().parse()?;
    let state = AppState::new(pool, config, engine, estimator, travel_cache);
    let app = create_app(state);

    info!("🌐 Server listening on http://{}", addr);
    info!("   GET  /health");
    info!("   CRUD /api/v1/locations, /api/v1/vehicles");
    info!("   POST|GET|DELETE /api/v1/pengepul");
    info!("   GET  /api/v1/clusters/clustering?date=YYYY-MM-DD");
    info!("   GET  /api/v1/clusters/generate-routes?date=YYYY-MM-DD&optimized=true");
    info!("   GET  /api/v1/clusters/report-routes?start_date=&end_date=");

    let server_handle = tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                error!("❌ Server error: {}", e);
                e
            })
    });

    if let Err(e) = server_handle.await? {
        error!("❌ Server stopped with error: {}", e);
    }

    info!("👋 Server stopped");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Ctrl+C received, shutting down...");
        },
        _ = terminate => {
            info!("🛑 Terminate signal received, shutting down...");
        },
    }
}
