//! Environment configuration
//!
//! Server binding, CORS origins and the external directions provider.

use std::time::Duration;

use super::{env_opt, env_or};

/// Environment configuration
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
    pub redis_url: Option<String>,
    pub travel: TravelProviderConfig,
}

/// Settings of the directions provider used for travel estimates
#[derive(Debug, Clone)]
pub struct TravelProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub profile: String,
    pub timeout: Duration,
}

impl Default for TravelProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openrouteservice.org".to_string(),
            profile: "driving-car".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 8000,
            host: "0.0.0.0".to_string(),
            cors_origins: vec!["*".to_string()],
            redis_url: None,
            travel: TravelProviderConfig::default(),
        }
    }
}

impl EnvironmentConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = TravelProviderConfig::default();

        Ok(Self {
            environment: env_or("ENVIRONMENT", "development".to_string())?,
            port: env_or("PORT", 8000)?,
            host: env_or("HOST", "0.0.0.0".to_string())?,
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            redis_url: env_opt("REDIS_URL")?,
            travel: TravelProviderConfig {
                api_key: env_opt("ORS_API_KEY")?,
                base_url: env_or("ORS_BASE_URL", defaults.base_url)?,
                profile: env_or("ORS_PROFILE", defaults.profile)?,
                timeout: Duration::from_secs(env_or("TRAVEL_TIMEOUT_SECS", 10)?),
            },
        })
    }

    /// Check whether we run in development mode
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Server bind address
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
