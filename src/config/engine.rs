//! Engine configuration
//!
//! Every tunable of the clustering and sequencing engine. Defaults match the
//! operating rules of the Yogyakarta collection fleet and can be overridden
//! through `ENGINE_*` environment variables.

use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::{env_opt, env_or};
use crate::algorithms::geometry::Coordinate;
use crate::algorithms::travel::TravelLeg;

/// How long a stop takes to load
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum UnloadModel {
    /// Same duration for every stop
    Flat { hours_per_stop: f64 },
    /// Duration proportional to the picked quantity
    PerUnit { hours_per_unit: f64 },
}

impl UnloadModel {
    pub fn hours(&self, quantity: f64) -> f64 {
        match self {
            UnloadModel::Flat { hours_per_stop } => *hours_per_stop,
            UnloadModel::PerUnit { hours_per_unit } => hours_per_unit * quantity.max(0.0),
        }
    }
}

/// What happens to a pickup below the minimum quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdPolicy {
    /// Skipped today, re-evaluated on the next working day
    SkipForDay,
    /// Left pending and reported as unmet for manual follow-up
    SkipPermanently,
}

impl FromStr for ThresholdPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip_for_day" | "day" => Ok(ThresholdPolicy::SkipForDay),
            "skip_permanently" | "permanent" => Ok(ThresholdPolicy::SkipPermanently),
            other => Err(format!("unknown threshold policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinimumPickup {
    pub quantity: f64,
    pub policy: ThresholdPolicy,
}

/// Cost the nearest-neighbor sequencer minimizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TourMetric {
    Duration,
    Distance,
}

impl TourMetric {
    pub fn cost(&self, leg: &TravelLeg) -> f64 {
        match self {
            TourMetric::Duration => leg.duration_hours,
            TourMetric::Distance => leg.distance_km,
        }
    }
}

impl FromStr for TourMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "duration" => Ok(TourMetric::Duration),
            "distance" => Ok(TourMetric::Distance),
            other => Err(format!("unknown tour metric '{}'", other)),
        }
    }
}

/// Handling of legs the travel provider could not estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingEstimatePolicy {
    /// The leg is unusable and its candidate is skipped
    Skip,
    /// The configured placeholder estimate is used instead
    Default,
}

impl FromStr for MissingEstimatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(MissingEstimatePolicy::Skip),
            "default" => Ok(MissingEstimatePolicy::Default),
            other => Err(format!("unknown missing estimate policy '{}'", other)),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub depot: Coordinate,
    pub speed_kmh: f64,
    /// Traffic-light delay added per 10 km driven
    pub red_light_hours_per_10km: f64,
    pub unload: UnloadModel,
    pub max_work_hours: f64,
    pub max_clusters_per_day: u32,
    pub minimum_pickup: Option<MinimumPickup>,
    pub off_day: Weekday,
    /// Working days a single run may span
    pub horizon_days: u32,
    pub tour_metric: TourMetric,
    pub missing_estimate: MissingEstimatePolicy,
    pub default_estimate: TravelLeg,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            depot: Coordinate::new(-7.735771367498664, 110.34369342557244),
            speed_kmh: 40.0,
            red_light_hours_per_10km: 0.0333,
            unload: UnloadModel::Flat {
                hours_per_stop: 0.75,
            },
            max_work_hours: 8.0,
            max_clusters_per_day: 3,
            minimum_pickup: None,
            off_day: Weekday::Sun,
            horizon_days: 5,
            tour_metric: TourMetric::Distance,
            missing_estimate: MissingEstimatePolicy::Default,
            default_estimate: TravelLeg::new(0.25, 1.0),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let unload = match env_or("ENGINE_UNLOAD_MODEL", "flat".to_string())?
            .to_ascii_lowercase()
            .as_str()
        {
            "flat" => UnloadModel::Flat {
                hours_per_stop: env_or("ENGINE_UNLOAD_HOURS", 0.75)?,
            },
            "per_unit" => UnloadModel::PerUnit {
                hours_per_unit: env_or("ENGINE_UNLOAD_HOURS_PER_UNIT", 0.005)?,
            },
            other => anyhow::bail!("ENGINE_UNLOAD_MODEL has an invalid value: {}", other),
        };

        let minimum_pickup = env_opt::<f64>("ENGINE_MIN_PICKUP")?
            .map(|quantity| -> anyhow::Result<MinimumPickup> {
                Ok(MinimumPickup {
                    quantity,
                    policy: env_or("ENGINE_MIN_PICKUP_POLICY", ThresholdPolicy::SkipForDay)?,
                })
            })
            .transpose()?;

        let config = Self {
            depot: Coordinate::new(
                env_or("ENGINE_DEPOT_LAT", defaults.depot.latitude)?,
                env_or("ENGINE_DEPOT_LON", defaults.depot.longitude)?,
            ),
            speed_kmh: env_or("ENGINE_SPEED_KMH", defaults.speed_kmh)?,
            red_light_hours_per_10km: env_or(
                "ENGINE_RED_LIGHT_HOURS_PER_10KM",
                defaults.red_light_hours_per_10km,
            )?,
            unload,
            max_work_hours: env_or("ENGINE_MAX_WORK_HOURS", defaults.max_work_hours)?,
            max_clusters_per_day: env_or(
                "ENGINE_MAX_CLUSTERS_PER_DAY",
                defaults.max_clusters_per_day,
            )?,
            minimum_pickup,
            off_day: env_or("ENGINE_OFF_DAY", defaults.off_day)?,
            horizon_days: env_or("ENGINE_HORIZON_DAYS", defaults.horizon_days)?,
            tour_metric: env_or("ENGINE_TOUR_METRIC", defaults.tour_metric)?,
            missing_estimate: env_or("ENGINE_MISSING_ESTIMATE", defaults.missing_estimate)?,
            default_estimate: TravelLeg::new(
                env_or(
                    "ENGINE_DEFAULT_DURATION_HOURS",
                    defaults.default_estimate.duration_hours,
                )?,
                env_or(
                    "ENGINE_DEFAULT_DISTANCE_KM",
                    defaults.default_estimate.distance_km,
                )?,
            ),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot work with
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.speed_kmh.is_finite() && self.speed_kmh > 0.0) {
            anyhow::bail!("speed must be positive, got {}", self.speed_kmh);
        }
        if !(self.max_work_hours.is_finite() && self.max_work_hours > 0.0) {
            anyhow::bail!("max work hours must be positive, got {}", self.max_work_hours);
        }
        if self.max_clusters_per_day == 0 {
            anyhow::bail!("at least one cluster per day is required");
        }
        if self.horizon_days == 0 {
            anyhow::bail!("the planning horizon must span at least one day");
        }
        Ok(())
    }

    /// Driving time for a leg: distance over speed plus the traffic-light
    /// allowance.
    pub fn travel_hours(&self, distance_km: f64) -> f64 {
        distance_km / self.speed_kmh + distance_km / 10.0 * self.red_light_hours_per_10km
    }

    /// Driving time charged for a leg. A placeholder never costs less than
    /// its configured duration.
    pub fn leg_hours(&self, leg: &TravelLeg) -> f64 {
        let hours = self.travel_hours(leg.distance_km);
        if leg.placeholder {
            hours.max(leg.duration_hours)
        } else {
            hours
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_engine_config() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_clusters_per_day, 3);
        assert_eq!(config.off_day, Weekday::Sun);
        assert_eq!(config.unload.hours(120.0), 0.75);
    }

    #[test]
    fn test_travel_hours() {
        let config = EngineConfig::default();
        let hours = config.travel_hours(20.0);
        assert!((hours - (0.5 + 2.0 * 0.0333)).abs() < 1e-12);
        assert_eq!(config.travel_hours(0.0), 0.0);
    }

    #[test]
    fn test_placeholder_leg_costs_its_duration() {
        let config = EngineConfig::default();
        let placeholder = config.default_estimate.as_placeholder();
        assert_eq!(config.leg_hours(&placeholder), 0.25);

        let measured = TravelLeg::new(0.25, 1.0);
        assert!((config.leg_hours(&measured) - config.travel_hours(1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_per_unit_unload() {
        let unload = UnloadModel::PerUnit {
            hours_per_unit: 0.01,
        };
        assert!((unload.hours(50.0) - 0.5).abs() < 1e-12);
        assert_eq!(unload.hours(-3.0), 0.0);
    }

    #[test]
    fn test_policies_parse() {
        assert_eq!("skip".parse(), Ok(MissingEstimatePolicy::Skip));
        assert_eq!("Distance".parse(), Ok(TourMetric::Distance));
        assert_eq!("permanent".parse(), Ok(ThresholdPolicy::SkipPermanently));
        assert!("sometimes".parse::<ThresholdPolicy>().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_speed() {
        let config = EngineConfig {
            speed_kmh: 0.0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
