//! Location model
//!
//! A pickup point with its fixed expected quantity. The bearing from the
//! depot is stored alongside so the sweep never recomputes it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::decimal_coordinate;
use crate::algorithms::geometry::Coordinate;
use crate::utils::AppResult;

/// Location - maps the `locations` table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub latitude: Decimal,
    pub longitude: Decimal,
    pub expected_quantity: f64,
    pub bearing: f64,
    pub collected: bool,
    pub created_at: DateTime<Utc>,
}

impl Location {
    pub fn coordinate(&self) -> AppResult<Coordinate> {
        decimal_coordinate(&self.latitude, &self.longitude)
    }

    /// Human readable collection status
    pub fn collected_status(&self) -> &'static str {
        if self.collected {
            "collected"
        } else {
            "not collected"
        }
    }
}
