//! Vehicle model
//!
//! A collection truck. Capacity is in the same unit as location quantities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Vehicle - maps the `vehicles` table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: i64,
    pub name: String,
    pub capacity: i32,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn capacity(&self) -> f64 {
        f64::from(self.capacity.max(0))
    }
}

/// Number of stored plan rows that reference a vehicle
#[derive(Debug, Clone, Copy, Default, Serialize, FromRow)]
pub struct VehicleUsage {
    pub clusters: i64,
    pub routes: i64,
}

impl VehicleUsage {
    pub fn is_referenced(&self) -> bool {
        self.clusters > 0 || self.routes > 0
    }
}
