//! Daily demand model
//!
//! One row per location requested for pickup on a date. The row keeps the
//! quantity still to collect and the date it is currently scheduled on,
//! which moves forward while demand is carried over.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

use super::decimal_coordinate;
use crate::algorithms::geometry::Coordinate;
use crate::algorithms::sweep::PendingDemand;
use crate::utils::{AppError, AppResult};

/// Pickup status - maps the `demand_status` ENUM
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "demand_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum DemandStatus {
    Pending,
    Done,
}

/// Daily demand - maps the `daily_demand` table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyDemand {
    pub id: i64,
    pub location_id: i64,
    /// Date the demand was requested for
    pub origin_date: NaiveDate,
    /// Date the demand is currently scheduled on
    pub cluster_date: NaiveDate,
    pub name: String,
    pub address: String,
    pub latitude: Decimal,
    pub longitude: Decimal,
    pub bearing: f64,
    pub expected_quantity: f64,
    pub start_quantity: f64,
    pub remaining_quantity: f64,
    pub status: DemandStatus,
    pub created_at: DateTime<Utc>,
}

impl DailyDemand {
    pub fn coordinate(&self) -> AppResult<Coordinate> {
        decimal_coordinate(&self.latitude, &self.longitude)
    }
}

impl TryFrom<&DailyDemand> for PendingDemand {
    type Error = AppError;

    fn try_from(row: &DailyDemand) -> Result<Self, Self::Error> {
        Ok(PendingDemand {
            id: row.id,
            location_id: row.location_id,
            name: row.name.clone(),
            coordinate: row.coordinate()?,
            bearing: row.bearing,
            expected_quantity: row.expected_quantity,
            start_quantity: row.start_quantity,
            remaining_quantity: row.remaining_quantity,
            cluster_date: row.cluster_date,
            status: row.status,
        })
    }
}
