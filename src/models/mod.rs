//! Data models
//!
//! Rows of the PostgreSQL schema in `migrations/`.

pub mod cluster;
pub mod cluster_route;
pub mod daily_demand;
pub mod location;
pub mod vehicle;

use num_traits::ToPrimitive;
use rust_decimal::Decimal;

use crate::algorithms::geometry::Coordinate;
use crate::utils::{AppError, AppResult};

/// Convert stored NUMERIC coordinates into floating point degrees
pub(crate) fn decimal_coordinate(latitude: &Decimal, longitude: &Decimal) -> AppResult<Coordinate> {
    match (latitude.to_f64(), longitude.to_f64()) {
        (Some(lat), Some(lon)) => Ok(Coordinate::new(lat, lon)),
        _ => Err(AppError::Internal(format!(
            "Stored coordinate ({}, {}) is not representable",
            latitude, longitude
        ))),
    }
}

/// Convert degrees into the NUMERIC representation used by the schema
pub(crate) fn to_decimal(value: f64) -> AppResult<Decimal> {
    Decimal::from_f64_retain(value)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid coordinate value: {}", value)))
}
