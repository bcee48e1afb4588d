//! Cluster model
//!
//! A cluster is one vehicle's trip on one day. It is stored as one row per
//! stop; `cluster_id` is numbered from 1 within each date.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{daily_demand::DemandStatus, decimal_coordinate};
use crate::algorithms::geometry::Coordinate;
use crate::utils::AppResult;

/// Row to insert into `clusters`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCluster {
    pub cluster_id: i32,
    pub cluster_date: NaiveDate,
    pub vehicle_id: i64,
    pub daily_demand_id: i64,
    pub carried_quantity: f64,
    pub start_quantity: f64,
    pub remaining_quantity: f64,
    pub travel_hours: f64,
    pub unload_hours: f64,
    pub distance_km: f64,
}

/// A stored cluster stop joined with its demand and vehicle
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClusterAssignment {
    pub id: i64,
    pub cluster_id: i32,
    pub cluster_date: NaiveDate,
    pub vehicle_id: i64,
    pub vehicle_name: String,
    pub daily_demand_id: i64,
    pub location_id: i64,
    pub name: String,
    pub address: String,
    pub latitude: Decimal,
    pub longitude: Decimal,
    pub bearing: f64,
    pub expected_quantity: f64,
    pub carried_quantity: f64,
    pub start_quantity: f64,
    pub remaining_quantity: f64,
    pub travel_hours: f64,
    pub unload_hours: f64,
    pub distance_km: f64,
    pub status: DemandStatus,
}

impl ClusterAssignment {
    pub fn coordinate(&self) -> AppResult<Coordinate> {
        decimal_coordinate(&self.latitude, &self.longitude)
    }
}
