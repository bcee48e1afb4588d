//! Cluster route model
//!
//! The visiting order of a cluster. Routes are stored per sequencing mode so
//! the optimized and the sweep-ordered variants can coexist for a date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Row to insert into `cluster_routes`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewClusterRoute {
    pub cluster_id: i32,
    pub cluster_date: NaiveDate,
    pub vehicle_id: i64,
    pub daily_demand_id: i64,
    pub order_no: i32,
    pub carried_quantity: f64,
    pub travel_hours: f64,
    pub unload_hours: f64,
    pub distance_km: f64,
    pub optimized: bool,
}

/// A stored route stop joined for reporting
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RouteReportRow {
    pub cluster_id: i32,
    pub cluster_date: NaiveDate,
    pub order_no: i32,
    pub vehicle_id: i64,
    pub vehicle_name: String,
    pub daily_demand_id: i64,
    pub name: String,
    pub address: String,
    pub expected_quantity: f64,
    pub carried_quantity: f64,
    pub travel_hours: f64,
    pub unload_hours: f64,
    pub distance_km: f64,
    pub optimized: bool,
}
