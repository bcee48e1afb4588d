//! Controllers
//!
//! Validate input, call repositories and services, and shape responses.

pub mod clustering_controller;
pub mod daily_demand_controller;
pub mod location_controller;
pub mod vehicle_controller;
