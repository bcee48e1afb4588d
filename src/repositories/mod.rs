//! Repositories
//!
//! SQL access for each table, plus the PostgreSQL schedule store used by the
//! clustering and routing services.

pub mod daily_demand_repository;
pub mod location_repository;
pub mod schedule_repository;
pub mod vehicle_repository;

pub use daily_demand_repository::DailyDemandRepository;
pub use location_repository::{LocationFields, LocationRepository};
pub use schedule_repository::PgScheduleStore;
pub use vehicle_repository::VehicleRepository;
