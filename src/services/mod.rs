//! Services
//!
//! Business logic that spans several tables or talks to the routing
//! provider: travel estimation, multi-day clustering and route generation.

pub mod clustering_service;
pub mod route_service;
pub mod schedule_store;
pub mod travel_estimator;

pub use clustering_service::{ClusteringResult, ClusteringService, ScheduleReport};
pub use route_service::{ClusterTour, RouteService};
pub use schedule_store::{ScheduleStore, ScheduleTransaction};
pub use travel_estimator::{
    CachedTravelEstimator, LegResolver, OrsDirectionsClient, TravelEstimate, TravelEstimator,
};
