//! Request and response bodies

pub mod api_response;
pub mod clustering_dto;
pub mod daily_demand_dto;
pub mod location_dto;
pub mod vehicle_dto;

pub use api_response::{ApiResponse, ResponseStatus};
