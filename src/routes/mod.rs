pub mod clustering_routes;
pub mod daily_demand_routes;
pub mod location_routes;
pub mod vehicle_routes;
