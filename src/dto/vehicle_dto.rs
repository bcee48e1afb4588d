use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::vehicle::{Vehicle, VehicleUsage};

// Request to create or replace a vehicle
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VehicleRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(range(min = 1))]
    pub capacity: i32,
}

// Vehicle as returned by the API
#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    pub id: i64,
    pub name: String,
    pub capacity: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            id: vehicle.id,
            name: vehicle.name,
            capacity: vehicle.capacity,
            created_at: vehicle.created_at,
        }
    }
}

// Details of a refused deletion
#[derive(Debug, Serialize)]
pub struct VehicleInUse {
    pub vehicle_id: i64,
    pub usage: VehicleUsage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_request_validation() {
        let ok = VehicleRequest {
            name: "Truck A".to_string(),
            capacity: 1000,
        };
        assert!(ok.validate().is_ok());

        let empty = VehicleRequest {
            name: String::new(),
            capacity: 0,
        };
        let errors = empty.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert!(errors.field_errors().contains_key("capacity"));
    }
}
