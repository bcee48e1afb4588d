use chrono::{DateTime, Utc};
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::location::Location;
use crate::utils::validation::{validate_coordinates, validate_quantity};

// Request to create or replace a location
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_location_values"))]
pub struct LocationRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(length(min = 1, max = 255))]
    pub address: String,

    pub latitude: f64,

    pub longitude: f64,

    pub expected_quantity: f64,
}

fn validate_location_values(request: &LocationRequest) -> Result<(), ValidationError> {
    validate_coordinates(request.latitude, request.longitude)?;
    validate_quantity(request.expected_quantity)
}

// Location as returned by the API
#[derive(Debug, Serialize)]
pub struct LocationResponse {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub expected_quantity: f64,
    pub bearing: f64,
    pub collected: bool,
    pub collected_status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Location> for LocationResponse {
    fn from(location: Location) -> Self {
        let collected_status = location.collected_status().to_string();
        Self {
            id: location.id,
            latitude: location.latitude.to_f64().unwrap_or_default(),
            longitude: location.longitude.to_f64().unwrap_or_default(),
            name: location.name,
            address: location.address,
            expected_quantity: location.expected_quantity,
            bearing: location.bearing,
            collected: location.collected,
            collected_status,
            created_at: location.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(latitude: f64, expected_quantity: f64) -> LocationRequest {
        LocationRequest {
            name: "Bank Sampah Melati".to_string(),
            address: "Jl. Kaliurang km 5".to_string(),
            latitude,
            longitude: 110.38,
            expected_quantity,
        }
    }

    #[test]
    fn test_location_request_validation() {
        assert!(request(-7.75, 120.0).validate().is_ok());
        assert!(request(-97.0, 120.0).validate().is_err());
        assert!(request(-7.75, -1.0).validate().is_err());
    }
}
