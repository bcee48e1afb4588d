use sqlx::PgPool;
use validator::Validate;

use crate::algorithms::geometry::{bearing, Coordinate};
use crate::dto::api_response::ApiResponse;
use crate::dto::location_dto::{LocationRequest, LocationResponse};
use crate::models::to_decimal;
use crate::repositories::location_repository::{LocationFields, LocationRepository};
use crate::utils::errors::{not_found_error, AppError};

pub struct LocationController {
    repository: LocationRepository,
    depot: Coordinate,
}

impl LocationController {
    pub fn new(pool: PgPool, depot: Coordinate) -> Self {
        Self {
            repository: LocationRepository::new(pool),
            depot,
        }
    }

    /// Validate the request and compute the bearing from the depot
    fn fields(&self, request: LocationRequest) -> Result<LocationFields, AppError> {
        request.validate()?;

        let coordinate = Coordinate::new(request.latitude, request.longitude);
        Ok(LocationFields {
            name: request.name.trim().to_string(),
            address: request.address.trim().to_string(),
            latitude: to_decimal(request.latitude)?,
            longitude: to_decimal(request.longitude)?,
            expected_quantity: request.expected_quantity,
            bearing: bearing(self.depot, coordinate),
        })
    }

    pub async fn create(&self, request: LocationRequest) -> Result<ApiResponse<LocationResponse>, AppError> {
        let fields = self.fields(request)?;
        let location = self.repository.create(fields).await?;

        log::info!("📍 Location {} created ({:.1}°)", location.id, location.bearing);

        Ok(ApiResponse::success_with_message(
            location.into(),
            "Location created".to_string(),
        ))
    }

    pub async fn list(&self) -> Result<ApiResponse<Vec<LocationResponse>>, AppError> {
        let locations = self.repository.find_all().await?;
        Ok(ApiResponse::success(
            locations.into_iter().map(LocationResponse::from).collect(),
        ))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<ApiResponse<LocationResponse>, AppError> {
        let location = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Location", &id.to_string()))?;

        Ok(ApiResponse::success(location.into()))
    }

    pub async fn update(&self, id: i64, request: LocationRequest) -> Result<ApiResponse<LocationResponse>, AppError> {
        let fields = self.fields(request)?;
        let location = self
            .repository
            .update(id, fields)
            .await?
            .ok_or_else(|| not_found_error("Location", &id.to_string()))?;

        Ok(ApiResponse::success_with_message(
            location.into(),
            "Location updated".to_string(),
        ))
    }

    /// Delete a location that no daily demand refers to
    pub async fn delete(&self, id: i64) -> Result<ApiResponse<()>, AppError> {
        if self.repository.find_by_id(id).await?.is_none() {
            return Err(not_found_error("Location", &id.to_string()));
        }

        if self.repository.is_referenced(id).await? {
            return Err(AppError::Conflict(format!(
                "Location {} has daily demand and cannot be deleted",
                id
            )));
        }

        self.repository.delete(id).await?;
        log::info!("🗑️ Location {} deleted", id);
        Ok(ApiResponse::message(format!("Location {} deleted", id)))
    }
}
