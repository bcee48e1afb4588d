use sqlx::PgPool;
use validator::Validate;

use crate::dto::api_response::ApiResponse;
use crate::dto::vehicle_dto::{VehicleRequest, VehicleResponse};
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::utils::errors::{conflict_error, not_found_error, AppError};

pub struct VehicleController {
    repository: VehicleRepository,
}

impl VehicleController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: VehicleRepository::new(pool),
        }
    }

    pub async fn create(&self, request: VehicleRequest) -> Result<ApiResponse<VehicleResponse>, AppError> {
        request.validate()?;
        let name = request.name.trim().to_string();

        if self.repository.name_exists(&name, None).await? {
            return Err(conflict_error("Vehicle", "name", &name));
        }

        let vehicle = self.repository.create(name, request.capacity).await?;
        log::info!("🚛 Vehicle {} created with capacity {}", vehicle.id, vehicle.capacity);

        Ok(ApiResponse::success_with_message(
            vehicle.into(),
            "Vehicle created".to_string(),
        ))
    }

    pub async fn list(&self) -> Result<ApiResponse<Vec<VehicleResponse>>, AppError> {
        let vehicles = self.repository.find_all().await?;
        Ok(ApiResponse::success(
            vehicles.into_iter().map(VehicleResponse::from).collect(),
        ))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<ApiResponse<VehicleResponse>, AppError> {
        let vehicle = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;

        Ok(ApiResponse::success(vehicle.into()))
    }

    pub async fn update(&self, id: i64, request: VehicleRequest) -> Result<ApiResponse<VehicleResponse>, AppError> {
        request.validate()?;
        let name = request.name.trim().to_string();

        if self.repository.name_exists(&name, Some(id)).await? {
            return Err(conflict_error("Vehicle", "name", &name));
        }

        let vehicle = self
            .repository
            .update(id, name, request.capacity)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;

        Ok(ApiResponse::success_with_message(
            vehicle.into(),
            "Vehicle updated".to_string(),
        ))
    }

    /// Delete a vehicle no stored cluster or route refers to
    pub async fn delete(&self, id: i64) -> Result<ApiResponse<()>, AppError> {
        if self.repository.find_by_id(id).await?.is_none() {
            return Err(not_found_error("Vehicle", &id.to_string()));
        }

        let usage = self.repository.usage(id).await?;
        if usage.is_referenced() {
            return Err(AppError::Conflict(format!(
                "Vehicle {} is used by {} cluster stops and {} route stops",
                id, usage.clusters, usage.routes
            )));
        }

        self.repository.delete(id).await?;
        log::info!("🗑️ Vehicle {} deleted", id);
        Ok(ApiResponse::message(format!("Vehicle {} deleted", id)))
    }
}
