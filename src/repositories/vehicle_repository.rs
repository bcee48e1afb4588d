use sqlx::PgPool;

use crate::models::vehicle::{Vehicle, VehicleUsage};
use crate::utils::errors::AppError;

pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, name: String, capacity: i32) -> Result<Vehicle, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            "INSERT INTO vehicles (name, capacity) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(capacity)
        .fetch_one(&self.pool)
        .await?;

        Ok(vehicle)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(vehicle)
    }

    /// The fleet, largest capacity first
    pub async fn find_all(&self) -> Result<Vec<Vehicle>, AppError> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles ORDER BY capacity DESC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    pub async fn name_exists(&self, name: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM vehicles WHERE name = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(name)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    pub async fn update(&self, id: i64, name: String, capacity: i32) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            "UPDATE vehicles SET name = $2, capacity = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(capacity)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vehicle)
    }

    /// Stored clusters and routes assigned to the vehicle
    pub async fn usage(&self, id: i64) -> Result<VehicleUsage, AppError> {
        let usage = sqlx::query_as::<_, VehicleUsage>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM clusters WHERE vehicle_id = $1) AS clusters,
                (SELECT COUNT(*) FROM cluster_routes WHERE vehicle_id = $1) AS routes
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(usage)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
