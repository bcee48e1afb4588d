use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::location::Location;
use crate::utils::errors::AppError;

/// Fields written on create and update
#[derive(Debug, Clone)]
pub struct LocationFields {
    pub name: String,
    pub address: String,
    pub latitude: Decimal,
    pub longitude: Decimal,
    pub expected_quantity: f64,
    pub bearing: f64,
}

pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, fields: LocationFields) -> Result<Location, AppError> {
        let location = sqlx::query_as::<_, Location>(
            r#"
            INSERT INTO locations (name, address, latitude, longitude, expected_quantity, bearing)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(fields.name)
        .bind(fields.address)
        .bind(fields.latitude)
        .bind(fields.longitude)
        .bind(fields.expected_quantity)
        .bind(fields.bearing)
        .fetch_one(&self.pool)
        .await?;

        Ok(location)
    }

    pub async fn find_all(&self) -> Result<Vec<Location>, AppError> {
        let locations = sqlx::query_as::<_, Location>("SELECT * FROM locations ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(locations)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Location>, AppError> {
        let location = sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(location)
    }

    pub async fn update(&self, id: i64, fields: LocationFields) -> Result<Option<Location>, AppError> {
        let location = sqlx::query_as::<_, Location>(
            r#"
            UPDATE locations
            SET name = $2, address = $3, latitude = $4, longitude = $5,
                expected_quantity = $6, bearing = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fields.name)
        .bind(fields.address)
        .bind(fields.latitude)
        .bind(fields.longitude)
        .bind(fields.expected_quantity)
        .bind(fields.bearing)
        .fetch_optional(&self.pool)
        .await?;

        Ok(location)
    }

    /// Whether any daily demand refers to the location
    pub async fn is_referenced(&self, id: i64) -> Result<bool, AppError> {
        let result: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM daily_demand WHERE location_id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(result.0)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
