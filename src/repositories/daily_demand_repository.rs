use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::daily_demand::DailyDemand;
use crate::models::location::Location;
use crate::utils::errors::{conflict_error, not_found_error, AppError};

pub struct DailyDemandRepository {
    pool: PgPool,
}

impl DailyDemandRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register pickups for `date`, one row per location.
    ///
    /// The whole batch is refused when a location is unknown or already
    /// requested for the date.
    pub async fn create_batch(&self, date: NaiveDate, location_ids: &[i64]) -> Result<Vec<DailyDemand>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(location_ids.len());

        for &location_id in location_ids {
            match insert_demand(&mut tx, date, location_id).await {
                Ok(row) => created.push(row),
                Err(e) => {
                    tx.rollback().await?;
                    return Err(e);
                }
            }
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Demand currently scheduled on `date`
    pub async fn find_by_date(&self, date: NaiveDate) -> Result<Vec<DailyDemand>, AppError> {
        let rows = sqlx::query_as::<_, DailyDemand>(
            "SELECT * FROM daily_demand WHERE cluster_date = $1 ORDER BY bearing DESC, id",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Delete the demand requested for `date` with its clusters and routes
    pub async fn delete_by_date(&self, date: NaiveDate) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM cluster_routes r USING daily_demand d
            WHERE r.daily_demand_id = d.id AND d.origin_date = $1
            "#,
        )
        .bind(date)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM clusters c USING daily_demand d
            WHERE c.daily_demand_id = d.id AND d.origin_date = $1
            "#,
        )
        .bind(date)
        .execute(&mut *tx)
        .await?;

        let deleted = sqlx::query("DELETE FROM daily_demand WHERE origin_date = $1")
            .bind(date)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted)
    }

    /// Delete one demand row with its clusters and routes
    pub async fn delete_by_id(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cluster_routes WHERE daily_demand_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM clusters WHERE daily_demand_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM daily_demand WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }
}

async fn insert_demand(
    tx: &mut Transaction<'static, Postgres>,
    date: NaiveDate,
    location_id: i64,
) -> Result<DailyDemand, AppError> {
    let location = sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE id = $1")
        .bind(location_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| not_found_error("Location", &location_id.to_string()))?;

    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM daily_demand WHERE location_id = $1 AND origin_date = $2)",
    )
    .bind(location_id)
    .bind(date)
    .fetch_one(&mut **tx)
    .await?;

    if exists {
        return Err(conflict_error(
            "Daily demand",
            "location_id",
            &format!("{} on {}", location_id, date),
        ));
    }

    let row = sqlx::query_as::<_, DailyDemand>(
        r#"
        INSERT INTO daily_demand (
            location_id, origin_date, cluster_date, name, address, latitude, longitude,
            bearing, expected_quantity, start_quantity, remaining_quantity, status
        )
        VALUES ($1, $2, $2, $3, $4, $5, $6, $7, $8, $8, $8, 'PENDING')
        RETURNING *
        "#,
    )
    .bind(location.id)
    .bind(date)
    .bind(location.name)
    .bind(location.address)
    .bind(location.latitude)
    .bind(location.longitude)
    .bind(location.bearing)
    .bind(location.expected_quantity)
    .fetch_one(&mut **tx)
    .await?;

    Ok(row)
}
