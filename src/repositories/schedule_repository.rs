use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};

use crate::algorithms::scheduler::{ClusterUsage, DemandUpdate};
use crate::models::cluster::{ClusterAssignment, NewCluster};
use crate::models::cluster_route::{NewClusterRoute, RouteReportRow};
use crate::models::daily_demand::{DailyDemand, DemandStatus};
use crate::models::vehicle::Vehicle;
use crate::services::schedule_store::{ScheduleStore, ScheduleTransaction};
use crate::utils::errors::AppResult;

const ASSIGNMENT_COLUMNS: &str = r#"
    c.id, c.cluster_id, c.cluster_date, c.vehicle_id, v.name AS vehicle_name,
    c.daily_demand_id, d.location_id, d.name, d.address, d.latitude, d.longitude,
    d.bearing, d.expected_quantity, c.carried_quantity, c.start_quantity,
    c.remaining_quantity, c.travel_hours, c.unload_hours, c.distance_km, d.status
"#;

/// PostgreSQL implementation of the schedule store
#[derive(Clone)]
pub struct PgScheduleStore {
    pool: PgPool,
}

impl PgScheduleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduleStore for PgScheduleStore {
    async fn load_pending_demand(&self, date: NaiveDate) -> AppResult<Vec<DailyDemand>> {
        let rows = sqlx::query_as::<_, DailyDemand>(
            r#"
            SELECT * FROM daily_demand
            WHERE status = $2 AND (origin_date = $1 OR cluster_date = $1)
            ORDER BY bearing DESC, id
            "#,
        )
        .bind(date)
        .bind(DemandStatus::Pending)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn load_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            "SELECT * FROM vehicles ORDER BY capacity DESC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    async fn cluster_usage(&self, dates: &[NaiveDate]) -> AppResult<BTreeMap<NaiveDate, ClusterUsage>> {
        let rows: Vec<(NaiveDate, i64, i32)> = sqlx::query_as(
            r#"
            SELECT cluster_date, COUNT(DISTINCT cluster_id), COALESCE(MAX(cluster_id), 0)
            FROM clusters
            WHERE cluster_date = ANY($1)
            GROUP BY cluster_date
            "#,
        )
        .bind(dates)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(date, count, last)| {
                (
                    date,
                    ClusterUsage {
                        count: u32::try_from(count).unwrap_or(u32::MAX),
                        last_cluster_id: last,
                    },
                )
            })
            .collect())
    }

    async fn assignments_for_origin(&self, date: NaiveDate) -> AppResult<Vec<ClusterAssignment>> {
        let query = format!(
            r#"
            SELECT {ASSIGNMENT_COLUMNS}
            FROM clusters c
            JOIN daily_demand d ON d.id = c.daily_demand_id
            JOIN vehicles v ON v.id = c.vehicle_id
            WHERE d.origin_date = $1
            ORDER BY c.cluster_date, c.cluster_id, c.id
            "#
        );
        let rows = sqlx::query_as::<_, ClusterAssignment>(&query)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn has_new_demand(&self, date: NaiveDate) -> AppResult<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM daily_demand d
                WHERE d.origin_date = $1
                  AND NOT EXISTS (SELECT 1 FROM clusters c WHERE c.daily_demand_id = d.id)
                  AND d.created_at > COALESCE(
                      (SELECT MAX(c.created_at)
                       FROM clusters c
                       JOIN daily_demand x ON x.id = c.daily_demand_id
                       WHERE x.origin_date = $1),
                      '-infinity'::timestamptz)
            )
            "#,
        )
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn assignments_on(&self, date: NaiveDate) -> AppResult<Vec<ClusterAssignment>> {
        let query = format!(
            r#"
            SELECT {ASSIGNMENT_COLUMNS}
            FROM clusters c
            JOIN daily_demand d ON d.id = c.daily_demand_id
            JOIN vehicles v ON v.id = c.vehicle_id
            WHERE c.cluster_date = $1
            ORDER BY c.cluster_id, c.id
            "#
        );
        let rows = sqlx::query_as::<_, ClusterAssignment>(&query)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn report_routes(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> AppResult<Vec<RouteReportRow>> {
        let rows = sqlx::query_as::<_, RouteReportRow>(
            r#"
            SELECT r.cluster_id, r.cluster_date, r.order_no, r.vehicle_id, v.name AS vehicle_name,
                   r.daily_demand_id, d.name, d.address, d.expected_quantity, r.carried_quantity,
                   r.travel_hours, r.unload_hours, r.distance_km, r.optimized
            FROM cluster_routes r
            JOIN daily_demand d ON d.id = r.daily_demand_id
            JOIN vehicles v ON v.id = r.vehicle_id
            WHERE ($1::DATE IS NULL OR r.cluster_date >= $1)
              AND ($2::DATE IS NULL OR r.cluster_date <= $2)
            ORDER BY r.cluster_date, r.optimized DESC, r.cluster_id, r.order_no
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn begin(&self) -> AppResult<Box<dyn ScheduleTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgScheduleTransaction { tx }))
    }
}

pub struct PgScheduleTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ScheduleTransaction for PgScheduleTransaction {
    async fn reset_origin(&mut self, date: NaiveDate) -> AppResult<u64> {
        sqlx::query(
            r#"
            DELETE FROM cluster_routes
            WHERE cluster_date IN (
                SELECT DISTINCT c.cluster_date
                FROM clusters c
                JOIN daily_demand d ON d.id = c.daily_demand_id
                WHERE d.origin_date = $1
            )
            "#,
        )
        .bind(date)
        .execute(&mut *self.tx)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM clusters c USING daily_demand d
            WHERE c.daily_demand_id = d.id AND d.origin_date = $1
            "#,
        )
        .bind(date)
        .execute(&mut *self.tx)
        .await?;

        let reset = sqlx::query(
            r#"
            UPDATE daily_demand
            SET start_quantity = expected_quantity,
                remaining_quantity = expected_quantity,
                cluster_date = origin_date,
                status = $2
            WHERE origin_date = $1
            "#,
        )
        .bind(date)
        .bind(DemandStatus::Pending)
        .execute(&mut *self.tx)
        .await?
        .rows_affected();

        Ok(reset)
    }

    async fn save_cluster(&mut self, cluster: &NewCluster) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO clusters (
                cluster_id, cluster_date, vehicle_id, daily_demand_id, carried_quantity,
                start_quantity, remaining_quantity, travel_hours, unload_hours, distance_km
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(cluster.cluster_id)
        .bind(cluster.cluster_date)
        .bind(cluster.vehicle_id)
        .bind(cluster.daily_demand_id)
        .bind(cluster.carried_quantity)
        .bind(cluster.start_quantity)
        .bind(cluster.remaining_quantity)
        .bind(cluster.travel_hours)
        .bind(cluster.unload_hours)
        .bind(cluster.distance_km)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn update_demand(&mut self, update: &DemandUpdate) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE daily_demand
            SET start_quantity = $2, remaining_quantity = $3, status = $4, cluster_date = $5
            WHERE id = $1
            "#,
        )
        .bind(update.demand_id)
        .bind(update.start_quantity)
        .bind(update.remaining_quantity)
        .bind(update.status)
        .bind(update.cluster_date)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn advance_demand_date(&mut self, demand_id: i64, date: NaiveDate) -> AppResult<()> {
        sqlx::query(
            "UPDATE daily_demand SET cluster_date = $2, start_quantity = remaining_quantity WHERE id = $1",
        )
        .bind(demand_id)
        .bind(date)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn delete_routes(&mut self, date: NaiveDate, optimized: bool) -> AppResult<u64> {
        let deleted = sqlx::query("DELETE FROM cluster_routes WHERE cluster_date = $1 AND optimized = $2")
            .bind(date)
            .bind(optimized)
            .execute(&mut *self.tx)
            .await?
            .rows_affected();

        Ok(deleted)
    }

    async fn save_route(&mut self, route: &NewClusterRoute) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO cluster_routes (
                cluster_id, cluster_date, vehicle_id, daily_demand_id, order_no,
                carried_quantity, travel_hours, unload_hours, distance_km, optimized
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(route.cluster_id)
        .bind(route.cluster_date)
        .bind(route.vehicle_id)
        .bind(route.daily_demand_id)
        .bind(route.order_no)
        .bind(route.carried_quantity)
        .bind(route.travel_hours)
        .bind(route.unload_hours)
        .bind(route.distance_km)
        .bind(route.optimized)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn mark_collected(&mut self, location_id: i64) -> AppResult<()> {
        sqlx::query("UPDATE locations SET collected = TRUE WHERE id = $1")
            .bind(location_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
