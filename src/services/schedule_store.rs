//! Schedule persistence seam
//!
//! The clustering and routing services only see these traits. Every write
//! goes through a [`ScheduleTransaction`], so a day batch or a route
//! regeneration is either stored completely or not at all.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::algorithms::scheduler::{ClusterUsage, DemandUpdate};
use crate::models::cluster::{ClusterAssignment, NewCluster};
use crate::models::cluster_route::{NewClusterRoute, RouteReportRow};
use crate::models::daily_demand::DailyDemand;
use crate::models::vehicle::Vehicle;
use crate::utils::AppResult;

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Pending demand requested for, or currently scheduled on, `date`
    async fn load_pending_demand(&self, date: NaiveDate) -> AppResult<Vec<DailyDemand>>;

    /// The fleet, largest capacity first
    async fn load_vehicles(&self) -> AppResult<Vec<Vehicle>>;

    /// Stored cluster count and highest cluster id for each of `dates`
    async fn cluster_usage(&self, dates: &[NaiveDate]) -> AppResult<BTreeMap<NaiveDate, ClusterUsage>>;

    /// Stored clusters of demand requested for `date`, whatever day they run on
    async fn assignments_for_origin(&self, date: NaiveDate) -> AppResult<Vec<ClusterAssignment>>;

    /// Whether demand was requested for `date` after it was last clustered
    async fn has_new_demand(&self, date: NaiveDate) -> AppResult<bool>;

    /// Stored clusters running on `date`
    async fn assignments_on(&self, date: NaiveDate) -> AppResult<Vec<ClusterAssignment>>;

    async fn report_routes(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> AppResult<Vec<RouteReportRow>>;

    async fn begin(&self) -> AppResult<Box<dyn ScheduleTransaction>>;
}

#[async_trait]
pub trait ScheduleTransaction: Send {
    /// Drop the clusters and routes of demand requested for `date` and
    /// restore that demand to its requested quantity
    async fn reset_origin(&mut self, date: NaiveDate) -> AppResult<u64>;

    async fn save_cluster(&mut self, cluster: &NewCluster) -> AppResult<()>;

    async fn update_demand(&mut self, update: &DemandUpdate) -> AppResult<()>;

    /// Move a pending demand to `date`, resetting its start-of-day quantity
    async fn advance_demand_date(&mut self, demand_id: i64, date: NaiveDate) -> AppResult<()>;

    async fn delete_routes(&mut self, date: NaiveDate, optimized: bool) -> AppResult<u64>;

    async fn save_route(&mut self, route: &NewClusterRoute) -> AppResult<()>;

    async fn mark_collected(&mut self, location_id: i64) -> AppResult<()>;

    async fn commit(self: Box<Self>) -> AppResult<()>;

    async fn rollback(self: Box<Self>) -> AppResult<()>;
}
