//! Clustering service
//!
//! Runs the multi-day scheduler for a date and persists each planned day in
//! its own transaction. A failed day batch is rolled back and aborts the run;
//! days committed before it stay stored.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use super::schedule_store::{ScheduleStore, ScheduleTransaction};
use super::travel_estimator::{LegResolver, TravelEstimator};
use crate::algorithms::geometry::Coordinate;
use crate::algorithms::scheduler::{working_days, DayPlan, ScheduleOutcome, ScheduleState, Scheduler};
use crate::algorithms::sweep::PendingDemand;
use crate::algorithms::travel::TravelTable;
use crate::config::EngineConfig;
use crate::models::cluster::{ClusterAssignment, NewCluster};
use crate::models::daily_demand::DailyDemand;
use crate::utils::AppResult;

/// Result of a scheduling run
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleReport {
    pub run_id: Uuid,
    pub start_date: NaiveDate,
    /// Whether the planned days were written to the store
    pub persisted: bool,
    pub outcome: ScheduleOutcome,
    pub days: Vec<DayPlan>,
    /// The demand rows the run started from, by id
    pub demand: HashMap<i64, DailyDemand>,
}

#[derive(Debug, Clone)]
pub enum ClusteringResult {
    /// Clusters were already stored and no demand arrived since
    Stored(Vec<ClusterAssignment>),
    Scheduled(ScheduleReport),
}

pub struct ClusteringService {
    store: Arc<dyn ScheduleStore>,
    estimator: Arc<dyn TravelEstimator>,
    config: Arc<EngineConfig>,
}

impl ClusteringService {
    pub fn new(
        store: Arc<dyn ScheduleStore>,
        estimator: Arc<dyn TravelEstimator>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            store,
            estimator,
            config,
        }
    }

    /// Cluster the demand requested for `date`.
    ///
    /// Stored clusters are returned as they are unless new demand was added
    /// for the date since; in that case they are reset and the date is
    /// clustered again.
    pub async fn run_clustering(&self, date: NaiveDate) -> AppResult<ClusteringResult> {
        let existing = self.store.assignments_for_origin(date).await?;

        if !existing.is_empty() {
            if !self.store.has_new_demand(date).await? {
                log::info!("📦 Returning {} stored cluster stops for {}", existing.len(), date);
                return Ok(ClusteringResult::Stored(existing));
            }

            log::info!("🔄 New demand for {}, resetting stored clusters", date);
            let mut tx = self.store.begin().await?;
            match tx.reset_origin(date).await {
                Ok(reset) => {
                    tx.commit().await?;
                    log::info!("✅ Reset {} demand rows for {}", reset, date);
                }
                Err(e) => {
                    rollback(tx).await;
                    return Err(e);
                }
            }
        }

        self.schedule(date, true).await.map(ClusteringResult::Scheduled)
    }

    /// Plan the demand for `date` without writing anything
    pub async fn preview(&self, date: NaiveDate) -> AppResult<ScheduleReport> {
        self.schedule(date, false).await
    }

    async fn schedule(&self, date: NaiveDate, persist: bool) -> AppResult<ScheduleReport> {
        let run_id = Uuid::new_v4();
        let config = self.config.as_ref();

        let rows = self.store.load_pending_demand(date).await?;
        let vehicles = self.store.load_vehicles().await?;
        let demands = rows
            .iter()
            .map(PendingDemand::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        log::info!(
            "🚀 Run {} from {}: {} pending demand, {} vehicles",
            run_id,
            date,
            demands.len(),
            vehicles.len()
        );

        let demand: HashMap<i64, DailyDemand> = rows.into_iter().map(|row| (row.id, row)).collect();
        let state = ScheduleState::new(date, demands);

        let empty = TravelTable::new();
        if let Some(outcome) = Scheduler::new(config, &vehicles, &empty).check_input(&state) {
            log::info!("💤 Run {}: nothing to do ({:?})", run_id, outcome);
            return Ok(ScheduleReport {
                run_id,
                start_date: date,
                persisted: false,
                outcome,
                days: Vec::new(),
                demand,
            });
        }

        let dates = working_days(date, config.horizon_days as usize, config.off_day);
        let usage = self.store.cluster_usage(&dates).await?;

        let state = state.with_usage(usage);

        let depot = config.depot;
        let stops: Vec<Coordinate> = state.open_demand().map(|d| d.coordinate).collect();
        let mut resolver = LegResolver::new(self.estimator.as_ref(), config);
        resolver
            .fetch(stops.iter().flat_map(|&stop| [(depot, stop), (stop, depot)]))
            .await;
        resolver
            .resolve(|lookup| Scheduler::new(config, &vehicles, lookup).run(state.clone()))
            .await;
        let table = resolver.into_table();

        let scheduler = Scheduler::new(config, &vehicles, &table);

        let (outcome, days) = if persist {
            let mut state = state;
            let mut days = Vec::new();
            let outcome = loop {
                if let Some(outcome) = scheduler.terminal(&state) {
                    break outcome;
                }
                let (next, day) = scheduler.plan_day(state);
                self.persist_day(run_id, &day).await?;
                days.push(day);
                state = next;
            };
            (outcome, days)
        } else {
            let (outcome, days, _) = scheduler.run(state);
            (outcome, days)
        };

        log::info!(
            "🏁 Run {} finished after {} days: {:?}",
            run_id,
            days.len(),
            outcome
        );

        Ok(ScheduleReport {
            run_id,
            start_date: date,
            persisted: persist,
            outcome,
            days,
            demand,
        })
    }

    async fn persist_day(&self, run_id: Uuid, day: &DayPlan) -> AppResult<()> {
        let mut tx = self.store.begin().await?;

        match write_day(tx.as_mut(), day).await {
            Ok(()) => {
                tx.commit().await?;
                log::info!("💾 Run {}: stored {} clusters for {}", run_id, day.clusters.len(), day.date);
                Ok(())
            }
            Err(e) => {
                log::error!("❌ Run {}: storing {} failed, rolling back: {}", run_id, day.date, e);
                rollback(tx).await;
                Err(e)
            }
        }
    }
}

async fn write_day(tx: &mut dyn ScheduleTransaction, day: &DayPlan) -> AppResult<()> {
    for cluster in &day.clusters {
        for stop in &cluster.draft.stops {
            tx.save_cluster(&NewCluster {
                cluster_id: cluster.cluster_id,
                cluster_date: cluster.date,
                vehicle_id: cluster.draft.vehicle_id,
                daily_demand_id: stop.demand_id,
                carried_quantity: stop.quantity,
                start_quantity: stop.remaining_before,
                remaining_quantity: stop.remaining_after,
                travel_hours: stop.travel_hours,
                unload_hours: stop.unload_hours,
                distance_km: stop.leg.distance_km,
            })
            .await?;
        }
    }

    for update in &day.updates {
        tx.update_demand(update).await?;
    }

    for carry in &day.carried {
        tx.advance_demand_date(carry.demand_id, carry.to).await?;
    }

    Ok(())
}

/// Roll back, logging instead of masking the original failure
pub(crate) async fn rollback(tx: Box<dyn ScheduleTransaction>) {
    if let Err(e) = tx.rollback().await {
        log::error!("❌ Rollback failed: {}", e);
    }
}

impl ClusteringResult {
    pub fn is_stored(&self) -> bool {
        matches!(self, ClusteringResult::Stored(_))
    }
}
