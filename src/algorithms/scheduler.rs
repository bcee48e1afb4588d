//! Multi-day scheduling
//!
//! A run is a state machine over working days. Each call to
//! [`Scheduler::plan_day`] consumes the current [`ScheduleState`] and returns
//! the next one together with the [`DayPlan`] to persist. Demand left over at
//! the end of a day moves to the next working day; the run stops when all
//! demand is met or the horizon is used up.

use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::sweep::{ClusterDraft, PendingDemand, SweepClusterer};
use super::travel::TravelLookup;
use crate::config::{EngineConfig, ThresholdPolicy};
use crate::models::daily_demand::DemandStatus;
use crate::models::vehicle::Vehicle;

/// First working day on or after `date`
pub fn next_working_day(date: NaiveDate, off_day: Weekday) -> NaiveDate {
    if date.weekday() == off_day {
        date + Days::new(1)
    } else {
        date
    }
}

/// The `count` working days starting on or after `start`
pub fn working_days(start: NaiveDate, count: usize, off_day: Weekday) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(count);
    let mut date = next_working_day(start, off_day);
    while days.len() < count {
        days.push(date);
        date = next_working_day(date + Days::new(1), off_day);
    }
    days
}

/// Clusters already stored for a date
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterUsage {
    pub count: u32,
    pub last_cluster_id: i32,
}

/// A cluster numbered within its day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedCluster {
    pub cluster_id: i32,
    pub date: NaiveDate,
    pub draft: ClusterDraft,
}

/// Final state of a demand row touched by a day's clusters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandUpdate {
    pub demand_id: i64,
    pub start_quantity: f64,
    pub remaining_quantity: f64,
    pub status: DemandStatus,
    pub cluster_date: NaiveDate,
}

/// A pending demand moved to a later day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarryForward {
    pub demand_id: i64,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub remaining_quantity: f64,
}

/// Why a day stopped producing clusters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayEnd {
    AllDemandMet,
    ClusterCapReached,
    /// A full pass over the fleet assigned nothing
    NoProgress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub clusters: Vec<PlannedCluster>,
    pub updates: Vec<DemandUpdate>,
    pub carried: Vec<CarryForward>,
    pub end: DayEnd,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmetDemand {
    pub demand_id: i64,
    pub location_id: i64,
    pub name: String,
    pub remaining_quantity: f64,
    pub cluster_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyInput {
    NoDemand,
    NoVehicles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialReason {
    HorizonExceeded,
    /// Only demand under the minimum pickup is left
    BelowMinimumPickup,
}

/// Terminal result of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleOutcome {
    NothingToDo { reason: EmptyInput },
    Completed,
    Partial {
        reason: PartialReason,
        unmet: Vec<UnmetDemand>,
    },
}

/// Everything a run knows between two days
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleState {
    pub current_date: NaiveDate,
    pub demands: Vec<PendingDemand>,
    /// Demand under the minimum pickup, left for manual follow-up
    pub set_aside: HashSet<i64>,
    pub days_processed: u32,
    pub usage: BTreeMap<NaiveDate, ClusterUsage>,
}

impl ScheduleState {
    /// Start a run on `start`. Every loaded pending row is scheduled from the
    /// run's first day.
    pub fn new(start: NaiveDate, demands: Vec<PendingDemand>) -> Self {
        let demands = demands
            .into_iter()
            .map(|mut demand| {
                if demand.status == DemandStatus::Pending {
                    demand.cluster_date = start;
                    demand.start_quantity = demand.remaining_quantity;
                }
                demand
            })
            .collect();

        Self {
            current_date: start,
            demands,
            set_aside: HashSet::new(),
            days_processed: 0,
            usage: BTreeMap::new(),
        }
    }

    /// Clusters already stored on the dates this run may touch
    pub fn with_usage(mut self, usage: BTreeMap<NaiveDate, ClusterUsage>) -> Self {
        self.usage = usage;
        self
    }

    fn is_open(&self, demand: &PendingDemand) -> bool {
        demand.status == DemandStatus::Pending
            && demand.remaining_quantity > 0.0
            && !self.set_aside.contains(&demand.id)
    }

    /// Pending demand the run still has to serve
    pub fn open_demand(&self) -> impl Iterator<Item = &PendingDemand> {
        self.demands.iter().filter(|d| self.is_open(d))
    }

    pub fn unmet(&self) -> Vec<UnmetDemand> {
        self.demands
            .iter()
            .filter(|d| d.status == DemandStatus::Pending && d.remaining_quantity > 0.0)
            .map(|d| UnmetDemand {
                demand_id: d.id,
                location_id: d.location_id,
                name: d.name.clone(),
                remaining_quantity: d.remaining_quantity,
                cluster_date: d.cluster_date,
            })
            .collect()
    }

    /// Apply an accepted cluster, returning the updated state
    fn apply(mut self, draft: &ClusterDraft) -> Self {
        for stop in &draft.stops {
            if let Some(demand) = self.demands.iter_mut().find(|d| d.id == stop.demand_id) {
                demand.remaining_quantity = stop.remaining_after.max(0.0);
                if demand.remaining_quantity <= 0.0 {
                    demand.remaining_quantity = 0.0;
                    demand.status = DemandStatus::Done;
                }
            }
        }
        self
    }
}

/// Plans days for a fixed fleet over a precomputed travel lookup
pub struct Scheduler<'a, L: TravelLookup> {
    config: &'a EngineConfig,
    vehicles: &'a [Vehicle],
    clusterer: SweepClusterer<'a, L>,
}

impl<'a, L: TravelLookup> Scheduler<'a, L> {
    pub fn new(config: &'a EngineConfig, vehicles: &'a [Vehicle], travel: &'a L) -> Self {
        Self {
            config,
            vehicles,
            clusterer: SweepClusterer::new(config, travel),
        }
    }

    /// Check the input before any work is done
    pub fn check_input(&self, state: &ScheduleState) -> Option<ScheduleOutcome> {
        if state.open_demand().next().is_none() {
            return Some(ScheduleOutcome::NothingToDo {
                reason: EmptyInput::NoDemand,
            });
        }
        if self.vehicles.is_empty() {
            return Some(ScheduleOutcome::NothingToDo {
                reason: EmptyInput::NoVehicles,
            });
        }
        None
    }

    /// The outcome once the run cannot plan another day, `None` otherwise
    pub fn terminal(&self, state: &ScheduleState) -> Option<ScheduleOutcome> {
        if state.open_demand().next().is_none() {
            if state.set_aside.is_empty() {
                return Some(ScheduleOutcome::Completed);
            }
            return Some(ScheduleOutcome::Partial {
                reason: PartialReason::BelowMinimumPickup,
                unmet: state.unmet(),
            });
        }
        if state.days_processed >= self.config.horizon_days {
            return Some(ScheduleOutcome::Partial {
                reason: PartialReason::HorizonExceeded,
                unmet: state.unmet(),
            });
        }
        None
    }

    /// Plan the next working day
    pub fn plan_day(&self, state: ScheduleState) -> (ScheduleState, DayPlan) {
        let date = next_working_day(state.current_date, self.config.off_day);
        let mut state = state;
        state.current_date = date;

        let mut usage = state.usage.get(&date).copied().unwrap_or_default();
        let mut clusters = Vec::new();
        let mut touched: Vec<i64> = Vec::new();

        let end = loop {
            if !state.open_demand().any(|d| d.is_due(date)) {
                break DayEnd::AllDemandMet;
            }
            if usage.count >= self.config.max_clusters_per_day {
                break DayEnd::ClusterCapReached;
            }

            let mut progress = false;
            for vehicle in self.vehicles {
                if usage.count >= self.config.max_clusters_per_day {
                    break;
                }

                let open: Vec<PendingDemand> = state.open_demand().cloned().collect();
                let draft = self.clusterer.build_cluster(&open, vehicle, date);
                if draft.is_empty() {
                    continue;
                }

                usage.count += 1;
                usage.last_cluster_id += 1;
                log::info!(
                    "🚛 Cluster {} on {}: vehicle {} with {} stops, load {:.2}/{:.2}",
                    usage.last_cluster_id,
                    date,
                    vehicle.name,
                    draft.stops.len(),
                    draft.total_load,
                    draft.capacity
                );

                touched.extend(draft.stops.iter().map(|s| s.demand_id));
                state = state.apply(&draft);
                clusters.push(PlannedCluster {
                    cluster_id: usage.last_cluster_id,
                    date,
                    draft,
                });
                progress = true;
            }

            if !progress {
                break DayEnd::NoProgress;
            }
        };

        state.usage.insert(date, usage);

        let mut updates: Vec<DemandUpdate> = state
            .demands
            .iter()
            .filter(|d| touched.contains(&d.id))
            .map(|d| DemandUpdate {
                demand_id: d.id,
                start_quantity: d.start_quantity,
                remaining_quantity: d.remaining_quantity,
                status: d.status,
                cluster_date: date,
            })
            .collect();

        let next_date = next_working_day(date + Days::new(1), self.config.off_day);
        let mut carried = Vec::new();
        let policy = self.config.minimum_pickup.map(|m| m.policy);

        let mut demands = std::mem::take(&mut state.demands);
        for demand in demands.iter_mut() {
            if !state.is_open(demand) || demand.cluster_date > date {
                continue;
            }
            if touched.contains(&demand.id) {
                demand.cluster_date = date;
            }
            if policy == Some(ThresholdPolicy::SkipPermanently) && self.clusterer.below_minimum(demand) {
                log::info!(
                    "📌 Demand {} below minimum pickup ({:.2} left), set aside",
                    demand.id,
                    demand.remaining_quantity
                );
                state.set_aside.insert(demand.id);
                if !touched.contains(&demand.id) {
                    updates.push(DemandUpdate {
                        demand_id: demand.id,
                        start_quantity: demand.start_quantity,
                        remaining_quantity: demand.remaining_quantity,
                        status: demand.status,
                        cluster_date: demand.cluster_date,
                    });
                }
                continue;
            }

            carried.push(CarryForward {
                demand_id: demand.id,
                from: demand.cluster_date,
                to: next_date,
                remaining_quantity: demand.remaining_quantity,
            });
            demand.cluster_date = next_date;
            demand.start_quantity = demand.remaining_quantity;
        }
        state.demands = demands;
        state.current_date = next_date;
        state.days_processed += 1;

        log::info!(
            "📅 {}: {} clusters, {} demand carried to {} ({:?})",
            date,
            clusters.len(),
            carried.len(),
            next_date,
            end
        );

        (
            state,
            DayPlan {
                date,
                clusters,
                updates,
                carried,
                end,
            },
        )
    }

    /// Plan days until a terminal state, without persistence
    pub fn run(&self, state: ScheduleState) -> (ScheduleOutcome, Vec<DayPlan>, ScheduleState) {
        if let Some(outcome) = self.check_input(&state) {
            return (outcome, Vec::new(), state);
        }

        let mut days = Vec::new();
        let mut state = state;
        loop {
            if let Some(outcome) = self.terminal(&state) {
                return (outcome, days, state);
            }
            let (next, day) = self.plan_day(state);
            days.push(day);
            state = next;
        }
    }
}
