//! Capacitated sweep clustering
//!
//! Builds one vehicle's trip for a day. Pending demand is visited in
//! descending bearing from the depot and greedily accepted while the truck
//! has room and the working day can still absorb the stop plus the drive
//! back to the depot. A stop may take only part of a demand when the truck
//! fills up; the rest stays pending.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::geometry::Coordinate;
use super::travel::{TravelLeg, TravelLookup};
use crate::config::EngineConfig;
use crate::models::daily_demand::DemandStatus;
use crate::models::vehicle::Vehicle;

/// The engine's view of a daily demand row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingDemand {
    pub id: i64,
    pub location_id: i64,
    pub name: String,
    pub coordinate: Coordinate,
    pub bearing: f64,
    pub expected_quantity: f64,
    /// Remaining quantity at the start of the current day
    pub start_quantity: f64,
    pub remaining_quantity: f64,
    pub cluster_date: NaiveDate,
    pub status: DemandStatus,
}

impl PendingDemand {
    /// Whether the demand can be served on `date`
    pub fn is_due(&self, date: NaiveDate) -> bool {
        self.status == DemandStatus::Pending
            && self.remaining_quantity > 0.0
            && self.cluster_date <= date
    }
}

/// One accepted pickup inside a cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterStop {
    pub demand_id: i64,
    pub location_id: i64,
    pub quantity: f64,
    /// Remaining quantity before this pickup
    pub remaining_before: f64,
    pub remaining_after: f64,
    /// Leg from the previous stop, or from the depot for the first stop
    pub leg: TravelLeg,
    pub travel_hours: f64,
    pub unload_hours: f64,
}

/// One vehicle's trip for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterDraft {
    pub vehicle_id: i64,
    pub vehicle_name: String,
    pub capacity: f64,
    pub stops: Vec<ClusterStop>,
    pub total_load: f64,
    /// Working time including the drive back to the depot
    pub total_hours: f64,
    pub total_distance_km: f64,
    pub return_leg: TravelLeg,
}

impl ClusterDraft {
    fn empty(vehicle: &Vehicle) -> Self {
        Self {
            vehicle_id: vehicle.id,
            vehicle_name: vehicle.name.clone(),
            capacity: vehicle.capacity(),
            stops: Vec::new(),
            total_load: 0.0,
            total_hours: 0.0,
            total_distance_km: 0.0,
            return_leg: TravelLeg::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}

/// Candidates in sweep order: bearing descending, id ascending on ties
pub fn sweep_order(demands: &[PendingDemand]) -> Vec<&PendingDemand> {
    let mut ordered: Vec<&PendingDemand> = demands.iter().collect();
    ordered.sort_by(|a, b| b.bearing.total_cmp(&a.bearing).then(a.id.cmp(&b.id)));
    ordered
}

/// Sweep clusterer over a precomputed travel lookup
pub struct SweepClusterer<'a, L: TravelLookup> {
    config: &'a EngineConfig,
    travel: &'a L,
}

impl<'a, L: TravelLookup> SweepClusterer<'a, L> {
    pub fn new(config: &'a EngineConfig, travel: &'a L) -> Self {
        Self { config, travel }
    }

    /// Whether the remaining quantity is under the configured minimum pickup
    pub fn below_minimum(&self, demand: &PendingDemand) -> bool {
        self.config
            .minimum_pickup
            .map(|minimum| demand.remaining_quantity < minimum.quantity)
            .unwrap_or(false)
    }

    /// Build the trip of `vehicle` on `date` from the demand due that day.
    ///
    /// The returned draft may be empty when nothing fits.
    pub fn build_cluster(
        &self,
        demands: &[PendingDemand],
        vehicle: &Vehicle,
        date: NaiveDate,
    ) -> ClusterDraft {
        let depot = self.config.depot;
        let mut draft = ClusterDraft::empty(vehicle);
        let mut elapsed = 0.0;
        let mut distance = 0.0;
        let mut previous: Option<Coordinate> = None;

        for demand in sweep_order(demands) {
            if !demand.is_due(date) || self.below_minimum(demand) {
                continue;
            }
            if draft.total_load >= draft.capacity {
                break;
            }

            let origin = previous.unwrap_or(depot);
            let Some(leg) = self.travel.leg(origin, demand.coordinate) else {
                log::debug!("⏭️ No estimate to demand {}, skipping", demand.id);
                continue;
            };
            let Some(back) = self.travel.leg(demand.coordinate, depot) else {
                log::debug!("⏭️ No estimate back to depot from demand {}, skipping", demand.id);
                continue;
            };

            let quantity = (draft.capacity - draft.total_load).min(demand.remaining_quantity);
            if quantity <= 0.0 {
                continue;
            }

            let travel_hours = self.config.leg_hours(&leg);
            let unload_hours = self.config.unload.hours(quantity);
            let back_hours = self.config.leg_hours(&back);
            if elapsed + travel_hours + unload_hours + back_hours > self.config.max_work_hours {
                continue;
            }

            elapsed += travel_hours + unload_hours;
            distance += leg.distance_km;
            draft.total_load += quantity;
            draft.stops.push(ClusterStop {
                demand_id: demand.id,
                location_id: demand.location_id,
                quantity,
                remaining_before: demand.remaining_quantity,
                remaining_after: demand.remaining_quantity - quantity,
                leg,
                travel_hours,
                unload_hours,
            });
            previous = Some(demand.coordinate);
        }

        if let Some(last) = previous {
            if let Some(back) = self.travel.leg(last, depot) {
                elapsed += self.config.leg_hours(&back);
                distance += back.distance_km;
                draft.return_leg = back;
            }
        }

        draft.total_hours = elapsed;
        draft.total_distance_km = distance;
        draft
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::config::{MinimumPickup, ThresholdPolicy, UnloadModel};

    #[test]
    fn test_sweep_order_is_bearing_descending() {
        let config = EngineConfig::default();
        let day = date(2025, 3, 3);
        let demands = vec![
            demand(&config, 1, around_depot(&config, 10.0, 5.0), 10.0, day),
            demand(&config, 2, around_depot(&config, 200.0, 5.0), 10.0, day),
            demand(&config, 3, around_depot(&config, 90.0, 5.0), 10.0, day),
        ];

        let ids: Vec<i64> = sweep_order(&demands).iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_partial_pickup_fills_truck() {
        let config = EngineConfig::default();
        let lookup = GridLookup::complete();
        let day = date(2025, 3, 3);
        let demands = vec![
            demand(&config, 1, around_depot(&config, 120.0, 3.0), 60.0, day),
            demand(&config, 2, around_depot(&config, 100.0, 3.0), 60.0, day),
        ];

        let draft = SweepClusterer::new(&config, &lookup).build_cluster(&demands, &vehicle(1, 100), day);

        assert_eq!(draft.stops.len(), 2);
        assert_eq!(draft.stops[0].demand_id, 1);
        assert_eq!(draft.stops[0].quantity, 60.0);
        assert_eq!(draft.stops[1].quantity, 40.0);
        assert_eq!(draft.stops[1].remaining_after, 20.0);
        assert_eq!(draft.total_load, 100.0);
    }

    #[test]
    fn test_time_budget_includes_return_leg() {
        let config = EngineConfig::default();
        let lookup = GridLookup::complete();
        let day = date(2025, 3, 3);
        // 150 km out: 3.75h + 0.5h lights each way plus unloading exceeds 8h
        let demands = vec![
            demand(&config, 1, around_depot(&config, 45.0, 150.0), 10.0, day),
            demand(&config, 2, around_depot(&config, 30.0, 2.0), 10.0, day),
        ];

        let draft = SweepClusterer::new(&config, &lookup).build_cluster(&demands, &vehicle(1, 100), day);

        assert_eq!(draft.stops.len(), 1);
        assert_eq!(draft.stops[0].demand_id, 2);
        assert!(draft.total_hours <= config.max_work_hours);
        assert!(draft.return_leg.distance_km > 0.0);
    }

    #[test]
    fn test_missing_estimate_skips_candidate() {
        let config = EngineConfig::default();
        let day = date(2025, 3, 3);
        let far = around_depot(&config, 90.0, 4.0);
        let near = around_depot(&config, 45.0, 4.0);
        let lookup = GridLookup {
            missing: vec![(config.depot, far)],
        };
        let demands = vec![
            demand(&config, 1, far, 10.0, day),
            demand(&config, 2, near, 10.0, day),
        ];

        let draft = SweepClusterer::new(&config, &lookup).build_cluster(&demands, &vehicle(1, 100), day);

        let ids: Vec<i64> = draft.stops.iter().map(|s| s.demand_id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_future_and_done_demand_is_ignored() {
        let config = EngineConfig::default();
        let lookup = GridLookup::complete();
        let day = date(2025, 3, 3);
        let mut done = demand(&config, 1, around_depot(&config, 90.0, 4.0), 10.0, day);
        done.status = DemandStatus::Done;
        done.remaining_quantity = 0.0;
        let later = demand(&config, 2, around_depot(&config, 80.0, 4.0), 10.0, date(2025, 3, 4));

        let draft = SweepClusterer::new(&config, &lookup).build_cluster(&[done, later], &vehicle(1, 100), day);

        assert!(draft.is_empty());
        assert_eq!(draft.total_hours, 0.0);
    }

    #[test]
    fn test_minimum_pickup_skips_small_demand() {
        let config = EngineConfig {
            minimum_pickup: Some(MinimumPickup {
                quantity: 25.0,
                policy: ThresholdPolicy::SkipForDay,
            }),
            ..EngineConfig::default()
        };
        let lookup = GridLookup::complete();
        let day = date(2025, 3, 3);
        let demands = vec![
            demand(&config, 1, around_depot(&config, 90.0, 4.0), 10.0, day),
            demand(&config, 2, around_depot(&config, 80.0, 4.0), 30.0, day),
        ];

        let draft = SweepClusterer::new(&config, &lookup).build_cluster(&demands, &vehicle(1, 100), day);

        let ids: Vec<i64> = draft.stops.iter().map(|s| s.demand_id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_per_unit_unloading_counts_against_work_day() {
        let flat = EngineConfig::default();
        let per_unit = EngineConfig {
            unload: UnloadModel::PerUnit {
                hours_per_unit: 0.02,
            },
            ..EngineConfig::default()
        };
        let lookup = GridLookup::complete();
        let day = date(2025, 3, 3);
        let demands = vec![demand(&flat, 1, around_depot(&flat, 90.0, 3.0), 500.0, day)];

        let accepted = SweepClusterer::new(&flat, &lookup).build_cluster(&demands, &vehicle(1, 1000), day);
        assert_eq!(accepted.stops.len(), 1);
        assert_eq!(accepted.stops[0].unload_hours, 0.75);

        // 500 units at 0.02 h each is ten hours of loading
        let rejected = SweepClusterer::new(&per_unit, &lookup).build_cluster(&demands, &vehicle(1, 1000), day);
        assert!(rejected.is_empty());
    }
}
