//! Tour sequencing
//!
//! Orders the stops of a cluster into a visiting sequence that starts and
//! ends at the depot. The optimized mode is a greedy nearest-neighbor walk;
//! the plain mode keeps the sweep order.

use serde::{Deserialize, Serialize};

use super::geometry::Coordinate;
use super::travel::{TravelLeg, TravelLookup};
use crate::config::EngineConfig;

/// Anything that can be placed on a tour
pub trait Waypoint {
    fn coordinate(&self) -> Coordinate;
    fn bearing(&self) -> f64;
    fn quantity(&self) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceMode {
    NearestNeighbor,
    BearingSweep,
}

impl SequenceMode {
    pub fn from_optimized(optimized: bool) -> Self {
        if optimized {
            SequenceMode::NearestNeighbor
        } else {
            SequenceMode::BearingSweep
        }
    }

    pub fn is_optimized(&self) -> bool {
        matches!(self, SequenceMode::NearestNeighbor)
    }
}

/// One visited stop of a tour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourLeg {
    /// Index of the stop in the input slice
    pub index: usize,
    /// 1-based visiting position
    pub order_no: i32,
    /// Leg from the previous stop, zero when no estimate exists
    pub leg: TravelLeg,
    pub estimated: bool,
    pub travel_hours: f64,
    pub unload_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourPlan {
    pub legs: Vec<TourLeg>,
    pub return_leg: TravelLeg,
    pub return_hours: f64,
    pub total_hours: f64,
    pub total_distance_km: f64,
}

/// Greedy nearest-neighbor order starting at the depot.
///
/// Legs without an estimate cost infinity. Ties keep the stop that comes
/// first in the input, and every stop is visited even when all remaining
/// legs are unknown.
pub fn nearest_neighbor_order<W: Waypoint, L: TravelLookup>(
    stops: &[W],
    depot: Coordinate,
    travel: &L,
    cost: impl Fn(&TravelLeg) -> f64,
) -> Vec<usize> {
    let mut unvisited: Vec<usize> = (0..stops.len()).collect();
    let mut order = Vec::with_capacity(stops.len());
    let mut current = depot;

    while !unvisited.is_empty() {
        let mut best_pos = 0;
        let mut best_cost = f64::INFINITY;
        for (pos, &index) in unvisited.iter().enumerate() {
            let candidate = travel
                .leg(current, stops[index].coordinate())
                .map(|leg| cost(&leg))
                .unwrap_or(f64::INFINITY);
            if candidate < best_cost {
                best_cost = candidate;
                best_pos = pos;
            }
        }

        let next = unvisited.remove(best_pos);
        current = stops[next].coordinate();
        order.push(next);
    }

    order
}

/// Sweep order: bearing descending, input order on ties
pub fn bearing_order<W: Waypoint>(stops: &[W]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..stops.len()).collect();
    order.sort_by(|&a, &b| stops[b].bearing().total_cmp(&stops[a].bearing()));
    order
}

/// Sequence `stops` and cost every leg of the resulting tour
pub fn sequence<W: Waypoint, L: TravelLookup>(
    stops: &[W],
    mode: SequenceMode,
    config: &EngineConfig,
    travel: &L,
) -> TourPlan {
    let order = match mode {
        SequenceMode::NearestNeighbor => {
            let metric = config.tour_metric;
            nearest_neighbor_order(stops, config.depot, travel, |leg| metric.cost(leg))
        }
        SequenceMode::BearingSweep => bearing_order(stops),
    };

    let mut legs = Vec::with_capacity(order.len());
    let mut total_hours = 0.0;
    let mut total_distance_km = 0.0;
    let mut current = config.depot;

    for (position, index) in order.into_iter().enumerate() {
        let stop = &stops[index];
        let estimate = travel.leg(current, stop.coordinate());
        if estimate.is_none() {
            log::warn!("⚠️ No travel estimate for tour leg to stop {}", index);
        }
        let leg = estimate.unwrap_or_default();
        let travel_hours = config.leg_hours(&leg);
        let unload_hours = config.unload.hours(stop.quantity());

        total_hours += travel_hours + unload_hours;
        total_distance_km += leg.distance_km;
        legs.push(TourLeg {
            index,
            order_no: position as i32 + 1,
            leg,
            estimated: estimate.is_some(),
            travel_hours,
            unload_hours,
        });
        current = stop.coordinate();
    }

    let (return_leg, return_hours) = if legs.is_empty() {
        (TravelLeg::default(), 0.0)
    } else {
        let leg = travel.leg(current, config.depot).unwrap_or_default();
        (leg, config.leg_hours(&leg))
    };
    total_hours += return_hours;
    total_distance_km += return_leg.distance_km;

    TourPlan {
        legs,
        return_leg,
        return_hours,
        total_hours,
        total_distance_km,
    }
}
