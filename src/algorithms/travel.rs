//! Travel lookups
//!
//! The engine never talks to the network. Estimates are gathered into a
//! [`TravelTable`] and the planners query it through [`TravelLookup`].
//! [`SpeculativeLookup`] lets a planner run before the table is complete and
//! reports which legs it asked for.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::geometry::{haversine_km, pair_key, Coordinate};

/// Duration and road distance of one directed leg
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TravelLeg {
    pub duration_hours: f64,
    pub distance_km: f64,
    /// Stand-in for a leg the provider could not estimate
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub placeholder: bool,
}

impl TravelLeg {
    pub fn new(duration_hours: f64, distance_km: f64) -> Self {
        Self {
            duration_hours,
            distance_km,
            placeholder: false,
        }
    }

    pub fn as_placeholder(self) -> Self {
        Self {
            placeholder: true,
            ..self
        }
    }
}

/// Read access to travel estimates between two points.
///
/// `None` means no estimate is available and the caller must treat the leg
/// as unusable.
pub trait TravelLookup {
    fn leg(&self, from: Coordinate, to: Coordinate) -> Option<TravelLeg>;
}

/// Precomputed estimates keyed by the 6-decimal coordinate pair
#[derive(Debug, Clone, Default)]
pub struct TravelTable {
    legs: HashMap<String, TravelLeg>,
}

impl TravelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: Coordinate, to: Coordinate, leg: TravelLeg) {
        self.legs.insert(pair_key(from, to), leg);
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }
}

impl TravelLookup for TravelTable {
    fn leg(&self, from: Coordinate, to: Coordinate) -> Option<TravelLeg> {
        if from.key() == to.key() {
            return Some(TravelLeg::default());
        }
        self.legs.get(&pair_key(from, to)).copied()
    }
}

/// Lookup over a partially resolved table.
///
/// Known legs come from the table and legs already found unavailable stay
/// `None`. Any other leg is recorded as wanted and answered with a
/// straight-line guess so the planner can carry on.
pub struct SpeculativeLookup<'a> {
    table: &'a TravelTable,
    unavailable: &'a HashSet<String>,
    speed_kmh: f64,
    wanted: RefCell<Vec<(Coordinate, Coordinate)>>,
    seen: RefCell<HashSet<String>>,
}

impl<'a> SpeculativeLookup<'a> {
    pub fn new(table: &'a TravelTable, unavailable: &'a HashSet<String>, speed_kmh: f64) -> Self {
        Self {
            table,
            unavailable,
            speed_kmh,
            wanted: RefCell::new(Vec::new()),
            seen: RefCell::new(HashSet::new()),
        }
    }

    /// Unresolved legs in the order the planner first asked for them
    pub fn into_wanted(self) -> Vec<(Coordinate, Coordinate)> {
        self.wanted.into_inner()
    }
}

impl TravelLookup for SpeculativeLookup<'_> {
    fn leg(&self, from: Coordinate, to: Coordinate) -> Option<TravelLeg> {
        if let Some(leg) = self.table.leg(from, to) {
            return Some(leg);
        }
        let key = pair_key(from, to);
        if self.unavailable.contains(&key) {
            return None;
        }
        if self.seen.borrow_mut().insert(key) {
            self.wanted.borrow_mut().push((from, to));
        }
        let km = haversine_km(from, to);
        Some(TravelLeg::new(km / self.speed_kmh, km))
    }
}
