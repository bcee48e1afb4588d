//! Planning engine
//!
//! Pure, synchronous planning code. All travel estimates are resolved before
//! the engine runs, so nothing here performs I/O.

pub mod geometry;
pub mod scheduler;
pub mod sweep;
pub mod tour;
pub mod travel;

pub use geometry::{bearing, format_hours, Coordinate};
pub use scheduler::{DayEnd, DayPlan, ScheduleOutcome, ScheduleState, Scheduler};
pub use sweep::{ClusterDraft, PendingDemand, SweepClusterer};
pub use tour::{SequenceMode, TourPlan, Waypoint};
pub use travel::{TravelLeg, TravelLookup, TravelTable};
