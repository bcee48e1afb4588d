use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::algorithms::format_hours;
use crate::algorithms::scheduler::{DayEnd, EmptyInput, PartialReason, ScheduleOutcome};
use crate::models::cluster::ClusterAssignment;
use crate::models::cluster_route::RouteReportRow;
use crate::models::daily_demand::DemandStatus;
use crate::services::clustering_service::{ClusteringResult, ScheduleReport};
use crate::services::route_service::ClusterTour;

// Query of the clustering endpoint
#[derive(Debug, Deserialize)]
pub struct ClusteringQuery {
    pub date: Option<String>,
    /// Plan without storing anything
    pub dry_run: Option<bool>,
}

// Query of the route generation endpoint
#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    pub date: Option<String>,
    pub optimized: Option<bool>,
}

// Query of the route report endpoint
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusteringSource {
    Stored,
    Computed,
    Preview,
}

#[derive(Debug, Serialize)]
pub struct ClusterStopResponse {
    pub daily_demand_id: i64,
    pub location_id: i64,
    pub name: String,
    pub address: String,
    pub carried_quantity: f64,
    pub start_quantity: f64,
    pub remaining_quantity: f64,
    pub status: DemandStatus,
    pub travel_hours: f64,
    pub travel_time: String,
    pub unload_hours: f64,
    pub distance_km: f64,
}

#[derive(Debug, Serialize)]
pub struct ClusterResponse {
    pub cluster_id: i32,
    pub vehicle_id: i64,
    pub vehicle_name: String,
    pub total_load: f64,
    pub total_hours: f64,
    pub total_time: String,
    pub total_distance_km: f64,
    pub stops: Vec<ClusterStopResponse>,
}

#[derive(Debug, Serialize)]
pub struct DayResponse {
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DayEnd>,
    pub carried_forward: usize,
    pub clusters: Vec<ClusterResponse>,
}

#[derive(Debug, Serialize)]
pub struct ClusteringResponse {
    pub source: ClusteringSource,
    pub start_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ScheduleOutcome>,
    pub total_clusters: usize,
    pub total_load: f64,
    pub days: Vec<DayResponse>,
}

impl ClusteringResponse {
    pub fn from_result(date: NaiveDate, result: ClusteringResult) -> Self {
        match result {
            ClusteringResult::Stored(assignments) => Self::from_stored(date, assignments),
            ClusteringResult::Scheduled(report) => Self::from_report(report),
        }
    }

    /// Group stored cluster stops by day and cluster. Stored totals cover
    /// the legs to each stop; the drive back to the depot is not stored.
    pub fn from_stored(date: NaiveDate, assignments: Vec<ClusterAssignment>) -> Self {
        let mut grouped: BTreeMap<NaiveDate, BTreeMap<i32, Vec<ClusterAssignment>>> = BTreeMap::new();
        for row in assignments {
            grouped
                .entry(row.cluster_date)
                .or_default()
                .entry(row.cluster_id)
                .or_default()
                .push(row);
        }

        let days: Vec<DayResponse> = grouped
            .into_iter()
            .map(|(day, clusters)| DayResponse {
                date: day,
                end: None,
                carried_forward: 0,
                clusters: clusters
                    .into_iter()
                    .filter_map(|(cluster_id, rows)| {
                        let first = rows.first()?;
                        let total_hours: f64 = rows.iter().map(|r| r.travel_hours + r.unload_hours).sum();
                        Some(ClusterResponse {
                            cluster_id,
                            vehicle_id: first.vehicle_id,
                            vehicle_name: first.vehicle_name.clone(),
                            total_load: rows.iter().map(|r| r.carried_quantity).sum(),
                            total_hours,
                            total_time: format_hours(total_hours),
                            total_distance_km: rows.iter().map(|r| r.distance_km).sum(),
                            stops: rows.into_iter().map(stop_from_assignment).collect(),
                        })
                    })
                    .collect(),
            })
            .collect();

        Self::assemble(ClusteringSource::Stored, date, None, None, days)
    }

    pub fn from_report(report: ScheduleReport) -> Self {
        let source = if report.persisted {
            ClusteringSource::Computed
        } else {
            ClusteringSource::Preview
        };

        let days: Vec<DayResponse> = report
            .days
            .iter()
            .map(|day| DayResponse {
                date: day.date,
                end: Some(day.end),
                carried_forward: day.carried.len(),
                clusters: day
                    .clusters
                    .iter()
                    .map(|cluster| ClusterResponse {
                        cluster_id: cluster.cluster_id,
                        vehicle_id: cluster.draft.vehicle_id,
                        vehicle_name: cluster.draft.vehicle_name.clone(),
                        total_load: cluster.draft.total_load,
                        total_hours: cluster.draft.total_hours,
                        total_time: format_hours(cluster.draft.total_hours),
                        total_distance_km: cluster.draft.total_distance_km,
                        stops: cluster
                            .draft
                            .stops
                            .iter()
                            .map(|stop| {
                                let row = report.demand.get(&stop.demand_id);
                                ClusterStopResponse {
                                    daily_demand_id: stop.demand_id,
                                    location_id: stop.location_id,
                                    name: row.map(|r| r.name.clone()).unwrap_or_default(),
                                    address: row.map(|r| r.address.clone()).unwrap_or_default(),
                                    carried_quantity: stop.quantity,
                                    start_quantity: stop.remaining_before,
                                    remaining_quantity: stop.remaining_after,
                                    status: if stop.remaining_after <= 0.0 {
                                        DemandStatus::Done
                                    } else {
                                        DemandStatus::Pending
                                    },
                                    travel_hours: stop.travel_hours,
                                    travel_time: format_hours(stop.travel_hours),
                                    unload_hours: stop.unload_hours,
                                    distance_km: stop.leg.distance_km,
                                }
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Self::assemble(
            source,
            report.start_date,
            Some(report.run_id),
            Some(report.outcome),
            days,
        )
    }

    fn assemble(
        source: ClusteringSource,
        start_date: NaiveDate,
        run_id: Option<Uuid>,
        outcome: Option<ScheduleOutcome>,
        days: Vec<DayResponse>,
    ) -> Self {
        let clusters = days.iter().flat_map(|d| d.clusters.iter());
        let total_clusters = clusters.clone().count();
        let total_load = clusters.map(|c| c.total_load).sum();

        Self {
            source,
            start_date,
            run_id,
            outcome,
            total_clusters,
            total_load,
            days,
        }
    }

    /// Summary line for the response envelope
    pub fn message(&self) -> String {
        match &self.outcome {
            None => format!("{} stored clusters returned", self.total_clusters),
            Some(ScheduleOutcome::Completed) => format!(
                "All demand scheduled in {} clusters over {} days",
                self.total_clusters,
                self.days.len()
            ),
            Some(ScheduleOutcome::NothingToDo { reason: EmptyInput::NoDemand }) => {
                format!("No pending demand for {}", self.start_date)
            }
            Some(ScheduleOutcome::NothingToDo { reason: EmptyInput::NoVehicles }) => {
                "No vehicles available".to_string()
            }
            Some(ScheduleOutcome::Partial { reason, unmet }) => {
                let left: f64 = unmet.iter().map(|u| u.remaining_quantity).sum();
                let why = match reason {
                    PartialReason::HorizonExceeded => "planning horizon reached",
                    PartialReason::BelowMinimumPickup => "below the minimum pickup",
                };
                format!(
                    "{} demand rows ({:.2} units) left unscheduled: {}",
                    unmet.len(),
                    left,
                    why
                )
            }
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self.outcome, Some(ScheduleOutcome::Partial { .. }))
    }
}

fn stop_from_assignment(row: ClusterAssignment) -> ClusterStopResponse {
    ClusterStopResponse {
        daily_demand_id: row.daily_demand_id,
        location_id: row.location_id,
        status: if row.remaining_quantity <= 0.0 {
            DemandStatus::Done
        } else {
            DemandStatus::Pending
        },
        name: row.name,
        address: row.address,
        carried_quantity: row.carried_quantity,
        start_quantity: row.start_quantity,
        remaining_quantity: row.remaining_quantity,
        travel_hours: row.travel_hours,
        travel_time: format_hours(row.travel_hours),
        unload_hours: row.unload_hours,
        distance_km: row.distance_km,
    }
}

#[derive(Debug, Serialize)]
pub struct RouteStopResponse {
    pub order_no: i32,
    pub daily_demand_id: i64,
    pub location_id: i64,
    pub name: String,
    pub address: String,
    pub carried_quantity: f64,
    pub travel_hours: f64,
    pub travel_time: String,
    pub unload_hours: f64,
    pub distance_km: f64,
    /// False when no travel estimate existed for the leg
    pub estimated: bool,
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub cluster_id: i32,
    pub vehicle_id: i64,
    pub vehicle_name: String,
    pub total_load: f64,
    pub total_hours: f64,
    pub total_time: String,
    pub total_distance_km: f64,
    pub return_distance_km: f64,
    pub return_time: String,
    pub stops: Vec<RouteStopResponse>,
}

impl From<ClusterTour> for RouteResponse {
    fn from(tour: ClusterTour) -> Self {
        let stops = tour
            .plan
            .legs
            .iter()
            .map(|leg| {
                let row = &tour.stops[leg.index].assignment;
                RouteStopResponse {
                    order_no: leg.order_no,
                    daily_demand_id: row.daily_demand_id,
                    location_id: row.location_id,
                    name: row.name.clone(),
                    address: row.address.clone(),
                    carried_quantity: row.carried_quantity,
                    travel_hours: leg.travel_hours,
                    travel_time: format_hours(leg.travel_hours),
                    unload_hours: leg.unload_hours,
                    distance_km: leg.leg.distance_km,
                    estimated: leg.estimated,
                }
            })
            .collect();

        Self {
            cluster_id: tour.cluster_id,
            vehicle_id: tour.vehicle_id,
            total_load: tour.total_load(),
            total_hours: tour.plan.total_hours,
            total_time: format_hours(tour.plan.total_hours),
            total_distance_km: tour.plan.total_distance_km,
            return_distance_km: tour.plan.return_leg.distance_km,
            return_time: format_hours(tour.plan.return_hours),
            vehicle_name: tour.vehicle_name,
            stops,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RouteGenerationResponse {
    pub date: NaiveDate,
    pub optimized: bool,
    pub total_distance_km: f64,
    pub total_hours: f64,
    pub total_time: String,
    pub routes: Vec<RouteResponse>,
}

impl RouteGenerationResponse {
    pub fn new(date: NaiveDate, optimized: bool, tours: Vec<ClusterTour>) -> Self {
        let routes: Vec<RouteResponse> = tours.into_iter().map(RouteResponse::from).collect();
        let total_hours = routes.iter().map(|r| r.total_hours).sum();
        Self {
            date,
            optimized,
            total_distance_km: routes.iter().map(|r| r.total_distance_km).sum(),
            total_hours,
            total_time: format_hours(total_hours),
            routes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReportRowResponse {
    pub cluster_date: NaiveDate,
    pub cluster_id: i32,
    pub order_no: i32,
    pub optimized: bool,
    pub vehicle_id: i64,
    pub vehicle_name: String,
    pub daily_demand_id: i64,
    pub name: String,
    pub address: String,
    pub expected_quantity: f64,
    pub carried_quantity: f64,
    pub travel_time: String,
    pub unload_time: String,
    pub distance_km: f64,
}

impl From<RouteReportRow> for ReportRowResponse {
    fn from(row: RouteReportRow) -> Self {
        Self {
            cluster_date: row.cluster_date,
            cluster_id: row.cluster_id,
            order_no: row.order_no,
            optimized: row.optimized,
            vehicle_id: row.vehicle_id,
            vehicle_name: row.vehicle_name,
            daily_demand_id: row.daily_demand_id,
            name: row.name,
            address: row.address,
            expected_quantity: row.expected_quantity,
            carried_quantity: row.carried_quantity,
            travel_time: format_hours(row.travel_hours),
            unload_time: format_hours(row.unload_hours),
            distance_km: row.distance_km,
        }
    }
}

/// Describe the requested report range
pub fn report_range_message(start: Option<NaiveDate>, end: Option<NaiveDate>, rows: usize) -> String {
    let range = match (start, end) {
        (Some(start), Some(end)) => format!("from {} to {}", start, end),
        (Some(start), None) => format!("from {}", start),
        (None, Some(end)) => format!("until {}", end),
        (None, None) => "for all dates".to_string(),
    };
    format!("{} route stops {}", rows, range)
}
