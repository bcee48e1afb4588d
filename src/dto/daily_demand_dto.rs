use chrono::{DateTime, NaiveDate, Utc};
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::daily_demand::{DailyDemand, DemandStatus};

// Request to register the locations to collect on a date
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DailyDemandRequest {
    pub date: NaiveDate,

    #[validate(length(min = 1, max = 1000))]
    pub location_ids: Vec<i64>,
}

// Query with a single date
#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DailyDemandResponse {
    pub id: i64,
    pub location_id: i64,
    pub origin_date: NaiveDate,
    pub cluster_date: NaiveDate,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub bearing: f64,
    pub expected_quantity: f64,
    pub start_quantity: f64,
    pub remaining_quantity: f64,
    pub status: DemandStatus,
    pub created_at: DateTime<Utc>,
}

impl From<DailyDemand> for DailyDemandResponse {
    fn from(row: DailyDemand) -> Self {
        Self {
            id: row.id,
            location_id: row.location_id,
            origin_date: row.origin_date,
            cluster_date: row.cluster_date,
            latitude: row.latitude.to_f64().unwrap_or_default(),
            longitude: row.longitude.to_f64().unwrap_or_default(),
            name: row.name,
            address: row.address,
            bearing: row.bearing,
            expected_quantity: row.expected_quantity,
            start_quantity: row.start_quantity,
            remaining_quantity: row.remaining_quantity,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_requires_locations() {
        let request: DailyDemandRequest =
            serde_json::from_str(r#"{"date":"2025-03-03","location_ids":[]}"#).unwrap();
        assert!(request.validate().is_err());

        let request: DailyDemandRequest =
            serde_json::from_str(r#"{"date":"2025-03-03","location_ids":[4,7]}"#).unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.date, NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());
    }
}
