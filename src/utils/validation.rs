//! Validation helpers
//!
//! Parsing of query parameters and checks shared by the request DTOs.

use chrono::NaiveDate;
use validator::ValidationError;

use crate::utils::errors::{bad_request_error, AppResult};

/// Validate and convert a string into a date
pub fn validate_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        let mut error = ValidationError::new("date");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"YYYY-MM-DD".to_string());
        error
    })
}

/// Parse an optional date query parameter, rejecting malformed values
pub fn parse_optional_date(value: Option<&str>) -> AppResult<Option<NaiveDate>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => validate_date(raw).map(Some).map_err(|_| {
            bad_request_error(&format!("Invalid date format: {}. Use YYYY-MM-DD.", raw))
        }),
        None => Ok(None),
    }
}

/// Parse a required date query parameter
pub fn parse_required_date(value: Option<&str>, name: &str) -> AppResult<NaiveDate> {
    parse_optional_date(value)?
        .ok_or_else(|| bad_request_error(&format!("Query parameter '{}' is required", name)))
}

/// Validate GPS coordinates. NaN and infinite values are rejected before the
/// range check since they compare false against any bound.
pub fn validate_coordinates(lat: f64, lng: f64) -> Result<(), ValidationError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        let mut error = ValidationError::new("latitude");
        error.add_param("value".into(), &lat.to_string());
        error.add_param("range".into(), &"-90.0 to 90.0".to_string());
        return Err(error);
    }

    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        let mut error = ValidationError::new("longitude");
        error.add_param("value".into(), &lng.to_string());
        error.add_param("range".into(), &"-180.0 to 180.0".to_string());
        return Err(error);
    }

    Ok(())
}

/// Validate that a quantity is a finite, non negative number
pub fn validate_quantity(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        let mut error = ValidationError::new("quantity");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}
