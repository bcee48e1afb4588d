use sqlx::PgPool;
use validator::Validate;

use crate::dto::api_response::ApiResponse;
use crate::dto::daily_demand_dto::{DailyDemandRequest, DailyDemandResponse};
use crate::repositories::daily_demand_repository::DailyDemandRepository;
use crate::utils::errors::{not_found_error, AppError};
use crate::utils::validation::parse_required_date;

pub struct DailyDemandController {
    repository: DailyDemandRepository,
}

impl DailyDemandController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: DailyDemandRepository::new(pool),
        }
    }

    pub async fn create(&self, request: DailyDemandRequest) -> Result<ApiResponse<Vec<DailyDemandResponse>>, AppError> {
        request.validate()?;

        let mut location_ids = request.location_ids.clone();
        location_ids.sort_unstable();
        if location_ids.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(AppError::BadRequest(
                "location_ids contains duplicates".to_string(),
            ));
        }

        let rows = self
            .repository
            .create_batch(request.date, &request.location_ids)
            .await?;

        log::info!("🗓️ {} pickups registered for {}", rows.len(), request.date);
        let message = format!("{} pickups registered for {}", rows.len(), request.date);

        Ok(ApiResponse::success_with_message(
            rows.into_iter().map(DailyDemandResponse::from).collect(),
            message,
        ))
    }

    pub async fn list_by_date(&self, date: Option<&str>) -> Result<ApiResponse<Vec<DailyDemandResponse>>, AppError> {
        let date = parse_required_date(date, "date")?;
        let rows = self.repository.find_by_date(date).await?;

        Ok(ApiResponse::success(
            rows.into_iter().map(DailyDemandResponse::from).collect(),
        ))
    }

    pub async fn delete_by_date(&self, date: Option<&str>) -> Result<ApiResponse<()>, AppError> {
        let date = parse_required_date(date, "date")?;
        let deleted = self.repository.delete_by_date(date).await?;

        if deleted == 0 {
            return Err(AppError::NotFound(format!("No daily demand for {}", date)));
        }

        log::info!("🗑️ {} daily demand rows deleted for {}", deleted, date);
        Ok(ApiResponse::message(format!(
            "{} daily demand rows deleted for {}",
            deleted, date
        )))
    }

    pub async fn delete_by_id(&self, id: i64) -> Result<ApiResponse<()>, AppError> {
        if !self.repository.delete_by_id(id).await? {
            return Err(not_found_error("Daily demand", &id.to_string()));
        }

        Ok(ApiResponse::message(format!("Daily demand {} deleted", id)))
    }
}
