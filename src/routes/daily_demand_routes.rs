use axum::{
    extract::{Path, Query, State},
    routing::{delete, get},
    Json, Router,
};

use crate::controllers::daily_demand_controller::DailyDemandController;
use crate::dto::api_response::ApiResponse;
use crate::dto::daily_demand_dto::{DailyDemandRequest, DailyDemandResponse, DateQuery};
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Daily pickup intake, mounted at `/pengepul`
pub fn create_daily_demand_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_daily_demand).post(create_daily_demand))
        .route("/by-date", delete(delete_daily_demand_by_date))
        .route("/:id", delete(delete_daily_demand))
}

async fn create_daily_demand(
    State(state): State<AppState>,
    Json(request): Json<DailyDemandRequest>,
) -> Result<Json<ApiResponse<Vec<DailyDemandResponse>>>, AppError> {
    let controller = DailyDemandController::new(state.pool.clone());
    let response = controller.create(request).await?;
    Ok(Json(response))
}

async fn list_daily_demand(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<Json<ApiResponse<Vec<DailyDemandResponse>>>, AppError> {
    let controller = DailyDemandController::new(state.pool.clone());
    let response = controller.list_by_date(query.date.as_deref()).await?;
    Ok(Json(response))
}

async fn delete_daily_demand_by_date(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = DailyDemandController::new(state.pool.clone());
    let response = controller.delete_by_date(query.date.as_deref()).await?;
    Ok(Json(response))
}

async fn delete_daily_demand(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let controller = DailyDemandController::new(state.pool.clone());
    let response = controller.delete_by_id(id).await?;
    Ok(Json(response))
}
