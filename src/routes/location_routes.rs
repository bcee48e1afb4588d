use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::controllers::location_controller::LocationController;
use crate::dto::api_response::ApiResponse;
use crate::dto::location_dto::{LocationRequest, LocationResponse};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_location_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_locations).post(create_location))
        .route(
            "/:id",
            get(get_location).put(update_location).delete(delete_location),
        )
}

fn controller(state: &AppState) -> LocationController {
    LocationController::new(state.pool.clone(), state.engine.depot)
}

async fn create_location(
    State(state): State<AppState>,
    Json(request): Json<LocationRequest>,
) -> Result<Json<ApiResponse<LocationResponse>>, AppError> {
    let response = controller(&state).create(request).await?;
    Ok(Json(response))
}

async fn list_locations(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<LocationResponse>>>, AppError> {
    let response = controller(&state).list().await?;
    Ok(Json(response))
}

async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<LocationResponse>>, AppError> {
    let response = controller(&state).get_by_id(id).await?;
    Ok(Json(response))
}

async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<LocationRequest>,
) -> Result<Json<ApiResponse<LocationResponse>>, AppError> {
    let response = controller(&state).update(id, request).await?;
    Ok(Json(response))
}

async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let response = controller(&state).delete(id).await?;
    Ok(Json(response))
}
