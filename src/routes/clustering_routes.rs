use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::controllers::clustering_controller::ClusteringController;
use crate::dto::api_response::ApiResponse;
use crate::dto::clustering_dto::{
    ClusteringQuery, ClusteringResponse, ReportQuery, ReportRowResponse, RouteGenerationResponse,
    RouteQuery,
};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_clustering_router() -> Router<AppState> {
    Router::new()
        .route("/clustering", get(run_clustering))
        .route("/generate-routes", get(generate_routes))
        .route("/report-routes", get(report_routes))
}

async fn run_clustering(
    State(state): State<AppState>,
    Query(query): Query<ClusteringQuery>,
) -> Result<Json<ApiResponse<ClusteringResponse>>, AppError> {
    let controller = ClusteringController::new(&state);
    let response = controller.cluster(query).await?;
    Ok(Json(response))
}

async fn generate_routes(
    State(state): State<AppState>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<ApiResponse<RouteGenerationResponse>>, AppError> {
    let controller = ClusteringController::new(&state);
    let response = controller.generate_routes(query).await?;
    Ok(Json(response))
}

async fn report_routes(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ApiResponse<Vec<ReportRowResponse>>>, AppError> {
    let controller = ClusteringController::new(&state);
    let response = controller.report(query).await?;
    Ok(Json(response))
}
