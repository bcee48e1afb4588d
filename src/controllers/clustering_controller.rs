use std::sync::Arc;

use crate::algorithms::tour::SequenceMode;
use crate::dto::api_response::ApiResponse;
use crate::dto::clustering_dto::{
    report_range_message, ClusteringQuery, ClusteringResponse, ReportQuery, ReportRowResponse,
    RouteGenerationResponse, RouteQuery,
};
use crate::services::clustering_service::ClusteringService;
use crate::services::route_service::RouteService;
use crate::services::schedule_store::ScheduleStore;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::validation::{parse_optional_date, parse_required_date};

pub struct ClusteringController {
    clustering: ClusteringService,
    routes: RouteService,
}

impl ClusteringController {
    pub fn new(state: &AppState) -> Self {
        Self::with_store(state, state.schedule_store())
    }

    pub fn with_store(state: &AppState, store: Arc<dyn ScheduleStore>) -> Self {
        Self {
            clustering: ClusteringService::new(
                store.clone(),
                state.estimator.clone(),
                state.engine.clone(),
            ),
            routes: RouteService::new(store, state.estimator.clone(), state.engine.clone()),
        }
    }

    pub async fn cluster(&self, query: ClusteringQuery) -> Result<ApiResponse<ClusteringResponse>, AppError> {
        let date = parse_required_date(query.date.as_deref(), "date")?;

        let response = if query.dry_run.unwrap_or(false) {
            ClusteringResponse::from_report(self.clustering.preview(date).await?)
        } else {
            ClusteringResponse::from_result(date, self.clustering.run_clustering(date).await?)
        };

        let message = response.message();
        if response.is_partial() {
            Ok(ApiResponse::partial(response, message))
        } else {
            Ok(ApiResponse::success_with_message(response, message))
        }
    }

    pub async fn generate_routes(&self, query: RouteQuery) -> Result<ApiResponse<RouteGenerationResponse>, AppError> {
        let date = parse_required_date(query.date.as_deref(), "date")?;
        let optimized = query.optimized.unwrap_or(true);

        let tours = self
            .routes
            .generate_routes(date, SequenceMode::from_optimized(optimized))
            .await?;
        let response = RouteGenerationResponse::new(date, optimized, tours);
        let message = format!("{} routes generated for {}", response.routes.len(), date);

        Ok(ApiResponse::success_with_message(response, message))
    }

    pub async fn report(&self, query: ReportQuery) -> Result<ApiResponse<Vec<ReportRowResponse>>, AppError> {
        let start = parse_optional_date(query.start_date.as_deref())?;
        let end = parse_optional_date(query.end_date.as_deref())?;

        let rows = self.routes.report(start, end).await?;
        let message = report_range_message(start, end, rows.len());

        Ok(ApiResponse::success_with_message(
            rows.into_iter().map(ReportRowResponse::from).collect(),
            message,
        ))
    }
}
