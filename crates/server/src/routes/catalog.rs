//! Routes for the service menu and the therapist roster.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use db::models::{
    service::{CreateService, Service},
    therapist::{CreateTherapist, Therapist},
};
use services::services::catalog::CatalogService;
use tracing::info;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError, middleware::auth::AdminClient};

/// GET /api/services
pub async fn list_services(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<Service>>>, ApiError> {
    let services = CatalogService::list_services(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(services)))
}

/// POST /api/services
pub async fn create_service(
    State(deployment): State<DeploymentImpl>,
    AdminClient(admin): AdminClient,
    WithRejection(Json(payload), _): WithRejection<Json<CreateService>, ApiError>,
) -> Result<ResponseJson<ApiResponse<Service>>, ApiError> {
    let service = CatalogService::create_service(&deployment.db().pool, payload).await?;
    info!(admin_id = %admin.id, service_id = %service.id, "Service added to menu");
    Ok(ResponseJson(ApiResponse::success(service)))
}

/// POST /api/services/{service_id}/deactivate
pub async fn deactivate_service(
    State(deployment): State<DeploymentImpl>,
    AdminClient(admin): AdminClient,
    WithRejection(Path(service_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<ResponseJson<ApiResponse<Service>>, ApiError> {
    let service = CatalogService::deactivate_service(&deployment.db().pool, service_id).await?;
    info!(admin_id = %admin.id, service_id = %service_id, "Service removed from menu");
    Ok(ResponseJson(ApiResponse::success(service)))
}

/// GET /api/therapists
pub async fn list_therapists(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<Therapist>>>, ApiError> {
    let therapists = CatalogService::list_therapists(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(therapists)))
}

/// POST /api/therapists
pub async fn create_therapist(
    State(deployment): State<DeploymentImpl>,
    AdminClient(admin): AdminClient,
    WithRejection(Json(payload), _): WithRejection<Json<CreateTherapist>, ApiError>,
) -> Result<ResponseJson<ApiResponse<Therapist>>, ApiError> {
    let therapist = CatalogService::create_therapist(&deployment.db().pool, payload).await?;
    info!(admin_id = %admin.id, therapist_id = %therapist.id, "Therapist added");
    Ok(ResponseJson(ApiResponse::success(therapist)))
}

/// POST /api/therapists/{therapist_id}/deactivate
pub async fn deactivate_therapist(
    State(deployment): State<DeploymentImpl>,
    AdminClient(admin): AdminClient,
    WithRejection(Path(therapist_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<ResponseJson<ApiResponse<Therapist>>, ApiError> {
    let therapist =
        CatalogService::deactivate_therapist(&deployment.db().pool, therapist_id).await?;
    info!(admin_id = %admin.id, therapist_id = %therapist_id, "Therapist deactivated");
    Ok(ResponseJson(ApiResponse::success(therapist)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/services", get(list_services).post(create_service))
        .route("/services/{service_id}/deactivate", post(deactivate_service))
        .route("/therapists", get(list_therapists).post(create_therapist))
        .route(
            "/therapists/{therapist_id}/deactivate",
            post(deactivate_therapist),
        )
}
