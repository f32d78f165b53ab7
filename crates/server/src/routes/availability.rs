use axum::{
    Router,
    extract::{Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use axum_extra::extract::WithRejection;
use services::services::booking::{Availability, AvailabilityQuery};
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

/// GET /api/availability?date=YYYY-MM-DD&service_id=...&therapist_id=...&exclude_appointment_id=...
pub async fn get_availability(
    State(deployment): State<DeploymentImpl>,
    WithRejection(Query(query), _): WithRejection<Query<AvailabilityQuery>, ApiError>,
) -> Result<ResponseJson<ApiResponse<Availability>>, ApiError> {
    let availability = deployment.booking().availability(&query).await?;
    Ok(ResponseJson(ApiResponse::success(availability)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().route("/availability", get(get_availability))
}
