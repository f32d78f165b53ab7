//! Routes for a client's own appointments.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use db::models::appointment::{
    Appointment, AppointmentDetails, CreateAppointment, RescheduleAppointment,
};
use services::services::booking::ListAppointmentsQuery;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError, middleware::auth::AuthClient};

/// GET /api/appointments
pub async fn list_appointments(
    State(deployment): State<DeploymentImpl>,
    AuthClient(client): AuthClient,
    WithRejection(Query(query), _): WithRejection<Query<ListAppointmentsQuery>, ApiError>,
) -> Result<ResponseJson<ApiResponse<Vec<AppointmentDetails>>>, ApiError> {
    let appointments = deployment.booking().list_for_client(&client, &query).await?;
    Ok(ResponseJson(ApiResponse::success(appointments)))
}

/// POST /api/appointments
pub async fn create_appointment(
    State(deployment): State<DeploymentImpl>,
    AuthClient(client): AuthClient,
    WithRejection(Json(payload), _): WithRejection<Json<CreateAppointment>, ApiError>,
) -> Result<ResponseJson<ApiResponse<Appointment>>, ApiError> {
    let appointment = deployment.booking().book(&client, payload).await?;
    Ok(ResponseJson(ApiResponse::success(appointment)))
}

/// GET /api/appointments/{appointment_id}
pub async fn get_appointment(
    State(deployment): State<DeploymentImpl>,
    AuthClient(client): AuthClient,
    WithRejection(Path(appointment_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<ResponseJson<ApiResponse<AppointmentDetails>>, ApiError> {
    let appointment = deployment.booking().get(&client, appointment_id).await?;
    Ok(ResponseJson(ApiResponse::success(appointment)))
}

/// POST /api/appointments/{appointment_id}/reschedule
pub async fn reschedule_appointment(
    State(deployment): State<DeploymentImpl>,
    AuthClient(client): AuthClient,
    WithRejection(Path(appointment_id), _): WithRejection<Path<Uuid>, ApiError>,
    WithRejection(Json(payload), _): WithRejection<Json<RescheduleAppointment>, ApiError>,
) -> Result<ResponseJson<ApiResponse<Appointment>>, ApiError> {
    let appointment = deployment
        .booking()
        .reschedule(&client, appointment_id, payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(appointment)))
}

/// POST /api/appointments/{appointment_id}/cancel
pub async fn cancel_appointment(
    State(deployment): State<DeploymentImpl>,
    AuthClient(client): AuthClient,
    WithRejection(Path(appointment_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<ResponseJson<ApiResponse<Appointment>>, ApiError> {
    let appointment = deployment.booking().cancel(&client, appointment_id).await?;
    Ok(ResponseJson(ApiResponse::success(appointment)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new()
        .route(
            "/appointments",
            get(list_appointments).post(create_appointment),
        )
        .route("/appointments/{appointment_id}", get(get_appointment))
        .route(
            "/appointments/{appointment_id}/reschedule",
            post(reschedule_appointment),
        )
        .route(
            "/appointments/{appointment_id}/cancel",
            post(cancel_appointment),
        )
}
