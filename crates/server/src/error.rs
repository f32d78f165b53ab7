use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{
    booking::BookingError, catalog::CatalogError, identity::IdentityError,
};
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error("admin role required")]
    Forbidden,
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Booking(err) => match err {
                BookingError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
                BookingError::ServiceNotFound
                | BookingError::TherapistNotFound
                | BookingError::AppointmentNotFound => StatusCode::NOT_FOUND,
                BookingError::NotOwner => StatusCode::FORBIDDEN,
                BookingError::SlotUnavailable | BookingError::AppointmentCancelled => {
                    StatusCode::CONFLICT
                }
                BookingError::ServiceInactive
                | BookingError::TherapistInactive
                | BookingError::InPast => StatusCode::BAD_REQUEST,
            },
            ApiError::Catalog(err) => match err {
                CatalogError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
                CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
                CatalogError::ServiceNotFound | CatalogError::TherapistNotFound => {
                    StatusCode::NOT_FOUND
                }
            },
            ApiError::Identity(err) => match err {
                IdentityError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::UNAUTHORIZED,
            },
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

// Malformed paths, query strings and bodies are client errors and keep the
// response envelope.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ApiResponse::<()>::error(&message))).into_response()
    }
}
