//! Admin management of the service menu and the therapist roster.

use db::models::{
    service::{CreateService, Service},
    therapist::{CreateTherapist, Therapist},
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Longest service a single business day can hold.
pub const MAX_SERVICE_MINUTES: i64 = 24 * 60;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Validation(String),
    #[error("service not found")]
    ServiceNotFound,
    #[error("therapist not found")]
    TherapistNotFound,
}

pub struct CatalogService;

impl CatalogService {
    pub async fn list_services(pool: &SqlitePool) -> Result<Vec<Service>, CatalogError> {
        Ok(Service::find_all_active(pool).await?)
    }

    pub async fn list_therapists(pool: &SqlitePool) -> Result<Vec<Therapist>, CatalogError> {
        Ok(Therapist::find_all_active(pool).await?)
    }

    pub async fn create_service(
        pool: &SqlitePool,
        mut data: CreateService,
    ) -> Result<Service, CatalogError> {
        data.name = required_name(&data.name, "service")?;
        if !(1..=MAX_SERVICE_MINUTES).contains(&data.duration_minutes) {
            return Err(CatalogError::Validation(format!(
                "duration_minutes must be between 1 and {MAX_SERVICE_MINUTES}"
            )));
        }
        if data.price_cents < 0 {
            return Err(CatalogError::Validation(
                "price_cents must not be negative".to_string(),
            ));
        }

        let service = Service::create(pool, &data, Uuid::new_v4())
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                    CatalogError::Validation(format!(
                        "a service named '{}' already exists",
                        data.name
                    ))
                }
                other => CatalogError::Database(other),
            })?;

        info!(
            service_id = %service.id,
            name = %service.name,
            duration_minutes = service.duration_minutes,
            "Created service"
        );
        Ok(service)
    }

    pub async fn deactivate_service(pool: &SqlitePool, id: Uuid) -> Result<Service, CatalogError> {
        let service = Service::set_active(pool, id, false)
            .await?
            .ok_or(CatalogError::ServiceNotFound)?;
        info!(service_id = %id, "Deactivated service");
        Ok(service)
    }

    pub async fn create_therapist(
        pool: &SqlitePool,
        mut data: CreateTherapist,
    ) -> Result<Therapist, CatalogError> {
        data.name = required_name(&data.name, "therapist")?;
        let therapist = Therapist::create(pool, &data, Uuid::new_v4()).await?;
        info!(therapist_id = %therapist.id, name = %therapist.name, "Created therapist");
        Ok(therapist)
    }

    /// Inactive therapists keep their existing appointments but are no
    /// longer offered for new bookings.
    pub async fn deactivate_therapist(
        pool: &SqlitePool,
        id: Uuid,
    ) -> Result<Therapist, CatalogError> {
        let therapist = Therapist::set_active(pool, id, false)
            .await?
            .ok_or(CatalogError::TherapistNotFound)?;
        info!(therapist_id = %id, "Deactivated therapist");
        Ok(therapist)
    }
}

fn required_name(name: &str, what: &str) -> Result<String, CatalogError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::Validation(format!("{what} name is required")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use db::DBService;

    use super::*;

    fn service(name: &str, duration_minutes: i64) -> CreateService {
        CreateService {
            name: name.to_string(),
            description: None,
            price_cents: 7000,
            duration_minutes,
        }
    }

    #[tokio::test]
    async fn test_create_service_trims_and_validates() {
        let db = DBService::new_in_memory().await.unwrap();

        let created = CatalogService::create_service(&db.pool, service("  Shiatsu ", 50))
            .await
            .unwrap();
        assert_eq!(created.name, "Shiatsu");

        let err = CatalogService::create_service(&db.pool, service("Cupping", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));

        let err = CatalogService::create_service(&db.pool, service("   ", 30))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[tokio::test]
    async fn test_service_duration_is_bounded_to_one_day() {
        let db = DBService::new_in_memory().await.unwrap();

        let full_day = CatalogService::create_service(&db.pool, service("Retreat", MAX_SERVICE_MINUTES))
            .await
            .unwrap();
        assert_eq!(full_day.duration_minutes, MAX_SERVICE_MINUTES);

        for duration in [MAX_SERVICE_MINUTES + 1, i64::MAX / 2, -5] {
            let err = CatalogService::create_service(&db.pool, service("Endless", duration))
                .await
                .unwrap_err();
            assert!(matches!(err, CatalogError::Validation(_)), "{duration}");
        }
    }

    #[tokio::test]
    async fn test_duplicate_service_name_is_a_validation_error() {
        let db = DBService::new_in_memory().await.unwrap();
        let err = CatalogService::create_service(&db.pool, service("Swedish Massage", 60))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(msg) if msg.contains("already exists")));
    }

    #[tokio::test]
    async fn test_deactivate_missing_therapist() {
        let db = DBService::new_in_memory().await.unwrap();
        let err = CatalogService::deactivate_therapist(&db.pool, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::TherapistNotFound));
    }
}
