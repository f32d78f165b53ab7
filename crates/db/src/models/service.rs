use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// A bookable treatment on the service menu.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub duration_minutes: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateService {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub duration_minutes: i64,
}

const SERVICE_COLUMNS: &str = "id, name, description, price_cents, duration_minutes, active, created_at, updated_at";

impl Service {
    pub async fn find_all_active(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE active = 1 ORDER BY name ASC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateService,
        service_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Service>(&format!(
            "INSERT INTO services (id, name, description, price_cents, duration_minutes)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {SERVICE_COLUMNS}"
        ))
        .bind(service_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.price_cents)
        .bind(data.duration_minutes)
        .fetch_one(pool)
        .await
    }

    pub async fn set_active(
        pool: &SqlitePool,
        id: Uuid,
        active: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Service>(&format!(
            "UPDATE services
             SET active = $2, updated_at = datetime('now', 'subsec')
             WHERE id = $1
             RETURNING {SERVICE_COLUMNS}"
        ))
        .bind(id)
        .bind(active)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    #[tokio::test]
    async fn test_seeded_menu_is_active() {
        let db = DBService::new_in_memory().await.unwrap();
        let services = Service::find_all_active(&db.pool).await.unwrap();

        let names: Vec<&str> = services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Aromatherapy Massage",
                "Deep Tissue Massage",
                "Hot Stone Therapy",
                "Swedish Massage",
            ]
        );
        let deep_tissue = services
            .iter()
            .find(|s| s.name == "Deep Tissue Massage")
            .unwrap();
        assert_eq!(deep_tissue.duration_minutes, 90);
    }

    #[tokio::test]
    async fn test_deactivated_service_is_hidden() {
        let db = DBService::new_in_memory().await.unwrap();
        let created = Service::create(
            &db.pool,
            &CreateService {
                name: "Reflexology".to_string(),
                description: None,
                price_cents: 6000,
                duration_minutes: 45,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        assert!(created.active);

        Service::set_active(&db.pool, created.id, false).await.unwrap();

        let active = Service::find_all_active(&db.pool).await.unwrap();
        assert!(active.iter().all(|s| s.id != created.id));
        let stored = Service::find_by_id(&db.pool, created.id).await.unwrap().unwrap();
        assert!(!stored.active);
    }
}
