use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Therapist {
    pub id: Uuid,
    pub name: String,
    pub bio: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTherapist {
    pub name: String,
    pub bio: Option<String>,
}

const THERAPIST_COLUMNS: &str = "id, name, bio, active, created_at, updated_at";

impl Therapist {
    /// Active therapists ordered by name; auto-assignment walks this order.
    pub async fn find_all_active<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Therapist>(&format!(
            "SELECT {THERAPIST_COLUMNS} FROM therapists WHERE active = 1 ORDER BY name ASC, id ASC"
        ))
        .fetch_all(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Therapist>(&format!(
            "SELECT {THERAPIST_COLUMNS} FROM therapists WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateTherapist,
        therapist_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Therapist>(&format!(
            "INSERT INTO therapists (id, name, bio)
             VALUES ($1, $2, $3)
             RETURNING {THERAPIST_COLUMNS}"
        ))
        .bind(therapist_id)
        .bind(&data.name)
        .bind(&data.bio)
        .fetch_one(pool)
        .await
    }

    pub async fn set_active(
        pool: &SqlitePool,
        id: Uuid,
        active: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Therapist>(&format!(
            "UPDATE therapists
             SET active = $2, updated_at = datetime('now', 'subsec')
             WHERE id = $1
             RETURNING {THERAPIST_COLUMNS}"
        ))
        .bind(id)
        .bind(active)
        .fetch_optional(pool)
        .await
    }
}
