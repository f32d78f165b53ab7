use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "appointment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Booked,
    Cancelled,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Appointment {
    pub id: Uuid,
    pub client_id: String, // Subject of the identity token that booked it
    pub client_email: String,
    pub service_id: Uuid,
    pub therapist_id: Option<Uuid>, // None only when therapist scoping is off
    pub starts_at: NaiveDateTime, // Business-local wall clock time
    pub duration_minutes: i64,    // Snapshot of the service duration at booking time
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub rescheduled_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn is_booked(&self) -> bool {
        self.status == AppointmentStatus::Booked
    }
}

/// Appointment joined with the names a client list needs.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct AppointmentDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    #[ts(flatten)]
    pub appointment: Appointment,
    pub service_name: String,
    pub therapist_name: Option<String>,
}

impl std::ops::Deref for AppointmentDetails {
    type Target = Appointment;
    fn deref(&self) -> &Self::Target {
        &self.appointment
    }
}

/// Request body for booking an appointment.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateAppointment {
    pub service_id: Uuid,
    pub therapist_id: Option<Uuid>, // None asks for any available therapist
    pub starts_at: NaiveDateTime,
    pub notes: Option<String>,
}

/// Request body for moving an appointment to a new start time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct RescheduleAppointment {
    pub starts_at: NaiveDateTime,
    pub therapist_id: Option<Uuid>, // None keeps the current therapist
}

/// Fully resolved row to insert; built by the booking service once the slot
/// has been validated.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub client_id: String,
    pub client_email: String,
    pub service_id: Uuid,
    pub therapist_id: Option<Uuid>,
    pub starts_at: NaiveDateTime,
    pub duration_minutes: i64,
    pub notes: Option<String>,
}

const APPOINTMENT_COLUMNS: &str = "id, client_id, client_email, service_id, therapist_id, starts_at, duration_minutes, status, notes, rescheduled_at, cancelled_at, created_at, updated_at";

const DETAILS_SELECT: &str = r#"SELECT
    a.id, a.client_id, a.client_email, a.service_id, a.therapist_id, a.starts_at,
    a.duration_minutes, a.status, a.notes, a.rescheduled_at, a.cancelled_at,
    a.created_at, a.updated_at,
    s.name AS service_name,
    t.name AS therapist_name
FROM appointments a
JOIN services s ON s.id = a.service_id
LEFT JOIN therapists t ON t.id = a.therapist_id"#;

impl Appointment {
    pub async fn create<'e, E>(
        executor: E,
        data: &NewAppointment,
        appointment_id: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Appointment>(&format!(
            "INSERT INTO appointments (id, client_id, client_email, service_id, therapist_id, starts_at, duration_minutes, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {APPOINTMENT_COLUMNS}"
        ))
        .bind(appointment_id)
        .bind(&data.client_id)
        .bind(&data.client_email)
        .bind(data.service_id)
        .bind(data.therapist_id)
        .bind(data.starts_at)
        .bind(data.duration_minutes)
        .bind(&data.notes)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Booked appointments starting in `[from, to)`, ordered by start.
    pub async fn find_booked_between<'e, E>(
        executor: E,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Appointment>(&format!(
            "SELECT {APPOINTMENT_COLUMNS}
             FROM appointments
             WHERE status = 'booked'
               AND starts_at >= $1
               AND starts_at < $2
             ORDER BY starts_at ASC"
        ))
        .bind(from)
        .bind(to)
        .fetch_all(executor)
        .await
    }

    /// A client's appointments in start order. `ending_after` drops anything
    /// already finished by then, so an appointment in progress is kept;
    /// cancelled rows are only returned with `include_cancelled`.
    pub async fn find_details_by_client(
        pool: &SqlitePool,
        client_id: &str,
        ending_after: Option<NaiveDateTime>,
        include_cancelled: bool,
    ) -> Result<Vec<AppointmentDetails>, sqlx::Error> {
        sqlx::query_as::<_, AppointmentDetails>(&format!(
            "{DETAILS_SELECT}
             WHERE a.client_id = $1
               AND ($2 IS NULL
                    OR datetime(a.starts_at, '+' || a.duration_minutes || ' minutes') > datetime($2))
               AND ($3 OR a.status = 'booked')
             ORDER BY a.starts_at ASC"
        ))
        .bind(client_id)
        .bind(ending_after)
        .bind(include_cancelled)
        .fetch_all(pool)
        .await
    }

    pub async fn find_details_by_id(
        pool: &SqlitePool,
        id: Uuid,
    ) -> Result<Option<AppointmentDetails>, sqlx::Error> {
        sqlx::query_as::<_, AppointmentDetails>(&format!("{DETAILS_SELECT} WHERE a.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn reschedule<'e, E>(
        executor: E,
        id: Uuid,
        starts_at: NaiveDateTime,
        therapist_id: Option<Uuid>,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = Utc::now();
        sqlx::query_as::<_, Appointment>(&format!(
            "UPDATE appointments
             SET starts_at = $2,
                 therapist_id = $3,
                 rescheduled_at = $4,
                 updated_at = $4
             WHERE id = $1
             RETURNING {APPOINTMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(starts_at)
        .bind(therapist_id)
        .bind(now)
        .fetch_one(executor)
        .await
    }

    pub async fn cancel<'e, E>(executor: E, id: Uuid) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = Utc::now();
        sqlx::query_as::<_, Appointment>(&format!(
            "UPDATE appointments
             SET status = 'cancelled',
                 cancelled_at = $2,
                 updated_at = $2
             WHERE id = $1
             RETURNING {APPOINTMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(now)
        .fetch_one(executor)
        .await
    }
}
