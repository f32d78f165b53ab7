//! Booking workflow: availability lookups, booking, rescheduling and
//! cancellation.
//!
//! Check-then-write operations hold `write_lock` and run inside a single
//! transaction, so two requests racing for the same slot cannot both pass
//! the availability check.

use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveDateTime, TimeDelta};
use db::models::{
    appointment::{
        Appointment, AppointmentDetails, CreateAppointment, NewAppointment,
        RescheduleAppointment,
    },
    service::Service,
    therapist::Therapist,
};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    availability::{
        AvailableSlot, BookedInterval, BusinessHours, TherapistScope, any_therapist_slots,
        available_slots, drop_elapsed,
    },
    identity::CurrentClient,
};

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("service not found")]
    ServiceNotFound,
    #[error("service is no longer offered")]
    ServiceInactive,
    #[error("therapist not found")]
    TherapistNotFound,
    #[error("therapist is not taking bookings")]
    TherapistInactive,
    #[error("appointment not found")]
    AppointmentNotFound,
    #[error("appointment belongs to another client")]
    NotOwner,
    #[error("appointment has been cancelled")]
    AppointmentCancelled,
    #[error("cannot book a time in the past")]
    InPast,
    #[error("the requested time is no longer available")]
    SlotUnavailable,
}

/// Query for the slots of one day.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub service_id: Uuid,
    pub therapist_id: Option<Uuid>,
    /// The appointment being rescheduled; it never blocks its own slot.
    pub exclude_appointment_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Availability {
    pub date: NaiveDate,
    pub service_id: Uuid,
    pub duration_minutes: i64,
    pub therapist_id: Option<Uuid>,
    pub slots: Vec<AvailableSlot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct ListAppointmentsQuery {
    #[serde(default)]
    pub include_past: bool,
    #[serde(default)]
    pub include_cancelled: bool,
}

/// Business-local wall clock time; appointments are stored without an offset.
pub fn business_now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[derive(Clone)]
pub struct BookingService {
    pool: SqlitePool,
    hours: BusinessHours,
    therapist_scoping: bool,
    write_lock: Arc<Mutex<()>>,
    now: fn() -> NaiveDateTime,
}

impl BookingService {
    pub fn new(pool: SqlitePool, hours: BusinessHours, therapist_scoping: bool) -> Self {
        Self {
            pool,
            hours,
            therapist_scoping,
            write_lock: Arc::new(Mutex::new(())),
            now: business_now,
        }
    }

    /// Replace the clock, for pinning "now" in tests.
    pub fn with_clock(mut self, now: fn() -> NaiveDateTime) -> Self {
        self.now = now;
        self
    }

    pub async fn availability(&self, query: &AvailabilityQuery) -> Result<Availability, BookingError> {
        let mut conn = self.pool.acquire().await?;

        let service = active_service(&mut conn, query.service_id).await?;
        if let Some(therapist_id) = query.therapist_id {
            active_therapist(&mut conn, therapist_id).await?;
        }

        let slots = self
            .compute_slots(
                &mut conn,
                query.date,
                service.duration_minutes,
                query.therapist_id,
                query.exclude_appointment_id,
            )
            .await?;
        let slots = drop_elapsed(slots, (self.now)());

        debug!(
            date = %query.date,
            service_id = %query.service_id,
            therapist_id = ?query.therapist_id,
            slot_count = slots.len(),
            "Computed availability"
        );

        Ok(Availability {
            date: query.date,
            service_id: service.id,
            duration_minutes: service.duration_minutes,
            therapist_id: query.therapist_id,
            slots,
        })
    }

    pub async fn book(
        &self,
        client: &CurrentClient,
        data: CreateAppointment,
    ) -> Result<Appointment, BookingError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let service = active_service(&mut tx, data.service_id).await?;
        if let Some(therapist_id) = data.therapist_id {
            active_therapist(&mut tx, therapist_id).await?;
        }
        if data.starts_at < (self.now)() {
            return Err(BookingError::InPast);
        }

        let slots = self
            .compute_slots(
                &mut tx,
                data.starts_at.date(),
                service.duration_minutes,
                data.therapist_id,
                None,
            )
            .await?;
        let therapist_id = self.claim_slot(&slots, data.starts_at, data.therapist_id)?;

        let new_appointment = NewAppointment {
            client_id: client.id.clone(),
            client_email: client.email.clone(),
            service_id: service.id,
            therapist_id,
            starts_at: data.starts_at,
            duration_minutes: service.duration_minutes,
            notes: data.notes.filter(|n| !n.trim().is_empty()),
        };
        let appointment = Appointment::create(&mut *tx, &new_appointment, Uuid::new_v4()).await?;
        tx.commit().await?;

        info!(
            appointment_id = %appointment.id,
            client_id = %appointment.client_id,
            service = %service.name,
            therapist_id = ?appointment.therapist_id,
            starts_at = %appointment.starts_at,
            "Appointment booked"
        );
        Ok(appointment)
    }

    pub async fn reschedule(
        &self,
        client: &CurrentClient,
        appointment_id: Uuid,
        data: RescheduleAppointment,
    ) -> Result<Appointment, BookingError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let appointment = Appointment::find_by_id(&mut *tx, appointment_id)
            .await?
            .ok_or(BookingError::AppointmentNotFound)?;
        if !client.can_manage(&appointment.client_id) {
            return Err(BookingError::NotOwner);
        }
        if !appointment.is_booked() {
            return Err(BookingError::AppointmentCancelled);
        }
        if data.starts_at < (self.now)() {
            return Err(BookingError::InPast);
        }

        let requested_therapist = data.therapist_id.or(appointment.therapist_id);
        if let Some(therapist_id) = data
            .therapist_id
            .filter(|id| Some(*id) != appointment.therapist_id)
        {
            active_therapist(&mut tx, therapist_id).await?;
        }

        let slots = self
            .compute_slots(
                &mut tx,
                data.starts_at.date(),
                appointment.duration_minutes,
                requested_therapist,
                Some(appointment.id),
            )
            .await?;
        let therapist_id = self.claim_slot(&slots, data.starts_at, requested_therapist)?;

        let updated =
            Appointment::reschedule(&mut *tx, appointment.id, data.starts_at, therapist_id).await?;
        tx.commit().await?;

        info!(
            appointment_id = %updated.id,
            from = %appointment.starts_at,
            to = %updated.starts_at,
            therapist_id = ?updated.therapist_id,
            "Appointment rescheduled"
        );
        Ok(updated)
    }

    /// Cancelling an already cancelled appointment returns it unchanged.
    pub async fn cancel(
        &self,
        client: &CurrentClient,
        appointment_id: Uuid,
    ) -> Result<Appointment, BookingError> {
        let _guard = self.write_lock.lock().await;

        let appointment = Appointment::find_by_id(&self.pool, appointment_id)
            .await?
            .ok_or(BookingError::AppointmentNotFound)?;
        if !client.can_manage(&appointment.client_id) {
            return Err(BookingError::NotOwner);
        }
        if !appointment.is_booked() {
            return Ok(appointment);
        }

        let cancelled = Appointment::cancel(&self.pool, appointment.id).await?;
        info!(
            appointment_id = %cancelled.id,
            client_id = %cancelled.client_id,
            starts_at = %cancelled.starts_at,
            "Appointment cancelled"
        );
        Ok(cancelled)
    }

    pub async fn get(
        &self,
        client: &CurrentClient,
        appointment_id: Uuid,
    ) -> Result<AppointmentDetails, BookingError> {
        let details = Appointment::find_details_by_id(&self.pool, appointment_id)
            .await?
            .ok_or(BookingError::AppointmentNotFound)?;
        if !client.can_manage(&details.client_id) {
            return Err(BookingError::NotOwner);
        }
        Ok(details)
    }

    pub async fn list_for_client(
        &self,
        client: &CurrentClient,
        query: &ListAppointmentsQuery,
    ) -> Result<Vec<AppointmentDetails>, BookingError> {
        let ending_after = (!query.include_past).then(|| (self.now)());
        Ok(Appointment::find_details_by_client(
            &self.pool,
            &client.id,
            ending_after,
            query.include_cancelled,
        )
        .await?)
    }

    /// Slots for `date` as the current scoping mode sees them.
    ///
    /// - scoping off: every booking conflicts; `therapist_ids` is the
    ///   requested therapist, if any.
    /// - scoping on with a therapist: only that therapist's bookings count.
    /// - scoping on without one: union over active therapists.
    async fn compute_slots(
        &self,
        conn: &mut SqliteConnection,
        date: NaiveDate,
        duration_minutes: i64,
        therapist_id: Option<Uuid>,
        exclude: Option<Uuid>,
    ) -> Result<Vec<AvailableSlot>, BookingError> {
        let booked = booked_intervals_around(conn, date).await?;

        let slots = match (self.therapist_scoping, therapist_id) {
            (false, _) => available_slots(
                date,
                &self.hours,
                duration_minutes,
                &booked,
                TherapistScope::Unscoped,
                exclude,
            )
            .into_iter()
            .map(|slot| AvailableSlot {
                slot,
                therapist_ids: therapist_id.into_iter().collect(),
            })
            .collect(),
            (true, Some(id)) => available_slots(
                date,
                &self.hours,
                duration_minutes,
                &booked,
                TherapistScope::Therapist(id),
                exclude,
            )
            .into_iter()
            .map(|slot| AvailableSlot {
                slot,
                therapist_ids: vec![id],
            })
            .collect(),
            (true, None) => {
                let therapists: Vec<Uuid> = Therapist::find_all_active(&mut *conn)
                    .await?
                    .into_iter()
                    .map(|t| t.id)
                    .collect();
                any_therapist_slots(
                    date,
                    &self.hours,
                    duration_minutes,
                    &booked,
                    &therapists,
                    exclude,
                )
            }
        };
        Ok(slots)
    }

    /// Find the slot starting at `starts_at` and decide which therapist takes
    /// it: the requested one, or the first free one when scoping is on.
    fn claim_slot(
        &self,
        slots: &[AvailableSlot],
        starts_at: NaiveDateTime,
        requested: Option<Uuid>,
    ) -> Result<Option<Uuid>, BookingError> {
        let slot = slots
            .iter()
            .find(|s| s.slot.start == starts_at)
            .ok_or(BookingError::SlotUnavailable)?;

        if !self.therapist_scoping {
            return Ok(requested);
        }
        match requested {
            Some(id) => Ok(Some(id)),
            None => slot
                .therapist_ids
                .first()
                .copied()
                .map(Some)
                .ok_or(BookingError::SlotUnavailable),
        }
    }
}

async fn active_service(conn: &mut SqliteConnection, id: Uuid) -> Result<Service, BookingError> {
    let service = Service::find_by_id(&mut *conn, id)
        .await?
        .ok_or(BookingError::ServiceNotFound)?;
    if !service.active {
        return Err(BookingError::ServiceInactive);
    }
    Ok(service)
}

async fn active_therapist(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Therapist, BookingError> {
    let therapist = Therapist::find_by_id(&mut *conn, id)
        .await?
        .ok_or(BookingError::TherapistNotFound)?;
    if !therapist.active {
        return Err(BookingError::TherapistInactive);
    }
    Ok(therapist)
}

/// Booked intervals that could reach into `date`: anything starting from the
/// previous day up to the end of `date`.
async fn booked_intervals_around(
    conn: &mut SqliteConnection,
    date: NaiveDate,
) -> Result<Vec<BookedInterval>, sqlx::Error> {
    let day_start = date.and_time(chrono::NaiveTime::MIN);
    let appointments = Appointment::find_booked_between(
        &mut *conn,
        day_start - TimeDelta::days(1),
        day_start + TimeDelta::days(1),
    )
    .await?;
    Ok(appointments.iter().map(BookedInterval::from).collect())
}
