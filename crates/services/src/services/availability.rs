//! Slot computation for a single business day.
//!
//! Everything here is pure: the same date, duration, therapist scope and set
//! of booked intervals always produce the same ordered slots. Intervals are
//! half-open, so back-to-back appointments never conflict.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday};
use db::models::appointment::Appointment;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Opening window applied to every open day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
    #[serde(default)]
    pub closed_days: Vec<Weekday>,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            closed_days: vec![Weekday::Sun],
        }
    }
}

impl BusinessHours {
    pub fn is_open_on(&self, date: NaiveDate) -> bool {
        self.open < self.close && !self.closed_days.contains(&date.weekday())
    }

    /// Opening and closing instants for `date`, or `None` when closed.
    pub fn window(&self, date: NaiveDate) -> Option<(NaiveDateTime, NaiveDateTime)> {
        self.is_open_on(date)
            .then(|| (date.and_time(self.open), date.and_time(self.close)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
pub struct Slot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Slot {
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.start < end && start < self.end
    }
}

impl AsRef<Slot> for Slot {
    fn as_ref(&self) -> &Slot {
        self
    }
}

/// A slot together with the therapists free to take it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct AvailableSlot {
    #[serde(flatten)]
    #[ts(flatten)]
    pub slot: Slot,
    pub therapist_ids: Vec<Uuid>,
}

impl AsRef<Slot> for AvailableSlot {
    fn as_ref(&self) -> &Slot {
        &self.slot
    }
}

/// An existing booking as seen by the conflict check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookedInterval {
    pub appointment_id: Uuid,
    pub therapist_id: Option<Uuid>,
    pub start: NaiveDateTime,
    pub duration_minutes: i64,
}

impl BookedInterval {
    /// End of the booking. A duration past the calendar's range saturates,
    /// so such a booking blocks everything after its start.
    pub fn end(&self) -> NaiveDateTime {
        add_minutes(self.start, self.duration_minutes).unwrap_or(NaiveDateTime::MAX)
    }
}

impl From<&Appointment> for BookedInterval {
    fn from(appointment: &Appointment) -> Self {
        Self {
            appointment_id: appointment.id,
            therapist_id: appointment.therapist_id,
            start: appointment.starts_at,
            duration_minutes: appointment.duration_minutes,
        }
    }
}

/// Which booked intervals count as conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TherapistScope {
    /// Every booking conflicts, as if the business had a single room.
    Unscoped,
    /// Only bookings held by this therapist conflict.
    Therapist(Uuid),
}

impl TherapistScope {
    fn covers(&self, interval: &BookedInterval) -> bool {
        match self {
            TherapistScope::Unscoped => true,
            TherapistScope::Therapist(id) => interval.therapist_id == Some(*id),
        }
    }
}

/// Half-open overlap test for two `(start, length)` intervals.
pub fn overlaps(
    a_start: NaiveDateTime,
    a_minutes: i64,
    b_start: NaiveDateTime,
    b_minutes: i64,
) -> bool {
    let a_end = add_minutes(a_start, a_minutes).unwrap_or(NaiveDateTime::MAX);
    let b_end = add_minutes(b_start, b_minutes).unwrap_or(NaiveDateTime::MAX);
    a_start < b_end && b_start < a_end
}

fn add_minutes(start: NaiveDateTime, minutes: i64) -> Option<NaiveDateTime> {
    TimeDelta::try_minutes(minutes).and_then(|delta| start.checked_add_signed(delta))
}

/// Back-to-back slots of `duration_minutes` from opening time, keeping only
/// those that end by closing time.
pub fn generate_slots(date: NaiveDate, hours: &BusinessHours, duration_minutes: i64) -> Vec<Slot> {
    if duration_minutes <= 0 {
        return Vec::new();
    }
    let Some((open, close)) = hours.window(date) else {
        return Vec::new();
    };

    let mut slots = Vec::new();
    let mut start = open;
    while let Some(end) = add_minutes(start, duration_minutes).filter(|end| *end <= close) {
        slots.push(Slot { start, end });
        start = end;
    }
    slots
}

fn is_free(
    slot: &Slot,
    booked: &[BookedInterval],
    scope: TherapistScope,
    exclude: Option<Uuid>,
) -> bool {
    !booked.iter().any(|interval| {
        Some(interval.appointment_id) != exclude
            && scope.covers(interval)
            && slot.overlaps(interval.start, interval.end())
    })
}

/// Drop every slot that overlaps a conflicting booking. `exclude` names the
/// appointment being rescheduled, which never conflicts with itself.
pub fn filter_booked_slots(
    slots: Vec<Slot>,
    booked: &[BookedInterval],
    scope: TherapistScope,
    exclude: Option<Uuid>,
) -> Vec<Slot> {
    slots
        .into_iter()
        .filter(|slot| is_free(slot, booked, scope, exclude))
        .collect()
}

pub fn available_slots(
    date: NaiveDate,
    hours: &BusinessHours,
    duration_minutes: i64,
    booked: &[BookedInterval],
    scope: TherapistScope,
    exclude: Option<Uuid>,
) -> Vec<Slot> {
    filter_booked_slots(
        generate_slots(date, hours, duration_minutes),
        booked,
        scope,
        exclude,
    )
}

/// Slots at least one of `therapists` can take, each listing the free
/// therapists in the order given.
pub fn any_therapist_slots(
    date: NaiveDate,
    hours: &BusinessHours,
    duration_minutes: i64,
    booked: &[BookedInterval],
    therapists: &[Uuid],
    exclude: Option<Uuid>,
) -> Vec<AvailableSlot> {
    generate_slots(date, hours, duration_minutes)
        .into_iter()
        .filter_map(|slot| {
            let therapist_ids: Vec<Uuid> = therapists
                .iter()
                .copied()
                .filter(|id| is_free(&slot, booked, TherapistScope::Therapist(*id), exclude))
                .collect();
            (!therapist_ids.is_empty()).then_some(AvailableSlot {
                slot,
                therapist_ids,
            })
        })
        .collect()
}

/// Remove slots that start before `now`.
pub fn drop_elapsed<T: AsRef<Slot>>(slots: Vec<T>, now: NaiveDateTime) -> Vec<T> {
    slots
        .into_iter()
        .filter(|slot| slot.as_ref().start >= now)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2030-03-04 is a Monday, 2030-03-10 a Sunday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 3, 4).unwrap()
    }

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        monday().and_hms_opt(hour, minute, 0).unwrap()
    }

    fn starts(slots: &[Slot]) -> Vec<NaiveDateTime> {
        slots.iter().map(|s| s.start).collect()
    }

    fn booked(therapist_id: Option<Uuid>, start: NaiveDateTime, minutes: i64) -> BookedInterval {
        BookedInterval {
            appointment_id: Uuid::new_v4(),
            therapist_id,
            start,
            duration_minutes: minutes,
        }
    }

    #[test]
    fn test_generate_steps_by_duration_within_window() {
        let hours = BusinessHours::default();

        assert_eq!(generate_slots(monday(), &hours, 60).len(), 8);
        assert_eq!(
            starts(&generate_slots(monday(), &hours, 90)),
            vec![at(9, 0), at(10, 30), at(12, 0), at(13, 30), at(15, 0)]
        );

        let hot_stone = generate_slots(monday(), &hours, 75);
        assert_eq!(hot_stone.len(), 6);
        assert_eq!(hot_stone.last().unwrap().end, at(16, 30));
    }

    #[test]
    fn test_generate_empty_for_closed_day_or_bad_duration() {
        let hours = BusinessHours::default();
        let sunday = NaiveDate::from_ymd_opt(2030, 3, 10).unwrap();

        assert!(generate_slots(sunday, &hours, 60).is_empty());
        assert!(generate_slots(monday(), &hours, 0).is_empty());
        assert!(generate_slots(monday(), &hours, -30).is_empty());
        assert!(generate_slots(monday(), &hours, 9 * 60).is_empty());

        let inverted = BusinessHours {
            open: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            close: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            closed_days: vec![],
        };
        assert!(generate_slots(monday(), &inverted, 60).is_empty());
    }

    #[test]
    fn test_overlapping_booking_removes_every_touched_slot() {
        let hours = BusinessHours::default();
        let therapist = Uuid::new_v4();
        let bookings = vec![booked(Some(therapist), at(10, 30), 90)];

        let slots = available_slots(
            monday(),
            &hours,
            60,
            &bookings,
            TherapistScope::Therapist(therapist),
            None,
        );

        let starts = starts(&slots);
        assert!(!starts.contains(&at(10, 0)));
        assert!(!starts.contains(&at(11, 0)));
        assert!(starts.contains(&at(9, 0)));
        assert!(starts.contains(&at(12, 0)));
        assert_eq!(slots.len(), 6);
    }

    #[test]
    fn test_back_to_back_bookings_do_not_conflict() {
        let hours = BusinessHours::default();
        let bookings = vec![booked(None, at(9, 0), 60)];

        let slots = available_slots(monday(), &hours, 60, &bookings, TherapistScope::Unscoped, None);

        assert_eq!(slots.first().unwrap().start, at(10, 0));
        assert!(!overlaps(at(9, 0), 60, at(10, 0), 60));
        assert!(overlaps(at(9, 0), 61, at(10, 0), 60));
    }

    #[test]
    fn test_scope_limits_conflicts_to_same_therapist() {
        let hours = BusinessHours::default();
        let anna = Uuid::new_v4();
        let marco = Uuid::new_v4();
        let bookings = vec![booked(Some(anna), at(9, 0), 60)];

        let for_marco = available_slots(
            monday(),
            &hours,
            60,
            &bookings,
            TherapistScope::Therapist(marco),
            None,
        );
        assert_eq!(for_marco.len(), 8);

        let unscoped =
            available_slots(monday(), &hours, 60, &bookings, TherapistScope::Unscoped, None);
        assert_eq!(unscoped.len(), 7);
    }

    #[test]
    fn test_rescheduled_appointment_never_conflicts_with_itself() {
        let hours = BusinessHours::default();
        let anna = Uuid::new_v4();
        let own = booked(Some(anna), at(9, 0), 60);
        let other = booked(Some(anna), at(11, 0), 60);
        let own_id = own.appointment_id;
        let bookings = vec![own, other];

        let slots = available_slots(
            monday(),
            &hours,
            60,
            &bookings,
            TherapistScope::Therapist(anna),
            Some(own_id),
        );

        let starts = starts(&slots);
        assert!(starts.contains(&at(9, 0)));
        assert!(!starts.contains(&at(11, 0)));
    }

    #[test]
    fn test_computation_is_idempotent() {
        let hours = BusinessHours::default();
        let anna = Uuid::new_v4();
        let bookings = vec![
            booked(Some(anna), at(12, 0), 75),
            booked(Some(anna), at(9, 30), 30),
        ];

        let first = available_slots(
            monday(),
            &hours,
            75,
            &bookings,
            TherapistScope::Therapist(anna),
            None,
        );
        let second = available_slots(
            monday(),
            &hours,
            75,
            &bookings,
            TherapistScope::Therapist(anna),
            None,
        );
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0].start < w[1].start));
    }

    #[test]
    fn test_any_therapist_lists_free_therapists_in_order() {
        let hours = BusinessHours::default();
        let anna = Uuid::new_v4();
        let marco = Uuid::new_v4();
        let bookings = vec![
            booked(Some(anna), at(9, 0), 60),
            booked(Some(anna), at(10, 0), 60),
            booked(Some(marco), at(10, 0), 60),
        ];

        let slots = any_therapist_slots(monday(), &hours, 60, &bookings, &[anna, marco], None);

        assert_eq!(slots[0].slot.start, at(9, 0));
        assert_eq!(slots[0].therapist_ids, vec![marco]);
        assert_eq!(slots[1].slot.start, at(11, 0));
        assert_eq!(slots[1].therapist_ids, vec![anna, marco]);
        assert_eq!(slots.len(), 7);
    }

    #[test]
    fn test_any_therapist_without_therapists_is_empty() {
        let slots = any_therapist_slots(monday(), &BusinessHours::default(), 60, &[], &[], None);
        assert!(slots.is_empty());
    }

    #[test]
    fn test_oversized_durations_yield_no_slots() {
        let hours = BusinessHours::default();
        assert!(generate_slots(monday(), &hours, 24 * 60).is_empty());
        assert!(generate_slots(monday(), &hours, i64::MAX / 2).is_empty());
        assert!(generate_slots(monday(), &hours, i64::MAX).is_empty());
    }

    #[test]
    fn test_oversized_booking_blocks_rest_of_day() {
        let hours = BusinessHours::default();
        let huge = booked(None, at(13, 0), i64::MAX / 2);
        assert_eq!(huge.end(), NaiveDateTime::MAX);
        assert!(overlaps(at(15, 0), 60, at(13, 0), i64::MAX));

        let slots = available_slots(monday(), &hours, 60, &[huge], TherapistScope::Unscoped, None);
        assert_eq!(starts(&slots), vec![at(9, 0), at(10, 0), at(11, 0), at(12, 0)]);
    }

    #[test]
    fn test_drop_elapsed_keeps_slot_starting_now() {
        let slots = generate_slots(monday(), &BusinessHours::default(), 60);
        let remaining = drop_elapsed(slots, at(12, 0));
        assert_eq!(remaining.first().unwrap().start, at(12, 0));
        assert_eq!(remaining.len(), 5);
    }

    #[test]
    fn test_business_hours_parse_from_toml() {
        let hours: BusinessHours = toml::from_str(
            r#"
            open = "08:30:00"
            close = "12:00:00"
            closed_days = ["Sat", "Sun"]
            "#,
        )
        .unwrap();
        let saturday = NaiveDate::from_ymd_opt(2030, 3, 9).unwrap();

        assert!(!hours.is_open_on(saturday));
        assert_eq!(
            starts(&generate_slots(monday(), &hours, 60)),
            vec![at(8, 30), at(9, 30), at(10, 30)]
        );
    }
}
