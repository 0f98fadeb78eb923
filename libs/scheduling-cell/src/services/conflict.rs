// libs/scheduling-cell/src/services/conflict.rs
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::store::AppointmentStore;

/// Interval-overlap detection against a doctor's existing bookings.
pub struct ConflictDetectionService {
    store: Arc<AppointmentStore>,
}

impl ConflictDetectionService {
    pub fn new(store: Arc<AppointmentStore>) -> Self {
        Self { store }
    }

    /// Check whether the candidate slot overlaps any occupying appointment
    /// for the doctor on that date. Pure decision over the fetched list.
    pub async fn has_conflict(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: i32,
        exclude_appointment_id: Option<Uuid>,
    ) -> bool {
        let candidate_start = date.and_time(time);
        let candidate_end = candidate_start + Duration::minutes(duration_minutes as i64);

        debug!(
            "Checking conflicts for doctor {} in [{}, {})",
            doctor_id, candidate_start, candidate_end
        );

        let existing = self
            .store
            .active_for_doctor(doctor_id, date, exclude_appointment_id)
            .await;

        for appointment in existing {
            let (existing_start, existing_end) = appointment.interval();
            if Self::intervals_overlap(candidate_start, candidate_end, existing_start, existing_end)
            {
                warn!(
                    "Conflict detected for doctor {}: candidate [{}, {}) overlaps appointment {}",
                    doctor_id, candidate_start, candidate_end, appointment.id
                );
                return true;
            }
        }

        false
    }

    /// Two half-open intervals overlap iff start1 < end2 AND start2 < end1.
    /// Back-to-back slots share a boundary instant and do not conflict.
    fn intervals_overlap(
        start1: NaiveDateTime,
        end1: NaiveDateTime,
        start2: NaiveDateTime,
        end2: NaiveDateTime,
    ) -> bool {
        start1 < end2 && start2 < end1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Appointment, AppointmentStatus};
    use chrono::Utc;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 7).unwrap()
    }

    fn existing(
        doctor_id: Uuid,
        time: &str,
        duration_minutes: i32,
        status: AppointmentStatus,
    ) -> Appointment {
        let now = Utc::now();
        Appointment {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            doctor_id,
            appointment_date: monday(),
            appointment_time: time.parse().unwrap(),
            duration_minutes,
            status,
            reason: "consulta general".to_string(),
            notes: None,
            total_cost: 500.0,
            diagnosis: None,
            treatment: None,
            next_appointment_needed: false,
            next_appointment_notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn service_with(appointments: Vec<Appointment>) -> ConflictDetectionService {
        let store = Arc::new(AppointmentStore::new());
        for a in appointments {
            store.insert(a).await;
        }
        ConflictDetectionService::new(store)
    }

    #[tokio::test]
    async fn overlapping_candidate_conflicts() {
        let doctor_id = Uuid::new_v4();
        let service = service_with(vec![existing(
            doctor_id,
            "09:00:00",
            30,
            AppointmentStatus::Scheduled,
        )])
        .await;

        // 09:15 falls inside [09:00, 09:30) no matter the candidate duration.
        assert!(
            service
                .has_conflict(doctor_id, monday(), "09:15:00".parse().unwrap(), 30, None)
                .await
        );
        assert!(
            service
                .has_conflict(doctor_id, monday(), "09:15:00".parse().unwrap(), 5, None)
                .await
        );
        // Candidate straddling the start also conflicts.
        assert!(
            service
                .has_conflict(doctor_id, monday(), "08:45:00".parse().unwrap(), 30, None)
                .await
        );
    }

    #[tokio::test]
    async fn back_to_back_slots_do_not_conflict() {
        let doctor_id = Uuid::new_v4();
        let service = service_with(vec![existing(
            doctor_id,
            "09:00:00",
            30,
            AppointmentStatus::Confirmed,
        )])
        .await;

        // Ends exactly when the existing one starts.
        assert!(
            !service
                .has_conflict(doctor_id, monday(), "08:30:00".parse().unwrap(), 30, None)
                .await
        );
        // Starts exactly when the existing one ends.
        assert!(
            !service
                .has_conflict(doctor_id, monday(), "09:30:00".parse().unwrap(), 30, None)
                .await
        );
    }

    #[tokio::test]
    async fn existing_interval_uses_stored_duration() {
        let doctor_id = Uuid::new_v4();
        // A 60-minute booking occupies [09:00, 10:00).
        let service = service_with(vec![existing(
            doctor_id,
            "09:00:00",
            60,
            AppointmentStatus::Scheduled,
        )])
        .await;

        assert!(
            service
                .has_conflict(doctor_id, monday(), "09:45:00".parse().unwrap(), 30, None)
                .await
        );
        assert!(
            !service
                .has_conflict(doctor_id, monday(), "10:00:00".parse().unwrap(), 30, None)
                .await
        );
    }

    #[tokio::test]
    async fn terminal_appointments_do_not_occupy() {
        let doctor_id = Uuid::new_v4();
        let service = service_with(vec![
            existing(doctor_id, "09:00:00", 30, AppointmentStatus::Completed),
            existing(doctor_id, "09:00:00", 30, AppointmentStatus::Cancelled),
        ])
        .await;

        assert!(
            !service
                .has_conflict(doctor_id, monday(), "09:00:00".parse().unwrap(), 30, None)
                .await
        );
    }

    #[tokio::test]
    async fn exclude_id_allows_self_update() {
        let doctor_id = Uuid::new_v4();
        let appointment = existing(doctor_id, "09:00:00", 30, AppointmentStatus::Scheduled);
        let own_id = appointment.id;
        let service = service_with(vec![appointment]).await;

        assert!(
            service
                .has_conflict(doctor_id, monday(), "09:00:00".parse().unwrap(), 30, None)
                .await
        );
        assert!(
            !service
                .has_conflict(
                    doctor_id,
                    monday(),
                    "09:00:00".parse().unwrap(),
                    30,
                    Some(own_id)
                )
                .await
        );
    }
}
