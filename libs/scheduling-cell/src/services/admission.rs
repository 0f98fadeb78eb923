// libs/scheduling-cell/src/services/admission.rs
use chrono::{NaiveDate, NaiveTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use registry_cell::models::RegistryError;
use registry_cell::RegistryClient;

use crate::models::{
    AdmitAppointmentRequest, Appointment, AppointmentSearchQuery, AppointmentStatus,
    CancelAppointmentRequest, CompleteAppointmentRequest, RescheduleAppointmentRequest,
    SchedulingError,
};
use crate::services::availability::AvailabilityService;
use crate::services::conflict::ConflictDetectionService;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::store::AppointmentStore;

/// Orchestrates appointment admission and the transitions that follow.
///
/// The conflict check and the commit that depends on it always run inside
/// the same per-doctor lock scope, so two concurrent requests cannot both
/// pass the check against a stale snapshot and double-book a slot. Status
/// transitions validate and commit through `AppointmentStore::mutate`, a
/// single write-lock scope per record.
pub struct AppointmentAdmissionService {
    registry: Arc<RegistryClient>,
    store: Arc<AppointmentStore>,
    availability_service: AvailabilityService,
    conflict_service: ConflictDetectionService,
    lifecycle_service: AppointmentLifecycleService,
}

impl AppointmentAdmissionService {
    pub fn new(registry: Arc<RegistryClient>, store: Arc<AppointmentStore>) -> Self {
        let conflict_service = ConflictDetectionService::new(Arc::clone(&store));
        Self {
            registry,
            store,
            availability_service: AvailabilityService::new(),
            conflict_service,
            lifecycle_service: AppointmentLifecycleService::new(),
        }
    }

    /// Admit a new appointment: patient exists, doctor exists, date is not
    /// in the past, doctor is in service, slot is free. The result is a
    /// `scheduled` appointment with the consultation fee snapshotted.
    pub async fn admit_appointment(
        &self,
        request: AdmitAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        info!(
            "Admitting appointment for patient {} with doctor {}",
            request.patient_id, request.doctor_id
        );

        self.registry
            .get_patient(request.patient_id)
            .await
            .map_err(registry_error)?;

        let profile = self
            .registry
            .get_doctor(request.doctor_id)
            .await
            .map_err(registry_error)?;

        if request.appointment_date < Utc::now().date_naive() {
            return Err(SchedulingError::InvalidSlot(
                "appointments cannot be scheduled on past dates".to_string(),
            ));
        }

        if !self.availability_service.check_availability(
            &profile,
            request.appointment_date,
            request.appointment_time,
        ) {
            return Err(SchedulingError::InvalidSlot(format!(
                "doctor is not available on {} at {}",
                request.appointment_date, request.appointment_time
            )));
        }

        let duration_minutes = match request.duration_minutes {
            Some(d) => validated_duration(d)?,
            None => profile.consultation_duration,
        };

        if request.reason.trim().is_empty() {
            return Err(SchedulingError::Validation(
                "reason must not be empty".to_string(),
            ));
        }

        // Conflict check and insert share one lock scope.
        let _guard = self.store.doctor_lock(request.doctor_id).await;

        if self
            .conflict_service
            .has_conflict(
                request.doctor_id,
                request.appointment_date,
                request.appointment_time,
                duration_minutes,
                None,
            )
            .await
        {
            return Err(SchedulingError::ConflictDetected);
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            appointment_date: request.appointment_date,
            appointment_time: request.appointment_time,
            duration_minutes,
            status: AppointmentStatus::Scheduled,
            reason: request.reason,
            notes: request.notes,
            total_cost: profile.consultation_fee,
            diagnosis: None,
            treatment: None,
            next_appointment_needed: false,
            next_appointment_notes: None,
            created_at: now,
            updated_at: now,
        };

        self.store.insert(appointment.clone()).await;

        info!(
            "Appointment {} scheduled with doctor {}",
            appointment.id, appointment.doctor_id
        );
        Ok(appointment)
    }

    /// Move an appointment to a new slot, re-running the availability and
    /// conflict checks against it (the appointment's own id is excluded).
    /// A request that carries only a reason records it without touching
    /// the slot.
    pub async fn reschedule_appointment(
        &self,
        appointment_id: Uuid,
        request: RescheduleAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Rescheduling appointment {}", appointment_id);

        let current = self.store.get(appointment_id).await?;
        if current.status.is_terminal() {
            return Err(SchedulingError::InvalidTransition(current.status));
        }

        let new_date = request.new_date.unwrap_or(current.appointment_date);
        let new_time = request.new_time.unwrap_or(current.appointment_time);
        let new_duration = match request.new_duration_minutes {
            Some(d) => validated_duration(d)?,
            None => current.duration_minutes,
        };

        let slot_changed = new_date != current.appointment_date
            || new_time != current.appointment_time
            || new_duration != current.duration_minutes;

        if slot_changed {
            let profile = self
                .registry
                .get_doctor(current.doctor_id)
                .await
                .map_err(registry_error)?;

            if new_date < Utc::now().date_naive() {
                return Err(SchedulingError::InvalidSlot(
                    "appointments cannot be moved to past dates".to_string(),
                ));
            }

            if !self
                .availability_service
                .check_availability(&profile, new_date, new_time)
            {
                return Err(SchedulingError::InvalidSlot(format!(
                    "doctor is not available on {} at {}",
                    new_date, new_time
                )));
            }

            let _guard = self.store.doctor_lock(current.doctor_id).await;

            if self
                .conflict_service
                .has_conflict(
                    current.doctor_id,
                    new_date,
                    new_time,
                    new_duration,
                    Some(appointment_id),
                )
                .await
            {
                warn!(
                    "Reschedule of appointment {} rejected: slot conflict",
                    appointment_id
                );
                return Err(SchedulingError::ConflictDetected);
            }

            let updated = self
                .apply_reschedule(appointment_id, new_date, new_time, new_duration, request.reason)
                .await?;

            info!(
                "Appointment {} rescheduled to {} {}",
                appointment_id, new_date, new_time
            );
            return Ok(updated);
        }

        if request.reason.is_none() {
            return Ok(current);
        }

        self.apply_reschedule(appointment_id, new_date, new_time, new_duration, request.reason)
            .await
    }

    /// Commit a reschedule. The status is re-checked inside the write-lock
    /// scope so a cancel or complete that landed since the earlier read
    /// cannot be overwritten by a stale snapshot.
    async fn apply_reschedule(
        &self,
        appointment_id: Uuid,
        new_date: NaiveDate,
        new_time: NaiveTime,
        new_duration: i32,
        reason: Option<String>,
    ) -> Result<Appointment, SchedulingError> {
        self.store
            .mutate(appointment_id, |current| {
                if current.status.is_terminal() {
                    return Err(SchedulingError::InvalidTransition(current.status));
                }
                let mut updated = current.clone();
                updated.appointment_date = new_date;
                updated.appointment_time = new_time;
                updated.duration_minutes = new_duration;
                if let Some(reason) = reason {
                    updated.notes = Some(annotated(&updated.notes, "rescheduled", &reason));
                }
                updated.updated_at = Utc::now();
                Ok(updated)
            })
            .await
    }

    /// Confirm a scheduled appointment.
    pub async fn confirm_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Appointment, SchedulingError> {
        self.transition_status(appointment_id, AppointmentStatus::Confirmed)
            .await
    }

    /// Mark a confirmed or scheduled appointment as in progress.
    pub async fn start_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Appointment, SchedulingError> {
        self.transition_status(appointment_id, AppointmentStatus::InProgress)
            .await
    }

    /// Cancel an appointment. Terminal appointments are immutable.
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        request: CancelAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Cancelling appointment {}", appointment_id);

        let updated = self
            .store
            .mutate(appointment_id, |current| {
                self.lifecycle_service
                    .validate_status_transition(&current.status, &AppointmentStatus::Cancelled)?;

                let mut updated = current.clone();
                updated.status = AppointmentStatus::Cancelled;
                if let Some(reason) = request.reason {
                    updated.notes = Some(annotated(&updated.notes, "cancelled", &reason));
                }
                updated.updated_at = Utc::now();
                Ok(updated)
            })
            .await?;

        info!("Appointment {} cancelled", appointment_id);
        Ok(updated)
    }

    /// Complete an appointment with its diagnosis. The appointment becomes
    /// terminal and immutable afterwards.
    pub async fn complete_appointment(
        &self,
        appointment_id: Uuid,
        request: CompleteAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Completing appointment {}", appointment_id);

        if request.diagnosis.trim().is_empty() {
            return Err(SchedulingError::Validation(
                "diagnosis is required to complete an appointment".to_string(),
            ));
        }

        let updated = self
            .store
            .mutate(appointment_id, |current| {
                self.lifecycle_service
                    .validate_status_transition(&current.status, &AppointmentStatus::Completed)?;

                let mut updated = current.clone();
                updated.status = AppointmentStatus::Completed;
                updated.diagnosis = Some(request.diagnosis);
                updated.treatment = request.treatment;
                updated.next_appointment_needed = request.next_appointment_needed;
                updated.next_appointment_notes = request.next_appointment_notes;
                updated.updated_at = Utc::now();
                Ok(updated)
            })
            .await?;

        info!("Appointment {} completed", appointment_id);
        Ok(updated)
    }

    async fn transition_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, SchedulingError> {
        debug!(
            "Transitioning appointment {} to {}",
            appointment_id, new_status
        );

        let updated = self
            .store
            .mutate(appointment_id, |current| {
                self.lifecycle_service
                    .validate_status_transition(&current.status, &new_status)?;

                let mut updated = current.clone();
                updated.status = new_status;
                updated.updated_at = Utc::now();
                Ok(updated)
            })
            .await?;

        info!("Appointment {} is now {}", appointment_id, new_status);
        Ok(updated)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Appointment, SchedulingError> {
        self.store.get(appointment_id).await
    }

    pub async fn search_appointments(&self, query: &AppointmentSearchQuery) -> Vec<Appointment> {
        self.store.search(query).await
    }

    /// A patient's appointments; the patient must exist in the registry.
    pub async fn patient_appointments(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        self.registry
            .get_patient(patient_id)
            .await
            .map_err(registry_error)?;

        let query = AppointmentSearchQuery {
            patient_id: Some(patient_id),
            ..Default::default()
        };
        Ok(self.store.search(&query).await)
    }

    /// A doctor's appointments; the doctor must exist in the registry.
    pub async fn doctor_appointments(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        self.registry
            .get_doctor(doctor_id)
            .await
            .map_err(registry_error)?;

        let query = AppointmentSearchQuery {
            doctor_id: Some(doctor_id),
            ..Default::default()
        };
        Ok(self.store.search(&query).await)
    }

    /// Availability decision for a doctor fetched from the registry.
    pub async fn check_availability(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<bool, SchedulingError> {
        let profile = self
            .registry
            .get_doctor(doctor_id)
            .await
            .map_err(registry_error)?;
        Ok(self
            .availability_service
            .check_availability(&profile, date, time))
    }

    /// Conflict decision for a candidate slot. When no duration is given
    /// the doctor's configured consultation duration is used.
    pub async fn has_conflict(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: Option<i32>,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<bool, SchedulingError> {
        let duration = match duration_minutes {
            Some(d) => validated_duration(d)?,
            None => {
                self.registry
                    .get_doctor(doctor_id)
                    .await
                    .map_err(registry_error)?
                    .consultation_duration
            }
        };

        Ok(self
            .conflict_service
            .has_conflict(doctor_id, date, time, duration, exclude_appointment_id)
            .await)
    }
}

fn validated_duration(duration_minutes: i32) -> Result<i32, SchedulingError> {
    if duration_minutes <= 0 {
        return Err(SchedulingError::Validation(
            "duration_minutes must be positive".to_string(),
        ));
    }
    Ok(duration_minutes)
}

/// Append an annotation to the notes without discarding what is there.
fn annotated(notes: &Option<String>, label: &str, reason: &str) -> String {
    match notes {
        Some(existing) => format!("{}; {}: {}", existing, label, reason),
        None => format!("{}: {}", label, reason),
    }
}

/// A failed lookup due to network issues must never read as "not found".
fn registry_error(error: RegistryError) -> SchedulingError {
    match error {
        RegistryError::NotFound("patient") => SchedulingError::PatientNotFound,
        RegistryError::NotFound(_) => SchedulingError::DoctorNotFound,
        RegistryError::Unavailable(detail) => SchedulingError::UpstreamUnavailable(detail),
        RegistryError::Malformed(detail) => SchedulingError::Validation(detail),
    }
}
