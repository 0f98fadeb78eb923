// libs/scheduling-cell/src/store.rs
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentSearchQuery, SchedulingError};

/// In-memory appointment store.
///
/// Holds one lock per doctor so that a conflict check and the insert or
/// update that follows it run inside a single lock scope. Two concurrent
/// admissions for the same doctor cannot both pass the check against a
/// stale snapshot.
pub struct AppointmentStore {
    records: RwLock<HashMap<Uuid, Appointment>>,
    doctor_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl AppointmentStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            doctor_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the scheduling lock for one doctor. The guard must be held
    /// across the conflict check and the subsequent commit.
    pub async fn doctor_lock(&self, doctor_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.doctor_locks.lock().await;
            Arc::clone(locks.entry(doctor_id).or_default())
        };
        lock.lock_owned().await
    }

    pub async fn insert(&self, appointment: Appointment) {
        debug!("Storing appointment {}", appointment.id);
        self.records
            .write()
            .await
            .insert(appointment.id, appointment);
    }

    pub async fn get(&self, id: Uuid) -> Result<Appointment, SchedulingError> {
        self.records
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SchedulingError::NotFound)
    }

    /// Read-modify-write under a single write-lock scope. The closure sees
    /// the current record and produces the replacement; validation inside
    /// it cannot race against another mutation of the same record.
    pub async fn mutate<F>(&self, id: Uuid, f: F) -> Result<Appointment, SchedulingError>
    where
        F: FnOnce(&Appointment) -> Result<Appointment, SchedulingError>,
    {
        let mut records = self.records.write().await;
        let current = records.get(&id).ok_or(SchedulingError::NotFound)?;
        let updated = f(current)?;
        records.insert(id, updated.clone());
        Ok(updated)
    }

    /// Appointments occupying the doctor's slots on a date, optionally
    /// excluding one id (the self-update path).
    pub async fn active_for_doctor(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        exclude_id: Option<Uuid>,
    ) -> Vec<Appointment> {
        self.records
            .read()
            .await
            .values()
            .filter(|a| {
                a.doctor_id == doctor_id
                    && a.appointment_date == date
                    && a.status.is_occupying()
                    && Some(a.id) != exclude_id
            })
            .cloned()
            .collect()
    }

    pub async fn search(&self, query: &AppointmentSearchQuery) -> Vec<Appointment> {
        let records = self.records.read().await;
        let mut matches: Vec<Appointment> = records
            .values()
            .filter(|a| {
                query.patient_id.map_or(true, |id| a.patient_id == id)
                    && query.doctor_id.map_or(true, |id| a.doctor_id == id)
                    && query.status.map_or(true, |s| a.status == s)
                    && query
                        .appointment_date
                        .map_or(true, |d| a.appointment_date == d)
            })
            .cloned()
            .collect();

        matches.sort_by_key(|a| a.scheduled_start());

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        matches.into_iter().skip(offset).take(limit).collect()
    }
}

impl Default for AppointmentStore {
    fn default() -> Self {
        Self::new()
    }
}
