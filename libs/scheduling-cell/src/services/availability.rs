// libs/scheduling-cell/src/services/availability.rs
use chrono::{Datelike, NaiveDate, NaiveTime};
use tracing::debug;

use registry_cell::models::{DoctorProfile, WorkingDay};

/// Working-day and working-hours check against a doctor's schedule.
pub struct AvailabilityService;

impl AvailabilityService {
    pub fn new() -> Self {
        Self
    }

    /// True when the doctor is in service on `date` at `time`.
    ///
    /// Both window boundaries are inclusive: an appointment starting
    /// exactly at closing time is accepted.
    pub fn check_availability(
        &self,
        profile: &DoctorProfile,
        date: NaiveDate,
        time: NaiveTime,
    ) -> bool {
        let day = WorkingDay::from_weekday(date.weekday());
        if !profile.works_on(day) {
            debug!("Doctor {} does not work on {}", profile.id, day);
            return false;
        }

        profile.start_time <= time && time <= profile.end_time
    }
}

impl Default for AvailabilityService {
    fn default() -> Self {
        Self::new()
    }
}
