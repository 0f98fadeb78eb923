use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Working day names as the doctor registry stores them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WorkingDay {
    Lunes,
    Martes,
    Miercoles,
    Jueves,
    Viernes,
    Sabado,
    Domingo,
}

impl WorkingDay {
    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => WorkingDay::Lunes,
            Weekday::Tue => WorkingDay::Martes,
            Weekday::Wed => WorkingDay::Miercoles,
            Weekday::Thu => WorkingDay::Jueves,
            Weekday::Fri => WorkingDay::Viernes,
            Weekday::Sat => WorkingDay::Sabado,
            Weekday::Sun => WorkingDay::Domingo,
        }
    }
}

impl fmt::Display for WorkingDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkingDay::Lunes => "lunes",
            WorkingDay::Martes => "martes",
            WorkingDay::Miercoles => "miercoles",
            WorkingDay::Jueves => "jueves",
            WorkingDay::Viernes => "viernes",
            WorkingDay::Sabado => "sabado",
            WorkingDay::Domingo => "domingo",
        };
        write!(f, "{}", name)
    }
}

/// Doctor record as returned by the doctors registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub full_name: String,
    pub specialty: String,
    pub working_days: Vec<WorkingDay>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub consultation_duration: i32,
    pub consultation_fee: f64,
}

impl DoctorProfile {
    /// Validate the schedule invariants before the profile is used for
    /// scheduling decisions. A malformed profile is reported, not treated
    /// as available.
    pub fn validate(&self) -> Result<(), String> {
        if self.start_time >= self.end_time {
            return Err(format!(
                "working hours start {} is not before end {}",
                self.start_time, self.end_time
            ));
        }
        if self.consultation_duration <= 0 || self.consultation_duration > 120 {
            return Err(format!(
                "consultation duration {} minutes is out of range (1-120)",
                self.consultation_duration
            ));
        }
        Ok(())
    }

    pub fn works_on(&self, day: WorkingDay) -> bool {
        self.working_days.contains(&day)
    }
}

/// Patient record subset used by the scheduling core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSummary {
    pub id: Uuid,
    pub full_name: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    #[error("{0} not found in registry")]
    NotFound(&'static str),

    #[error("registry unavailable: {0}")]
    Unavailable(String),

    #[error("malformed registry record: {0}")]
    Malformed(String),
}
