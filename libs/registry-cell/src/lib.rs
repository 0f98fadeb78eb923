pub mod client;
pub mod models;

pub use client::RegistryClient;
pub use models::{DoctorProfile, PatientSummary, RegistryError, WorkingDay};
