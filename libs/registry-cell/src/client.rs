use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, warn};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::models::{DoctorProfile, PatientSummary, RegistryError};

/// HTTP client for the patient and doctor registries.
///
/// Lookups carry a bounded timeout; a timeout or transport failure is
/// reported as `Unavailable`, never conflated with `NotFound`.
pub struct RegistryClient {
    client: Client,
    patients_base_url: String,
    doctors_base_url: String,
}

impl RegistryClient {
    pub fn new(config: &AppConfig) -> Self {
        // Built once at startup; a client without the timeout would let a
        // stalled registry hang every lookup, so refuse to start instead.
        let client = Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()
            .expect("failed to build registry HTTP client");

        Self {
            client,
            patients_base_url: config.patients_service_url.clone(),
            doctors_base_url: config.doctors_service_url.clone(),
        }
    }

    pub async fn get_doctor(&self, doctor_id: Uuid) -> Result<DoctorProfile, RegistryError> {
        let url = format!("{}/doctors/{}", self.doctors_base_url, doctor_id);
        let profile: DoctorProfile = self.fetch(&url, "doctor").await?;

        if let Err(reason) = profile.validate() {
            warn!("Doctor {} has a malformed schedule: {}", doctor_id, reason);
            return Err(RegistryError::Malformed(reason));
        }

        Ok(profile)
    }

    pub async fn get_patient(&self, patient_id: Uuid) -> Result<PatientSummary, RegistryError> {
        let url = format!("{}/patients/{}", self.patients_base_url, patient_id);
        self.fetch(&url, "patient").await
    }

    async fn fetch<T>(&self, url: &str, what: &'static str) -> Result<T, RegistryError>
    where
        T: DeserializeOwned,
    {
        debug!("Registry lookup: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            error!("Registry request to {} failed: {}", url, e);
            RegistryError::Unavailable(e.to_string())
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(what));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Registry error ({}): {}", status, body);
            return Err(RegistryError::Unavailable(format!(
                "registry returned {}",
                status
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| RegistryError::Malformed(e.to_string()))
    }
}
