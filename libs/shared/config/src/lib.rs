use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub patients_service_url: String,
    pub doctors_service_url: String,
    pub upstream_timeout_secs: u64,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            patients_service_url: env::var("PATIENTS_SERVICE_URL")
                .unwrap_or_else(|_| {
                    warn!("PATIENTS_SERVICE_URL not set, using default");
                    "http://localhost:8081".to_string()
                }),
            doctors_service_url: env::var("DOCTORS_SERVICE_URL")
                .unwrap_or_else(|_| {
                    warn!("DOCTORS_SERVICE_URL not set, using default");
                    "http://localhost:8082".to_string()
                }),
            upstream_timeout_secs: env::var("UPSTREAM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8083),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.patients_service_url.is_empty() && !self.doctors_service_url.is_empty()
    }
}
