// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::AppError;

use crate::models::{
    AdmitAppointmentRequest, AppointmentSearchQuery, CancelAppointmentRequest,
    CompleteAppointmentRequest, RescheduleAppointmentRequest, SchedulingError,
};
use crate::services::AppointmentAdmissionService;
use crate::state::AppState;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct AvailabilityCheckQuery {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

#[derive(Debug, Deserialize)]
pub struct ConflictCheckQuery {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_minutes: Option<i32>,
    pub exclude_appointment_id: Option<Uuid>,
}

fn admission_service(state: &AppState) -> AppointmentAdmissionService {
    AppointmentAdmissionService::new(Arc::clone(&state.registry), Arc::clone(&state.store))
}

fn to_app_error(error: SchedulingError) -> AppError {
    match error {
        SchedulingError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        SchedulingError::PatientNotFound => AppError::NotFound("Patient not found".to_string()),
        SchedulingError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        SchedulingError::UpstreamUnavailable(detail) => AppError::UpstreamUnavailable(detail),
        SchedulingError::InvalidSlot(detail) => AppError::BadRequest(detail),
        SchedulingError::ConflictDetected => {
            AppError::Conflict("The doctor already has an appointment in that slot".to_string())
        }
        SchedulingError::InvalidTransition(status) => AppError::Conflict(format!(
            "Appointment cannot be modified in status {}",
            status
        )),
        SchedulingError::Validation(detail) => AppError::ValidationError(detail),
    }
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn admit_appointment(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AdmitAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = admission_service(&state)
        .admit_appointment(request)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = admission_service(&state)
        .get_appointment(appointment_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({ "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn search_appointments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AppointmentSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = admission_service(&state).search_appointments(&query).await;

    Ok(Json(json!({
        "appointments": appointments,
        "count": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = admission_service(&state)
        .reschedule_appointment(appointment_id, request)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn confirm_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = admission_service(&state)
        .confirm_appointment(appointment_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": format!("Appointment {} confirmed", appointment_id)
    })))
}

#[axum::debug_handler]
pub async fn start_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = admission_service(&state)
        .start_appointment(appointment_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": format!("Appointment {} in progress", appointment_id)
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = admission_service(&state)
        .cancel_appointment(appointment_id, request)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": format!("Appointment {} cancelled", appointment_id)
    })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CompleteAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = admission_service(&state)
        .complete_appointment(appointment_id, request)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": format!("Appointment {} completed", appointment_id)
    })))
}

// ==============================================================================
// LISTING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointments = admission_service(&state)
        .patient_appointments(patient_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "count": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointments = admission_service(&state)
        .doctor_appointments(doctor_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "count": appointments.len()
    })))
}

// ==============================================================================
// DECISION HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn check_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityCheckQuery>,
) -> Result<Json<Value>, AppError> {
    let available = admission_service(&state)
        .check_availability(query.doctor_id, query.date, query.time)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "doctor_id": query.doctor_id,
        "date": query.date,
        "time": query.time,
        "available": available
    })))
}

#[axum::debug_handler]
pub async fn check_conflicts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConflictCheckQuery>,
) -> Result<Json<Value>, AppError> {
    let has_conflict = admission_service(&state)
        .has_conflict(
            query.doctor_id,
            query.date,
            query.time,
            query.duration_minutes,
            query.exclude_appointment_id,
        )
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "doctor_id": query.doctor_id,
        "date": query.date,
        "time": query.time,
        "has_conflict": has_conflict
    })))
}
