pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod state;
pub mod store;

pub use models::{Appointment, AppointmentStatus, SchedulingError};
pub use services::{
    AppointmentAdmissionService, AppointmentLifecycleService, AvailabilityService,
    ConflictDetectionService,
};
pub use state::AppState;
pub use store::AppointmentStore;
