pub mod admission;
pub mod availability;
pub mod conflict;
pub mod lifecycle;

pub use admission::AppointmentAdmissionService;
pub use availability::AvailabilityService;
pub use conflict::ConflictDetectionService;
pub use lifecycle::AppointmentLifecycleService;
