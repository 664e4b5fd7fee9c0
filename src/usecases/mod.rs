//! Application use cases. Orchestrate domain logic via ports.

pub mod attendance_service;
pub mod geofence_service;
pub mod override_service;

pub use attendance_service::AttendanceService;
pub use geofence_service::GeofenceService;
pub use override_service::OverrideService;
