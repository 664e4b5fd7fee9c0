//! Domain errors. Returned by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Login required")]
    LoginRequired,

    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("Invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("No geofence configured for class '{0}'")]
    NoGeofenceConfigured(String),

    /// Rejected location; `excess_meters` is how far past the radius it lies.
    #[error("Outside area: {excess_meters}m beyond the allowed radius")]
    OutsideGeofence { excess_meters: u64 },

    #[error("A check-in is already open for this student")]
    SessionAlreadyOpen,

    #[error("No active check-in")]
    NoActiveSession,

    #[error("Check-out time precedes check-in time")]
    ClockSkew,

    #[error("Invalid override request: {0}")]
    InvalidOverrideRequest(String),

    #[error("Invalid geofence: {0}")]
    InvalidGeofence(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Transient backend failure. The only kind worth retrying.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl DomainError {
    /// True when the caller may retry the same operation verbatim.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::StoreUnavailable(_))
    }
}
