//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{AttendanceSession, Coordinate, DomainError, Geofence, OverrideRequest, UserProfile};
use chrono::{DateTime, Utc};

/// Identity provider. `None` means nobody is signed in.
#[async_trait::async_trait]
pub trait IdentityPort: Send + Sync {
    async fn current_user(&self) -> Result<Option<UserProfile>, DomainError>;
}

/// Device location. May never resolve on its own (e.g. a pending permission
/// prompt); callers bound it with a timeout.
#[async_trait::async_trait]
pub trait LocationPort: Send + Sync {
    /// Fails with `LocationUnavailable` on denial or missing capability.
    async fn current_location(&self) -> Result<Coordinate, DomainError>;
}

/// Wall clock. Injected so tests can pin check-in/check-out times.
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Advisor-configured geofences, one per class.
#[async_trait::async_trait]
pub trait GeofenceStore: Send + Sync {
    /// `Ok(None)` when the class has no fence configured.
    async fn geofence_for(&self, class_name: &str) -> Result<Option<Geofence>, DomainError>;

    /// Insert or replace the fence for `fence.class_name`.
    async fn save_geofence(&self, fence: &Geofence) -> Result<(), DomainError>;
}

/// Attendance sessions.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new open session. Must be a conditional write: fails with
    /// `SessionAlreadyOpen` if the subject already has an open session.
    async fn create(&self, session: &AttendanceSession) -> Result<(), DomainError>;

    /// Most recently opened session (highest `check_in_at`) with no check-out.
    async fn find_open_session(
        &self,
        subject_id: &str,
    ) -> Result<Option<AttendanceSession>, DomainError>;

    /// Persist the check-out fields of `session`. Only a still-open row is
    /// updated; fails with `NoActiveSession` if it was closed in the meantime.
    async fn close(&self, session: &AttendanceSession) -> Result<(), DomainError>;

    /// Sessions of one subject, newest first.
    async fn list_for_subject(&self, subject_id: &str)
    -> Result<Vec<AttendanceSession>, DomainError>;

    /// Sessions of a whole class, newest first.
    async fn list_for_class(&self, class_name: &str) -> Result<Vec<AttendanceSession>, DomainError>;
}

/// Override requests. Status transitions happen outside this crate.
#[async_trait::async_trait]
pub trait OverrideStore: Send + Sync {
    async fn create(&self, request: &OverrideRequest) -> Result<(), DomainError>;

    /// Requests of one subject, newest first.
    async fn requests_for_subject(&self, subject_id: &str)
    -> Result<Vec<OverrideRequest>, DomainError>;
}
