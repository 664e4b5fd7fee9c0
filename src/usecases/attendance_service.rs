//! Attendance session state machine: NoSession -> Open -> Closed.
//!
//! - Check-in: fence lookup -> inside check -> no open session -> create
//! - Check-out: open session lookup -> fence re-validation -> close (conditional write)
//! - All validation happens before the single store write, so a failure leaves state untouched

use crate::domain::{AttendanceSession, Coordinate, DomainError, Geofence, Role, UserProfile};
use crate::ports::{ClockPort, GeofenceStore, IdentityPort, LocationPort, SessionStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Attendance service. Owns no state; every transition goes through the stores.
pub struct AttendanceService {
    identity: Arc<dyn IdentityPort>,
    location: Arc<dyn LocationPort>,
    clock: Arc<dyn ClockPort>,
    geofences: Arc<dyn GeofenceStore>,
    sessions: Arc<dyn SessionStore>,
    location_timeout: Duration,
}

impl AttendanceService {
    pub fn new(
        identity: Arc<dyn IdentityPort>,
        location: Arc<dyn LocationPort>,
        clock: Arc<dyn ClockPort>,
        geofences: Arc<dyn GeofenceStore>,
        sessions: Arc<dyn SessionStore>,
        location_timeout: Duration,
    ) -> Self {
        Self {
            identity,
            location,
            clock,
            geofences,
            sessions,
            location_timeout,
        }
    }

    /// Open a session for `subject` at `location`.
    pub async fn check_in(
        &self,
        subject: &UserProfile,
        class_name: &str,
        location: Coordinate,
        now: DateTime<Utc>,
    ) -> Result<AttendanceSession, DomainError> {
        let fence = self.resolve_fence(class_name).await?;
        let distance = fence.evaluate(location)?;

        if self.sessions.find_open_session(&subject.id).await?.is_some() {
            return Err(DomainError::SessionAlreadyOpen);
        }

        let session = AttendanceSession::open(subject, class_name, location, now);
        // The store re-checks the open-session invariant atomically.
        self.sessions.create(&session).await?;

        info!(
            subject_id = %subject.id,
            class_name,
            session_id = %session.id,
            distance_m = distance.round(),
            "checked in"
        );
        Ok(session)
    }

    /// Close the subject's most recently opened session.
    pub async fn check_out(
        &self,
        subject_id: &str,
        now: DateTime<Utc>,
        location: Coordinate,
    ) -> Result<AttendanceSession, DomainError> {
        let mut session = self
            .sessions
            .find_open_session(subject_id)
            .await?
            .ok_or(DomainError::NoActiveSession)?;

        let fence = self.resolve_fence(&session.class_name).await?;
        let distance = fence.evaluate(location)?;

        session.close(now, location)?;
        self.sessions.close(&session).await?;

        info!(
            subject_id,
            session_id = %session.id,
            hours = session.duration_hours.unwrap_or_default(),
            distance_m = distance.round(),
            "checked out"
        );
        Ok(session)
    }

    /// Check in the signed-in user at the device's current location.
    pub async fn check_in_current_user(&self) -> Result<AttendanceSession, DomainError> {
        let user = self.require_user().await?;
        let location = self.acquire_location().await?;
        let now = self.clock.now();
        let class_name = user.class_name.clone();
        self.check_in(&user, &class_name, location, now).await
    }

    /// Check out the signed-in user at the device's current location.
    pub async fn check_out_current_user(&self) -> Result<AttendanceSession, DomainError> {
        let user = self.require_user().await?;
        // Fail fast before prompting for location.
        if self.sessions.find_open_session(&user.id).await?.is_none() {
            return Err(DomainError::NoActiveSession);
        }
        let location = self.acquire_location().await?;
        let now = self.clock.now();
        self.check_out(&user.id, now, location).await
    }

    /// Students see their own sessions; advisors see their whole class. Newest first.
    pub async fn history_current_user(&self) -> Result<Vec<AttendanceSession>, DomainError> {
        let user = self.require_user().await?;
        match user.role {
            Role::Student => self.sessions.list_for_subject(&user.id).await,
            Role::Advisor => self.sessions.list_for_class(&user.class_name).await,
        }
    }

    async fn resolve_fence(&self, class_name: &str) -> Result<Geofence, DomainError> {
        self.geofences
            .geofence_for(class_name)
            .await?
            .ok_or_else(|| DomainError::NoGeofenceConfigured(class_name.to_string()))
    }

    async fn require_user(&self) -> Result<UserProfile, DomainError> {
        self.identity
            .current_user()
            .await?
            .ok_or(DomainError::LoginRequired)
    }

    async fn acquire_location(&self) -> Result<Coordinate, DomainError> {
        debug!(timeout_secs = self.location_timeout.as_secs(), "acquiring location");
        match tokio::time::timeout(self.location_timeout, self.location.current_location()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    timeout_secs = self.location_timeout.as_secs(),
                    "location request timed out"
                );
                Err(DomainError::LocationUnavailable(format!(
                    "timed out after {}s",
                    self.location_timeout.as_secs()
                )))
            }
        }
    }
}
