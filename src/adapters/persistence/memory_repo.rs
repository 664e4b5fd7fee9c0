//! In-memory store. Implements GeofenceStore, SessionStore and OverrideStore.
//!
//! Test double for the store ports, compiled only for tests. Each write takes
//! the lock once, so check-and-insert is atomic.

use crate::domain::{AttendanceSession, DomainError, Geofence, OverrideRequest};
use crate::ports::{GeofenceStore, OverrideStore, SessionStore};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryData {
    geofences: HashMap<String, Geofence>,
    sessions: Vec<AttendanceSession>,
    overrides: Vec<OverrideRequest>,
}

/// In-memory store backed by a single `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryRepo {
    data: RwLock<MemoryData>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session bypassing the open-session check (seeds legacy duplicates).
    pub(crate) async fn insert_unchecked(&self, session: AttendanceSession) {
        self.data.write().await.sessions.push(session);
    }
}

fn newest_first(mut sessions: Vec<AttendanceSession>) -> Vec<AttendanceSession> {
    sessions.sort_by(|a, b| b.check_in_at.cmp(&a.check_in_at));
    sessions
}

#[async_trait::async_trait]
impl GeofenceStore for MemoryRepo {
    async fn geofence_for(&self, class_name: &str) -> Result<Option<Geofence>, DomainError> {
        Ok(self.data.read().await.geofences.get(class_name).cloned())
    }

    async fn save_geofence(&self, fence: &Geofence) -> Result<(), DomainError> {
        self.data
            .write()
            .await
            .geofences
            .insert(fence.class_name.clone(), fence.clone());
        Ok(())
    }
}

#[async_trait::async_trait]
impl SessionStore for MemoryRepo {
    async fn create(&self, session: &AttendanceSession) -> Result<(), DomainError> {
        let mut data = self.data.write().await;
        if data
            .sessions
            .iter()
            .any(|s| s.subject_id == session.subject_id && s.is_open())
        {
            return Err(DomainError::SessionAlreadyOpen);
        }
        data.sessions.push(session.clone());
        Ok(())
    }

    async fn find_open_session(
        &self,
        subject_id: &str,
    ) -> Result<Option<AttendanceSession>, DomainError> {
        let data = self.data.read().await;
        Ok(data
            .sessions
            .iter()
            .filter(|s| s.subject_id == subject_id && s.is_open())
            .max_by_key(|s| s.check_in_at)
            .cloned())
    }

    async fn close(&self, session: &AttendanceSession) -> Result<(), DomainError> {
        let mut data = self.data.write().await;
        let stored = data
            .sessions
            .iter_mut()
            .find(|s| s.id == session.id && s.is_open())
            .ok_or(DomainError::NoActiveSession)?;
        stored.check_out_at = session.check_out_at;
        stored.check_out_location = session.check_out_location;
        stored.duration_hours = session.duration_hours;
        Ok(())
    }

    async fn list_for_subject(
        &self,
        subject_id: &str,
    ) -> Result<Vec<AttendanceSession>, DomainError> {
        let data = self.data.read().await;
        Ok(newest_first(
            data.sessions
                .iter()
                .filter(|s| s.subject_id == subject_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_for_class(&self, class_name: &str) -> Result<Vec<AttendanceSession>, DomainError> {
        let data = self.data.read().await;
        Ok(newest_first(
            data.sessions
                .iter()
                .filter(|s| s.class_name == class_name)
                .cloned()
                .collect(),
        ))
    }
}

#[async_trait::async_trait]
impl OverrideStore for MemoryRepo {
    async fn create(&self, request: &OverrideRequest) -> Result<(), DomainError> {
        self.data.write().await.overrides.push(request.clone());
        Ok(())
    }

    async fn requests_for_subject(
        &self,
        subject_id: &str,
    ) -> Result<Vec<OverrideRequest>, DomainError> {
        let data = self.data.read().await;
        let mut requests: Vec<OverrideRequest> = data
            .overrides
            .iter()
            .filter(|r| r.subject_id == subject_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinate, Role, UserProfile};
    use chrono::{TimeZone, Utc};

    fn session_at(subject: &str, hour: u32) -> AttendanceSession {
        let user = UserProfile {
            id: subject.into(),
            role: Role::Student,
            class_name: "CS-1".into(),
            display_name: subject.into(),
        };
        let now = Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap();
        AttendanceSession::open(&user, "CS-1", Coordinate::new(0.0, 0.0).unwrap(), now)
    }

    #[tokio::test]
    async fn test_create_rejects_second_open_session() {
        let repo = MemoryRepo::new();
        SessionStore::create(&repo, &session_at("a", 9)).await.unwrap();
        let err = SessionStore::create(&repo, &session_at("a", 10))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::SessionAlreadyOpen);
        // Other subjects are unaffected.
        SessionStore::create(&repo, &session_at("b", 10)).await.unwrap();
    }

    #[tokio::test]
    async fn test_close_is_conditional() {
        let repo = MemoryRepo::new();
        let mut s = session_at("a", 9);
        SessionStore::create(&repo, &s).await.unwrap();
        let later = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        s.close(later, Coordinate::new(0.0, 0.0).unwrap()).unwrap();
        repo.close(&s).await.unwrap();
        assert_eq!(repo.close(&s).await, Err(DomainError::NoActiveSession));
        assert!(repo.find_open_session("a").await.unwrap().is_none());
        assert_eq!(
            repo.list_for_subject("a").await.unwrap()[0].duration_hours,
            Some(3.0)
        );
    }

    #[tokio::test]
    async fn test_geofence_upsert() {
        let repo = MemoryRepo::new();
        assert!(repo.geofence_for("CS-1").await.unwrap().is_none());
        let c = Coordinate::new(1.0, 1.0).unwrap();
        repo.save_geofence(&Geofence::new("CS-1", c, 50.0, "adv").unwrap())
            .await
            .unwrap();
        repo.save_geofence(&Geofence::new("CS-1", c, 80.0, "adv").unwrap())
            .await
            .unwrap();
        let fence = repo.geofence_for("CS-1").await.unwrap().unwrap();
        assert_eq!(fence.radius_meters, 80.0);
    }
}
