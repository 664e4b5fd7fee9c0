//! Override requests: a student's claim for attendance credit outside check-in/check-out.
//!
//! Records are created `pending`; approval and rejection happen outside this crate.
//! No geofence or session interaction.

use crate::domain::{DomainError, OverrideRequest, OverrideStatus, UserProfile};
use crate::ports::{ClockPort, IdentityPort, OverrideStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

pub struct OverrideService {
    identity: Arc<dyn IdentityPort>,
    clock: Arc<dyn ClockPort>,
    overrides: Arc<dyn OverrideStore>,
}

impl OverrideService {
    pub fn new(
        identity: Arc<dyn IdentityPort>,
        clock: Arc<dyn ClockPort>,
        overrides: Arc<dyn OverrideStore>,
    ) -> Self {
        Self {
            identity,
            clock,
            overrides,
        }
    }

    /// Validate and persist a pending request. `reason` is stored trimmed.
    pub async fn submit_override(
        &self,
        subject: &UserProfile,
        class_name: &str,
        reason: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<OverrideRequest, DomainError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DomainError::InvalidOverrideRequest(
                "reason must not be empty".to_string(),
            ));
        }
        if to < from {
            return Err(DomainError::InvalidOverrideRequest(format!(
                "end {} is before start {}",
                to.to_rfc3339(),
                from.to_rfc3339()
            )));
        }

        let request = OverrideRequest {
            id: uuid::Uuid::new_v4().to_string(),
            subject_id: subject.id.clone(),
            subject_name: subject.display_name.clone(),
            class_name: class_name.to_string(),
            reason: reason.to_string(),
            requested_from: from,
            requested_to: to,
            status: OverrideStatus::Pending,
            created_at: self.clock.now(),
        };
        self.overrides.create(&request).await?;

        info!(
            subject_id = %subject.id,
            class_name,
            request_id = %request.id,
            "override request submitted"
        );
        Ok(request)
    }

    /// Submit on behalf of the signed-in user, for their own class.
    pub async fn submit_override_current_user(
        &self,
        reason: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<OverrideRequest, DomainError> {
        let user = self.require_user().await?;
        let class_name = user.class_name.clone();
        self.submit_override(&user, &class_name, reason, from, to)
            .await
    }

    /// The signed-in user's requests, newest first.
    pub async fn my_requests(&self) -> Result<Vec<OverrideRequest>, DomainError> {
        let user = self.require_user().await?;
        self.overrides.requests_for_subject(&user.id).await
    }

    async fn require_user(&self) -> Result<UserProfile, DomainError> {
        self.identity
            .current_user()
            .await?
            .ok_or(DomainError::LoginRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::FixedClock;
    use crate::adapters::identity::StaticIdentity;
    use crate::adapters::persistence::memory_repo::MemoryRepo;
    use crate::domain::Role;
    use chrono::TimeZone;

    fn student() -> UserProfile {
        UserProfile {
            id: "stu-1".into(),
            role: Role::Student,
            class_name: "CS-1".into(),
            display_name: "Ada".into(),
        }
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap()
    }

    fn service(user: Option<UserProfile>) -> (Arc<MemoryRepo>, OverrideService) {
        let repo = Arc::new(MemoryRepo::new());
        let svc = OverrideService::new(
            Arc::new(StaticIdentity::new(user)),
            Arc::new(FixedClock::new(day(10))),
            repo.clone(),
        );
        (repo, svc)
    }

    #[tokio::test]
    async fn test_submit_creates_pending() {
        let (repo, svc) = service(Some(student()));
        let req = svc
            .submit_override(&student(), "CS-1", "  phone died  ", day(4), day(5))
            .await
            .unwrap();
        assert_eq!(req.status, OverrideStatus::Pending);
        assert_eq!(req.reason, "phone died");
        assert_eq!(req.subject_name, "Ada");
        assert_eq!(req.created_at, day(10));
        assert_eq!(repo.requests_for_subject("stu-1").await.unwrap(), vec![req]);
    }

    #[tokio::test]
    async fn test_empty_reason_rejected() {
        let (repo, svc) = service(Some(student()));
        for reason in ["", "   \t\n"] {
            let err = svc
                .submit_override(&student(), "CS-1", reason, day(4), day(5))
                .await
                .unwrap_err();
            assert!(matches!(err, DomainError::InvalidOverrideRequest(_)));
        }
        assert!(repo.requests_for_subject("stu-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inverted_range_rejected() {
        let (_repo, svc) = service(Some(student()));
        let err = svc
            .submit_override(&student(), "CS-1", "sick", day(5), day(4))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidOverrideRequest(_)));
        // Zero-length range is allowed.
        svc.submit_override(&student(), "CS-1", "sick", day(5), day(5))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_current_user_flow() {
        let (_repo, svc) = service(Some(student()));
        let req = svc
            .submit_override_current_user("bus strike", day(1), day(2))
            .await
            .unwrap();
        assert_eq!(req.class_name, "CS-1");
        assert_eq!(svc.my_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_login_required() {
        let (_repo, svc) = service(None);
        let err = svc
            .submit_override_current_user("bus strike", day(1), day(2))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::LoginRequired);
    }
}
