//! Geofence administration. Advisors set the circular zone for their class.

use crate::domain::{Coordinate, DomainError, Geofence, Role, UserProfile};
use crate::ports::{GeofenceStore, IdentityPort};
use std::sync::Arc;
use tracing::info;

pub struct GeofenceService {
    identity: Arc<dyn IdentityPort>,
    geofences: Arc<dyn GeofenceStore>,
}

impl GeofenceService {
    pub fn new(identity: Arc<dyn IdentityPort>, geofences: Arc<dyn GeofenceStore>) -> Self {
        Self {
            identity,
            geofences,
        }
    }

    /// Replace the fence of the signed-in advisor's class.
    pub async fn configure(
        &self,
        center_lat: f64,
        center_lng: f64,
        radius_meters: f64,
    ) -> Result<Geofence, DomainError> {
        let user = self.require_user().await?;
        if user.role != Role::Advisor {
            return Err(DomainError::Forbidden(
                "only advisors can configure a geofence".to_string(),
            ));
        }
        let center = Coordinate::new(center_lat, center_lng)?;
        let fence = Geofence::new(user.class_name.clone(), center, radius_meters, user.id.clone())?;
        self.geofences.save_geofence(&fence).await?;
        info!(
            class_name = %fence.class_name,
            center = %fence.center,
            radius_m = fence.radius_meters,
            "geofence configured"
        );
        Ok(fence)
    }

    /// Fence for the signed-in user's class, if any.
    pub async fn current_fence(&self) -> Result<Option<Geofence>, DomainError> {
        let user = self.require_user().await?;
        self.geofences.geofence_for(&user.class_name).await
    }

    /// Role of the signed-in user; `None` when signed out.
    pub async fn current_user_role(&self) -> Result<Option<Role>, DomainError> {
        Ok(self.identity.current_user().await?.map(|u| u.role))
    }

    async fn require_user(&self) -> Result<UserProfile, DomainError> {
        self.identity
            .current_user()
            .await?
            .ok_or(DomainError::LoginRequired)
    }
}
