//! Implements IdentityPort from a profile resolved at startup (config/env).
//!
//! Sign-in itself happens elsewhere; this adapter only reports who is signed in.

use crate::domain::{DomainError, Role, UserProfile, student_email};
use crate::ports::IdentityPort;
use crate::shared::config::AppConfig;
use tracing::warn;

/// Fixed identity. `None` behaves as "not signed in".
pub struct StaticIdentity {
    user: Option<UserProfile>,
}

impl StaticIdentity {
    pub fn new(user: Option<UserProfile>) -> Self {
        Self { user }
    }

    /// Build from config. The user id comes from `user_id`, or is derived as the
    /// student login email when `inst_name` and `roll_no` are set instead.
    pub fn from_config(cfg: &AppConfig) -> Self {
        let Some(class_name) = cfg.class_name.clone() else {
            return Self::new(None);
        };
        let id = match (&cfg.user_id, &cfg.inst_name, &cfg.roll_no) {
            (Some(id), _, _) => id.clone(),
            (None, Some(inst), Some(roll)) => student_email(inst, &class_name, roll),
            _ => return Self::new(None),
        };
        let role = match cfg.user_role.as_deref().map(str::parse::<Role>) {
            None => Role::Student,
            Some(Ok(role)) => role,
            Some(Err(e)) => {
                warn!(error = %e, "ignoring invalid user_role; treating user as student");
                Role::Student
            }
        };
        let display_name = cfg.display_name.clone().unwrap_or_else(|| id.clone());
        Self::new(Some(UserProfile {
            id,
            role,
            class_name,
            display_name,
        }))
    }
}

#[async_trait::async_trait]
impl IdentityPort for StaticIdentity {
    async fn current_user(&self) -> Result<Option<UserProfile>, DomainError> {
        Ok(self.user.clone())
    }
}
