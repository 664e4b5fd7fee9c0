//! Fixed location source. Returns a configured coordinate or a configured denial.

use crate::domain::{Coordinate, DomainError};
use crate::ports::LocationPort;
use std::sync::Mutex;

/// Reports whatever it was last given.
pub struct FixedLocation {
    reading: Mutex<Result<Coordinate, String>>,
}

impl FixedLocation {
    pub fn new(at: Coordinate) -> Self {
        Self {
            reading: Mutex::new(Ok(at)),
        }
    }

    /// Every request fails with `LocationUnavailable(reason)`.
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            reading: Mutex::new(Err(reason.into())),
        }
    }

    pub fn set(&self, at: Coordinate) {
        *self.reading.lock().unwrap_or_else(|e| e.into_inner()) = Ok(at);
    }
}

#[async_trait::async_trait]
impl LocationPort for FixedLocation {
    async fn current_location(&self) -> Result<Coordinate, DomainError> {
        self.reading
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .map_err(DomainError::LocationUnavailable)
    }
}
