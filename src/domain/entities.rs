//! Domain entities. Pure data structures for the core business.
//!
//! No storage/transport types here; adapters map rows and payloads into these.

use super::errors::DomainError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A point on Earth in decimal degrees. Only constructible with in-range values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = DomainError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, DomainError> {
        let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        let lng_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);
        if !(lat_ok && lng_ok) {
            return Err(DomainError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Circular attendance zone configured by an advisor. One per class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    pub class_name: String,
    pub center: Coordinate,
    pub radius_meters: f64,
    pub advisor_id: String,
}

impl Geofence {
    /// Fails with `InvalidGeofence` unless the radius is finite and positive.
    pub fn new(
        class_name: impl Into<String>,
        center: Coordinate,
        radius_meters: f64,
        advisor_id: impl Into<String>,
    ) -> Result<Self, DomainError> {
        if !radius_meters.is_finite() || radius_meters <= 0.0 {
            return Err(DomainError::InvalidGeofence(format!(
                "radius must be a positive number of meters, got {}",
                radius_meters
            )));
        }
        Ok(Self {
            class_name: class_name.into(),
            center,
            radius_meters,
            advisor_id: advisor_id.into(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Advisor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Advisor => "advisor",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "advisor" => Ok(Role::Advisor),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// The signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub role: Role,
    pub class_name: String,
    pub display_name: String,
}

/// One check-in/check-out interval.
///
/// `subject_name` and `class_name` are copied from the profile at check-in so
/// history can be listed without joining user records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSession {
    pub id: String,
    pub subject_id: String,
    pub subject_name: String,
    pub class_name: String,
    pub date: NaiveDate,
    pub check_in_at: DateTime<Utc>,
    pub check_in_location: Coordinate,
    pub check_out_at: Option<DateTime<Utc>>,
    pub check_out_location: Option<Coordinate>,
    pub duration_hours: Option<f64>,
}

impl AttendanceSession {
    /// New open session. `date` is the UTC calendar day of `now`.
    pub fn open(
        subject: &UserProfile,
        class_name: &str,
        location: Coordinate,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            subject_id: subject.id.clone(),
            subject_name: subject.display_name.clone(),
            class_name: class_name.to_string(),
            date: now.date_naive(),
            check_in_at: now,
            check_in_location: location,
            check_out_at: None,
            check_out_location: None,
            duration_hours: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.check_out_at.is_none()
    }

    /// Close the session. Fails with `ClockSkew` if `now` precedes check-in
    /// and with `NoActiveSession` if it was already closed; `self` is untouched on error.
    pub fn close(&mut self, now: DateTime<Utc>, location: Coordinate) -> Result<(), DomainError> {
        if !self.is_open() {
            return Err(DomainError::NoActiveSession);
        }
        if now < self.check_in_at {
            return Err(DomainError::ClockSkew);
        }
        let elapsed = now - self.check_in_at;
        self.check_out_at = Some(now);
        self.check_out_location = Some(location);
        self.duration_hours = Some(elapsed.num_milliseconds() as f64 / 3_600_000.0);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideStatus {
    Pending,
    Approved,
    Rejected,
}

impl OverrideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideStatus::Pending => "pending",
            OverrideStatus::Approved => "approved",
            OverrideStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for OverrideStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OverrideStatus::Pending),
            "approved" => Ok(OverrideStatus::Approved),
            "rejected" => Ok(OverrideStatus::Rejected),
            other => Err(format!("unknown override status '{}'", other)),
        }
    }
}

/// Student claim for attendance credit outside the check-in flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRequest {
    pub id: String,
    pub subject_id: String,
    pub subject_name: String,
    pub class_name: String,
    pub reason: String,
    pub requested_from: DateTime<Utc>,
    pub requested_to: DateTime<Utc>,
    pub status: OverrideStatus,
    pub created_at: DateTime<Utc>,
}

/// Login email derived for student accounts: `student+{inst}+{class}+{roll}@example.com`.
pub fn student_email(inst_name: &str, class_name: &str, roll_no: &str) -> String {
    format!(
        "student+{}+{}+{}@example.com",
        inst_name.trim(),
        class_name.trim(),
        roll_no.trim()
    )
}
