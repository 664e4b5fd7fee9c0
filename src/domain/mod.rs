//! Core domain layer. No external I/O dependencies.
//!
//! Entities, geofence math and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;
pub mod geo;

pub use entities::{
    AttendanceSession, Coordinate, Geofence, OverrideRequest, OverrideStatus, Role, UserProfile,
    student_email,
};
pub use errors::DomainError;
pub use geo::{distance_between, distance_meters, excess_meters, is_inside};
