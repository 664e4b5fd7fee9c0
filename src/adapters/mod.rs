//! Infrastructure adapters. Implement outbound ports.
//!
//! Storage, location, identity, clock, export, terminal UI. Map errors to DomainError.

pub mod clock;
pub mod export;
pub mod identity;
pub mod location;
pub mod persistence;
pub mod ui;
