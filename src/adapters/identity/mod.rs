//! Identity adapters. Implement IdentityPort.

pub mod static_identity;

pub use static_identity::StaticIdentity;
