//! Location adapters. Implement LocationPort.
//!
//! Fixed coordinates (configured or for tests) and an HTTP geolocation lookup.

pub mod fixed;
pub mod http_adapter;

pub use fixed::FixedLocation;
pub use http_adapter::HttpLocationAdapter;
