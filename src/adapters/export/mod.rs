//! Export adapters. Render attendance history for spreadsheets.

pub mod csv_export;

pub use csv_export::{overrides_to_csv, sessions_to_csv};
