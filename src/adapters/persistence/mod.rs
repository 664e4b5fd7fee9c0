//! Persistence adapters. Implement the store ports.

#[cfg(test)]
pub mod memory_repo;
pub mod sqlite_repo;

#[cfg(test)]
pub use memory_repo::MemoryRepo;
pub use sqlite_repo::SqliteRepo;
