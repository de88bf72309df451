//! # studio-store
//!
//! Persistence for the studio-booking marketplace.
//!
//! [`Database`] is a synchronous handle over a `rusqlite::Connection` with
//! typed CRUD helpers for every model. [`SqliteStore`] wraps it behind a
//! mutex and implements the `studio_shared::repository` traits so the server
//! can share it across request handlers. [`MemoryStore`] implements the same
//! traits over plain collections and backs the unit tests.

pub mod accounts;
pub mod bookings;
pub mod database;
pub mod listings;
pub mod memory;
pub mod messages;
pub mod migrations;
pub mod reviews;
pub mod sqlite;

mod error;
#[cfg(test)]
mod fixtures;

pub use database::Database;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
