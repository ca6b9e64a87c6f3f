//! SQLx backend for the Relata engine.
//!
//! Enable the `sqlite` feature for [`SqliteStrategy`], a
//! [`DataAccessStrategy`](relata_data::DataAccessStrategy) executing every
//! statement on one logical SQLite connection.

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStrategy;
