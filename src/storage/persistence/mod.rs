//! Persistence gateway implementations.

mod sqlite;

pub use sqlite::SqliteGateway;
