//! Storage layer.
//!
//! - [`traits`]: the [`SiteGateway`] seam the repository persists through
//! - [`persistence`]: the `SQLite` gateway
//! - [`sqlite`]: connection, row and metrics helpers shared by the gateway

// Allow significant_drop_tightening - dropping database connections slightly early
// provides no meaningful benefit.
#![allow(clippy::significant_drop_tightening)]

pub mod persistence;
pub mod sqlite;
pub mod traits;

pub use persistence::SqliteGateway;
pub use traits::SiteGateway;
