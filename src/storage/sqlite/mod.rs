//! Shared `SQLite` infrastructure for the gateway.
//!
//! ## Module Structure
//!
//! - [`connection`]: Connection handling ([`Mutex<Connection>`](rusqlite::Connection), lock acquisition, pragmas, transactions)
//! - [`rows`]: Row conversion for [`SiteRecord`](crate::models::SiteRecord)s
//! - [`metrics`]: Operation metrics recording

mod connection;
mod metrics;
mod rows;

pub use connection::{acquire_lock, configure_connection, in_transaction};
pub use metrics::{record_operation_metrics, timed};
pub use rows::{SiteRow, encode_blobs};
