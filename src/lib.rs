//! # Siterepo
//!
//! Site registry and repository for a multi-backend imageboard browser.
//!
//! Every configured site is a live instance of one of a fixed set of backend
//! variants. This crate maps persisted variant IDs to those variants, persists
//! per-site configuration and settings, and keeps an ordered, observable,
//! atomically swapped view of all live sites behind a one-shot
//! initialization barrier.
//!
//! ## Features
//!
//! - Closed variant set, exhaustively matched (no reflection)
//! - Lock-free snapshot reads via `arc-swap`
//! - Structural-change notifications over a Tokio broadcast channel
//! - Cascading site removal in a single `SQLite` transaction
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use siterepo::{SiteRepository, SqliteGateway, VariantId};
//!
//! let gateway = Arc::new(SqliteGateway::new("sites.db")?);
//! let repo = SiteRepository::new(gateway);
//! repo.load()?;
//! let site = repo.create_from_variant(VariantId::new(0))?;
//! println!("added {} as {}", site.descriptor(), site.id());
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod models;
pub mod observability;
pub mod repository;
pub mod sites;
pub mod storage;

// Re-exports for convenience
pub use config::SiteRepoConfig;
pub use models::{
    Board, BoardDescriptor, Filter, FilterId, NewSiteRecord, Ordering, RemovalSummary, SavedReply,
    SiteConfig, SiteDescriptor, SiteId, SiteRecord, ThreadHide, UserSettings, VariantId,
};
pub use repository::{
    InitBarrier, Outcome, SiteRepository, Sites, SitesChanged, SitesObserver, SitesSnapshot,
};
pub use sites::{BoardsType, Site, SiteBackend, SiteKind, Variant, VariantRegistry};
pub use storage::{SiteGateway, SqliteGateway};

/// Error type for siterepo operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `UnknownVariant` | A persisted variant ID has no built-in variant |
/// | `Instantiation` | A variant's static resources cannot be built |
/// | `NotFound` | `for_id` / `by_id` lookups miss |
/// | `OperationFailed` | Database queries fail, blobs fail to (de)serialize |
/// | `AlreadyCompleted` | The initialization barrier is completed twice |
/// | `AlreadyLoaded` | `SiteRepository::load` is called a second time |
/// | `SiteBusy` | A removal or settings update overlaps another for the same site |
/// | `InvalidInput` | Malformed CLI arguments or configuration values |
#[derive(Debug, Clone, ThisError)]
pub enum Error {
    /// No built-in variant is registered for this ID.
    ///
    /// Indicates corrupt configuration data. Fatal to `load()`.
    #[error("unknown site variant: {0}")]
    UnknownVariant(VariantId),

    /// A variant could not be constructed.
    #[error("failed to instantiate variant {variant}: {cause}")]
    Instantiation {
        /// The variant that failed.
        variant: VariantId,
        /// The underlying cause.
        cause: String,
    },

    /// A lookup by ID missed.
    ///
    /// Callers are expected to only ask for IDs they know exist, so this
    /// usually indicates a bug on the calling side.
    #[error("no {kind} with id ({id})")]
    NotFound {
        /// What was looked up ("site", "site record").
        kind: &'static str,
        /// The ID that missed.
        id: SiteId,
    },

    /// A persistence operation failed.
    ///
    /// Raised when:
    /// - `SQLite` database operations fail
    /// - Config or settings blobs fail to (de)serialize
    /// - Configuration files cannot be read or parsed
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The initialization barrier was already completed.
    #[error("initialization barrier already completed")]
    AlreadyCompleted,

    /// The repository was already loaded (or a load already failed).
    #[error("site repository already loaded")]
    AlreadyLoaded,

    /// Another removal or settings update is in flight for this site.
    #[error("site {0} is busy with another operation")]
    SiteBusy(SiteId),

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for siterepo operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownVariant(VariantId::new(999));
        assert_eq!(err.to_string(), "unknown site variant: 999");

        let err = Error::NotFound {
            kind: "site",
            id: SiteId::new(4),
        };
        assert_eq!(err.to_string(), "no site with id (4)");

        let err = Error::OperationFailed {
            operation: "add_site".to_string(),
            cause: "disk full".to_string(),
        };
        assert_eq!(err.to_string(), "operation 'add_site' failed: disk full");

        let err = Error::SiteBusy(SiteId::new(2));
        assert_eq!(err.to_string(), "site 2 is busy with another operation");
    }
}
