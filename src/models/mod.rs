//! Data models for siterepo.
//!
//! This module contains the persisted rows, identifiers and dependent
//! entities the repository works with.

mod dependents;
mod descriptor;
mod filter;
mod ids;
mod record;

pub use dependents::{Board, RemovalSummary, SavedReply, ThreadHide};
pub use descriptor::{BoardDescriptor, SiteDescriptor};
pub use filter::{Filter, FilterId};
pub use ids::{SiteId, VariantId};
pub use record::{NewSiteRecord, Ordering, SiteConfig, SiteRecord, UserSettings};
