//! Site repository.
//!
//! - [`InitBarrier`]: one-shot readiness gate for the initial load
//! - [`Sites`]: lock-free snapshot container with change notifications
//! - [`SiteRepository`]: load, create, remove, reorder and settings updates
//! - [`cascade`]: which filters a site removal takes with it

mod barrier;
pub mod cascade;
mod in_flight;
mod notify;
mod site_repository;
mod snapshot;

pub use barrier::{InitBarrier, Outcome};
pub use notify::{SitesChanged, SitesObserver};
pub use site_repository::SiteRepository;
pub use snapshot::{Sites, SitesSnapshot};
