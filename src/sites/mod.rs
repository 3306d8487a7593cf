//! Site variants and live site instances.
//!
//! The set of variants is closed: [`Variant`] enumerates them, [`SiteKind`]
//! holds a constructed backend, and [`VariantRegistry`] is the only path from
//! a persisted [`crate::models::VariantId`] to a backend. A [`Site`] is a
//! backend after it has been given its ID and settings.

mod backend;
mod registry;
mod site;
mod variants;

pub use backend::{BoardsType, SiteBackend, host_matches};
pub use registry::VariantRegistry;
pub use site::{ENABLED_KEY, Site};
pub use variants::{Chan4, Chan420, Dvach, Kun8, Lainchan, SiteKind, Sushichan, Variant, Wired7};
