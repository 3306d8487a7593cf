//! Site and variant identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable key of a persisted site, assigned by the gateway on first persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(u32);

impl SiteId {
    /// Creates a site ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw integer value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SiteId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Persisted discriminator naming one of the built-in site variants.
///
/// Values are fixed at build time; see [`crate::sites::Variant`] for the
/// mapping. A stored value with no matching variant is a configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantId(u32);

impl VariantId {
    /// Creates a variant ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw integer value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for VariantId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}
