//! Variant ID to backend mapping.

use super::variants::{SiteKind, Variant};
use crate::models::VariantId;
use crate::{Error, Result};

/// Maps persisted variant IDs to the built-in variants.
///
/// This is the only way to construct a [`SiteKind`]. The mapping is fixed at
/// build time and lookups perform no I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct VariantRegistry;

impl VariantRegistry {
    /// Creates the registry.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Constructs a fresh, uninitialized backend for the variant ID.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownVariant`] if no variant has this ID.
    /// - [`Error::Instantiation`] if the variant's static resources are invalid.
    pub fn instantiate(&self, variant_id: VariantId) -> Result<SiteKind> {
        let variant = Variant::from_id(variant_id).ok_or(Error::UnknownVariant(variant_id))?;
        let kind = variant.construct()?;
        metrics::counter!("variant_instantiations_total", "variant" => kind.backend().name())
            .increment(1);
        Ok(kind)
    }

    /// Returns true if the ID names a built-in variant.
    #[must_use]
    pub const fn contains(&self, variant_id: VariantId) -> bool {
        Variant::from_id(variant_id).is_some()
    }

    /// Returns every built-in variant.
    #[must_use]
    pub const fn variants(&self) -> &'static [Variant] {
        &Variant::ALL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instantiate_known_variant() {
        let registry = VariantRegistry::new();
        let kind = registry.instantiate(VariantId::new(3)).unwrap();
        assert_eq!(kind.variant(), Variant::Dvach);
        assert_eq!(kind.backend().name(), "2ch.hk");
    }

    #[test]
    fn test_instantiate_unknown_variant() {
        let registry = VariantRegistry::new();
        let err = registry.instantiate(VariantId::new(999)).unwrap_err();
        assert!(matches!(err, Error::UnknownVariant(id) if id == VariantId::new(999)));
        assert!(!registry.contains(VariantId::new(999)));
    }

    #[test]
    fn test_every_listed_variant_instantiates() {
        let registry = VariantRegistry::new();
        for variant in registry.variants() {
            assert!(registry.contains(variant.id()));
            assert!(registry.instantiate(variant.id()).is_ok());
        }
    }
}
