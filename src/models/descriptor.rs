//! Externally visible identities for sites and boards.

use std::fmt;
use std::sync::Arc;

/// Identity of a site as seen by the rest of the application.
///
/// Unlike [`super::SiteId`], which is a storage key, the descriptor is the
/// stable name other subsystems (thread lists, reply composition) key on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SiteDescriptor {
    site_name: Arc<str>,
}

impl SiteDescriptor {
    /// Creates a descriptor for the named site.
    #[must_use]
    pub fn new(site_name: impl Into<Arc<str>>) -> Self {
        Self {
            site_name: site_name.into(),
        }
    }

    /// Returns the site name.
    #[must_use]
    pub fn site_name(&self) -> &str {
        &self.site_name
    }
}

impl fmt::Display for SiteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.site_name)
    }
}

/// A board on a particular site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoardDescriptor {
    /// Owning site.
    pub site: SiteDescriptor,
    /// Board code, e.g. `g`.
    pub code: String,
}

impl BoardDescriptor {
    /// Creates a board descriptor.
    #[must_use]
    pub fn new(site: SiteDescriptor, code: impl Into<String>) -> Self {
        Self {
            site,
            code: code.into(),
        }
    }
}

impl fmt::Display for BoardDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.site, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_descriptor_display() {
        let board = BoardDescriptor::new(SiteDescriptor::new("4chan"), "g");
        assert_eq!(board.to_string(), "4chan/g");
    }

    #[test]
    fn test_site_descriptor_equality_by_name() {
        assert_eq!(SiteDescriptor::new("2ch.hk"), SiteDescriptor::new("2ch.hk"));
        assert_ne!(SiteDescriptor::new("2ch.hk"), SiteDescriptor::new("4chan"));
    }
}
