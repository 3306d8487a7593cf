//! Behaviour shared by every site variant.

use crate::models::{SiteDescriptor, SiteId, UserSettings, VariantId};
use crate::{Error, Result};
use std::fmt;
use url::Url;

/// How a site exposes its board list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardsType {
    /// Fixed list compiled into the variant.
    Static,
    /// Fetched from the site's API.
    Dynamic,
    /// Users may create boards; the list cannot be enumerated.
    Infinite,
}

impl BoardsType {
    /// Returns true if the board list can be enumerated.
    #[must_use]
    pub const fn can_list(self) -> bool {
        !matches!(self, Self::Infinite)
    }

    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
            Self::Infinite => "infinite",
        }
    }
}

/// Trait implemented by each built-in site variant.
///
/// Implementations are constructed only through
/// [`crate::sites::VariantRegistry`]. They carry no per-site state; the ID and
/// settings live on [`crate::sites::Site`].
pub trait SiteBackend: Send + Sync + fmt::Debug {
    /// Human-readable site name. Also the descriptor's site name.
    fn name(&self) -> &'static str;

    /// Root URL of the site.
    fn root_url(&self) -> &Url;

    /// How the board list is obtained.
    fn boards_type(&self) -> BoardsType;

    /// Extra hosts serving this site's media.
    fn media_hosts(&self) -> &'static [&'static str] {
        &[]
    }

    /// Fills variant defaults into freshly loaded settings.
    ///
    /// Must not overwrite keys that are already present.
    fn initialize_settings(&self, _settings: &mut UserSettings) {}

    /// Called once after the site is visible in the snapshot.
    fn post_initialize(&self, _id: SiteId) {}

    /// Stable external identity.
    fn descriptor(&self) -> SiteDescriptor {
        SiteDescriptor::new(self.name())
    }

    /// Returns true if the URL belongs to this site.
    fn responds_to(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let root = self.root_url().host_str();
        root.into_iter()
            .chain(self.media_hosts().iter().copied())
            .any(|candidate| host_matches(host, candidate))
    }
}

/// Host equality that also accepts a leading `www.`.
#[must_use]
pub fn host_matches(host: &str, candidate: &str) -> bool {
    host == candidate || host.strip_prefix("www.") == Some(candidate)
}

/// Parses a variant's static root URL.
///
/// # Errors
///
/// Returns [`Error::Instantiation`] if the URL is malformed.
pub fn parse_root(variant: VariantId, root: &str) -> Result<Url> {
    Url::parse(root).map_err(|e| Error::Instantiation {
        variant,
        cause: format!("invalid root url '{root}': {e}"),
    })
}
