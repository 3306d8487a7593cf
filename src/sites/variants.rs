//! The built-in site variants.
//!
//! Adding a variant means adding a struct here, a [`Variant`] case with a new,
//! never reused ID, and a [`SiteKind`] case. The compiler then points at every
//! match that needs updating.

use super::backend::{BoardsType, SiteBackend, parse_root};
use crate::Result;
use crate::models::{SiteId, UserSettings, VariantId};
use serde_json::json;
use url::Url;

/// 4chan.
#[derive(Debug, Clone)]
pub struct Chan4 {
    root: Url,
}

impl Chan4 {
    const ROOT: &'static str = "https://4chan.org";

    fn new() -> Result<Self> {
        Ok(Self {
            root: parse_root(Variant::Chan4.id(), Self::ROOT)?,
        })
    }
}

impl SiteBackend for Chan4 {
    fn name(&self) -> &'static str {
        "4chan"
    }

    fn root_url(&self) -> &Url {
        &self.root
    }

    fn boards_type(&self) -> BoardsType {
        BoardsType::Dynamic
    }

    fn media_hosts(&self) -> &'static [&'static str] {
        &["4cdn.org", "4channel.org", "i.4cdn.org"]
    }

    fn initialize_settings(&self, settings: &mut UserSettings) {
        settings.set_default("captcha_type", json!("v2_nojs"));
        settings.set_default("country_flag", json!(""));
    }
}

/// Lainchan (vichan engine).
#[derive(Debug, Clone)]
pub struct Lainchan {
    root: Url,
}

impl Lainchan {
    const ROOT: &'static str = "https://lainchan.org";

    fn new() -> Result<Self> {
        Ok(Self {
            root: parse_root(Variant::Lainchan.id(), Self::ROOT)?,
        })
    }
}

impl SiteBackend for Lainchan {
    fn name(&self) -> &'static str {
        "Lainchan"
    }

    fn root_url(&self) -> &Url {
        &self.root
    }

    fn boards_type(&self) -> BoardsType {
        BoardsType::Static
    }
}

/// Sushichan (vichan engine).
#[derive(Debug, Clone)]
pub struct Sushichan {
    root: Url,
}

impl Sushichan {
    const ROOT: &'static str = "https://sushigirl.us";

    fn new() -> Result<Self> {
        Ok(Self {
            root: parse_root(Variant::Sushichan.id(), Self::ROOT)?,
        })
    }
}

impl SiteBackend for Sushichan {
    fn name(&self) -> &'static str {
        "Sushichan"
    }

    fn root_url(&self) -> &Url {
        &self.root
    }

    fn boards_type(&self) -> BoardsType {
        BoardsType::Static
    }
}

/// 2ch.hk.
#[derive(Debug, Clone)]
pub struct Dvach {
    root: Url,
}

impl Dvach {
    const ROOT: &'static str = "https://2ch.hk";

    fn new() -> Result<Self> {
        Ok(Self {
            root: parse_root(Variant::Dvach.id(), Self::ROOT)?,
        })
    }
}

impl SiteBackend for Dvach {
    fn name(&self) -> &'static str {
        "2ch.hk"
    }

    fn root_url(&self) -> &Url {
        &self.root
    }

    fn boards_type(&self) -> BoardsType {
        BoardsType::Dynamic
    }

    fn initialize_settings(&self, settings: &mut UserSettings) {
        settings.set_default("captcha_type", json!("invisible"));
        settings.set_default("passcode", json!(""));
    }

    fn post_initialize(&self, id: SiteId) {
        tracing::debug!(site.id = %id, "2ch.hk ready, passcode login deferred to first post");
    }
}

/// Wired-7 (vichan engine).
#[derive(Debug, Clone)]
pub struct Wired7 {
    root: Url,
}

impl Wired7 {
    const ROOT: &'static str = "https://wired-7.org";

    fn new() -> Result<Self> {
        Ok(Self {
            root: parse_root(Variant::Wired7.id(), Self::ROOT)?,
        })
    }
}

impl SiteBackend for Wired7 {
    fn name(&self) -> &'static str {
        "Wired-7"
    }

    fn root_url(&self) -> &Url {
        &self.root
    }

    fn boards_type(&self) -> BoardsType {
        BoardsType::Static
    }
}

/// 420chan.
#[derive(Debug, Clone)]
pub struct Chan420 {
    root: Url,
}

impl Chan420 {
    const ROOT: &'static str = "https://420chan.org";

    fn new() -> Result<Self> {
        Ok(Self {
            root: parse_root(Variant::Chan420.id(), Self::ROOT)?,
        })
    }
}

impl SiteBackend for Chan420 {
    fn name(&self) -> &'static str {
        "420chan"
    }

    fn root_url(&self) -> &Url {
        &self.root
    }

    fn boards_type(&self) -> BoardsType {
        BoardsType::Dynamic
    }

    fn media_hosts(&self) -> &'static [&'static str] {
        &["boards.420chan.org"]
    }
}

/// 8kun. Boards are user-created.
#[derive(Debug, Clone)]
pub struct Kun8 {
    root: Url,
}

impl Kun8 {
    const ROOT: &'static str = "https://8kun.top";

    fn new() -> Result<Self> {
        Ok(Self {
            root: parse_root(Variant::Kun8.id(), Self::ROOT)?,
        })
    }
}

impl SiteBackend for Kun8 {
    fn name(&self) -> &'static str {
        "8kun"
    }

    fn root_url(&self) -> &Url {
        &self.root
    }

    fn boards_type(&self) -> BoardsType {
        BoardsType::Infinite
    }

    fn media_hosts(&self) -> &'static [&'static str] {
        &["media.8kun.top"]
    }
}

/// The closed set of built-in variants.
///
/// The discriminants are the persisted [`VariantId`] values and must never be
/// renumbered or reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// 4chan.
    Chan4,
    /// Lainchan.
    Lainchan,
    /// Sushichan.
    Sushichan,
    /// 2ch.hk.
    Dvach,
    /// Wired-7.
    Wired7,
    /// 420chan.
    Chan420,
    /// 8kun.
    Kun8,
}

impl Variant {
    /// Every variant, in ID order.
    pub const ALL: [Self; 7] = [
        Self::Chan4,
        Self::Lainchan,
        Self::Sushichan,
        Self::Dvach,
        Self::Wired7,
        Self::Chan420,
        Self::Kun8,
    ];

    /// Returns the persisted ID.
    #[must_use]
    pub const fn id(self) -> VariantId {
        VariantId::new(match self {
            Self::Chan4 => 0,
            Self::Lainchan => 1,
            Self::Sushichan => 2,
            Self::Dvach => 3,
            Self::Wired7 => 4,
            Self::Chan420 => 5,
            Self::Kun8 => 6,
        })
    }

    /// Looks up a variant by persisted ID.
    #[must_use]
    pub const fn from_id(id: VariantId) -> Option<Self> {
        match id.get() {
            0 => Some(Self::Chan4),
            1 => Some(Self::Lainchan),
            2 => Some(Self::Sushichan),
            3 => Some(Self::Dvach),
            4 => Some(Self::Wired7),
            5 => Some(Self::Chan420),
            6 => Some(Self::Kun8),
            _ => None,
        }
    }

    /// Constructs a fresh backend of this variant.
    pub(crate) fn construct(self) -> Result<SiteKind> {
        Ok(match self {
            Self::Chan4 => SiteKind::Chan4(Chan4::new()?),
            Self::Lainchan => SiteKind::Lainchan(Lainchan::new()?),
            Self::Sushichan => SiteKind::Sushichan(Sushichan::new()?),
            Self::Dvach => SiteKind::Dvach(Dvach::new()?),
            Self::Wired7 => SiteKind::Wired7(Wired7::new()?),
            Self::Chan420 => SiteKind::Chan420(Chan420::new()?),
            Self::Kun8 => SiteKind::Kun8(Kun8::new()?),
        })
    }
}

/// A constructed, not yet initialized backend of one variant.
#[derive(Debug, Clone)]
pub enum SiteKind {
    /// 4chan.
    Chan4(Chan4),
    /// Lainchan.
    Lainchan(Lainchan),
    /// Sushichan.
    Sushichan(Sushichan),
    /// 2ch.hk.
    Dvach(Dvach),
    /// Wired-7.
    Wired7(Wired7),
    /// 420chan.
    Chan420(Chan420),
    /// 8kun.
    Kun8(Kun8),
}

impl SiteKind {
    /// Returns which variant this is.
    #[must_use]
    pub const fn variant(&self) -> Variant {
        match self {
            Self::Chan4(_) => Variant::Chan4,
            Self::Lainchan(_) => Variant::Lainchan,
            Self::Sushichan(_) => Variant::Sushichan,
            Self::Dvach(_) => Variant::Dvach,
            Self::Wired7(_) => Variant::Wired7,
            Self::Chan420(_) => Variant::Chan420,
            Self::Kun8(_) => Variant::Kun8,
        }
    }

    /// Returns the variant's behaviour.
    #[must_use]
    pub fn backend(&self) -> &dyn SiteBackend {
        match self {
            Self::Chan4(b) => b,
            Self::Lainchan(b) => b,
            Self::Sushichan(b) => b,
            Self::Dvach(b) => b,
            Self::Wired7(b) => b,
            Self::Chan420(b) => b,
            Self::Kun8(b) => b,
        }
    }
}
