//! A live, initialized site.

use super::backend::BoardsType;
use super::variants::{SiteKind, Variant};
use crate::models::{BoardDescriptor, SiteDescriptor, SiteId, UserSettings};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};
use url::Url;

/// Settings key that disables a site without removing it.
pub const ENABLED_KEY: &str = "enabled";

/// A configured site: one variant backend plus its ID and user settings.
///
/// Sites are only created initialized; there is no way to observe one
/// without an ID. They are shared as `Arc<Site>` between snapshots.
#[derive(Debug)]
pub struct Site {
    id: SiteId,
    kind: SiteKind,
    settings: RwLock<UserSettings>,
    post_initialized: AtomicBool,
}

impl Site {
    /// Initializes a backend with its persisted ID and settings.
    ///
    /// Variant defaults are filled into `settings` for keys it lacks.
    #[must_use]
    pub fn initialize(id: SiteId, kind: SiteKind, mut settings: UserSettings) -> Self {
        kind.backend().initialize_settings(&mut settings);
        Self {
            id,
            kind,
            settings: RwLock::new(settings),
            post_initialized: AtomicBool::new(false),
        }
    }

    /// Returns the storage key.
    #[must_use]
    pub const fn id(&self) -> SiteId {
        self.id
    }

    /// Returns the variant backing this site.
    #[must_use]
    pub const fn variant(&self) -> Variant {
        self.kind.variant()
    }

    /// Returns the variant backend.
    #[must_use]
    pub const fn kind(&self) -> &SiteKind {
        &self.kind
    }

    /// Returns the site name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind.backend().name()
    }

    /// Returns the stable external identity.
    #[must_use]
    pub fn descriptor(&self) -> SiteDescriptor {
        self.kind.backend().descriptor()
    }

    /// Returns a descriptor for one of this site's boards.
    #[must_use]
    pub fn board(&self, code: &str) -> BoardDescriptor {
        BoardDescriptor::new(self.descriptor(), code)
    }

    /// Returns how the board list is obtained.
    #[must_use]
    pub fn boards_type(&self) -> BoardsType {
        self.kind.backend().boards_type()
    }

    /// Returns the site root URL.
    #[must_use]
    pub fn root_url(&self) -> &Url {
        self.kind.backend().root_url()
    }

    /// Returns true if the URL belongs to this site.
    #[must_use]
    pub fn responds_to(&self, url: &Url) -> bool {
        self.kind.backend().responds_to(url)
    }

    /// Returns a copy of the current settings.
    #[must_use]
    pub fn settings(&self) -> UserSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns false if the user disabled the site.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get_bool(ENABLED_KEY)
            .unwrap_or(true)
    }

    /// Returns true if boards should be fetched for this site.
    #[must_use]
    pub fn should_load_boards(&self) -> bool {
        self.enabled() && self.boards_type().can_list()
    }

    pub(crate) fn replace_settings(&self, settings: UserSettings) {
        *self
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner) = settings;
    }

    /// Runs the variant's post-initialize hook; later calls do nothing.
    pub(crate) fn post_initialize(&self) {
        if self.post_initialized.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::debug!(site.id = %self.id, site.name = self.name(), "Site initialized");
        self.kind.backend().post_initialize(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn site(variant: Variant, id: u32) -> Site {
        Site::initialize(SiteId::new(id), variant.construct().unwrap(), UserSettings::new())
    }

    #[test]
    fn test_initialize_applies_variant_defaults() {
        let s = site(Variant::Dvach, 2);
        assert_eq!(s.id(), SiteId::new(2));
        assert_eq!(s.settings().get("captcha_type"), Some(&json!("invisible")));
        assert_eq!(s.descriptor(), SiteDescriptor::new("2ch.hk"));
    }

    #[test]
    fn test_enabled_defaults_true() {
        let s = site(Variant::Lainchan, 1);
        assert!(s.enabled());

        let mut settings = s.settings();
        settings.set(ENABLED_KEY, json!(false));
        s.replace_settings(settings);
        assert!(!s.enabled());
        assert!(!s.should_load_boards());
    }

    #[test]
    fn test_infinite_boards_are_not_listed() {
        let s = site(Variant::Kun8, 3);
        assert!(s.enabled());
        assert!(!s.should_load_boards());
    }

    #[test]
    fn test_board_descriptor_uses_site_name() {
        let s = site(Variant::Chan4, 1);
        assert_eq!(s.board("g").to_string(), "4chan/g");
    }

    #[test]
    fn test_post_initialize_runs_once() {
        let s = site(Variant::Dvach, 5);
        s.post_initialize();
        s.post_initialize();
        assert!(s.post_initialized.load(Ordering::Acquire));
    }
}
