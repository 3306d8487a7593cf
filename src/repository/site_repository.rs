//! The site repository.

use super::barrier::{InitBarrier, Outcome};
use super::in_flight::InFlight;
use super::notify::SitesObserver;
use super::snapshot::Sites;
use crate::config::SiteRepoConfig;
use crate::models::{
    NewSiteRecord, Ordering, RemovalSummary, SiteConfig, SiteDescriptor, SiteId, SiteRecord,
    UserSettings, VariantId,
};
use crate::sites::{Site, VariantRegistry};
use crate::storage::{SiteGateway, SqliteGateway};
use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::instrument;
use url::Url;

/// Owns the live sites and keeps them in step with the gateway.
///
/// Construct one per process and share it as `Arc<SiteRepository>`. Call
/// [`SiteRepository::load`] (or [`SiteRepository::spawn_load`]) once; other
/// components gate on [`SiteRepository::is_ready`],
/// [`SiteRepository::on_complete`] or [`SiteRepository::wait_ready`].
///
/// Reads go to the lock-free snapshot. Snapshot writes are serialized by an
/// internal writer lock; removal and settings updates for one site are
/// single-flight.
pub struct SiteRepository {
    gateway: Arc<dyn SiteGateway>,
    registry: VariantRegistry,
    sites: Sites,
    barrier: InitBarrier<usize>,
    loaded: AtomicBool,
    writer: Mutex<()>,
    in_flight: InFlight,
}

impl SiteRepository {
    /// Creates a repository over a gateway.
    #[must_use]
    pub fn new(gateway: Arc<dyn SiteGateway>) -> Self {
        Self::with_capacity(gateway, crate::config::DEFAULT_NOTIFY_CAPACITY)
    }

    /// Creates a repository with a custom notification buffer size.
    #[must_use]
    pub fn with_capacity(gateway: Arc<dyn SiteGateway>, notify_capacity: usize) -> Self {
        Self {
            gateway,
            registry: VariantRegistry::new(),
            sites: Sites::new(notify_capacity),
            barrier: InitBarrier::new(),
            loaded: AtomicBool::new(false),
            writer: Mutex::new(()),
            in_flight: InFlight::default(),
        }
    }

    /// Opens the configured `SQLite` database and wraps it.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory or database cannot be opened.
    pub fn from_config(config: &SiteRepoConfig) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
                operation: "create_data_dir".to_string(),
                cause: format!("{}: {e}", parent.display()),
            })?;
        }
        let gateway = SqliteGateway::new(&config.database_path)?;
        Ok(Self::with_capacity(Arc::new(gateway), config.notify_capacity))
    }

    /// Returns the gateway, for maintaining dependent entities.
    #[must_use]
    pub fn gateway(&self) -> &Arc<dyn SiteGateway> {
        &self.gateway
    }

    /// Returns the snapshot container.
    #[must_use]
    pub const fn all(&self) -> &Sites {
        &self.sites
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Loads every persisted site and completes the init barrier.
    ///
    /// Loading is all-or-nothing: if any record fails to instantiate, the
    /// snapshot stays empty and the barrier completes with that error.
    /// Returns the number of sites loaded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyLoaded`] on a second call, without touching
    /// the barrier. Otherwise returns the error the barrier failed with.
    #[instrument(skip(self), fields(operation = "load"))]
    pub fn load(&self) -> Result<usize> {
        if self.loaded.swap(true, AtomicOrdering::AcqRel) {
            return Err(Error::AlreadyLoaded);
        }

        let result = self.load_sites();
        self.barrier.complete(result.clone())?;
        result
    }

    /// Runs [`SiteRepository::load`] on the blocking pool.
    pub fn spawn_load(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<usize>> {
        let repository = Arc::clone(self);
        tokio::task::spawn_blocking(move || repository.load())
    }

    fn load_sites(&self) -> Result<usize> {
        let records = self.gateway.get_all()?;

        let mut loaded = Vec::with_capacity(records.len());
        for record in records {
            let kind = self.registry.instantiate(record.variant_id())?;
            loaded.push(Arc::new(Site::initialize(
                record.id,
                kind,
                record.user_settings,
            )));
        }
        let count = loaded.len();

        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.sites.add_all(loaded.clone());
        for site in &loaded {
            site.post_initialize();
        }
        self.sites.notify();

        tracing::info!(sites = count, "Loaded sites");
        Ok(count)
    }

    /// Returns true once loading has finished, successfully or not.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.barrier.is_ready()
    }

    /// Runs `continuation` once loading finishes.
    pub fn on_complete<F>(&self, continuation: F)
    where
        F: FnOnce(Outcome<usize>) + Send + 'static,
    {
        self.barrier.on_complete(continuation);
    }

    /// Waits for loading to finish.
    ///
    /// # Errors
    ///
    /// Returns the error loading failed with.
    pub async fn wait_ready(&self) -> Outcome<usize> {
        self.barrier.wait().await
    }

    // =========================================================================
    // Structural changes
    // =========================================================================

    /// Creates, persists and installs a new site of the given variant.
    ///
    /// # Errors
    ///
    /// Returns the registry or gateway error; the snapshot is unchanged.
    #[instrument(skip(self), fields(operation = "create_from_variant", variant = %variant_id))]
    pub fn create_from_variant(&self, variant_id: VariantId) -> Result<Arc<Site>> {
        let kind = self.registry.instantiate(variant_id)?;
        let mut user_settings = UserSettings::new();
        kind.backend().initialize_settings(&mut user_settings);
        let record = self.gateway.add(&NewSiteRecord {
            config: SiteConfig::for_variant(variant_id),
            user_settings,
        })?;
        let site = Arc::new(Site::initialize(record.id, kind, record.user_settings));

        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.sites.add(Arc::clone(&site));
        site.post_initialize();
        self.sites.notify();

        tracing::info!(site.id = %site.id(), site.name = site.name(), "Created site");
        metrics::counter!("site_creations_total").increment(1);
        Ok(site)
    }

    /// Removes a site together with the filters, boards, saved replies and
    /// thread hides that reference it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SiteBusy`] if another removal or settings update is
    /// running for this site, [`Error::NotFound`] if it is not live, or the
    /// gateway error. On error the site stays in the snapshot.
    #[instrument(skip(self, site), fields(operation = "remove_site", site.id = %site.id()))]
    pub fn remove_site(&self, site: &Site) -> Result<RemovalSummary> {
        let id = site.id();
        let _claim = self.in_flight.try_acquire(id)?;
        if !self.sites.contains(id) {
            return Err(Error::NotFound { kind: "site", id });
        }

        let summary = self.gateway.remove_site_cascade(id)?;

        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.sites.remove(id);
        self.sites.notify();

        tracing::info!(
            site.id = %id,
            filters = summary.filters,
            boards = summary.boards,
            saved_replies = summary.saved_replies,
            thread_hides = summary.thread_hides,
            "Removed site"
        );
        metrics::counter!("site_removals_total").increment(1);
        Ok(summary)
    }

    /// Persists a new display order: `sites[i]` gets rank `i`.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; observers are not notified.
    #[instrument(skip(self, sites), fields(operation = "update_ordering", count = sites.len()))]
    pub fn update_ordering(&self, sites: &[Arc<Site>]) -> Result<()> {
        let ids: Vec<SiteId> = sites.iter().map(|site| site.id()).collect();
        self.gateway.update_ordering(&ids)?;
        self.sites.notify();
        Ok(())
    }

    /// Persists new user settings for a site and applies them to it.
    ///
    /// Variant defaults are filled in for keys `settings` lacks. Settings are
    /// not part of the snapshot's shape, so observers are not notified.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SiteBusy`] on an overlapping call for the same site,
    /// or the gateway error.
    #[instrument(skip(self, site, settings), fields(operation = "update_settings", site.id = %site.id()))]
    pub fn update_settings(&self, site: &Site, mut settings: UserSettings) -> Result<()> {
        let _claim = self.in_flight.try_acquire(site.id())?;
        site.kind().backend().initialize_settings(&mut settings);

        let mut record = self.gateway.by_id(site.id())?;
        record.user_settings = settings.clone();
        self.gateway.update(&record)?;
        site.replace_settings(settings);
        Ok(())
    }

    /// Runs [`SiteRepository::update_settings`] on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns the update error, or [`Error::OperationFailed`] if the task
    /// could not run to completion.
    pub async fn update_settings_async(
        self: &Arc<Self>,
        site: Arc<Site>,
        settings: UserSettings,
    ) -> Result<()> {
        let repository = Arc::clone(self);
        tokio::task::spawn_blocking(move || repository.update_settings(&site, settings))
            .await
            .map_err(|e| Error::OperationFailed {
                operation: "update_settings".to_string(),
                cause: e.to_string(),
            })?
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Returns the persisted record for a site.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or the gateway error.
    pub fn by_id(&self, id: SiteId) -> Result<SiteRecord> {
        self.gateway.by_id(id)
    }

    /// Returns the live site with this ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no live site has this ID.
    pub fn for_id(&self, id: SiteId) -> Result<Arc<Site>> {
        self.sites.for_id(id)
    }

    /// Returns a copy of the live sites in insertion order.
    #[must_use]
    pub fn get_all(&self) -> Vec<Arc<Site>> {
        self.sites.get_all()
    }

    /// Returns the live sites in display order.
    ///
    /// # Errors
    ///
    /// Returns the gateway error from reading the ordering.
    pub fn all_in_order(&self) -> Result<Vec<Arc<Site>>> {
        let ordering = self.gateway.get_ordering()?;
        Ok(self.sites.all_in_order(&ordering))
    }

    /// Returns the persisted rank map.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    pub fn ordering(&self) -> Result<Ordering> {
        self.gateway.get_ordering()
    }

    /// Finds the live site with this descriptor.
    #[must_use]
    pub fn by_site_descriptor(&self, descriptor: &SiteDescriptor) -> Option<Arc<Site>> {
        self.sites
            .get_all()
            .into_iter()
            .find(|site| site.descriptor() == *descriptor)
    }

    /// Returns true if a live site has this descriptor.
    #[must_use]
    pub fn contains_site(&self, descriptor: &SiteDescriptor) -> bool {
        self.by_site_descriptor(descriptor).is_some()
    }

    /// Returns the first site, in display order, that serves this URL.
    ///
    /// # Errors
    ///
    /// Returns the gateway error from reading the ordering.
    pub fn for_url(&self, url: &Url) -> Result<Option<Arc<Site>>> {
        Ok(self
            .all_in_order()?
            .into_iter()
            .find(|site| site.responds_to(url)))
    }

    /// Registers a structural-change observer.
    #[must_use]
    pub fn subscribe(&self) -> SitesObserver {
        self.sites.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Board, Filter};
    use serde_json::json;

    fn repository() -> SiteRepository {
        SiteRepository::new(Arc::new(SqliteGateway::in_memory().unwrap()))
    }

    #[test]
    fn test_load_empty() {
        let repo = repository();
        assert!(!repo.is_ready());

        assert_eq!(repo.load().unwrap(), 0);
        assert!(repo.is_ready());
        assert!(repo.get_all().is_empty());
    }

    #[test]
    fn test_load_twice_is_rejected() {
        let repo = repository();
        repo.load().unwrap();
        assert!(matches!(repo.load(), Err(Error::AlreadyLoaded)));
    }

    #[test]
    fn test_load_restores_persisted_sites() {
        let gateway = Arc::new(SqliteGateway::in_memory().unwrap());
        for variant in [0, 3] {
            gateway
                .add(&NewSiteRecord {
                    config: SiteConfig::for_variant(VariantId::new(variant)),
                    user_settings: UserSettings::new(),
                })
                .unwrap();
        }

        let repo = SiteRepository::new(gateway);
        assert_eq!(repo.load().unwrap(), 2);
        let names: Vec<_> = repo.get_all().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["4chan", "2ch.hk"]);
    }

    #[test]
    fn test_load_unknown_variant_fails_whole_load() {
        let gateway = Arc::new(SqliteGateway::in_memory().unwrap());
        for variant in [0, 999] {
            gateway
                .add(&NewSiteRecord {
                    config: SiteConfig::for_variant(VariantId::new(variant)),
                    user_settings: UserSettings::new(),
                })
                .unwrap();
        }

        let repo = SiteRepository::new(gateway);
        assert!(matches!(repo.load(), Err(Error::UnknownVariant(_))));
        assert!(repo.is_ready());
        assert!(repo.get_all().is_empty());
    }

    #[test]
    fn test_create_assigns_id_and_notifies() {
        let repo = repository();
        repo.load().unwrap();
        let mut observer = repo.subscribe();

        let site = repo.create_from_variant(VariantId::new(1)).unwrap();
        assert_eq!(site.id(), SiteId::new(1));
        assert!(observer.take_changed());

        let record = repo.by_id(site.id()).unwrap();
        assert!(!record.config.external);
        assert_eq!(repo.for_id(site.id()).unwrap().name(), "Lainchan");
    }

    #[test]
    fn test_create_unknown_variant_leaves_snapshot() {
        let repo = repository();
        repo.load().unwrap();

        assert!(matches!(
            repo.create_from_variant(VariantId::new(42)),
            Err(Error::UnknownVariant(_))
        ));
        assert!(repo.get_all().is_empty());
    }

    #[test]
    fn test_remove_site_cascades() {
        let repo = repository();
        repo.load().unwrap();
        let site = repo.create_from_variant(VariantId::new(0)).unwrap();
        let other = repo.create_from_variant(VariantId::new(1)).unwrap();

        let gateway = repo.gateway();
        gateway
            .add_board(&Board {
                site_id: site.id(),
                code: "g".to_string(),
                name: "Technology".to_string(),
            })
            .unwrap();
        gateway
            .add_filter(&Filter::scoped("spam", format!("{}:g", site.id())))
            .unwrap();
        gateway
            .add_filter(&Filter::scoped("spam", format!("{}:a", other.id())))
            .unwrap();

        let summary = repo.remove_site(&site).unwrap();
        assert_eq!(summary.filters, 1);
        assert_eq!(summary.boards, 1);
        assert!(repo.for_id(site.id()).is_err());
        assert_eq!(gateway.list_filters().unwrap().len(), 1);
    }

    #[test]
    fn test_remove_unknown_site_is_not_found() {
        let repo = repository();
        repo.load().unwrap();
        let site = repo.create_from_variant(VariantId::new(0)).unwrap();
        repo.remove_site(&site).unwrap();

        assert!(matches!(
            repo.remove_site(&site),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_update_ordering_and_for_url() {
        let repo = repository();
        repo.load().unwrap();
        let first = repo.create_from_variant(VariantId::new(0)).unwrap();
        let second = repo.create_from_variant(VariantId::new(1)).unwrap();

        repo.update_ordering(&[Arc::clone(&second), Arc::clone(&first)])
            .unwrap();
        let ordered: Vec<_> = repo.all_in_order().unwrap().iter().map(|s| s.id()).collect();
        assert_eq!(ordered, vec![second.id(), first.id()]);

        let url = Url::parse("https://i.4cdn.org/g/1.png").unwrap();
        assert_eq!(repo.for_url(&url).unwrap().map(|s| s.id()), Some(first.id()));
    }

    #[test]
    fn test_update_settings_persists_and_applies() {
        let repo = repository();
        repo.load().unwrap();
        let site = repo.create_from_variant(VariantId::new(0)).unwrap();

        let mut settings = site.settings();
        settings.set("enabled", json!(false));
        repo.update_settings(&site, settings).unwrap();

        assert!(!site.enabled());
        assert_eq!(
            repo.by_id(site.id()).unwrap().user_settings.get_bool("enabled"),
            Some(false)
        );
    }

    #[test]
    fn test_variant_defaults_are_persisted() {
        let repo = repository();
        repo.load().unwrap();
        let site = repo.create_from_variant(VariantId::new(0)).unwrap();

        let stored = repo.by_id(site.id()).unwrap().user_settings;
        assert_eq!(stored.get("captcha_type"), Some(&json!("v2_nojs")));
        assert_eq!(stored, site.settings());

        let mut settings = UserSettings::new();
        settings.set("enabled", json!(false));
        repo.update_settings(&site, settings).unwrap();

        let stored = repo.by_id(site.id()).unwrap().user_settings;
        assert_eq!(stored.get("captcha_type"), Some(&json!("v2_nojs")));
        assert_eq!(stored.get_bool("enabled"), Some(false));
        assert_eq!(site.settings().get("country_flag"), Some(&json!("")));
    }

    #[test]
    fn test_descriptor_lookup() {
        let repo = repository();
        repo.load().unwrap();
        let site = repo.create_from_variant(VariantId::new(2)).unwrap();

        assert!(repo.contains_site(&site.descriptor()));
        assert!(!repo.contains_site(&SiteDescriptor::new("nowhere")));
        assert_eq!(
            repo.by_site_descriptor(&site.descriptor()).map(|s| s.id()),
            Some(site.id())
        );
    }
}
