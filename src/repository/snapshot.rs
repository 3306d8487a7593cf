//! Snapshot container for the live site list.

use super::notify::{SitesNotifier, SitesObserver};
use crate::models::{Ordering, SiteId};
use crate::sites::Site;
use crate::{Error, Result};
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;

/// An immutable list of sites plus its ID index.
///
/// The list and the index are always built together, so a reader holding a
/// snapshot never sees one without the other.
#[derive(Debug, Default)]
pub struct SitesSnapshot {
    sites: Vec<Arc<Site>>,
    by_id: HashMap<SiteId, usize>,
}

impl SitesSnapshot {
    /// Builds a snapshot. A later site with an ID already present replaces
    /// the earlier one in place.
    fn new(sites: impl IntoIterator<Item = Arc<Site>>) -> Self {
        let mut list: Vec<Arc<Site>> = Vec::new();
        let mut by_id = HashMap::new();
        for site in sites {
            match by_id.get(&site.id()) {
                Some(&index) => list[index] = site,
                None => {
                    by_id.insert(site.id(), list.len());
                    list.push(site);
                },
            }
        }
        Self { sites: list, by_id }
    }

    /// Returns the sites in insertion order.
    #[must_use]
    pub fn sites(&self) -> &[Arc<Site>] {
        &self.sites
    }

    /// Looks a site up by ID.
    #[must_use]
    pub fn get(&self, id: SiteId) -> Option<&Arc<Site>> {
        self.by_id.get(&id).and_then(|&index| self.sites.get(index))
    }

    /// Returns the number of sites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Returns true if there are no sites.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

/// Holds the current [`SitesSnapshot`] and publishes change notifications.
///
/// Reads are lock-free. Every write builds a whole new snapshot and swaps it
/// in. Writers must be serialized; [`SiteRepository`](super::SiteRepository)
/// holds its writer lock around every mutation. Mutators do not notify;
/// call [`Sites::notify`] once the change is complete.
pub struct Sites {
    current: ArcSwap<SitesSnapshot>,
    notifier: SitesNotifier,
}

impl Sites {
    /// Creates an empty container whose notification buffer holds
    /// `capacity` undelivered changes per observer.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            current: ArcSwap::from_pointee(SitesSnapshot::default()),
            notifier: SitesNotifier::new(capacity),
        }
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<SitesSnapshot> {
        self.current.load_full()
    }

    /// Returns the site with this ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no live site has this ID. Callers are
    /// expected to only ask for IDs they got from this container.
    pub fn for_id(&self, id: SiteId) -> Result<Arc<Site>> {
        self.current
            .load()
            .get(id)
            .cloned()
            .ok_or(Error::NotFound { kind: "site", id })
    }

    /// Returns a copy of the site list in insertion order.
    #[must_use]
    pub fn get_all(&self) -> Vec<Arc<Site>> {
        self.current.load().sites.clone()
    }

    /// Returns the sites sorted by ascending rank.
    ///
    /// Sites without a rank sort after every ranked site and keep their
    /// insertion order among themselves.
    #[must_use]
    pub fn all_in_order(&self, ordering: &Ordering) -> Vec<Arc<Site>> {
        let mut sites = self.get_all();
        sites.sort_by_key(|site| {
            ordering
                .get(&site.id())
                .map_or(u64::MAX, |&rank| u64::from(rank))
        });
        sites
    }

    /// Returns true if a live site has this ID.
    #[must_use]
    pub fn contains(&self, id: SiteId) -> bool {
        self.current.load().by_id.contains_key(&id)
    }

    /// Returns the number of live sites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    /// Returns true if there are no live sites.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }

    /// Registers a change observer.
    #[must_use]
    pub fn subscribe(&self) -> SitesObserver {
        self.notifier.subscribe()
    }

    /// Tells every observer to re-read the container.
    pub fn notify(&self) {
        self.notifier.publish();
    }

    /// Replaces the whole list in one swap.
    pub fn reset_sites(&self, sites: Vec<Arc<Site>>) {
        let snapshot = SitesSnapshot::new(sites);
        #[allow(clippy::cast_precision_loss)]
        metrics::gauge!("site_repository_sites").set(snapshot.len() as f64);
        self.current.store(Arc::new(snapshot));
    }

    /// Appends a site, replacing any live site with the same ID.
    pub fn add(&self, site: Arc<Site>) {
        self.add_all(vec![site]);
    }

    /// Appends sites, replacing any live site with the same ID.
    pub fn add_all(&self, sites: Vec<Arc<Site>>) {
        let current = self.current.load_full();
        let merged = current.sites.iter().cloned().chain(sites).collect();
        self.reset_sites(merged);
    }

    /// Drops a site from the list. Returns false if it was not present.
    pub fn remove(&self, id: SiteId) -> bool {
        let current = self.current.load_full();
        if !current.by_id.contains_key(&id) {
            return false;
        }
        let remaining = current
            .sites
            .iter()
            .filter(|site| site.id() != id)
            .cloned()
            .collect();
        self.reset_sites(remaining);
        true
    }
}

impl Default for Sites {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_NOTIFY_CAPACITY)
    }
}
