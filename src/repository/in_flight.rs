//! Per-site single-flight guard.
//!
//! Removal and settings updates for one site must not overlap. Instead of
//! queueing, an overlapping call fails fast with [`Error::SiteBusy`]. Calls
//! for different sites never contend beyond the brief set lookup.

use crate::models::SiteId;
use crate::{Error, Result};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Set of site IDs with an operation in progress.
#[derive(Debug, Clone, Default)]
pub(crate) struct InFlight {
    ids: Arc<Mutex<HashSet<SiteId>>>,
}

impl InFlight {
    /// Claims `id` until the returned guard is dropped.
    pub(crate) fn try_acquire(&self, id: SiteId) -> Result<InFlightGuard> {
        let mut ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
        if !ids.insert(id) {
            metrics::counter!("site_busy_rejections_total").increment(1);
            return Err(Error::SiteBusy(id));
        }
        Ok(InFlightGuard {
            ids: Arc::clone(&self.ids),
            id,
        })
    }
}

/// Releases its site ID on drop.
#[derive(Debug)]
pub(crate) struct InFlightGuard {
    ids: Arc<Mutex<HashSet<SiteId>>>,
    id: SiteId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}
