//! Persistence gateway trait.

use crate::Result;
use crate::repository::cascade::filters_referencing;
use crate::models::{
    Board, Filter, FilterId, NewSiteRecord, Ordering, RemovalSummary, SavedReply, SiteId,
    SiteRecord, ThreadHide,
};

/// Trait for the durable store behind the site repository.
///
/// Holds site records, the display ordering and the dependent entities that
/// reference sites by ID. Every call is atomic on its own and may fail; the
/// repository never assumes success.
pub trait SiteGateway: Send + Sync {
    // =========================================================================
    // Site records
    // =========================================================================

    /// Returns every persisted site record, in ID order.
    fn get_all(&self) -> Result<Vec<SiteRecord>>;

    /// Returns one site record.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if no record has this ID.
    fn by_id(&self, id: SiteId) -> Result<SiteRecord>;

    /// Persists a new record and returns it with its assigned ID.
    fn add(&self, record: &NewSiteRecord) -> Result<SiteRecord>;

    /// Re-keys a persisted record.
    fn update_id(&self, record: &SiteRecord, new_id: SiteId) -> Result<()>;

    /// Persists a record's config and settings.
    fn update(&self, record: &SiteRecord) -> Result<()>;

    /// Deletes a site record. Returns false if it did not exist.
    fn delete_site(&self, id: SiteId) -> Result<bool>;

    // =========================================================================
    // Ordering
    // =========================================================================

    /// Returns the persisted rank of every ordered site.
    fn get_ordering(&self) -> Result<Ordering>;

    /// Replaces the whole ordering: `ids[i]` gets rank `i`, every other site
    /// loses its rank.
    fn update_ordering(&self, ids: &[SiteId]) -> Result<()>;

    // =========================================================================
    // Dependent entities
    // =========================================================================

    /// Returns every filter.
    fn list_filters(&self) -> Result<Vec<Filter>>;

    /// Persists a filter and returns it with its assigned ID.
    fn add_filter(&self, filter: &Filter) -> Result<Filter>;

    /// Deletes filters by ID, returning how many existed.
    fn delete_filters(&self, ids: &[FilterId]) -> Result<usize>;

    /// Inserts or replaces a board.
    fn add_board(&self, board: &Board) -> Result<()>;

    /// Returns the boards of a site.
    fn boards_for(&self, site: SiteId) -> Result<Vec<Board>>;

    /// Deletes the boards of a site.
    fn delete_boards(&self, site: SiteId) -> Result<usize>;

    /// Persists a saved reply and returns it with its assigned ID.
    fn add_saved_reply(&self, reply: &SavedReply) -> Result<SavedReply>;

    /// Returns the saved replies of a site.
    fn saved_replies_for(&self, site: SiteId) -> Result<Vec<SavedReply>>;

    /// Deletes the saved replies of a site.
    fn delete_saved_replies(&self, site: SiteId) -> Result<usize>;

    /// Persists a thread hide and returns it with its assigned ID.
    fn add_thread_hide(&self, hide: &ThreadHide) -> Result<ThreadHide>;

    /// Returns the thread hides of a site.
    fn thread_hides_for(&self, site: SiteId) -> Result<Vec<ThreadHide>>;

    /// Deletes the thread hides of a site.
    fn delete_thread_hides(&self, site: SiteId) -> Result<usize>;

    // =========================================================================
    // Cascading removal
    // =========================================================================

    /// Deletes a site and everything that depends on it.
    ///
    /// The default scans the filters for ones scoped to `site`, then runs
    /// the deletions in a fixed order (filters, boards, saved replies, thread
    /// hides, site record) and stops at the first failure, so the site
    /// record is only deleted once every dependent is gone. The scan and the
    /// deletions are separate calls here; transactional stores should
    /// override this to scan and delete in one transaction.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error, or [`crate::Error::NotFound`]
    /// if the site record was already gone. On failure the site record is
    /// never deleted.
    fn remove_site_cascade(&self, site: SiteId) -> Result<RemovalSummary> {
        let filters = filters_referencing(&self.list_filters()?, site);
        let summary = RemovalSummary {
            filters: self.delete_filters(&filters)?,
            boards: self.delete_boards(site)?,
            saved_replies: self.delete_saved_replies(site)?,
            thread_hides: self.delete_thread_hides(site)?,
        };
        if !self.delete_site(site)? {
            return Err(crate::Error::NotFound {
                kind: "site record",
                id: site,
            });
        }
        Ok(summary)
    }
}
