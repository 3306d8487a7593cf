//! Entities owned by other stores that reference a site by ID.
//!
//! Removing a site deletes every one of these that points at it.

use super::SiteId;

/// A board known for a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Owning site.
    pub site_id: SiteId,
    /// Board code, unique per site.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// A reply the user posted, remembered so it can be highlighted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedReply {
    /// Row ID (0 before persist).
    pub id: i64,
    /// Owning site.
    pub site_id: SiteId,
    /// Board the reply was posted to.
    pub board_code: String,
    /// Post number.
    pub post_no: u64,
}

/// A thread the user hid from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadHide {
    /// Row ID (0 before persist).
    pub id: i64,
    /// Owning site.
    pub site_id: SiteId,
    /// Board containing the thread.
    pub board_code: String,
    /// Thread number.
    pub thread_no: u64,
}

/// Row counts deleted by a cascading site removal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovalSummary {
    /// Filters deleted because they referenced the site.
    pub filters: usize,
    /// Boards deleted.
    pub boards: usize,
    /// Saved replies deleted.
    pub saved_replies: usize,
    /// Thread hides deleted.
    pub thread_hides: usize,
}
