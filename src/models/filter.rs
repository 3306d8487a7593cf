//! Post filters.

/// Row ID of a filter.
pub type FilterId = i64;

/// A user-defined post filter.
///
/// `boards` keeps the stored encoding verbatim: a comma-separated list of
/// `"<siteId>:<boardCode>"` tokens. It is only meaningful when `all_boards`
/// is false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Row ID (0 before persist).
    pub id: FilterId,
    /// Match pattern.
    pub pattern: String,
    /// Whether the filter is active.
    pub enabled: bool,
    /// Applies to every board on every site.
    pub all_boards: bool,
    /// Encoded board scope.
    pub boards: String,
}

impl Filter {
    /// Creates an enabled filter scoped to the given encoded board list.
    #[must_use]
    pub fn scoped(pattern: impl Into<String>, boards: impl Into<String>) -> Self {
        Self {
            id: 0,
            pattern: pattern.into(),
            enabled: true,
            all_boards: false,
            boards: boards.into(),
        }
    }

    /// Creates an enabled filter that applies everywhere.
    #[must_use]
    pub fn global(pattern: impl Into<String>) -> Self {
        Self {
            id: 0,
            pattern: pattern.into(),
            enabled: true,
            all_boards: true,
            boards: String::new(),
        }
    }
}
