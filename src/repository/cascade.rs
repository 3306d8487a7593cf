//! Finds the filters a site removal must take with it.
//!
//! A filter's `boards` field is a comma-separated list of `siteId:boardCode`
//! tokens. A filter references a site when any of its tokens names that
//! site's ID. Filters that apply to all boards, or have no board list, are
//! never site-scoped.

use crate::models::{Filter, FilterId, SiteId};

/// Returns the IDs of the filters scoped to `site`.
#[must_use]
pub fn filters_referencing(filters: &[Filter], site: SiteId) -> Vec<FilterId> {
    filters
        .iter()
        .filter(|filter| !filter.all_boards && !filter.boards.is_empty())
        .filter(|filter| references_site(&filter.boards, site))
        .map(|filter| filter.id)
        .collect()
}

/// Returns true if any token in a board list names `site`.
///
/// Malformed tokens are skipped so that one corrupt entry never blocks
/// removing an unrelated site. Trailing empty pieces of a token do not
/// count as parts, so `"3:"` has one part and `"3:g:"` has two.
#[must_use]
pub fn references_site(boards: &str, site: SiteId) -> bool {
    let target = i64::from(site.get());
    boards.split(',').any(|token| {
        let parts = token_parts(token);
        let [owner, _code] = parts.as_slice() else {
            if !token.is_empty() {
                tracing::warn!(token, "Skipping malformed filter board token");
            }
            return false;
        };
        match owner.parse::<i64>() {
            Ok(owner) => owner == target,
            Err(_) => {
                tracing::warn!(token, "Skipping filter board token with non-numeric site");
                false
            },
        }
    })
}

/// Splits a token on `:`, dropping trailing empty pieces.
fn token_parts(token: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = token.split(':').collect();
    while parts.last().is_some_and(|part| part.is_empty()) {
        parts.pop();
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(id: FilterId, boards: &str, all_boards: bool) -> Filter {
        Filter {
            id,
            pattern: "spam".to_string(),
            enabled: true,
            all_boards,
            boards: boards.to_string(),
        }
    }

    #[test]
    fn test_matches_any_token() {
        assert!(references_site("3:g,5:a", SiteId::new(3)));
        assert!(references_site("3:g,5:a", SiteId::new(5)));
        assert!(!references_site("5:a", SiteId::new(3)));
    }

    #[test]
    fn test_malformed_tokens_are_skipped() {
        assert!(!references_site("3", SiteId::new(3)));
        assert!(!references_site("3:g:extra", SiteId::new(3)));
        assert!(!references_site("x:g", SiteId::new(3)));
        assert!(!references_site(",,", SiteId::new(3)));
        assert!(references_site("x:g,bad,3:a", SiteId::new(3)));
    }

    #[test]
    fn test_trailing_colons_are_dropped() {
        assert!(!references_site("3:", SiteId::new(3)));
        assert!(!references_site("3::", SiteId::new(3)));
        assert!(references_site("3:g:", SiteId::new(3)));
        assert!(references_site("5:a,3:g::", SiteId::new(3)));
        assert!(!references_site("3:g:x:", SiteId::new(3)));
        assert!(!references_site(":", SiteId::new(3)));
    }

    #[test]
    fn test_owner_must_match_exactly() {
        assert!(!references_site("13:g", SiteId::new(3)));
        assert!(!references_site("-3:g", SiteId::new(3)));
        assert!(references_site("03:g", SiteId::new(3)));
    }

    #[test]
    fn test_filters_referencing_skips_unscoped() {
        let filters = vec![
            filter(1, "3:g,5:a", false),
            filter(2, "3:g", true),
            filter(3, "", false),
            filter(4, "5:a", false),
            filter(5, "7:b,3:v", false),
        ];
        assert_eq!(filters_referencing(&filters, SiteId::new(3)), vec![1, 5]);
    }
}
