//! Catalog session state: search pagination that survives load-more,
//! recent-feed deduplication, and the optimistic favorite projection.
//!
//! These used to live in ambient reactive singletons in the old client;
//! here they are plain owned values a session passes around explicitly.

use std::collections::HashSet;
use std::hash::Hash;

use uuid::Uuid;

use crate::categories::ProductCategory;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// One search in progress. Load-more bumps the page while the query and
/// category filter stay fixed; a new query resets to the first page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    pub query: String,
    pub category: Option<ProductCategory>,
    pub page: u32,
    pub page_size: u32,
}

impl SearchState {
    #[must_use]
    pub fn new(query: impl Into<String>, category: Option<ProductCategory>) -> Self {
        Self {
            query: query.into(),
            category,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Row offset of the current page (pages are 1-based).
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }

    /// Advances to the next page, preserving query and filter.
    pub fn next_page(&mut self) {
        self.page = self.page.saturating_add(1);
    }

    /// Whether another page exists given the store-reported total.
    #[must_use]
    pub fn has_more(&self, total: u64) -> bool {
        u64::from(self.page) * u64::from(self.page_size) < total
    }
}

/// Collapses a newest-first stream so each key appears once, keeping the
/// first (most recent) occurrence and the stream's order, capped at `cap`.
pub fn dedupe_recent<T, K, F>(items: impl IntoIterator<Item = T>, cap: usize, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        if out.len() == cap {
            break;
        }
        if seen.insert(key(&item)) {
            out.push(item);
        }
    }
    out
}

/// A planned favorite toggle: the local projection applied before the
/// durable write, with an inverse for rollback when the write fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FavoriteToggle {
    pub product_id: Uuid,
    /// `true` adds the product locally, `false` removes it.
    pub make_favorite: bool,
}

impl FavoriteToggle {
    /// Plans the toggle against the current local set.
    #[must_use]
    pub fn plan(current: &HashSet<Uuid>, product_id: Uuid) -> Self {
        Self {
            product_id,
            make_favorite: !current.contains(&product_id),
        }
    }

    /// Applies the projection to the local set.
    pub fn apply(&self, state: &mut HashSet<Uuid>) {
        if self.make_favorite {
            state.insert(self.product_id);
        } else {
            state.remove(&self.product_id);
        }
    }

    /// The inverse projection, for rollback.
    #[must_use]
    pub fn invert(&self) -> Self {
        Self {
            product_id: self.product_id,
            make_favorite: !self.make_favorite,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_more_preserves_query_and_filter() {
        let mut state = SearchState::new("молоко", Some(ProductCategory::Dairy));
        assert_eq!(state.page, 1);
        assert_eq!(state.offset(), 0);

        state.next_page();
        state.next_page();
        assert_eq!(state.page, 3);
        assert_eq!(state.offset(), 40);
        assert_eq!(state.query, "молоко");
        assert_eq!(state.category, Some(ProductCategory::Dairy));
    }

    #[test]
    fn has_more_compares_consumed_rows_to_total() {
        let mut state = SearchState::new("", None);
        assert!(state.has_more(21));
        assert!(!state.has_more(20));
        state.next_page();
        assert!(!state.has_more(40));
        assert!(state.has_more(41));
    }

    #[test]
    fn dedupe_keeps_first_occurrence_in_order() {
        // Reports for products A, B, A, C newest-first collapse to [A, B, C]
        // using A's newest entry.
        let feed = vec![("a", 1), ("b", 2), ("a", 3), ("c", 4)];
        let deduped = dedupe_recent(feed, 10, |(product, _)| *product);
        assert_eq!(deduped, vec![("a", 1), ("b", 2), ("c", 4)]);
    }

    #[test]
    fn dedupe_caps_output_length() {
        let feed = (0..100).map(|i| (i, i));
        let deduped = dedupe_recent(feed, 10, |(product, _)| *product);
        assert_eq!(deduped.len(), 10);
    }

    #[test]
    fn favorite_toggle_round_trips_through_invert() {
        let product = Uuid::new_v4();
        let mut local = HashSet::new();

        let toggle = FavoriteToggle::plan(&local, product);
        assert!(toggle.make_favorite);
        toggle.apply(&mut local);
        assert!(local.contains(&product));

        // Durable write failed: roll the projection back.
        toggle.invert().apply(&mut local);
        assert!(local.is_empty());
    }

    #[test]
    fn favorite_toggle_removes_existing_member() {
        let product = Uuid::new_v4();
        let mut local = HashSet::from([product]);

        let toggle = FavoriteToggle::plan(&local, product);
        assert!(!toggle.make_favorite);
        toggle.apply(&mut local);
        assert!(local.is_empty());
    }
}
