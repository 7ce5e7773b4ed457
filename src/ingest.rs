//! Merge freshly parsed candidates into a feed's stored items.
//!
//! Pure functions only: persistence and notification delivery stay with the
//! caller, so a scheduled iteration and an on-demand check racing each other
//! degrade to a redundant fetch, never to duplicated stored items.

use std::collections::HashSet;

use crate::model::{Candidate, Item};

/// Retention cap per feed: oldest entries are dropped past this.
pub const MAX_ITEMS_PER_FEED: usize = 100;

/// At most this many new items per merge become notifications.
pub const NOTIFY_LIMIT: usize = 3;

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The feed's full collection after the merge, newest-first.
    pub items: Vec<Item>,
    /// Items added by this merge, in parse order.
    pub fresh: Vec<Item>,
    /// The stored collection was empty before this merge.
    pub first_fetch: bool,
}

impl MergeOutcome {
    /// The subset of fresh items eligible for notification delivery.
    ///
    /// Empty on a first fetch: a newly added feed with years of history must
    /// not flood the user. Otherwise the first [`NOTIFY_LIMIT`] fresh items
    /// in parse order.
    pub fn notifiable(&self) -> &[Item] {
        if self.first_fetch {
            &[]
        } else {
            let n = self.fresh.len().min(NOTIFY_LIMIT);
            &self.fresh[..n]
        }
    }
}

/// Fold candidates into the existing collection.
///
/// Candidates whose identifier is already stored are no-ops; upstream edits
/// to a known entry never propagate. Fresh items are prepended in parse
/// order, then the collection is truncated to [`MAX_ITEMS_PER_FEED`].
pub fn merge(feed_id: &str, existing: Vec<Item>, candidates: Vec<Candidate>) -> MergeOutcome {
    let first_fetch = existing.is_empty();
    let known: HashSet<&str> = existing.iter().map(|item| item.id.as_str()).collect();

    let fresh: Vec<Item> = candidates
        .into_iter()
        .filter(|candidate| !known.contains(candidate.id.as_str()))
        .map(|candidate| candidate.into_item(feed_id))
        .collect();
    drop(known);

    let mut items = existing;
    if !fresh.is_empty() {
        let mut merged = fresh.clone();
        merged.append(&mut items);
        merged.truncate(MAX_ITEMS_PER_FEED);
        items = merged;
    }

    MergeOutcome {
        items,
        fresh,
        first_fetch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str) -> Candidate {
        Candidate {
            id: id.into(),
            title: format!("title {id}"),
            link: String::new(),
            summary: String::new(),
            published_at: None,
        }
    }

    #[test]
    fn merge_is_idempotent() {
        let candidates: Vec<_> = (0..5).map(|i| candidate(&format!("c{i}"))).collect();
        let first = merge("f", Vec::new(), candidates.clone());
        assert_eq!(first.items.len(), 5);

        let second = merge("f", first.items.clone(), candidates);
        assert_eq!(second.items.len(), 5);
        assert!(second.fresh.is_empty());
        assert!(!second.first_fetch);
    }

    #[test]
    fn retention_cap_keeps_newest_100() {
        let candidates: Vec<_> = (0..150).map(|i| candidate(&format!("c{i}"))).collect();
        let outcome = merge("f", Vec::new(), candidates);
        assert_eq!(outcome.items.len(), MAX_ITEMS_PER_FEED);
        // Parse order is preserved at the head, the tail 50 dropped.
        assert_eq!(outcome.items[0].id, "c0");
        assert_eq!(outcome.items[99].id, "c99");
    }

    #[test]
    fn fresh_items_prepend_before_existing() {
        let first = merge("f", Vec::new(), vec![candidate("old")]);
        let outcome = merge("f", first.items, vec![candidate("new")]);
        assert_eq!(outcome.items[0].id, "new");
        assert_eq!(outcome.items[1].id, "old");
    }

    #[test]
    fn first_fetch_suppresses_notifications() {
        let candidates: Vec<_> = (0..10).map(|i| candidate(&format!("c{i}"))).collect();
        let outcome = merge("f", Vec::new(), candidates);
        assert!(outcome.first_fetch);
        assert!(outcome.notifiable().is_empty());
    }

    #[test]
    fn later_fetch_notifies_at_most_three() {
        let seeded = merge("f", Vec::new(), vec![candidate("seed")]);
        let candidates: Vec<_> = (0..10).map(|i| candidate(&format!("c{i}"))).collect();
        let outcome = merge("f", seeded.items, candidates);
        assert!(!outcome.first_fetch);
        let notifiable = outcome.notifiable();
        assert_eq!(notifiable.len(), NOTIFY_LIMIT);
        assert_eq!(notifiable[0].id, "c0");
        assert_eq!(notifiable[2].id, "c2");
    }

    #[test]
    fn single_fresh_item_notifies_once() {
        let seeded = merge("f", Vec::new(), vec![candidate("seed")]);
        let outcome = merge("f", seeded.items, vec![candidate("only")]);
        assert_eq!(outcome.notifiable().len(), 1);
    }

    #[test]
    fn empty_candidates_is_a_noop() {
        let seeded = merge("f", Vec::new(), vec![candidate("seed")]);
        let outcome = merge("f", seeded.items.clone(), Vec::new());
        assert_eq!(outcome.items, seeded.items);
        assert!(outcome.fresh.is_empty());
    }
}
