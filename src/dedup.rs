use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use crate::fingerprint::Fingerprint;
use crate::model::ContentItem;

/// Seen-fingerprint set of one extraction run, shared by parallel page
/// workers. Each `insert` is a single check-then-write under the lock.
#[derive(Debug, Default)]
pub struct DedupState {
    seen: Mutex<HashSet<Fingerprint>>,
}

impl DedupState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the fingerprint was unseen and is now recorded.
    pub fn insert(&self, fingerprint: &Fingerprint) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        if seen.contains(fingerprint) {
            return false;
        }
        seen.insert(fingerprint.clone());
        true
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Final compaction pass: keeps the first occurrence of every fingerprint.
/// Running it on its own output is a no-op.
pub fn compact(items: Vec<ContentItem>) -> Vec<ContentItem> {
    let mut seen = HashSet::with_capacity(items.len());
    let before = items.len();
    let kept: Vec<ContentItem> = items
        .into_iter()
        .filter(|item| seen.insert(item.fingerprint.clone()))
        .collect();
    if kept.len() != before {
        tracing::debug!(dropped = before - kept.len(), "compaction removed duplicates");
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint;
    use crate::model::ContentType;
    use proptest::prelude::*;

    fn item(heading: &str, text: &str, url: &str) -> ContentItem {
        ContentItem {
            source_location: Some(url.to_string()),
            content_type: ContentType::Paragraph,
            heading: heading.to_string(),
            heading_path: vec![heading.to_string()],
            heading_level: 1,
            text: text.to_string(),
            list_items: None,
            fingerprint: fingerprint(heading, text),
        }
    }

    #[test]
    fn insert_only_once() {
        let state = DedupState::new();
        let fp = fingerprint("X", "same text");
        assert!(state.insert(&fp));
        assert!(!state.insert(&fp));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn concurrent_inserts_admit_one_winner() {
        use rayon::prelude::*;

        let state = DedupState::new();
        let fp = fingerprint("X", "contended");
        let admitted = (0..64)
            .into_par_iter()
            .filter(|_| state.insert(&fp))
            .count();
        assert_eq!(admitted, 1);
    }

    #[test]
    fn compaction_keeps_first_occurrence() {
        let items = vec![
            item("A", "one", "https://a.test/1"),
            item("A", "one", "https://a.test/2"),
            item("B", "two", "https://a.test/1"),
        ];
        let kept = compact(items);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].source_location.as_deref(), Some("https://a.test/1"));
        assert_eq!(kept[1].heading, "B");
    }

    proptest! {
        #[test]
        fn compaction_is_idempotent(
            pairs in prop::collection::vec(("[ab]", "[xyz]{1,2}"), 0..30)
        ) {
            let items: Vec<ContentItem> = pairs
                .iter()
                .map(|(h, t)| item(h, t, "https://a.test/"))
                .collect();
            let once = compact(items);
            let twice = compact(once.clone());
            prop_assert_eq!(once, twice);
        }
    }
}
