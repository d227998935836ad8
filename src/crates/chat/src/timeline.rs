//! Ordered, de-duplicated message timeline
//!
//! Live messages are appended at the tail in arrival order; history pages
//! arrive newest-first and are reversed onto the head. Ids already present
//! are skipped either way.

use crate::message::Message;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct Timeline {
    messages: Vec<Message>,
    seen: HashSet<i64>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a live message. Returns `false` for a known id.
    pub fn append(&mut self, message: Message) -> bool {
        if !self.seen.insert(message.id) {
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Put an older page (newest first) in front of the timeline. Returns
    /// how many messages were added.
    pub fn prepend_page(&mut self, page: Vec<Message>) -> usize {
        let mut older: Vec<Message> = Vec::with_capacity(page.len());
        for message in page.into_iter().rev() {
            if self.seen.insert(message.id) {
                older.push(message);
            }
        }

        let added = older.len();
        if added > 0 {
            older.append(&mut self.messages);
            self.messages = older;
        }
        added
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.seen.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn contains(&self, id: i64) -> bool {
        self.seen.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn oldest_id(&self) -> Option<i64> {
        self.messages.first().map(|m| m.id)
    }

    pub fn newest_id(&self) -> Option<i64> {
        self.messages.last().map(|m| m.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn msg(id: i64) -> Message {
        Message {
            id,
            sender_id: 1,
            sender_name: "Jan".to_string(),
            content: format!("message {}", id),
            timestamp: String::new(),
        }
    }

    fn ids(timeline: &Timeline) -> Vec<i64> {
        timeline.messages().iter().map(|m| m.id).collect()
    }

    #[test]
    fn test_prepend_reverses_page() {
        let mut timeline = Timeline::new();
        timeline.append(msg(3));
        timeline.append(msg(4));

        let added = timeline.prepend_page(vec![msg(2), msg(1)]);

        assert_eq!(added, 2);
        assert_eq!(ids(&timeline), vec![1, 2, 3, 4]);
        assert_eq!(timeline.oldest_id(), Some(1));
        assert_eq!(timeline.newest_id(), Some(4));
    }

    #[test]
    fn test_duplicates_are_skipped() {
        let mut timeline = Timeline::new();
        assert!(timeline.append(msg(5)));
        assert!(!timeline.append(msg(5)));

        // Page overlapping a live message
        let added = timeline.prepend_page(vec![msg(5), msg(4), msg(3)]);
        assert_eq!(added, 2);
        assert_eq!(ids(&timeline), vec![3, 4, 5]);
    }

    #[test]
    fn test_clear() {
        let mut timeline = Timeline::new();
        timeline.append(msg(1));
        timeline.clear();

        assert!(timeline.is_empty());
        assert!(!timeline.contains(1));
        assert!(timeline.append(msg(1)));
    }

    proptest! {
        // Server-ordered input: history pages cover the oldest ids newest
        // first, live messages carry the newest ids, and pages may repeat
        // messages already delivered live.
        #[test]
        fn prop_history_and_live_merge_sorted_and_unique(
            id_set in proptest::collection::btree_set(1i64..10_000, 0..80),
            split in 0usize..80,
            page_size in 1usize..10,
            overlap in 0usize..5,
        ) {
            let all: Vec<i64> = id_set.into_iter().collect();
            let split = split.min(all.len());
            let (history, live) = all.split_at(split);

            let mut timeline = Timeline::new();
            for id in live {
                timeline.append(msg(*id));
            }

            // Newest-first pages, optionally echoing the oldest live ids
            let mut newest_first: Vec<i64> = live.iter().take(overlap).rev().copied().collect();
            newest_first.extend(history.iter().rev());
            for page in newest_first.chunks(page_size) {
                timeline.prepend_page(page.iter().map(|id| msg(*id)).collect());
            }

            let got = ids(&timeline);
            prop_assert_eq!(got, all.clone());
            prop_assert_eq!(timeline.len(), all.len());
        }

        #[test]
        fn prop_never_duplicates(ops in proptest::collection::vec((any::<bool>(), proptest::collection::vec(1i64..50, 0..8)), 0..30)) {
            let mut timeline = Timeline::new();
            for (live, ids_in) in ops {
                if live {
                    for id in ids_in {
                        timeline.append(msg(id));
                    }
                } else {
                    timeline.prepend_page(ids_in.into_iter().map(msg).collect());
                }
            }

            let got = ids(&timeline);
            let unique: HashSet<i64> = got.iter().copied().collect();
            prop_assert_eq!(unique.len(), got.len());
        }
    }
}
