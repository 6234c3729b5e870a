//! Per-connection subscription filter over event ids.

use std::collections::HashSet;

use crate::domain::EventId;

/// Event ids a single WebSocket connection watches.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    event_ids: HashSet<EventId>,
    all: bool,
}

impl SubscriptionManager {
    /// Creates an empty filter that matches nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds event ids; `wildcard` watches every event.
    pub fn subscribe(&mut self, ids: &[EventId], wildcard: bool) {
        self.all |= wildcard;
        self.event_ids.extend(ids.iter().copied());
    }

    /// Removes event ids; `wildcard` clears the watch-all flag.
    pub fn unsubscribe(&mut self, ids: &[EventId], wildcard: bool) {
        if wildcard {
            self.all = false;
        }
        for id in ids {
            self.event_ids.remove(id);
        }
    }

    /// Whether activity for `event_id` should be forwarded.
    #[must_use]
    pub fn matches(&self, event_id: EventId) -> bool {
        self.all || self.event_ids.contains(&event_id)
    }

    /// Number of explicitly watched events.
    #[must_use]
    pub fn count(&self) -> usize {
        self.event_ids.len()
    }

    /// Whether the wildcard is active.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_matches_nothing() {
        assert!(!SubscriptionManager::new().matches(EventId::new()));
    }

    #[test]
    fn explicit_ids_filter_events() {
        let mut subs = SubscriptionManager::new();
        let watched = EventId::new();
        subs.subscribe(&[watched], false);
        assert!(subs.matches(watched));
        assert!(!subs.matches(EventId::new()));
        assert_eq!(subs.count(), 1);

        subs.unsubscribe(&[watched], false);
        assert!(!subs.matches(watched));
    }

    #[test]
    fn wildcard_can_be_dropped() {
        let mut subs = SubscriptionManager::new();
        subs.subscribe(&[], true);
        assert!(subs.matches(EventId::new()));
        subs.unsubscribe(&[], true);
        assert!(!subs.is_wildcard());
        assert!(!subs.matches(EventId::new()));
    }
}
