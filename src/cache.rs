//! C6: the per-host message cache manager.
//!
//! A finite-size buffered store of messages with eviction driven by a
//! pluggable (C7) caching-priority strategy. Messages this host created or
//! is the final recipient of are never evicted to make room for foreign
//! traffic, and a message pinned by an active outgoing transfer is never
//! evicted at all (§4.5, §4.10).

use std::collections::HashSet;

use crate::ids::HostId;
use crate::message::Message;
use crate::strategy::CachingPriorityStrategy;

#[derive(Debug, Clone)]
pub enum AdmitResult {
    Admitted,
    RejectedTooBig,
    Evicted(Vec<Message>),
}

pub struct Cache {
    host: HostId,
    capacity: usize,
    entries: Vec<Message>,
    pinned: HashSet<String>,
}

impl Cache {
    pub fn new(host: HostId, capacity: usize) -> Self {
        Cache {
            host,
            capacity,
            entries: Vec::new(),
            pinned: HashSet::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn current_size(&self) -> usize {
        self.entries.iter().map(|m| m.size()).sum()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|m| m.id() == id)
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.entries.iter().find(|m| m.id() == id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Message> {
        let pos = self.entries.iter().position(|m| m.id() == id)?;
        self.pinned.remove(id);
        Some(self.entries.remove(pos))
    }

    /// Pins a message so it survives eviction while it has an active
    /// outgoing transfer in flight.
    pub fn pin(&mut self, id: &str) {
        self.pinned.insert(id.to_string());
    }

    pub fn unpin(&mut self, id: &str) {
        self.pinned.remove(id);
    }

    pub fn is_pinned(&self, id: &str) -> bool {
        self.pinned.contains(id)
    }

    /// Replaces an existing entry's value in place (used when a "mutated"
    /// logical version — e.g. a forward-count bump — needs to overwrite
    /// the cached copy without disturbing its position).
    pub fn replace(&mut self, m: Message) {
        if let Some(slot) = self.entries.iter_mut().find(|e| e.id() == m.id()) {
            *slot = m;
        }
    }

    /// Returns cached messages in current caching-priority order
    /// (ascending = served first / evicted last).
    pub fn list(&self, strategy: &CachingPriorityStrategy) -> Vec<&Message> {
        let mut refs: Vec<&Message> = self.entries.iter().collect();
        strategy.sort(&mut refs);
        refs
    }

    fn is_protected(&self, m: &Message) -> bool {
        m.from() == self.host || m.to() == self.host
    }

    /// §4.5 `admit`. Evicts in reverse caching-priority order until `m`
    /// fits, skipping pinned and protected (own-traffic) entries. If even
    /// evicting everything evictable can't free enough room, nothing is
    /// evicted and the admission is rejected — the spec defines only
    /// three outcomes, so this shares `RejectedTooBig` with the "message
    /// bigger than total capacity" case (see DESIGN.md).
    pub fn admit(&mut self, m: Message, strategy: &CachingPriorityStrategy) -> AdmitResult {
        if m.size() > self.capacity {
            return AdmitResult::RejectedTooBig;
        }
        if self.current_size() + m.size() <= self.capacity {
            self.entries.push(m);
            return AdmitResult::Admitted;
        }

        let needed = self.current_size() + m.size() - self.capacity;
        let mut candidates: Vec<&Message> = self
            .entries
            .iter()
            .filter(|e| !self.pinned.contains(e.id()) && !self.is_protected(e))
            .collect();
        strategy.sort_reverse(&mut candidates);

        let mut freed = 0usize;
        let mut evict_ids = Vec::new();
        for c in candidates {
            if freed >= needed {
                break;
            }
            freed += c.size();
            evict_ids.push(c.id().to_string());
        }
        if freed < needed {
            return AdmitResult::RejectedTooBig;
        }

        let evicted: Vec<Message> = evict_ids.iter().filter_map(|id| self.remove(id)).collect();
        self.entries.push(m);
        AdmitResult::Evicted(evicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Ttl;

    fn m(id: &str, size: usize, receive_time: f64) -> Message {
        Message::new(id, size, 0, Ttl::Infinite, 0.0, HostId(0), HostId(1)).with_received(HostId(0), receive_time)
    }

    #[test]
    fn empty_cache_rejects_get_and_remove() {
        let cache = Cache::new(HostId(9), 1000);
        assert!(cache.get("nope").is_none());
    }

    #[test]
    fn admits_message_exactly_at_capacity() {
        let mut cache = Cache::new(HostId(9), 500);
        let result = cache.admit(m("M1", 500, 1.0), &CachingPriorityStrategy::Fifo);
        assert!(matches!(result, AdmitResult::Admitted));
    }

    #[test]
    fn rejects_message_bigger_than_capacity() {
        let mut cache = Cache::new(HostId(9), 500);
        let result = cache.admit(m("M1", 501, 1.0), &CachingPriorityStrategy::Fifo);
        assert!(matches!(result, AdmitResult::RejectedTooBig));
    }

    #[test]
    fn evicts_fifo_oldest_first() {
        // §8 scenario 4.
        let mut cache = Cache::new(HostId(9), 1500);
        cache.admit(m("M1", 800, 1.0), &CachingPriorityStrategy::Fifo);
        cache.admit(m("M2", 500, 2.0), &CachingPriorityStrategy::Fifo);
        let result = cache.admit(m("M3", 500, 3.0), &CachingPriorityStrategy::Fifo);
        match result {
            AdmitResult::Evicted(evicted) => {
                assert_eq!(evicted.len(), 1);
                assert_eq!(evicted[0].id(), "M1");
            }
            other => panic!("expected eviction, got {other:?}"),
        }
        assert_eq!(cache.current_size(), 1000);
        assert!(cache.contains("M2"));
        assert!(cache.contains("M3"));
        assert!(!cache.contains("M1"));
    }

    #[test]
    fn never_evicts_own_traffic_for_foreign_messages() {
        let host = HostId(1);
        let mut cache = Cache::new(host, 1000);
        // owned by this host as sender.
        let mine = Message::new("Mine", 900, 0, Ttl::Infinite, 0.0, host, HostId(2)).with_received(host, 1.0);
        cache.admit(mine, &CachingPriorityStrategy::Fifo);
        let foreign = Message::new("Foreign", 500, 0, Ttl::Infinite, 0.0, HostId(5), HostId(6)).with_received(host, 2.0);
        let result = cache.admit(foreign, &CachingPriorityStrategy::Fifo);
        assert!(matches!(result, AdmitResult::RejectedTooBig));
        assert!(cache.contains("Mine"));
    }

    #[test]
    fn pinned_message_is_never_evicted() {
        let mut cache = Cache::new(HostId(9), 1000);
        cache.admit(m("Pinned", 900, 1.0), &CachingPriorityStrategy::Fifo);
        cache.pin("Pinned");
        let result = cache.admit(m("New", 500, 2.0), &CachingPriorityStrategy::Fifo);
        assert!(matches!(result, AdmitResult::RejectedTooBig));
        assert!(cache.contains("Pinned"));
    }

    #[test]
    fn no_two_entries_share_an_id() {
        let mut cache = Cache::new(HostId(9), 1000);
        cache.admit(m("M1", 100, 1.0), &CachingPriorityStrategy::Fifo);
        assert!(cache.get("M1").is_some());
        // overwriting semantics belong to `replace`, not a second `admit`.
        let ids: Vec<&str> = cache.entries.iter().map(|m| m.id()).collect();
        assert_eq!(ids.iter().filter(|&&id| id == "M1").count(), 1);
    }
}
