//! C2: message identity, payload surrogate, and fragment lineage.
//!
//! Messages are shared, immutable values after creation (§5): mutation
//! (hop append, forward-count bump) produces a new logical version kept
//! under the same id rather than mutating a value other code may be
//! holding a reference to. `Message` therefore derives `Clone` the way
//! the teacher's `RadioPacket`/`NodeMessage` do, and callers that need to
//! "mutate" a message call one of the `with_*` methods below and store
//! the result back into the cache.

use crate::ids::HostId;

/// A finite TTL in whole minutes, or no expiry at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    Minutes(u32),
    Infinite,
}

impl Ttl {
    /// Absolute expiry time in simulation seconds, or `None` if infinite.
    pub fn expiry(&self, create_time: f64) -> Option<f64> {
        match self {
            Ttl::Infinite => None,
            Ttl::Minutes(m) => Some(create_time + (*m as f64) * 60.0),
        }
    }
}

/// `(offset, length)` byte range of a fragment within its parent message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentRange {
    pub offset: usize,
    pub length: usize,
}

#[derive(Debug, Clone)]
pub struct Message {
    id: String,
    size: usize,
    priority: i32,
    ttl: Ttl,
    create_time: f64,
    /// Latest receive time at the current holder; updated on admission,
    /// never on creation at the original sender.
    receive_time: f64,
    forward_times: u32,
    hop_path: Vec<HostId>,
    from: HostId,
    to: HostId,
    fragment_of: Option<String>,
    fragment_range: Option<FragmentRange>,
    /// Spray-and-Wait copy budget; unused by other router policies.
    copies: u32,
}

impl Message {
    #[allow(clippy::too_many_arguments)]
    pub fn new(id: impl Into<String>, size: usize, priority: i32, ttl: Ttl, create_time: f64, from: HostId, to: HostId) -> Self {
        Message {
            id: id.into(),
            size,
            priority,
            ttl,
            create_time,
            receive_time: create_time,
            forward_times: 0,
            hop_path: vec![from],
            from,
            to,
            fragment_of: None,
            fragment_range: None,
            copies: 1,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
    pub fn size(&self) -> usize {
        self.size
    }
    pub fn priority(&self) -> i32 {
        self.priority
    }
    pub fn ttl(&self) -> Ttl {
        self.ttl
    }
    pub fn create_time(&self) -> f64 {
        self.create_time
    }
    pub fn receive_time(&self) -> f64 {
        self.receive_time
    }
    pub fn forward_times(&self) -> u32 {
        self.forward_times
    }
    pub fn hop_path(&self) -> &[HostId] {
        &self.hop_path
    }
    pub fn from(&self) -> HostId {
        self.from
    }
    pub fn to(&self) -> HostId {
        self.to
    }
    pub fn fragment_of(&self) -> Option<&str> {
        self.fragment_of.as_deref()
    }
    pub fn fragment_range(&self) -> Option<FragmentRange> {
        self.fragment_range
    }
    pub fn is_fragment(&self) -> bool {
        self.fragment_of.is_some()
    }
    pub fn copies(&self) -> u32 {
        self.copies
    }

    pub fn has_expired(&self, now: f64) -> bool {
        matches!(self.ttl.expiry(self.create_time), Some(expiry) if now >= expiry)
    }

    /// Produces a new logical version recorded as received by `host` at
    /// `now`, with the hop appended. `forward_times` is not bumped here —
    /// that only happens when *this* host goes on to relay it (see
    /// `with_forwarded`) — so a message simply admitted to a cache keeps
    /// its incoming forward count.
    pub fn with_received(&self, host: HostId, now: f64) -> Message {
        let mut m = self.clone();
        m.receive_time = now;
        if m.hop_path.last() != Some(&host) {
            m.hop_path.push(host);
        }
        m
    }

    /// Produces a new logical version with `forward_times` incremented by
    /// one. Invariant: `forward_times` is monotonically non-decreasing, so
    /// this never decreases it and there is no corresponding "unforward".
    pub fn with_forwarded(&self) -> Message {
        let mut m = self.clone();
        m.forward_times += 1;
        m
    }

    /// Splits remaining copies in half for Spray-and-Wait (binary mode):
    /// the relay keeps `ceil(copies/2)`, the peer receives `floor(copies/2)`.
    pub fn with_copies(&self, copies: u32) -> Message {
        let mut m = self.clone();
        m.copies = copies;
        m
    }

    /// Builds a fragment covering `[offset, offset+length)` of `self`.
    /// `self` must not itself be a fragment — fragments are not
    /// re-fragmented.
    pub fn fragment(&self, offset: usize, length: usize) -> Message {
        assert!(!self.is_fragment(), "cannot fragment an existing fragment");
        assert!(offset + length <= self.size, "fragment range exceeds parent size");
        let mut m = self.clone();
        m.id = format!("{}#{}-{}", self.id, offset, offset + length);
        m.size = length;
        m.fragment_of = Some(self.id.clone());
        m.fragment_range = Some(FragmentRange { offset, length });
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(n: u32) -> HostId {
        HostId(n)
    }

    #[test]
    fn forward_times_is_monotonic() {
        let m = Message::new("M1", 100, 0, Ttl::Infinite, 0.0, h(1), h(2));
        assert_eq!(m.forward_times(), 0);
        let m2 = m.with_forwarded();
        assert_eq!(m2.forward_times(), 1);
        let m3 = m2.with_forwarded();
        assert_eq!(m3.forward_times(), 2);
        // original is untouched: messages are immutable after creation.
        assert_eq!(m.forward_times(), 0);
    }

    #[test]
    fn ttl_expiry_boundary() {
        let m = Message::new("M1", 10, 0, Ttl::Minutes(1), 0.0, h(1), h(2));
        assert!(!m.has_expired(59.999));
        assert!(m.has_expired(60.0));
    }

    #[test]
    fn infinite_ttl_never_expires() {
        let m = Message::new("M1", 10, 0, Ttl::Infinite, 0.0, h(1), h(2));
        assert!(!m.has_expired(1_000_000.0));
    }

    #[test]
    fn fragment_range_respects_parent_bounds() {
        let m = Message::new("M1", 1000, 0, Ttl::Infinite, 0.0, h(1), h(2));
        let frag = m.fragment(0, 500);
        assert_eq!(frag.fragment_range().unwrap().offset, 0);
        assert_eq!(frag.fragment_range().unwrap().length, 500);
        assert_eq!(frag.fragment_of(), Some("M1"));
        assert_eq!(frag.size(), 500);
    }

    #[test]
    #[should_panic]
    fn fragment_range_cannot_exceed_parent() {
        let m = Message::new("M1", 100, 0, Ttl::Infinite, 0.0, h(1), h(2));
        m.fragment(50, 100);
    }

    #[test]
    fn copies_split_binary() {
        let m = Message::new("M1", 10, 0, Ttl::Infinite, 0.0, h(1), h(2)).with_copies(8);
        let relay_keeps = (m.copies() + 1) / 2;
        let peer_gets = m.copies() / 2;
        assert_eq!(relay_keeps, 4);
        assert_eq!(peer_gets, 4);
    }
}
