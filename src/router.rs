//! C10: the per-host router — message reception, duplicate suppression,
//! TTL sweep, fragmentation/reassembly, and the pluggable forwarding
//! policy that decides what to offer a peer at contact.
//!
//! Per §9's "replace abstract-factory hierarchies for strategies" note,
//! the three policies (Epidemic / Spray-and-Wait / Passive) are one
//! tagged enum rather than three trait implementations — there is no
//! behavior here that doesn't fit in a match arm.

use std::collections::HashMap;

use crate::cache::AdmitResult;
use crate::error::invariant_fail;
use crate::ids::{ConnectionId, HostId, InterfaceId};
use crate::interference::TransferStatus;
use crate::message::Message;
use crate::simulation::Simulation;
use crate::strategy::manager::ForwardingOrderManager;
use crate::strategy::ForwardingOrderStrategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RcvResult {
    RcvOk,
    DeniedOld,
    DeniedLowPriority,
    DeniedInterference,
    DeniedUnspecified,
}

#[derive(Debug, Clone)]
pub enum RouterKind {
    /// Offer every cached message to every peer once per contact.
    Epidemic,
    /// Binary copy-splitting: relay keeps `ceil(L/2)`, peer gets `floor(L/2)`.
    /// At `L == 1` only direct delivery to the final destination is offered.
    SprayAndWait { initial_copies: u32 },
    /// Never initiates a transfer; still receives and forwards nothing.
    Passive,
}

struct FragmentAssembly {
    parent_size: usize,
    pieces: Vec<Message>,
}

impl FragmentAssembly {
    fn covered(&self) -> bool {
        let mut ranges: Vec<(usize, usize)> = self
            .pieces
            .iter()
            .filter_map(|m| m.fragment_range().map(|r| (r.offset, r.offset + r.length)))
            .collect();
        ranges.sort_unstable();
        let mut next = 0usize;
        for (start, end) in ranges {
            if start > next {
                return false;
            }
            next = next.max(end);
        }
        next >= self.parent_size
    }
}

pub struct Router {
    pub kind: RouterKind,
    forwarding_strategy: ForwardingOrderStrategy,
    forwarding_manager: ForwardingOrderManager,
    reassembly: HashMap<String, FragmentAssembly>,
    /// Per-`(message id, peer host)` byte offset already split off into a
    /// fragment and offered to that peer (§4.9.7). Reaching `message.size()`
    /// means every byte of the message has been offered to this peer, so
    /// `forwarding_candidates` stops proposing it again.
    frag_progress: HashMap<(String, HostId), usize>,
}

impl Router {
    pub fn new(kind: RouterKind, forwarding_strategy: ForwardingOrderStrategy, forwarding_manager: ForwardingOrderManager) -> Self {
        Router {
            kind,
            forwarding_strategy,
            forwarding_manager,
            reassembly: HashMap::new(),
            frag_progress: HashMap::new(),
        }
    }

    fn is_passive(&self) -> bool {
        matches!(self.kind, RouterKind::Passive)
    }
}

impl Simulation {
    /// §4.9.1 the per-host tick: walk this host's connections and, where
    /// ready, hand the head of the forwarding candidate list to the
    /// interface for transmission.
    pub fn router_tick(&mut self, host_id: HostId, dt: f64) {
        if self.hosts[host_id.index()].router.is_passive() {
            return;
        }
        let now = self.now();
        let iface_ids = self.hosts[host_id.index()].interfaces.clone();
        for iface_id in iface_ids {
            let con_ids = self.interface_connection_ids(iface_id);
            for con_id in con_ids {
                self.try_forward_on_connection(host_id, iface_id, con_id, now, dt);
            }
        }
    }

    fn try_forward_on_connection(&mut self, host_id: HostId, iface_id: InterfaceId, con_id: ConnectionId, now: f64, dt: f64) {
        if !self.is_ready_to_begin_transfer(iface_id) {
            return;
        }
        let peer_iface = match self.connections.get(con_id.index()) {
            Some(c) if c.is_up() => c.other_interface(iface_id),
            _ => return,
        };
        let peer_host = self.host_of(peer_iface);

        let candidates = self.forwarding_candidates(host_id, peer_host, now);
        if candidates.is_empty() {
            return;
        }

        let order = {
            let router = &mut self.hosts[host_id.index()].router;
            router.forwarding_manager.apply(&candidates)
        };
        let chosen = candidates[order[0]].clone();
        // §4.9.7 negotiated capacity: bytes this connection can carry in
        // one tick at its current speed (see DESIGN.md).
        let capacity = (self.connections[con_id.index()].speed() * dt).floor().max(0.0) as usize;
        let outgoing = self.prepare_outgoing_copy(host_id, peer_host, &chosen, capacity);
        self.send_unicast_message_via_connection(iface_id, con_id, outgoing);
    }

    /// Candidates are this host's cached, unexpired messages the peer
    /// doesn't already hold, ordered by the forwarding-order strategy then
    /// the forwarding-order manager (§4.9.1, §4.7, §4.8). Spray-and-Wait at
    /// `copies == 1` only offers messages destined directly for the peer.
    /// A message already fully split off into fragments for this peer
    /// (§4.9.7) is excluded too — nothing left of it to offer.
    fn forwarding_candidates(&self, host_id: HostId, peer_host: HostId, now: f64) -> Vec<Message> {
        let host = &self.hosts[host_id.index()];
        let peer_cache = &self.hosts[peer_host.index()].cache;
        let strategy = host.router.forwarding_strategy.clone();

        let mut refs = host.cache.list(&strategy);
        refs.retain(|m| {
            !m.has_expired(now)
                && !peer_cache.contains(m.id())
                && host.router.frag_progress.get(&(m.id().to_string(), peer_host)).copied().unwrap_or(0) < m.size()
        });

        if let RouterKind::SprayAndWait { .. } = host.router.kind {
            refs.retain(|m| m.copies() > 1 || m.to() == peer_host);
        }

        refs.into_iter().cloned().collect()
    }

    /// Applies the router's copy policy to a message about to be offered,
    /// then fragments it if it doesn't fit the connection's negotiated
    /// capacity (§4.9.7): Spray-and-Wait splits the copy budget and writes
    /// the relay's retained half back into its own cache; Epidemic and
    /// Passive pass the message through unchanged. The result is then
    /// split into a `min(remaining, capacity)`-sized fragment if it's too
    /// big to cross in one tick at this connection's speed.
    fn prepare_outgoing_copy(&mut self, host_id: HostId, peer_host: HostId, m: &Message, capacity: usize) -> Message {
        let kind = self.hosts[host_id.index()].router.kind.clone();
        let logical = match kind {
            RouterKind::SprayAndWait { .. } if m.copies() > 1 => {
                let keep = m.copies().div_ceil(2);
                let give = m.copies() / 2;
                let kept = m.with_copies(keep);
                let given = m.with_copies(give);
                self.hosts[host_id.index()].cache.replace(kept);
                given
            }
            _ => m.clone(),
        };

        if capacity == 0 || logical.is_fragment() || logical.size() <= capacity {
            return logical;
        }
        self.fragment_for_send(host_id, peer_host, &logical, capacity)
    }

    /// Splits `m` into the next not-yet-offered `min(remaining, capacity)`
    /// byte range for `peer_host`, advancing this (message, peer) pair's
    /// offset so later ticks continue from where this one left off.
    fn fragment_for_send(&mut self, host_id: HostId, peer_host: HostId, m: &Message, capacity: usize) -> Message {
        let router = &mut self.hosts[host_id.index()].router;
        let key = (m.id().to_string(), peer_host);
        let offset = router.frag_progress.get(&key).copied().unwrap_or(0);
        let length = (m.size() - offset).min(capacity).max(1);
        let fragment = m.fragment(offset, length);
        router.frag_progress.insert(key, offset + length);
        fragment
    }

    /// §4.9.2 `receiveMessage`. Early-rejects a strictly-older duplicate or
    /// a message that could never fit this cache, otherwise defers to the
    /// receiving interface's interference model.
    pub fn router_receive_message(&mut self, receiver: InterfaceId, sender: InterfaceId, con_id: ConnectionId, message: Message) -> RcvResult {
        let receiver_host = self.host_of(receiver);
        let cache = &self.hosts[receiver_host.index()].cache;

        if let Some(existing) = cache.get(message.id()) {
            if existing.receive_time() >= message.receive_time() {
                return RcvResult::DeniedOld;
            }
        }
        if message.size() > cache.capacity() {
            return RcvResult::DeniedLowPriority;
        }

        let receiver_sending = self.is_sending(receiver);
        let outcome = self.interfaces[receiver.index()]
            .interference_mut()
            .begin_new_reception(sender, con_id, message, receiver_sending);
        match outcome {
            crate::interference::ReceptionOutcome::Ok => RcvResult::RcvOk,
            crate::interference::ReceptionOutcome::Interfered => RcvResult::DeniedInterference,
            crate::interference::ReceptionOutcome::DeniedDueToSend => RcvResult::DeniedUnspecified,
        }
    }

    /// §4.9.3 `messageTransferred`. Retrieves the completed reception,
    /// admits it (subject to duplicate suppression and cache eviction),
    /// notifies listeners, attempts fragment reassembly at the final
    /// destination, and clears the connection's transfer slot either way.
    pub fn router_message_transferred(&mut self, receiver: InterfaceId, sender: InterfaceId, con_id: ConnectionId) {
        let now = self.now();
        let msg_id = match self.connections[con_id.index()].message() {
            Some(m) => m.id().to_string(),
            None => return,
        };

        let status = self.interfaces[receiver.index()].interference().is_message_transferred_correctly(&msg_id, sender);
        let receiver_host = self.host_of(receiver);
        let sender_host = self.host_of(sender);

        match status {
            TransferStatus::CompletedCorrectly => {
                let message = self.interfaces[receiver.index()].interference_mut().retrieve_transferred_message(&msg_id, sender);
                self.connections[con_id.index()].clear();
                self.admit_received_message(receiver_host, sender_host, message, now);
            }
            TransferStatus::Incomplete => {
                let message = self.interfaces[receiver.index()].interference_mut().force_interference(&msg_id, sender);
                self.connections[con_id.index()].clear();
                if let Some(message) = message {
                    self.notify_transmission_interfered(sender_host, receiver_host, &message);
                }
            }
            TransferStatus::MessageIdNotFound => {
                invariant_fail(format!("messageTransferred for unknown reception {msg_id} at {receiver}"));
            }
        }
    }

    fn admit_received_message(&mut self, receiver_host: HostId, sender_host: HostId, message: Message, now: f64) {
        let cache = &self.hosts[receiver_host.index()].cache;
        if let Some(existing) = cache.get(message.id()) {
            if existing.receive_time() >= message.receive_time() {
                return;
            }
        }

        let is_final_target = message.to() == receiver_host;
        let already_cached = self.hosts[receiver_host.index()].cache.contains(message.id());
        let first_delivery = is_final_target && !already_cached;
        let received = message.with_received(receiver_host, now);

        // a strictly newer copy of an id already in the cache must replace
        // it in place, not sit alongside it — `Cache::admit` never dedupes
        // by id itself (§3/§8: "no two cache entries share an id").
        let was_pinned = already_cached && self.hosts[receiver_host.index()].cache.is_pinned(message.id());
        if already_cached {
            self.hosts[receiver_host.index()].cache.remove(message.id());
        }

        let strategy = self.hosts[receiver_host.index()].router_caching_strategy();
        let admit_result = self.hosts[receiver_host.index()].cache.admit(received.clone(), &strategy);
        match admit_result {
            AdmitResult::RejectedTooBig => return,
            AdmitResult::Evicted(evicted) => {
                for e in evicted {
                    self.notify_message_deleted(receiver_host, &e, true, "evicted");
                }
            }
            AdmitResult::Admitted => {}
        }
        if was_pinned {
            self.hosts[receiver_host.index()].cache.pin(received.id());
        }

        self.notify_transferred(sender_host, receiver_host, &received, first_delivery, is_final_target);

        if received.is_fragment() {
            self.try_reassemble(receiver_host, &received, now);
        }
    }

    fn try_reassemble(&mut self, host_id: HostId, fragment: &Message, now: f64) {
        let parent_id = fragment.fragment_of().unwrap().to_string();
        let parent_size = fragment
            .fragment_range()
            .map(|r| {
                // the true parent size isn't carried on the fragment itself
                // beyond what's needed to validate this piece; reassembly
                // tracks the maximum observed extent instead.
                r.offset + r.length
            })
            .unwrap_or(fragment.size());

        let router = &mut self.hosts[host_id.index()].router;
        let entry = router.reassembly.entry(parent_id.clone()).or_insert_with(|| FragmentAssembly {
            parent_size,
            pieces: Vec::new(),
        });
        entry.parent_size = entry.parent_size.max(parent_size);
        entry.pieces.push(fragment.clone());

        if entry.covered() {
            let assembly = router.reassembly.remove(&parent_id).unwrap();
            let first = &assembly.pieces[0];
            let whole = Message::new(parent_id, assembly.parent_size, first.priority(), first.ttl(), first.create_time(), first.from(), first.to())
                .with_received(host_id, now);
            let is_final_target = whole.to() == host_id;
            let strategy = self.hosts[host_id.index()].router_caching_strategy();
            let _ = self.hosts[host_id.index()].cache.admit(whole.clone(), &strategy);
            self.notify_transferred(whole.from(), host_id, &whole, true, is_final_target);
        }
    }

    /// §4.9.4 `abort`.
    pub fn router_abort_reception(&mut self, receiver: InterfaceId, sender: InterfaceId, message: &Message, reason: &str) {
        self.interfaces[receiver.index()].interference_mut().abort_message_reception(message.id(), sender);
        let _ = reason;
    }

    /// §4.9.6 TTL sweep: removes expired cache entries and reports them.
    pub fn router_ttl_sweep(&mut self, host_id: HostId, now: f64) {
        let expired_ids: Vec<String> = {
            let cache = &self.hosts[host_id.index()].cache;
            cache.list(&self.hosts[host_id.index()].router_caching_strategy())
                .iter()
                .filter(|m| m.has_expired(now))
                .map(|m| m.id().to_string())
                .collect()
        };
        for id in expired_ids {
            if let Some(m) = self.hosts[host_id.index()].cache.remove(&id) {
                self.notify_message_deleted(host_id, &m, false, "TTL");
            }
        }
    }
}
