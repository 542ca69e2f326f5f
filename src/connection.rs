//! C3: the connection — a directed-capacity link between two interfaces.
//!
//! `Connection` itself is plain data (an arena entry owned by `Simulation`,
//! per the design notes' "no cyclic ownership" arena rule); the
//! orchestration that spans connection + router + interference model
//! (`start_transfer`, `update`) lives on `impl Simulation` in this file,
//! matching the component's place in the dependency graph (C3 sits below
//! C4 Interface and needs only the receiver's router, not the other way
//! around).

use crate::error::invariant_fail;
use crate::ids::{ConnectionId, InterfaceId};
use crate::message::Message;
use crate::router::RcvResult;
use crate::simulation::Simulation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnicastResult {
    Ok,
    Denied,
    Failed,
}

#[derive(Debug, Clone, Copy)]
pub enum ConnectionKind {
    /// Fixed bit rate, set once at creation.
    Cbr { speed: f64 },
    /// Recomputed every tick from the Gupta–Kumar capacity formula.
    Vbr { max_speed: f64, current_speed: f64 },
}

impl ConnectionKind {
    pub fn speed(&self) -> f64 {
        match self {
            ConnectionKind::Cbr { speed } => *speed,
            ConnectionKind::Vbr { current_speed, .. } => *current_speed,
        }
    }
}

#[derive(Debug, Clone)]
struct InFlight {
    sender: InterfaceId,
    message: Message,
    bytes_remaining: usize,
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub a: InterfaceId,
    pub b: InterfaceId,
    /// The interface that opened this connection; it alone may tear it
    /// down on range loss (§3 "owned by the sender side for lifecycle")
    /// and it alone advances `tick_bytes` each tick — both endpoints
    /// carry the same `ConnectionId` in their connection list, so ticking
    /// from only one side keeps byte accounting from double-counting
    /// (§4.2).
    pub owner: InterfaceId,
    pub kind: ConnectionKind,
    pub up: bool,
    pub start_time: f64,
    transfer: Option<InFlight>,
}

impl Connection {
    pub fn new_cbr(id: ConnectionId, a: InterfaceId, b: InterfaceId, owner: InterfaceId, speed: f64, start_time: f64) -> Self {
        Connection {
            id,
            a,
            b,
            owner,
            kind: ConnectionKind::Cbr { speed },
            up: true,
            start_time,
            transfer: None,
        }
    }

    pub fn new_vbr(id: ConnectionId, a: InterfaceId, b: InterfaceId, owner: InterfaceId, max_speed: f64, start_time: f64) -> Self {
        Connection {
            id,
            a,
            b,
            owner,
            kind: ConnectionKind::Vbr { max_speed, current_speed: max_speed },
            up: true,
            start_time,
            transfer: None,
        }
    }

    /// Returns the peer endpoint. An invariant violation if `self_iface`
    /// is not actually one of this connection's two endpoints.
    pub fn other_interface(&self, self_iface: InterfaceId) -> InterfaceId {
        if self_iface == self.a {
            self.b
        } else if self_iface == self.b {
            self.a
        } else {
            invariant_fail(format!("{self_iface} is not an endpoint of connection {}", self.id));
        }
    }

    pub fn speed(&self) -> f64 {
        self.kind.speed()
    }

    pub fn message(&self) -> Option<&Message> {
        self.transfer.as_ref().map(|t| &t.message)
    }

    pub fn sender(&self) -> Option<InterfaceId> {
        self.transfer.as_ref().map(|t| t.sender)
    }

    pub fn bytes_remaining(&self) -> usize {
        self.transfer.as_ref().map(|t| t.bytes_remaining).unwrap_or(0)
    }

    pub fn is_message_transferred(&self) -> bool {
        matches!(&self.transfer, Some(t) if t.bytes_remaining == 0)
    }

    pub fn is_sending(&self) -> bool {
        self.transfer.is_some() && !self.is_message_transferred()
    }

    /// Assigns a message to this connection, resetting the byte counter to
    /// the full message size (§9 open question: preserving a partially
    /// sent prefix on duplicate-onto-new-connection is left unspecified by
    /// the source; resetting is the documented decision, see DESIGN.md).
    pub(crate) fn assign(&mut self, sender: InterfaceId, message: Message) {
        let bytes_remaining = message.size();
        self.transfer = Some(InFlight { sender, message, bytes_remaining });
    }

    /// Advances the in-flight transfer by `dt` seconds at the connection's
    /// current speed. Returns `true` exactly once, the tick the transfer
    /// reaches zero bytes remaining.
    pub(crate) fn tick_bytes(&mut self, dt: f64) -> bool {
        let Some(t) = self.transfer.as_mut() else { return false };
        if t.bytes_remaining == 0 {
            return false;
        }
        let sent = (self.kind.speed() * dt).floor().max(0.0) as usize;
        let before = t.bytes_remaining;
        t.bytes_remaining = t.bytes_remaining.saturating_sub(sent);
        before > 0 && t.bytes_remaining == 0
    }

    /// Clears the in-flight message without delivering it (abort or a
    /// denied send that doesn't count as "in progress").
    pub(crate) fn clear(&mut self) {
        self.transfer = None;
    }

    pub fn is_up(&self) -> bool {
        self.up
    }

    pub fn set_up(&mut self, up: bool) {
        self.up = up;
    }

    /// VBR: `speed := floor(maxSpeed / sqrt(n * ln n) / k)`, Gupta–Kumar
    /// capacity, recomputed every tick (§4.2). `n` is the number of active
    /// transmitters heard by the receiver (promoted to at least 2 per the
    /// source, even for a single transmitter — see the Open Questions in
    /// `DESIGN.md`); `k` is the number of connections currently sharing
    /// this interface's receive budget.
    pub fn recompute_vbr_speed(&mut self, number_of_active_transmitters: u32, number_of_current_transmissions: u32) {
        if let ConnectionKind::Vbr { max_speed, current_speed } = &mut self.kind {
            let n = (number_of_active_transmitters.max(2)) as f64;
            let k = (number_of_current_transmissions.max(1)) as f64;
            *current_speed = (*max_speed / (n * n.ln()).sqrt() / k).floor().max(0.0);
        }
    }
}

impl Simulation {
    /// §4.2 `startTransfer`: assigns `m` to `con` and hands reception off
    /// to the receiver's router. `DENIED_INTERFERENCE` still leaves the
    /// connection's transfer assigned — the sender counts a collided send
    /// as "in progress" for its own accounting — every other denial clears
    /// it immediately since nothing was actually sent.
    pub fn start_transfer(&mut self, con_id: ConnectionId, sender: InterfaceId, message: Message) -> RcvResult {
        let receiver = self.connections[con_id.index()].other_interface(sender);
        self.connections[con_id.index()].assign(sender, message.clone());

        let result = self.router_receive_message(receiver, sender, con_id, message.clone());

        let clear = !matches!(result, RcvResult::RcvOk | RcvResult::DeniedInterference);
        if clear {
            self.connections[con_id.index()].clear();
        }
        if matches!(result, RcvResult::RcvOk) {
            let (from, to) = (self.host_of(sender), self.host_of(receiver));
            self.notify_transfer_started(from, to, &message);
        }
        result
    }

    /// §4.2 `update`: advances `bytesRemaining` for every live connection's
    /// in-flight transfer; on reaching zero, hands the completed transfer
    /// to the receiver router's `messageTransferred`.
    pub fn update_connection(&mut self, con_id: ConnectionId, dt: f64) {
        let just_completed = self.connections[con_id.index()].tick_bytes(dt);
        if just_completed {
            let con = &self.connections[con_id.index()];
            let Some(sender) = con.sender() else { return };
            let receiver = con.other_interface(sender);
            self.router_message_transferred(receiver, sender, con_id);
        }
    }

    /// §4.2 `abort`: clears the in-flight message and notifies both sides.
    pub fn abort_connection_transfer(&mut self, con_id: ConnectionId, reason: &str) {
        let con = &self.connections[con_id.index()];
        let Some(sender) = con.sender() else { return };
        let receiver = con.other_interface(sender);
        let message = con.message().cloned();
        self.connections[con_id.index()].clear();
        if let Some(message) = message {
            self.router_abort_reception(receiver, sender, &message, reason);
            let (from, to) = (self.host_of(sender), self.host_of(receiver));
            self.notify_transfer_aborted(from, to, &message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::HostId;
    use crate::message::Ttl;

    fn msg() -> Message {
        Message::new("M1", 1000, 0, Ttl::Infinite, 0.0, HostId(0), HostId(1))
    }

    #[test]
    fn cbr_byte_accounting_reaches_zero() {
        let mut c = Connection::new_cbr(ConnectionId(0), InterfaceId(0), InterfaceId(1), InterfaceId(0), 1000.0, 0.0);
        c.assign(InterfaceId(0), msg());
        assert!(!c.tick_bytes(0.5));
        assert_eq!(c.bytes_remaining(), 500);
        assert!(c.tick_bytes(0.5));
        assert_eq!(c.bytes_remaining(), 0);
        assert!(c.is_message_transferred());
    }

    #[test]
    fn other_interface_panics_on_non_endpoint() {
        let c = Connection::new_cbr(ConnectionId(0), InterfaceId(0), InterfaceId(1), InterfaceId(0), 1000.0, 0.0);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| c.other_interface(InterfaceId(99))));
        assert!(result.is_err());
    }

    #[test]
    fn vbr_speed_matches_gupta_kumar_example() {
        let mut c = Connection::new_vbr(ConnectionId(0), InterfaceId(0), InterfaceId(1), InterfaceId(0), 1000.0, 0.0);
        // §8 scenario 3: n=3, k=2 => floor(1000 / sqrt(3 ln 3) / 2) == 290
        c.recompute_vbr_speed(3, 2);
        assert_eq!(c.speed(), 290.0);
    }

    #[test]
    fn vbr_promotes_lone_transmitter_to_two() {
        let mut c = Connection::new_vbr(ConnectionId(0), InterfaceId(0), InterfaceId(1), InterfaceId(0), 1000.0, 0.0);
        c.recompute_vbr_speed(1, 1);
        let expected = (1000.0 / (2.0f64 * 2f64.ln()).sqrt()).floor();
        assert_eq!(c.speed(), expected);
    }
}
