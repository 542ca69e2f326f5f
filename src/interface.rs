//! C4: the per-host radio interface — connection lifecycle and the
//! normative five-step per-tick update order (§4.3).
//!
//! Per §9's "replace deep inheritance" note, `SimpleBroadcastInterface`
//! and `InterferenceLimitedInterface` collapse into one struct carrying
//! an `InterfaceKind` tag plus the shared bookkeeping (range, speed,
//! connection set, interference model) both variants need.

use crate::connection::{Connection, UnicastResult};
use crate::error::invariant_fail;
use crate::geometry::Coord;
use crate::ids::{ConnectionId, HostId, InterfaceId};
use crate::interference::InterferenceModel;
use crate::message::Message;
use crate::simulation::Simulation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    /// One transmission at a time; opening a second connection while
    /// already sending duplicates the in-flight transfer onto it.
    SimpleBroadcast,
    /// Many concurrent transmissions; speed is shared per Gupta-Kumar.
    InterferenceLimited,
}

pub struct Interface {
    pub id: InterfaceId,
    pub host: HostId,
    pub kind: InterfaceKind,
    pub transmit_range: f64,
    pub transmit_speed: f64,
    pub scanning: bool,
    pub connections: Vec<ConnectionId>,
    interference: Box<dyn InterferenceModel>,
}

impl Interface {
    pub fn new(id: InterfaceId, host: HostId, kind: InterfaceKind, transmit_range: f64, transmit_speed: f64, interference: Box<dyn InterferenceModel>) -> Self {
        Interface {
            id,
            host,
            kind,
            transmit_range,
            transmit_speed,
            scanning: true,
            connections: Vec::new(),
            interference,
        }
    }

    pub fn interference(&self) -> &dyn InterferenceModel {
        self.interference.as_ref()
    }

    pub fn interference_mut(&mut self) -> &mut dyn InterferenceModel {
        self.interference.as_mut()
    }

    pub fn within_range(&self, my_coord: Coord, peer_coord: Coord) -> bool {
        my_coord.distance2(&peer_coord) <= self.transmit_range * self.transmit_range
    }

    fn is_connected_to(&self, peer: InterfaceId, connections: &[Connection]) -> bool {
        self.connections
            .iter()
            .filter_map(|id| connections.get(id.index()))
            .any(|c| c.other_interface(self.id) == peer)
    }
}

impl Simulation {
    pub(crate) fn interface_connection_ids(&self, iface_id: InterfaceId) -> Vec<ConnectionId> {
        self.interfaces[iface_id.index()].connections.clone()
    }

    pub(crate) fn is_sending(&self, iface_id: InterfaceId) -> bool {
        let iface = &self.interfaces[iface_id.index()];
        iface
            .connections
            .iter()
            .filter_map(|id| self.connections.get(id.index()))
            .any(|c| c.sender() == Some(iface_id) && c.is_sending())
    }

    /// `isReadyToBeginTransfer` (§4.3): a `SimpleBroadcast` interface
    /// already sending on any of its connections cannot start another;
    /// an `InterferenceLimited` one always can (collisions are handled
    /// by the interference model, not gated here).
    pub(crate) fn is_ready_to_begin_transfer(&self, iface_id: InterfaceId) -> bool {
        match self.interfaces[iface_id.index()].kind {
            InterfaceKind::SimpleBroadcast => !self.is_sending(iface_id),
            InterfaceKind::InterferenceLimited => true,
        }
    }

    /// §4.3 step order for one interface's tick: drop out-of-range peers,
    /// discover and connect to new ones, (VBR only) recompute shared
    /// speed, then advance every live connection's byte transfer.
    ///
    /// A connection is listed by both its endpoints, and both endpoints'
    /// interfaces tick within the same global tick — ticking byte transfer
    /// from both sides would drain `speed·dt` twice per tick. Each
    /// connection therefore only advances its bytes when this is its
    /// `owner` interface (§4.2); the other endpoint observes the result
    /// next time it reads the connection, same as any other peer state.
    pub fn interface_tick(&mut self, iface_id: InterfaceId, dt: f64) {
        let coord = self.host_coord(self.interfaces[iface_id.index()].host);
        self.geometry.update_location(iface_id, coord);

        self.drop_out_of_range(iface_id, coord);
        self.discover_and_connect(iface_id, coord);
        self.recompute_vbr_speeds(iface_id);

        let con_ids = self.interfaces[iface_id.index()].connections.clone();
        for con_id in con_ids {
            if self.connections[con_id.index()].owner == iface_id {
                self.update_connection(con_id, dt);
            }
        }
    }

    fn drop_out_of_range(&mut self, iface_id: InterfaceId, coord: Coord) {
        let range = self.interfaces[iface_id.index()].transmit_range;
        let to_drop: Vec<ConnectionId> = self.interfaces[iface_id.index()]
            .connections
            .iter()
            .copied()
            .filter(|con_id| {
                let Some(con) = self.connections.get(con_id.index()) else { return false };
                if !con.is_up() {
                    return false;
                }
                let peer = con.other_interface(iface_id);
                let peer_host = self.interfaces[peer.index()].host;
                let peer_coord = self.host_coord(peer_host);
                let peer_range = self.interfaces[peer.index()].transmit_range;
                let max_range = range.max(peer_range);
                coord.distance2(&peer_coord) > max_range * max_range || !self.hosts[peer_host.index()].active
            })
            .collect();
        for con_id in to_drop {
            self.abort_connection_transfer(con_id, "out-of-range");
            self.teardown_connection(con_id);
        }
    }

    fn teardown_connection(&mut self, con_id: ConnectionId) {
        let (a, b) = {
            let con = &mut self.connections[con_id.index()];
            con.set_up(false);
            (con.a, con.b)
        };
        for iface in [a, b] {
            self.interfaces[iface.index()].connections.retain(|id| *id != con_id);
        }
        self.notify_connection_down(a, b);
    }

    fn discover_and_connect(&mut self, iface_id: InterfaceId, coord: Coord) {
        if !self.interfaces[iface_id.index()].scanning {
            return;
        }
        let nearby = self.geometry.get_near_interfaces(iface_id);
        for peer in nearby {
            if peer == iface_id {
                continue;
            }
            self.try_connect(iface_id, peer, coord);
        }
    }

    /// `connect(peer)` (§4.3). Opens a connection iff both sides are
    /// scanning-eligible, in range, active, and not already linked. If
    /// this interface is a `SimpleBroadcast` already mid-send, the
    /// in-flight transfer is duplicated onto the new connection rather
    /// than abandoned (bytesRemaining reset — see DESIGN.md).
    fn try_connect(&mut self, iface_id: InterfaceId, peer: InterfaceId, coord: Coord) {
        let host_id = self.interfaces[iface_id.index()].host;
        let peer_host = self.interfaces[peer.index()].host;
        if !self.hosts[host_id.index()].active || !self.hosts[peer_host.index()].active {
            return;
        }
        if self.interfaces[iface_id.index()].is_connected_to(peer, &self.connections) {
            return;
        }
        let peer_coord = self.host_coord(peer_host);
        if !self.interfaces[iface_id.index()].within_range(coord, peer_coord) {
            return;
        }

        let kind = self.interfaces[iface_id.index()].kind;
        let speed = self.interfaces[iface_id.index()].transmit_speed.min(self.interfaces[peer.index()].transmit_speed);
        let now = self.now();
        let con_id = ConnectionId(self.connections.len() as u32);
        let con = match kind {
            InterfaceKind::SimpleBroadcast => Connection::new_cbr(con_id, iface_id, peer, iface_id, speed, now),
            InterfaceKind::InterferenceLimited => Connection::new_vbr(con_id, iface_id, peer, iface_id, speed, now),
        };
        self.connections.push(con);
        self.interfaces[iface_id.index()].connections.push(con_id);
        self.interfaces[peer.index()].connections.push(con_id);
        self.notify_connection_up(iface_id, peer);

        if matches!(kind, InterfaceKind::SimpleBroadcast) {
            if let Some(existing) = self.currently_sending_message(iface_id, con_id) {
                self.start_transfer(con_id, iface_id, existing);
            }
        }
    }

    fn currently_sending_message(&self, iface_id: InterfaceId, exclude: ConnectionId) -> Option<Message> {
        self.interfaces[iface_id.index()]
            .connections
            .iter()
            .filter(|id| **id != exclude)
            .filter_map(|id| self.connections.get(id.index()))
            .find(|c| c.sender() == Some(iface_id) && c.is_sending())
            .and_then(|c| c.message().cloned())
    }

    fn recompute_vbr_speeds(&mut self, iface_id: InterfaceId) {
        if self.interfaces[iface_id.index()].kind != InterfaceKind::InterferenceLimited {
            return;
        }
        let con_ids = self.interfaces[iface_id.index()].connections.clone();
        // "active transmitters" = distinct peers currently sending *to* this
        // interface, not this interface's own outgoing sends.
        let active_transmitters = con_ids
            .iter()
            .filter_map(|id| self.connections.get(id.index()))
            .filter(|c| c.is_sending() && c.sender() != Some(iface_id))
            .count() as u32;
        for con_id in con_ids {
            let receiving = self.connections[con_id.index()].is_sending() && self.connections[con_id.index()].sender() != Some(iface_id);
            if receiving {
                self.connections[con_id.index()].recompute_vbr_speed(active_transmitters, active_transmitters.max(1));
            }
        }
    }

    /// `sendUnicastMessageViaConnection` (§4.3).
    pub fn send_unicast_message_via_connection(&mut self, iface_id: InterfaceId, con_id: ConnectionId, m: Message) -> UnicastResult {
        if !self.is_ready_to_begin_transfer(iface_id) {
            return UnicastResult::Denied;
        }
        match self.start_transfer(con_id, iface_id, m) {
            crate::router::RcvResult::RcvOk | crate::router::RcvResult::DeniedInterference => UnicastResult::Ok,
            _ => UnicastResult::Failed,
        }
    }

    /// `sendBroadcastMessage` (§4.3): fans out to every live connection;
    /// any unexpected denial is an invariant violation since readiness
    /// was already checked.
    pub fn send_broadcast_message(&mut self, iface_id: InterfaceId, m: Message) -> UnicastResult {
        if !self.is_ready_to_begin_transfer(iface_id) {
            return UnicastResult::Denied;
        }
        let con_ids = self.interfaces[iface_id.index()].connections.clone();
        for con_id in con_ids {
            if !self.connections[con_id.index()].is_up() {
                continue;
            }
            let result = self.send_unicast_message_via_connection(iface_id, con_id, m.clone());
            if matches!(result, UnicastResult::Denied) {
                invariant_fail("sendBroadcastMessage: connection denied after readiness check passed");
            }
        }
        UnicastResult::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_range_uses_squared_distance() {
        let iface = Interface::new(
            InterfaceId(0),
            HostId(0),
            InterfaceKind::SimpleBroadcast,
            10.0,
            1000.0,
            Box::new(crate::interference::NoInterference::default()),
        );
        assert!(iface.within_range(Coord::new(0.0, 0.0), Coord::new(5.0, 0.0)));
        assert!(!iface.within_range(Coord::new(0.0, 0.0), Coord::new(20.0, 0.0)));
    }

    #[test]
    fn boundary_range_is_inclusive() {
        let iface = Interface::new(
            InterfaceId(0),
            HostId(0),
            InterfaceKind::SimpleBroadcast,
            10.0,
            1000.0,
            Box::new(crate::interference::NoInterference::default()),
        );
        assert!(iface.within_range(Coord::new(0.0, 0.0), Coord::new(10.0, 0.0)));
    }
}
