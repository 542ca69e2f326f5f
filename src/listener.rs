//! §6 exposed boundary: the listener (observer) interface.
//!
//! The teacher pushes UI state across an async channel
//! (`UIRefreshQueueSender`/`UIRefreshState`); the simulation's scheduling
//! model has no suspension points (§5), so here delivery is a plain
//! synchronous trait-object callback — "delivery is synchronous within
//! the tick" (§6) is the literal contract, not an approximation of one.
//! Default no-op bodies mirror the teacher's practice of leaving
//! uninteresting match arms as a no-op (`simulation/network.rs`,
//! `NodeOutputPayload::MessageReceived(_message) => { /* TODO */ }`).

use crate::ids::HostId;
use crate::message::Message;

pub trait Listener {
    fn register_node(&mut self, _host: HostId) {}
    fn new_message(&mut self, _m: &Message) {}
    fn message_transfer_started(&mut self, _from: HostId, _to: HostId, _m: &Message) {}
    fn message_transferred(&mut self, _from: HostId, _to: HostId, _m: &Message, _first_delivery: bool, _final_target: bool) {}
    fn message_transfer_aborted(&mut self, _from: HostId, _to: HostId, _m: &Message) {}
    fn message_transmission_interfered(&mut self, _from: HostId, _to: HostId, _m: &Message) {}
    fn message_deleted(&mut self, _host: HostId, _m: &Message, _dropped: bool, _cause: &str) {}
    fn connection_up(&mut self, _a: crate::ids::InterfaceId, _b: crate::ids::InterfaceId) {}
    fn connection_down(&mut self, _a: crate::ids::InterfaceId, _b: crate::ids::InterfaceId) {}
}

/// One recorded listener call, flattened for assertions in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    RegisterNode(HostId),
    NewMessage(String),
    TransferStarted { from: HostId, to: HostId, msg: String },
    Transferred { from: HostId, to: HostId, msg: String, first_delivery: bool, final_target: bool },
    TransferAborted { from: HostId, to: HostId, msg: String },
    TransmissionInterfered { from: HostId, to: HostId, msg: String },
    Deleted { host: HostId, msg: String, dropped: bool, cause: String },
    ConnectionUp(crate::ids::InterfaceId, crate::ids::InterfaceId),
    ConnectionDown(crate::ids::InterfaceId, crate::ids::InterfaceId),
}

/// An in-memory recorder used by tests and the headless binary's summary
/// output; appends every event in arrival order so emission-order
/// invariants (§5) can be asserted directly.
#[derive(Debug, Default)]
pub struct RecordingListener {
    pub events: Vec<Event>,
}

impl Listener for RecordingListener {
    fn register_node(&mut self, host: HostId) {
        self.events.push(Event::RegisterNode(host));
    }
    fn new_message(&mut self, m: &Message) {
        self.events.push(Event::NewMessage(m.id().to_string()));
    }
    fn message_transfer_started(&mut self, from: HostId, to: HostId, m: &Message) {
        self.events.push(Event::TransferStarted { from, to, msg: m.id().to_string() });
    }
    fn message_transferred(&mut self, from: HostId, to: HostId, m: &Message, first_delivery: bool, final_target: bool) {
        self.events.push(Event::Transferred {
            from,
            to,
            msg: m.id().to_string(),
            first_delivery,
            final_target,
        });
    }
    fn message_transfer_aborted(&mut self, from: HostId, to: HostId, m: &Message) {
        self.events.push(Event::TransferAborted { from, to, msg: m.id().to_string() });
    }
    fn message_transmission_interfered(&mut self, from: HostId, to: HostId, m: &Message) {
        self.events.push(Event::TransmissionInterfered { from, to, msg: m.id().to_string() });
    }
    fn message_deleted(&mut self, host: HostId, m: &Message, dropped: bool, cause: &str) {
        self.events.push(Event::Deleted {
            host,
            msg: m.id().to_string(),
            dropped,
            cause: cause.to_string(),
        });
    }
    fn connection_up(&mut self, a: crate::ids::InterfaceId, b: crate::ids::InterfaceId) {
        self.events.push(Event::ConnectionUp(a, b));
    }
    fn connection_down(&mut self, a: crate::ids::InterfaceId, b: crate::ids::InterfaceId) {
        self.events.push(Event::ConnectionDown(a, b));
    }
}
