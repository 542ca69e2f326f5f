//! C5: the interference model.
//!
//! Decides whether concurrent receptions at one interface succeed.
//! Polymorphic over two variants (§4.4): `NoInterference` (every
//! reception proceeds independently; only a self-transmitting interface
//! denies) and `AlwaysPossible` (any temporal overlap between receptions
//! at the same interface interferes with all of them).
//!
//! Replaces the teacher's `instanceof`-style strategy dispatch (design
//! note §9) with a small `InterferenceModel` trait plus two concrete,
//! zero-sized-state variants sharing one reception table.

use std::collections::HashMap;

use crate::error::invariant_fail;
use crate::ids::{ConnectionId, InterfaceId};
use crate::message::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceptionOutcome {
    Ok,
    DeniedDueToSend,
    Interfered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    CompletedCorrectly,
    Incomplete,
    MessageIdNotFound,
}

#[derive(Debug, Clone)]
struct Reception {
    message: Message,
    connection: ConnectionId,
    #[allow(dead_code)]
    in_sync: bool,
    interfered: bool,
}

/// Keyed by `(message id, sender interface)` per §4.4's invariant: at most
/// one active reception per `(msgId, senderAddress)` pair.
#[derive(Default)]
struct ReceptionTable {
    active: HashMap<(String, InterfaceId), Reception>,
}

impl ReceptionTable {
    fn insert(&mut self, sender: InterfaceId, con: ConnectionId, m: Message, interfered: bool) {
        let key = (m.id().to_string(), sender);
        self.active.insert(
            key,
            Reception {
                message: m,
                connection: con,
                in_sync: true,
                interfered,
            },
        );
    }

    fn status(&self, msg_id: &str, sender: InterfaceId) -> TransferStatus {
        match self.active.get(&(msg_id.to_string(), sender)) {
            None => TransferStatus::MessageIdNotFound,
            Some(r) if r.interfered => TransferStatus::Incomplete,
            Some(_) => TransferStatus::CompletedCorrectly,
        }
    }

    fn force_interference(&mut self, msg_id: &str, sender: InterfaceId) -> Option<Message> {
        let r = self.active.get_mut(&(msg_id.to_string(), sender))?;
        r.interfered = true;
        Some(r.message.clone())
    }

    fn retrieve(&mut self, msg_id: &str, sender: InterfaceId) -> Message {
        match self.active.remove(&(msg_id.to_string(), sender)) {
            Some(r) if !r.interfered => r.message,
            Some(_) => invariant_fail(format!("retrieve_transferred_message called on interfered reception {msg_id}")),
            None => invariant_fail(format!("retrieve_transferred_message: unknown reception {msg_id} from {sender}")),
        }
    }

    fn abort(&mut self, msg_id: &str, sender: InterfaceId) -> Option<Message> {
        self.active.remove(&(msg_id.to_string(), sender)).map(|r| r.message)
    }

    /// All receptions currently active at this interface, from any sender,
    /// on a different connection than `exclude` (used to detect overlap).
    fn others(&self, exclude: ConnectionId) -> impl Iterator<Item = &(String, InterfaceId)> {
        self.active.iter().filter(move |(_, r)| r.connection != exclude).map(|(k, _)| k)
    }
}

pub trait InterferenceModel {
    fn begin_new_reception(&mut self, sender: InterfaceId, con: ConnectionId, m: Message, receiver_is_sending: bool) -> ReceptionOutcome;
    fn is_message_transferred_correctly(&self, msg_id: &str, sender: InterfaceId) -> TransferStatus;
    fn force_interference(&mut self, msg_id: &str, sender: InterfaceId) -> Option<Message>;
    /// Removes and returns the message iff the reception completed without
    /// interference. Fails with an invariant violation if the id is
    /// unknown or the reception is still marked interfered, since callers
    /// are expected to check `is_message_transferred_correctly` first.
    fn retrieve_transferred_message(&mut self, msg_id: &str, sender: InterfaceId) -> Message;
    fn abort_message_reception(&mut self, msg_id: &str, sender: InterfaceId) -> Option<Message>;
}

/// Every reception at an interface proceeds independently of every other;
/// the only denial is the interface itself currently transmitting.
#[derive(Default)]
pub struct NoInterference {
    table: ReceptionTable,
}

impl InterferenceModel for NoInterference {
    fn begin_new_reception(&mut self, sender: InterfaceId, con: ConnectionId, m: Message, receiver_is_sending: bool) -> ReceptionOutcome {
        if receiver_is_sending {
            return ReceptionOutcome::DeniedDueToSend;
        }
        self.table.insert(sender, con, m, false);
        ReceptionOutcome::Ok
    }

    fn is_message_transferred_correctly(&self, msg_id: &str, sender: InterfaceId) -> TransferStatus {
        self.table.status(msg_id, sender)
    }

    fn force_interference(&mut self, msg_id: &str, sender: InterfaceId) -> Option<Message> {
        self.table.force_interference(msg_id, sender)
    }

    fn retrieve_transferred_message(&mut self, msg_id: &str, sender: InterfaceId) -> Message {
        self.table.retrieve(msg_id, sender)
    }

    fn abort_message_reception(&mut self, msg_id: &str, sender: InterfaceId) -> Option<Message> {
        self.table.abort(msg_id, sender)
    }
}

/// Any temporal overlap between two receptions at the same interface
/// interferes with both: starting a second reception while a first is
/// still active marks every active reception (old and new) as interfered.
/// `interfered` never clears itself (monotonic, §3) — the reception is
/// only ever removed via abort or (unsuccessful) retrieval.
#[derive(Default)]
pub struct AlwaysPossible {
    table: ReceptionTable,
}

impl InterferenceModel for AlwaysPossible {
    fn begin_new_reception(&mut self, sender: InterfaceId, con: ConnectionId, m: Message, receiver_is_sending: bool) -> ReceptionOutcome {
        if receiver_is_sending {
            return ReceptionOutcome::DeniedDueToSend;
        }
        let overlapping: Vec<(String, InterfaceId)> = self.table.others(con).map(|(id, s)| (id.clone(), *s)).collect();
        let interfered = !overlapping.is_empty();
        for (id, s) in overlapping {
            self.table.force_interference(&id, s);
        }
        self.table.insert(sender, con, m, interfered);
        if interfered { ReceptionOutcome::Interfered } else { ReceptionOutcome::Ok }
    }

    fn is_message_transferred_correctly(&self, msg_id: &str, sender: InterfaceId) -> TransferStatus {
        self.table.status(msg_id, sender)
    }

    fn force_interference(&mut self, msg_id: &str, sender: InterfaceId) -> Option<Message> {
        self.table.force_interference(msg_id, sender)
    }

    fn retrieve_transferred_message(&mut self, msg_id: &str, sender: InterfaceId) -> Message {
        self.table.retrieve(msg_id, sender)
    }

    fn abort_message_reception(&mut self, msg_id: &str, sender: InterfaceId) -> Option<Message> {
        self.table.abort(msg_id, sender)
    }
}
