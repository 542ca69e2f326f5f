//! Core of a delay-tolerant-network simulator: a discrete-event engine
//! modeling mobile wireless hosts exchanging store-carry-forward
//! messages over intermittently connected radio links.
//!
//! The three coupled subsystems (contact & transfer, cache & forwarding,
//! router state machine) are laid out one module per component, in
//! dependency order — see each module's own doc comment for which part
//! of the design it implements.

pub mod cache;
pub mod clock;
pub mod config;
pub mod connection;
pub mod error;
pub mod event;
pub mod geometry;
pub mod host;
pub mod ids;
pub mod interface;
pub mod interference;
pub mod listener;
pub mod message;
pub mod movement;
pub mod router;
pub mod simulation;
pub mod strategy;

pub use cache::{AdmitResult, Cache};
pub use clock::SimClock;
pub use connection::{Connection, ConnectionKind, UnicastResult};
pub use error::{ConfigError, InvariantError};
pub use host::Host;
pub use ids::{ConnectionId, HostId, InterfaceId};
pub use interface::{Interface, InterfaceKind};
pub use interference::{AlwaysPossible, InterferenceModel, NoInterference, ReceptionOutcome, TransferStatus};
pub use listener::{Event, Listener, RecordingListener};
pub use message::{FragmentRange, Message, Ttl};
pub use router::{RcvResult, Router, RouterKind};
pub use simulation::Simulation;
pub use strategy::{manager::ForwardingOrderManager, CachingPriorityStrategy, ForwardingOrderStrategy, PriorityStrategy};
