//! The simulation context: owns every arena (hosts, interfaces,
//! connections), the shared geometry optimizer, the registered listeners,
//! and the clock. Per design note §9 ("replace cyclic references...
//! with an arena" and "replace static-initialized singleton PRNGs... with
//! an explicit context object"), this is the one place that owns mutable
//! shared state; every other module contributes `impl Simulation` blocks
//! operating on borrows into these vectors rather than holding their own
//! `Rc<RefCell<_>>` back-references.

use rand::rngs::StdRng;
use rand::{seq::SliceRandom, Rng, SeedableRng};

use crate::clock::SimClock;
use crate::config::{ForwardingOrderManagerConfig, InterfaceTypeConfig, PriorityStrategyConfig, RouterKindConfig, ScenarioConfig};
use crate::connection::Connection;
use crate::event::{EventGenerator, ScenarioEvent};
use crate::geometry::{Coord, GeometryOptimizer, GridOptimizer};
use crate::host::Host;
use crate::ids::{HostId, InterfaceId};
use crate::interface::{Interface, InterfaceKind};
use crate::interference::{AlwaysPossible, InterferenceModel, NoInterference};
use crate::listener::Listener;
use crate::message::Message;
use crate::movement::Stationary;
use crate::router::{Router, RouterKind};
use crate::strategy::manager::{ForwardingOrderManager, ForwardingOrderManagerKind};
use crate::strategy::PriorityStrategy;

/// Spray-and-Wait's initial copy budget (§4.9.1) isn't part of the
/// scenario config surface (§6); the teacher's own default scenarios use
/// a small fixed budget rather than exposing it per-group, so
/// `from_config` does the same (see DESIGN.md).
const DEFAULT_SPRAY_AND_WAIT_COPIES: u32 = 6;

fn map_priority_strategy(cfg: Option<PriorityStrategyConfig>, seed: u64) -> PriorityStrategy {
    match cfg {
        Some(PriorityStrategyConfig::Random) => PriorityStrategy::Random { seed },
        Some(PriorityStrategyConfig::PrioritizedFifo) => PriorityStrategy::PrioritizedFifo,
        Some(PriorityStrategyConfig::PrioritizedLffFifo) => PriorityStrategy::PrioritizedLffFifo,
        Some(PriorityStrategyConfig::Fifo) | None => PriorityStrategy::Fifo,
    }
}

fn map_manager_kind(cfg: Option<ForwardingOrderManagerConfig>) -> ForwardingOrderManagerKind {
    match cfg {
        Some(ForwardingOrderManagerConfig::ExponentiallyDecaying) => ForwardingOrderManagerKind::ExponentiallyDecaying,
        Some(ForwardingOrderManagerConfig::Unchanged) | None => ForwardingOrderManagerKind::Unchanged,
    }
}

fn map_router_kind(cfg: RouterKindConfig) -> RouterKind {
    match cfg {
        RouterKindConfig::Epidemic => RouterKind::Epidemic,
        RouterKindConfig::SprayAndWait => RouterKind::SprayAndWait { initial_copies: DEFAULT_SPRAY_AND_WAIT_COPIES },
        RouterKindConfig::Passive => RouterKind::Passive,
    }
}

pub struct Simulation {
    pub(crate) clock: SimClock,
    pub(crate) hosts: Vec<Host>,
    pub(crate) interfaces: Vec<Interface>,
    pub(crate) connections: Vec<Connection>,
    pub(crate) geometry: Box<dyn GeometryOptimizer>,
    listeners: Vec<Box<dyn Listener>>,
    /// §5: "hosts are updated in an order drawn once per tick from a
    /// seeded PRNG (randomized order configurable)".
    order_rng: Option<StdRng>,
}

impl Simulation {
    pub fn new(geometry: Box<dyn GeometryOptimizer>) -> Self {
        Simulation {
            clock: SimClock::new(),
            hosts: Vec::new(),
            interfaces: Vec::new(),
            connections: Vec::new(),
            geometry,
            listeners: Vec::new(),
            order_rng: None,
        }
    }

    /// Builds a `Simulation` from a loaded scenario (§6): a `GridOptimizer`
    /// sized from the widest declared transmit range, one host per
    /// `nrof_hosts` in each group scattered uniformly across that group's
    /// `world_size` (movement itself is a consumed black box — §6 — so
    /// hosts start `Stationary` at their drawn position), and one
    /// `Interface` per `InterfaceConfig` entry.
    pub fn from_config(cfg: &ScenarioConfig) -> Simulation {
        let max_range = cfg.groups.iter().flat_map(|g| g.interfaces.iter()).map(|i| i.transmit_range).fold(1.0, f64::max);
        let cell_size = max_range * cfg.optimization.as_ref().map(|o| o.cell_size_mult).unwrap_or(1.0);
        let mut sim = Simulation::new(Box::new(GridOptimizer::new(cell_size)));

        if cfg.optimization.as_ref().map(|o| o.randomize_update_order).unwrap_or(false) {
            let seed = cfg.groups.first().map(|g| g.movement_model.rng_seed).unwrap_or(0);
            sim.randomize_update_order(seed);
        }

        for group in &cfg.groups {
            let mut placement_rng = StdRng::seed_from_u64(group.movement_model.rng_seed);
            let (width, height) = group.movement_model.world_size;
            let caching = map_priority_strategy(group.caching_priority, group.movement_model.rng_seed);
            let forwarding = map_priority_strategy(group.forwarding_order, group.movement_model.rng_seed.wrapping_add(1));
            let manager_kind = map_manager_kind(group.forwarding_order_manager);

            for _ in 0..group.nrof_hosts {
                let coord = Coord::new(placement_rng.gen_range(0.0..width.max(1.0)), placement_rng.gen_range(0.0..height.max(1.0)));
                let router = Router::new(
                    map_router_kind(group.router),
                    forwarding.clone(),
                    ForwardingOrderManager::new(manager_kind, group.movement_model.rng_seed),
                );
                let host_id = HostId(sim.hosts_len() as u32);
                let host = Host::new(host_id, coord, group.buffer_size, router, caching.clone(), Box::new(Stationary::new(coord)));
                let host_id = sim.add_host(host);

                for iface_cfg in &group.interfaces {
                    let kind = match iface_cfg.kind {
                        InterfaceTypeConfig::SimpleBroadcastInterface => InterfaceKind::SimpleBroadcast,
                        InterfaceTypeConfig::InterferenceLimitedInterface => InterfaceKind::InterferenceLimited,
                    };
                    let interference: Box<dyn InterferenceModel> = match kind {
                        InterfaceKind::SimpleBroadcast => Box::new(NoInterference::default()),
                        InterfaceKind::InterferenceLimited => Box::new(AlwaysPossible::default()),
                    };
                    let iface = Interface::new(InterfaceId(0), host_id, kind, iface_cfg.transmit_range, iface_cfg.transmit_speed, interference);
                    sim.add_interface(iface);
                }
            }
        }

        sim
    }

    /// Enables per-tick host update order randomization (§5), seeded for
    /// reproducibility. Without this call, hosts update in registration
    /// (arena) order every tick.
    pub fn randomize_update_order(&mut self, seed: u64) {
        self.order_rng = Some(StdRng::seed_from_u64(seed));
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn register_listener(&mut self, listener: Box<dyn Listener>) {
        self.listeners.push(listener);
    }

    pub fn add_host(&mut self, host: Host) -> HostId {
        let id = host.id;
        self.hosts.push(host);
        for l in &mut self.listeners {
            l.register_node(id);
        }
        id
    }

    pub fn add_interface(&mut self, mut interface: Interface) -> InterfaceId {
        let id = InterfaceId(self.interfaces.len() as u32);
        interface.id = id;
        let host = interface.host;
        self.interfaces.push(interface);
        self.hosts[host.index()].interfaces.push(id);
        id
    }

    pub(crate) fn host_of(&self, iface: InterfaceId) -> HostId {
        self.interfaces[iface.index()].host
    }

    pub fn host(&self, id: HostId) -> &Host {
        &self.hosts[id.index()]
    }

    pub fn hosts_len(&self) -> usize {
        self.hosts.len()
    }

    /// Injects a freshly created message at its origin host's cache and
    /// announces it, per an `EventGenerator::MessageCreate` event.
    pub fn create_message(&mut self, m: Message) {
        let from = m.from();
        let strategy = self.hosts[from.index()].router_caching_strategy();
        let _ = self.hosts[from.index()].cache.admit(m.clone(), &strategy);
        self.notify_new_message(&m);
    }

    pub fn set_host_active(&mut self, host: HostId, active: bool) {
        self.hosts[host.index()].active = active;
    }

    /// Pulls every due event from `generator` at `now` and applies it.
    pub fn drain_events(&mut self, generator: &mut dyn EventGenerator) {
        let now = self.now();
        while let Some(event) = generator.next_event(now) {
            match event {
                ScenarioEvent::MessageCreate { id, from, to, size, priority, ttl } => {
                    let m = Message::new(id, size, priority, ttl, now, from, to);
                    self.create_message(m);
                }
                ScenarioEvent::HostActivation { host, active } => {
                    self.set_host_active(host, active);
                }
            }
        }
    }

    /// Advances the whole simulation by one `dt`-second tick: drains due
    /// scenario events, then updates every host in this tick's order.
    pub fn tick(&mut self, dt: f64, generator: &mut dyn EventGenerator) {
        self.drain_events(generator);

        let mut order: Vec<HostId> = (0..self.hosts.len()).map(|i| HostId(i as u32)).collect();
        if let Some(rng) = self.order_rng.as_mut() {
            order.shuffle(rng);
        }
        for host_id in order {
            self.host_tick(host_id, dt);
        }
        self.clock.advance(dt);
    }

    /// Runs ticks of `dt` seconds until `end_time` is reached or exceeded.
    pub fn run_until(&mut self, end_time: f64, dt: f64, generator: &mut dyn EventGenerator) {
        while self.now() < end_time {
            self.tick(dt, generator);
        }
    }

    pub(crate) fn notify_new_message(&mut self, m: &Message) {
        for l in &mut self.listeners {
            l.new_message(m);
        }
    }

    pub(crate) fn notify_transfer_started(&mut self, from: HostId, to: HostId, m: &Message) {
        for l in &mut self.listeners {
            l.message_transfer_started(from, to, m);
        }
    }

    pub(crate) fn notify_transferred(&mut self, from: HostId, to: HostId, m: &Message, first_delivery: bool, final_target: bool) {
        for l in &mut self.listeners {
            l.message_transferred(from, to, m, first_delivery, final_target);
        }
    }

    pub(crate) fn notify_transfer_aborted(&mut self, from: HostId, to: HostId, m: &Message) {
        for l in &mut self.listeners {
            l.message_transfer_aborted(from, to, m);
        }
    }

    pub(crate) fn notify_transmission_interfered(&mut self, from: HostId, to: HostId, m: &Message) {
        for l in &mut self.listeners {
            l.message_transmission_interfered(from, to, m);
        }
    }

    pub(crate) fn notify_message_deleted(&mut self, host: HostId, m: &Message, dropped: bool, cause: &str) {
        for l in &mut self.listeners {
            l.message_deleted(host, m, dropped, cause);
        }
    }

    pub(crate) fn notify_connection_up(&mut self, a: InterfaceId, b: InterfaceId) {
        for l in &mut self.listeners {
            l.connection_up(a, b);
        }
    }

    pub(crate) fn notify_connection_down(&mut self, a: InterfaceId, b: InterfaceId) {
        for l in &mut self.listeners {
            l.connection_down(a, b);
        }
    }
}
