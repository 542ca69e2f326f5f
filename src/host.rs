//! C11: Host — composes (C4..C10) plus a movement source and presents
//! the single `update()` the driver calls once per tick per host.

use std::collections::VecDeque;

use crate::cache::Cache;
use crate::geometry::Coord;
use crate::ids::{HostId, InterfaceId};
use crate::movement::MovementSource;
use crate::router::Router;
use crate::simulation::Simulation;
use crate::strategy::CachingPriorityStrategy;

pub struct Host {
    pub id: HostId,
    pub coord: Coord,
    pub active: bool,
    pub interfaces: Vec<InterfaceId>,
    pub cache: Cache,
    pub router: Router,
    pub caching_strategy: CachingPriorityStrategy,
    movement: Box<dyn MovementSource>,
    pending_legs: VecDeque<(Coord, f64)>,
}

impl Host {
    pub fn new(id: HostId, coord: Coord, cache_capacity: usize, router: Router, caching_strategy: CachingPriorityStrategy, movement: Box<dyn MovementSource>) -> Self {
        Host {
            id,
            coord,
            active: true,
            interfaces: Vec::new(),
            cache: Cache::new(id, cache_capacity),
            router,
            caching_strategy,
            movement,
            pending_legs: VecDeque::new(),
        }
    }

    pub fn router_caching_strategy(&self) -> CachingPriorityStrategy {
        self.caching_strategy.clone()
    }

    /// Consumes up to `dt` seconds of movement budget, walking through
    /// however many queued legs fit; a leg with `speed == 0.0` is an
    /// instantaneous teleport (used by `Stationary`'s single emission).
    fn advance(&mut self, now: f64, mut dt: f64) {
        self.active = self.movement.is_active(now);
        while dt > 0.0 {
            if self.pending_legs.is_empty() {
                let legs = self.movement.next_path(now);
                if legs.is_empty() {
                    break;
                }
                self.pending_legs.extend(legs);
            }
            let Some((target, speed)) = self.pending_legs.front().copied() else { break };
            if speed <= 0.0 {
                self.coord = target;
                self.pending_legs.pop_front();
                continue;
            }
            let remaining = self.coord.distance(&target);
            if remaining <= f64::EPSILON {
                self.pending_legs.pop_front();
                continue;
            }
            let travel_time = remaining / speed;
            if travel_time <= dt {
                self.coord = target;
                dt -= travel_time;
                self.pending_legs.pop_front();
            } else {
                let frac = (speed * dt) / remaining;
                self.coord = Coord::new(self.coord.x + (target.x - self.coord.x) * frac, self.coord.y + (target.y - self.coord.y) * frac);
                dt = 0.0;
            }
        }
    }
}

impl Simulation {
    pub(crate) fn host_coord(&self, host_id: HostId) -> Coord {
        self.hosts[host_id.index()].coord
    }

    /// §2 data-flow: move, then let every interface run its five-step
    /// tick, then drive the router's forwarding pass and TTL sweep.
    pub fn host_tick(&mut self, host_id: HostId, dt: f64) {
        let now = self.now();
        self.hosts[host_id.index()].advance(now, dt);

        let iface_ids = self.hosts[host_id.index()].interfaces.clone();
        for iface_id in &iface_ids {
            self.interface_tick(*iface_id, dt);
        }

        if !self.hosts[host_id.index()].active {
            for iface_id in &iface_ids {
                let con_ids = self.interface_connection_ids(*iface_id);
                for con_id in con_ids {
                    self.abort_connection_transfer(con_id, "host inactive");
                }
            }
        }

        self.router_tick(host_id, dt);
        self.router_ttl_sweep(host_id, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::Stationary;
    use crate::router::RouterKind;
    use crate::strategy::manager::{ForwardingOrderManager, ForwardingOrderManagerKind};
    use crate::strategy::PriorityStrategy;

    fn test_host() -> Host {
        let router = Router::new(RouterKind::Epidemic, PriorityStrategy::Fifo, ForwardingOrderManager::new(ForwardingOrderManagerKind::Unchanged, 1));
        Host::new(HostId(0), Coord::new(0.0, 0.0), 10_000, router, PriorityStrategy::Fifo, Box::new(Stationary::new(Coord::new(0.0, 0.0))))
    }

    #[test]
    fn stationary_host_does_not_move() {
        let mut h = test_host();
        h.advance(0.0, 1.0);
        assert_eq!(h.coord.x, 0.0);
        h.advance(1.0, 1.0);
        assert_eq!(h.coord.x, 0.0);
    }

    #[test]
    fn host_walks_a_waypoint_leg_partway() {
        let mut h = test_host();
        h.pending_legs.push_back((Coord::new(10.0, 0.0), 2.0));
        h.advance(0.0, 1.0);
        assert!((h.coord.x - 2.0).abs() < 1e-9);
        assert_eq!(h.pending_legs.len(), 1);
    }

    #[test]
    fn host_completes_a_leg_and_carries_remaining_time() {
        let mut h = test_host();
        h.pending_legs.push_back((Coord::new(2.0, 0.0), 2.0));
        h.advance(0.0, 5.0);
        assert_eq!(h.coord.x, 2.0);
        assert!(h.pending_legs.is_empty());
    }
}
