//! §6 consumed boundary: movement models are a black box emitting host
//! coordinates over time. This module defines the trait boundary plus two
//! small concrete sources so the crate is runnable standalone; anything
//! resembling a real movement-model library (random waypoint, map-based
//! routing, working-day model, ...) is out of scope.

use crate::geometry::Coord;

/// A source of host positions over (simulation) time.
pub trait MovementSource {
    /// Next leg of the path: a sequence of `(coord, speed)` waypoints to
    /// move through. Returning an empty vector means "stay put."
    fn next_path(&mut self, now: f64) -> Vec<(Coord, f64)>;

    /// Whether the host this source drives is active at `now`. Inactive
    /// hosts drop all connections and do not scan for new ones (§4.3).
    fn is_active(&self, now: f64) -> bool {
        let _ = now;
        true
    }
}

/// A host that never moves.
pub struct Stationary {
    coord: Coord,
    emitted: bool,
}

impl Stationary {
    pub fn new(coord: Coord) -> Self {
        Stationary { coord, emitted: false }
    }
}

impl MovementSource for Stationary {
    fn next_path(&mut self, _now: f64) -> Vec<(Coord, f64)> {
        if self.emitted {
            Vec::new()
        } else {
            self.emitted = true;
            vec![(self.coord, 0.0)]
        }
    }
}

/// Cycles through a fixed list of waypoints at a constant speed, looping
/// back to the first once the last is reached. A minimal stand-in for a
/// scenario-driven waypoint model.
pub struct WaypointLoop {
    waypoints: Vec<Coord>,
    speed: f64,
    next_index: usize,
}

impl WaypointLoop {
    pub fn new(waypoints: Vec<Coord>, speed: f64) -> Self {
        assert!(!waypoints.is_empty(), "waypoint list must not be empty");
        WaypointLoop { waypoints, speed, next_index: 0 }
    }
}

impl MovementSource for WaypointLoop {
    fn next_path(&mut self, _now: f64) -> Vec<(Coord, f64)> {
        let coord = self.waypoints[self.next_index];
        self.next_index = (self.next_index + 1) % self.waypoints.len();
        vec![(coord, self.speed)]
    }
}
