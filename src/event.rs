//! §6 consumed boundary: `EventGenerator` produces scenario events
//! (message creation, host activation) with monotonic timestamps. The
//! concrete scenario-file-driven generator is part of the out-of-scope
//! CLI/batch harness; this module supplies the trait plus one concrete
//! "message every N seconds" generator used by the headless binary and
//! the integration tests.

use crate::ids::HostId;
use crate::message::Ttl;

#[derive(Debug, Clone)]
pub enum ScenarioEvent {
    MessageCreate {
        id: String,
        from: HostId,
        to: HostId,
        size: usize,
        priority: i32,
        ttl: Ttl,
    },
    HostActivation {
        host: HostId,
        active: bool,
    },
}

pub trait EventGenerator {
    /// Returns the next event at or after `now`, or `None` if exhausted.
    /// Successive calls must return non-decreasing timestamps; the event's
    /// own timestamp is the caller's responsibility to track (events here
    /// are emitted for "now", not scheduled for the future).
    fn next_event(&mut self, now: f64) -> Option<ScenarioEvent>;
}

/// An `EventGenerator` that never produces an event — for runs driven
/// entirely by messages already admitted before the clock starts.
#[derive(Default)]
pub struct NoopEventGenerator;

impl EventGenerator for NoopEventGenerator {
    fn next_event(&mut self, _now: f64) -> Option<ScenarioEvent> {
        None
    }
}

/// Emits a `MessageCreate` from `from` to `to` every `interval` seconds,
/// starting at `interval`, stopping after `count` messages.
pub struct IntervalEventGenerator {
    from: HostId,
    to: HostId,
    interval: f64,
    size: usize,
    priority: i32,
    ttl: Ttl,
    next_due: f64,
    remaining: u32,
    prefix: String,
    emitted: u32,
}

impl IntervalEventGenerator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(prefix: impl Into<String>, from: HostId, to: HostId, interval: f64, size: usize, priority: i32, ttl: Ttl, count: u32) -> Self {
        IntervalEventGenerator {
            from,
            to,
            interval,
            size,
            priority,
            ttl,
            next_due: interval,
            remaining: count,
            prefix: prefix.into(),
            emitted: 0,
        }
    }
}

impl EventGenerator for IntervalEventGenerator {
    fn next_event(&mut self, now: f64) -> Option<ScenarioEvent> {
        if self.remaining == 0 || now < self.next_due {
            return None;
        }
        self.emitted += 1;
        self.remaining -= 1;
        let id = format!("{}{}", self.prefix, self.emitted);
        self.next_due += self.interval;
        Some(ScenarioEvent::MessageCreate {
            id,
            from: self.from,
            to: self.to,
            size: self.size,
            priority: self.priority,
            ttl: self.ttl,
        })
    }
}
