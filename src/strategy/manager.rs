//! C9: the forwarding-order manager — a post-processor stacked on top of
//! a (C8) forwarding-order strategy's ordered candidate list.
//!
//! `Unchanged` is the identity. `ExponentiallyDecaying` resamples the
//! list so that rank-1 candidates are offered first with high
//! probability but every candidate has a nonzero chance of heading the
//! list, which keeps low-ranked messages from starving forever (§4.8).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardingOrderManagerKind {
    Unchanged,
    ExponentiallyDecaying,
}

pub struct ForwardingOrderManager {
    kind: ForwardingOrderManagerKind,
    rng: StdRng,
}

impl ForwardingOrderManager {
    pub fn new(kind: ForwardingOrderManagerKind, seed: u64) -> Self {
        ForwardingOrderManager { kind, rng: StdRng::seed_from_u64(seed) }
    }

    /// Applies the manager to an already strategy-ordered list, returning
    /// a permutation of `0..input.len()` giving the order items should be
    /// offered in.
    pub fn apply<T>(&mut self, input: &[T]) -> Vec<usize> {
        match self.kind {
            ForwardingOrderManagerKind::Unchanged => (0..input.len()).collect(),
            ForwardingOrderManagerKind::ExponentiallyDecaying => self.exponentially_decaying(input.len()),
        }
    }

    fn exponentially_decaying(&mut self, n: usize) -> Vec<usize> {
        if n == 0 {
            return Vec::new();
        }
        if n == 1 {
            return vec![0];
        }

        // p_i ∝ (1 - 1/n) * (1/n)^(i-1), i = 1..n, normalized into a
        // cumulative vector with the last entry forced to exactly 1.0.
        let inv_n = 1.0 / n as f64;
        let mut weights: Vec<f64> = (0..n).map(|i| (1.0 - inv_n) * inv_n.powi(i as i32)).collect();
        let total: f64 = weights.iter().sum();
        let mut running = 0.0;
        for w in weights.iter_mut() {
            running += *w / total;
            *w = running;
        }
        *weights.last_mut().unwrap() = 1.0;
        let cum = weights;

        let mut chosen = vec![false; n];
        let mut order = Vec::with_capacity(n);
        for _ in 0..n {
            let u: f64 = self.rng.gen_range(0.0..1.0);
            let mut idx = cum.iter().position(|&c| c >= u).unwrap_or(n - 1);
            if chosen[idx] {
                idx = Self::probe(&chosen, idx);
            }
            chosen[idx] = true;
            order.push(idx);
        }
        order
    }

    /// Linearly probes left from `start`, then right, for the nearest
    /// unchosen index.
    fn probe(chosen: &[bool], start: usize) -> usize {
        let n = chosen.len();
        for left in (0..start).rev() {
            if !chosen[left] {
                return left;
            }
        }
        for right in start..n {
            if !chosen[right] {
                return right;
            }
        }
        unreachable!("probe called with no unchosen indices left")
    }
}
