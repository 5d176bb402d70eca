//! Tie-aware k-nearest-neighbor search
//!
//! A plain top-k query breaks distance ties at the k-th position
//! arbitrarily, which makes resampling decisions depend on candidate order.
//! This search instead finds the k-th nearest distance, widens it by a small
//! relative tolerance to catch floating-point-equal ties, and then collects
//! ascending groups of equal distance until at least k neighbors are
//! gathered — so every candidate tied with the k-th distance is included,
//! even when that exceeds k.

use rayon::prelude::*;
use std::cmp::Ordering;

use super::example_set::{Example, ExampleSet};

/// Relative widening applied to the k-th nearest distance (0.01%)
const RADIUS_TOLERANCE: f64 = 1e-4;

/// Tie-aware k-nearest-neighbor search over an example set
#[derive(Debug, Clone, Copy)]
pub struct TieAwareKnn {
    k: usize,
}

impl TieAwareKnn {
    /// Create a search for up to `k` neighbors (at least 1)
    pub fn new(k: usize) -> Self {
        Self { k: k.max(1) }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Neighbors of `query` in `candidates`, excluding `query` itself by id.
    ///
    /// Returns min(k, |candidates|) neighbors plus any candidates tied with
    /// the k-th distance. With `class_filter` set, the selected neighbors
    /// are filtered to that label afterwards — the radius-based candidate
    /// set stays the same, it is not a fresh per-class top-k.
    pub fn neighbors(
        &self,
        query: &Example,
        candidates: &ExampleSet,
        class_filter: Option<i64>,
    ) -> Vec<Example> {
        let mut scored: Vec<(f64, &Example)> = candidates
            .as_slice()
            .par_iter()
            .filter(|e| e.id != query.id)
            .map(|e| (query.distance_to(e), e))
            .collect();

        if scored.is_empty() {
            return Vec::new();
        }

        scored.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.id.cmp(&b.1.id))
        });

        // Clamp to the candidate count when fewer than k remain
        let effective_k = self.k.min(scored.len());
        let kth_distance = scored[effective_k - 1].0;
        let radius = kth_distance + kth_distance * RADIUS_TOLERANCE;

        let pool: Vec<(f64, &Example)> = scored
            .into_iter()
            .take_while(|&(d, _)| d <= radius)
            .collect();

        // Ascending equal-distance groups, whole groups at a time, until at
        // least k neighbors are collected
        let mut selected: Vec<&Example> = Vec::new();
        let mut i = 0;
        while i < pool.len() && selected.len() < self.k {
            let group_distance = pool[i].0;
            let mut j = i;
            while j < pool.len() && pool[j].0 == group_distance {
                selected.push(pool[j].1);
                j += 1;
            }
            i = j;
        }

        match class_filter {
            Some(c) => selected
                .into_iter()
                .filter(|e| e.label == c)
                .cloned()
                .collect(),
            None => selected.into_iter().cloned().collect(),
        }
    }
}
