//! SPIDER3 cost-sensitive selective preprocessing
//!
//! Reference:
//! Wojciechowski, S., Wilk, S., Stefanowski, J.: An Algorithm for Selective
//! Preprocessing of Multi-class Imbalanced Data. CORES 2017.

use crate::error::{ResampleError, Result};
use crate::resampling::example_set::{Example, ExampleSet};
use crate::resampling::neighbors::TieAwareKnn;
use crate::resampling::{ClassOutcome, ClassStatus, PipelineStep, ResampleOutcome};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Default per-example cap on amplification iterations
const DEFAULT_MAX_AMPLIFICATION: usize = 1000;

/// Expected costs are compared after rounding to 6 decimal places so that
/// floating-point near-ties count as ties
fn round6(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}

/// Disjoint class tiers: majority, intermediate and minority labels
///
/// Order within the intermediate and minority lists is significant: it fixes
/// the pipeline's processing order, and later classes see the cumulative
/// effect of earlier relabeling and amplification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassPartition {
    majority: Vec<i64>,
    intermediate: Vec<i64>,
    minority: Vec<i64>,
}

impl ClassPartition {
    /// Build a partition, rejecting labels assigned to more than one tier
    pub fn new(majority: Vec<i64>, intermediate: Vec<i64>, minority: Vec<i64>) -> Result<Self> {
        let mut seen = HashSet::new();
        for &class in majority.iter().chain(&intermediate).chain(&minority) {
            if !seen.insert(class) {
                return Err(ResampleError::InvalidPartition(format!(
                    "class {class} appears in more than one tier"
                )));
            }
        }
        if seen.is_empty() {
            return Err(ResampleError::InvalidPartition(
                "partition contains no classes".to_string(),
            ));
        }
        Ok(Self {
            majority,
            intermediate,
            minority,
        })
    }

    pub fn majority(&self) -> &[i64] {
        &self.majority
    }

    pub fn intermediate(&self) -> &[i64] {
        &self.intermediate
    }

    pub fn minority(&self) -> &[i64] {
        &self.minority
    }

    /// Canonical cost-matrix order: minority ++ intermediate ++ majority
    pub fn canonical_order(&self) -> Vec<i64> {
        self.minority
            .iter()
            .chain(&self.intermediate)
            .chain(&self.majority)
            .copied()
            .collect()
    }

    /// Pipeline processing order: intermediate ++ minority
    pub fn processing_order(&self) -> Vec<i64> {
        self.intermediate
            .iter()
            .chain(&self.minority)
            .copied()
            .collect()
    }

    pub fn n_classes(&self) -> usize {
        self.majority.len() + self.intermediate.len() + self.minority.len()
    }

    pub fn is_majority(&self, class: i64) -> bool {
        self.majority.contains(&class)
    }

    /// Every label in `y` must belong to one of the tiers
    fn validate_labels(&self, y: &Array1<i64>) -> Result<()> {
        let order = self.canonical_order();
        for &label in y.iter() {
            if !order.contains(&label) {
                return Err(ResampleError::InvalidPartition(format!(
                    "label {label} is not assigned to any class tier"
                )));
            }
        }
        Ok(())
    }
}

/// Mutable per-run state: the three example sets and the id source
#[derive(Debug, Default)]
struct RunState {
    /// Working set: all input examples, shrinking as weak/harmful majority
    /// examples are taken out
    ds: ExampleSet,
    /// Amplified set: relabeled and duplicated examples, append-only
    amplified: ExampleSet,
    /// Removed set: weak majority examples pending possible relabeling
    removed: ExampleSet,
    next_id: u64,
}

impl RunState {
    fn full_union(&self) -> ExampleSet {
        self.ds.union(&self.amplified).union(&self.removed)
    }

    fn fresh_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// SPIDER3 selective resampler
///
/// Holds only immutable configuration; every [`SPIDER3::fit_transform`] call
/// owns its working/amplified/removed sets, so a configured instance can be
/// reused across calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SPIDER3 {
    /// Number of neighbors considered per query
    k: usize,
    /// cost[[i, j]] = cost of predicting class j when the truth is class i,
    /// rows/columns in the partition's canonical order
    cost: Array2<f64>,
    /// Class tiers
    partition: ClassPartition,
    /// Per-example cap on amplification iterations
    max_amplification: usize,
}

impl SPIDER3 {
    /// Create a resampler; the cost matrix must be square with side equal to
    /// the partition's class count
    pub fn new(k: usize, cost: Array2<f64>, partition: ClassPartition) -> Result<Self> {
        if k == 0 {
            return Err(ResampleError::InvalidParameter {
                name: "k".to_string(),
                value: "0".to_string(),
                reason: "at least one neighbor is required".to_string(),
            });
        }
        let n = partition.n_classes();
        if cost.nrows() != n || cost.ncols() != n {
            return Err(ResampleError::CostMatrixMismatch {
                expected: n,
                rows: cost.nrows(),
                cols: cost.ncols(),
            });
        }
        Ok(Self {
            k,
            cost,
            partition,
            max_amplification: DEFAULT_MAX_AMPLIFICATION,
        })
    }

    /// Set the per-example amplification cap (at least 1)
    pub fn with_max_amplification(mut self, cap: usize) -> Self {
        self.max_amplification = cap.max(1);
        self
    }

    /// Resample `x`/`y` and return the modified dataset with per-class
    /// reports.
    ///
    /// Validation failures return an error before any work; a capped or
    /// aborted class is reported in [`ResampleOutcome::class_outcomes`]
    /// while the rest of the run completes.
    pub fn fit_transform(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleOutcome> {
        if x.nrows() != y.len() {
            return Err(ResampleError::ShapeError {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }
        self.partition.validate_labels(y)?;

        let mut state = RunState::default();
        for (i, row) in x.rows().into_iter().enumerate() {
            state
                .ds
                .push(Example::new(i as u64, row.iter().copied().collect(), y[i]));
        }
        state.next_id = state.ds.len() as u64;

        debug!(
            n_samples = state.ds.len(),
            n_classes = self.partition.n_classes(),
            k = self.k,
            "starting resampling run"
        );

        self.flag_weak_majority(&mut state)?;
        debug!(n_weak = state.removed.len(), "weak majority pass complete");

        let mut class_outcomes = Vec::new();
        for class in self.partition.processing_order() {
            class_outcomes.push(self.process_class(class, &mut state));
        }

        let n_removed = x.nrows() - state.ds.len();
        let combined = state.ds.union(&state.amplified);
        let out_x = Array2::from_shape_fn((combined.len(), x.ncols()), |(i, j)| {
            combined.as_slice()[i].features[j]
        });
        let out_y = Array1::from_vec(combined.iter().map(|e| e.label).collect());

        debug!(
            n_out = combined.len(),
            n_removed,
            n_amplified = state.amplified.len(),
            "resampling run complete"
        );

        Ok(ResampleOutcome {
            x: out_x,
            y: out_y,
            n_removed,
            class_outcomes,
        })
    }

    /// Expected misclassification cost of predicting each canonical-order
    /// class for `x`, given its k-neighborhood in `reference`; returns all
    /// classes achieving the minimum.
    ///
    /// Fractions are taken over the configured k even when tie inclusion
    /// returns more than k neighbors.
    fn min_cost_classes(&self, x: &Example, reference: &ExampleSet) -> Result<Vec<i64>> {
        let neighbors = TieAwareKnn::new(self.k).neighbors(x, reference, None);
        if neighbors.is_empty() {
            return Err(ResampleError::DegenerateNeighborhood(format!(
                "no neighbors available for example {}",
                x.id
            )));
        }

        let order = self.partition.canonical_order();
        let mut fractions = vec![0.0; order.len()];
        for neighbor in &neighbors {
            if let Some(i) = order.iter().position(|&c| c == neighbor.label) {
                fractions[i] += 1.0;
            }
        }
        for f in fractions.iter_mut() {
            *f /= self.k as f64;
        }

        let costs: Vec<f64> = (0..order.len())
            .map(|j| {
                round6(
                    (0..order.len())
                        .map(|i| fractions[i] * self.cost[[i, j]])
                        .sum::<f64>(),
                )
            })
            .collect();
        let min = costs.iter().copied().fold(f64::INFINITY, f64::min);

        Ok(order
            .iter()
            .zip(&costs)
            .filter(|&(_, &cost)| cost == min)
            .map(|(&class, _)| class)
            .collect())
    }

    fn any_majority_min_cost(&self, x: &Example, reference: &ExampleSet) -> Result<bool> {
        let min_cost = self.min_cost_classes(x, reference)?;
        Ok(min_cost.iter().any(|&c| self.partition.is_majority(c)))
    }

    /// One pass over a snapshot of the initial working set: a majority
    /// example whose own class is not among its minimum-cost classes is
    /// weak, and moves from the working set to the removed set afterwards.
    fn flag_weak_majority(&self, state: &mut RunState) -> Result<()> {
        let snapshot = state.ds.clone();
        let mut weak_ids = Vec::new();
        for &majority_class in self.partition.majority() {
            for x in snapshot.iter().filter(|e| e.label == majority_class) {
                if !self.min_cost_classes(x, &snapshot)?.contains(&majority_class) {
                    weak_ids.push(x.id);
                }
            }
        }
        for id in weak_ids {
            if let Some(example) = state.ds.remove_by_id(id) {
                state.removed.push(example);
            }
        }
        Ok(())
    }

    /// Run relabel, clean and amplify for one intermediate/minority class
    fn process_class(&self, class: i64, state: &mut RunState) -> ClassOutcome {
        let mut outcome = ClassOutcome {
            class,
            relabeled: 0,
            cleaned: 0,
            amplified: 0,
            status: ClassStatus::Completed,
        };

        // Snapshot of the class's pre-relabel working-set members; relabel
        // and amplify iterate these, clean also covers amplified members
        let class_members = state.ds.of_class(class);

        if let Err(e) = self.relabel(class, &class_members, state, &mut outcome) {
            warn!(class, error = %e, "relabel step aborted");
            outcome.status = ClassStatus::Aborted {
                step: PipelineStep::Relabel,
                reason: e.to_string(),
            };
            return outcome;
        }

        let clean_targets = class_members.union(&state.amplified.of_class(class));
        if let Err(e) = self.clean(&clean_targets, state, &mut outcome) {
            warn!(class, error = %e, "clean step aborted");
            outcome.status = ClassStatus::Aborted {
                step: PipelineStep::Clean,
                reason: e.to_string(),
            };
            return outcome;
        }

        if let Err(e) = self.amplify(class, &class_members, state, &mut outcome) {
            warn!(class, error = %e, "amplify step aborted");
            outcome.status = ClassStatus::Aborted {
                step: PipelineStep::Amplify,
                reason: e.to_string(),
            };
            return outcome;
        }

        debug!(
            class,
            relabeled = outcome.relabeled,
            cleaned = outcome.cleaned,
            amplified = outcome.amplified,
            "class processed"
        );
        outcome
    }

    /// Relabel removed weak-majority examples near each class member into
    /// this class, while some majority class stays minimum-cost for the
    /// member
    fn relabel(
        &self,
        class: i64,
        members: &ExampleSet,
        state: &mut RunState,
        outcome: &mut ClassOutcome,
    ) -> Result<()> {
        let knn = TieAwareKnn::new(self.k);
        for x in members.iter() {
            let neighbors = knn.neighbors(x, &state.full_union(), None);
            let mut ts = state.removed.intersect(&neighbors);
            loop {
                if ts.is_empty() || !self.any_majority_min_cost(x, &state.full_union())? {
                    break;
                }
                let Some(nearest) = ts.nearest(x).cloned() else {
                    break;
                };
                ts.remove_by_id(nearest.id);
                if let Some(mut relabeled) = state.removed.remove_by_id(nearest.id) {
                    relabeled.label = class;
                    state.amplified.push(relabeled);
                    outcome.relabeled += 1;
                }
            }
        }
        Ok(())
    }

    /// Delete the nearest same-class majority neighbors of each target from
    /// the working/removed sets while that majority class stays minimum-cost
    /// for the target
    fn clean(
        &self,
        targets: &ExampleSet,
        state: &mut RunState,
        outcome: &mut ClassOutcome,
    ) -> Result<()> {
        let knn = TieAwareKnn::new(self.k);
        for x in targets.iter() {
            for &majority_class in self.partition.majority() {
                let mut ts = ExampleSet::from_examples(knn.neighbors(
                    x,
                    &state.full_union(),
                    Some(majority_class),
                ));
                loop {
                    if ts.is_empty()
                        || !self
                            .min_cost_classes(x, &state.full_union())?
                            .contains(&majority_class)
                    {
                        break;
                    }
                    let Some(nearest) = ts.nearest(x).cloned() else {
                        break;
                    };
                    ts.remove_by_id(nearest.id);
                    // The neighbor may sit in either set
                    let from_ds = state.ds.remove_by_id(nearest.id).is_some();
                    let from_rs = state.removed.remove_by_id(nearest.id).is_some();
                    if from_ds || from_rs {
                        outcome.cleaned += 1;
                    }
                }
            }
        }
        Ok(())
    }

    /// Append copies of each class member until its own class is
    /// minimum-cost for it, bounded by the per-example iteration cap
    fn amplify(
        &self,
        class: i64,
        members: &ExampleSet,
        state: &mut RunState,
        outcome: &mut ClassOutcome,
    ) -> Result<()> {
        for x in members.iter() {
            let mut iterations = 0;
            loop {
                if self
                    .min_cost_classes(x, &state.full_union())?
                    .contains(&class)
                {
                    break;
                }
                if iterations >= self.max_amplification {
                    warn!(
                        class,
                        example = x.id,
                        iterations,
                        "amplification cap reached, class cut short"
                    );
                    outcome.status = ClassStatus::AmplificationCapped { iterations };
                    return Ok(());
                }
                let mut copy = x.clone();
                copy.id = state.fresh_id();
                state.amplified.push(copy);
                outcome.amplified += 1;
                iterations += 1;
            }
        }
        Ok(())
    }
}
