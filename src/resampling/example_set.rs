//! Stable-id examples and duplicate-tolerant set algebra
//!
//! The pipeline juggles three mutable collections (working, amplified and
//! removed sets) whose union/difference/intersection semantics must preserve
//! duplicates and insertion order. Each example gets a stable id at
//! ingestion so membership and removal are keyed by identity rather than by
//! row-value comparison, which would be ambiguous once duplicate rows exist.

use std::cmp::Ordering;

/// Euclidean distance between two feature rows
fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(ai, bi)| (ai - bi).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// A single labeled example with a stable identity
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    /// Stable id assigned at ingestion; amplified copies get fresh ids
    pub id: u64,
    /// Feature row
    pub features: Vec<f64>,
    /// Class label
    pub label: i64,
}

impl Example {
    pub fn new(id: u64, features: Vec<f64>, label: i64) -> Self {
        Self {
            id,
            features,
            label,
        }
    }

    /// Euclidean distance between this example's features and another's
    pub fn distance_to(&self, other: &Example) -> f64 {
        euclidean(&self.features, &other.features)
    }
}

/// An ordered, duplicate-tolerant collection of examples
///
/// No operation deduplicates: two value-identical rows with distinct ids are
/// distinct members, and the pipeline relies on that.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExampleSet {
    examples: Vec<Example>,
}

impl ExampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_examples(examples: Vec<Example>) -> Self {
        Self { examples }
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Example> {
        self.examples.iter()
    }

    pub fn as_slice(&self) -> &[Example] {
        &self.examples
    }

    pub fn push(&mut self, example: Example) {
        self.examples.push(example);
    }

    pub fn contains_id(&self, id: u64) -> bool {
        self.examples.iter().any(|e| e.id == id)
    }

    /// Remove and return the first member with the given id, if any
    pub fn remove_by_id(&mut self, id: u64) -> Option<Example> {
        let pos = self.examples.iter().position(|e| e.id == id)?;
        Some(self.examples.remove(pos))
    }

    /// Members carrying the given label, in order
    pub fn of_class(&self, label: i64) -> ExampleSet {
        Self {
            examples: self
                .examples
                .iter()
                .filter(|e| e.label == label)
                .cloned()
                .collect(),
        }
    }

    /// Concatenation of both sets, keeping duplicates and order
    pub fn union(&self, other: &ExampleSet) -> ExampleSet {
        let mut examples = self.examples.clone();
        examples.extend(other.examples.iter().cloned());
        Self { examples }
    }

    /// Members of `self` whose id appears in `other`, in `self`'s order
    pub fn intersect(&self, other: &[Example]) -> ExampleSet {
        Self {
            examples: self
                .examples
                .iter()
                .filter(|e| other.iter().any(|o| o.id == e.id))
                .cloned()
                .collect(),
        }
    }

    /// Nearest member to `query` by Euclidean distance, excluding `query`
    /// itself by id. Equidistant members tie-break to the lowest id.
    pub fn nearest(&self, query: &Example) -> Option<&Example> {
        self.examples
            .iter()
            .filter(|e| e.id != query.id)
            .map(|e| (query.distance_to(e), e))
            .min_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(Ordering::Equal)
                    .then(a.1.id.cmp(&b.1.id))
            })
            .map(|(_, e)| e)
    }
}
