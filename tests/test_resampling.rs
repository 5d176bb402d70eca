//! Integration test: SPIDER3 resampling end-to-end

use ndarray::{array, Array1, Array2};
use selective_resampling::prelude::*;

/// One feature column per row
fn dataset(rows: &[(f64, i64)]) -> (Array2<f64>, Array1<i64>) {
    let x = Array2::from_shape_fn((rows.len(), 1), |(i, _)| rows[i].0);
    let y = Array1::from_vec(rows.iter().map(|&(_, label)| label).collect());
    (x, y)
}

fn two_cluster_2d() -> (Array2<f64>, Array1<i64>) {
    // Majority cluster near the origin, minority cluster near (10, 10)
    let x = array![
        [0.0, 0.0],
        [1.0, 0.0],
        [0.0, 1.0],
        [1.0, 1.0],
        [10.0, 10.0],
        [11.0, 10.0],
        [10.0, 11.0],
        [11.0, 11.0],
    ];
    let y = array![0i64, 0, 0, 0, 1, 1, 1, 1];
    (x, y)
}

#[test]
fn test_conservation_under_noop_cost() {
    // Well-separated clusters and a cost matrix whose diagonal is zero:
    // every neighborhood favors its own class, so nothing is removed,
    // relabeled or amplified and the output equals the input
    let (x, y) = two_cluster_2d();
    let cost = array![[0.0, 1.0], [1.0, 0.0]];
    let partition = ClassPartition::new(vec![0], vec![], vec![1]).unwrap();
    let resampler = SPIDER3::new(3, cost, partition).unwrap();

    let outcome = resampler.fit_transform(&x, &y).unwrap();

    assert_eq!(outcome.x, x);
    assert_eq!(outcome.y, y);
    assert_eq!(outcome.n_removed, 0);
    assert!(outcome.fully_completed());
    for class_outcome in &outcome.class_outcomes {
        assert_eq!(class_outcome.relabeled, 0);
        assert_eq!(class_outcome.cleaned, 0);
        assert_eq!(class_outcome.amplified, 0);
    }
}

#[test]
fn test_end_to_end_golden_scenario() {
    // Majority points at x=0..9, minority at x=100 and 101, k=3, canonical
    // order [minority, majority], cost [[0,1],[5,0]].
    //
    // Hand-computed expectation: no majority point is weak (each has an
    // all-majority neighborhood, making its own class minimum-cost).
    // Cleaning the minority class removes majority points 9 and 8 (nearest
    // majority neighbors of x=100) and then 7 and 6 (of x=101), because a
    // minority-light neighborhood makes the majority class minimum-cost for
    // both minority points. Amplification then appends two copies of x=100
    // before its own class becomes minimum-cost; x=101's neighborhood is by
    // then fully minority, so it is not amplified.
    let mut rows: Vec<(f64, i64)> = (0..10).map(|i| (i as f64, 0)).collect();
    rows.push((100.0, 1));
    rows.push((101.0, 1));
    let (x, y) = dataset(&rows);

    let cost = array![[0.0, 1.0], [5.0, 0.0]];
    let partition = ClassPartition::new(vec![0], vec![], vec![1]).unwrap();
    let resampler = SPIDER3::new(3, cost, partition).unwrap();

    let outcome = resampler.fit_transform(&x, &y).unwrap();

    let expected_x = array![
        [0.0],
        [1.0],
        [2.0],
        [3.0],
        [4.0],
        [5.0],
        [100.0],
        [101.0],
        [100.0],
        [100.0]
    ];
    let expected_y = array![0i64, 0, 0, 0, 0, 0, 1, 1, 1, 1];
    assert_eq!(outcome.x, expected_x);
    assert_eq!(outcome.y, expected_y);
    assert_eq!(outcome.n_removed, 4);
    assert!(outcome.fully_completed());

    assert_eq!(outcome.class_outcomes.len(), 1);
    let minority = &outcome.class_outcomes[0];
    assert_eq!(minority.class, 1);
    assert_eq!(minority.relabeled, 0);
    assert_eq!(minority.cleaned, 4);
    assert_eq!(minority.amplified, 2);
    assert_eq!(minority.status, ClassStatus::Completed);
}

#[test]
fn test_duplicates_are_preserved_not_deduplicated() {
    let mut rows: Vec<(f64, i64)> = (0..10).map(|i| (i as f64, 0)).collect();
    rows.push((100.0, 1));
    rows.push((101.0, 1));
    let (x, y) = dataset(&rows);

    let cost = array![[0.0, 1.0], [5.0, 0.0]];
    let partition = ClassPartition::new(vec![0], vec![], vec![1]).unwrap();
    let resampler = SPIDER3::new(3, cost, partition).unwrap();

    let outcome = resampler.fit_transform(&x, &y).unwrap();

    // Amplification appended two exact copies of x=100; all three rows
    // survive individually
    let copies = outcome
        .x
        .rows()
        .into_iter()
        .filter(|row| row[0] == 100.0)
        .count();
    assert_eq!(copies, 3);
}

#[test]
fn test_k_larger_than_working_set_clamps_and_reports_abort() {
    // k=5 against 4 examples: neighbor searches clamp to the candidate
    // count instead of failing. Cleaning then strips every majority example
    // away from the lone minority point, leaving it without neighbors, and
    // the amplify step reports a per-class abort instead of failing the run
    let (x, y) = dataset(&[(0.0, 0), (1.0, 0), (2.0, 0), (10.0, 1)]);
    let cost = array![[0.0, 1.0], [5.0, 0.0]];
    let partition = ClassPartition::new(vec![0], vec![], vec![1]).unwrap();
    let resampler = SPIDER3::new(5, cost, partition).unwrap();

    let outcome = resampler.fit_transform(&x, &y).unwrap();

    assert_eq!(outcome.class_outcomes.len(), 1);
    match &outcome.class_outcomes[0].status {
        ClassStatus::Aborted { step, .. } => assert_eq!(*step, PipelineStep::Amplify),
        other => panic!("expected amplify abort, got {other:?}"),
    }
    // All three majority examples were cleaned away; the minority point
    // survives alone
    assert_eq!(outcome.x.nrows(), 1);
    assert_eq!(outcome.y, array![1i64]);
    assert_eq!(outcome.n_removed, 3);
}

#[test]
fn test_amplification_cap_is_reported_not_hung() {
    // Predicting the majority class is always free and predicting the
    // minority class always costs something, so the minority class can
    // never become minimum-cost and amplification would loop forever
    // without the cap
    let (x, y) = dataset(&[
        (0.0, 0),
        (1.0, 0),
        (2.0, 0),
        (3.0, 0),
        (4.0, 0),
        (10.0, 1),
        (11.0, 1),
    ]);
    let cost = array![[10.0, 0.0], [10.0, 0.0]];
    let partition = ClassPartition::new(vec![0], vec![], vec![1]).unwrap();
    let resampler = SPIDER3::new(3, cost, partition)
        .unwrap()
        .with_max_amplification(25);

    let outcome = resampler.fit_transform(&x, &y).unwrap();

    assert_eq!(outcome.class_outcomes.len(), 1);
    let minority = &outcome.class_outcomes[0];
    assert_eq!(
        minority.status,
        ClassStatus::AmplificationCapped { iterations: 25 }
    );
    assert_eq!(minority.amplified, 25);
    assert!(!outcome.fully_completed());
    // The capped run still returns a consistent dataset
    assert_eq!(outcome.x.nrows(), outcome.y.len());
}

#[test]
fn test_unpartitioned_label_is_rejected() {
    let (x, y) = dataset(&[(0.0, 0), (1.0, 1), (2.0, 3)]);
    let cost = array![[0.0, 1.0], [1.0, 0.0]];
    let partition = ClassPartition::new(vec![0], vec![], vec![1]).unwrap();
    let resampler = SPIDER3::new(1, cost, partition).unwrap();

    let result = resampler.fit_transform(&x, &y);
    assert!(matches!(result, Err(ResampleError::InvalidPartition(_))));
}

#[test]
fn test_cost_matrix_dimension_is_rejected_at_construction() {
    let cost = array![[0.0, 1.0], [1.0, 0.0]];
    let partition = ClassPartition::new(vec![0, 2], vec![], vec![1]).unwrap();
    let result = SPIDER3::new(3, cost, partition);
    assert!(matches!(
        result,
        Err(ResampleError::CostMatrixMismatch { .. })
    ));
}

#[test]
fn test_three_tier_partition_processes_intermediate_before_minority() {
    // Three well-separated clusters with a no-op cost matrix: the run
    // completes and reports the intermediate class before the minority one
    let (x, y) = dataset(&[
        (0.0, 0),
        (1.0, 0),
        (2.0, 0),
        (3.0, 0),
        (50.0, 2),
        (51.0, 2),
        (52.0, 2),
        (100.0, 1),
        (101.0, 1),
        (102.0, 1),
    ]);
    // Canonical order [1, 2, 0]
    let cost = array![[0.0, 1.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 0.0]];
    let partition = ClassPartition::new(vec![0], vec![2], vec![1]).unwrap();
    let resampler = SPIDER3::new(2, cost, partition).unwrap();

    let outcome = resampler.fit_transform(&x, &y).unwrap();

    assert!(outcome.fully_completed());
    let classes: Vec<i64> = outcome.class_outcomes.iter().map(|c| c.class).collect();
    assert_eq!(classes, vec![2, 1]);
    assert_eq!(outcome.x, x);
    assert_eq!(outcome.y, y);
}

#[test]
fn test_resampler_instance_is_reusable() {
    let (x, y) = two_cluster_2d();
    let cost = array![[0.0, 1.0], [1.0, 0.0]];
    let partition = ClassPartition::new(vec![0], vec![], vec![1]).unwrap();
    let resampler = SPIDER3::new(3, cost, partition).unwrap();

    let first = resampler.fit_transform(&x, &y).unwrap();
    let second = resampler.fit_transform(&x, &y).unwrap();
    assert_eq!(first.x, second.x);
    assert_eq!(first.y, second.y);
}
