mod common;

use kinema::{DefaultLayout, DefaultLayoutParallel};

fn max_deviation(a: &kinema::DynamicGraph, b: &kinema::DynamicGraph) -> f32 {
    let mut worst = 0.0f32;
    for (one, two) in a.states().iter().zip(b.states()) {
        for node in one.nodes() {
            let other = two.node_at(node.id).unwrap();
            worst = worst
                .max((node.pos.x - other.pos.x).abs())
                .max((node.pos.y - other.pos.y).abs());
        }
    }
    worst
}

#[test]
fn parallel_matches_sequential() {
    let mut sequential = common::sample_dynamic_graph(20, 42);
    let mut parallel = common::sample_dynamic_graph(20, 42);

    DefaultLayout::new(0.04).apply(&mut sequential).unwrap();
    DefaultLayoutParallel::new(4, 0.04)
        .apply(&mut parallel)
        .unwrap();

    let deviation = max_deviation(&sequential, &parallel);
    assert!(deviation <= 1e-3, "deviation {deviation}");
}

#[test]
fn thread_count_does_not_change_the_result() {
    let mut two_threads = common::sample_dynamic_graph(15, 8);
    let mut five_threads = common::sample_dynamic_graph(15, 8);

    DefaultLayoutParallel::new(2, 0.04)
        .apply(&mut two_threads)
        .unwrap();
    DefaultLayoutParallel::new(5, 0.04)
        .apply(&mut five_threads)
        .unwrap();

    let deviation = max_deviation(&two_threads, &five_threads);
    assert!(deviation <= 1e-3, "deviation {deviation}");
}

#[test]
fn single_worker_parallel_engine_works() {
    let mut dgraph = common::sample_dynamic_graph(8, 4);
    DefaultLayoutParallel::new(1, 0.04)
        .apply(&mut dgraph)
        .unwrap();
    for state in dgraph.states() {
        for node in state.nodes() {
            assert!(node.pos.x.abs() <= 0.5 + 1e-5);
            assert!(node.pos.y.abs() <= 0.5 + 1e-5);
        }
    }
}

#[test]
fn pool_outlives_multiple_layouts() {
    let mut layout = DefaultLayoutParallel::new(3, 0.04);
    for seed in 0..3 {
        let mut dgraph = common::sample_dynamic_graph(10, seed);
        layout.apply(&mut dgraph).unwrap();
        assert!(!dgraph.states().is_empty());
    }
}

#[test]
fn zero_tolerance_skips_the_parallel_pass() {
    let mut sequential = common::sample_dynamic_graph(10, 6);
    let mut parallel = common::sample_dynamic_graph(10, 6);
    DefaultLayout::new(0.0).apply(&mut sequential).unwrap();
    DefaultLayoutParallel::new(4, 0.0)
        .apply(&mut parallel)
        .unwrap();
    assert_eq!(max_deviation(&sequential, &parallel), 0.0);
}
