//! Concurrency tests for the one-time engine bootstrap

mod common;

use common::scalar;
use lindag::dispatch::to_real_array;
use lindag::engine::bootstrap;
use lindag::graph::build::plus;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn concurrent_first_use_runs_the_state_machine_exactly_once() {
    const THREADS: usize = 128;

    let barrier = Arc::new(Barrier::new(THREADS));
    let failures = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let barrier = Arc::clone(&barrier);
            let failures = Arc::clone(&failures);
            thread::spawn(move || {
                let graph = plus(&scalar(i as f64), &scalar(1.0));
                // all threads hit the first materialization together
                barrier.wait();
                match to_real_array(&graph) {
                    Ok(rows) => assert_eq!(rows, vec![vec![i as f64 + 1.0]]),
                    Err(_) => {
                        failures.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker thread panicked");
    }

    assert_eq!(failures.load(Ordering::SeqCst), 0);
    assert!(bootstrap::is_initialized());
    // exactly one completed state-machine run across all threads
    assert_eq!(bootstrap::bootstrap_runs(), 1);

    // and no artifact was loaded twice
    let loaded = bootstrap::loaded_artifacts();
    let mut deduped = loaded.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(loaded.len(), deduped.len());
}

#[test]
fn materialization_after_bootstrap_reuses_the_engine() {
    let graph = plus(&scalar(2.0), &scalar(3.0));
    assert_eq!(to_real_array(&graph).unwrap(), vec![vec![5.0]]);
    assert_eq!(bootstrap::bootstrap_runs(), 1);

    // shared graphs may be materialized from several threads at once
    let shared = plus(&graph, &graph);
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let shared = shared.clone();
            thread::spawn(move || to_real_array(&shared).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), vec![vec![10.0]]);
    }
    assert_eq!(bootstrap::bootstrap_runs(), 1);
}
