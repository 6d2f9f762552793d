//! Concurrent access tests for `cachet_cell`.
//!
//! These tests verify that the registry and cells behave when handles are
//! shared across threads.

use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use cachet_cell::{Cell, CellRegistry};

/// Racing get-or-create calls for one key must all land on the same cell.
#[test]
fn racing_get_or_create_yields_one_cell() {
    let registry = CellRegistry::new();
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = registry.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.get_or_create("use-content/productList/content", vec![i])
            })
        })
        .collect();

    let cells: Vec<Cell<Vec<i32>>> = handles
        .into_iter()
        .map(|h| h.join().expect("Thread panicked"))
        .collect();

    assert_eq!(registry.len(), 1);
    for cell in &cells[1..] {
        assert!(cell.ptr_eq(&cells[0]));
    }
}

/// Writers on distinct keys never see each other's values.
#[test]
fn distinct_keys_are_isolated_across_threads() {
    let registry = CellRegistry::new();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let registry = registry.clone();
            thread::spawn(move || {
                let cell = registry.get_or_create(&format!("counter-{i}"), 0u32);
                for _ in 0..100 {
                    cell.update(|v| *v += 1);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    for i in 0..4 {
        let cell = registry.get::<u32>(&format!("counter-{i}")).unwrap();
        assert_eq!(cell.get(), 100);
        assert_eq!(cell.version(), 100);
    }
}

/// Every write from every thread reaches a shared listener exactly once.
#[test]
fn listener_sees_every_write() {
    let cell = Cell::new("hits", 0u64);
    let notified = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notified);
    let _subscription = cell.subscribe(move |_: &u64| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cell = cell.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    cell.update(|v| *v += 1);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    assert_eq!(cell.get(), 200);
    assert_eq!(notified.load(Ordering::SeqCst), 200);
}

/// Callbacks from racing writers may arrive out of order, but a listener
/// that reads the cell back always sees the final write at least once.
#[test]
fn listener_reading_back_observes_final_value() {
    let cell = Cell::new("latest", 0u64);
    let observed = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = Arc::clone(&observed);
    let reader = cell.clone();
    let _subscription = cell.subscribe(move |_: &u64| {
        sink.lock().push(reader.get());
    });

    let barrier = Arc::new(Barrier::new(4));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cell = cell.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..50 {
                    cell.update(|v| *v += 1);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let observed = observed.lock();
    assert_eq!(observed.len(), 200);
    assert_eq!(observed.iter().copied().max(), Some(200));
    assert_eq!(cell.get(), 200);
}
