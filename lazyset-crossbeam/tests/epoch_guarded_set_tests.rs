use rstest::rstest;
use serial_test::serial;

use lazyset_core::common_tests::ordered_set_core_tests::*;
use lazyset_core::common_tests::ordered_set_stress_tests::*;
use lazyset_core::{DeferredGuard, LazyList, OrderedSet};
use lazyset_crossbeam::EpochGuard;

// Trait for type-level parametrization over the reclamation strategy
trait TestOrderedSet {
    type SetType: OrderedSet<i32> + Default + Send + Sync + 'static;
}

// Marker types for each guard
struct UseDeferredGuard;
struct UseEpochGuard;

impl TestOrderedSet for UseDeferredGuard {
    type SetType = LazyList<i32, DeferredGuard>;
}

impl TestOrderedSet for UseEpochGuard {
    type SetType = LazyList<i32, EpochGuard>;
}

#[rstest]
#[case::deferred(UseDeferredGuard)]
#[case::epoch(UseEpochGuard)]
fn test_basic<T: TestOrderedSet>(#[case] _type: T) {
    let set = T::SetType::default();
    test_basic_operations(&set);
}

#[rstest]
#[case::deferred(UseDeferredGuard)]
#[case::epoch(UseEpochGuard)]
fn test_empty<T: TestOrderedSet>(#[case] _type: T) {
    test_empty_set_operations::<T::SetType>();
}

#[rstest]
#[case::deferred(UseDeferredGuard)]
#[case::epoch(UseEpochGuard)]
fn test_replace<T: TestOrderedSet>(#[case] _type: T) {
    test_replace_semantics::<T::SetType>();
}

#[rstest]
#[serial]
#[case::deferred(UseDeferredGuard)]
#[case::epoch(UseEpochGuard)]
fn test_concurrent<T: TestOrderedSet>(#[case] _type: T) {
    test_concurrent_operations::<T::SetType>();
}

#[rstest]
#[serial]
#[case::deferred(UseDeferredGuard)]
#[case::epoch(UseEpochGuard)]
fn test_concurrent_mixed<T: TestOrderedSet>(#[case] _type: T) {
    test_concurrent_mixed_operations::<T::SetType>();
}

#[rstest]
#[serial]
#[case::deferred(UseDeferredGuard)]
#[case::epoch(UseEpochGuard)]
fn test_remove_same_value<T: TestOrderedSet>(#[case] _type: T) {
    test_concurrent_remove_same_value::<T::SetType>();
}

#[rstest]
#[serial]
#[case::deferred(UseDeferredGuard)]
#[case::epoch(UseEpochGuard)]
fn test_replace_atomicity<T: TestOrderedSet>(#[case] _type: T) {
    test_replace_observed_atomically::<T::SetType>();
}

#[rstest]
#[serial]
#[case::deferred(UseDeferredGuard)]
#[case::epoch(UseEpochGuard)]
fn test_mutator_storm<T: TestOrderedSet>(#[case] _type: T) {
    test_sorted_under_mutator_storm::<T::SetType>();
}

// Epoch-specific: nodes retired on one thread while another thread is
// mid-traversal must stay readable until the reader unpins.
#[test]
#[serial]
fn test_epoch_reclamation_under_read_pressure() {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    let set: Arc<LazyList<i32, EpochGuard>> = Arc::new(LazyList::new());
    let stop = Arc::new(AtomicBool::new(false));

    for i in 0..1_000 {
        set.add(i);
    }

    let mut handles = vec![];

    // Churn threads constantly retire nodes.
    for t in 0..4 {
        let set = Arc::clone(&set);
        let stop = Arc::clone(&stop);
        handles.push(thread::spawn(move || {
            let mut i = 0;
            while !stop.load(Ordering::Relaxed) {
                let key = (t * 251 + i) % 1_000;
                set.remove(&key);
                set.add(key);
                set.replace(&key, (key + 500) % 1_000);
                set.replace(&((key + 500) % 1_000), key);
                i += 1;
            }
        }));
    }

    // Reader threads keep long traversals in flight.
    for _ in 0..4 {
        let set = Arc::clone(&set);
        let stop = Arc::clone(&stop);
        handles.push(thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                assert!(set.is_sorted());
                let _ = set.to_vec();
            }
        }));
    }

    thread::sleep(std::time::Duration::from_secs(2));
    stop.store(true, Ordering::Relaxed);

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(set.is_sorted());
}
