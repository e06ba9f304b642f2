//! Epoch-based guard implementation using crossbeam-epoch.
//!
//! Wait-free readers can stand on nodes that a mutator has just unlinked,
//! so unlinked nodes must outlive every traversal that could still reach
//! them. `EpochGuard` provides that grace period through the global epoch
//! collector: operations pin the current thread on entry, and retired nodes
//! are freed only after every thread has moved past the epoch in which they
//! were unlinked.

use crossbeam_epoch::{self as epoch, Guard as CrossbeamGuard};
use lazyset_core::guard::Guard;

/// Epoch-based memory reclamation guard.
///
/// A zero-sized type: all state lives in the global epoch collector, so the
/// guard can be stored inside a collection without affecting its auto
/// traits. `pin()` performs the actual per-operation thread pinning;
/// `defer_destroy` schedules the deallocation to run after the grace
/// period.
///
/// # Performance
///
/// - **Pin overhead**: a thread-local check per operation
/// - **Reclamation**: batched, amortized O(1) per node
/// - **Memory**: unlinked nodes may accumulate between collector advances
///
#[derive(Clone, Copy, Default)]
pub struct EpochGuard;

impl Guard for EpochGuard {
    /// A pinned crossbeam epoch, held for the duration of one operation.
    type ReadGuard = CrossbeamGuard;

    fn pin() -> Self::ReadGuard {
        epoch::pin()
    }

    unsafe fn defer_destroy<N>(&self, node: *mut N, dealloc: unsafe fn(*mut N)) {
        // The caller's operation is already pinned; this short-lived pin
        // just carries the deferred closure into the collector.
        let guard = epoch::pin();
        unsafe {
            guard.defer_unchecked(move || {
                dealloc(node);
            });
        }
    }
}
