//! Guard trait for memory reclamation strategies.
//!
//! Membership tests traverse the list without locks, so a node that has been
//! unlinked may still be under a reader's feet. Collections therefore never
//! free a removed node directly: they hand it to a [`Guard`], which frees it
//! once no reader can still hold a reference.
//!
//! # Design
//!
//! Collections are generic over their guard type:
//!
//! ```text
//! LazyList<T, G: Guard>
//!     │
//!     ├── LazyList<T, EpochGuard>      (production, lazyset-crossbeam)
//!     └── LazyList<T, DeferredGuard>   (testing, deterministic)
//! ```
//!
//! The guard stored in a collection schedules deferred destruction. Actual
//! read protection (epoch pinning) happens per-operation via [`Guard::pin`].

mod deferred_guard;

pub use deferred_guard::DeferredGuard;

/// A memory reclamation guard protecting lock-free readers.
///
/// # Safety Contract
///
/// Implementations must ensure that a node passed to `defer_destroy` is not
/// freed while any read guard pinned before the call is still alive.
///
pub trait Guard: Sized + Default + Send + Sync {
    /// An active guard that protects reads for its lifetime.
    ///
    /// For epoch-based guards this holds a pinned epoch; for deferred guards
    /// it can be a unit type since the collection's stored guard provides
    /// protection.
    ///
    type ReadGuard: Sized;

    /// Pin an active read guard.
    ///
    /// Every operation on a collection pins before touching the list and
    /// holds the guard until it returns.
    ///
    fn pin() -> Self::ReadGuard;

    /// Schedule a node for deferred destruction.
    ///
    /// # Safety
    ///
    /// - `node` must be a valid pointer previously allocated by the collection
    /// - `node` must be unlinked (unreachable from the collection's head)
    /// - `dealloc` must be the correct deallocation function for `node`
    /// - the same pointer must not be retired twice
    ///
    unsafe fn defer_destroy<N>(&self, node: *mut N, dealloc: unsafe fn(*mut N));
}
