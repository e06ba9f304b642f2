//! Reusable test suites, generic over any [`OrderedSet`] implementation.
//!
//! Integration tests in this crate run them against
//! `LazyList<i32, DeferredGuard>`; the `lazyset-crossbeam` crate runs the
//! same suites against `LazyList<i32, EpochGuard>`.
//!
//! [`OrderedSet`]: crate::OrderedSet
