//! Crossbeam-based memory reclamation for lazyset collections.
//!
//! This crate provides [`EpochGuard`], an implementation of the
//! `lazyset_core::Guard` trait using crossbeam-epoch.
//!
//! # Usage
//!
//! ```ignore
//! use lazyset_core::{LazyList, OrderedSet};
//! use lazyset_crossbeam::EpochGuard;
//!
//! let set: LazyList<i32, EpochGuard> = LazyList::new();
//! set.add(42);
//! ```

pub mod epoch_guard;

pub use epoch_guard::EpochGuard;
