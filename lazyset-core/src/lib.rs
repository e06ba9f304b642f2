//! Concurrent ordered set built on lazy synchronization.
//!
//! The set is a sentinel-bounded sorted singly-linked list keyed by a 32-bit
//! fingerprint of the element. Readers traverse without locks; mutators
//! traverse optimistically, lock the nodes they intend to touch in ascending
//! list order, revalidate, and commit.
//!
//! Collections are generic over a [`Guard`] that supplies the memory
//! reclamation strategy:
//!
//! ```ignore
//! use lazyset_core::{LazyList, OrderedSet};
//!
//! let set: LazyList<i32> = LazyList::new();
//! set.add(42);
//! assert!(set.contains(&42));
//! ```

pub mod common_tests;
pub mod data_structures;
pub mod fingerprint;
pub mod guard;

pub use data_structures::{LazyList, OrderedSet, SetNode};
pub use fingerprint::Fingerprint;
pub use guard::{DeferredGuard, Guard};
