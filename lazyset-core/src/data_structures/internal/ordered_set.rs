use crate::fingerprint::Fingerprint;
use crate::guard::Guard;

/// View of a set node exposed to the trait layer and to tests.
pub trait SetNode<T> {
    /// The node's fingerprint key, fixed at construction.
    fn key(&self) -> i32;

    /// The element stored in the node, `None` on sentinels.
    fn item(&self) -> Option<&T>;

    /// Deallocate this node.
    ///
    /// # Safety
    /// - The pointer must have been allocated by the collection that created it
    /// - Must only be called once
    /// - Node must not be accessed after this call
    ///
    unsafe fn dealloc_ptr(ptr: *mut Self)
    where
        Self: Sized,
    {
        // SAFETY: caller must ensure ptr was allocated with Box::new
        unsafe { drop(Box::from_raw(ptr)) };
    }
}

/// A concurrent set ordered by element fingerprint.
///
/// The trait combines the low-level `*_internal` methods implemented by the
/// data structure with safe provided wrappers that pin a read guard for the
/// duration of the call and route retired nodes into [`Guard::defer_destroy`].
/// The guard type determines the memory reclamation strategy:
///
/// ```text
/// LazyList<i32, EpochGuard>      - Production: epoch-based reclamation
/// LazyList<i32, DeferredGuard>   - Testing: deferred destruction
/// ```
///
/// All operations are linearizable. `contains` and `is_sorted` are wait-free;
/// `add`, `remove`, and `replace` may block on per-node locks but are
/// deadlock-free (multi-node mutators lock in ascending list order).
///
pub trait OrderedSet<T: Fingerprint> {
    type Guard: Guard;
    type Node: SetNode<T>;

    /// The shared guard instance for this collection.
    ///
    /// All retired nodes are handed to this guard and freed when the guard
    /// decides it is safe.
    ///
    fn guard(&self) -> &Self::Guard;

    /// Insert under an already-pinned guard.
    ///
    /// Returns `true` if the element was inserted, `false` if an element
    /// with the same fingerprint was already present.
    ///
    fn add_internal(&self, item: T) -> bool;

    /// Remove under an already-pinned guard.
    ///
    /// Returns the unlinked node for the caller to retire, or `None` if no
    /// element with the item's fingerprint was present.
    ///
    fn remove_internal(&self, item: &T) -> Option<*mut Self::Node>;

    /// Replace under an already-pinned guard.
    ///
    /// Atomically removes `old` (if present) and inserts `new` (if absent).
    /// Returns whether the set was observably modified, plus the unlinked
    /// old node for the caller to retire when one was removed.
    ///
    fn replace_internal(&self, old: &T, new: T) -> (bool, Option<*mut Self::Node>);

    /// Wait-free membership test under an already-pinned guard.
    fn contains_internal(&self, item: &T) -> bool;

    /// Wait-free sortedness walk over the physical chain. Debug aid.
    fn is_sorted_internal(&self) -> bool;

    /// First live node, or `None` if the set is empty.
    fn first_node_internal(&self) -> Option<*mut Self::Node>;

    /// Next live node after `node`, or `None` at the end of the chain.
    fn next_node_internal(&self, node: *mut Self::Node) -> Option<*mut Self::Node>;

    // =========================================================================
    // Safe public API (pins the guard per operation)
    // =========================================================================

    /// Insert an element.
    ///
    /// Returns `true` if the set was modified.
    ///
    fn add(&self, item: T) -> bool {
        let _guard = Self::Guard::pin();
        self.add_internal(item)
    }

    /// Remove an element.
    ///
    /// Returns `true` if the set was modified.
    ///
    fn remove(&self, item: &T) -> bool {
        let _guard = Self::Guard::pin();
        if let Some(node) = self.remove_internal(item) {
            unsafe {
                self.guard().defer_destroy(node, Self::Node::dealloc_ptr);
            }
            true
        } else {
            false
        }
    }

    /// Atomically remove `old` and insert `new`.
    ///
    /// A reader never observes the intermediate state where both elements
    /// are present. When the two fingerprints are equal the call degenerates
    /// to `add(new)`. Returns `true` if the set was observably modified.
    ///
    fn replace(&self, old: &T, new: T) -> bool {
        let _guard = Self::Guard::pin();
        let (changed, retired) = self.replace_internal(old, new);
        if let Some(node) = retired {
            unsafe {
                self.guard().defer_destroy(node, Self::Node::dealloc_ptr);
            }
        }
        changed
    }

    /// Wait-free membership test.
    fn contains(&self, item: &T) -> bool {
        let _guard = Self::Guard::pin();
        self.contains_internal(item)
    }

    /// Verify strict key increase along the physical chain. Debug aid.
    fn is_sorted(&self) -> bool {
        let _guard = Self::Guard::pin();
        self.is_sorted_internal()
    }

    /// Check if the set has no live elements.
    fn is_empty(&self) -> bool {
        let _guard = Self::Guard::pin();
        self.first_node_internal().is_none()
    }

    /// Count live elements. Test aid; O(n) and not linearizable.
    fn len(&self) -> usize {
        let _guard = Self::Guard::pin();
        let mut count = 0;
        let mut current = self.first_node_internal();
        while let Some(node) = current {
            count += 1;
            current = self.next_node_internal(node);
        }
        count
    }

    /// Collect live elements in key order. Test aid; not a snapshot.
    fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let _guard = Self::Guard::pin();
        let mut result = Vec::new();
        let mut current = self.first_node_internal();
        while let Some(node) = current {
            unsafe {
                if let Some(item) = (*node).item() {
                    result.push(item.clone());
                }
            }
            current = self.next_node_internal(node);
        }
        result
    }
}
