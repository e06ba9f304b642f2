use std::cmp;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};

use parking_lot::Mutex;

use crate::data_structures::internal::{OrderedSet, SetNode};
use crate::fingerprint::Fingerprint;
use crate::guard::{DeferredGuard, Guard};

type NodePtr<T> = *mut LazyNode<T>;

///
/// Concurrent ordered set over a sorted singly-linked list, using lazy
/// synchronization: unlocked traversal, per-node locks on the candidate
/// window, and optimistic revalidation before commit. Extended with an
/// atomic two-window `replace` that removes one element and inserts another
/// in a single linearization step.
///
// List structure (sorted ascending by fingerprint):
//
// ┌──────┐    ┌──────┐    ┌──────┐    ┌──────┐    ┌──────┐
// │ HEAD │───►│  10  │───►│  20  │───►│  30  │───►│ TAIL │
// │ (-∞) │    │      │    │      │    │      │    │ (+∞) │
// └──────┘    └──────┘    └──────┘    └──────┘    └──────┘
//
// The sentinels order by identity, never by their key field, so the full
// fingerprint range (including i32::MIN and i32::MAX) sorts correctly.
//
// INVARIANTS:
// 1. Following `next` from HEAD always terminates at TAIL
// 2. Keys are strictly increasing along the live chain (set semantics)
// 3. A marked node is logically absent and is unlinked before the marking
//    operation returns
// 4. A node whose `replacement` pointer targets an unmarked node is not yet
//    visible to readers
// 5. Sentinels are never marked, never unlinked, never retired
//
// =============================================================================
// DELETE (mark, then unlink)
// =============================================================================
//
// Before:  pred ──────► curr ──────► next
//
// Step 1 - mark curr (logical delete, the linearization point):
//          pred ──────► curr ──╳───► next
//
// Step 2 - unlink under the window locks:
//          pred ─────────────────────► next
//                       curr ──╳───► next   (unreachable, retired to guard)
//
// Readers that captured curr before the mark reject it by the mark; readers
// arriving after may never see it. The order is mandatory.
//
// =============================================================================
// REPLACE (two windows, four locks)
// =============================================================================
//
// replace(o, n) locates the window around o's key and the window around n's
// key, locks the up-to-four distinct nodes in ascending list order, and
// revalidates both windows. When o is present and n absent, the commit
// publishes a fresh node R for n whose `replacement` field targets o's node:
//
//          predN ──────► R(n) ──────► currN          R.replacement ──► currO
//
// Until currO is marked, readers treat R as absent, so no reader can observe
// o and n present at once. Marking currO is the single step at which o
// vanishes and n appears; afterwards currO is unlinked and R.replacement
// cleared. Publishing R can itself advance predO's successor when the two
// windows abut, so the unlink edge is chosen by re-reading predO.next at
// commit time.
//
#[derive(Debug)]
pub struct LazyNode<T> {
    item: Option<T>,
    key: i32,
    marked: AtomicBool,
    next: AtomicPtr<LazyNode<T>>,
    replacement: AtomicPtr<LazyNode<T>>,
    lock: Mutex<()>,
}

impl<T> LazyNode<T> {
    fn new(item: T, key: i32) -> Self {
        LazyNode {
            item: Some(item),
            key,
            marked: AtomicBool::new(false),
            next: AtomicPtr::new(ptr::null_mut()),
            replacement: AtomicPtr::new(ptr::null_mut()),
            lock: Mutex::new(()),
        }
    }

    fn new_sentinel() -> Self {
        LazyNode {
            item: None,
            key: 0,
            marked: AtomicBool::new(false),
            next: AtomicPtr::new(ptr::null_mut()),
            replacement: AtomicPtr::new(ptr::null_mut()),
            lock: Mutex::new(()),
        }
    }

    // =========================================================================
    // Field accessors
    //
    // Release on every publication, acquire on every read, so a reader that
    // follows a fresh `next` sees a fully initialized successor and a reader
    // that observes a mark sees everything written before it.
    // =========================================================================

    /// Load next pointer (Acquire ordering)
    #[inline]
    fn get_next(&self) -> NodePtr<T> {
        self.next.load(Ordering::Acquire)
    }

    /// Store next pointer (Release ordering)
    #[inline]
    fn set_next(&self, ptr: NodePtr<T>) {
        self.next.store(ptr, Ordering::Release)
    }

    #[inline]
    fn is_marked(&self) -> bool {
        self.marked.load(Ordering::Acquire)
    }

    #[inline]
    fn set_marked(&self) {
        self.marked.store(true, Ordering::Release)
    }

    #[inline]
    fn get_replacement(&self) -> NodePtr<T> {
        self.replacement.load(Ordering::Acquire)
    }

    #[inline]
    fn set_replacement(&self, ptr: NodePtr<T>) {
        self.replacement.store(ptr, Ordering::Release)
    }

    #[inline]
    fn clear_replacement(&self) {
        self.replacement.store(ptr::null_mut(), Ordering::Release)
    }
}

impl<T> SetNode<T> for LazyNode<T> {
    fn key(&self) -> i32 {
        self.key
    }

    fn item(&self) -> Option<&T> {
        self.item.as_ref()
    }
}

/// A pair of adjacent nodes straddling a key, captured by unlocked traversal
/// and used as the locking scope of a mutation.
struct Window<T> {
    pred: NodePtr<T>,
    curr: NodePtr<T>,
}

// Manual impls to avoid requiring T: Clone/Copy
impl<T> Copy for Window<T> {}

impl<T> Clone for Window<T> {
    fn clone(&self) -> Self {
        *self
    }
}

pub struct LazyList<T, G: Guard = DeferredGuard> {
    head: NodePtr<T>,
    tail: NodePtr<T>,
    /// Shared guard instance for deferred destruction. Unlinked nodes are
    /// retired here and freed once no reader can still hold them.
    guard: G,
}

// The raw sentinel pointers are owned by the list; node state is shared only
// through atomics and the per-node locks.
unsafe impl<T: Send, G: Guard> Send for LazyList<T, G> {}
unsafe impl<T: Send + Sync, G: Guard> Sync for LazyList<T, G> {}

impl<T, G> LazyList<T, G>
where
    T: Fingerprint,
    G: Guard,
{
    pub fn new() -> Self {
        let tail = Box::into_raw(Box::new(LazyNode::new_sentinel()));
        let head = Box::into_raw(Box::new(LazyNode::new_sentinel()));
        unsafe {
            (*head).set_next(tail);
        }
        LazyList {
            head,
            tail,
            guard: G::default(),
        }
    }

    /// Walk the chain to the unique window straddling `key`: `pred` is the
    /// last node whose key is below the target, `curr` the first at or above
    /// it (possibly the tail sentinel). Takes no locks, never blocks, and may
    /// return a window that has since gone stale; mutators revalidate after
    /// locking.
    fn locate(&self, key: i32) -> Window<T> {
        let mut pred = self.head;
        let mut curr = unsafe { (*pred).get_next() };
        while curr != self.tail && unsafe { (*curr).key } < key {
            pred = curr;
            curr = unsafe { (*curr).get_next() };
        }
        Window { pred, curr }
    }

    /// Certify that a captured window is still live. Both nodes must be
    /// locked by the caller.
    ///
    /// On top of the classic three checks (neither node marked, still
    /// adjacent), both nodes must have settled replacement pointers, so a
    /// mutator never builds on a node whose displacement is in flight.
    ///
    /// # Safety
    /// `pred` and `curr` must point to nodes kept alive by the pinned guard.
    unsafe fn validate(&self, pred: NodePtr<T>, curr: NodePtr<T>) -> bool {
        unsafe {
            !(*pred).is_marked()
                && !(*curr).is_marked()
                && (*pred).get_next() == curr
                && self.replacement_settled(pred)
                && self.replacement_settled(curr)
        }
    }

    /// A node is settled once its replacement pointer is null or targets a
    /// node that has already been marked.
    ///
    /// # Safety
    /// `node` must point to a node kept alive by the pinned guard.
    unsafe fn replacement_settled(&self, node: NodePtr<T>) -> bool {
        unsafe {
            let target = (*node).get_replacement();
            target.is_null() || (*target).is_marked()
        }
    }

    /// Total order on nodes by list position: head first, tail last, real
    /// nodes by ascending key. Every multi-node mutator locks in this order,
    /// which rules out lock cycles. Distinct nodes with equal keys can only
    /// come from a window that went stale between capture and locking; they
    /// fall back to address order so the order stays total, and validation
    /// then rejects the window.
    fn position_order(&self, a: NodePtr<T>, b: NodePtr<T>) -> cmp::Ordering {
        if a == b {
            return cmp::Ordering::Equal;
        }
        if a == self.head || b == self.tail {
            return cmp::Ordering::Less;
        }
        if b == self.head || a == self.tail {
            return cmp::Ordering::Greater;
        }
        let (ka, kb) = unsafe { ((*a).key, (*b).key) };
        ka.cmp(&kb).then_with(|| (a as usize).cmp(&(b as usize)))
    }

    /// Commit a validated replace. Every window node is locked by the
    /// caller; `new_node` is unpublished and exclusively owned until this
    /// function links it (or frees it on the no-insert paths).
    ///
    /// # Safety
    /// Caller holds the locks of all distinct window nodes and has validated
    /// both windows under those locks.
    unsafe fn commit_replace(
        &self,
        new_node: NodePtr<T>,
        old_key: i32,
        old_window: Window<T>,
        new_key: i32,
        new_window: Window<T>,
    ) -> (bool, Option<NodePtr<T>>) {
        let (pred_old, curr_old) = (old_window.pred, old_window.curr);
        let (pred_new, curr_new) = (new_window.pred, new_window.curr);

        unsafe {
            let old_present = curr_old != self.tail && (*curr_old).key == old_key;
            let new_present = curr_new != self.tail && (*curr_new).key == new_key;

            match (old_present, new_present) {
                // Nothing to displace: a plain splice into the new window.
                (false, false) => {
                    (*new_node).set_next(curr_new);
                    (*pred_new).set_next(new_node);
                    (true, None)
                }
                // Both halves already hold; no structural change.
                (false, true) => {
                    LazyNode::dealloc_ptr(new_node);
                    (false, None)
                }
                // Displacement. The new node is published carrying a
                // replacement pointer at the old one, which keeps it
                // invisible to readers until the old node is marked.
                (true, false) => {
                    (*new_node).set_replacement(curr_old);
                    (*new_node).set_next(curr_new);
                    (*pred_new).set_next(new_node);

                    // Linearization point: the old element vanishes and the
                    // new one becomes visible in the same instant.
                    (*curr_old).set_marked();

                    // The splice may itself have advanced pred_old's
                    // successor (the windows abut), so re-read it to pick
                    // the unlink edge.
                    if (*pred_old).get_next() == curr_old {
                        (*pred_old).set_next((*curr_old).get_next());
                    } else {
                        (*new_node).set_next((*curr_old).get_next());
                    }
                    (*new_node).clear_replacement();
                    (true, Some(curr_old))
                }
                // The new element already exists: only the removal half.
                (true, true) => {
                    LazyNode::dealloc_ptr(new_node);
                    (*curr_old).set_marked();
                    (*pred_old).set_next((*curr_old).get_next());
                    (true, Some(curr_old))
                }
            }
        }
    }

    /// First unmarked, settled node at or after `curr`, or `None` at tail.
    ///
    /// # Safety
    /// `curr` must point to a node kept alive by the pinned guard.
    unsafe fn next_live(&self, mut curr: NodePtr<T>) -> Option<NodePtr<T>> {
        unsafe {
            while curr != self.tail {
                if !(*curr).is_marked() && self.replacement_settled(curr) {
                    return Some(curr);
                }
                curr = (*curr).get_next();
            }
        }
        None
    }
}

impl<T, G> OrderedSet<T> for LazyList<T, G>
where
    T: Fingerprint,
    G: Guard,
{
    type Guard = G;
    type Node = LazyNode<T>;

    fn guard(&self) -> &G {
        &self.guard
    }

    fn add_internal(&self, item: T) -> bool {
        let key = item.fingerprint();
        let new_node = Box::into_raw(Box::new(LazyNode::new(item, key)));

        loop {
            let window = self.locate(key);
            let (pred, curr) = (window.pred, window.curr);

            unsafe {
                let _pred_lock = (*pred).lock.lock();
                let _curr_lock = (*curr).lock.lock();

                if !self.validate(pred, curr) {
                    continue;
                }

                if curr != self.tail && (*curr).key == key {
                    // Fingerprint already present; the fresh node was never
                    // published, so it is freed directly.
                    LazyNode::dealloc_ptr(new_node);
                    return false;
                }

                // Publish the successor first, then the splice, so readers
                // following pred.next always land on an initialized node.
                (*new_node).set_next(curr);
                (*pred).set_next(new_node);
                return true;
            }
        }
    }

    fn remove_internal(&self, item: &T) -> Option<*mut Self::Node> {
        let key = item.fingerprint();

        loop {
            let window = self.locate(key);
            let (pred, curr) = (window.pred, window.curr);

            unsafe {
                let _pred_lock = (*pred).lock.lock();
                let _curr_lock = (*curr).lock.lock();

                if !self.validate(pred, curr) {
                    continue;
                }

                if curr == self.tail || (*curr).key != key {
                    return None;
                }

                // Mark first: from this instant the element is logically
                // gone even while the node is still reachable.
                (*curr).set_marked();
                (*pred).set_next((*curr).get_next());
                return Some(curr);
            }
        }
    }

    fn replace_internal(&self, old: &T, new: T) -> (bool, Option<*mut Self::Node>) {
        let old_key = old.fingerprint();
        let new_key = new.fingerprint();

        // Equal fingerprints map to the same slot: removing and re-inserting
        // would cancel out, so the call degenerates to a plain insert.
        if old_key == new_key {
            return (self.add_internal(new), None);
        }

        let new_node = Box::into_raw(Box::new(LazyNode::new(new, new_key)));

        loop {
            let old_window = self.locate(old_key);
            let new_window = self.locate(new_key);

            // Lock the window nodes in ascending list order. Overlapping
            // windows share nodes; duplicates collapse to one acquisition.
            let mut nodes = [
                old_window.pred,
                old_window.curr,
                new_window.pred,
                new_window.curr,
            ];
            nodes.sort_unstable_by(|&a, &b| self.position_order(a, b));

            unsafe {
                let mut locks = Vec::with_capacity(nodes.len());
                let mut prev = ptr::null_mut();
                for &node in &nodes {
                    if node != prev {
                        locks.push((*node).lock.lock());
                        prev = node;
                    }
                }

                if !self.validate(new_window.pred, new_window.curr)
                    || !self.validate(old_window.pred, old_window.curr)
                {
                    continue;
                }

                return self.commit_replace(new_node, old_key, old_window, new_key, new_window);
            }
        }
    }

    fn contains_internal(&self, item: &T) -> bool {
        let key = item.fingerprint();

        let mut curr = unsafe { (*self.head).get_next() };
        while curr != self.tail && unsafe { (*curr).key } < key {
            curr = unsafe { (*curr).get_next() };
        }

        // A matching node counts only once it is unmarked and settled: a
        // node still hiding behind its replacement pointer is invisible, so
        // no reader sees both sides of a replace at once.
        curr != self.tail
            && unsafe {
                (*curr).key == key && !(*curr).is_marked() && self.replacement_settled(curr)
            }
    }

    fn is_sorted_internal(&self) -> bool {
        unsafe {
            let mut pred = (*self.head).get_next();
            if pred == self.tail {
                return true;
            }
            let mut curr = (*pred).get_next();
            while curr != self.tail {
                if (*pred).key >= (*curr).key {
                    return false;
                }
                pred = curr;
                curr = (*curr).get_next();
            }
        }
        true
    }

    fn first_node_internal(&self) -> Option<*mut Self::Node> {
        unsafe { self.next_live((*self.head).get_next()) }
    }

    fn next_node_internal(&self, node: *mut Self::Node) -> Option<*mut Self::Node> {
        if node.is_null() {
            return None;
        }
        unsafe { self.next_live((*node).get_next()) }
    }
}

impl<T, G> Default for LazyList<T, G>
where
    T: Fingerprint,
    G: Guard,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, G: Guard> Drop for LazyList<T, G> {
    fn drop(&mut self) {
        // Free the physical chain, sentinels included. Nodes unlinked during
        // operation were retired to the guard, which drops after this body
        // and frees them; the two sets are disjoint.
        let mut curr = self.head;
        while !curr.is_null() {
            unsafe {
                let next = (*curr).get_next();
                LazyNode::dealloc_ptr(curr);
                curr = next;
            }
        }
    }
}

// ============================================================================
// Tests - window mechanics and replace sub-cases
// ============================================================================
// Note: Common suites are in src/common_tests and the crate-level tests/.
