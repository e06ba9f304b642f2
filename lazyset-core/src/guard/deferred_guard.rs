//! Deferred guard implementation for testing.

use std::sync::Mutex;

#[cfg(debug_assertions)]
use std::collections::HashSet;

use super::Guard;

/// A guard that defers all node destruction until it is dropped.
///
/// Retired nodes accumulate under a mutex and are freed when the owning
/// collection (and with it the stored guard) drops. This gives fully
/// deterministic destruction timing, which is what the test suites want; it
/// is not suitable for long-running processes since memory is only returned
/// at collection teardown.
///
/// In debug builds the guard panics if the same pointer is retired twice,
/// which catches double-unlink defects in the list protocols.
///
pub struct DeferredGuard {
    retired: Mutex<Vec<RetiredNode>>,
    #[cfg(debug_assertions)]
    seen: Mutex<HashSet<usize>>,
}

struct RetiredNode {
    ptr: *mut (),
    dealloc: unsafe fn(*mut ()),
}

// The raw pointer is only touched under the mutex, and only by drop.
unsafe impl Send for RetiredNode {}

impl DeferredGuard {
    pub fn new() -> Self {
        DeferredGuard {
            retired: Mutex::new(Vec::new()),
            #[cfg(debug_assertions)]
            seen: Mutex::new(HashSet::new()),
        }
    }
}

impl Default for DeferredGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DeferredGuard {
    fn drop(&mut self) {
        let nodes = self.retired.get_mut().unwrap();
        for node in nodes.drain(..) {
            unsafe {
                (node.dealloc)(node.ptr);
            }
        }
    }
}

impl Guard for DeferredGuard {
    /// No-op: the stored guard keeps every retired node alive, so readers
    /// need no per-operation protection.
    type ReadGuard = ();

    fn pin() -> Self::ReadGuard {}

    unsafe fn defer_destroy<N>(&self, node: *mut N, dealloc: unsafe fn(*mut N)) {
        #[cfg(debug_assertions)]
        {
            let mut seen = self.seen.lock().unwrap();
            if !seen.insert(node as usize) {
                panic!("node {:#x} retired twice", node as usize);
            }
        }

        let node = RetiredNode {
            ptr: node as *mut (),
            dealloc: unsafe {
                std::mem::transmute::<unsafe fn(*mut N), unsafe fn(*mut ())>(dealloc)
            },
        };
        self.retired.lock().unwrap().push(node);
    }
}
