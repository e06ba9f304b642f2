use rstest::rstest;

use lazyset_core::common_tests::ordered_set_core_tests::*;
use lazyset_core::{Fingerprint, LazyList, OrderedSet};

#[test]
fn test_basic() {
    let set: LazyList<i32> = LazyList::new();
    test_basic_operations(&set);
}

#[test]
fn test_empty_set() {
    test_empty_set_operations::<LazyList<i32>>();
}

#[test]
fn test_replace() {
    test_replace_semantics::<LazyList<i32>>();
}

#[test]
fn test_round_trip() {
    test_add_remove_round_trip::<LazyList<i32>>();
}

#[test]
fn test_concurrent() {
    test_concurrent_operations::<LazyList<i32>>();
}

#[test]
fn test_concurrent_mixed() {
    test_concurrent_mixed_operations::<LazyList<i32>>();
}

// ============================================================================
// Deterministic single-thread scenarios
// ============================================================================

#[test]
fn test_duplicate_add_scenario() {
    let set: LazyList<i32> = LazyList::new();

    assert!(set.add(3));
    assert!(!set.add(3));
    assert!(set.contains(&3));
    assert_eq!(set.to_vec(), vec![3]);
}

#[test]
fn test_remove_middle_scenario() {
    let set: LazyList<i32> = LazyList::new();

    set.add(1);
    set.add(2);
    set.add(3);
    assert!(set.remove(&2));
    assert!(!set.contains(&2));
    assert!(set.is_sorted());
    assert_eq!(set.to_vec(), vec![1, 3]);
}

#[rstest]
#[case::both_absent(vec![], true)]
#[case::old_present_new_absent(vec![5], true)]
#[case::both_present(vec![5, 9], true)]
#[case::old_absent_new_present(vec![9], false)]
fn test_replace_five_with_nine(#[case] initial: Vec<i32>, #[case] modified: bool) {
    let set: LazyList<i32> = LazyList::new();
    for key in initial {
        set.add(key);
    }

    assert_eq!(set.replace(&5, 9), modified);
    assert!(!set.contains(&5));
    assert!(set.contains(&9));
    assert_eq!(set.to_vec(), vec![9]);
}

// ============================================================================
// Idempotence and boundary laws
// ============================================================================

#[test]
fn test_second_add_leaves_set_unchanged() {
    let set: LazyList<i32> = LazyList::new();

    assert!(set.add(4));
    let before = set.to_vec();
    assert!(!set.add(4));
    assert_eq!(set.to_vec(), before);
}

#[test]
fn test_remove_absent_returns_false() {
    let set: LazyList<i32> = LazyList::new();

    set.add(1);
    assert!(!set.remove(&2));
    assert_eq!(set.to_vec(), vec![1]);
}

#[test]
fn test_replace_same_element_is_add() {
    let fresh: LazyList<i32> = LazyList::new();
    let occupied: LazyList<i32> = LazyList::new();
    occupied.add(6);

    // On both sets, replace(x, x) returns what add(x) would.
    assert!(fresh.replace(&6, 6));
    assert!(!occupied.replace(&6, 6));
    assert_eq!(fresh.to_vec(), occupied.to_vec());
}

#[test]
fn test_extreme_fingerprints() {
    let set: LazyList<i32> = LazyList::new();

    assert!(set.add(i32::MIN));
    assert!(set.add(i32::MAX));
    assert!(set.add(0));
    assert!(set.is_sorted());
    assert_eq!(set.to_vec(), vec![i32::MIN, 0, i32::MAX]);

    assert!(set.remove(&i32::MIN));
    assert!(set.remove(&i32::MAX));
    assert_eq!(set.to_vec(), vec![0]);
}

#[rstest]
#[case::coinciding(vec![3, 5], 5, 4, vec![3, 4])]
#[case::disjoint(vec![1, 5, 9], 5, 8, vec![1, 8, 9])]
fn test_replace_window_shapes(
    #[case] initial: Vec<i32>,
    #[case] old: i32,
    #[case] new: i32,
    #[case] expected: Vec<i32>,
) {
    // The coinciding case drives both windows onto the same node pair; the
    // result must be indistinguishable from the disjoint-windows case.
    let set: LazyList<i32> = LazyList::new();
    for key in initial {
        set.add(key);
    }

    assert!(set.replace(&old, new));
    assert_eq!(set.to_vec(), expected);
    assert!(set.is_sorted());
}

// ============================================================================
// Fingerprint collisions
// ============================================================================

/// An element whose fingerprint ignores its payload.
#[derive(Clone, Debug, PartialEq)]
struct Collider {
    slot: i32,
    payload: u8,
}

impl Fingerprint for Collider {
    fn fingerprint(&self) -> i32 {
        self.slot
    }
}

#[test]
fn test_colliding_elements_are_indistinguishable() {
    let set: LazyList<Collider> = LazyList::new();
    let first = Collider { slot: 7, payload: 1 };
    let second = Collider { slot: 7, payload: 2 };

    test_fingerprint_collision_collapses(&set, first.clone(), second.clone());

    // Membership is decided purely by the fingerprint: both elements count
    // as present, but the stored payload is the first one's.
    assert!(set.contains(&first));
    assert!(set.contains(&second));
    assert_eq!(set.to_vec(), vec![first]);
}

#[test]
fn test_replace_with_colliding_new_element() {
    let set: LazyList<Collider> = LazyList::new();
    set.add(Collider { slot: 3, payload: 9 });

    // Old and new share a slot, so the call degenerates to add and the
    // occupied slot rejects it.
    assert!(!set.replace(
        &Collider { slot: 3, payload: 9 },
        Collider { slot: 3, payload: 5 },
    ));
    assert_eq!(set.len(), 1);
}
