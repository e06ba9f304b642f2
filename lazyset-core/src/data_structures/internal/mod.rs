mod ordered_set;

pub use ordered_set::{OrderedSet, SetNode};
