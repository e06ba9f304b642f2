mod lazy_list;

pub use lazy_list::{LazyList, LazyNode};
