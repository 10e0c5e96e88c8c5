//! Ordered maps backed by self-balancing binary search trees.
//!
//! Two interchangeable engines are provided, [`AvlTree`] and [`RbTree`].
//! Both keep operations logarithmic in the worst case and iterate in
//! ascending key order without recursion or an auxiliary stack.
//! [`TreeMap`] picks one of them at construction time via [`TreeKind`].
//!
//! The library logs rotation and fixup decisions at `trace` level through the
//! [`log`](https://docs.rs/log) facade; it never installs a logger itself.
//!
//! ```
//! use treedict::{TreeKind, TreeMap};
//!
//! let mut map = TreeMap::new(TreeKind::Avl);
//! for key in [5, 3, 8, 1, 4, 7, 9] {
//!     map.insert(key, key * 10);
//! }
//! assert_eq!(map.keys().copied().collect::<Vec<_>>(), [1, 3, 4, 5, 7, 8, 9]);
//! assert_eq!(map[&4], 40);
//! ```

mod avl;
mod error;
mod iter;
mod map;
mod node;
mod rb;

pub use avl::AvlTree;
pub use error::Error;
pub use iter::Iter;
pub use map::{TreeKind, TreeMap};
pub use rb::RbTree;

#[cfg(test)]
mod proptest_oracle;
