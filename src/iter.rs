//! In-order iteration shared by both engines.

use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::avl::Node as AvlNode;
use crate::node::{self, Link, TreeNode};
use crate::rb::Node as RbNode;

/// Stack-less in-order walk over any node model.
///
/// Memory use is two node pointers and a counter; each step either descends
/// to the leftmost node of a right subtree or climbs parent links until it
/// arrives from a left child.
pub(crate) struct InorderWalk<N> {
    root: Link<N>,
    next: Link<N>,
    remaining: usize,
    len: usize,
}

impl<N: TreeNode> InorderWalk<N> {
    pub(crate) fn new(root: Link<N>, len: usize) -> Self {
        Self {
            root,
            next: root.map(|root_ptr| unsafe { node::leftmost(root_ptr) }),
            remaining: len,
            len,
        }
    }

    /// Rewinds to the smallest key of the tree.
    pub(crate) fn reset(&mut self) {
        *self = Self::new(self.root, self.len);
    }

    pub(crate) fn next_node(&mut self) -> Option<NonNull<N>> {
        let node_ptr = self.next?;
        self.next = unsafe { node::successor(node_ptr) };
        self.remaining -= 1;
        Some(node_ptr)
    }

    pub(crate) fn remaining(&self) -> usize {
        self.remaining
    }
}

// Auto derived clone would require N: Clone
impl<N> Clone for InorderWalk<N> {
    fn clone(&self) -> Self {
        Self {
            root: self.root,
            next: self.next,
            remaining: self.remaining,
            len: self.len,
        }
    }
}

enum Walk<K, V> {
    Avl(InorderWalk<AvlNode<K, V>>),
    RedBlack(InorderWalk<RbNode<K, V>>),
}

/// An iterator over the entries of a tree in ascending key order.
///
/// The iterator borrows its tree, so the tree cannot be modified while the
/// iterator is alive:
///
/// ```compile_fail
/// use treedict::AvlTree;
/// let mut tree = AvlTree::new();
/// tree.insert(0, ());
/// let mut iter = tree.iter();
/// tree.insert(1, ());
/// iter.next();
/// ```
///
/// ```compile_fail
/// use treedict::{TreeKind, TreeMap};
/// let mut map = TreeMap::new(TreeKind::RedBlack);
/// map.insert(0, ());
/// for (key, _) in &map {
///     map.remove(key);
/// }
/// ```
pub struct Iter<'a, K, V> {
    walk: Walk<K, V>,
    marker: PhantomData<&'a (K, V)>,
}

// Hands out shared references only, like `&AvlTree` / `&RbTree` would.
unsafe impl<K: Sync, V: Sync> Send for Iter<'_, K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for Iter<'_, K, V> {}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn avl(root: Link<AvlNode<K, V>>, len: usize) -> Self {
        Self {
            walk: Walk::Avl(InorderWalk::new(root, len)),
            marker: PhantomData,
        }
    }

    pub(crate) fn red_black(root: Link<RbNode<K, V>>, len: usize) -> Self {
        Self {
            walk: Walk::RedBlack(InorderWalk::new(root, len)),
            marker: PhantomData,
        }
    }

    /// Rewinds the iterator to the first entry.
    pub fn reset(&mut self) {
        match &mut self.walk {
            Walk::Avl(walk) => walk.reset(),
            Walk::RedBlack(walk) => walk.reset(),
        }
    }
}

fn entry<'a, N>(node_ptr: NonNull<N>) -> (&'a N::Key, &'a N::Value)
where
    N: TreeNode + 'a,
    N::Key: 'a,
    N::Value: 'a,
{
    let node = unsafe { &*node_ptr.as_ptr() };
    (node.key(), node.value())
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.walk {
            Walk::Avl(walk) => walk.next_node().map(entry),
            Walk::RedBlack(walk) => walk.next_node().map(entry),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len();
        (remaining, Some(remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {
    fn len(&self) -> usize {
        match &self.walk {
            Walk::Avl(walk) => walk.remaining(),
            Walk::RedBlack(walk) => walk.remaining(),
        }
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

// Auto derived clone seems to have an invalid type bound of K: Clone
impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        let walk = match &self.walk {
            Walk::Avl(walk) => Walk::Avl(walk.clone()),
            Walk::RedBlack(walk) => Walk::RedBlack(walk.clone()),
        };
        Self {
            walk,
            marker: PhantomData,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
