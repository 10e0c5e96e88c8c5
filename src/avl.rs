//! The AVL engine: an ordered map kept height-balanced through balance factors.

use std::borrow::Borrow;
use std::fmt;
use std::iter::FromIterator;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

use log::{debug, trace};

use crate::iter::Iter;
use crate::node::{self, InsertPos, Side, TreeNode};

/// An ordered map implemented with an AVL tree.
///
/// ```
/// use treedict::AvlTree;
/// let mut tree = AvlTree::new();
/// tree.insert(5, "five");
/// tree.insert(3, "three");
/// assert_eq!(tree.get(&3), Some(&"three"));
/// assert_eq!(tree.remove(&3), Some("three"));
/// assert!(tree.get(&3).is_none());
/// ```
pub struct AvlTree<K, V> {
    root: Link<K, V>,
    num_nodes: usize,
    marker: PhantomData<Box<Node<K, V>>>,
}

pub(crate) struct Node<K, V> {
    key: K,
    value: V,
    left: Link<K, V>,
    right: Link<K, V>,
    parent: Link<K, V>,
    // height(left) - height(right); -1, 0 or 1 whenever the tree is at rest
    balance: i8,
}

type NodePtr<K, V> = NonNull<Node<K, V>>;
type Link<K, V> = Option<NodePtr<K, V>>;

// The tree owns its nodes exactly like a `Box` would.
unsafe impl<K: Send, V: Send> Send for AvlTree<K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for AvlTree<K, V> {}

impl<K, V> AvlTree<K, V> {
    /// Creates an empty tree.
    /// No memory is allocated until the first item is inserted.
    pub fn new() -> Self {
        Self {
            root: None,
            num_nodes: 0,
            marker: PhantomData,
        }
    }

    /// Returns true if the tree contains no elements.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of elements in the tree.
    pub fn len(&self) -> usize {
        self.num_nodes
    }

    /// Returns the number of levels in the tree, 0 if it is empty.
    pub fn height(&self) -> usize {
        unsafe { node::height(self.root) }
    }

    /// Clears the tree, deallocating all memory.
    pub fn clear(&mut self) {
        if self.root.is_some() {
            debug!("avl: clearing {} entries", self.num_nodes);
        }
        unsafe {
            node::traverse(self.root, |_| {}, |_| {}, |node_ptr| {
                drop(Node::destroy(node_ptr));
            })
        };
        self.root = None;
        self.num_nodes = 0;
    }

    #[cfg(test)]
    pub(crate) fn root_key(&self) -> Option<&K> {
        self.root.map(|root_ptr| &unsafe { &*root_ptr.as_ptr() }.key)
    }

    #[cfg(test)]
    pub(crate) fn set_root_balance(&mut self, balance: i8) {
        if let Some(mut root_ptr) = self.root {
            unsafe { root_ptr.as_mut().balance = balance };
        }
    }

    /// Gets an iterator over the entries of the tree in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::avl(self.root, self.num_nodes)
    }

    /// Returns the entry with the smallest key.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.root.map(|root_ptr| {
            let node = unsafe { &*node::leftmost(root_ptr).as_ptr() };
            (&node.key, &node.value)
        })
    }

    /// Returns the entry with the largest key.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.root.map(|root_ptr| {
            let node = unsafe { &*node::rightmost(root_ptr).as_ptr() };
            (&node.key, &node.value)
        })
    }
}

impl<K: Ord, V> AvlTree<K, V> {
    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the tree's key type, but the ordering
    /// on the borrowed form *must* match the ordering on the key type.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).map(|node_ptr| &unsafe { &*node_ptr.as_ptr() }.value)
    }

    /// Returns references to the key-value pair corresponding to the key.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).map(|node_ptr| {
            let node = unsafe { &*node_ptr.as_ptr() };
            (&node.key, &node.value)
        })
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).map(|node_ptr| &mut unsafe { &mut *node_ptr.as_ptr() }.value)
    }

    /// Returns true if the tree contains a value for the key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Looks up the key, returning whether it was found together with a copy
    /// of its value, or the default value if it is absent.
    pub fn search<Q>(&self, key: &Q) -> (bool, V)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
        V: Clone + Default,
    {
        match self.get(key) {
            Some(value) => (true, value.clone()),
            None => (false, V::default()),
        }
    }

    /// Inserts a key-value pair into the tree.
    ///
    /// If the key was already present its value is overwritten in place and the
    /// old value is returned; the shape of the tree does not change.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match unsafe { node::find_insert_pos(self.root, &key) } {
            InsertPos::Occupied(mut node_ptr) => {
                Some(mem::replace(unsafe { &mut node_ptr.as_mut().value }, value))
            }
            InsertPos::Vacant { parent, side } => {
                let new_ptr = Node::create(parent, key, value);
                self.num_nodes += 1;
                match parent {
                    None => self.root = Some(new_ptr),
                    Some(mut parent_ptr) => unsafe {
                        match side {
                            Side::Left => parent_ptr.as_mut().left = Some(new_ptr),
                            Side::Right => parent_ptr.as_mut().right = Some(new_ptr),
                        }
                        self.rebalance_after_insert(parent_ptr, side);
                    },
                }
                None
            }
        }
    }

    /// Removes a key from the tree.
    /// Returns the value at the key if the key was previously in the tree.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes a key from the tree, returning the stored key and value.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node_ptr = self.find(key)?;
        debug_assert!(self.num_nodes >= 1);
        self.unlink_node(node_ptr);
        self.num_nodes -= 1;
        let node = unsafe { Node::destroy(node_ptr) };
        Some((node.key, node.value))
    }

    /// Removes a key from the tree.
    /// Returns whether the key was previously in the tree.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove_entry(key).is_some()
    }

    /// Asserts that the internal tree structure is consistent.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        unsafe {
            // Check root link
            if let Some(root_ptr) = self.root {
                assert!(root_ptr.as_ref().parent.is_none());
            }

            // Check tree nodes; post-order leaves the right then left child's
            // subtree height on top of the stack
            let mut heights: Vec<usize> = Vec::new();
            let mut num_nodes = 0;
            node::traverse(self.root, |_| {}, |_| {}, |node_ptr| {
                let node = node_ptr.as_ref();

                // Check link for right child node
                let right_height = match node.right {
                    Some(right_ptr) => {
                        assert!(right_ptr.as_ref().parent == Some(node_ptr));
                        assert!(right_ptr.as_ref().key > node.key);
                        heights.pop().expect("missing right subtree height")
                    }
                    None => 0,
                };

                // Check link for left child node
                let left_height = match node.left {
                    Some(left_ptr) => {
                        assert!(left_ptr.as_ref().parent == Some(node_ptr));
                        assert!(left_ptr.as_ref().key < node.key);
                        heights.pop().expect("missing left subtree height")
                    }
                    None => 0,
                };

                // Check recorded balance and AVL condition
                assert_eq!(
                    node.balance as isize,
                    left_height as isize - right_height as isize
                );
                assert!(node.balance.abs() <= 1);

                heights.push(1 + left_height.max(right_height));
                num_nodes += 1;
            });

            // Check number of nodes
            assert_eq!(num_nodes, self.num_nodes);
            assert_eq!(heights.len(), usize::from(self.root.is_some()));
        }

        let mut keys = self.iter().map(|(k, _)| k);
        if let Some(mut prev) = keys.next() {
            for key in keys {
                assert!(prev < key);
                prev = key;
            }
        }
    }

    fn find<Q>(&self, key: &Q) -> Link<K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        unsafe { node::find(self.root, key) }
    }

    fn unlink_node(&mut self, node_ptr: NodePtr<K, V>) {
        unsafe {
            // Check if node to-unlink has right sub tree
            if let Some(mut min_child_ptr) = node_ptr.as_ref().right {
                // Find smallest child node in right sub tree
                let mut min_child_parent_ptr = node_ptr;
                while let Some(left_ptr) = min_child_ptr.as_ref().left {
                    min_child_parent_ptr = min_child_ptr;
                    min_child_ptr = left_ptr;
                }

                // Smallest child node is stem or leaf, unlink from tree
                debug_assert!(min_child_ptr.as_ref().left.is_none());
                let shrunk_side = if min_child_parent_ptr == node_ptr {
                    min_child_parent_ptr.as_mut().right = min_child_ptr.as_ref().right;
                    Side::Right
                } else {
                    min_child_parent_ptr.as_mut().left = min_child_ptr.as_ref().right;
                    Side::Left
                };
                if let Some(mut right_ptr) = min_child_ptr.as_ref().right {
                    right_ptr.as_mut().parent = Some(min_child_parent_ptr);
                }

                // Replace node to-unlink by smallest child node (up to 6 links)
                min_child_ptr.as_mut().left = node_ptr.as_ref().left;
                if let Some(mut left_ptr) = node_ptr.as_ref().left {
                    left_ptr.as_mut().parent = Some(min_child_ptr);
                }

                min_child_ptr.as_mut().right = node_ptr.as_ref().right;
                if let Some(mut right_ptr) = node_ptr.as_ref().right {
                    right_ptr.as_mut().parent = Some(min_child_ptr);
                }

                min_child_ptr.as_mut().parent = node_ptr.as_ref().parent;
                min_child_ptr.as_mut().balance = node_ptr.as_ref().balance;
                node::replace_child(&mut self.root, node_ptr, Some(min_child_ptr));

                // Parent of smallest child node lost height on one side
                let mut rebalance_from = min_child_parent_ptr;
                if rebalance_from == node_ptr {
                    // Parent is node to-unlink and has been replaced by smallest child
                    rebalance_from = min_child_ptr;
                }
                self.rebalance_after_remove(rebalance_from, shrunk_side);
            } else {
                // Node to-unlink is stem or leaf, unlink from tree.
                debug_assert!(node_ptr.as_ref().right.is_none());
                let left = node_ptr.as_ref().left;
                if let Some(mut left_ptr) = left {
                    left_ptr.as_mut().parent = node_ptr.as_ref().parent;
                }
                if let Some(parent_ptr) = node_ptr.as_ref().parent {
                    let shrunk_side = if parent_ptr.as_ref().left == Some(node_ptr) {
                        Side::Left
                    } else {
                        Side::Right
                    };
                    node::replace_child(&mut self.root, node_ptr, left);
                    self.rebalance_after_remove(parent_ptr, shrunk_side);
                } else {
                    self.root = left;
                }
            }
        }
    }

    /// Walks up from the parent of a new leaf, updating balance factors.
    /// Stops as soon as a subtree keeps its height: either its balance became 0,
    /// or a single or double rotation restored it.
    fn rebalance_after_insert(&mut self, start_from: NodePtr<K, V>, grown_side: Side) {
        let mut current = Some(start_from);
        let mut side = grown_side;
        while let Some(mut node_ptr) = current {
            unsafe {
                node_ptr.as_mut().balance += match side {
                    Side::Left => 1,
                    Side::Right => -1,
                };
                match node_ptr.as_ref().balance {
                    0 => return,
                    2 => {
                        if let Some(left_ptr) = node_ptr.as_ref().left {
                            if left_ptr.as_ref().balance == 1 {
                                self.rotate_right(node_ptr);
                            } else {
                                self.rotate_left_right(node_ptr);
                            }
                        }
                        return;
                    }
                    -2 => {
                        if let Some(right_ptr) = node_ptr.as_ref().right {
                            if right_ptr.as_ref().balance == -1 {
                                self.rotate_left(node_ptr);
                            } else {
                                self.rotate_right_left(node_ptr);
                            }
                        }
                        return;
                    }
                    _ => {}
                }

                current = node_ptr.as_ref().parent;
                if let Some(parent_ptr) = current {
                    side = Self::side_of(parent_ptr, node_ptr);
                }
            }
        }
    }

    /// Walks up from the node whose `shrunk_side` lost one level of height.
    /// Unlike insertion this may continue all the way to the root, since a
    /// rotation can shrink the rotated subtree once more.
    fn rebalance_after_remove(&mut self, start_from: NodePtr<K, V>, shrunk_side: Side) {
        let mut current = Some(start_from);
        let mut side = shrunk_side;
        while let Some(mut node_ptr) = current {
            unsafe {
                node_ptr.as_mut().balance += match side {
                    Side::Left => -1,
                    Side::Right => 1,
                };
                match node_ptr.as_ref().balance {
                    2 => {
                        let left_balance = match node_ptr.as_ref().left {
                            Some(left_ptr) => left_ptr.as_ref().balance,
                            None => return,
                        };
                        if left_balance >= 0 {
                            node_ptr = self.rotate_right(node_ptr);
                            if node_ptr.as_ref().balance == -1 {
                                // Subtree height unchanged
                                return;
                            }
                        } else {
                            node_ptr = self.rotate_left_right(node_ptr);
                        }
                    }
                    -2 => {
                        let right_balance = match node_ptr.as_ref().right {
                            Some(right_ptr) => right_ptr.as_ref().balance,
                            None => return,
                        };
                        if right_balance <= 0 {
                            node_ptr = self.rotate_left(node_ptr);
                            if node_ptr.as_ref().balance == 1 {
                                return;
                            }
                        } else {
                            node_ptr = self.rotate_right_left(node_ptr);
                        }
                    }
                    0 => {}
                    // One side is still as tall as before
                    _ => return,
                }

                current = node_ptr.as_ref().parent;
                if let Some(parent_ptr) = current {
                    side = Self::side_of(parent_ptr, node_ptr);
                }
            }
        }
    }

    fn side_of(parent_ptr: NodePtr<K, V>, child_ptr: NodePtr<K, V>) -> Side {
        if unsafe { parent_ptr.as_ref().left } == Some(child_ptr) {
            Side::Left
        } else {
            Side::Right
        }
    }

    // Single rotations are only applied to a node with balance -2 / +2.
    fn rotate_left(&mut self, mut node_ptr: NodePtr<K, V>) -> NodePtr<K, V> {
        trace!("avl: rotate left");
        unsafe {
            let mut right_ptr = node::rotate_left(&mut self.root, node_ptr);
            right_ptr.as_mut().balance += 1;
            node_ptr.as_mut().balance = -right_ptr.as_ref().balance;
            right_ptr
        }
    }

    fn rotate_right(&mut self, mut node_ptr: NodePtr<K, V>) -> NodePtr<K, V> {
        trace!("avl: rotate right");
        unsafe {
            let mut left_ptr = node::rotate_right(&mut self.root, node_ptr);
            left_ptr.as_mut().balance -= 1;
            node_ptr.as_mut().balance = -left_ptr.as_ref().balance;
            left_ptr
        }
    }

    fn rotate_left_right(&mut self, mut node_ptr: NodePtr<K, V>) -> NodePtr<K, V> {
        trace!("avl: rotate left-right");
        unsafe {
            let mut left_ptr = match node_ptr.as_ref().left {
                Some(left_ptr) => left_ptr,
                None => return node_ptr,
            };
            node::rotate_left(&mut self.root, left_ptr);
            let mut pivot_ptr = node::rotate_right(&mut self.root, node_ptr);

            let (node_balance, left_balance) = match pivot_ptr.as_ref().balance {
                -1 => (0, 1),
                0 => (0, 0),
                _ => (-1, 0),
            };
            node_ptr.as_mut().balance = node_balance;
            left_ptr.as_mut().balance = left_balance;
            pivot_ptr.as_mut().balance = 0;
            pivot_ptr
        }
    }

    fn rotate_right_left(&mut self, mut node_ptr: NodePtr<K, V>) -> NodePtr<K, V> {
        trace!("avl: rotate right-left");
        unsafe {
            let mut right_ptr = match node_ptr.as_ref().right {
                Some(right_ptr) => right_ptr,
                None => return node_ptr,
            };
            node::rotate_right(&mut self.root, right_ptr);
            let mut pivot_ptr = node::rotate_left(&mut self.root, node_ptr);

            let (node_balance, right_balance) = match pivot_ptr.as_ref().balance {
                1 => (0, -1),
                0 => (0, 0),
                _ => (1, 0),
            };
            node_ptr.as_mut().balance = node_balance;
            right_ptr.as_mut().balance = right_balance;
            pivot_ptr.as_mut().balance = 0;
            pivot_ptr
        }
    }
}

impl<K, V> Drop for AvlTree<K, V> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K, V> Default for AvlTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone, V: Clone> Clone for AvlTree<K, V> {
    fn clone(&self) -> Self {
        self.iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for AvlTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<K: Ord, V> Extend<(K, V)> for AvlTree<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V> IntoIterator for &'a AvlTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> Node<K, V> {
    fn create(parent: Link<K, V>, key: K, value: V) -> NodePtr<K, V> {
        let boxed = Box::new(Node {
            key,
            value,
            parent,
            left: None,
            right: None,
            balance: 0,
        });
        NonNull::from(Box::leak(boxed))
    }

    unsafe fn destroy(node_ptr: NodePtr<K, V>) -> Box<Node<K, V>> {
        Box::from_raw(node_ptr.as_ptr())
    }
}

impl<K, V> TreeNode for Node<K, V> {
    type Key = K;
    type Value = V;

    fn key(&self) -> &K {
        &self.key
    }

    fn value(&self) -> &V {
        &self.value
    }

    fn left(&self) -> Link<K, V> {
        self.left
    }

    fn right(&self) -> Link<K, V> {
        self.right
    }

    fn parent(&self) -> Link<K, V> {
        self.parent
    }

    fn set_left(&mut self, link: Link<K, V>) {
        self.left = link;
    }

    fn set_right(&mut self, link: Link<K, V>) {
        self.right = link;
    }

    fn set_parent(&mut self, link: Link<K, V>) {
        self.parent = link;
    }
}
