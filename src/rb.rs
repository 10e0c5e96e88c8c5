//! The red-black engine.
//!
//! Missing children are plain `None` links and count as black leaves through
//! [`color_of`]; there is no shared sentinel node that rotations could scribble on.

use std::borrow::Borrow;
use std::fmt;
use std::iter::FromIterator;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

use log::{debug, trace};

use crate::iter::Iter;
use crate::node::{self, InsertPos, Side, TreeNode};

/// An ordered map implemented with a red-black tree.
///
/// ```
/// use treedict::RbTree;
/// let mut tree = RbTree::new();
/// for key in 1..=1000 {
///     tree.insert(key, ());
/// }
/// assert!(tree.height() <= 20);
/// ```
pub struct RbTree<K, V> {
    root: Link<K, V>,
    num_nodes: usize,
    marker: PhantomData<Box<Node<K, V>>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Color {
    Red,
    Black,
}

pub(crate) struct Node<K, V> {
    key: K,
    value: V,
    left: Link<K, V>,
    right: Link<K, V>,
    parent: Link<K, V>,
    color: Color,
}

type NodePtr<K, V> = NonNull<Node<K, V>>;
type Link<K, V> = Option<NodePtr<K, V>>;

unsafe impl<K: Send, V: Send> Send for RbTree<K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for RbTree<K, V> {}

fn color_of<K, V>(link: Link<K, V>) -> Color {
    match link {
        None => Color::Black,
        Some(node_ptr) => unsafe { node_ptr.as_ref().color },
    }
}

fn is_red<K, V>(link: Link<K, V>) -> bool {
    color_of(link) == Color::Red
}

fn set_color<K, V>(link: Link<K, V>, color: Color) {
    // A missing leaf is black by definition and has nothing to paint.
    if let Some(mut node_ptr) = link {
        unsafe { node_ptr.as_mut().color = color };
    }
}

impl<K, V> RbTree<K, V> {
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
            debug!("rb: clearing {} entries", self.num_nodes);
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
    pub(crate) fn paint_root(&mut self, color: Color) {
        set_color(self.root, color);
    }

    /// Gets an iterator over the entries of the tree in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::red_black(self.root, self.num_nodes)
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

impl<K: Ord, V> RbTree<K, V> {
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
    /// old value is returned; colors and links are left alone.
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
                    },
                }
                self.insert_fixup(new_ptr);
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
            if let Some(root_ptr) = self.root {
                assert!(root_ptr.as_ref().parent.is_none());
                assert_eq!(root_ptr.as_ref().color, Color::Black);
            }

            // Black heights of finished subtrees, counting the implicit leaves
            let mut black_heights: Vec<usize> = Vec::new();
            let mut num_nodes = 0;
            node::traverse(self.root, |_| {}, |_| {}, |node_ptr| {
                let node = node_ptr.as_ref();

                let right_black_height = match node.right {
                    Some(right_ptr) => {
                        assert!(right_ptr.as_ref().parent == Some(node_ptr));
                        assert!(right_ptr.as_ref().key > node.key);
                        black_heights.pop().expect("missing right black height")
                    }
                    None => 1,
                };
                let left_black_height = match node.left {
                    Some(left_ptr) => {
                        assert!(left_ptr.as_ref().parent == Some(node_ptr));
                        assert!(left_ptr.as_ref().key < node.key);
                        black_heights.pop().expect("missing left black height")
                    }
                    None => 1,
                };
                assert_eq!(left_black_height, right_black_height);

                // No red node has a red child
                if node.color == Color::Red {
                    assert!(!is_red(node.left));
                    assert!(!is_red(node.right));
                }

                black_heights.push(match node.color {
                    Color::Black => left_black_height + 1,
                    Color::Red => left_black_height,
                });
                num_nodes += 1;
            });

            assert_eq!(num_nodes, self.num_nodes);
            assert_eq!(black_heights.len(), usize::from(self.root.is_some()));
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

    /// Restores the color rules after `node_ptr` was attached as a red leaf.
    fn insert_fixup(&mut self, mut node_ptr: NodePtr<K, V>) {
        unsafe {
            while let Some(mut parent_ptr) = node_ptr.as_ref().parent {
                if parent_ptr.as_ref().color == Color::Black {
                    break;
                }
                // A red parent is never the root, so the grandparent exists.
                let mut grandparent_ptr = match parent_ptr.as_ref().parent {
                    Some(grandparent_ptr) => grandparent_ptr,
                    None => break,
                };

                let parent_side = Self::side_of(grandparent_ptr, parent_ptr);
                let uncle = match parent_side {
                    Side::Left => grandparent_ptr.as_ref().right,
                    Side::Right => grandparent_ptr.as_ref().left,
                };

                if is_red(uncle) {
                    trace!("rb insert: red uncle, recolor and climb");
                    parent_ptr.as_mut().color = Color::Black;
                    set_color(uncle, Color::Black);
                    grandparent_ptr.as_mut().color = Color::Red;
                    node_ptr = grandparent_ptr;
                    continue;
                }

                if Self::side_of(parent_ptr, node_ptr) != parent_side {
                    // Inner grandchild: turn it into an outer one.
                    trace!("rb insert: inner grandchild, rotate parent");
                    match parent_side {
                        Side::Left => node::rotate_left(&mut self.root, parent_ptr),
                        Side::Right => node::rotate_right(&mut self.root, parent_ptr),
                    };
                    mem::swap(&mut node_ptr, &mut parent_ptr);
                }

                trace!("rb insert: outer grandchild, rotate grandparent");
                parent_ptr.as_mut().color = Color::Black;
                grandparent_ptr.as_mut().color = Color::Red;
                match parent_side {
                    Side::Left => node::rotate_right(&mut self.root, grandparent_ptr),
                    Side::Right => node::rotate_left(&mut self.root, grandparent_ptr),
                };
                break;
            }
        }
        set_color(self.root, Color::Black);
    }

    /// Moves `replacement` into the position held by `node_ptr`.
    fn transplant(&mut self, node_ptr: NodePtr<K, V>, replacement: Link<K, V>) {
        unsafe {
            node::replace_child(&mut self.root, node_ptr, replacement);
            if let Some(mut replacement_ptr) = replacement {
                replacement_ptr.as_mut().parent = node_ptr.as_ref().parent;
            }
        }
    }

    fn unlink_node(&mut self, node_ptr: NodePtr<K, V>) {
        unsafe {
            let node = node_ptr.as_ref();
            // The node that takes over the structurally removed position,
            // tracked together with its parent since it may be an empty leaf.
            let fill: Link<K, V>;
            let fill_parent: Link<K, V>;
            let removed_color: Color;

            match (node.left, node.right) {
                (None, right) => {
                    fill = right;
                    fill_parent = node.parent;
                    removed_color = node.color;
                    self.transplant(node_ptr, right);
                }
                (left, None) => {
                    fill = left;
                    fill_parent = node.parent;
                    removed_color = node.color;
                    self.transplant(node_ptr, left);
                }
                (Some(mut left_ptr), Some(mut right_ptr)) => {
                    // Splice in the in-order successor; its own color is what
                    // disappears from the tree.
                    let mut successor_ptr = node::leftmost(right_ptr);
                    removed_color = successor_ptr.as_ref().color;
                    fill = successor_ptr.as_ref().right;

                    if successor_ptr == right_ptr {
                        fill_parent = Some(successor_ptr);
                    } else {
                        fill_parent = successor_ptr.as_ref().parent;
                        self.transplant(successor_ptr, fill);
                        successor_ptr.as_mut().right = Some(right_ptr);
                        right_ptr.as_mut().parent = Some(successor_ptr);
                    }

                    self.transplant(node_ptr, Some(successor_ptr));
                    successor_ptr.as_mut().left = Some(left_ptr);
                    left_ptr.as_mut().parent = Some(successor_ptr);
                    successor_ptr.as_mut().color = node.color;
                }
            }

            if removed_color == Color::Black {
                self.remove_fixup(fill, fill_parent);
            }
        }
    }

    /// Restores equal black heights after a black node was taken out above `node`.
    /// `node` carries an extra black; `parent` locates it when it is an empty leaf.
    fn remove_fixup(&mut self, mut node: Link<K, V>, mut parent: Link<K, V>) {
        unsafe {
            while node != self.root && !is_red(node) {
                let mut parent_ptr = match parent {
                    Some(parent_ptr) => parent_ptr,
                    None => break,
                };
                let side = if parent_ptr.as_ref().left == node {
                    Side::Left
                } else {
                    Side::Right
                };
                // The doubly black side is one black shorter, so a sibling exists.
                let sibling_of = |parent_ptr: NodePtr<K, V>| match side {
                    Side::Left => parent_ptr.as_ref().right,
                    Side::Right => parent_ptr.as_ref().left,
                };
                let mut sibling_ptr = match sibling_of(parent_ptr) {
                    Some(sibling_ptr) => sibling_ptr,
                    None => break,
                };

                if sibling_ptr.as_ref().color == Color::Red {
                    trace!("rb remove: red sibling, rotate parent");
                    sibling_ptr.as_mut().color = Color::Black;
                    parent_ptr.as_mut().color = Color::Red;
                    self.rotate_toward(side, parent_ptr);
                    sibling_ptr = match sibling_of(parent_ptr) {
                        Some(sibling_ptr) => sibling_ptr,
                        None => break,
                    };
                }

                let (near, far) = match side {
                    Side::Left => (sibling_ptr.as_ref().left, sibling_ptr.as_ref().right),
                    Side::Right => (sibling_ptr.as_ref().right, sibling_ptr.as_ref().left),
                };

                if !is_red(near) && !is_red(far) {
                    trace!("rb remove: black nephews, recolor and climb");
                    sibling_ptr.as_mut().color = Color::Red;
                    node = Some(parent_ptr);
                    parent = parent_ptr.as_ref().parent;
                    continue;
                }

                if !is_red(far) {
                    trace!("rb remove: black far nephew, rotate sibling");
                    set_color(near, Color::Black);
                    sibling_ptr.as_mut().color = Color::Red;
                    self.rotate_away(side, sibling_ptr);
                    sibling_ptr = match sibling_of(parent_ptr) {
                        Some(sibling_ptr) => sibling_ptr,
                        None => break,
                    };
                }

                trace!("rb remove: red far nephew, rotate parent");
                sibling_ptr.as_mut().color = parent_ptr.as_ref().color;
                parent_ptr.as_mut().color = Color::Black;
                let far = match side {
                    Side::Left => sibling_ptr.as_ref().right,
                    Side::Right => sibling_ptr.as_ref().left,
                };
                set_color(far, Color::Black);
                self.rotate_toward(side, parent_ptr);
                node = self.root;
                parent = None;
            }
        }
        set_color(node, Color::Black);
    }

    // Rotates `node_ptr` down toward `side`.
    fn rotate_toward(&mut self, side: Side, node_ptr: NodePtr<K, V>) {
        unsafe {
            match side {
                Side::Left => node::rotate_left(&mut self.root, node_ptr),
                Side::Right => node::rotate_right(&mut self.root, node_ptr),
            };
        }
    }

    // Rotates `node_ptr` down away from `side`.
    fn rotate_away(&mut self, side: Side, node_ptr: NodePtr<K, V>) {
        unsafe {
            match side {
                Side::Left => node::rotate_right(&mut self.root, node_ptr),
                Side::Right => node::rotate_left(&mut self.root, node_ptr),
            };
        }
    }

    fn side_of(parent_ptr: NodePtr<K, V>, child_ptr: NodePtr<K, V>) -> Side {
        if unsafe { parent_ptr.as_ref().left } == Some(child_ptr) {
            Side::Left
        } else {
            Side::Right
        }
    }
}

impl<K, V> Drop for RbTree<K, V> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K, V> Default for RbTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone, V: Clone> Clone for RbTree<K, V> {
    fn clone(&self) -> Self {
        self.iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for RbTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for RbTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<K: Ord, V> Extend<(K, V)> for RbTree<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V> IntoIterator for &'a RbTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> Node<K, V> {
    // New nodes enter the tree red.
    fn create(parent: Link<K, V>, key: K, value: V) -> NodePtr<K, V> {
        let boxed = Box::new(Node {
            key,
            value,
            parent,
            left: None,
            right: None,
            color: Color::Red,
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
