//! Link plumbing shared by the AVL and red-black node models.
//!
//! Every tree owns its nodes through raw `NonNull` child links created with
//! `Box::leak`. The parent link is a plain back-pointer and never owns.
//! All helpers here assume the pointers they are given belong to a live tree
//! that is not being mutated elsewhere.

use std::borrow::Borrow;
use std::cell::Cell;
use std::cmp::Ordering;
use std::ptr::NonNull;

pub(crate) type Link<N> = Option<NonNull<N>>;

/// Read and relink access common to both node variants.
pub(crate) trait TreeNode: Sized {
    type Key;
    type Value;

    fn key(&self) -> &Self::Key;
    fn value(&self) -> &Self::Value;

    fn left(&self) -> Link<Self>;
    fn right(&self) -> Link<Self>;
    fn parent(&self) -> Link<Self>;

    fn set_left(&mut self, link: Link<Self>);
    fn set_right(&mut self, link: Link<Self>);
    fn set_parent(&mut self, link: Link<Self>);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

/// Outcome of descending the tree for an upsert.
pub(crate) enum InsertPos<N> {
    /// A node with an equal key already exists.
    Occupied(NonNull<N>),
    /// The key belongs below `parent` on `side` (or at the root if `parent` is `None`).
    Vacant { parent: Link<N>, side: Side },
}

/// Looks up the node holding `key`.
///
/// # Safety
///
/// `root` must be the root link of a live, well-formed tree.
pub(crate) unsafe fn find<N, Q>(root: Link<N>, key: &Q) -> Link<N>
where
    N: TreeNode,
    N::Key: Borrow<Q>,
    Q: Ord + ?Sized,
{
    let mut current = root;
    while let Some(node_ptr) = current {
        current = match key.cmp(node_ptr.as_ref().key().borrow()) {
            Ordering::Equal => break,
            Ordering::Less => node_ptr.as_ref().left(),
            Ordering::Greater => node_ptr.as_ref().right(),
        }
    }
    current
}

/// # Safety
///
/// `root` must be the root link of a live, well-formed tree.
pub(crate) unsafe fn find_insert_pos<N>(root: Link<N>, key: &N::Key) -> InsertPos<N>
where
    N: TreeNode,
    N::Key: Ord,
{
    let mut parent: Link<N> = None;
    let mut side = Side::Left;
    let mut current = root;
    while let Some(node_ptr) = current {
        parent = current;
        current = match key.cmp(node_ptr.as_ref().key()) {
            Ordering::Equal => return InsertPos::Occupied(node_ptr),
            Ordering::Less => {
                side = Side::Left;
                node_ptr.as_ref().left()
            }
            Ordering::Greater => {
                side = Side::Right;
                node_ptr.as_ref().right()
            }
        }
    }
    InsertPos::Vacant { parent, side }
}

/// # Safety
///
/// `node_ptr` must point to a live node.
pub(crate) unsafe fn leftmost<N: TreeNode>(mut node_ptr: NonNull<N>) -> NonNull<N> {
    while let Some(left_ptr) = node_ptr.as_ref().left() {
        node_ptr = left_ptr;
    }
    node_ptr
}

/// # Safety
///
/// `node_ptr` must point to a live node.
pub(crate) unsafe fn rightmost<N: TreeNode>(mut node_ptr: NonNull<N>) -> NonNull<N> {
    while let Some(right_ptr) = node_ptr.as_ref().right() {
        node_ptr = right_ptr;
    }
    node_ptr
}

/// Returns the next node in key order, walking parent links instead of a stack.
///
/// # Safety
///
/// `node_ptr` must point to a live node of a well-formed tree.
pub(crate) unsafe fn successor<N: TreeNode>(node_ptr: NonNull<N>) -> Link<N> {
    if let Some(right_ptr) = node_ptr.as_ref().right() {
        return Some(leftmost(right_ptr));
    }
    // Climb until we leave a left subtree; that ancestor is next.
    let mut child_ptr = node_ptr;
    while let Some(parent_ptr) = child_ptr.as_ref().parent() {
        if parent_ptr.as_ref().left() == Some(child_ptr) {
            return Some(parent_ptr);
        }
        child_ptr = parent_ptr;
    }
    None
}

/// Points whatever referenced `old_ptr` (its parent's child link, or the root) at `new`.
/// The parent link of `new` is left untouched.
///
/// # Safety
///
/// `old_ptr` must be a live node of the tree rooted at `root`.
pub(crate) unsafe fn replace_child<N: TreeNode>(
    root: &mut Link<N>,
    old_ptr: NonNull<N>,
    new: Link<N>,
) {
    match old_ptr.as_ref().parent() {
        None => *root = new,
        Some(mut parent_ptr) => {
            if parent_ptr.as_ref().left() == Some(old_ptr) {
                parent_ptr.as_mut().set_left(new);
            } else {
                parent_ptr.as_mut().set_right(new);
            }
        }
    }
}

/// Rotates the right child of `node_ptr` up into its place and returns it.
/// Only links are touched; engines adjust their own bookkeeping.
///
/// # Safety
///
/// `node_ptr` must be a live node of the tree rooted at `root` with a right child.
pub(crate) unsafe fn rotate_left<N: TreeNode>(
    root: &mut Link<N>,
    mut node_ptr: NonNull<N>,
) -> NonNull<N> {
    let mut right_ptr = match node_ptr.as_ref().right() {
        Some(right_ptr) => right_ptr,
        None => return node_ptr,
    };

    node_ptr.as_mut().set_right(right_ptr.as_ref().left());
    if let Some(mut right_left_ptr) = right_ptr.as_ref().left() {
        right_left_ptr.as_mut().set_parent(Some(node_ptr));
    }

    right_ptr.as_mut().set_parent(node_ptr.as_ref().parent());
    replace_child(root, node_ptr, Some(right_ptr));

    right_ptr.as_mut().set_left(Some(node_ptr));
    node_ptr.as_mut().set_parent(Some(right_ptr));
    right_ptr
}

/// Mirror image of [`rotate_left`].
///
/// # Safety
///
/// `node_ptr` must be a live node of the tree rooted at `root` with a left child.
pub(crate) unsafe fn rotate_right<N: TreeNode>(
    root: &mut Link<N>,
    mut node_ptr: NonNull<N>,
) -> NonNull<N> {
    let mut left_ptr = match node_ptr.as_ref().left() {
        Some(left_ptr) => left_ptr,
        None => return node_ptr,
    };

    node_ptr.as_mut().set_left(left_ptr.as_ref().right());
    if let Some(mut left_right_ptr) = left_ptr.as_ref().right() {
        left_right_ptr.as_mut().set_parent(Some(node_ptr));
    }

    left_ptr.as_mut().set_parent(node_ptr.as_ref().parent());
    replace_child(root, node_ptr, Some(left_ptr));

    left_ptr.as_mut().set_right(Some(node_ptr));
    node_ptr.as_mut().set_parent(Some(left_ptr));
    left_ptr
}

/// Number of levels below and including `link` (0 for an empty subtree).
///
/// # Safety
///
/// `link` must be empty or point into a live, well-formed tree.
pub(crate) unsafe fn height<N: TreeNode>(link: Link<N>) -> usize {
    let depth = Cell::new(0);
    let mut max_depth = 0;
    traverse(
        link,
        |_| {
            depth.set(depth.get() + 1);
            max_depth = max_depth.max(depth.get());
        },
        |_| {},
        |_| depth.set(depth.get() - 1),
    );
    max_depth
}

#[allow(clippy::enum_variant_names)]
enum Direction {
    FromParent,
    FromLeft,
    FromRight,
}

/// Visits the subtree at `start` without recursion or an auxiliary stack,
/// calling the three hooks in pre-, in- and post-order position.
///
/// The post-order hook may free the node it is handed: the walk reads the
/// parent link before calling it and never touches the node afterwards.
///
/// # Safety
///
/// `start` must be empty or point into a live, well-formed tree.
pub(crate) unsafe fn traverse<N, Pre, In, Post>(
    start: Link<N>,
    mut preorder: Pre,
    mut inorder: In,
    mut postorder: Post,
) where
    N: TreeNode,
    Pre: FnMut(NonNull<N>),
    In: FnMut(NonNull<N>),
    Post: FnMut(NonNull<N>),
{
    let mut node_ptr = match start {
        Some(node_ptr) => node_ptr,
        None => return,
    };
    let stop_at = node_ptr.as_ref().parent();
    let mut dir = Direction::FromParent;
    loop {
        match dir {
            Direction::FromParent => {
                preorder(node_ptr);
                if let Some(left_ptr) = node_ptr.as_ref().left() {
                    node_ptr = left_ptr;
                } else {
                    dir = Direction::FromLeft;
                }
            }
            Direction::FromLeft => {
                inorder(node_ptr);
                if let Some(right_ptr) = node_ptr.as_ref().right() {
                    node_ptr = right_ptr;
                    dir = Direction::FromParent;
                } else {
                    dir = Direction::FromRight;
                }
            }
            Direction::FromRight => {
                let parent = node_ptr.as_ref().parent();
                match parent {
                    Some(parent_ptr) if parent != stop_at => {
                        if Some(node_ptr) == parent_ptr.as_ref().left() {
                            dir = Direction::FromLeft;
                        } else {
                            dir = Direction::FromRight;
                        }
                        postorder(node_ptr);
                        node_ptr = parent_ptr;
                    }
                    _ => {
                        postorder(node_ptr);
                        break;
                    }
                }
            }
        }
    }
}
