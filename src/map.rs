//! An ordered map that dispatches to the engine chosen at construction.

use std::borrow::Borrow;
use std::fmt;
use std::iter::FromIterator;
use std::ops::Index;
use std::str::FromStr;

use log::debug;

use crate::avl::AvlTree;
use crate::error::Error;
use crate::iter::Iter;
use crate::rb::RbTree;

/// Selects the balancing engine behind a [`TreeMap`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TreeKind {
    #[default]
    Avl,
    RedBlack,
}

impl fmt::Display for TreeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeKind::Avl => f.write_str("avl"),
            TreeKind::RedBlack => f.write_str("rb"),
        }
    }
}

impl FromStr for TreeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "avl" => Ok(TreeKind::Avl),
            "rb" | "red-black" | "redblack" => Ok(TreeKind::RedBlack),
            _ => Err(Error::UnknownTreeKind(s.to_owned())),
        }
    }
}

enum Engine<K, V> {
    Avl(AvlTree<K, V>),
    RedBlack(RbTree<K, V>),
}

/// A key-unique ordered map backed by either an AVL or a red-black tree.
///
/// ```
/// use treedict::{TreeKind, TreeMap};
/// let mut map = TreeMap::new(TreeKind::RedBlack);
/// map.insert(2, "b");
/// map.insert(1, "a");
/// assert_eq!(map.value_of(&1), Ok(&"a"));
/// assert!(map.value_of(&3).is_err());
/// assert_eq!(map.keys().copied().collect::<Vec<_>>(), [1, 2]);
/// ```
pub struct TreeMap<K, V> {
    engine: Engine<K, V>,
}

impl<K, V> TreeMap<K, V> {
    /// Creates an empty map using the given engine.
    pub fn new(kind: TreeKind) -> Self {
        debug!("creating {kind} tree map");
        let engine = match kind {
            TreeKind::Avl => Engine::Avl(AvlTree::new()),
            TreeKind::RedBlack => Engine::RedBlack(RbTree::new()),
        };
        Self { engine }
    }

    /// Returns the engine this map was created with.
    pub fn kind(&self) -> TreeKind {
        match &self.engine {
            Engine::Avl(_) => TreeKind::Avl,
            Engine::RedBlack(_) => TreeKind::RedBlack,
        }
    }

    /// Returns true if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        match &self.engine {
            Engine::Avl(tree) => tree.len(),
            Engine::RedBlack(tree) => tree.len(),
        }
    }

    /// Returns the number of levels in the underlying tree.
    pub fn height(&self) -> usize {
        match &self.engine {
            Engine::Avl(tree) => tree.height(),
            Engine::RedBlack(tree) => tree.height(),
        }
    }

    /// Clears the map, deallocating all memory.
    pub fn clear(&mut self) {
        match &mut self.engine {
            Engine::Avl(tree) => tree.clear(),
            Engine::RedBlack(tree) => tree.clear(),
        }
    }

    /// Gets an iterator over the entries of the map in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        match &self.engine {
            Engine::Avl(tree) => tree.iter(),
            Engine::RedBlack(tree) => tree.iter(),
        }
    }

    /// Gets an iterator over the keys of the map in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Gets an iterator over the values of the map in ascending key order.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, value)| value)
    }
}

impl<K: Ord, V> TreeMap<K, V> {
    /// Inserts or overwrites the value for `key`.
    /// Returns the previous value if the key was already present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match &mut self.engine {
            Engine::Avl(tree) => tree.insert(key, value),
            Engine::RedBlack(tree) => tree.insert(key, value),
        }
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match &self.engine {
            Engine::Avl(tree) => tree.get(key),
            Engine::RedBlack(tree) => tree.get(key),
        }
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match &mut self.engine {
            Engine::Avl(tree) => tree.get_mut(key),
            Engine::RedBlack(tree) => tree.get_mut(key),
        }
    }

    /// Returns whether the key is present together with a copy of its value,
    /// or the default value if it is absent.
    pub fn try_get<Q>(&self, key: &Q) -> (bool, V)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
        V: Clone + Default,
    {
        match &self.engine {
            Engine::Avl(tree) => tree.search(key),
            Engine::RedBlack(tree) => tree.search(key),
        }
    }

    /// Returns the value for `key`, failing with [`Error::InvalidKey`] if it is absent.
    pub fn value_of<Q>(&self, key: &Q) -> Result<&V, Error>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).ok_or(Error::InvalidKey)
    }

    /// Overwrites the value of an existing key.
    /// Fails with [`Error::InvalidKey`] instead of inserting when the key is absent.
    pub fn set<Q>(&mut self, key: &Q, value: V) -> Result<(), Error>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let slot = self.get_mut(key).ok_or(Error::InvalidKey)?;
        *slot = value;
        Ok(())
    }

    /// Returns true if the map contains a value for the key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match &self.engine {
            Engine::Avl(tree) => tree.contains_key(key),
            Engine::RedBlack(tree) => tree.contains_key(key),
        }
    }

    /// Removes a key from the map.
    /// Returns the value at the key if the key was previously in the map.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match &mut self.engine {
            Engine::Avl(tree) => tree.remove(key),
            Engine::RedBlack(tree) => tree.remove(key),
        }
    }

    /// Removes a key from the map.
    /// Returns whether the key was previously in the map.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove(key).is_some()
    }

    /// Asserts that the internal tree structure is consistent.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        match &self.engine {
            Engine::Avl(tree) => tree.check_consistency(),
            Engine::RedBlack(tree) => tree.check_consistency(),
        }
    }
}

impl<K, V> Default for TreeMap<K, V> {
    fn default() -> Self {
        Self::new(TreeKind::default())
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for TreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for TreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V> Extend<(K, V)> for TreeMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V> IntoIterator for &'a TreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, Q, V> Index<&Q> for TreeMap<K, V>
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
{
    type Output = V;

    /// Returns a reference to the value corresponding to the supplied key.
    ///
    /// # Panics
    ///
    /// Panics with [`Error::InvalidKey`] if the key is not present in the map.
    fn index(&self, key: &Q) -> &V {
        match self.value_of(key) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}
