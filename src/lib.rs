//! # champ-rs
//!
//! A persistent hash set built on a Compressed Hash-Array Mapped Prefix-tree
//! (CHAMP), with a transient builder for batched in-place construction and
//! structural set algebra (union, intersection, difference) that reuses
//! unchanged subtrees of its operands.
//!
//! Based on "Optimizing Hash-Array Mapped Tries for Fast and Lean Immutable
//! JVM Collections" (OOPSLA 2015, Steindorfer and Vinju).
//!
//! ## Example
//!
//! ```rust
//! use champ_rs::ChampSet;
//!
//! let abc: ChampSet<&str> = ["a", "b", "c"].into_iter().collect();
//! assert_eq!(abc.len(), 3);
//!
//! let ac = abc.remove("b");
//! assert!(!ac.contains("b"));
//!
//! let cd = ChampSet::pair("c", "d");
//! assert_eq!(ac.union(&cd), ChampSet::from(["a", "c", "d"]));
//! assert_eq!(ac.intersect(&cd), ChampSet::singleton("c"));
//! assert_eq!(ac.subtract(&cd), ChampSet::singleton("a"));
//!
//! // Unchanged results share the receiver's trie.
//! assert!(abc.insert("a").ptr_eq(&abc));
//! ```

#![forbid(unsafe_code)]

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHasher;
use thiserror::Error;
use tracing::{debug, trace};

mod iter;
mod merge;
mod node;

pub use iter::Iter;

use iter::NodeIter;
use merge::{Merged, Preference};
use node::{Delta, Edit, Node, Owner};

// =============================================================================
// Configuration
// =============================================================================

/// Number of hash bits consumed before elements fall into a collision node.
const HASH_CODE_LENGTH: u32 = 32;
/// Hash bits consumed per trie level.
const BIT_PARTITION_SIZE: u32 = 5;
const BIT_PARTITION_MASK: u32 = 0b11111;
/// Levels of bitmap-indexed nodes: `ceil(32 / 5)`.
const MAX_DEPTH: usize = 7;

// =============================================================================
// Hashing
// =============================================================================

/// 32-bit element hash. The hasher is fixed so that independently built sets
/// partition their elements identically.
#[inline]
fn hash_of<Q: Hash + ?Sized>(value: &Q) -> u32 {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    let hash = hasher.finish();
    (hash ^ (hash >> 32)) as u32
}

// =============================================================================
// Errors and comparators
// =============================================================================

/// Errors reported by [`TransientSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransientError {
    /// The transient was frozen; it only answers queries from now on.
    #[error("transient set has already been frozen")]
    Frozen,
}

/// Caller-supplied notion of element equivalence.
///
/// Equivalent elements must produce the same [`Hash`] output; otherwise
/// lookups may miss them.
pub trait Equivalence<T: ?Sized> {
    /// Returns `true` if `a` and `b` denote the same element.
    fn equivalent(&self, a: &T, b: &T) -> bool;
}

impl<T: ?Sized, F> Equivalence<T> for F
where
    F: Fn(&T, &T) -> bool,
{
    #[inline]
    fn equivalent(&self, a: &T, b: &T) -> bool {
        self(a, b)
    }
}

#[inline]
fn equality<T: Eq>(a: &T, b: &T) -> bool {
    a == b
}

// =============================================================================
// ChampSet
// =============================================================================

/// An immutable hash set with structural sharing.
///
/// Cloning is O(1). Every "mutating" operation returns a new set; when nothing
/// changed the returned set shares the receiver's trie (see [`ChampSet::ptr_eq`]).
pub struct ChampSet<T> {
    root: Arc<Node<T>>,
    size: usize,
    hash: u32,
}

impl<T> ChampSet<T> {
    pub fn new() -> Self {
        Self {
            root: Arc::new(Node::empty()),
            size: 0,
            hash: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Order-independent hash code: the wrapping sum of the element hashes.
    #[inline]
    pub fn hash_code(&self) -> u32 {
        self.hash
    }

    /// Returns `true` if both sets share the same trie.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.root, self.size)
    }

    /// Publishes a merge result, reading its aggregates from the root node.
    fn from_root(root: Arc<Node<T>>) -> Self {
        if root.size() == 0 {
            return Self::new();
        }
        let set = Self {
            size: root.size(),
            hash: root.hash_code(),
            root,
        };
        debug_assert!(set.aggregates_hold(), "cached size or hash code diverged from trie contents");
        set
    }

    fn with_root(&self, root: Arc<Node<T>>, delta: Delta) -> Self {
        let set = Self {
            root,
            size: self.size.wrapping_add_signed(delta.size),
            hash: self.hash.wrapping_add(delta.hash),
        };
        debug_assert_eq!(set.size, set.root.size());
        debug_assert_eq!(set.hash, set.root.hash_code());
        set
    }

    /// Recounts size and hash code from scratch and compares them to the cached values.
    fn aggregates_hold(&self) -> bool {
        let (size, hash) = NodeIter::new(&self.root).fold((0usize, 0u32), |(size, hash), node| {
            (size + node.payload_arity(), hash.wrapping_add(node.local_hash_code()))
        });
        size == self.size && hash == self.hash
    }
}

impl<T: Hash + Eq> ChampSet<T> {
    /// Returns `true` if the set contains `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.root.find(hash_of(key), 0, &|stored: &T| stored.borrow() == key)
    }

    /// Returns `true` if the set contains an element equivalent to `key` under `eq`.
    pub fn contains_equivalent<E>(&self, key: &T, eq: &E) -> bool
    where
        E: Equivalence<T> + ?Sized,
    {
        self.get_equivalent(key, eq).is_some()
    }

    /// Returns the stored element equivalent to `key` under `eq`.
    pub fn get_equivalent<E>(&self, key: &T, eq: &E) -> Option<&T>
    where
        E: Equivalence<T> + ?Sized,
    {
        self.root.find(hash_of(key), 0, &|stored: &T| eq.equivalent(stored, key))
    }

    /// Returns `true` if every item is an element of the set.
    pub fn contains_all<'a, I>(&self, items: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        items.into_iter().all(|key| self.contains(key))
    }

    /// Returns `true` if every item has an equivalent element in the set.
    pub fn contains_all_equivalent<'a, I, E>(&self, items: I, eq: &E) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
        E: Equivalence<T> + ?Sized,
    {
        items.into_iter().all(|key| self.contains_equivalent(key, eq))
    }
}

impl<T: Hash + Eq + Clone> ChampSet<T> {
    pub fn singleton(key: T) -> Self {
        Self::new().insert(key)
    }

    /// Creates a set holding two elements, or one if they are equal.
    pub fn pair(a: T, b: T) -> Self {
        Self::new().insert(a).insert(b)
    }

    /// Builds a set from `items` through a transient.
    pub fn of<I: IntoIterator<Item = T>>(items: I) -> Self {
        items.into_iter().collect()
    }

    /// Returns a set that also contains `key`.
    pub fn insert(&self, key: T) -> Self {
        self.insert_equivalent(key, &equality::<T>)
    }

    /// Returns a set that also contains `key`, unless an element equivalent
    /// under `eq` is already present.
    pub fn insert_equivalent<E>(&self, key: T, eq: &E) -> Self
    where
        E: Equivalence<T> + ?Sized,
    {
        let hash = hash_of(&key);
        let mut root = Arc::clone(&self.root);
        match Node::insert(&mut root, None, key, hash, 0, eq) {
            Edit::Unchanged => self.clone(),
            Edit::Modified(delta) => self.with_root(root, delta),
        }
    }

    /// Returns a set without `key`.
    pub fn remove<Q>(&self, key: &Q) -> Self
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_matching(hash_of(key), &|stored: &T| stored.borrow() == key)
    }

    /// Returns a set without the element equivalent to `key` under `eq`.
    pub fn remove_equivalent<E>(&self, key: &T, eq: &E) -> Self
    where
        E: Equivalence<T> + ?Sized,
    {
        self.remove_matching(hash_of(key), &|stored: &T| eq.equivalent(stored, key))
    }

    fn remove_matching<F>(&self, hash: u32, matches: &F) -> Self
    where
        F: Fn(&T) -> bool + ?Sized,
    {
        let mut root = Arc::clone(&self.root);
        match Node::remove(&mut root, None, hash, 0, matches) {
            Edit::Unchanged => self.clone(),
            Edit::Modified(delta) => self.with_root(root, delta),
        }
    }

    /// Returns a set that also contains every item.
    pub fn insert_all<I: IntoIterator<Item = T>>(&self, items: I) -> Self {
        self.insert_all_equivalent(items, &equality::<T>)
    }

    /// Returns a set that also contains every item lacking an equivalent
    /// under `eq`.
    pub fn insert_all_equivalent<I, E>(&self, items: I, eq: &E) -> Self
    where
        I: IntoIterator<Item = T>,
        E: Equivalence<T> + ?Sized,
    {
        let mut transient = TransientSet::from_set(self);
        if transient.insert_all_owned(items, eq) {
            transient.into_set()
        } else {
            self.clone()
        }
    }

    /// Returns a set without any of the items.
    pub fn remove_all<'a, I>(&self, items: I) -> Self
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        self.remove_all_equivalent(items, &equality::<T>)
    }

    pub fn remove_all_equivalent<'a, I, E>(&self, items: I, eq: &E) -> Self
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
        E: Equivalence<T> + ?Sized,
    {
        let mut transient = TransientSet::from_set(self);
        if transient.remove_all_owned(items, eq) {
            transient.into_set()
        } else {
            self.clone()
        }
    }

    /// Returns a set holding only the elements also contained in `other`.
    pub fn retain_all(&self, other: &ChampSet<T>) -> Self {
        self.retain_all_equivalent(other, &equality::<T>)
    }

    /// Returns a set holding only the elements with an equivalent in `other`.
    /// Kept elements are this set's instances, not `other`'s.
    pub fn retain_all_equivalent<E>(&self, other: &ChampSet<T>, eq: &E) -> Self
    where
        E: Equivalence<T> + ?Sized,
    {
        let mut transient = TransientSet::from_set(self);
        if transient.retain_all_owned(other, eq) {
            transient.into_set()
        } else {
            self.clone()
        }
    }

    /// Opens a transient over this set's trie.
    pub fn as_transient(&self) -> TransientSet<T> {
        TransientSet::from_set(self)
    }

    /// Opens an empty transient.
    pub fn transient() -> TransientSet<T> {
        TransientSet::new()
    }

    /// Elements contained in either set.
    pub fn union(&self, other: &Self) -> Self {
        if self.ptr_eq(other) || other.is_empty() {
            trace!(left = self.size, right = other.size, "union short-circuit to left");
            return self.clone();
        }
        if self.is_empty() {
            trace!(left = self.size, right = other.size, "union short-circuit to right");
            return other.clone();
        }
        let merged = merge::union(&self.root, &other.root, 0, Preference::Indifferent);
        self.publish("union", other, merged)
    }

    /// Elements contained in both sets.
    pub fn intersect(&self, other: &Self) -> Self {
        if self.ptr_eq(other) {
            trace!(left = self.size, right = other.size, "intersect short-circuit to left");
            return self.clone();
        }
        if self.is_empty() || other.is_empty() {
            trace!(left = self.size, right = other.size, "intersect short-circuit to empty");
            return Self::new();
        }
        let merged = merge::intersect(&self.root, &other.root, 0, Preference::Indifferent);
        self.publish("intersect", other, merged)
    }

    /// Elements of `self` not contained in `other`.
    pub fn subtract(&self, other: &Self) -> Self {
        if self.ptr_eq(other) {
            trace!(left = self.size, right = other.size, "subtract short-circuit to empty");
            return Self::new();
        }
        if self.is_empty() || other.is_empty() {
            trace!(left = self.size, right = other.size, "subtract short-circuit to left");
            return self.clone();
        }
        let merged = merge::subtract(&self.root, &other.root, 0);
        self.publish("subtract", other, merged)
    }

    fn publish(&self, op: &'static str, other: &Self, merged: Merged<T>) -> Self {
        let reused = match merged {
            Merged::Left => "left",
            Merged::Right => "right",
            Merged::Both => "both",
            Merged::Built(_) => "none",
        };
        let result = Self::from_root(merged.resolve(&self.root, &other.root, Preference::Indifferent));
        trace!(
            op,
            reused,
            left = self.size,
            right = other.size,
            result = result.size,
            "set algebra"
        );
        result
    }
}

impl<T> Default for ChampSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ChampSet<T> {
    fn clone(&self) -> Self {
        Self {
            root: Arc::clone(&self.root),
            size: self.size,
            hash: self.hash,
        }
    }
}

/// Element-wise equality of two roots, settled by cached size and hash code
/// whenever they differ.
fn same_contents<T: Hash + Eq>(left: &Node<T>, right: &Node<T>) -> bool {
    if left.size() != right.size() || left.hash_code() != right.hash_code() {
        return false;
    }
    std::ptr::eq(left, right)
        || Iter::new(left, left.size()).all(|key| right.find(hash_of(key), 0, &|stored: &T| stored == key).is_some())
}

impl<T: Hash + Eq> PartialEq for ChampSet<T> {
    fn eq(&self, other: &Self) -> bool {
        same_contents(&self.root, &other.root)
    }
}

impl<T: Hash + Eq> Eq for ChampSet<T> {}

impl<T: Hash + Eq> Hash for ChampSet<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.hash);
    }
}

impl<T: fmt::Debug> fmt::Debug for ChampSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Hash + Eq + Clone> FromIterator<T> for ChampSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(items: I) -> Self {
        let mut transient = TransientSet::new();
        transient.insert_all_owned(items, &equality::<T>);
        transient.into_set()
    }
}

impl<T: Hash + Eq + Clone, const N: usize> From<[T; N]> for ChampSet<T> {
    fn from(items: [T; N]) -> Self {
        items.into_iter().collect()
    }
}

impl<'a, T> IntoIterator for &'a ChampSet<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

// =============================================================================
// TransientSet
// =============================================================================

/// A mutable builder over a CHAMP trie.
///
/// Nodes created or copied by a transient are stamped with its ownership
/// token and edited in place on later calls. Nodes shared with a published
/// [`ChampSet`] are never touched; they are copied on first write.
/// [`freeze`](TransientSet::freeze) retires the token and publishes the result.
pub struct TransientSet<T> {
    root: Arc<Node<T>>,
    size: usize,
    hash: u32,
    owner: Option<Owner>,
}

impl<T> TransientSet<T> {
    pub fn new() -> Self {
        Self {
            root: Arc::new(Node::empty()),
            size: 0,
            hash: 0,
            owner: Some(Owner::fresh()),
        }
    }

    fn from_set(set: &ChampSet<T>) -> Self {
        Self {
            root: Arc::clone(&set.root),
            size: set.size,
            hash: set.hash,
            owner: Some(Owner::fresh()),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Wrapping sum of the element hashes, as [`ChampSet::hash_code`].
    #[inline]
    pub fn hash_code(&self) -> u32 {
        self.hash
    }

    /// Returns `true` once [`freeze`](TransientSet::freeze) has been called.
    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.owner.is_none()
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.root, self.size)
    }

    /// Publishes the current contents as an immutable set and retires the
    /// ownership token. Every later mutation (or freeze) fails with
    /// [`TransientError::Frozen`].
    pub fn freeze(&mut self) -> Result<ChampSet<T>, TransientError> {
        self.owner("freeze")?;
        self.owner = None;
        debug!(size = self.size, "transient frozen");
        Ok(self.snapshot())
    }

    fn snapshot(&self) -> ChampSet<T> {
        ChampSet {
            root: Arc::clone(&self.root),
            size: self.size,
            hash: self.hash,
        }
    }

    /// Freezes a transient that never escaped this crate.
    fn into_set(mut self) -> ChampSet<T> {
        self.owner = None;
        self.snapshot()
    }

    fn owner(&self, op: &'static str) -> Result<Owner, TransientError> {
        self.owner.ok_or_else(|| {
            debug!(op, "mutation of a frozen transient rejected");
            TransientError::Frozen
        })
    }

    #[inline]
    fn apply(&mut self, delta: Delta) {
        self.size = self.size.wrapping_add_signed(delta.size);
        self.hash = self.hash.wrapping_add(delta.hash);
    }
}

impl<T: Hash + Eq> TransientSet<T> {
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.root.find(hash_of(key), 0, &|stored: &T| stored.borrow() == key)
    }

    /// Returns `true` if the transient contains an element equivalent to `key` under `eq`.
    pub fn contains_equivalent<E>(&self, key: &T, eq: &E) -> bool
    where
        E: Equivalence<T> + ?Sized,
    {
        self.get_equivalent(key, eq).is_some()
    }

    /// Returns the stored element equivalent to `key` under `eq`.
    pub fn get_equivalent<E>(&self, key: &T, eq: &E) -> Option<&T>
    where
        E: Equivalence<T> + ?Sized,
    {
        self.root.find(hash_of(key), 0, &|stored: &T| eq.equivalent(stored, key))
    }

    pub fn contains_all<'a, I>(&self, items: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        items.into_iter().all(|key| self.contains(key))
    }

    pub fn contains_all_equivalent<'a, I, E>(&self, items: I, eq: &E) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
        E: Equivalence<T> + ?Sized,
    {
        items.into_iter().all(|key| self.contains_equivalent(key, eq))
    }
}

impl<T: Hash + Eq + Clone> TransientSet<T> {
    /// Adds `key`. Returns `Ok(true)` if the transient changed.
    pub fn insert(&mut self, key: T) -> Result<bool, TransientError> {
        self.insert_equivalent(key, &equality::<T>)
    }

    /// Adds `key` unless an element equivalent under `eq` is present.
    pub fn insert_equivalent<E>(&mut self, key: T, eq: &E) -> Result<bool, TransientError>
    where
        E: Equivalence<T> + ?Sized,
    {
        let owner = self.owner("insert")?;
        Ok(self.insert_with(owner, key, eq))
    }

    /// Removes `key`. Returns `Ok(true)` if the transient changed.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<bool, TransientError>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let owner = self.owner("remove")?;
        Ok(self.remove_with(owner, hash_of(key), &|stored: &T| stored.borrow() == key))
    }

    /// Removes the element equivalent to `key` under `eq`.
    pub fn remove_equivalent<E>(&mut self, key: &T, eq: &E) -> Result<bool, TransientError>
    where
        E: Equivalence<T> + ?Sized,
    {
        let owner = self.owner("remove")?;
        Ok(self.remove_with(owner, hash_of(key), &|stored: &T| eq.equivalent(stored, key)))
    }

    /// Adds every item. Returns `Ok(true)` if any was new.
    pub fn insert_all<I: IntoIterator<Item = T>>(&mut self, items: I) -> Result<bool, TransientError> {
        self.insert_all_equivalent(items, &equality::<T>)
    }

    pub fn insert_all_equivalent<I, E>(&mut self, items: I, eq: &E) -> Result<bool, TransientError>
    where
        I: IntoIterator<Item = T>,
        E: Equivalence<T> + ?Sized,
    {
        self.owner("insert_all")?;
        Ok(self.insert_all_owned(items, eq))
    }

    /// Removes every item. Returns `Ok(true)` if any was present.
    pub fn remove_all<'a, I>(&mut self, items: I) -> Result<bool, TransientError>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        self.remove_all_equivalent(items, &equality::<T>)
    }

    /// Removes the element equivalent to each item under `eq`.
    pub fn remove_all_equivalent<'a, I, E>(&mut self, items: I, eq: &E) -> Result<bool, TransientError>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
        E: Equivalence<T> + ?Sized,
    {
        self.owner("remove_all")?;
        Ok(self.remove_all_owned(items, eq))
    }

    /// Keeps only the elements also contained in `other`.
    pub fn retain_all(&mut self, other: &ChampSet<T>) -> Result<bool, TransientError> {
        self.retain_all_equivalent(other, &equality::<T>)
    }

    /// Keeps only the elements with an equivalent in `other` under `eq`.
    pub fn retain_all_equivalent<E>(&mut self, other: &ChampSet<T>, eq: &E) -> Result<bool, TransientError>
    where
        E: Equivalence<T> + ?Sized,
    {
        self.owner("retain_all")?;
        Ok(self.retain_all_owned(other, eq))
    }

    fn insert_with<E>(&mut self, owner: Owner, key: T, eq: &E) -> bool
    where
        E: Equivalence<T> + ?Sized,
    {
        let hash = hash_of(&key);
        match Node::insert(&mut self.root, Some(owner), key, hash, 0, eq) {
            Edit::Unchanged => false,
            Edit::Modified(delta) => {
                self.apply(delta);
                true
            }
        }
    }

    fn remove_with<F>(&mut self, owner: Owner, hash: u32, matches: &F) -> bool
    where
        F: Fn(&T) -> bool + ?Sized,
    {
        match Node::remove(&mut self.root, Some(owner), hash, 0, matches) {
            Edit::Unchanged => false,
            Edit::Modified(delta) => {
                self.apply(delta);
                true
            }
        }
    }

    // The `*_owned` helpers assume the caller checked (or created) a live token.

    fn insert_all_owned<I, E>(&mut self, items: I, eq: &E) -> bool
    where
        I: IntoIterator<Item = T>,
        E: Equivalence<T> + ?Sized,
    {
        let Some(owner) = self.owner else {
            return false;
        };
        let mut changed = false;
        for key in items {
            changed |= self.insert_with(owner, key, eq);
        }
        changed
    }

    fn remove_all_owned<'a, I, E>(&mut self, items: I, eq: &E) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
        E: Equivalence<T> + ?Sized,
    {
        let Some(owner) = self.owner else {
            return false;
        };
        let mut changed = false;
        for key in items {
            changed |= self.remove_with(owner, hash_of(key), &|stored: &T| eq.equivalent(stored, key));
        }
        changed
    }

    fn retain_all_owned<E>(&mut self, other: &ChampSet<T>, eq: &E) -> bool
    where
        E: Equivalence<T> + ?Sized,
    {
        let Some(owner) = self.owner else {
            return false;
        };
        let doomed: Vec<T> = self
            .iter()
            .filter(|key| !other.contains_equivalent(key, eq))
            .cloned()
            .collect();
        for key in &doomed {
            self.remove_with(owner, hash_of(key), &|stored: &T| stored == key);
        }
        !doomed.is_empty()
    }
}

impl<T> Default for TransientSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq> PartialEq for TransientSet<T> {
    fn eq(&self, other: &Self) -> bool {
        same_contents(&self.root, &other.root)
    }
}

impl<T: Hash + Eq> PartialEq<ChampSet<T>> for TransientSet<T> {
    fn eq(&self, other: &ChampSet<T>) -> bool {
        same_contents(&self.root, &other.root)
    }
}

impl<T: Hash + Eq> PartialEq<TransientSet<T>> for ChampSet<T> {
    fn eq(&self, other: &TransientSet<T>) -> bool {
        same_contents(&self.root, &other.root)
    }
}

impl<T: fmt::Debug> fmt::Debug for TransientSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, T> IntoIterator for &'a TransientSet<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

#[cfg(test)]
mod proptests;
