//! Trie nodes.
//!
//! A CHAMP trie is made of two node kinds:
//!
//! - [`BitmapNode`]: 32-way branch. `data_map` marks positions holding an
//!   inline element, `node_map` marks positions holding a sub-node. Both live
//!   in one compact `content` array: inline elements first (in bitmap order),
//!   then sub-nodes in *reverse* bitmap order.
//! - [`CollisionNode`]: flat list of elements sharing one full 32-bit hash.
//!   Only reachable once every hash bit has been consumed.
//!
//! Structural edits go through a slot (`&mut Arc<Node<T>>`). A node is edited
//! in place only when it is stamped with the caller's [`Owner`] *and* the slot
//! holds the only reference to it; otherwise it is copied, the copy is stamped
//! with the caller's owner, and the slot is redirected to the copy.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::{Equivalence, BIT_PARTITION_MASK, BIT_PARTITION_SIZE, HASH_CODE_LENGTH};

// =============================================================================
// Bit utilities
// =============================================================================

/// 5-bit hash slice selecting one of 32 positions at depth `shift`.
#[inline]
pub(crate) fn mask(hash: u32, shift: u32) -> u32 {
    debug_assert!(shift < HASH_CODE_LENGTH);
    (hash >> shift) & BIT_PARTITION_MASK
}

/// One-hot encoding of `mask`.
#[inline]
pub(crate) fn bitpos(mask: u32) -> u32 {
    1 << mask
}

/// Dense index of `bitpos` within `bitmap` (number of occupied positions below it).
#[inline]
pub(crate) fn index(bitmap: u32, bitpos: u32) -> usize {
    (bitmap & (bitpos - 1)).count_ones() as usize
}

/// Iterates the set bits of `bitmap` as one-hot values, lowest first.
#[inline]
pub(crate) fn bits(bitmap: u32) -> impl Iterator<Item = u32> {
    let mut rest = bitmap;
    std::iter::from_fn(move || {
        if rest == 0 {
            return None;
        }
        let lsb = rest & rest.wrapping_neg();
        rest ^= lsb;
        Some(lsb)
    })
}

// =============================================================================
// Ownership token
// =============================================================================

/// Capability to edit nodes in place.
///
/// Every transient set draws a fresh token; tokens are never reused, so a
/// node stamped by a frozen transient can never be edited again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Owner(u64);

impl Owner {
    pub(crate) fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

// =============================================================================
// Edit results
// =============================================================================

/// Change to element count and additive hash code caused by an edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Delta {
    pub(crate) size: isize,
    pub(crate) hash: u32,
}

impl Delta {
    #[inline]
    pub(crate) fn insertion(hash: u32) -> Self {
        Self { size: 1, hash }
    }

    #[inline]
    pub(crate) fn removal(hash: u32) -> Self {
        Self {
            size: -1,
            hash: hash.wrapping_neg(),
        }
    }
}

/// Outcome of a single-element insert or remove.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Edit {
    Unchanged,
    Modified(Delta),
}

/// Coarse element count of a node, derived from its bitmaps alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SizePredicate {
    Empty,
    One,
    MoreThanOne,
}

// =============================================================================
// Node types
// =============================================================================

pub(crate) enum Node<T> {
    Bitmap(BitmapNode<T>),
    Collision(CollisionNode<T>),
}

/// One cell of a bitmap node's content array.
#[derive(Clone)]
pub(crate) enum Slot<T> {
    Key { key: T, hash: u32 },
    Node(Arc<Node<T>>),
}

/// What a bitmap node holds at one position.
pub(crate) enum Entry<'a, T> {
    Empty,
    Key(&'a T, u32),
    Node(&'a Arc<Node<T>>),
}

pub(crate) struct BitmapNode<T> {
    owner: Option<Owner>,
    data_map: u32,
    node_map: u32,
    content: Vec<Slot<T>>,
    /// Number of elements in this subtree.
    size: usize,
    /// Wrapping sum of the element hashes in this subtree.
    hash: u32,
}

pub(crate) struct CollisionNode<T> {
    hash: u32,
    keys: Vec<T>,
}

impl<T> BitmapNode<T> {
    pub(crate) fn empty() -> Self {
        Self {
            owner: None,
            data_map: 0,
            node_map: 0,
            content: Vec::new(),
            size: 0,
            hash: 0,
        }
    }

    pub(crate) fn singleton(owner: Option<Owner>, data_map: u32, key: T, hash: u32) -> Self {
        debug_assert_eq!(data_map.count_ones(), 1);
        Self {
            owner,
            data_map,
            node_map: 0,
            content: vec![Slot::Key { key, hash }],
            size: 1,
            hash,
        }
    }

    /// Assembles a node whose aggregates were already summed by the caller.
    pub(crate) fn from_parts(
        data_map: u32,
        node_map: u32,
        content: Vec<Slot<T>>,
        size: usize,
        hash: u32,
    ) -> Self {
        debug_assert_eq!(data_map & node_map, 0);
        debug_assert_eq!(
            (data_map.count_ones() + node_map.count_ones()) as usize,
            content.len()
        );
        Self {
            owner: None,
            data_map,
            node_map,
            content,
            size,
            hash,
        }
    }

    fn with_child(owner: Option<Owner>, node_map: u32, child: Arc<Node<T>>) -> Self {
        let size = child.size();
        let hash = child.hash_code();
        Self {
            owner,
            data_map: 0,
            node_map,
            content: vec![Slot::Node(child)],
            size,
            hash,
        }
    }

    #[inline]
    pub(crate) fn data_map(&self) -> u32 {
        self.data_map
    }

    #[inline]
    pub(crate) fn node_map(&self) -> u32 {
        self.node_map
    }

    #[cfg(test)]
    pub(crate) fn slots(&self) -> &[Slot<T>] {
        &self.content
    }

    #[inline]
    pub(crate) fn payload_arity(&self) -> usize {
        self.data_map.count_ones() as usize
    }

    #[inline]
    pub(crate) fn node_arity(&self) -> usize {
        self.node_map.count_ones() as usize
    }

    #[inline]
    fn data_index(&self, bitpos: u32) -> usize {
        index(self.data_map, bitpos)
    }

    #[inline]
    fn node_index(&self, bitpos: u32) -> usize {
        index(self.node_map, bitpos)
    }

    /// Content position of the `index`-th sub-node.
    #[inline]
    fn node_slot(&self, index: usize) -> usize {
        self.content.len() - 1 - index
    }

    pub(crate) fn key_entry(&self, index: usize) -> (&T, u32) {
        match &self.content[index] {
            Slot::Key { key, hash } => (key, *hash),
            Slot::Node(_) => panic!("content slot {index} holds a sub-node, not an element"),
        }
    }

    pub(crate) fn node(&self, index: usize) -> &Arc<Node<T>> {
        match &self.content[self.node_slot(index)] {
            Slot::Node(node) => node,
            Slot::Key { .. } => panic!("sub-node {index} is stored as an inline element"),
        }
    }

    fn node_mut(&mut self, index: usize) -> &mut Arc<Node<T>> {
        let slot = self.node_slot(index);
        match &mut self.content[slot] {
            Slot::Node(node) => node,
            Slot::Key { .. } => panic!("sub-node {index} is stored as an inline element"),
        }
    }

    pub(crate) fn entry(&self, bitpos: u32) -> Entry<'_, T> {
        if self.data_map & bitpos != 0 {
            let (key, hash) = self.key_entry(self.data_index(bitpos));
            Entry::Key(key, hash)
        } else if self.node_map & bitpos != 0 {
            Entry::Node(self.node(self.node_index(bitpos)))
        } else {
            Entry::Empty
        }
    }

    pub(crate) fn size_predicate(&self) -> SizePredicate {
        if self.node_map != 0 {
            return SizePredicate::MoreThanOne;
        }
        match self.payload_arity() {
            0 => SizePredicate::Empty,
            1 => SizePredicate::One,
            _ => SizePredicate::MoreThanOne,
        }
    }

    #[inline]
    fn apply(&mut self, delta: Delta) {
        self.size = self.size.wrapping_add_signed(delta.size);
        self.hash = self.hash.wrapping_add(delta.hash);
    }

    fn is_owned_by(&self, owner: Option<Owner>) -> bool {
        owner.is_some() && self.owner == owner
    }

    fn insert_key(&mut self, bitpos: u32, key: T, hash: u32) {
        let at = self.data_index(bitpos);
        self.content.insert(at, Slot::Key { key, hash });
        self.data_map |= bitpos;
        self.apply(Delta::insertion(hash));
    }

    fn remove_key(&mut self, bitpos: u32) {
        let at = self.data_index(bitpos);
        if let Slot::Key { hash, .. } = self.content.remove(at) {
            self.apply(Delta::removal(hash));
        }
        self.data_map ^= bitpos;
    }

    fn set_node(&mut self, index: usize, node: Arc<Node<T>>, delta: Delta) {
        let slot = self.node_slot(index);
        self.content[slot] = Slot::Node(node);
        self.apply(delta);
    }

    /// Replaces the inline element at `bitpos` with `node`.
    fn migrate_inline_to_node(&mut self, bitpos: u32, node: Arc<Node<T>>, delta: Delta) {
        let data_at = self.data_index(bitpos);
        let node_index = self.node_index(bitpos);
        self.content.remove(data_at);
        let node_at = self.content.len() - node_index;
        self.content.insert(node_at, Slot::Node(node));
        self.data_map ^= bitpos;
        self.node_map |= bitpos;
        self.apply(delta);
    }

    /// Replaces the sub-node at `bitpos` with its last remaining element.
    fn migrate_node_to_inline(&mut self, bitpos: u32, key: T, hash: u32, delta: Delta) {
        let node_at = self.node_slot(self.node_index(bitpos));
        self.content.remove(node_at);
        let data_at = self.data_index(bitpos);
        self.content.insert(data_at, Slot::Key { key, hash });
        self.node_map ^= bitpos;
        self.data_map |= bitpos;
        self.apply(delta);
    }
}

impl<T: Clone> BitmapNode<T> {
    fn copy_for(&self, owner: Option<Owner>, extra: usize) -> Self {
        let mut content = Vec::with_capacity(self.content.len() + extra);
        content.extend(self.content.iter().cloned());
        Self {
            owner,
            data_map: self.data_map,
            node_map: self.node_map,
            content,
            size: self.size,
            hash: self.hash,
        }
    }
}

impl<T> CollisionNode<T> {
    #[inline]
    pub(crate) fn hash(&self) -> u32 {
        self.hash
    }

    #[inline]
    pub(crate) fn keys(&self) -> &[T] {
        &self.keys
    }

    pub(crate) fn from_keys(hash: u32, keys: Vec<T>) -> Self {
        debug_assert!(keys.len() >= 2);
        Self { hash, keys }
    }
}

// =============================================================================
// Node: shared accessors and lookup
// =============================================================================

impl<T> Node<T> {
    pub(crate) fn empty() -> Self {
        Node::Bitmap(BitmapNode::empty())
    }

    pub(crate) fn size(&self) -> usize {
        match self {
            Node::Bitmap(node) => node.size,
            Node::Collision(node) => node.keys.len(),
        }
    }

    pub(crate) fn hash_code(&self) -> u32 {
        match self {
            Node::Bitmap(node) => node.hash,
            Node::Collision(node) => node.hash.wrapping_mul(node.keys.len() as u32),
        }
    }

    pub(crate) fn size_predicate(&self) -> SizePredicate {
        match self {
            Node::Bitmap(node) => node.size_predicate(),
            Node::Collision(_) => SizePredicate::MoreThanOne,
        }
    }

    pub(crate) fn payload_arity(&self) -> usize {
        match self {
            Node::Bitmap(node) => node.payload_arity(),
            Node::Collision(node) => node.keys.len(),
        }
    }

    pub(crate) fn node_arity(&self) -> usize {
        match self {
            Node::Bitmap(node) => node.node_arity(),
            Node::Collision(_) => 0,
        }
    }

    /// Sum of the hashes of the elements stored directly in this node.
    pub(crate) fn local_hash_code(&self) -> u32 {
        match self {
            Node::Bitmap(node) => (0..node.payload_arity())
                .map(|i| node.key_entry(i).1)
                .fold(0u32, u32::wrapping_add),
            Node::Collision(node) => node.hash.wrapping_mul(node.keys.len() as u32),
        }
    }

    pub(crate) fn key(&self, index: usize) -> &T {
        self.key_entry(index).0
    }

    pub(crate) fn key_entry(&self, index: usize) -> (&T, u32) {
        match self {
            Node::Bitmap(node) => node.key_entry(index),
            Node::Collision(node) => (&node.keys[index], node.hash),
        }
    }

    pub(crate) fn node(&self, index: usize) -> &Arc<Node<T>> {
        match self {
            Node::Bitmap(node) => node.node(index),
            Node::Collision(_) => panic!("hash-collision nodes have no sub-nodes"),
        }
    }

    fn as_bitmap(&self) -> &BitmapNode<T> {
        match self {
            Node::Bitmap(node) => node,
            Node::Collision(_) => panic!("expected a bitmap-indexed node"),
        }
    }

    /// Finds the stored element at `hash` accepted by `matches`.
    pub(crate) fn find<F>(&self, hash: u32, shift: u32, matches: &F) -> Option<&T>
    where
        F: Fn(&T) -> bool + ?Sized,
    {
        let mut node = self;
        let mut shift = shift;
        loop {
            match node {
                Node::Bitmap(bitmap) => {
                    let bit = bitpos(mask(hash, shift));
                    match bitmap.entry(bit) {
                        Entry::Key(key, key_hash) => {
                            return (key_hash == hash && matches(key)).then_some(key);
                        }
                        Entry::Node(child) => {
                            node = &**child;
                            shift += BIT_PARTITION_SIZE;
                        }
                        Entry::Empty => return None,
                    }
                }
                Node::Collision(collision) => {
                    if collision.hash != hash {
                        return None;
                    }
                    return collision.keys.iter().find(|key| matches(*key));
                }
            }
        }
    }
}

// =============================================================================
// Node: structural edits
// =============================================================================

/// Returns the bitmap node in `slot` if `owner` may edit it in place.
fn editable<T>(slot: &mut Arc<Node<T>>, owner: Option<Owner>) -> Option<&mut BitmapNode<T>> {
    owner?;
    match Arc::get_mut(slot) {
        Some(Node::Bitmap(node)) if node.is_owned_by(owner) => Some(node),
        _ => None,
    }
}

/// Applies `f` to the bitmap node in `slot`, in place when `owner` permits,
/// otherwise to an owner-stamped copy that then replaces the slot's node.
fn edit_bitmap<T: Clone, R>(
    slot: &mut Arc<Node<T>>,
    owner: Option<Owner>,
    extra: usize,
    f: impl FnOnce(&mut BitmapNode<T>) -> R,
) -> R {
    if let Some(node) = editable(slot, owner) {
        return f(node);
    }
    let mut copy = slot.as_bitmap().copy_for(owner, extra);
    let result = f(&mut copy);
    *slot = Arc::new(Node::Bitmap(copy));
    result
}

impl<T: Clone> Node<T> {
    /// Builds the smallest subtree holding two distinct elements, starting at `shift`.
    pub(crate) fn merge_two_keys(
        key0: T,
        hash0: u32,
        key1: T,
        hash1: u32,
        shift: u32,
        owner: Option<Owner>,
    ) -> Node<T> {
        if shift >= HASH_CODE_LENGTH {
            debug_assert_eq!(hash0, hash1);
            return Node::Collision(CollisionNode::from_keys(hash0, vec![key0, key1]));
        }

        let mask0 = mask(hash0, shift);
        let mask1 = mask(hash1, shift);
        if mask0 != mask1 {
            let content = if mask0 < mask1 {
                vec![
                    Slot::Key { key: key0, hash: hash0 },
                    Slot::Key { key: key1, hash: hash1 },
                ]
            } else {
                vec![
                    Slot::Key { key: key1, hash: hash1 },
                    Slot::Key { key: key0, hash: hash0 },
                ]
            };
            return Node::Bitmap(BitmapNode {
                owner,
                data_map: bitpos(mask0) | bitpos(mask1),
                node_map: 0,
                content,
                size: 2,
                hash: hash0.wrapping_add(hash1),
            });
        }

        let child = Self::merge_two_keys(key0, hash0, key1, hash1, shift + BIT_PARTITION_SIZE, owner);
        Node::Bitmap(BitmapNode::with_child(owner, bitpos(mask0), Arc::new(child)))
    }

    /// Inserts `key` below `slot` unless an equivalent element is present.
    pub(crate) fn insert<E>(
        slot: &mut Arc<Node<T>>,
        owner: Option<Owner>,
        key: T,
        hash: u32,
        shift: u32,
        eq: &E,
    ) -> Edit
    where
        E: Equivalence<T> + ?Sized,
    {
        match **slot {
            Node::Bitmap(_) => Self::bitmap_insert(slot, owner, key, hash, shift, eq),
            Node::Collision(_) => Self::collision_insert(slot, key, hash, eq),
        }
    }

    /// Removes the element at `hash` accepted by `matches`, collapsing the
    /// trie where a subtree shrinks to a single element.
    pub(crate) fn remove<F>(
        slot: &mut Arc<Node<T>>,
        owner: Option<Owner>,
        hash: u32,
        shift: u32,
        matches: &F,
    ) -> Edit
    where
        F: Fn(&T) -> bool + ?Sized,
    {
        match **slot {
            Node::Bitmap(_) => Self::bitmap_remove(slot, owner, hash, shift, matches),
            Node::Collision(_) => Self::collision_remove(slot, owner, hash, matches),
        }
    }

    fn bitmap_insert<E>(
        slot: &mut Arc<Node<T>>,
        owner: Option<Owner>,
        key: T,
        hash: u32,
        shift: u32,
        eq: &E,
    ) -> Edit
    where
        E: Equivalence<T> + ?Sized,
    {
        let bit = bitpos(mask(hash, shift));
        let node = slot.as_bitmap();

        if node.data_map & bit != 0 {
            let (current, current_hash) = node.key_entry(node.data_index(bit));
            if current_hash == hash && eq.equivalent(current, &key) {
                return Edit::Unchanged;
            }
            let sub_node = Self::merge_two_keys(
                current.clone(),
                current_hash,
                key,
                hash,
                shift + BIT_PARTITION_SIZE,
                owner,
            );
            let delta = Delta::insertion(hash);
            edit_bitmap(slot, owner, 0, |node| {
                node.migrate_inline_to_node(bit, Arc::new(sub_node), delta)
            });
            return Edit::Modified(delta);
        }

        if node.node_map & bit != 0 {
            let child_index = node.node_index(bit);
            let (child, edit) = match editable(slot, owner) {
                Some(node) => {
                    let child = node.node_mut(child_index);
                    let edit = Self::insert(child, owner, key, hash, shift + BIT_PARTITION_SIZE, eq);
                    (Arc::clone(child), edit)
                }
                None => {
                    let mut child = Arc::clone(slot.as_bitmap().node(child_index));
                    let edit =
                        Self::insert(&mut child, owner, key, hash, shift + BIT_PARTITION_SIZE, eq);
                    (child, edit)
                }
            };
            if let Edit::Modified(delta) = edit {
                edit_bitmap(slot, owner, 0, |node| node.set_node(child_index, child, delta));
            }
            return edit;
        }

        edit_bitmap(slot, owner, 1, |node| node.insert_key(bit, key, hash));
        Edit::Modified(Delta::insertion(hash))
    }

    fn bitmap_remove<F>(
        slot: &mut Arc<Node<T>>,
        owner: Option<Owner>,
        hash: u32,
        shift: u32,
        matches: &F,
    ) -> Edit
    where
        F: Fn(&T) -> bool + ?Sized,
    {
        let bit = bitpos(mask(hash, shift));
        let node = slot.as_bitmap();

        if node.data_map & bit != 0 {
            let data_index = node.data_index(bit);
            let (current, current_hash) = node.key_entry(data_index);
            if current_hash != hash || !matches(current) {
                return Edit::Unchanged;
            }
            let delta = Delta::removal(current_hash);

            if node.payload_arity() == 2 && node.node_arity() == 0 {
                // The survivor either becomes the new root or is inlined by the parent.
                let data_map = if shift == 0 {
                    node.data_map ^ bit
                } else {
                    bitpos(mask(hash, 0))
                };
                let (other, other_hash) = node.key_entry(1 - data_index);
                let survivor = BitmapNode::singleton(owner, data_map, other.clone(), other_hash);
                *slot = Arc::new(Node::Bitmap(survivor));
            } else {
                edit_bitmap(slot, owner, 0, |node| node.remove_key(bit));
            }
            return Edit::Modified(delta);
        }

        if node.node_map & bit != 0 {
            let child_index = node.node_index(bit);
            let only_child = node.payload_arity() == 0 && node.node_arity() == 1;
            let (child, edit) = match editable(slot, owner) {
                Some(node) => {
                    let child = node.node_mut(child_index);
                    let edit = Self::remove(child, owner, hash, shift + BIT_PARTITION_SIZE, matches);
                    (Arc::clone(child), edit)
                }
                None => {
                    let mut child = Arc::clone(slot.as_bitmap().node(child_index));
                    let edit =
                        Self::remove(&mut child, owner, hash, shift + BIT_PARTITION_SIZE, matches);
                    (child, edit)
                }
            };
            let Edit::Modified(delta) = edit else {
                return Edit::Unchanged;
            };

            match child.size_predicate() {
                SizePredicate::Empty => {
                    panic!("sub-node must retain at least one element after a removal")
                }
                SizePredicate::One if only_child => {
                    // Escalate: the singleton replaces this node and the trie shrinks.
                    *slot = child;
                }
                SizePredicate::One => {
                    let (key, key_hash) = child.key_entry(0);
                    let (key, key_hash) = (key.clone(), key_hash);
                    edit_bitmap(slot, owner, 0, |node| {
                        node.migrate_node_to_inline(bit, key, key_hash, delta)
                    });
                }
                SizePredicate::MoreThanOne => {
                    edit_bitmap(slot, owner, 0, |node| node.set_node(child_index, child, delta));
                }
            }
            return Edit::Modified(delta);
        }

        Edit::Unchanged
    }

    fn collision_insert<E>(slot: &mut Arc<Node<T>>, key: T, hash: u32, eq: &E) -> Edit
    where
        E: Equivalence<T> + ?Sized,
    {
        let Node::Collision(node) = &**slot else {
            panic!("expected a hash-collision node");
        };
        debug_assert_eq!(node.hash, hash, "hash-collision node reached with a foreign hash");
        if node.keys.iter().any(|current| eq.equivalent(current, &key)) {
            return Edit::Unchanged;
        }

        let mut keys = Vec::with_capacity(node.keys.len() + 1);
        keys.extend(node.keys.iter().cloned());
        keys.push(key);
        *slot = Arc::new(Node::Collision(CollisionNode { hash, keys }));
        Edit::Modified(Delta::insertion(hash))
    }

    fn collision_remove<F>(slot: &mut Arc<Node<T>>, owner: Option<Owner>, hash: u32, matches: &F) -> Edit
    where
        F: Fn(&T) -> bool + ?Sized,
    {
        let Node::Collision(node) = &**slot else {
            panic!("expected a hash-collision node");
        };
        if node.hash != hash {
            return Edit::Unchanged;
        }
        let Some(at) = node.keys.iter().position(|key| matches(key)) else {
            return Edit::Unchanged;
        };

        let replacement = if node.keys.len() == 2 {
            // Unwrapped back into the bitmap trie by the parent.
            let other = node.keys[1 - at].clone();
            Node::Bitmap(BitmapNode::singleton(owner, bitpos(mask(hash, 0)), other, hash))
        } else {
            let keys = node
                .keys
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != at)
                .map(|(_, key)| key.clone())
                .collect();
            Node::Collision(CollisionNode { hash, keys })
        };
        *slot = Arc::new(replacement);
        Edit::Modified(Delta::removal(hash))
    }
}

impl<T> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Bitmap(node) => f
                .debug_struct("Bitmap")
                .field("data_map", &format_args!("{:#034b}", node.data_map))
                .field("node_map", &format_args!("{:#034b}", node.node_map))
                .field("size", &node.size)
                .field("hash", &node.hash)
                .finish(),
            Node::Collision(node) => f
                .debug_struct("Collision")
                .field("hash", &node.hash)
                .field("len", &node.keys.len())
                .finish(),
        }
    }
}
