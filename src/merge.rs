//! Structural set algebra over two tries.
//!
//! Each merge walks both tries in lock-step, one bitmap position at a time,
//! classifying the position on each side as empty, inline element or sub-node.
//! Whenever a merged subtree turns out identical to one of its inputs the
//! input is reused instead of copied. When it equals both, the caller's
//! [`Preference`] picks the instance that gets embedded in a rebuilt parent.

use std::sync::Arc;

use crate::node::{bitpos, bits, mask, BitmapNode, CollisionNode, Edit, Entry, Node, SizePredicate, Slot};
use crate::BIT_PARTITION_SIZE;

/// Which operand to return when a merge result equals both of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Preference {
    Left,
    Right,
    Indifferent,
}

impl Preference {
    /// The operand to embed when both are equal to the result.
    pub(crate) fn pick<'a, T>(self, left: &'a Arc<Node<T>>, right: &'a Arc<Node<T>>) -> &'a Arc<Node<T>> {
        match self {
            Preference::Right => right,
            Preference::Left | Preference::Indifferent => left,
        }
    }
}

/// Result of merging two subtrees.
pub(crate) enum Merged<T> {
    /// Equal to the left operand only.
    Left,
    /// Equal to the right operand only.
    Right,
    /// Equal to both operands.
    Both,
    /// A freshly built subtree. May hold zero or one element.
    Built(Arc<Node<T>>),
}

impl<T> Merged<T> {
    pub(crate) fn resolve(
        self,
        left: &Arc<Node<T>>,
        right: &Arc<Node<T>>,
        pref: Preference,
    ) -> Arc<Node<T>> {
        match self {
            Merged::Left => Arc::clone(left),
            Merged::Right => Arc::clone(right),
            Merged::Both => Arc::clone(pref.pick(left, right)),
            Merged::Built(node) => node,
        }
    }
}

/// Accumulates the positions of a node under construction, in ascending bit order.
struct Prototype<T> {
    data_map: u32,
    node_map: u32,
    keys: Vec<Slot<T>>,
    nodes: Vec<Arc<Node<T>>>,
    size: usize,
    hash: u32,
}

impl<T> Prototype<T> {
    fn new() -> Self {
        Self {
            data_map: 0,
            node_map: 0,
            keys: Vec::new(),
            nodes: Vec::new(),
            size: 0,
            hash: 0,
        }
    }

    fn push_key(&mut self, bitpos: u32, key: T, hash: u32) {
        debug_assert!(self.data_map < bitpos && self.node_map < bitpos);
        self.data_map |= bitpos;
        self.keys.push(Slot::Key { key, hash });
        self.size += 1;
        self.hash = self.hash.wrapping_add(hash);
    }

    fn push_node(&mut self, bitpos: u32, node: Arc<Node<T>>) {
        debug_assert!(self.data_map < bitpos && self.node_map < bitpos);
        self.node_map |= bitpos;
        self.size += node.size();
        self.hash = self.hash.wrapping_add(node.hash_code());
        self.nodes.push(node);
    }

    /// Adds a merged subtree, unwrapping singletons and dropping empties.
    fn push_merged(&mut self, bitpos: u32, node: Arc<Node<T>>)
    where
        T: Clone,
    {
        match node.size_predicate() {
            SizePredicate::Empty => {}
            SizePredicate::One => {
                let (key, hash) = node.key_entry(0);
                self.push_key(bitpos, key.clone(), hash);
            }
            SizePredicate::MoreThanOne => self.push_node(bitpos, node),
        }
    }

    fn same_shape(&self, node: &BitmapNode<T>) -> bool {
        self.data_map == node.data_map() && self.node_map == node.node_map()
    }

    fn build(self) -> Arc<Node<T>> {
        let mut content = self.keys;
        content.reserve_exact(self.nodes.len());
        content.extend(self.nodes.into_iter().rev().map(Slot::Node));
        Arc::new(Node::Bitmap(BitmapNode::from_parts(
            self.data_map,
            self.node_map,
            content,
            self.size,
            self.hash,
        )))
    }
}

fn singleton<T>(key: T, hash: u32) -> Arc<Node<T>> {
    Arc::new(Node::Bitmap(BitmapNode::singleton(None, bitpos(mask(hash, 0)), key, hash)))
}

fn contains<T: Eq>(node: &Node<T>, key: &T, hash: u32, shift: u32) -> bool {
    node.find(hash, shift, &|candidate: &T| candidate == key).is_some()
}

/// Keys of a filtered collision node, reduced to the canonical node for their count.
fn collision_result<T>(hash: u32, mut keys: Vec<T>) -> Arc<Node<T>> {
    match keys.len() {
        0 => Arc::new(Node::empty()),
        1 => singleton(keys.remove(0), hash),
        _ => Arc::new(Node::Collision(CollisionNode::from_keys(hash, keys))),
    }
}

// =============================================================================
// Union
// =============================================================================

pub(crate) fn union<T: Eq + Clone>(
    left: &Arc<Node<T>>,
    right: &Arc<Node<T>>,
    shift: u32,
    pref: Preference,
) -> Merged<T> {
    if Arc::ptr_eq(left, right) {
        return Merged::Both;
    }
    match (&**left, &**right) {
        (Node::Bitmap(l), Node::Bitmap(r)) => union_bitmaps(l, r, shift, pref),
        (Node::Collision(l), Node::Collision(r)) => union_collisions(l, r),
        _ => unreachable!("hash-collision nodes only meet hash-collision nodes"),
    }
}

fn union_bitmaps<T: Eq + Clone>(
    l: &BitmapNode<T>,
    r: &BitmapNode<T>,
    shift: u32,
    pref: Preference,
) -> Merged<T> {
    let child_shift = shift + BIT_PARTITION_SIZE;
    let eq = |a: &T, b: &T| a == b;
    let mut proto = Prototype::new();
    let mut left_intact = true;
    let mut right_intact = true;

    for bit in bits(l.data_map() | l.node_map() | r.data_map() | r.node_map()) {
        match (l.entry(bit), r.entry(bit)) {
            (Entry::Key(k0, h0), Entry::Key(k1, h1)) => {
                if h0 == h1 && k0 == k1 {
                    proto.push_key(bit, k0.clone(), h0);
                } else {
                    let merged = Node::merge_two_keys(k0.clone(), h0, k1.clone(), h1, child_shift, None);
                    proto.push_node(bit, Arc::new(merged));
                    left_intact = false;
                    right_intact = false;
                }
            }
            (Entry::Node(n0), Entry::Key(k1, h1)) => {
                right_intact = false;
                let mut child = Arc::clone(n0);
                if let Edit::Modified(_) = Node::insert(&mut child, None, k1.clone(), h1, child_shift, &eq) {
                    left_intact = false;
                }
                proto.push_node(bit, child);
            }
            (Entry::Key(k0, h0), Entry::Node(n1)) => {
                left_intact = false;
                let mut child = Arc::clone(n1);
                if let Edit::Modified(_) = Node::insert(&mut child, None, k0.clone(), h0, child_shift, &eq) {
                    right_intact = false;
                }
                proto.push_node(bit, child);
            }
            (Entry::Node(n0), Entry::Node(n1)) => {
                match union(n0, n1, child_shift, pref) {
                    Merged::Left => {
                        right_intact = false;
                        proto.push_node(bit, Arc::clone(n0));
                    }
                    Merged::Right => {
                        left_intact = false;
                        proto.push_node(bit, Arc::clone(n1));
                    }
                    Merged::Both => proto.push_node(bit, Arc::clone(pref.pick(n0, n1))),
                    Merged::Built(node) => {
                        left_intact = false;
                        right_intact = false;
                        proto.push_node(bit, node);
                    }
                }
            }
            (Entry::Key(k0, h0), Entry::Empty) => {
                right_intact = false;
                proto.push_key(bit, k0.clone(), h0);
            }
            (Entry::Node(n0), Entry::Empty) => {
                right_intact = false;
                proto.push_node(bit, Arc::clone(n0));
            }
            (Entry::Empty, Entry::Key(k1, h1)) => {
                left_intact = false;
                proto.push_key(bit, k1.clone(), h1);
            }
            (Entry::Empty, Entry::Node(n1)) => {
                left_intact = false;
                proto.push_node(bit, Arc::clone(n1));
            }
            (Entry::Empty, Entry::Empty) => unreachable!("bit {bit:#x} is set on neither side"),
        }
    }

    match (left_intact, right_intact) {
        (true, true) => Merged::Both,
        (true, false) => Merged::Left,
        (false, true) => Merged::Right,
        (false, false) => Merged::Built(proto.build()),
    }
}

fn union_collisions<T: Eq + Clone>(l: &CollisionNode<T>, r: &CollisionNode<T>) -> Merged<T> {
    debug_assert_eq!(l.hash(), r.hash());
    let missing: Vec<&T> = r.keys().iter().filter(|key| !l.keys().contains(key)).collect();

    if missing.is_empty() {
        return if l.keys().len() == r.keys().len() {
            Merged::Both
        } else {
            Merged::Left
        };
    }
    if l.keys().len() + missing.len() == r.keys().len() {
        return Merged::Right;
    }

    let mut keys = Vec::with_capacity(l.keys().len() + missing.len());
    keys.extend(l.keys().iter().cloned());
    keys.extend(missing.into_iter().cloned());
    Merged::Built(Arc::new(Node::Collision(CollisionNode::from_keys(l.hash(), keys))))
}

// =============================================================================
// Intersection
// =============================================================================

pub(crate) fn intersect<T: Eq + Clone>(
    left: &Arc<Node<T>>,
    right: &Arc<Node<T>>,
    shift: u32,
    pref: Preference,
) -> Merged<T> {
    if Arc::ptr_eq(left, right) {
        return Merged::Both;
    }
    match (&**left, &**right) {
        (Node::Bitmap(l), Node::Bitmap(r)) => intersect_bitmaps(l, r, shift, pref),
        (Node::Collision(l), Node::Collision(r)) => intersect_collisions(l, r),
        _ => unreachable!("hash-collision nodes only meet hash-collision nodes"),
    }
}

fn intersect_bitmaps<T: Eq + Clone>(
    l: &BitmapNode<T>,
    r: &BitmapNode<T>,
    shift: u32,
    pref: Preference,
) -> Merged<T> {
    let child_shift = shift + BIT_PARTITION_SIZE;
    let shared = (l.data_map() | l.node_map()) & (r.data_map() | r.node_map());
    if shared == 0 {
        return Merged::Built(Arc::new(Node::empty()));
    }

    // A side whose layout survives the intersection unchanged may be reusable
    // further down, so bias nested merges towards it.
    let left_layout_kept =
        l.data_map() & r.data_map() == l.data_map() && l.node_map() & r.node_map() == l.node_map();
    let right_layout_kept =
        l.data_map() & r.data_map() == r.data_map() && l.node_map() & r.node_map() == r.node_map();
    let nested_pref = match (left_layout_kept, right_layout_kept) {
        (true, true) => pref,
        (true, false) => Preference::Left,
        (false, true) => Preference::Right,
        (false, false) => Preference::Indifferent,
    };

    let mut proto = Prototype::new();
    let mut left_nodes_kept = true;
    let mut right_nodes_kept = true;

    for bit in bits(shared) {
        match (l.entry(bit), r.entry(bit)) {
            (Entry::Key(k0, h0), Entry::Key(k1, h1)) => {
                if h0 == h1 && k0 == k1 {
                    proto.push_key(bit, k0.clone(), h0);
                }
            }
            (Entry::Key(k0, h0), Entry::Node(n1)) => {
                if contains(n1, k0, h0, child_shift) {
                    proto.push_key(bit, k0.clone(), h0);
                }
            }
            (Entry::Node(n0), Entry::Key(k1, h1)) => {
                if contains(n0, k1, h1, child_shift) {
                    proto.push_key(bit, k1.clone(), h1);
                }
            }
            (Entry::Node(n0), Entry::Node(n1)) => {
                match intersect(n0, n1, child_shift, nested_pref) {
                    Merged::Left => {
                        right_nodes_kept = false;
                        proto.push_node(bit, Arc::clone(n0));
                    }
                    Merged::Right => {
                        left_nodes_kept = false;
                        proto.push_node(bit, Arc::clone(n1));
                    }
                    Merged::Both => proto.push_node(bit, Arc::clone(nested_pref.pick(n0, n1))),
                    Merged::Built(node) => {
                        left_nodes_kept = false;
                        right_nodes_kept = false;
                        proto.push_merged(bit, node);
                    }
                }
            }
            _ => unreachable!("bit {bit:#x} is shared by both sides"),
        }
    }

    let left_equal = left_nodes_kept && proto.same_shape(l);
    let right_equal = right_nodes_kept && proto.same_shape(r);
    match (left_equal, right_equal) {
        (true, true) => Merged::Both,
        (true, false) => Merged::Left,
        (false, true) => Merged::Right,
        (false, false) => Merged::Built(proto.build()),
    }
}

fn intersect_collisions<T: Eq + Clone>(l: &CollisionNode<T>, r: &CollisionNode<T>) -> Merged<T> {
    debug_assert_eq!(l.hash(), r.hash());
    let kept: Vec<&T> = l.keys().iter().filter(|key| r.keys().contains(key)).collect();

    if kept.len() == l.keys().len() {
        return if kept.len() == r.keys().len() {
            Merged::Both
        } else {
            Merged::Left
        };
    }
    if kept.len() == r.keys().len() {
        return Merged::Right;
    }
    Merged::Built(collision_result(l.hash(), kept.into_iter().cloned().collect()))
}

// =============================================================================
// Difference
// =============================================================================

/// Elements of `left` absent from `right`. Only the left operand is ever reused.
pub(crate) fn subtract<T: Eq + Clone>(left: &Arc<Node<T>>, right: &Arc<Node<T>>, shift: u32) -> Merged<T> {
    if Arc::ptr_eq(left, right) {
        return Merged::Built(Arc::new(Node::empty()));
    }
    match (&**left, &**right) {
        (Node::Bitmap(l), Node::Bitmap(r)) => subtract_bitmaps(l, r, shift),
        (Node::Collision(l), Node::Collision(r)) => subtract_collisions(l, r),
        _ => unreachable!("hash-collision nodes only meet hash-collision nodes"),
    }
}

fn subtract_bitmaps<T: Eq + Clone>(l: &BitmapNode<T>, r: &BitmapNode<T>, shift: u32) -> Merged<T> {
    let child_shift = shift + BIT_PARTITION_SIZE;
    let left_map = l.data_map() | l.node_map();
    if left_map & (r.data_map() | r.node_map()) == 0 {
        return Merged::Left;
    }

    let mut proto = Prototype::new();
    let mut left_intact = true;

    for bit in bits(left_map) {
        match (l.entry(bit), r.entry(bit)) {
            (Entry::Key(k0, h0), Entry::Key(k1, h1)) => {
                if h0 == h1 && k0 == k1 {
                    left_intact = false;
                } else {
                    proto.push_key(bit, k0.clone(), h0);
                }
            }
            (Entry::Key(k0, h0), Entry::Node(n1)) => {
                if contains(n1, k0, h0, child_shift) {
                    left_intact = false;
                } else {
                    proto.push_key(bit, k0.clone(), h0);
                }
            }
            (Entry::Node(n0), Entry::Key(k1, h1)) => {
                let mut child = Arc::clone(n0);
                match Node::remove(&mut child, None, h1, child_shift, &|candidate: &T| candidate == k1) {
                    Edit::Unchanged => proto.push_node(bit, child),
                    Edit::Modified(_) => {
                        left_intact = false;
                        proto.push_merged(bit, child);
                    }
                }
            }
            (Entry::Node(n0), Entry::Node(n1)) => match subtract(n0, n1, child_shift) {
                Merged::Left => proto.push_node(bit, Arc::clone(n0)),
                Merged::Right | Merged::Both => {
                    unreachable!("difference only ever reuses the left operand")
                }
                Merged::Built(node) => {
                    left_intact = false;
                    proto.push_merged(bit, node);
                }
            },
            (Entry::Key(k0, h0), Entry::Empty) => proto.push_key(bit, k0.clone(), h0),
            (Entry::Node(n0), Entry::Empty) => proto.push_node(bit, Arc::clone(n0)),
            (Entry::Empty, _) => unreachable!("bit {bit:#x} is set on the left side"),
        }
    }

    if left_intact {
        Merged::Left
    } else {
        Merged::Built(proto.build())
    }
}

fn subtract_collisions<T: Eq + Clone>(l: &CollisionNode<T>, r: &CollisionNode<T>) -> Merged<T> {
    debug_assert_eq!(l.hash(), r.hash());
    let kept: Vec<&T> = l.keys().iter().filter(|key| !r.keys().contains(key)).collect();
    if kept.len() == l.keys().len() {
        return Merged::Left;
    }
    Merged::Built(collision_result(l.hash(), kept.into_iter().cloned().collect()))
}
