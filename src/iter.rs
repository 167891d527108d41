//! Traversal of a trie.

use std::iter::FusedIterator;

use smallvec::SmallVec;

use crate::node::Node;
use crate::MAX_DEPTH;

struct Frame<'a, T> {
    node: &'a Node<T>,
    cursor: usize,
    length: usize,
}

/// Iterator over the elements of a set.
///
/// Exhausts the inline elements of a node before descending into its
/// sub-nodes. The order is deterministic for a given trie shape but is not
/// sorted and not insertion order.
pub struct Iter<'a, T> {
    values: Option<Frame<'a, T>>,
    nodes: SmallVec<[Frame<'a, T>; MAX_DEPTH]>,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(root: &'a Node<T>, size: usize) -> Self {
        let mut iter = Self {
            values: None,
            nodes: SmallVec::new(),
            remaining: size,
        };
        iter.enter(root);
        iter
    }

    fn enter(&mut self, node: &'a Node<T>) {
        if node.node_arity() > 0 {
            self.nodes.push(Frame {
                node,
                cursor: 0,
                length: node.node_arity(),
            });
        }
        if node.payload_arity() > 0 {
            self.values = Some(Frame {
                node,
                cursor: 0,
                length: node.payload_arity(),
            });
        }
    }

    /// Advances to the next node holding inline elements.
    fn seek_values(&mut self) -> bool {
        while let Some(frame) = self.nodes.last_mut() {
            if frame.cursor == frame.length {
                self.nodes.pop();
                continue;
            }
            let parent: &'a Node<T> = frame.node;
            let child: &'a Node<T> = parent.node(frame.cursor);
            frame.cursor += 1;
            self.enter(child);
            if child.payload_arity() > 0 {
                return true;
            }
        }
        false
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        loop {
            if let Some(frame) = &mut self.values {
                if frame.cursor < frame.length {
                    let node: &'a Node<T> = frame.node;
                    let key = node.key(frame.cursor);
                    frame.cursor += 1;
                    self.remaining -= 1;
                    return Some(key);
                }
                self.values = None;
            }
            if !self.seek_values() {
                return None;
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

/// Pre-order walk over every node of a trie.
pub(crate) struct NodeIter<'a, T> {
    stack: Vec<&'a Node<T>>,
}

impl<'a, T> NodeIter<'a, T> {
    pub(crate) fn new(root: &'a Node<T>) -> Self {
        Self { stack: vec![root] }
    }
}

impl<'a, T> Iterator for NodeIter<'a, T> {
    type Item = &'a Node<T>;

    fn next(&mut self) -> Option<&'a Node<T>> {
        let node = self.stack.pop()?;
        for i in (0..node.node_arity()).rev() {
            self.stack.push(node.node(i));
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn build(items: &[(i32, u32)]) -> Arc<Node<i32>> {
        let mut root = Arc::new(Node::empty());
        for &(key, hash) in items {
            Node::insert(&mut root, None, key, hash, 0, &|a: &i32, b: &i32| a == b);
        }
        root
    }

    #[test]
    fn test_iter_empty() {
        let root = Node::<i32>::empty();
        let mut iter = Iter::new(&root, 0);
        assert_eq!(iter.len(), 0);
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_iter_payload_before_sub_nodes() {
        // Slice 1 holds a sub-node, slices 3 and 4 hold inline elements.
        let root = build(&[(1, 1), (2, 33), (3, 3), (4, 4)]);
        let got: Vec<i32> = Iter::new(&root, root.size()).copied().collect();
        assert_eq!(got, vec![3, 4, 1, 2]);
    }

    #[test]
    fn test_iter_skips_chains_without_payload() {
        let root = build(&[(1, 7), (2, 7), (3, 7), (4, 8)]);
        let mut got: Vec<i32> = Iter::new(&root, root.size()).copied().collect();
        assert_eq!(got[0], 4);
        got.sort_unstable();
        assert_eq!(got, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_iter_exact_size() {
        let items: Vec<(i32, u32)> = (0..200).map(|i| (i, (i as u32).wrapping_mul(0x9E37_79B9))).collect();
        let root = build(&items);
        let mut iter = Iter::new(&root, root.size());
        assert_eq!(iter.len(), 200);
        iter.next();
        iter.next();
        assert_eq!(iter.size_hint(), (198, Some(198)));
        assert_eq!(iter.count(), 198);
    }

    #[test]
    fn test_node_iter_visits_every_node() {
        let root = build(&[(1, 1), (2, 33), (3, 3), (4, 35)]);
        let nodes: Vec<&Node<i32>> = NodeIter::new(&root).collect();
        assert_eq!(nodes.len(), 3);
        let total: usize = nodes.iter().map(|node| node.payload_arity()).sum();
        assert_eq!(total, 4);
    }
}
