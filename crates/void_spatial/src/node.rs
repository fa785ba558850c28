//! Hierarchy nodes and the arena that owns them
//!
//! Nodes refer to each other through [`NodeId`] handles. Child handles are
//! owning edges; the parent handle is a plain back-reference used for upward
//! walks during removal.

use void_math::AABB;

/// Handle to a node stored in a [`NodeArena`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Which child slot of a parent a node occupies
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Shape of a node
///
/// Only the root may be missing children; an internal node always has
/// exactly two and a leaf never has any.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind<K> {
    Root {
        left: Option<NodeId>,
        right: Option<NodeId>,
    },
    Internal {
        left: NodeId,
        right: NodeId,
    },
    Leaf {
        object: K,
    },
}

/// A single hierarchy node
#[derive(Clone, Debug, PartialEq)]
pub struct Node<K> {
    /// Representative Morton key. Exact after a fit pass, approximate
    /// (midpoint of the children) right after an incremental insert.
    pub morton: u64,
    /// Box enclosing every leaf beneath this node
    pub bounds: AABB,
    pub parent: Option<NodeId>,
    pub kind: NodeKind<K>,
}

impl<K: Copy> Node<K> {
    pub(crate) fn root() -> Self {
        Self {
            morton: 0,
            bounds: AABB::EMPTY,
            parent: None,
            kind: NodeKind::Root { left: None, right: None },
        }
    }

    pub(crate) fn internal(left: NodeId, right: NodeId, morton: u64) -> Self {
        Self {
            morton,
            bounds: AABB::EMPTY,
            parent: None,
            kind: NodeKind::Internal { left, right },
        }
    }

    pub(crate) fn leaf(object: K, morton: u64, bounds: AABB) -> Self {
        Self {
            morton,
            bounds,
            parent: None,
            kind: NodeKind::Leaf { object },
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        matches!(self.kind, NodeKind::Root { .. })
    }

    /// The object held by a leaf
    #[inline]
    pub fn object(&self) -> Option<K> {
        match self.kind {
            NodeKind::Leaf { object } => Some(object),
            _ => None,
        }
    }

    /// Left and right child handles, whichever are present
    #[inline]
    pub fn children(&self) -> (Option<NodeId>, Option<NodeId>) {
        match self.kind {
            NodeKind::Root { left, right } => (left, right),
            NodeKind::Internal { left, right } => (Some(left), Some(right)),
            NodeKind::Leaf { .. } => (None, None),
        }
    }

    /// Both children, if this node currently has two
    #[inline]
    pub fn both_children(&self) -> Option<(NodeId, NodeId)> {
        match self.kind {
            NodeKind::Root { left: Some(left), right: Some(right) } => Some((left, right)),
            NodeKind::Internal { left, right } => Some((left, right)),
            _ => None,
        }
    }

    /// Which slot `child` occupies under this node
    pub fn side_of(&self, child: NodeId) -> Option<Side> {
        match self.children() {
            (Some(left), _) if left == child => Some(Side::Left),
            (_, Some(right)) if right == child => Some(Side::Right),
            _ => None,
        }
    }

    /// Put `child` into `side`, keeping the variant of this node
    ///
    /// Returns false for leaves, which cannot take children.
    pub(crate) fn set_child(&mut self, side: Side, child: NodeId) -> bool {
        match (&mut self.kind, side) {
            (NodeKind::Root { left, .. }, Side::Left) => *left = Some(child),
            (NodeKind::Root { right, .. }, Side::Right) => *right = Some(child),
            (NodeKind::Internal { left, .. }, Side::Left) => *left = child,
            (NodeKind::Internal { right, .. }, Side::Right) => *right = child,
            (NodeKind::Leaf { .. }, _) => return false,
        }
        true
    }
}

struct Slot<K> {
    node: Option<Node<K>>,
}

/// Arena owning every node of one hierarchy
///
/// Freed slots are recycled through a free list, so handles stay small and
/// allocation stays amortized O(1).
pub struct NodeArena<K> {
    slots: Vec<Slot<K>>,
    free_list: Vec<u32>,
    len: usize,
}

impl<K> NodeArena<K> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    pub fn insert(&mut self, node: Node<K>) -> NodeId {
        self.len += 1;

        if let Some(index) = self.free_list.pop() {
            self.slots[index as usize].node = Some(node);
            NodeId(index)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot { node: Some(node) });
            NodeId(index)
        }
    }

    pub fn remove(&mut self, id: NodeId) -> Option<Node<K>> {
        let node = self.slots.get_mut(id.0 as usize)?.node.take()?;
        self.free_list.push(id.0);
        self.len -= 1;
        Some(node)
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node<K>> {
        self.slots.get(id.0 as usize)?.node.as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<K>> {
        self.slots.get_mut(id.0 as usize)?.node.as_mut()
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop every node, keeping the allocation
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.len = 0;
    }
}

impl<K> Default for NodeArena<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Indexing a freed handle is a broken-hierarchy bug and panics.
impl<K> core::ops::Index<NodeId> for NodeArena<K> {
    type Output = Node<K>;

    #[inline]
    fn index(&self, id: NodeId) -> &Node<K> {
        match self.get(id) {
            Some(node) => node,
            None => panic!("dangling node handle {:?}", id),
        }
    }
}

impl<K> core::ops::IndexMut<NodeId> for NodeArena<K> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Node<K> {
        match self.get_mut(id) {
            Some(node) => node,
            None => panic!("dangling node handle {:?}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use void_math::Vec3;

    #[test]
    fn test_arena_recycles_slots() {
        let mut arena: NodeArena<u32> = NodeArena::new();
        let a = arena.insert(Node::root());
        let b = arena.insert(Node::leaf(7, 0, AABB::EMPTY));
        assert_eq!(arena.len(), 2);

        assert!(arena.remove(b).is_some());
        assert!(!arena.contains(b));
        assert!(arena.remove(b).is_none());

        let c = arena.insert(Node::leaf(8, 0, AABB::EMPTY));
        assert_eq!(c, b);
        assert_eq!(arena[c].object(), Some(8));
        assert!(arena[a].is_root());
    }

    #[test]
    fn test_set_child_and_side_of() {
        let mut arena: NodeArena<u32> = NodeArena::new();
        let leaf_a = arena.insert(Node::leaf(1, 0, AABB::new(Vec3::ZERO, Vec3::ONE)));
        let leaf_b = arena.insert(Node::leaf(2, 0, AABB::new(Vec3::ZERO, Vec3::ONE)));
        let mut root: Node<u32> = Node::root();

        assert_eq!(root.children(), (None, None));
        assert!(root.set_child(Side::Left, leaf_a));
        assert!(root.both_children().is_none());
        assert!(root.set_child(Side::Right, leaf_b));

        assert_eq!(root.both_children(), Some((leaf_a, leaf_b)));
        assert_eq!(root.side_of(leaf_b), Some(Side::Right));

        let mut leaf = arena[leaf_a].clone();
        assert!(!leaf.set_child(Side::Left, leaf_b));
    }
}
