//! Incremental insertion and removal.
//!
//! Inserts splice a leaf in next to its nearest Morton neighbour and give the
//! touched nodes the midpoint of their children's keys. Those keys and the
//! bounds above the splice stay approximate until the fit pass that ends
//! every batch of inserts.

use void_math::AABB;

use crate::morton;
use crate::node::{Node, NodeId, NodeKind, Side};
use crate::object::{ObjectKey, SceneObjectSet};
use crate::profile::scopes;
use crate::tree::{SceneBvh, TrackState};

impl<K: ObjectKey> SceneBvh<K> {
    /// Link every pending object into the existing tree, then fit once
    pub(crate) fn insert_new_objects<S: SceneObjectSet<K>>(&mut self, objects: &S) {
        if self.pending_objects.is_empty() {
            return;
        }

        let pending = std::mem::take(&mut self.pending_objects);
        let mut inserted = 0usize;
        {
            let _scope = self.profile(scopes::INSERT);
            for key in pending {
                if self.insert_resolved(key, objects) {
                    self.all_objects.push(key);
                    self.states.insert(key, TrackState::Linked { moved: false });
                    inserted += 1;
                } else {
                    self.states.remove(&key);
                }
            }
        }

        if inserted > 0 {
            let root = self.ensure_root();
            self.fit_node_bounds(root, objects);
        }

        log::debug!(
            "BVH inserted {} objects incrementally, {} tracked",
            inserted,
            self.all_objects.len()
        );
    }

    /// Re-seat every moved object, then fit once
    pub(crate) fn update_dirty_nodes<S: SceneObjectSet<K>>(&mut self, objects: &S) {
        if self.moved_objects.is_empty() {
            return;
        }

        let moved = std::mem::take(&mut self.moved_objects);
        {
            let _scope = self.profile(scopes::INSERT);
            for &key in &moved {
                if let Some(TrackState::Linked { moved }) = self.states.get_mut(&key) {
                    *moved = false;
                }
                if !self.unlink(key) {
                    continue;
                }
                if !self.insert_resolved(key, objects) {
                    self.all_objects.retain(|&tracked| tracked != key);
                    self.states.remove(&key);
                }
            }
        }

        let root = self.ensure_root();
        self.fit_node_bounds(root, objects);

        log::debug!("BVH re-seated {} moved objects", moved.len());
    }

    fn insert_resolved<S: SceneObjectSet<K>>(&mut self, key: K, objects: &S) -> bool {
        match objects.bounds_of(key) {
            Some(bounds) => {
                self.insert_object(key, bounds);
                true
            }
            None => {
                log::warn!("dropping object {:?}: not found in scene", key);
                false
            }
        }
    }

    /// Splice a new leaf for `key` into the tree.
    ///
    /// The key is computed from the raw bounds center; there is no batch
    /// transform to normalize against between rebuilds. Bounds above the new
    /// leaf are left for the caller's fit pass.
    pub(crate) fn insert_object(&mut self, key: K, bounds: AABB) {
        let code = morton::calculate_point(bounds.center());
        let root = self.ensure_root();
        let leaf = self.nodes.insert(Node::leaf(key, code, bounds));

        log::trace!("inserting {:?} with key {:#x}", key, code);

        match self.nodes[root].children() {
            (None, None) => {
                self.attach(root, Side::Left, leaf);
                self.nodes[root].morton = code;
            }
            (Some(existing), None) | (None, Some(existing)) => {
                let (left, right) = if code < self.nodes[existing].morton {
                    (leaf, existing)
                } else {
                    (existing, leaf)
                };
                self.attach(root, Side::Left, left);
                self.attach(root, Side::Right, right);
                self.nodes[root].morton =
                    morton::midpoint(self.nodes[left].morton, self.nodes[right].morton);
            }
            (Some(_), Some(_)) => {
                let (parent, nearest) = self.find_nearest(root, code);
                self.splice(parent, nearest, leaf);
            }
        }
    }

    /// Descend by key from `root` to a leaf, returning it with its parent.
    ///
    /// Every node on the way has two children; a root with fewer is handled
    /// by the caller before descending.
    fn find_nearest(&self, root: NodeId, code: u64) -> (NodeId, NodeId) {
        let mut parent = root;
        loop {
            let node = &self.nodes[parent];
            let (left, right) = match node.both_children() {
                Some(children) => children,
                None => unreachable!("descent reached a node with a missing child"),
            };
            let next = if code < node.morton { left } else { right };
            if self.nodes[next].is_leaf() {
                return (parent, next);
            }
            parent = next;
        }
    }

    /// Three-way split at `parent`, which holds `nearest` among its two
    /// children. The smallest key of the three stays as `parent`'s left
    /// child; the other two go under a new internal node on the right.
    fn splice(&mut self, parent: NodeId, nearest: NodeId, leaf: NodeId) {
        debug_assert_eq!(self.nodes[nearest].parent, Some(parent));
        let Some((left, right)) = self.nodes[parent].both_children() else {
            unreachable!("splice parent must have two children");
        };

        let mut trio = [left, right, leaf];
        trio.sort_by_key(|&id| self.nodes[id].morton);
        let [smallest, a, b] = trio;

        let key_a = self.nodes[a].morton;
        let key_b = self.nodes[b].morton;
        let mut internal = Node::internal(a, b, morton::midpoint(key_a, key_b));
        internal.bounds = self.nodes[a].bounds.union(&self.nodes[b].bounds);
        let internal = self.nodes.insert(internal);
        self.nodes[a].parent = Some(internal);
        self.nodes[b].parent = Some(internal);

        self.attach(parent, Side::Left, smallest);
        self.attach(parent, Side::Right, internal);

        let key_smallest = self.nodes[smallest].morton;
        let key_internal = self.nodes[internal].morton;
        self.nodes[parent].morton = morton::midpoint(key_smallest, key_internal);
    }

    fn attach(&mut self, parent: NodeId, side: Side, child: NodeId) {
        self.nodes[parent].set_child(side, child);
        self.nodes[child].parent = Some(parent);
    }

    /// Remove `key` from the tree or from the pending queue.
    ///
    /// Takes effect immediately: bounds above the removed leaf are refit so
    /// queries stop reporting it before the next restructure.
    pub(crate) fn remove_linked_object(&mut self, key: K) -> bool {
        match self.states.get(&key).copied() {
            None => return false,
            Some(TrackState::Pending) => {
                self.states.remove(&key);
                self.pending_objects.retain(|&pending| pending != key);
                log::trace!("removed pending object {:?}", key);
                self.refresh_dirty();
                return true;
            }
            Some(TrackState::Linked { .. }) => {}
        }

        if !self.unlink(key) {
            log::warn!("object {:?} is tracked but has no leaf", key);
            return false;
        }

        log::trace!("removed object {:?}", key);

        self.states.remove(&key);
        if let Some(pos) = self.all_objects.iter().position(|&tracked| tracked == key) {
            self.all_objects.remove(pos);
        }
        self.moved_objects.retain(|&moved| moved != key);
        self.removed_since_restructure += 1;
        self.dirty = true;
        true
    }

    /// Detach and free the leaf holding `key`, leaving the object lists alone
    fn unlink(&mut self, key: K) -> bool {
        let Some(leaf) = self.find_leaf(key) else {
            return false;
        };
        let Some(parent) = self.nodes[leaf].parent else {
            return false;
        };

        self.nodes.remove(leaf);

        match self.nodes[parent].kind {
            NodeKind::Root { left, right } => {
                let survivor = if left == Some(leaf) { right } else { left };
                self.nodes[parent].kind = NodeKind::Root { left: survivor, right: None };
                self.refit_node(parent);
            }
            NodeKind::Internal { left, right } => {
                let sibling = if left == leaf { right } else { left };
                let grandparent = match self.nodes[parent].parent {
                    Some(grandparent) => grandparent,
                    None => unreachable!("internal node {:?} has no parent", parent),
                };
                let side = match self.nodes[grandparent].side_of(parent) {
                    Some(side) => side,
                    None => unreachable!("{:?} is not a child of its parent", parent),
                };

                self.nodes.remove(parent);
                self.attach(grandparent, side, sibling);
                self.refit_ancestors(grandparent);
            }
            NodeKind::Leaf { .. } => unreachable!("leaf {:?} has a leaf parent", leaf),
        }

        true
    }

    /// Depth-first search for the leaf holding `key`
    pub(crate) fn find_leaf(&self, key: K) -> Option<NodeId> {
        let mut stack = Vec::new();
        stack.extend(self.root);

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if node.object() == Some(key) {
                return Some(id);
            }
            let (left, right) = node.children();
            stack.extend(right);
            stack.extend(left);
        }

        None
    }
}
