//! Bottom-up bounds fitting.

use void_math::AABB;

use crate::morton;
use crate::node::{NodeId, NodeKind};
use crate::object::{ObjectKey, SceneObjectSet};
use crate::profile::scopes;
use crate::tree::SceneBvh;

impl<K: ObjectKey> SceneBvh<K> {
    /// Refit bounds and keys of the subtree under `id`.
    ///
    /// Leaves read their object's live bounds; everything above becomes the
    /// union of its children and takes the key of that union's center. A leaf
    /// whose object no longer resolves keeps its last bounds.
    pub(crate) fn fit_node_bounds<S: SceneObjectSet<K>>(&mut self, id: NodeId, objects: &S) {
        let _scope = self.profile(scopes::FIT);

        // Parents come before their children here, so the reverse walk sees
        // every child fitted before the node above it.
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            order.push(id);
            let (left, right) = self.nodes[id].children();
            stack.extend(left);
            stack.extend(right);
        }

        for &id in order.iter().rev() {
            match self.nodes[id].kind {
                NodeKind::Leaf { object } => {
                    if let Some(bounds) = objects.bounds_of(object) {
                        self.nodes[id].bounds = bounds;
                    }
                }
                NodeKind::Internal { .. } | NodeKind::Root { .. } => self.refit_node(id),
            }
        }
    }

    /// Recompute one node from its children's current bounds
    pub(crate) fn refit_node(&mut self, id: NodeId) {
        let (left, right) = self.nodes[id].children();
        if left.is_none() && right.is_none() {
            if self.nodes[id].is_root() {
                self.nodes[id].bounds = AABB::EMPTY;
                self.nodes[id].morton = 0;
            }
            return;
        }

        let mut bounds = AABB::EMPTY;
        for child in [left, right].into_iter().flatten() {
            bounds.expand_to_contain(&self.nodes[child].bounds);
        }

        let node = &mut self.nodes[id];
        node.bounds = bounds;
        node.morton = morton::calculate_point(bounds.center());
    }

    /// Refit `id` and every node above it
    pub(crate) fn refit_ancestors(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(id) = current {
            self.refit_node(id);
            current = self.nodes[id].parent;
        }
    }
}
