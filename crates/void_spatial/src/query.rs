//! Pruned depth-first queries over the fitted tree.
//!
//! Every traversal keeps an explicit stack instead of recursing.

use void_math::{BoundingVolume, FrustumPlanes, FrustumTestResult, Ray};

use crate::node::NodeId;
use crate::object::{ObjectKey, SceneObject, SceneObjectSet};
use crate::profile::scopes;
use crate::tree::SceneBvh;

impl<K: ObjectKey> SceneBvh<K> {
    /// Append every object below `id`, left before right
    pub(crate) fn collect_leaves(&self, id: NodeId, out: &mut Vec<K>) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if let Some(object) = node.object() {
                out.push(object);
                continue;
            }
            let (left, right) = node.children();
            stack.extend(right);
            stack.extend(left);
        }
    }

    /// Frustum cull.
    ///
    /// Active objects inside or touching the frustum are marked visible and
    /// collected; active objects in pruned subtrees are marked not visible.
    /// Inactive objects are left untouched.
    pub(crate) fn query_frustum<S: SceneObjectSet<K>>(
        &self,
        frustum: &FrustumPlanes,
        objects: &mut S,
        out: &mut Vec<K>,
    ) {
        let _scope = self.profile(scopes::QUERY_FRUSTUM);
        if let Some(root) = self.root {
            self.cull_from(root, frustum, objects, out);
        }
    }

    fn cull_from<S: SceneObjectSet<K>>(
        &self,
        root: NodeId,
        frustum: &FrustumPlanes,
        objects: &mut S,
        out: &mut Vec<K>,
    ) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            let (left, right) = node.children();
            if !node.is_leaf() && left.is_none() && right.is_none() {
                continue;
            }

            match frustum.contains_aabb(&node.bounds) {
                FrustumTestResult::Outside => self.set_subtree_visible(id, false, objects, None),
                FrustumTestResult::Inside => {
                    self.set_subtree_visible(id, true, objects, Some(&mut *out))
                }
                FrustumTestResult::Intersecting => {
                    if node.is_leaf() {
                        self.set_subtree_visible(id, true, objects, Some(&mut *out));
                        continue;
                    }
                    stack.extend(right);
                    stack.extend(left);
                }
            }
        }
    }

    // Marks every active object below `id`, collecting them when `out` is given.
    fn set_subtree_visible<S: SceneObjectSet<K>>(
        &self,
        id: NodeId,
        visible: bool,
        objects: &mut S,
        mut out: Option<&mut Vec<K>>,
    ) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            let Some(key) = node.object() else {
                let (left, right) = node.children();
                stack.extend(right);
                stack.extend(left);
                continue;
            };

            let Some(object) = objects.object_mut(key) else {
                continue;
            };
            if !object.is_active() {
                continue;
            }
            object.set_visible(visible);
            if let Some(out) = out.as_deref_mut() {
                out.push(key);
            }
        }
    }

    /// Objects whose bounds `ray` hits, with the hit distance, nearest first
    pub fn ray_hits(&self, ray: &Ray) -> Vec<(K, f32)> {
        let _scope = self.profile(scopes::QUERY_RAY);
        let mut hits = Vec::new();

        let mut stack = Vec::new();
        stack.extend(self.root);
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            let Some(hit) = ray.intersects(&node.bounds) else {
                continue;
            };
            if let Some(object) = node.object() {
                hits.push((object, hit.distance));
                continue;
            }
            let (left, right) = node.children();
            stack.extend(right);
            stack.extend(left);
        }

        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        hits
    }

    pub(crate) fn query_volume<V: BoundingVolume>(&self, volume: &V, out: &mut Vec<K>) {
        let _scope = self.profile(scopes::QUERY_VOLUME);

        let mut stack = Vec::new();
        stack.extend(self.root);
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if node.bounds.is_empty() || !volume.intersects_aabb(&node.bounds) {
                continue;
            }
            if let Some(object) = node.object() {
                out.push(object);
                continue;
            }
            let (left, right) = node.children();
            stack.extend(right);
            stack.extend(left);
        }
    }
}
