//! The scene spatial index and its frame-level orchestration.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use void_math::{BoundingVolume, FrustumPlanes, Ray, AABB};

use crate::config::{RebuildPolicy, SpatialConfig};
use crate::error::Result;
use crate::node::{Node, NodeArena, NodeId};
use crate::object::{ObjectKey, SceneObjectSet};
use crate::profile::{scopes, ProfileHook, ProfileScope};

/// Identifies which spatial index strategy a scene is using
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SceneTreeType {
    /// Morton-ordered bounding volume hierarchy
    Bvh,
}

/// Interface a scene manager drives its spatial index through
///
/// Mutations are buffered until [`SceneTree::restructure`], except removals,
/// which apply immediately.
pub trait SceneTree<K: ObjectKey> {
    fn tree_type(&self) -> SceneTreeType;

    /// Queue an object for the next restructure
    fn add_object(&mut self, key: K);

    fn add_objects(&mut self, keys: &[K]) {
        for &key in keys {
            self.add_object(key);
        }
    }

    /// Remove an object, returning false if it is not tracked
    fn remove_object(&mut self, key: K) -> bool;

    fn remove_objects(&mut self, keys: &[K]) {
        for &key in keys {
            self.remove_object(key);
        }
    }

    /// Apply queued changes
    fn restructure<S: SceneObjectSet<K>>(&mut self, objects: &S);

    /// Tear down the whole tree and forget every object
    fn destroy(&mut self);

    fn get_all_objects(&self, out: &mut Vec<K>);

    /// Collect visible objects and update every active object's visibility
    fn get_all_visible_objects<S: SceneObjectSet<K>>(
        &self,
        frustum: &FrustumPlanes,
        objects: &mut S,
        out: &mut Vec<K>,
    );

    /// Objects whose bounds the ray hits, nearest first
    fn get_intersections_ray(&self, ray: &Ray, out: &mut Vec<K>);

    /// Objects whose bounds overlap `volume`, in traversal order
    fn get_intersections<V: BoundingVolume>(&self, volume: &V, out: &mut Vec<K>);
}

/// Where a tracked object currently sits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TrackState {
    /// Queued for the next restructure
    Pending,
    /// Has a leaf; `moved` is set while it waits in `moved_objects`
    Linked { moved: bool },
}

/// Dynamic bounding volume hierarchy over scene objects
pub struct SceneBvh<K> {
    pub(crate) nodes: NodeArena<K>,
    pub(crate) root: Option<NodeId>,
    /// Objects linked into the tree
    pub(crate) all_objects: Vec<K>,
    /// Objects added since the last restructure, not yet linked
    pub(crate) pending_objects: Vec<K>,
    /// Linked objects whose bounds changed since the last restructure
    pub(crate) moved_objects: Vec<K>,
    /// Membership index over the three lists above
    pub(crate) states: HashMap<K, TrackState>,
    pub(crate) removed_since_restructure: usize,
    /// Changes spliced in incrementally since the last full build
    pub(crate) changes_since_rebuild: usize,
    pub(crate) dirty: bool,
    pub(crate) rebuild_count: u64,
    pub(crate) config: SpatialConfig,
    pub(crate) profiler: Option<Arc<dyn ProfileHook>>,
}

impl<K: ObjectKey> SceneBvh<K> {
    /// Create an empty index whose queries all return nothing
    pub fn new() -> Self {
        Self::with_config(SpatialConfig::default())
    }

    /// Create with a configuration.
    ///
    /// An invalid configuration is replaced by the defaults with a warning;
    /// use [`SceneBvh::try_with_config`] to get the error instead.
    pub fn with_config(config: SpatialConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(err) => {
                log::warn!("{}; falling back to the default spatial config", err);
                SpatialConfig::default()
            }
        };

        let mut nodes = NodeArena::new();
        let root = nodes.insert(Node::root());
        Self {
            nodes,
            root: Some(root),
            all_objects: Vec::new(),
            pending_objects: Vec::new(),
            moved_objects: Vec::new(),
            states: HashMap::new(),
            removed_since_restructure: 0,
            changes_since_rebuild: 0,
            dirty: false,
            rebuild_count: 0,
            config,
            profiler: None,
        }
    }

    /// Create with a configuration, rejecting invalid values
    pub fn try_with_config(config: SpatialConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    /// Attach an instrumentation hook
    pub fn with_profiler(mut self, profiler: Arc<dyn ProfileHook>) -> Self {
        self.profiler = Some(profiler);
        self
    }

    pub fn set_profiler(&mut self, profiler: Option<Arc<dyn ProfileHook>>) {
        self.profiler = profiler;
    }

    pub fn config(&self) -> &SpatialConfig {
        &self.config
    }

    /// Number of objects linked into the tree
    #[inline]
    pub fn len(&self) -> usize {
        self.all_objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.all_objects.is_empty()
    }

    #[inline]
    pub fn pending_len(&self) -> usize {
        self.pending_objects.len()
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// True if `key` is linked into the tree or waiting to be
    pub fn contains(&self, key: K) -> bool {
        self.states.contains_key(&key)
    }

    /// Objects linked into the tree, in the order they were incorporated
    pub fn objects(&self) -> &[K] {
        &self.all_objects
    }

    /// Bounds of the whole scene as of the last fit
    pub fn root_bounds(&self) -> Option<AABB> {
        let root = &self.nodes[self.root?];
        if root.bounds.is_empty() {
            None
        } else {
            Some(root.bounds)
        }
    }

    /// Root handle, absent only after [`SceneTree::destroy`]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<K>> {
        self.nodes.get(id)
    }

    /// Record that a linked object's bounds changed
    ///
    /// Returns false if the object is not linked into the tree.
    pub fn mark_moved(&mut self, key: K) -> bool {
        let Some(TrackState::Linked { moved }) = self.states.get_mut(&key) else {
            return false;
        };
        if !*moved {
            *moved = true;
            self.moved_objects.push(key);
        }
        self.dirty = true;
        true
    }

    pub(crate) fn profile(&self, name: &'static str) -> ProfileScope {
        ProfileScope::new(self.profiler.as_ref(), name)
    }

    pub(crate) fn refresh_dirty(&mut self) {
        self.dirty = !self.pending_objects.is_empty()
            || !self.moved_objects.is_empty()
            || self.removed_since_restructure > 0;
    }

    /// Whether the queued changes call for a full rebuild.
    ///
    /// Under [`RebuildPolicy::Threshold`] the changes spliced in since the
    /// last build count along with the queued ones, so a steady trickle of
    /// small updates still rebuilds eventually.
    pub fn rebuild_needed(&self) -> bool {
        if !self.dirty {
            return false;
        }

        match self.config.rebuild_policy {
            RebuildPolicy::Always => true,
            RebuildPolicy::Threshold { ratio } => {
                let changed = self.queued_changes() + self.changes_since_rebuild;
                let tracked = (self.all_objects.len() + self.pending_objects.len()).max(1);
                changed as f32 / tracked as f32 > ratio
            }
        }
    }

    fn queued_changes(&self) -> usize {
        self.pending_objects.len() + self.moved_objects.len() + self.removed_since_restructure
    }

    /// Drop every node and start over with an empty root, keeping the
    /// object lists
    pub(crate) fn reset_shape(&mut self) {
        self.nodes.clear();
        self.root = Some(self.nodes.insert(Node::root()));
    }

    pub(crate) fn ensure_root(&mut self) -> NodeId {
        match self.root {
            Some(root) => root,
            None => {
                let root = self.nodes.insert(Node::root());
                self.root = Some(root);
                root
            }
        }
    }
}

impl<K: ObjectKey> Default for SceneBvh<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ObjectKey> SceneTree<K> for SceneBvh<K> {
    fn tree_type(&self) -> SceneTreeType {
        SceneTreeType::Bvh
    }

    fn add_object(&mut self, key: K) {
        if self.contains(key) {
            log::debug!("object {:?} is already tracked, ignoring add", key);
            return;
        }
        self.states.insert(key, TrackState::Pending);
        self.pending_objects.push(key);
        self.dirty = true;
    }

    fn remove_object(&mut self, key: K) -> bool {
        self.remove_linked_object(key)
    }

    fn restructure<S: SceneObjectSet<K>>(&mut self, objects: &S) {
        if !self.dirty {
            return;
        }

        let _scope = self.profile(scopes::RESTRUCTURE);

        if self.rebuild_needed() {
            let pending = std::mem::take(&mut self.pending_objects);
            self.all_objects.extend(pending);
            self.moved_objects.clear();
            self.reset_shape();
            self.build(objects);
        } else {
            self.changes_since_rebuild += self.queued_changes();
            self.insert_new_objects(objects);
            self.update_dirty_nodes(objects);

            let depth = self.depth();
            if depth > self.config.max_depth_warning {
                log::debug!(
                    "BVH depth {} exceeds {} after incremental update, rebuilding",
                    depth,
                    self.config.max_depth_warning
                );
                self.reset_shape();
                self.build(objects);
            }
        }

        self.removed_since_restructure = 0;
        self.dirty = false;
    }

    fn destroy(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.all_objects.clear();
        self.pending_objects.clear();
        self.moved_objects.clear();
        self.states.clear();
        self.removed_since_restructure = 0;
        self.changes_since_rebuild = 0;
        self.dirty = false;
    }

    fn get_all_objects(&self, out: &mut Vec<K>) {
        if let Some(root) = self.root {
            self.collect_leaves(root, out);
        }
    }

    fn get_all_visible_objects<S: SceneObjectSet<K>>(
        &self,
        frustum: &FrustumPlanes,
        objects: &mut S,
        out: &mut Vec<K>,
    ) {
        self.query_frustum(frustum, objects, out);
    }

    fn get_intersections_ray(&self, ray: &Ray, out: &mut Vec<K>) {
        out.extend(self.ray_hits(ray).into_iter().map(|(key, _)| key));
    }

    fn get_intersections<V: BoundingVolume>(&self, volume: &V, out: &mut Vec<K>) {
        self.query_volume(volume, out);
    }
}
