//! Top-down hierarchy construction from sorted Morton keys.
//!
//! Keys are sorted once; each range is then split where the highest differing
//! key bit flips, found by binary search over the common prefix length. The
//! result approximates a radix tree over the keys.

use void_math::{Vec3, AABB};

use crate::morton;
use crate::node::{Node, NodeId, NodeKind};
use crate::object::{ObjectKey, SceneObjectSet};
use crate::profile::scopes;
use crate::tree::{SceneBvh, TrackState};

/// Sorted build input: parallel key and object arrays
struct BuildInput<K> {
    codes: Vec<u64>,
    objects: Vec<(K, AABB)>,
}

/// Index of the last element of the left half of `codes[first..=last]`.
///
/// The left half is the longest run from `first` whose keys share more
/// leading bits with `codes[first]` than `codes[first]` shares with
/// `codes[last]`. When every key in the range is equal the range is halved.
pub(crate) fn find_split(codes: &[u64], first: usize, last: usize) -> usize {
    let first_code = codes[first];
    let last_code = codes[last];

    if first_code == last_code {
        return (first + last) / 2;
    }

    let common_prefix = (first_code ^ last_code).leading_zeros();

    let mut split = first;
    let mut step = last - first;

    loop {
        step = (step + 1) >> 1;
        let candidate = split + step;

        if candidate < last {
            let prefix = (first_code ^ codes[candidate]).leading_zeros();
            if prefix > common_prefix {
                split = candidate;
            }
        }

        if step <= 1 {
            break;
        }
    }

    split
}

impl<K: ObjectKey> SceneBvh<K> {
    /// Rebuild the whole tree from `all_objects`.
    ///
    /// Expects an empty root (see `reset_shape`) and no pending objects.
    /// Objects that no longer resolve in `objects` are dropped.
    pub(crate) fn build<S: SceneObjectSet<K>>(&mut self, objects: &S) {
        let _scope = self.profile(scopes::BUILD);
        let root = self.ensure_root();

        let mut resolved = Vec::with_capacity(self.all_objects.len());
        let states = &mut self.states;
        self.all_objects.retain(|&key| match objects.bounds_of(key) {
            Some(bounds) => {
                resolved.push((key, bounds));
                states.insert(key, TrackState::Linked { moved: false });
                true
            }
            None => {
                log::warn!("dropping object {:?}: not found in scene", key);
                states.remove(&key);
                false
            }
        });

        self.rebuild_count += 1;
        self.changes_since_rebuild = 0;

        if resolved.is_empty() {
            self.nodes[root].bounds = AABB::EMPTY;
            self.nodes[root].morton = 0;
            log::debug!("BVH build #{}: empty scene", self.rebuild_count);
            return;
        }

        let input = self.sort_by_morton(resolved);
        let last = input.codes.len() - 1;

        let (left, right) = if last == 0 {
            (self.generate_tree(&input, 0, 0), None)
        } else {
            let split = find_split(&input.codes, 0, last);
            (
                self.generate_tree(&input, 0, split),
                Some(self.generate_tree(&input, split + 1, last)),
            )
        };

        self.nodes[left].parent = Some(root);
        if let Some(right) = right {
            self.nodes[right].parent = Some(root);
        }
        let root_node = &mut self.nodes[root];
        root_node.kind = NodeKind::Root { left: Some(left), right };
        root_node.morton = input.codes[0];

        self.fit_node_bounds(root, objects);

        let depth = self.depth();
        if depth > self.config.max_depth_warning {
            log::warn!(
                "BVH depth {} exceeds {} for {} objects; Morton keys are heavily clustered",
                depth,
                self.config.max_depth_warning,
                self.all_objects.len()
            );
        }

        log::debug!(
            "BVH build #{}: {} objects, {} nodes, depth {}",
            self.rebuild_count,
            self.all_objects.len(),
            self.nodes.len(),
            depth
        );
    }

    fn sort_by_morton(&self, resolved: Vec<(K, AABB)>) -> BuildInput<K> {
        let centers: Vec<Vec3> = resolved.iter().map(|(_, bounds)| bounds.center()).collect();
        let entries = morton::calculate_batch(&centers, self.config.morton_epsilon, true);

        BuildInput {
            codes: entries.iter().map(|entry| entry.code).collect(),
            objects: entries.iter().map(|entry| resolved[entry.index]).collect(),
        }
    }

    /// Build the subtree for `first..=last`. The caller links its parent.
    fn generate_tree(&mut self, input: &BuildInput<K>, first: usize, last: usize) -> NodeId {
        if first == last {
            let (object, bounds) = input.objects[first];
            return self.nodes.insert(Node::leaf(object, input.codes[first], bounds));
        }

        let split = find_split(&input.codes, first, last);
        let left = self.generate_tree(input, first, split);
        let right = self.generate_tree(input, split + 1, last);

        let morton = morton::midpoint(self.nodes[left].morton, self.nodes[right].morton);
        let id = self.nodes.insert(Node::internal(left, right, morton));
        self.nodes[left].parent = Some(id);
        self.nodes[right].parent = Some(id);
        id
    }
}
