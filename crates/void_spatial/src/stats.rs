//! Hierarchy statistics

use serde::{Deserialize, Serialize};

use crate::object::ObjectKey;
use crate::tree::SceneBvh;

/// Snapshot of a hierarchy's size and state
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialStats {
    /// Objects linked into the tree
    pub object_count: usize,
    /// Objects waiting for the next restructure
    pub pending_count: usize,
    pub node_count: usize,
    pub leaf_count: usize,
    /// Levels from the root down to the deepest leaf, root included
    pub depth: u32,
    /// Full rebuilds since creation
    pub rebuild_count: u64,
    pub dirty: bool,
}

impl<K: ObjectKey> SceneBvh<K> {
    pub fn stats(&self) -> SpatialStats {
        let mut leaf_count = 0;
        let mut depth = 0;

        let mut stack = Vec::new();
        stack.extend(self.root.map(|root| (root, 1u32)));
        while let Some((id, level)) = stack.pop() {
            let node = &self.nodes[id];
            depth = depth.max(level);
            if node.is_leaf() {
                leaf_count += 1;
                continue;
            }
            let (left, right) = node.children();
            stack.extend(left.map(|child| (child, level + 1)));
            stack.extend(right.map(|child| (child, level + 1)));
        }

        SpatialStats {
            object_count: self.all_objects.len(),
            pending_count: self.pending_objects.len(),
            node_count: self.nodes.len(),
            leaf_count,
            depth,
            rebuild_count: self.rebuild_count,
            dirty: self.dirty,
        }
    }

    /// Levels from the root to the deepest leaf, zero after teardown
    pub fn depth(&self) -> u32 {
        self.stats().depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::SceneProxy;
    use crate::tree::SceneTree;
    use void_math::{Vec3, AABB};

    #[test]
    fn test_stats_track_lifecycle() {
        let scene: Vec<SceneProxy> = (0..4)
            .map(|i| SceneProxy::new(AABB::new(Vec3::splat(i as f32 * 2.0), Vec3::splat(i as f32 * 2.0 + 1.0))))
            .collect();
        let mut tree: SceneBvh<usize> = SceneBvh::new();

        let empty = tree.stats();
        assert_eq!(empty.node_count, 1);
        assert_eq!(empty.depth, 1);

        tree.add_objects(&[0, 1, 2, 3]);
        assert_eq!(tree.stats().pending_count, 4);
        assert!(tree.stats().dirty);

        tree.restructure(&scene);
        let stats = tree.stats();
        assert_eq!(stats.object_count, 4);
        assert_eq!(stats.leaf_count, 4);
        // Root, two internal nodes, four leaves
        assert_eq!(stats.node_count, 7);
        assert_eq!(stats.depth, 3);
        assert_eq!(stats.rebuild_count, 1);

        tree.destroy();
        assert_eq!(tree.stats(), SpatialStats { rebuild_count: 1, ..Default::default() });
    }

    #[test]
    fn test_stats_serialize() {
        let tree: SceneBvh<u32> = SceneBvh::new();
        let json = serde_json::to_string(&tree.stats()).unwrap();
        assert!(json.contains("\"node_count\":1"));
    }
}
