//! Structural self-check for the hierarchy.

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::node::{NodeId, NodeKind};
use crate::object::ObjectKey;
use crate::tree::SceneBvh;

impl<K: ObjectKey> SceneBvh<K> {
    /// Walk the whole tree and check its invariants.
    ///
    /// Checks the strict binary shape, parent back-references, that bounds
    /// enclose children and that leaves and tracked objects match one to one.
    /// Bounds are only guaranteed after a restructure, so call this between
    /// frames rather than mid-mutation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let Some(root) = self.root else {
            if self.all_objects.is_empty() && self.nodes.is_empty() {
                return Ok(());
            }
            return Err(ValidationError::MissingRoot);
        };

        let root_node = self.nodes.get(root).ok_or(ValidationError::DanglingNode(root))?;
        if !root_node.is_root() {
            return Err(ValidationError::MissingRoot);
        }
        if let NodeKind::Root { left: None, right: Some(_) } = root_node.kind {
            return Err(ValidationError::RootRightOnly);
        }

        let tracked: HashSet<K> = self.all_objects.iter().copied().collect();
        let mut seen_objects = HashSet::new();
        let mut visited = HashSet::new();
        let mut stack = vec![(root, None::<NodeId>)];

        while let Some((id, expected_parent)) = stack.pop() {
            if !visited.insert(id) {
                return Err(ValidationError::Cycle(id));
            }
            let node = self.nodes.get(id).ok_or(ValidationError::DanglingNode(id))?;

            if node.parent != expected_parent {
                return Err(ValidationError::ParentMismatch {
                    child: id,
                    expected: expected_parent,
                    found: node.parent,
                });
            }
            if id != root && node.is_root() {
                return Err(ValidationError::NestedRoot(id));
            }

            if let Some(object) = node.object() {
                if !tracked.contains(&object) {
                    return Err(ValidationError::UntrackedLeaf(format!("{:?}", object)));
                }
                if !seen_objects.insert(object) {
                    return Err(ValidationError::DuplicateLeaf(format!("{:?}", object)));
                }
                continue;
            }

            let (left, right) = node.children();
            for child in [left, right].into_iter().flatten() {
                let child_node = self.nodes.get(child).ok_or(ValidationError::DanglingNode(child))?;
                if !child_node.bounds.is_empty() && !node.bounds.contains_aabb(&child_node.bounds) {
                    return Err(ValidationError::LooseBounds(id));
                }
                stack.push((child, Some(id)));
            }
        }

        if seen_objects.len() != tracked.len() || tracked.len() != self.all_objects.len() {
            return Err(ValidationError::LeafCountMismatch {
                tracked: self.all_objects.len(),
                leaves: seen_objects.len(),
            });
        }

        if visited.len() != self.nodes.len() {
            return Err(ValidationError::OrphanedNodes {
                reachable: visited.len(),
                allocated: self.nodes.len(),
            });
        }

        Ok(())
    }
}
