//! Void Spatial - Dynamic Scene BVH
//!
//! A bounding volume hierarchy over scene objects, ordered by Morton keys and
//! kept up to date frame by frame.
//!
//! # Features
//!
//! - Linear BVH construction from sorted Morton keys
//! - Buffered adds, eager removals, one `restructure` per frame
//! - Optional incremental path that splices changes into the existing tree
//! - Frustum culling with per-object visibility updates
//! - Ray, sphere, AABB and OBB queries
//! - Pluggable profiling hook, statistics and structural validation
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                  SceneBvh<K>                  │
//! │  ┌────────────┐ ┌──────────┐ ┌─────────────┐ │
//! │  │ NodeArena  │ │ objects  │ │ SpatialConf │ │
//! │  └────────────┘ └──────────┘ └─────────────┘ │
//! └──────────────────────────────────────────────┘
//!        │ restructure              │ queries
//!   ┌────┴─────┬──────────┐    ┌────┴─────┐
//!   ▼          ▼          ▼    ▼          ▼
//! ┌──────┐ ┌────────┐ ┌─────┐ ┌───────┐ ┌─────┐
//! │build │ │ mutate │ │ fit │ │frustum│ │ ray │ ...
//! └──────┘ └────────┘ └─────┘ └───────┘ └─────┘
//! ```
//!
//! The tree holds keys only; objects stay in the scene's own collection and
//! are resolved through [`SceneObjectSet`] whenever bounds or visibility are
//! needed.
//!
//! # Example
//!
//! ```ignore
//! use void_spatial::prelude::*;
//! use void_math::prelude::*;
//!
//! let mut scene = vec![
//!     SceneProxy::new(AABB::new(Vec3::ZERO, Vec3::ONE)),
//!     SceneProxy::new(AABB::new(Vec3::splat(4.0), Vec3::splat(5.0))),
//! ];
//!
//! let mut tree: SceneBvh<usize> = SceneBvh::new();
//! tree.add_objects(&[0, 1]);
//! tree.restructure(&scene);
//!
//! let mut visible = Vec::new();
//! tree.get_all_visible_objects(&frustum, &mut scene, &mut visible);
//! ```

mod build;
mod fit;
mod mutate;
mod query;
mod validate;

pub mod config;
pub mod error;
pub mod morton;
pub mod node;
pub mod object;
pub mod profile;
pub mod stats;
pub mod tree;

pub mod prelude {
    //! Common imports for the scene index
    pub use crate::config::{RebuildPolicy, SpatialConfig};
    pub use crate::error::{Result, SpatialError, ValidationError};
    pub use crate::node::{Node, NodeId, NodeKind};
    pub use crate::object::{ObjectKey, SceneObject, SceneObjectSet, SceneProxy};
    pub use crate::profile::{ProfileHook, ScopeTiming, ScopeTimings};
    pub use crate::stats::SpatialStats;
    pub use crate::tree::{SceneBvh, SceneTree, SceneTreeType};
}

pub use prelude::*;
