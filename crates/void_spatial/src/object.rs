//! The scene objects a hierarchy indexes.
//!
//! Objects live in a collection owned by the scene; the hierarchy only keeps
//! their keys. Key equality is object identity.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::hash::{BuildHasher, Hash};

use void_math::AABB;

/// Identity of an object held by the scene
pub trait ObjectKey: Copy + Eq + Hash + Debug {}

impl<T: Copy + Eq + Hash + Debug> ObjectKey for T {}

/// What the hierarchy needs from a scene object
pub trait SceneObject {
    /// World-space bounds, read live at fit time
    fn bounds(&self) -> AABB;

    /// Inactive objects are skipped by visibility culling
    fn is_active(&self) -> bool {
        true
    }

    fn set_visible(&mut self, visible: bool);
}

/// A scene collection that resolves keys to objects
pub trait SceneObjectSet<K> {
    type Object: SceneObject;

    fn object(&self, key: K) -> Option<&Self::Object>;

    fn object_mut(&mut self, key: K) -> Option<&mut Self::Object>;

    #[inline]
    fn bounds_of(&self, key: K) -> Option<AABB> {
        self.object(key).map(SceneObject::bounds)
    }
}

impl<K, O, H> SceneObjectSet<K> for HashMap<K, O, H>
where
    K: Eq + Hash,
    O: SceneObject,
    H: BuildHasher,
{
    type Object = O;

    #[inline]
    fn object(&self, key: K) -> Option<&O> {
        self.get(&key)
    }

    #[inline]
    fn object_mut(&mut self, key: K) -> Option<&mut O> {
        self.get_mut(&key)
    }
}

impl<K: Ord, O: SceneObject> SceneObjectSet<K> for BTreeMap<K, O> {
    type Object = O;

    #[inline]
    fn object(&self, key: K) -> Option<&O> {
        self.get(&key)
    }

    #[inline]
    fn object_mut(&mut self, key: K) -> Option<&mut O> {
        self.get_mut(&key)
    }
}

impl<O: SceneObject> SceneObjectSet<usize> for Vec<O> {
    type Object = O;

    #[inline]
    fn object(&self, key: usize) -> Option<&O> {
        self.get(key)
    }

    #[inline]
    fn object_mut(&mut self, key: usize) -> Option<&mut O> {
        self.get_mut(key)
    }
}

/// Minimal scene object: a box with activity and visibility flags
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneProxy {
    pub bounds: AABB,
    pub active: bool,
    pub visible: bool,
}

impl SceneProxy {
    /// An active, not yet visible proxy
    pub fn new(bounds: AABB) -> Self {
        Self {
            bounds,
            active: true,
            visible: false,
        }
    }

    pub fn inactive(bounds: AABB) -> Self {
        Self {
            active: false,
            ..Self::new(bounds)
        }
    }
}

impl SceneObject for SceneProxy {
    #[inline]
    fn bounds(&self) -> AABB {
        self.bounds
    }

    #[inline]
    fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}
