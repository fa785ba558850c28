//! End-to-end tests for the scene BVH
//!
//! Each test drives the index the way a scene manager does: queue changes,
//! restructure once, then query.

use std::collections::HashMap;
use std::sync::Arc;

use approx::assert_relative_eq;
use void_math::prelude::*;
use void_spatial::morton;
use void_spatial::prelude::*;
use void_spatial::profile::scopes;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn cube(min: Vec3, size: f32) -> SceneProxy {
    SceneProxy::new(AABB::new(min, min + Vec3::splat(size)))
}

/// Disjoint unit-ish cubes on a coarse 3D grid
fn scattered_scene(count: usize) -> Vec<SceneProxy> {
    (0..count)
        .map(|i| {
            let x = (i % 7) as f32 * 3.0;
            let y = ((i / 7) % 5) as f32 * 3.0;
            let z = (i / 35) as f32 * 3.0;
            cube(Vec3::new(x, y, z), 1.0 + (i % 3) as f32 * 0.25)
        })
        .collect()
}

fn build_tree(scene: &Vec<SceneProxy>) -> SceneBvh<usize> {
    let mut tree = SceneBvh::new();
    tree.add_objects(&(0..scene.len()).collect::<Vec<_>>());
    tree.restructure(scene);
    tree
}

fn sorted(mut keys: Vec<usize>) -> Vec<usize> {
    keys.sort_unstable();
    keys
}

#[test]
fn morton_keys_follow_ascending_points() {
    let points = [
        (0.0, 0.0, 0.0),
        (0.1, 0.0, 0.0),
        (0.0, 0.2, 0.0),
        (0.1, 0.2, 0.0),
        (0.7, 0.5, 0.7),
        (0.7001, 0.5, 0.7),
        (0.9, 0.9, 0.9),
    ];

    let codes: Vec<u64> = points
        .iter()
        .map(|&(x, y, z)| morton::calculate(x, y, z))
        .collect();

    for pair in codes.windows(2) {
        assert!(pair[0] < pair[1], "{:#x} !< {:#x}", pair[0], pair[1]);
    }
}

#[test]
fn build_then_get_all_objects_round_trips() {
    init_logging();

    for count in [1, 2, 3, 17, 64, 150] {
        let scene = scattered_scene(count);
        let tree = build_tree(&scene);

        let mut all = Vec::new();
        tree.get_all_objects(&mut all);
        assert_eq!(sorted(all), (0..count).collect::<Vec<_>>(), "count {}", count);
        assert_eq!(tree.validate(), Ok(()));
    }
}

#[test]
fn frustum_culls_and_marks_visibility() {
    init_logging();

    // Camera at the origin looking down -Z.
    let frustum = FrustumPlanes::perspective(
        Vec3::ZERO,
        Vec3::NEG_Z,
        Vec3::Y,
        radians(60.0),
        1.0,
        0.1,
        100.0,
    );

    let mut scene = vec![
        cube(Vec3::new(-0.5, -0.5, -10.5), 1.0),  // 0: straight ahead
        cube(Vec3::new(1.0, 0.5, -20.0), 1.0),    // 1: ahead, slightly up-right
        cube(Vec3::new(-0.5, -0.5, 10.0), 1.0),   // 2: behind the camera
        cube(Vec3::new(-100.0, 0.0, -10.0), 1.0), // 3: far to the left
        cube(Vec3::new(0.0, 0.0, -500.0), 1.0),   // 4: past the far plane
    ];
    scene[2].visible = true;
    scene[3].visible = true;
    scene.push(SceneProxy::inactive(AABB::new(
        Vec3::new(-0.5, -0.5, -5.5),
        Vec3::new(0.5, 0.5, -4.5),
    ))); // 5: in view but inactive

    let tree = build_tree(&scene);

    let mut visible = Vec::new();
    tree.get_all_visible_objects(&frustum, &mut scene, &mut visible);

    assert_eq!(sorted(visible), vec![0, 1]);
    assert!(scene[0].visible);
    assert!(scene[1].visible);
    assert!(!scene[2].visible);
    assert!(!scene[3].visible);
    assert!(!scene[4].visible);
    assert!(!scene[5].visible, "inactive objects are never marked visible");

    // Turning the camera around flips the result.
    let behind = FrustumPlanes::perspective(
        Vec3::ZERO,
        Vec3::Z,
        Vec3::Y,
        radians(60.0),
        1.0,
        0.1,
        100.0,
    );
    let mut visible = Vec::new();
    tree.get_all_visible_objects(&behind, &mut scene, &mut visible);
    assert_eq!(visible, vec![2]);
    assert!(!scene[0].visible);
    assert!(scene[2].visible);
}

#[test]
fn ray_results_are_nearest_first() {
    init_logging();

    // Inserted out of distance order on purpose.
    let scene = vec![
        cube(Vec3::new(10.0, 0.0, 0.0), 1.0),
        cube(Vec3::new(1.0, 0.0, 0.0), 1.0),
        cube(Vec3::new(5.0, 0.0, 0.0), 1.0),
        cube(Vec3::new(5.0, 4.0, 0.0), 1.0),
    ];
    let tree = build_tree(&scene);
    let ray = Ray::new(Vec3::new(0.0, 0.5, 0.5), Vec3::X);

    let mut hits = Vec::new();
    tree.get_intersections_ray(&ray, &mut hits);
    assert_eq!(hits, vec![1, 2, 0]);

    let distances: Vec<f32> = tree.ray_hits(&ray).into_iter().map(|(_, d)| d).collect();
    assert_eq!(distances.len(), 3);
    assert_relative_eq!(distances[0], 1.0);
    assert_relative_eq!(distances[1], 5.0);
    assert_relative_eq!(distances[2], 10.0);
}

#[test]
fn insert_then_remove_everything_empties_tree() {
    init_logging();

    let scene = scattered_scene(40);
    let mut tree = build_tree(&scene);

    // Interleave the removal order so both sides of the tree shrink.
    let order: Vec<usize> = (0..40).map(|i| (i * 17) % 40).collect();
    for (n, &key) in order.iter().enumerate() {
        assert!(tree.remove_object(key), "removing {}", key);
        if n % 5 == 0 {
            assert_eq!(tree.validate(), Ok(()));
        }
    }

    assert!(tree.is_empty());
    let mut all = Vec::new();
    tree.get_all_objects(&mut all);
    assert!(all.is_empty());

    let root = tree.node(tree.root().unwrap()).unwrap();
    assert_eq!(root.children(), (None, None));
    assert_eq!(tree.stats().node_count, 1);
    assert!(!tree.remove_object(0));
}

#[test]
fn removal_promotes_sibling_and_refits() {
    init_logging();

    let scene = scattered_scene(8);
    let mut tree = build_tree(&scene);

    let victim = 3;
    assert!(tree.remove_object(victim));
    assert_eq!(tree.validate(), Ok(()));

    let mut all = Vec::new();
    tree.get_all_objects(&mut all);
    assert_eq!(sorted(all), vec![0, 1, 2, 4, 5, 6, 7]);

    let mut found = Vec::new();
    tree.get_intersections(&scene[victim].bounds, &mut found);
    assert!(found.is_empty(), "removed object still reported: {:?}", found);

    for sibling in [2, 4] {
        found.clear();
        tree.get_intersections(&scene[sibling].bounds, &mut found);
        assert_eq!(found, vec![sibling]);
    }

    // Every survivor is still enclosed after the upward refit.
    let root_bounds = tree.root_bounds().unwrap();
    for key in [0, 1, 2, 4, 5, 6, 7] {
        assert!(root_bounds.contains_aabb(&scene[key].bounds));
    }
}

#[test]
fn empty_tree_queries_return_nothing() {
    let mut scene: Vec<SceneProxy> = Vec::new();
    let tree: SceneBvh<usize> = SceneBvh::new();
    let mut out = Vec::new();

    tree.get_all_objects(&mut out);
    let frustum = FrustumPlanes::from_aabb(&AABB::new(Vec3::splat(-1.0), Vec3::ONE));
    tree.get_all_visible_objects(&frustum, &mut scene, &mut out);
    tree.get_intersections_ray(&Ray::new(Vec3::ZERO, Vec3::X), &mut out);
    tree.get_intersections(&Sphere::new(Vec3::ZERO, 10.0), &mut out);
    tree.get_intersections(&AABB::new(Vec3::splat(-5.0), Vec3::splat(5.0)), &mut out);
    tree.get_intersections(&Obb::from_aabb(&AABB::new(Vec3::ZERO, Vec3::ONE)), &mut out);

    assert!(out.is_empty());
    assert_eq!(tree.validate(), Ok(()));
}

#[test]
fn removals_are_visible_before_restructure() {
    let scene = scattered_scene(10);
    let mut tree = build_tree(&scene);

    tree.add_object(99);
    tree.remove_objects(&[0, 1]);

    let mut all = Vec::new();
    tree.get_all_objects(&mut all);
    assert_eq!(sorted(all), (2..10).collect::<Vec<_>>());

    // The pending key never resolves in the scene and is dropped at rebuild.
    tree.restructure(&scene);
    assert_eq!(tree.len(), 8);
    assert_eq!(tree.validate(), Ok(()));
}

#[test]
fn threshold_policy_mixes_rebuilds_and_incremental_updates() {
    init_logging();

    let mut scene = scattered_scene(60);
    let config = SpatialConfig::from_json(
        r#"{ "rebuild_policy": { "mode": "threshold", "ratio": 0.2 } }"#,
    )
    .unwrap();
    let mut tree: SceneBvh<usize> = SceneBvh::with_config(config);

    tree.add_objects(&(0..50).collect::<Vec<_>>());
    tree.restructure(&scene);
    assert_eq!(tree.stats().rebuild_count, 1);

    // A handful of changes stays incremental.
    tree.add_objects(&[50, 51, 52]);
    tree.remove_object(7);
    scene[12].bounds = AABB::new(Vec3::splat(40.0), Vec3::splat(41.0));
    tree.mark_moved(12);
    tree.restructure(&scene);

    let stats = tree.stats();
    assert_eq!(stats.rebuild_count, 1);
    assert_eq!(stats.object_count, 52);
    assert!(!stats.dirty);
    assert_eq!(tree.validate(), Ok(()));

    let mut found = Vec::new();
    tree.get_intersections(&AABB::new(Vec3::splat(39.0), Vec3::splat(42.0)), &mut found);
    assert_eq!(found, vec![12]);

    // A large batch crosses the threshold.
    tree.add_objects(&(53..60).collect::<Vec<_>>());
    tree.remove_objects(&(0..10).collect::<Vec<_>>());
    tree.restructure(&scene);
    assert_eq!(tree.stats().rebuild_count, 2);
    assert_eq!(tree.len(), 50);
    assert_eq!(tree.validate(), Ok(()));
}

#[test]
fn one_insert_per_frame_keeps_depth_bounded() {
    init_logging();

    let scene: Vec<SceneProxy> = (0..3000)
        .map(|i| cube(Vec3::new(i as f32 * 2.0, 0.0, 0.0), 1.0))
        .collect();
    let config = SpatialConfig::default()
        .with_rebuild_policy(RebuildPolicy::Threshold { ratio: 0.5 });
    let max_depth = config.max_depth_warning;
    let mut tree: SceneBvh<usize> = SceneBvh::with_config(config);

    tree.add_objects(&(0..100).collect::<Vec<_>>());
    tree.restructure(&scene);

    for key in 100..scene.len() {
        tree.add_object(key);
        tree.restructure(&scene);
        let depth = tree.depth();
        assert!(depth <= max_depth, "depth {} after inserting {}", depth, key);
    }

    assert!(tree.stats().rebuild_count > 1);
    assert_eq!(tree.len(), scene.len());
    assert_eq!(tree.validate(), Ok(()));

    let hits = tree.ray_hits(&Ray::new(Vec3::new(-5.0, 0.5, 0.5), Vec3::X));
    assert_eq!(hits.len(), scene.len());
    assert_eq!(hits[0].0, 0);

    let mut all = Vec::new();
    tree.get_all_objects(&mut all);
    assert_eq!(sorted(all), (0..scene.len()).collect::<Vec<_>>());
}

#[test]
fn works_with_hashmap_scenes() {
    let mut scene: HashMap<u64, SceneProxy> = HashMap::new();
    for id in [11u64, 42, 7, 1000] {
        scene.insert(id, cube(Vec3::splat(id as f32 * 0.01), 0.5));
    }

    let mut tree: SceneBvh<u64> = SceneBvh::new();
    tree.add_objects(&[11, 42, 7, 1000]);
    tree.restructure(&scene);

    let mut found = Vec::new();
    tree.get_intersections(&Sphere::new(Vec3::splat(10.25), 0.1), &mut found);
    assert_eq!(found, vec![1000]);

    scene.remove(&42);
    assert!(tree.remove_object(42));
    assert_eq!(tree.validate(), Ok(()));
}

#[test]
fn profiler_sees_each_pass() {
    let timings = Arc::new(ScopeTimings::new());
    let scene = scattered_scene(20);
    let mut tree: SceneBvh<usize> = SceneBvh::new().with_profiler(timings.clone());

    tree.add_objects(&(0..20).collect::<Vec<_>>());
    tree.restructure(&scene);
    let mut out = Vec::new();
    tree.get_intersections_ray(&Ray::new(Vec3::splat(-1.0), Vec3::ONE), &mut out);
    tree.get_intersections(&Sphere::new(Vec3::ZERO, 2.0), &mut out);

    let calls = |name: &str| timings.get(name).map(|t| t.calls).unwrap_or(0);
    assert_eq!(calls(scopes::RESTRUCTURE), 1);
    assert_eq!(calls(scopes::BUILD), 1);
    assert_eq!(calls(scopes::FIT), 1);
    assert_eq!(calls(scopes::QUERY_RAY), 1);
    assert_eq!(calls(scopes::QUERY_VOLUME), 1);
    assert_eq!(calls(scopes::QUERY_FRUSTUM), 0);
}

#[test]
fn destroy_then_reuse() {
    let scene = scattered_scene(12);
    let mut tree = build_tree(&scene);

    tree.destroy();
    assert_eq!(tree.stats().node_count, 0);
    assert_eq!(tree.validate(), Ok(()));

    tree.add_objects(&[3, 4, 5]);
    tree.restructure(&scene);
    let mut all = Vec::new();
    tree.get_all_objects(&mut all);
    assert_eq!(sorted(all), vec![3, 4, 5]);
}
