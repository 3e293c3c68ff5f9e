//! The externally visible index handle.

use tracing::debug;

use crate::bounds::Aabb;
use crate::config::{TreeConfig, DEFAULT_MAX_DEPTH, DEFAULT_MAX_OBJECTS};
use crate::error::ConfigError;
use crate::object::BoundedObject;
use crate::tree::node::{Limits, Node, Removal};

/// Read-only view of one node, yielded by [`Quadtree::visit_nodes`].
///
/// Enough for a debug collaborator to render the partition (node regions by
/// depth, stored objects by their boxes) without this crate depending on
/// any rendering facility.
#[derive(Debug, Clone, Copy)]
pub struct NodeView<'a, T> {
    pub depth: u32,
    pub bounds: Aabb,
    pub objects: &'a [T],
}

/// Adaptive 2D spatial index over bounded-object handles.
///
/// Enumerates candidate pairs of objects whose bounding boxes might
/// overlap, so callers can skip the O(n²) all-pairs scan. The tree
/// subdivides a region on demand as objects cluster and collapses the
/// subdivisions again as they thin out. Moved objects must be removed and
/// re-inserted by the caller.
///
/// Single-threaded and synchronous: every operation runs to completion.
pub struct Quadtree<T> {
    root: Node<T>,
    limits: Limits,
    total_objects: usize,
}

impl<T: BoundedObject> Quadtree<T> {
    /// Create an index covering `bounds` with the default limits
    /// (max depth 6, 8 objects per node).
    pub fn new(bounds: Aabb) -> Self {
        Self::with_limits(DEFAULT_MAX_DEPTH, DEFAULT_MAX_OBJECTS, bounds)
    }

    /// Create an index with explicit limits.
    ///
    /// `max_depth` is the hard backstop on subdivision; `max_objects` is
    /// the soft per-node threshold past which a leaf splits.
    pub fn with_limits(max_depth: u32, max_objects: usize, bounds: Aabb) -> Self {
        Self {
            root: Node::new(0, bounds),
            limits: Limits {
                max_depth,
                max_objects,
            },
            total_objects: 0,
        }
    }

    /// Validate `config` and build an index from it.
    pub fn from_config(config: &TreeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_limits(
            config.max_depth,
            config.max_objects,
            config.bounds.to_aabb(),
        ))
    }

    /// Add a handle to the tree, branching as needed. Always succeeds:
    /// classification terminates at some node at or above the depth cap.
    pub fn insert(&mut self, object: T) {
        self.root.insert(object, &self.limits);
        self.total_objects += 1;
    }

    /// Find and remove the handle identity-equal to `object`.
    ///
    /// Returns `true` iff a handle was removed anywhere in the tree;
    /// removing an absent object is a silent no-op. A successful removal
    /// triggers collapse evaluation up the ancestor chain.
    pub fn remove(&mut self, object: &T) -> bool {
        match self.root.remove(object, &self.limits) {
            Removal::NotFound => false,
            Removal::Here => {
                // The root has no parent frame; the index stands in for it.
                self.root.evaluate_children(&self.limits);
                self.total_objects -= 1;
                true
            }
            Removal::Below => {
                self.total_objects -= 1;
                true
            }
        }
    }

    /// Drop every handle and every node below the root.
    pub fn clear(&mut self) {
        self.root.reset();
        self.total_objects = 0;
        debug!("cleared spatial index");
    }

    /// Replace the tree's region and rebuild.
    ///
    /// Every stored handle is gathered, the subdivision discarded, and the
    /// population re-inserted under the new geometry, so classification
    /// and search never disagree about where an object lives. The total
    /// count is unchanged.
    pub fn resize(&mut self, bounds: Aabb) {
        let mut population = Vec::with_capacity(self.total_objects);
        self.root.drain_subtree(&mut population);
        self.root.bounds = bounds;
        for object in population {
            self.root.insert(object, &self.limits);
        }
        debug!(objects = self.total_objects, "resized spatial index");
    }

    /// Append every stored object other than `object` itself (compared by
    /// identity) whose box overlaps `object`'s box.
    pub fn collision_candidates<'a>(&'a self, object: &T, out: &mut Vec<&'a T>) {
        let aabb = object.aabb();

        let mut potential = Vec::new();
        self.root.search(&aabb, &mut potential);

        for other in potential {
            if other == object {
                continue;
            }
            if other.aabb().overlaps(&aabb) {
                out.push(other);
            }
        }
    }

    /// The region the tree covers.
    pub fn bounds(&self) -> Aabb {
        self.root.bounds
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.total_objects
    }

    /// Whether the tree stores no objects.
    pub fn is_empty(&self) -> bool {
        self.total_objects == 0
    }

    /// The hard subdivision depth cap.
    pub fn max_depth(&self) -> u32 {
        self.limits.max_depth
    }

    /// The per-node object threshold past which a leaf splits.
    pub fn max_objects(&self) -> usize {
        self.limits.max_objects
    }

    /// Number of live nodes, the root included.
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    /// Walk every node depth-first, yielding its depth, region and locally
    /// stored objects. Read-only; intended for debug rendering and tests.
    pub fn visit_nodes(&self, mut f: impl FnMut(NodeView<'_, T>)) {
        self.root.visit(&mut |depth, bounds, objects| {
            f(NodeView {
                depth,
                bounds,
                objects,
            })
        });
    }
}

impl<T: BoundedObject> Default for Quadtree<T> {
    /// The documented legacy default region, min (−10, 10) max (10, 10).
    /// It spans zero height on y; callers are expected to resize before
    /// real use.
    fn default() -> Self {
        Self::new(Aabb::new(-10.0, 10.0, 10.0, 10.0))
    }
}

impl<T> std::fmt::Debug for Quadtree<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Quadtree")
            .field("objects", &self.total_objects)
            .field("bounds", &self.root.bounds)
            .field("max_depth", &self.limits.max_depth)
            .field("max_objects", &self.limits.max_objects)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[derive(Debug, Clone)]
    struct Blob {
        id: u32,
        aabb: Aabb,
    }

    impl Blob {
        fn new(id: u32, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
            Self {
                id,
                aabb: Aabb::new(min_x, min_y, max_x, max_y),
            }
        }
    }

    // Identity is the id alone; geometry is irrelevant to equality.
    impl PartialEq for Blob {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }

    impl BoundedObject for Blob {
        fn aabb(&self) -> Aabb {
            self.aabb
        }
    }

    fn tree() -> Quadtree<Blob> {
        Quadtree::new(Aabb::new(-10.0, -10.0, 10.0, 10.0))
    }

    /// Sum of local storage over every node, for cross-checking `len()`.
    fn walked_count(tree: &Quadtree<Blob>) -> usize {
        let mut count = 0;
        tree.visit_nodes(|view| count += view.objects.len());
        count
    }

    fn max_depth_seen(tree: &Quadtree<Blob>) -> u32 {
        let mut max = 0;
        tree.visit_nodes(|view| max = max.max(view.depth));
        max
    }

    #[test]
    fn test_count_consistency() {
        let mut tree = tree();
        for i in 0..20 {
            let x = -9.0 + i as f32;
            tree.insert(Blob::new(i as u32, x, -9.0, x + 0.5, -8.5));
            assert_eq!(tree.len(), walked_count(&tree));
        }
        for i in (0..20).step_by(2) {
            let x = -9.0 + i as f32;
            assert!(tree.remove(&Blob::new(i as u32, x, -9.0, x + 0.5, -8.5)));
            assert_eq!(tree.len(), walked_count(&tree));
        }
        assert_eq!(tree.len(), 10);
    }

    #[test]
    fn test_single_location() {
        let mut tree = tree();
        for i in 0..30 {
            let x = -9.5 + (i % 10) as f32 * 1.9;
            let y = -9.5 + (i / 10) as f32 * 6.0;
            tree.insert(Blob::new(i, x, y, x + 0.3, y + 0.3));
        }

        let mut seen = std::collections::HashSet::new();
        tree.visit_nodes(|view| {
            for object in view.objects {
                assert!(seen.insert(object.id), "object {} stored twice", object.id);
            }
        });
        assert_eq!(seen.len(), 30);
    }

    #[test]
    fn test_round_trip_full_collapse() {
        let mut tree = tree();
        let blobs: Vec<Blob> = (0..40)
            .map(|i| {
                let x = -9.5 + (i % 8) as f32 * 2.4;
                let y = -9.5 + (i / 8) as f32 * 3.7;
                Blob::new(i, x, y, x + 0.2, y + 0.2)
            })
            .collect();

        for blob in &blobs {
            tree.insert(blob.clone());
        }
        assert_eq!(tree.len(), 40);
        assert!(tree.node_count() > 1);

        for blob in &blobs {
            assert!(tree.remove(blob));
        }
        assert_eq!(tree.len(), 0);
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_query_idempotent() {
        let mut tree = tree();
        for i in 0..25 {
            let x = -9.0 + (i % 5) as f32 * 3.9;
            let y = -9.0 + (i / 5) as f32 * 3.9;
            tree.insert(Blob::new(i, x, y, x + 2.0, y + 2.0));
        }
        let probe = Blob::new(99, -1.0, -1.0, 1.0, 1.0);

        let mut first = Vec::new();
        tree.collision_candidates(&probe, &mut first);
        let mut second = Vec::new();
        tree.collision_candidates(&probe, &mut second);

        let mut a: Vec<u32> = first.iter().map(|b| b.id).collect();
        let mut b: Vec<u32> = second.iter().map(|b| b.id).collect();
        a.sort_unstable();
        b.sort_unstable();
        assert_eq!(a, b);
    }

    #[test]
    fn test_center_straddler_never_descends() {
        let mut tree = tree();
        // Nine tight NE objects force a branch.
        for i in 0..9 {
            tree.insert(Blob::new(i, 5.0 + 0.1 * i as f32, -9.0, 5.05 + 0.1 * i as f32, -8.9));
        }
        assert!(tree.node_count() > 1);

        // Spans NW into NE across the root center: must stay at the root.
        tree.insert(Blob::new(100, -2.0, -9.0, 2.0, -8.0));
        let mut root_objects = Vec::new();
        tree.visit_nodes(|view| {
            if view.depth == 0 {
                root_objects = view.objects.iter().map(|b| b.id).collect();
            }
        });
        assert_eq!(root_objects, vec![100]);
    }

    #[test]
    fn test_nine_objects_single_branch() {
        let mut tree = tree();
        // All nine sit in the NW quadrant but straddle the NW child's own
        // center (x = -5), so nothing sinks past depth 1.
        for i in 0..9 {
            let y = -9.5 + 0.15 * i as f32;
            tree.insert(Blob::new(i, -6.0, y, -4.0, y + 0.1));
        }

        assert_eq!(tree.node_count(), 5);
        assert_eq!(max_depth_seen(&tree), 1);

        let mut per_depth = [0usize; 2];
        tree.visit_nodes(|view| per_depth[view.depth as usize] += view.objects.len());
        assert_eq!(per_depth[0], 0);
        assert_eq!(per_depth[1], 9);
    }

    #[test]
    fn test_removal_collapses_children() {
        let mut tree = tree();
        let blobs: Vec<Blob> = (0..9)
            .map(|i| {
                let y = -9.5 + 0.15 * i as f32;
                Blob::new(i, -6.0, y, -4.0, y + 0.1)
            })
            .collect();
        for blob in &blobs {
            tree.insert(blob.clone());
        }
        assert_eq!(tree.node_count(), 5);

        // One removal brings the subtree total to 8: everything merges
        // back into the root and the four children disappear together.
        assert!(tree.remove(&blobs[0]));
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.len(), 8);
        assert_eq!(walked_count(&tree), 8);
    }

    #[test]
    fn test_straddling_query_reaches_both_quadrants() {
        let mut tree = tree();
        // Four NW objects and five NE objects, all near y = -9, so the
        // ninth insert branches the root and both clusters sink.
        for i in 0..4 {
            tree.insert(Blob::new(i, -9.0, -9.3, -8.0, -8.7));
        }
        for i in 4..9 {
            tree.insert(Blob::new(i, 8.0, -9.3, 9.0, -8.7));
        }
        assert!(tree.node_count() > 1);

        // Overlaps both corner clusters across the NW/NE boundary.
        let probe = Blob::new(100, -8.5, -9.1, 8.5, -8.9);
        let mut out = Vec::new();
        tree.collision_candidates(&probe, &mut out);

        let mut ids: Vec<u32> = out.iter().map(|b| b.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_candidates_exclude_self_and_disjoint() {
        let mut tree = tree();
        let a = Blob::new(1, -9.0, -9.0, -8.0, -8.0);
        let b = Blob::new(2, -8.5, -8.5, -7.5, -7.5);
        let far = Blob::new(3, 8.0, 8.0, 9.0, 9.0);
        tree.insert(a.clone());
        tree.insert(b.clone());
        tree.insert(far.clone());

        let mut out = Vec::new();
        tree.collision_candidates(&a, &mut out);
        let ids: Vec<u32> = out.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut tree = tree();
        tree.insert(Blob::new(1, -9.0, -9.0, -8.0, -8.0));

        assert!(!tree.remove(&Blob::new(42, -9.0, -9.0, -8.0, -8.0)));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_query_outside_bounds_terminates() {
        let mut tree = tree();
        for i in 0..12 {
            let x = -9.0 + i as f32 * 1.5;
            tree.insert(Blob::new(i, x, 2.0, x + 0.4, 2.4));
        }

        let probe = Blob::new(100, 50.0, 50.0, 51.0, 51.0);
        let mut out = Vec::new();
        tree.collision_candidates(&probe, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_resize_preserves_population() {
        let mut tree = tree();
        for i in 0..16 {
            let x = -9.0 + (i % 4) as f32 * 4.9;
            let y = -9.0 + (i / 4) as f32 * 4.9;
            tree.insert(Blob::new(i, x, y, x + 0.5, y + 0.5));
        }
        let before = tree.len();

        tree.resize(Aabb::new(-100.0, -100.0, 100.0, 100.0));

        assert_eq!(tree.len(), before);
        assert_eq!(walked_count(&tree), before);
        assert_eq!(tree.bounds(), Aabb::new(-100.0, -100.0, 100.0, 100.0));

        // Queries still find neighbours under the new geometry.
        let probe = Blob::new(100, -9.5, -9.5, -8.0, -8.0);
        let mut out = Vec::new();
        tree.collision_candidates(&probe, &mut out);
        assert!(out.iter().any(|b| b.id == 0));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut tree = tree();
        for i in 0..20 {
            let x = -9.5 + (i % 5) as f32 * 3.9;
            let y = -9.5 + (i / 5) as f32 * 4.4;
            tree.insert(Blob::new(i, x, y, x + 0.3, y + 0.3));
        }
        tree.clear();

        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 1);
        assert_eq!(walked_count(&tree), 0);
    }

    #[test]
    fn test_depth_never_exceeds_cap() {
        let mut tree = Quadtree::with_limits(3, 1, Aabb::new(-10.0, -10.0, 10.0, 10.0));
        // Coincident objects can never be separated by subdivision; the
        // depth cap has to stop the recursion.
        for i in 0..32 {
            tree.insert(Blob::new(i, -9.9, -9.9, -9.8, -9.8));
        }
        assert!(max_depth_seen(&tree) <= 3);
        assert_eq!(tree.len(), 32);
    }

    #[test]
    fn test_randomized_sequence_keeps_invariants() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut tree = tree();

        let blobs: Vec<Blob> = (0..200)
            .map(|i| {
                let x = rng.random_range(-9.5f32..9.0);
                let y = rng.random_range(-9.5f32..9.0);
                let w = rng.random_range(0.05f32..0.5);
                let h = rng.random_range(0.05f32..0.5);
                Blob::new(i, x, y, x + w, y + h)
            })
            .collect();

        for blob in &blobs {
            tree.insert(blob.clone());
        }
        assert_eq!(tree.len(), walked_count(&tree));
        assert!(max_depth_seen(&tree) <= tree.max_depth());

        let mut order: Vec<usize> = (0..blobs.len()).collect();
        order.shuffle(&mut rng);
        for (step, &i) in order.iter().enumerate() {
            assert!(tree.remove(&blobs[i]));
            assert_eq!(tree.len(), blobs.len() - step - 1);
            assert_eq!(tree.len(), walked_count(&tree));
        }
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_default_tree_uses_legacy_bounds() {
        let tree: Quadtree<Blob> = Quadtree::default();
        assert_eq!(tree.bounds(), Aabb::new(-10.0, 10.0, 10.0, 10.0));
        assert_eq!(tree.max_depth(), 6);
        assert_eq!(tree.max_objects(), 8);
    }
}
