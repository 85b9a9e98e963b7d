//! Uniform-grid spatial hash
//!
//! Space is divided into cubic cells of configurable size. Each collider is
//! bucketed into every cell its AABB spans, and a reverse map records which
//! cells a collider occupies so removal touches only those buckets.

use std::collections::{HashMap, HashSet};

use log::warn;

use crate::foundation::math::Vec3;
use crate::geometry::bounds::Aabb;
use crate::world::collider::{ColliderHandle, ColliderPair};

/// Integer grid-cell coordinates
pub type CellKey = (i32, i32, i32);

/// Uniform spatial hash over cubic cells
pub struct SpatialHash {
    /// Edge length of one cubic cell
    cell_size: f32,
    /// Safety limit on cells spanned per axis by a single collider
    max_cells_per_axis: u32,
    /// Cell -> occupants
    cells: HashMap<CellKey, HashSet<ColliderHandle>>,
    /// Collider -> cells it occupies (for O(cells) removal)
    occupied: HashMap<ColliderHandle, Vec<CellKey>>,
}

impl SpatialHash {
    /// Create a hash with the given cell size and per-axis span limit
    pub fn new(cell_size: f32, max_cells_per_axis: u32) -> Self {
        debug_assert!(cell_size > 0.0);
        Self {
            cell_size,
            max_cells_per_axis,
            cells: HashMap::new(),
            occupied: HashMap::new(),
        }
    }

    /// Edge length of one cell
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of tracked colliders
    pub fn len(&self) -> usize {
        self.occupied.len()
    }

    /// Check whether the hash tracks no colliders
    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty()
    }

    /// Number of non-empty cells (diagnostics)
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Check whether a collider is currently indexed
    pub fn contains(&self, handle: ColliderHandle) -> bool {
        self.occupied.contains_key(&handle)
    }

    /// Remove every collider and cell
    pub fn clear(&mut self) {
        self.cells.clear();
        self.occupied.clear();
    }

    /// Grid coordinate of the cell containing `point` on each axis
    fn cell_coord(&self, point: Vec3) -> CellKey {
        (
            (point.x / self.cell_size).floor() as i32,
            (point.y / self.cell_size).floor() as i32,
            (point.z / self.cell_size).floor() as i32,
        )
    }

    /// Inclusive min/max cell coordinates spanned by an AABB
    fn cell_range(&self, aabb: &Aabb) -> (CellKey, CellKey) {
        (self.cell_coord(aabb.min()), self.cell_coord(aabb.max()))
    }

    /// Insert a collider under every cell its AABB spans
    ///
    /// Returns `false` (and indexes nothing) when the AABB spans more than
    /// the per-axis cell limit; a single huge or malformed shape must not
    /// blow up the table. The caller is responsible for brute-force testing
    /// such colliders instead.
    pub fn insert(&mut self, handle: ColliderHandle, aabb: &Aabb) -> bool {
        let (min_cell, max_cell) = self.cell_range(aabb);
        let span = (
            max_cell.0 - min_cell.0 + 1,
            max_cell.1 - min_cell.1 + 1,
            max_cell.2 - min_cell.2 + 1,
        );
        let limit = self.max_cells_per_axis as i32;
        if span.0 > limit || span.1 > limit || span.2 > limit {
            warn!(
                "collider {handle:?} spans {span:?} cells (limit {limit} per axis); \
                 excluded from spatial hash"
            );
            return false;
        }

        let mut keys = Vec::with_capacity((span.0 * span.1 * span.2) as usize);
        for x in min_cell.0..=max_cell.0 {
            for y in min_cell.1..=max_cell.1 {
                for z in min_cell.2..=max_cell.2 {
                    let key = (x, y, z);
                    self.cells.entry(key).or_default().insert(handle);
                    keys.push(key);
                }
            }
        }
        self.occupied.insert(handle, keys);
        true
    }

    /// Remove a collider from every cell it occupies
    ///
    /// Empty buckets are deleted so the table shrinks with the scene.
    pub fn remove(&mut self, handle: ColliderHandle) {
        let Some(keys) = self.occupied.remove(&handle) else {
            return;
        };
        for key in keys {
            if let Some(bucket) = self.cells.get_mut(&key) {
                bucket.remove(&handle);
                if bucket.is_empty() {
                    self.cells.remove(&key);
                }
            }
        }
    }

    /// Reindex a collider under a new AABB (remove + insert)
    pub fn update(&mut self, handle: ColliderHandle, aabb: &Aabb) -> bool {
        self.remove(handle);
        self.insert(handle, aabb)
    }

    /// Emit every unordered occupant pair that shares at least one cell
    ///
    /// Pairs use the canonical [`ColliderPair`] ordering, so `(A, B)` and
    /// `(B, A)` collapse to one entry and pairs sharing several cells
    /// deduplicate through the output set.
    pub fn query_pairs(&self, out: &mut HashSet<ColliderPair>) {
        for bucket in self.cells.values() {
            if bucket.len() < 2 {
                continue;
            }
            let occupants: Vec<ColliderHandle> = bucket.iter().copied().collect();
            for (i, &a) in occupants.iter().enumerate() {
                for &b in &occupants[i + 1..] {
                    out.insert(ColliderPair::new(a, b));
                }
            }
        }
    }

    /// Union of all colliders found in the cells spanned by a query box
    pub fn query_aabb(&self, aabb: &Aabb, out: &mut HashSet<ColliderHandle>) {
        let (min_cell, max_cell) = self.cell_range(aabb);
        let volume = (max_cell.0 - min_cell.0 + 1) as i64
            * (max_cell.1 - min_cell.1 + 1) as i64
            * (max_cell.2 - min_cell.2 + 1) as i64;

        // A huge query region over a sparse table is cheaper to answer by
        // scanning the occupied cells instead of the region.
        if volume > self.cells.len() as i64 {
            for (key, bucket) in &self.cells {
                if key.0 >= min_cell.0 && key.0 <= max_cell.0
                    && key.1 >= min_cell.1 && key.1 <= max_cell.1
                    && key.2 >= min_cell.2 && key.2 <= max_cell.2
                {
                    out.extend(bucket.iter().copied());
                }
            }
            return;
        }

        for x in min_cell.0..=max_cell.0 {
            for y in min_cell.1..=max_cell.1 {
                for z in min_cell.2..=max_cell.2 {
                    if let Some(bucket) = self.cells.get(&(x, y, z)) {
                        out.extend(bucket.iter().copied());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn handles(n: usize) -> Vec<ColliderHandle> {
        let mut map: SlotMap<ColliderHandle, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    fn unit_aabb(center: Vec3) -> Aabb {
        Aabb::new(center, Vec3::new(0.5, 0.5, 0.5))
    }

    #[test]
    fn test_insert_remove_leaves_no_residue() {
        let mut hash = SpatialHash::new(2.0, 64);
        let h = handles(1)[0];

        assert!(hash.insert(h, &unit_aabb(Vec3::new(1.9, 0.0, 0.0))));
        assert!(hash.contains(h));
        assert!(hash.cell_count() > 0);

        hash.remove(h);
        assert!(!hash.contains(h));
        assert_eq!(hash.cell_count(), 0);
        assert!(hash.is_empty());
    }

    #[test]
    fn test_pairs_deduplicate_across_shared_cells() {
        let mut hash = SpatialHash::new(1.0, 64);
        let hs = handles(2);
        // Both AABBs span the same 2x2x2 block of cells
        hash.insert(hs[0], &unit_aabb(Vec3::new(1.0, 1.0, 1.0)));
        hash.insert(hs[1], &unit_aabb(Vec3::new(1.2, 1.0, 1.0)));

        let mut pairs = HashSet::new();
        hash.query_pairs(&mut pairs);
        assert_eq!(pairs.len(), 1);
        assert!(pairs.contains(&ColliderPair::new(hs[1], hs[0])));
    }

    #[test]
    fn test_distant_colliders_produce_no_pairs() {
        let mut hash = SpatialHash::new(2.0, 64);
        let hs = handles(2);
        hash.insert(hs[0], &unit_aabb(Vec3::zeros()));
        hash.insert(hs[1], &unit_aabb(Vec3::new(100.0, 0.0, 0.0)));

        let mut pairs = HashSet::new();
        hash.query_pairs(&mut pairs);
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_oversized_aabb_excluded() {
        let mut hash = SpatialHash::new(1.0, 8);
        let h = handles(1)[0];
        let huge = Aabb::new(Vec3::zeros(), Vec3::new(1000.0, 1.0, 1.0));

        assert!(!hash.insert(h, &huge));
        assert!(!hash.contains(h));
        assert_eq!(hash.cell_count(), 0);
    }

    #[test]
    fn test_update_moves_collider() {
        let mut hash = SpatialHash::new(2.0, 64);
        let hs = handles(2);
        hash.insert(hs[0], &unit_aabb(Vec3::zeros()));
        hash.insert(hs[1], &unit_aabb(Vec3::new(50.0, 0.0, 0.0)));

        let mut pairs = HashSet::new();
        hash.query_pairs(&mut pairs);
        assert!(pairs.is_empty());

        // Move the second collider next to the first
        assert!(hash.update(hs[1], &unit_aabb(Vec3::new(0.5, 0.0, 0.0))));
        pairs.clear();
        hash.query_pairs(&mut pairs);
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn test_query_aabb_region() {
        let mut hash = SpatialHash::new(2.0, 64);
        let hs = handles(3);
        hash.insert(hs[0], &unit_aabb(Vec3::zeros()));
        hash.insert(hs[1], &unit_aabb(Vec3::new(3.0, 0.0, 0.0)));
        hash.insert(hs[2], &unit_aabb(Vec3::new(40.0, 0.0, 0.0)));

        let mut found = HashSet::new();
        hash.query_aabb(&Aabb::new(Vec3::zeros(), Vec3::new(4.0, 1.0, 1.0)), &mut found);
        assert!(found.contains(&hs[0]));
        assert!(found.contains(&hs[1]));
        assert!(!found.contains(&hs[2]));
    }
}
