//! R-tree over session positions.
//!
//! Entries are `[lng, lat]` points tagged with their position in the
//! session snapshot. The tree is rebuilt lazily: replacing the snapshot
//! only invalidates it, and the next viewport query bulk-loads it again.

use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};

use crate::{Bounds, PointFeature};

/// A session position keyed by its snapshot index.
pub type IndexedPosition = GeomWithData<[f64; 2], usize>;

#[derive(Debug, Default)]
pub struct SpatialIndex {
    tree: RTree<IndexedPosition>,
    stale: bool,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the tree as out of date with the snapshot.
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    /// Bulk-load the tree from a snapshot. Features without a valid point are left out.
    pub fn load(&mut self, features: &[PointFeature]) {
        let entries: Vec<IndexedPosition> = features
            .iter()
            .enumerate()
            .filter_map(|(index, feature)| {
                let p = feature.position()?;
                Some(GeomWithData::new([p.longitude, p.latitude], index))
            })
            .collect();

        self.tree = RTree::bulk_load(entries);
        self.stale = false;
    }

    /// Snapshot indices inside `bounds` (edges inclusive), ascending.
    ///
    /// Reloads the tree first if the snapshot changed since the last load.
    pub fn within(&mut self, features: &[PointFeature], bounds: &Bounds) -> Vec<usize> {
        if self.stale {
            self.load(features);
        }

        let envelope = AABB::from_corners(
            [bounds.min_lng, bounds.min_lat],
            [bounds.max_lng, bounds.max_lat],
        );
        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope(&envelope)
            .map(|entry| entry.data)
            .collect();
        hits.sort_unstable();
        hits
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.tree = RTree::new();
        self.stale = false;
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
