//! Queryable spatial index over points on the sphere.
//!
//! Points are embedded as unit vectors (see [`crate::geometry`]) and stored
//! in an R*-tree. A great-circle radius query becomes a Euclidean ball query
//! with the equivalent chord length; every hit is then confirmed with the
//! exact haversine distance so the result matches `haversine_km <= radius`.
//!
//! Small point sets skip the tree and answer queries with a linear scan.

use crate::config::IndexConfig;
use crate::error::{Result, SpatialError};
use crate::geometry::{chord_for_km, haversine_km, to_unit_vector};
use rstar::primitives::GeomWithData;
use rstar::RTree;

/// Embedded point carrying its record index.
type IndexedPoint = GeomWithData<[f64; 3], usize>;

/// Relative slack on the squared chord bound. The haversine check after the
/// tree lookup is authoritative; the slack only keeps boundary points from
/// being lost to rounding in the embedding.
const CHORD_SLACK: f64 = 1e-9;

enum Backend {
    Linear,
    Tree(RTree<IndexedPoint>),
}

/// Nearest-neighbor query result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest {
    /// Record index of the nearest point.
    pub index: usize,

    /// Great-circle distance in kilometres.
    pub distance_km: f64,
}

/// Spatial index over a fixed set of `(lat, lng)` points.
///
/// Built once via [`SpatialIndexBuilder`](crate::SpatialIndexBuilder) or
/// [`SpatialIndex::build`]; immutable afterwards and safe to share across
/// threads.
pub struct SpatialIndex {
    coords: Vec<(f64, f64)>,
    backend: Backend,
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("len", &self.coords.len())
            .field("tree", &self.is_tree_backed())
            .finish()
    }
}

impl SpatialIndex {
    /// Build an index with the default configuration.
    pub fn build(points: &[(f64, f64)]) -> Result<Self> {
        Self::build_with_config(points, &IndexConfig::default())
    }

    /// Build an index with an explicit configuration.
    pub fn build_with_config(points: &[(f64, f64)], config: &IndexConfig) -> Result<Self> {
        let mut builder = crate::SpatialIndexBuilder::with_capacity(config.clone(), points.len());
        builder.extend(points.iter().copied());
        builder.build()
    }

    /// Construct from coordinates that have already passed validation.
    pub(crate) fn from_validated(coords: Vec<(f64, f64)>, config: &IndexConfig) -> Self {
        let backend = if coords.len() < config.linear_scan_threshold {
            Backend::Linear
        } else {
            let embedded: Vec<IndexedPoint> = coords
                .iter()
                .enumerate()
                .map(|(i, &(lat, lng))| GeomWithData::new(to_unit_vector(lat, lng), i))
                .collect();
            Backend::Tree(RTree::bulk_load(embedded))
        };

        Self { coords, backend }
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Whether the index holds no points.
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Whether queries go through the R-tree (as opposed to a linear scan).
    pub fn is_tree_backed(&self) -> bool {
        matches!(self.backend, Backend::Tree(_))
    }

    /// Record indices within `radius_km` (inclusive) of a point, ascending.
    pub fn radius_query(&self, lat: f64, lng: f64, radius_km: f64) -> Result<Vec<usize>> {
        if radius_km.is_nan() || radius_km < 0.0 {
            return Err(SpatialError::InvalidRadius(radius_km));
        }

        let within = |i: usize| {
            let (p_lat, p_lng) = self.coords[i];
            haversine_km(lat, lng, p_lat, p_lng) <= radius_km
        };

        let mut hits: Vec<usize> = match &self.backend {
            Backend::Linear => (0..self.coords.len()).filter(|&i| within(i)).collect(),
            Backend::Tree(tree) => {
                let chord = chord_for_km(radius_km);
                let max_sq = chord * chord * (1.0 + CHORD_SLACK) + f64::EPSILON;
                tree.locate_within_distance(to_unit_vector(lat, lng), max_sq)
                    .map(|p| p.data)
                    .filter(|&i| within(i))
                    .collect()
            }
        };

        hits.sort_unstable();
        Ok(hits)
    }

    /// Nearest indexed point to a coordinate, or `None` if the index is empty.
    ///
    /// Ties resolve to the lowest record index on the linear backend and to
    /// an arbitrary tied record on the tree backend.
    pub fn nearest(&self, lat: f64, lng: f64) -> Option<Nearest> {
        let index = match &self.backend {
            Backend::Linear => self
                .coords
                .iter()
                .enumerate()
                .map(|(i, &(p_lat, p_lng))| (i, haversine_km(lat, lng, p_lat, p_lng)))
                .min_by(|a, b| a.1.total_cmp(&b.1))?
                .0,
            Backend::Tree(tree) => tree.nearest_neighbor(&to_unit_vector(lat, lng))?.data,
        };

        let (p_lat, p_lng) = self.coords[index];
        Some(Nearest {
            index,
            distance_km: haversine_km(lat, lng, p_lat, p_lng),
        })
    }
}
