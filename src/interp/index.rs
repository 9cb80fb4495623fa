//! k-nearest-neighbor spatial index over a sample set

use glam::DVec2;
use rstar::primitives::GeomWithData;
use rstar::RTree;

use super::samples::SampleSet;
use crate::core::{Error, Result};

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// How neighbor values are combined
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryMode {
    /// Inverse-distance weighting with exponent 2
    Weighted,
    /// Most common neighbor value; ties go to the lowest value
    Majority,
}

/// Parameters for a neighbor query
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QueryParams {
    /// Number of neighbors consulted (k >= 1)
    pub neighbors: usize,
    /// Distance below which the nearest sample is returned as-is
    pub epsilon: f64,
    pub mode: QueryMode,
}

impl QueryParams {
    pub fn weighted(neighbors: usize, epsilon: f64) -> Self {
        Self { neighbors, epsilon, mode: QueryMode::Weighted }
    }

    pub fn majority(neighbors: usize, epsilon: f64) -> Self {
        Self { neighbors, epsilon, mode: QueryMode::Majority }
    }

    fn validate(&self) -> Result<()> {
        if self.neighbors == 0 {
            return Err(Error::InvalidInput("neighbor count must be at least 1".to_string()));
        }
        if !(self.epsilon >= 0.0) {
            return Err(Error::InvalidInput(format!("epsilon {} must be >= 0", self.epsilon)));
        }
        Ok(())
    }
}

/// Read-only nearest-neighbor index built once per sample set
pub struct SpatialIndex {
    tree: RTree<IndexedPoint>,
    values: Vec<f64>,
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("samples", &self.values.len())
            .finish()
    }
}

impl SpatialIndex {
    /// Build from parallel point and value arrays.
    ///
    /// Fails with `InvalidInput` when the counts differ or no points are given.
    pub fn build(points: Vec<DVec2>, values: Vec<f64>) -> Result<Self> {
        Ok(Self::from_samples(SampleSet::new(points, values)?))
    }

    /// Build from a validated sample set (bulk load, O(n log n))
    pub fn from_samples(samples: SampleSet) -> Self {
        let entries = samples
            .points()
            .iter()
            .enumerate()
            .map(|(i, p)| GeomWithData::new([p.x, p.y], i))
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
            values: samples.values().to_vec(),
        }
    }

    /// Number of indexed samples
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Interpolate one value per target
    pub fn query(&self, targets: &[DVec2], params: &QueryParams) -> Result<Vec<f64>> {
        params.validate()?;
        let mut neighbors = Vec::with_capacity(params.neighbors);
        let mut tally = Vec::with_capacity(params.neighbors);
        Ok(targets
            .iter()
            .map(|t| self.query_one(*t, params, &mut neighbors, &mut tally))
            .collect())
    }

    fn query_one(
        &self,
        target: DVec2,
        params: &QueryParams,
        neighbors: &mut Vec<(f64, f64)>,
        tally: &mut Vec<(f64, usize)>,
    ) -> f64 {
        neighbors.clear();
        neighbors.extend(
            self.tree
                .nearest_neighbor_iter_with_distance_2(&[target.x, target.y])
                .take(params.neighbors)
                .map(|(p, d2)| (d2.sqrt(), self.values[p.data])),
        );

        // Non-empty index and k >= 1 guarantee at least one neighbor.
        let (nearest_dist, nearest_value) = neighbors[0];
        if nearest_dist < params.epsilon || nearest_dist == 0.0 {
            return nearest_value;
        }

        match params.mode {
            QueryMode::Majority => majority(neighbors, tally),
            QueryMode::Weighted => {
                let (sum, weights) = neighbors.iter().fold((0.0, 0.0), |(sum, weights), &(d, v)| {
                    let w = 1.0 / (d * d);
                    (sum + w * v, weights + w)
                });
                sum / weights
            }
        }
    }
}

/// Most frequent value; equal counts resolve to the lowest value
fn majority(neighbors: &[(f64, f64)], tally: &mut Vec<(f64, usize)>) -> f64 {
    tally.clear();
    for &(_, v) in neighbors {
        match tally.iter_mut().find(|(value, _)| *value == v) {
            Some((_, count)) => *count += 1,
            None => tally.push((v, 1)),
        }
    }
    tally
        .iter()
        .fold(None::<(f64, usize)>, |best, &(v, n)| match best {
            Some((bv, bn)) if bn > n || (bn == n && bv <= v) => Some((bv, bn)),
            _ => Some((v, n)),
        })
        .map(|(v, _)| v)
        .unwrap_or(f64::NAN)
}
