//! Immutable sample points paired with scalar values

use glam::DVec2;

use crate::core::{Error, Result};

/// Sample points in the working CRS with one value each
#[derive(Clone, Debug, PartialEq)]
pub struct SampleSet {
    points: Vec<DVec2>,
    values: Vec<f64>,
}

impl SampleSet {
    /// Pair points with values; fails if the counts differ or the set is empty
    pub fn new(points: Vec<DVec2>, values: Vec<f64>) -> Result<Self> {
        if points.len() != values.len() {
            return Err(Error::InvalidInput(format!(
                "{} sample points but {} values",
                points.len(),
                values.len()
            )));
        }
        if points.is_empty() {
            return Err(Error::InvalidInput("sample set is empty".to_string()));
        }
        Ok(Self { points, values })
    }

    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
