//! Synthetic underwater depth from proximity to shore.
//!
//! Each water cell gets a depth equal to the radius of the first square
//! ring around it that touches land, capped at `max_depth`. Cells are
//! visited in row-major order and reuse depths already assigned to their
//! 8-neighbors to bound the search, which keeps the gradient smooth. A
//! seeded coin flip deepens cells by one so the sea floor is not
//! perfectly concentric.

use rand::Rng;

use crate::math::Grid;

/// Steepest allowed slope factor
pub const MAX_SLOPE: f64 = 4.0;

/// Depth synthesis parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BathymetryParams {
    /// Land-cover code marking water cells
    pub water_code: u8,
    /// Deepest depth assigned (>= 1)
    pub max_depth: u32,
    /// Dropoff control in [1, 4]; 1 disables the random deepening
    pub slope: f64,
}

impl BathymetryParams {
    /// Create parameters, raising `max_depth` to 1 and clamping `slope` to [1, 4]
    pub fn new(water_code: u8, max_depth: u32, slope: f64) -> Self {
        Self {
            water_code,
            max_depth: max_depth.max(1),
            slope: if slope.is_nan() { 1.0 } else { slope.clamp(1.0, MAX_SLOPE) },
        }
    }
}

/// Computes per-cell depth for a classified grid
#[derive(Clone, Copy, Debug)]
pub struct BathymetrySynthesizer {
    params: BathymetryParams,
}

impl BathymetrySynthesizer {
    pub fn new(params: BathymetryParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &BathymetryParams {
        &self.params
    }

    /// Depth for every cell; land cells get 0.
    ///
    /// Deterministic for a given grid and RNG state.
    pub fn synthesize<R: Rng>(&self, classes: &Grid<u8>, rng: &mut R) -> Grid<u32> {
        let (rows, cols) = (classes.rows(), classes.cols());
        let mut depths = Grid::filled(rows, cols, 0u32);
        let max_depth = self.params.max_depth;
        let deepen_above = 1.0 / self.params.slope;

        for row in 0..rows {
            for col in 0..cols {
                if classes[(row, col)] != self.params.water_code {
                    continue;
                }

                let (first, last) = match neighbor_depths(&depths, row, col) {
                    None => (1, max_depth),
                    Some((lo, hi)) => (lo.saturating_sub(1).max(1), (hi + 1).min(max_depth)),
                };

                let mut depth = last;
                for ring in first..=last {
                    let hit = if ring == first {
                        self.land_within(classes, row, col, ring)
                    } else {
                        self.land_on_ring(classes, row, col, ring)
                    };
                    if hit {
                        depth = ring;
                        break;
                    }
                }

                if rng.r#gen::<f64>() > deepen_above {
                    depth += 1;
                }
                depths.set(row, col, depth.min(max_depth));
            }
        }

        depths
    }

    fn is_land(&self, classes: &Grid<u8>, row: isize, col: isize) -> bool {
        if row < 0 || col < 0 {
            return false;
        }
        classes
            .get(row as usize, col as usize)
            .is_some_and(|&c| c != self.params.water_code)
    }

    /// Any land inside the filled square of radius `ring`
    fn land_within(&self, classes: &Grid<u8>, row: usize, col: usize, ring: u32) -> bool {
        let r = ring as isize;
        let (row, col) = (row as isize, col as isize);
        (row - r..=row + r).any(|y| (col - r..=col + r).any(|x| self.is_land(classes, y, x)))
    }

    /// Any land on the perimeter of the square of radius `ring`
    fn land_on_ring(&self, classes: &Grid<u8>, row: usize, col: usize, ring: u32) -> bool {
        let r = ring as isize;
        let (row, col) = (row as isize, col as isize);
        let horizontal = (col - r..=col + r)
            .any(|x| self.is_land(classes, row - r, x) || self.is_land(classes, row + r, x));
        let vertical = (row - r + 1..row + r)
            .any(|y| self.is_land(classes, y, col - r) || self.is_land(classes, y, col + r));
        horizontal || vertical
    }
}

/// Min and max of the depths already assigned to the 8-neighborhood
fn neighbor_depths(depths: &Grid<u32>, row: usize, col: usize) -> Option<(u32, u32)> {
    let mut found: Option<(u32, u32)> = None;
    for y in row.saturating_sub(1)..=(row + 1) {
        for x in col.saturating_sub(1)..=(col + 1) {
            if let Some(&d) = depths.get(y, x) {
                if d > 0 {
                    found = Some(match found {
                        Some((lo, hi)) => (lo.min(d), hi.max(d)),
                        None => (d, d),
                    });
                }
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const WATER: u8 = 11;
    const LAND: u8 = 41;

    fn grid_from(rows: &[&str]) -> Grid<u8> {
        let cols = rows[0].len();
        let data = rows
            .iter()
            .flat_map(|r| r.chars().map(|c| if c == '~' { WATER } else { LAND }))
            .collect();
        Grid::from_vec(rows.len(), cols, data).unwrap()
    }

    fn chebyshev_to_land(classes: &Grid<u8>, row: usize, col: usize) -> Option<u32> {
        classes
            .iter()
            .filter(|(_, _, c)| **c != WATER)
            .map(|(r, c, _)| {
                let dr = (r as isize - row as isize).unsigned_abs();
                let dc = (c as isize - col as isize).unsigned_abs();
                dr.max(dc) as u32
            })
            .min()
    }

    #[test]
    fn test_params_clamped() {
        let p = BathymetryParams::new(WATER, 0, 9.0);
        assert_eq!(p.max_depth, 1);
        assert_eq!(p.slope, 4.0);
        assert_eq!(BathymetryParams::new(WATER, 5, 0.25).slope, 1.0);
    }

    #[test]
    fn test_shore_adjacent_depth_is_one() {
        let classes = grid_from(&["#~~~", "#~~~", "#~~~"]);
        let synth = BathymetrySynthesizer::new(BathymetryParams::new(WATER, 10, 1.0));
        let depths = synth.synthesize(&classes, &mut ChaCha8Rng::seed_from_u64(7));

        for row in 0..3 {
            assert_eq!(depths[(row, 0)], 0);
            assert_eq!(depths[(row, 1)], 1);
            assert_eq!(depths[(row, 2)], 2);
            assert_eq!(depths[(row, 3)], 3);
        }
    }

    #[test]
    fn test_slope_one_matches_distance_to_shore() {
        let classes = grid_from(&[
            "##~~~~~~~~",
            "#~~~~~~~~~",
            "~~~~~~~~~~",
            "~~~~~##~~~",
            "~~~~~##~~~",
            "~~~~~~~~~~",
            "~~~~~~~~~#",
        ]);
        let synth = BathymetrySynthesizer::new(BathymetryParams::new(WATER, 3, 1.0));
        let depths = synth.synthesize(&classes, &mut ChaCha8Rng::seed_from_u64(1));

        for (row, col, &class) in classes.iter() {
            if class == WATER {
                let expected = chebyshev_to_land(&classes, row, col).unwrap().min(3);
                assert_eq!(depths[(row, col)], expected, "cell ({}, {})", row, col);
            } else {
                assert_eq!(depths[(row, col)], 0);
            }
        }
    }

    #[test]
    fn test_all_water_reaches_max_depth() {
        let classes = Grid::filled(5, 5, WATER);
        let synth = BathymetrySynthesizer::new(BathymetryParams::new(WATER, 4, 1.0));
        let depths = synth.synthesize(&classes, &mut ChaCha8Rng::seed_from_u64(3));
        assert!(depths.as_slice().iter().all(|&d| d == 4));
    }

    #[test]
    fn test_never_exceeds_max_depth() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let data: Vec<u8> = (0..40 * 40)
            .map(|_| if rng.gen_bool(0.9) { WATER } else { LAND })
            .collect();
        let classes = Grid::from_vec(40, 40, data).unwrap();

        for max_depth in [1, 2, 5, 12] {
            let synth = BathymetrySynthesizer::new(BathymetryParams::new(WATER, max_depth, 4.0));
            let depths = synth.synthesize(&classes, &mut ChaCha8Rng::seed_from_u64(5));
            for (row, col, &class) in classes.iter() {
                let d = depths[(row, col)];
                if class == WATER {
                    assert!(d >= 1 && d <= max_depth);
                } else {
                    assert_eq!(d, 0);
                }
            }
        }
    }

    #[test]
    fn test_same_seed_same_result() {
        let classes = grid_from(&["#~~~~~~", "~~~~~~~", "~~~~~~#"]);
        let synth = BathymetrySynthesizer::new(BathymetryParams::new(WATER, 6, 2.5));
        let a = synth.synthesize(&classes, &mut ChaCha8Rng::seed_from_u64(42));
        let b = synth.synthesize(&classes, &mut ChaCha8Rng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_steep_slope_deepens_some_cells() {
        let classes = grid_from(&["#~~~~~~~~~~~~~~~"; 8]);
        let flat = BathymetrySynthesizer::new(BathymetryParams::new(WATER, 30, 1.0))
            .synthesize(&classes, &mut ChaCha8Rng::seed_from_u64(11));
        let steep = BathymetrySynthesizer::new(BathymetryParams::new(WATER, 30, 4.0))
            .synthesize(&classes, &mut ChaCha8Rng::seed_from_u64(11));

        let flat_sum: u32 = flat.as_slice().iter().sum();
        let steep_sum: u32 = steep.as_slice().iter().sum();
        assert!(steep_sum > flat_sum);
    }
}
