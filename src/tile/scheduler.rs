//! Tile dispatch across a fixed-size worker pool

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;

use super::grid::TileIndex;
use crate::core::{Error, Result};

/// Outcome of processing a set of tiles.
///
/// Failed tiles are collected alongside the successful ones; one bad tile
/// never stops the others.
#[derive(Debug)]
pub struct RunReport<T> {
    pub completed: Vec<(TileIndex, T)>,
    pub failed: Vec<(TileIndex, Error)>,
}

impl<T> RunReport<T> {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.completed.len() + self.failed.len()
    }
}

/// Runs one closure per tile, sequentially or on a dedicated thread pool
#[derive(Clone, Copy, Debug)]
pub struct TileScheduler {
    workers: usize,
}

impl TileScheduler {
    /// Create a scheduler; zero workers is treated as one
    pub fn new(workers: usize) -> Self {
        Self { workers: workers.max(1) }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Process every tile with `process`.
    ///
    /// With one worker tiles run in order on the calling thread. Otherwise a
    /// pool of exactly `workers` threads takes tiles in no particular order.
    /// The report lists tiles in the order they were given.
    pub fn run<T, F>(&self, tiles: &[TileIndex], process: F) -> Result<RunReport<T>>
    where
        T: Send,
        F: Fn(TileIndex) -> Result<T> + Sync + Send,
    {
        let start = Instant::now();
        let done = AtomicUsize::new(0);
        let total = tiles.len();

        let tracked = |index: TileIndex| {
            let result = process(index);
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            match &result {
                Ok(_) => log::debug!(
                    "Tile ({}, {}) done [{}/{}]",
                    index.row,
                    index.col,
                    finished,
                    total
                ),
                Err(e) => log::error!("Tile ({}, {}) failed: {}", index.row, index.col, e),
            }
            (index, result)
        };

        let results: Vec<(TileIndex, Result<T>)> = if self.workers == 1 {
            tiles.iter().map(|&index| tracked(index)).collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .thread_name(|i| format!("tile-worker-{}", i))
                .build()
                .map_err(|e| Error::Scheduler(e.to_string()))?;
            pool.install(|| tiles.par_iter().map(|&index| tracked(index)).collect())
        };

        let mut report = RunReport {
            completed: Vec::with_capacity(total),
            failed: Vec::new(),
        };
        for (index, result) in results {
            match result {
                Ok(value) => report.completed.push((index, value)),
                Err(e) => report.failed.push((index, e)),
            }
        }

        let elapsed = start.elapsed();
        log::info!(
            "Processed {} tiles ({} failed) on {} worker(s) in {:.1}s",
            total,
            report.failed.len(),
            self.workers,
            elapsed.as_secs_f64()
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileRange;
    use std::sync::Mutex;

    #[test]
    fn test_zero_workers_is_one() {
        assert_eq!(TileScheduler::new(0).workers(), 1);
    }

    #[test]
    fn test_sequential_runs_in_order() {
        let tiles = TileRange::new(0, 0, 2, 3).indices();
        let order = Mutex::new(Vec::new());
        let report = TileScheduler::new(1)
            .run(&tiles, |index| {
                order.lock().unwrap().push(index);
                Ok(index.row * 10 + index.col)
            })
            .unwrap();

        assert!(report.is_success());
        assert_eq!(*order.lock().unwrap(), tiles);
        assert_eq!(report.completed[4], (TileIndex::new(1, 1), 11));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let tiles = TileRange::new(0, 0, 4, 4).indices();
        let work = |index: TileIndex| -> Result<usize> { Ok(index.row * index.col + 1) };

        let seq = TileScheduler::new(1).run(&tiles, work).unwrap();
        let par = TileScheduler::new(4).run(&tiles, work).unwrap();

        let seq: Vec<_> = seq.completed;
        let par: Vec<_> = par.completed;
        assert_eq!(seq, par);
    }

    #[test]
    fn test_failed_tile_does_not_stop_others() {
        let tiles = TileRange::new(0, 0, 3, 3).indices();
        let report = TileScheduler::new(3)
            .run(&tiles, |index| {
                if index == TileIndex::new(1, 1) {
                    Err(Error::Raster("unreadable window".to_string()))
                } else {
                    Ok(())
                }
            })
            .unwrap();

        assert_eq!(report.completed.len(), 8);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, TileIndex::new(1, 1));
        assert_eq!(report.total(), 9);
    }
}
