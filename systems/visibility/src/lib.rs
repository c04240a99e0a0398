#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Line-of-sight system for skirmish battle maps.
//!
//! [`LosTester`] decides whether one square sees another. [`LosCalculator`]
//! splits a full-map computation into independent square-pair tasks, runs
//! them on a fixed pool of worker threads, and gathers the visible squares in
//! a shared [`LosMap`]. Random trials use a seeded generator per task, so the
//! result does not depend on the number of workers.

use skirmish_core::Location;

mod calculator;
mod los_map;
mod pool;
mod tester;

pub use calculator::{LosCalculator, LosConfig, LosOutcome, ProgressHandle};
pub use los_map::LosMap;
pub use tester::{make_test_offsets, LosTester, Visibility, COARSE_STEPS, FINE_STEPS};

/// Errors raised by line-of-sight computations.
#[derive(Debug, thiserror::Error)]
pub enum LosError {
    /// The worker pool was configured without threads.
    #[error("line-of-sight calculator needs at least one worker thread")]
    NoWorkers,
    /// A worker thread could not be started.
    #[error("failed to spawn line-of-sight worker")]
    SpawnWorker(#[source] std::io::Error),
    /// A square-pair task panicked; the computation is discarded.
    #[error("line-of-sight task {0} panicked")]
    TaskPanicked(u64),
    /// The worker pool stopped before every task reported back.
    #[error("line-of-sight workers stopped before the computation finished")]
    WorkerLost,
    /// A source creature does not fit on the map.
    #[error("creature at {0} does not fit on the map")]
    OutOfBounds(Location),
}
