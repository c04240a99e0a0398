use std::{
    collections::HashSet,
    num::NonZeroUsize,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::unbounded;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use skirmish_core::{Creature, Dimension, Location, MapFeature, Rectangle};
use skirmish_grid::{BattleMap, BlockerSet, WallSet};

use crate::{
    pool::WorkerPool,
    tester::{LosTester, Visibility},
    LosError, LosMap,
};

const DEFAULT_RANDOM_TRIALS: u32 = 100;
const DEFAULT_SEED: u64 = 0x5ee1_0f5e_e51d_e5ee;

/// Tuning knobs for line-of-sight computations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LosConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Random trials attempted per square pair after the deterministic ladder fails.
    pub random_trials: u32,
    /// Seed for the random trials; each task derives its own stream from it.
    pub seed: u64,
}

impl LosConfig {
    /// Replaces the worker count.
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Replaces the number of random trials per square pair.
    #[must_use]
    pub const fn with_random_trials(mut self, random_trials: u32) -> Self {
        self.random_trials = random_trials;
        self
    }

    /// Replaces the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for LosConfig {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism().map_or(1, NonZeroUsize::get),
            random_trials: DEFAULT_RANDOM_TRIALS,
            seed: DEFAULT_SEED,
        }
    }
}

#[derive(Debug, Default)]
struct Progress {
    done: AtomicUsize,
    total: AtomicUsize,
    random_hits: AtomicUsize,
}

impl Progress {
    fn reset(&self, total: usize) {
        self.done.store(0, Ordering::SeqCst);
        self.random_hits.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
    }
}

/// Shareable view of the progress of the running computation.
#[derive(Clone, Debug)]
pub struct ProgressHandle(Arc<Progress>);

impl ProgressHandle {
    /// Completed tasks as a percentage in `0..=100`; zero before any work is scheduled.
    #[must_use]
    pub fn percent_done(&self) -> u32 {
        let total = self.total_tasks();
        if total == 0 {
            return 0;
        }
        let percent = 100 * self.tasks_done() / total;
        u32::try_from(percent).unwrap_or(100)
    }

    /// Number of finished tasks.
    #[must_use]
    pub fn tasks_done(&self) -> usize {
        self.0.done.load(Ordering::SeqCst)
    }

    /// Number of scheduled tasks.
    #[must_use]
    pub fn total_tasks(&self) -> usize {
        self.0.total.load(Ordering::SeqCst)
    }
}

/// Result of one line-of-sight computation.
#[derive(Debug)]
pub struct LosOutcome {
    map: LosMap,
    tasks: usize,
    random_hits: usize,
    elapsed: Duration,
}

impl LosOutcome {
    /// Squares visible from any source creature.
    #[must_use]
    pub const fn map(&self) -> &LosMap {
        &self.map
    }

    /// Consumes the outcome, returning the visibility bitmap.
    #[must_use]
    pub fn into_map(self) -> LosMap {
        self.map
    }

    /// Number of square-pair tasks that were scheduled.
    #[must_use]
    pub const fn tasks(&self) -> usize {
        self.tasks
    }

    /// Number of tasks whose target was only found visible by random trials.
    #[must_use]
    pub const fn random_hits(&self) -> usize {
        self.random_hits
    }

    /// Wall-clock duration of the computation.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WallChoice {
    Configured,
    SmokeFree,
}

#[derive(Clone, Copy, Debug)]
struct Task {
    index: u64,
    source: Location,
    target: Location,
    walls: WallChoice,
}

/// Computes the squares visible from a group of creatures on a worker pool.
///
/// The pool lives as long as the calculator; computations are serialized.
#[derive(Debug)]
pub struct LosCalculator {
    config: LosConfig,
    pool: WorkerPool,
    progress: Arc<Progress>,
    running: Mutex<()>,
}

impl LosCalculator {
    /// Starts the worker threads described by `config`.
    pub fn new(config: LosConfig) -> Result<Self, LosError> {
        Ok(Self {
            pool: WorkerPool::new(config.workers)?,
            config,
            progress: Arc::new(Progress::default()),
            running: Mutex::new(()),
        })
    }

    /// Configuration the calculator was started with.
    #[must_use]
    pub const fn config(&self) -> &LosConfig {
        &self.config
    }

    /// Number of worker threads.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.pool.size()
    }

    /// Handle for polling progress from another thread.
    #[must_use]
    pub fn progress(&self) -> ProgressHandle {
        ProgressHandle(Arc::clone(&self.progress))
    }

    /// Completion of the running computation in percent.
    #[must_use]
    pub fn percent_done(&self) -> u32 {
        self.progress().percent_done()
    }

    /// Computes every square visible from the union of the creatures' footprints.
    ///
    /// Squares under the creatures are visible by definition. Solid squares are
    /// never tested. When `smoke_blocks_los` is set, a creature standing in
    /// smoke still sees the ring of squares around its own footprint.
    /// Blocks until every task has finished; a failing task fails the whole
    /// computation.
    pub fn compute_los(
        &self,
        map: &BattleMap,
        sources: &[Creature],
        smoke_blocks_los: bool,
    ) -> Result<LosOutcome, LosError> {
        let _guard = self.running.lock();
        let started = Instant::now();
        let dimension = map.dimension();

        for creature in sources {
            if !dimension.contains_rect(&creature.footprint()) {
                return Err(LosError::OutOfBounds(creature.location()));
            }
        }

        let los = Arc::new(LosMap::new(dimension));
        let occupied: HashSet<Location> = sources
            .iter()
            .flat_map(|creature| creature.footprint().locations())
            .collect();
        for location in &occupied {
            let _ = los.set(*location);
        }

        let tasks = schedule(map, sources, &occupied, smoke_blocks_los);
        let walls = Arc::new(map.wall_set(smoke_blocks_los));
        let smoke_free = if tasks.iter().any(|task| task.walls == WallChoice::SmokeFree) {
            Arc::new(map.wall_set(false))
        } else {
            Arc::clone(&walls)
        };
        let blockers = Arc::new(map.area_blockers());

        let total = tasks.len();
        self.progress.reset(total);
        let (results, finished) = unbounded::<Result<(), u64>>();
        for task in tasks {
            let job = TaskJob {
                task,
                walls: Arc::clone(match task.walls {
                    WallChoice::Configured => &walls,
                    WallChoice::SmokeFree => &smoke_free,
                }),
                blockers: Arc::clone(&blockers),
                los: Arc::clone(&los),
                progress: Arc::clone(&self.progress),
                random_trials: self.config.random_trials,
                seed: self.config.seed,
            };
            let results = results.clone();
            self.pool.submit(Box::new(move || {
                let _ = results.send(job.run());
            }))?;
        }
        drop(results);

        let mut failure = None;
        for _ in 0..total {
            match finished.recv() {
                Ok(Ok(())) => {}
                Ok(Err(index)) => {
                    let _ = failure.get_or_insert(LosError::TaskPanicked(index));
                }
                Err(_) => return Err(LosError::WorkerLost),
            }
        }
        if let Some(error) = failure {
            return Err(error);
        }

        let outcome = LosOutcome {
            map: los.snapshot(),
            tasks: total,
            random_hits: self.progress.random_hits.load(Ordering::SeqCst),
            elapsed: started.elapsed(),
        };
        log::info!(
            "line of sight to {} squares from {} creature(s) [{} random] in {:?}",
            outcome.map.count(),
            sources.len(),
            outcome.random_hits,
            outcome.elapsed
        );
        Ok(outcome)
    }
}

/// Enumerates square-pair tasks in a fixed order; the order seeds each task's
/// random stream.
fn schedule(
    map: &BattleMap,
    sources: &[Creature],
    occupied: &HashSet<Location>,
    smoke_blocks_los: bool,
) -> Vec<Task> {
    let dimension = map.dimension();
    let mut tasks = Vec::new();
    let mut push = |source: Location, target: Location, walls: WallChoice| {
        let index = tasks.len() as u64;
        tasks.push(Task {
            index,
            source,
            target,
            walls,
        });
    };

    for creature in sources {
        let footprint = creature.footprint();
        let in_smoke = smoke_blocks_los
            && footprint.locations().any(|location| {
                map.get(location)
                    .is_some_and(|square| square.has(MapFeature::Smoke))
            });
        for source in footprint.locations() {
            for target in dimension.locations() {
                if occupied.contains(&target) || map.is_solid(target) {
                    continue;
                }
                push(source, target, WallChoice::Configured);
            }
            if in_smoke {
                for target in ring(&footprint, dimension) {
                    if occupied.contains(&target) || map.is_solid(target) {
                        continue;
                    }
                    push(source, target, WallChoice::SmokeFree);
                }
            }
        }
    }
    tasks
}

/// Squares touching the footprint from outside, clipped to the map.
fn ring(footprint: &Rectangle, dimension: Dimension) -> impl Iterator<Item = Location> + '_ {
    let left = footprint.left().saturating_sub(1);
    let bottom = footprint.bottom().saturating_sub(1);
    let right = (footprint.right() + 1).min(dimension.width() - 1);
    let top = (footprint.top() + 1).min(dimension.height() - 1);
    (bottom..=top)
        .flat_map(move |row| (left..=right).map(move |column| (column, row)))
        .filter_map(|(column, row)| Location::new(column, row).ok())
        .filter(move |location| !footprint.contains(*location))
}

struct TaskJob {
    task: Task,
    walls: Arc<WallSet>,
    blockers: Arc<BlockerSet>,
    los: Arc<LosMap>,
    progress: Arc<Progress>,
    random_trials: u32,
    seed: u64,
}

impl TaskJob {
    fn run(self) -> Result<(), u64> {
        let Task {
            index,
            source,
            target,
            ..
        } = self.task;
        let tested = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
            rng.set_stream(index);
            LosTester::new(source, &self.walls, &self.blockers, self.random_trials)
                .test_location(target, &mut rng)
        }));
        let result = match tested {
            Ok(visibility) => {
                if visibility.is_visible() {
                    let _ = self.los.set(target);
                }
                if let Visibility::Sampled { .. } = visibility {
                    let _ = self.progress.random_hits.fetch_add(1, Ordering::SeqCst);
                }
                Ok(())
            }
            Err(_) => {
                log::error!("line-of-sight task {index} ({source} -> {target}) panicked");
                Err(index)
            }
        };
        let _ = self.progress.done.fetch_add(1, Ordering::SeqCst);
        result
    }
}

#[cfg(test)]
mod tests {
    use skirmish_core::CreatureSize;

    use super::*;

    fn at(column: u32, row: u32) -> Location {
        Location::new(column, row).expect("valid location")
    }

    #[test]
    fn ring_is_clipped_to_the_map() {
        let dimension = Dimension::new(5, 5).expect("valid dimension");
        let corner = Rectangle::single(at(0, 0));
        let around: Vec<_> = ring(&corner, dimension).collect();
        assert_eq!(around, vec![at(1, 0), at(0, 1), at(1, 1)]);

        let middle = Rectangle::square(at(1, 1), 2);
        assert_eq!(ring(&middle, dimension).count(), 12);
    }

    #[test]
    fn schedule_skips_sources_and_solid_targets() {
        let mut map = BattleMap::new(Dimension::new(4, 3).expect("valid dimension"), "tasks");
        map.mark_solid(at(3, 2)).expect("on map");
        let creature = Creature::new(CreatureSize::Large, at(0, 0));
        let occupied: HashSet<_> = creature.footprint().locations().collect();

        let tasks = schedule(&map, &[creature], &occupied, false);
        assert_eq!(tasks.len(), 4 * (12 - 4 - 1));
        assert!(tasks
            .iter()
            .enumerate()
            .all(|(index, task)| task.index == index as u64));
        assert!(tasks
            .iter()
            .all(|task| !occupied.contains(&task.target) && task.target != at(3, 2)));
    }

    #[test]
    fn schedule_adds_smoke_free_ring_for_creatures_in_smoke() {
        let mut map = BattleMap::new(Dimension::new(5, 5).expect("valid dimension"), "smoke");
        let _ = map.add_feature(at(2, 2), MapFeature::Smoke).expect("on map");
        let creature = Creature::new(CreatureSize::Medium, at(2, 2));
        let occupied: HashSet<_> = creature.footprint().locations().collect();

        let tasks = schedule(&map, &[creature], &occupied, true);
        let smoke_free = tasks
            .iter()
            .filter(|task| task.walls == WallChoice::SmokeFree)
            .count();
        assert_eq!(smoke_free, 8);
        assert_eq!(tasks.len(), 24 + 8);

        let tasks = schedule(&map, &[creature], &occupied, false);
        assert_eq!(tasks.len(), 24);
    }

    #[test]
    fn config_builders_replace_fields() {
        let config = LosConfig::default()
            .with_workers(2)
            .with_random_trials(5)
            .with_seed(9);
        assert_eq!(
            config,
            LosConfig {
                workers: 2,
                random_trials: 5,
                seed: 9
            }
        );
        assert!(LosConfig::default().workers >= 1);
    }
}
