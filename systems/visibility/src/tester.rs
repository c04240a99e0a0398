//! Square-to-square visibility decisions.
//!
//! Two squares see each other when some straight segment between a point of
//! the first and a point of the second crosses no wall and no blocking square
//! interior. The tester samples candidate segments between the facing
//! diagonals of both squares, first on a fixed ladder of offsets and then with
//! a bounded number of random offsets.

use once_cell::sync::Lazy;
use rand::Rng;
use skirmish_core::{Line, Location, Point, Rectangle};
use skirmish_grid::{BlockerSet, WallSet};

/// Offset ladder used when every relevant wall is axis-aligned.
pub const COARSE_STEPS: u32 = 32;

/// Offset ladder used when a relevant wall runs diagonally.
pub const FINE_STEPS: u32 = 64;

static COARSE_OFFSETS: Lazy<Vec<f64>> = Lazy::new(|| make_test_offsets(COARSE_STEPS));
static FINE_OFFSETS: Lazy<Vec<f64>> = Lazy::new(|| make_test_offsets(FINE_STEPS));

/// Builds the deterministic offsets sampled along a square diagonal.
///
/// The ladder starts with both endpoints, walks inward from both ends in
/// steps of `1 / steps`, then adds a point just inside each corner and
/// finally the midpoint.
#[must_use]
pub fn make_test_offsets(steps: u32) -> Vec<f64> {
    let n = f64::from(steps);
    let mut offsets = Vec::with_capacity(steps as usize + 3);
    offsets.extend([0.0, 1.0]);
    for k in 1..steps / 2 {
        let k = f64::from(k);
        offsets.extend([k / n, (n - k) / n]);
    }
    offsets.extend([1.0 / 512.0, 511.0 / 512.0, 0.5]);
    offsets
}

/// Result of a single visibility test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// A deterministic sample segment is unobstructed.
    Clear,
    /// Only random sampling found an unobstructed segment.
    Sampled {
        /// 1-based index of the successful random trial.
        trials: u32,
    },
    /// No unobstructed segment was found.
    Blocked,
}

impl Visibility {
    /// Reports whether the target is visible.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        !matches!(self, Self::Blocked)
    }

    /// Numeric form: 0 when found deterministically, the trial index when
    /// found by sampling, and -1 when not visible.
    #[must_use]
    pub fn code(&self) -> i64 {
        match self {
            Self::Clear => 0,
            Self::Sampled { trials } => i64::from(*trials),
            Self::Blocked => -1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slope {
    Ascending,
    Descending,
}

impl Slope {
    fn between(source: Location, target: Location) -> Self {
        let (sc, sr) = (source.column(), source.row());
        let (tc, tr) = (target.column(), target.row());
        // Squares sharing a row or column fall back to the descending pair.
        if sc == tc || sr == tr || (sc < tc) == (sr < tr) {
            Self::Descending
        } else {
            Self::Ascending
        }
    }

    fn point(self, square: Location, offset: f64) -> (f64, f64) {
        let x = f64::from(square.column()) + offset;
        let y = f64::from(square.row());
        match self {
            Self::Ascending => (x, y + offset),
            Self::Descending => (x, y + 1.0 - offset),
        }
    }
}

/// Local obstacles between one source and one target square.
struct Obstacles<'a> {
    walls: Vec<&'a Line>,
    blockers: Vec<Location>,
    has_diagonal: bool,
}

impl Obstacles<'_> {
    fn is_clear(&self, x1: f64, y1: f64, x2: f64, y2: f64) -> bool {
        self.walls
            .iter()
            .all(|wall| !wall.intersects_or_touches(x1, y1, x2, y2))
            && self
                .blockers
                .iter()
                .all(|square| !crosses_interior(*square, x1, y1, x2, y2))
    }

    /// Without diagonal walls every sample point sees its own square's center.
    fn sees_center(&self, square: Location, x: f64, y: f64) -> bool {
        if !self.has_diagonal {
            return true;
        }
        let center = Point::center_of(square);
        if center.x() == x && center.y() == y {
            return true;
        }
        self.walls
            .iter()
            .all(|wall| !wall.intersects_or_touches(x, y, center.x(), center.y()))
    }
}

/// Decides visibility from one source square.
#[derive(Clone, Copy, Debug)]
pub struct LosTester<'a> {
    source: Location,
    walls: &'a WallSet,
    blockers: &'a BlockerSet,
    random_trials: u32,
}

impl<'a> LosTester<'a> {
    /// Creates a tester for `source` against the provided obstacles.
    #[must_use]
    pub const fn new(
        source: Location,
        walls: &'a WallSet,
        blockers: &'a BlockerSet,
        random_trials: u32,
    ) -> Self {
        Self {
            source,
            walls,
            blockers,
            random_trials,
        }
    }

    /// Square the tester looks from.
    #[must_use]
    pub const fn source(&self) -> Location {
        self.source
    }

    /// Number of deterministic offsets per diagonal used toward `target`.
    #[must_use]
    pub fn sample_steps(&self, target: Location) -> u32 {
        if self.obstacles(target).has_diagonal {
            FINE_STEPS
        } else {
            COARSE_STEPS
        }
    }

    /// Tests whether `target` is visible from the source square.
    ///
    /// Random trials draw from `rng`; a fixed seed yields reproducible
    /// results.
    pub fn test_location<R: Rng>(&self, target: Location, rng: &mut R) -> Visibility {
        if target == self.source {
            return Visibility::Clear;
        }
        let obstacles = self.obstacles(target);

        if !obstacles.has_diagonal {
            if target.column() == self.source.column() {
                return self.same_column(target, &obstacles);
            }
            if target.row() == self.source.row() {
                return self.same_row(target, &obstacles);
            }
        }

        let slope = Slope::between(self.source, target);
        let offsets: &[f64] = if obstacles.has_diagonal {
            &FINE_OFFSETS
        } else {
            &COARSE_OFFSETS
        };
        for &source_offset in offsets {
            let (x1, y1) = slope.point(self.source, source_offset);
            if !obstacles.sees_center(self.source, x1, y1) {
                continue;
            }
            for &target_offset in offsets {
                let (x2, y2) = slope.point(target, target_offset);
                if obstacles.sees_center(target, x2, y2) && obstacles.is_clear(x1, y1, x2, y2) {
                    return Visibility::Clear;
                }
            }
        }

        for trial in 1..=self.random_trials {
            let (x1, y1) = slope.point(self.source, rng.gen::<f64>());
            let (x2, y2) = slope.point(target, rng.gen::<f64>());
            if obstacles.sees_center(self.source, x1, y1)
                && obstacles.sees_center(target, x2, y2)
                && obstacles.is_clear(x1, y1, x2, y2)
            {
                log::debug!(
                    "{} -> {target}: random trial {trial} found ({x1}; {y1}) - ({x2}; {y2})",
                    self.source
                );
                return Visibility::Sampled { trials: trial };
            }
        }
        Visibility::Blocked
    }

    fn obstacles(&self, target: Location) -> Obstacles<'a> {
        let area = Rectangle::new(self.source, target);
        let bounds = area.bounds(1.0);
        let walls: Vec<&'a Line> = self
            .walls
            .iter()
            .filter(|wall| bounds.admits(wall))
            .collect();
        let has_diagonal = walls.iter().any(|wall| wall.is_diagonal());
        let blockers = self
            .blockers
            .squares()
            .iter()
            .copied()
            .filter(|square| area.contains(*square) && *square != self.source && *square != target)
            .collect();
        Obstacles {
            walls,
            blockers,
            has_diagonal,
        }
    }

    /// Only horizontal walls spanning the whole column between the squares block.
    fn same_column(&self, target: Location, obstacles: &Obstacles<'_>) -> Visibility {
        let column = f64::from(target.column());
        let bottom = f64::from(self.source.row().min(target.row()));
        let top = f64::from(self.source.row().max(target.row()));
        let blocked = obstacles.walls.iter().any(|wall| {
            let y = wall.start().y();
            wall.is_horizontal()
                && y > bottom
                && y <= top
                && wall.start().x() <= column
                && wall.end().x() >= column + 1.0
        });
        if blocked {
            Visibility::Blocked
        } else {
            Visibility::Clear
        }
    }

    /// Only vertical walls spanning the whole row between the squares block.
    fn same_row(&self, target: Location, obstacles: &Obstacles<'_>) -> Visibility {
        let row = f64::from(target.row());
        let left = f64::from(self.source.column().min(target.column()));
        let right = f64::from(self.source.column().max(target.column()));
        let blocked = obstacles.walls.iter().any(|wall| {
            let x = wall.start().x();
            wall.is_vertical()
                && x > left
                && x <= right
                && wall.start().y() <= row
                && wall.end().y() >= row + 1.0
        });
        if blocked {
            Visibility::Blocked
        } else {
            Visibility::Clear
        }
    }
}

/// Reports whether the segment passes through the open interior of `square`.
///
/// The segment is clipped to the closed square; touching a corner or running
/// along an edge leaves the clipped part on the boundary and does not count.
fn crosses_interior(square: Location, x1: f64, y1: f64, x2: f64, y2: f64) -> bool {
    let left = f64::from(square.column());
    let bottom = f64::from(square.row());
    let (right, top) = (left + 1.0, bottom + 1.0);
    let (dx, dy) = (x2 - x1, y2 - y1);

    let mut enter = 0.0_f64;
    let mut leave = 1.0_f64;
    for (p, q) in [
        (-dx, x1 - left),
        (dx, right - x1),
        (-dy, y1 - bottom),
        (dy, top - y1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return false;
            }
        } else {
            let t = q / p;
            if p < 0.0 {
                enter = enter.max(t);
            } else {
                leave = leave.min(t);
            }
        }
    }
    if enter >= leave {
        return false;
    }
    let middle = (enter + leave) / 2.0;
    let (mx, my) = (x1 + middle * dx, y1 + middle * dy);
    mx > left && mx < right && my > bottom && my < top
}
