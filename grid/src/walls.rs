use std::cmp::Ordering;

use skirmish_core::{Dimension, Line, Location};

/// Consolidated wall segments used by visibility tests.
///
/// Collinear segments that touch or overlap are merged, and segments lying
/// on the outer map border are dropped because nothing exists beyond them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WallSet {
    lines: Vec<Line>,
    has_diagonal: bool,
}

impl WallSet {
    /// Builds a consolidated wall set from raw segments on a map of `dimension`.
    pub fn build(dimension: Dimension, raw: impl IntoIterator<Item = Line>) -> Self {
        let width = f64::from(dimension.width());
        let height = f64::from(dimension.height());

        let mut horizontal = Vec::new();
        let mut vertical = Vec::new();
        let mut diagonal = Vec::new();
        let mut received = 0_usize;
        for line in raw {
            received += 1;
            if on_border(&line, width, height) {
                continue;
            }
            if line.is_horizontal() {
                horizontal.push(line);
            } else if line.is_vertical() {
                vertical.push(line);
            } else {
                diagonal.push(line);
            }
        }

        horizontal.sort_by(|a, b| {
            a.start()
                .y()
                .total_cmp(&b.start().y())
                .then_with(|| a.cmp(b))
        });
        vertical.sort();

        let has_diagonal = !diagonal.is_empty();
        let mut lines = sweep(horizontal);
        lines.extend(sweep(vertical));
        lines.extend(merge_pairwise(diagonal));
        lines.sort();

        log::debug!("consolidated {received} wall edges into {} segments", lines.len());
        Self {
            lines,
            has_diagonal,
        }
    }

    /// Consolidated segments in ascending order.
    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Number of consolidated segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Reports whether the set holds no segment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Reports whether any segment is neither horizontal nor vertical.
    #[must_use]
    pub const fn has_diagonal(&self) -> bool {
        self.has_diagonal
    }

    /// Iterator over the consolidated segments.
    pub fn iter(&self) -> impl Iterator<Item = &Line> + '_ {
        self.lines.iter()
    }
}

fn on_border(line: &Line, width: f64, height: f64) -> bool {
    let (start, end) = (line.start(), line.end());
    (start.x() == 0.0 && end.x() == 0.0)
        || (start.x() == width && end.x() == width)
        || (start.y() == 0.0 && end.y() == 0.0)
        || (start.y() == height && end.y() == height)
}

/// Merges runs of sorted axis-aligned segments sharing a carrier line.
fn sweep(sorted: Vec<Line>) -> Vec<Line> {
    let mut merged: Vec<Line> = Vec::with_capacity(sorted.len());
    for line in sorted {
        match merged.last_mut() {
            Some(last) => match last.extend(&line) {
                Some(joined) => *last = joined,
                None => merged.push(line),
            },
            None => merged.push(line),
        }
    }
    merged
}

fn merge_pairwise(mut pending: Vec<Line>) -> Vec<Line> {
    pending.sort();
    let mut merged: Vec<Line> = Vec::with_capacity(pending.len());
    for mut line in pending {
        // A merge may bridge two earlier segments, so restart until stable.
        while let Some((position, joined)) = merged
            .iter()
            .enumerate()
            .find_map(|(position, other)| other.extend(&line).map(|joined| (position, joined)))
        {
            let _ = merged.swap_remove(position);
            line = joined;
        }
        merged.push(line);
    }
    merged
}

/// Squares whose interior blocks sight, such as forest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockerSet {
    squares: Vec<Location>,
}

impl BlockerSet {
    /// Creates a blocker set from the provided squares.
    pub fn new(squares: impl IntoIterator<Item = Location>) -> Self {
        let mut squares: Vec<Location> = squares.into_iter().collect();
        squares.sort_by(row_major);
        squares.dedup();
        Self { squares }
    }

    /// Blocking squares in row-major order.
    #[must_use]
    pub fn squares(&self) -> &[Location] {
        &self.squares
    }

    /// Number of blocking squares.
    #[must_use]
    pub fn len(&self) -> usize {
        self.squares.len()
    }

    /// Reports whether no square blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.squares.is_empty()
    }

    /// Reports whether the square blocks.
    #[must_use]
    pub fn contains(&self, location: Location) -> bool {
        self.squares
            .binary_search_by(|probe| row_major(probe, &location))
            .is_ok()
    }
}

fn row_major(a: &Location, b: &Location) -> Ordering {
    a.row().cmp(&b.row()).then(a.column().cmp(&b.column()))
}
