//! Squares and walls checked for each step of a creature footprint.
//!
//! A step in one of the eight compass directions is legal when every listed
//! square lies on the map, is passable (unless the check skips terrain), and
//! carries none of the listed walls. Offsets are relative to the footprint's
//! lower-left square.

use skirmish_core::Direction::{self, East as E, North as N, South as S, West as W};

/// Number of step directions.
pub(crate) const DIRECTIONS: usize = 8;

/// Column and row offsets of the steps, clockwise from north.
pub(crate) const STEP_OFFSETS: [(i32, i32); DIRECTIONS] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// Reports whether the step with index `direction` is diagonal.
pub(crate) const fn is_diagonal(direction: usize) -> bool {
    direction % 2 == 1
}

/// One square inspected before a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MoveCheck {
    pub(crate) dx: i32,
    pub(crate) dy: i32,
    pub(crate) walls: &'static [Direction],
    pub(crate) terrain: bool,
}

/// Square entered by the footprint; only its terrain matters.
macro_rules! cell {
    ($dx:expr, $dy:expr) => {
        MoveCheck {
            dx: $dx,
            dy: $dy,
            walls: &[],
            terrain: true,
        }
    };
}

/// Square whose walls bound the step. Terrain is checked unless it is the anchor.
macro_rules! edge {
    ($dx:expr, $dy:expr; $($wall:ident),+) => {
        MoveCheck {
            dx: $dx,
            dy: $dy,
            walls: &[$($wall),+],
            terrain: !($dx == 0 && $dy == 0),
        }
    };
}

/// Corner square passed by a diagonal step; walls only.
macro_rules! rim {
    ($dx:expr, $dy:expr; $wall:ident) => {
        MoveCheck {
            dx: $dx,
            dy: $dy,
            walls: &[$wall],
            terrain: false,
        }
    };
}

type StepTable = [&'static [MoveCheck]; DIRECTIONS];

static SINGLE: StepTable = [
    &[edge!(0, 1; S)],
    &[edge!(0, 0; N, E), edge!(1, 1; S, W)],
    &[edge!(1, 0; W)],
    &[edge!(0, 0; S, E), edge!(1, -1; N, W)],
    &[edge!(0, -1; N)],
    &[edge!(0, 0; S, W), edge!(-1, -1; N, E)],
    &[edge!(-1, 0; E)],
    &[edge!(0, 0; N, W), edge!(-1, 1; S, E)],
];

static DOUBLE: StepTable = [
    &[edge!(0, 2; S, E), edge!(1, 2; S), cell!(0, 1), cell!(1, 1)],
    &[
        rim!(0, 2; S),
        edge!(1, 2; S, W),
        edge!(2, 2; S, W),
        edge!(2, 1; S, W),
        rim!(2, 0; W),
        cell!(1, 1),
    ],
    &[edge!(2, 1; W), edge!(2, 0; W, N), cell!(1, 0), cell!(1, 1)],
    &[
        rim!(2, 1; W),
        edge!(2, 0; W, N),
        edge!(2, -1; W, N),
        edge!(1, -1; W, N),
        rim!(0, -1; N),
        cell!(1, 0),
    ],
    &[edge!(0, -1; N, E), edge!(1, -1; N), cell!(0, 0), cell!(1, 0)],
    &[
        rim!(-1, 1; E),
        edge!(-1, 0; E, N),
        edge!(-1, -1; E, N),
        edge!(0, -1; E, N),
        rim!(1, -1; N),
        cell!(0, 0),
    ],
    &[edge!(-1, 1; E, S), edge!(-1, 0; E), cell!(0, 0), cell!(0, 1)],
    &[
        rim!(-1, 0; E),
        edge!(-1, 1; E, S),
        edge!(-1, 2; E, S),
        edge!(0, 2; E, S),
        rim!(1, 2; S),
        cell!(0, 1),
    ],
];

static TRIPLE: StepTable = [
    &[
        edge!(0, 3; S, E),
        edge!(1, 3; S, E),
        edge!(2, 3; S),
        cell!(0, 1),
        cell!(1, 1),
        cell!(2, 1),
        cell!(0, 2),
        cell!(1, 2),
        cell!(2, 2),
    ],
    &[
        rim!(0, 3; S),
        edge!(1, 3; S, W),
        edge!(2, 3; S, W),
        edge!(3, 3; S, W),
        edge!(3, 2; S, W),
        edge!(3, 1; S, W),
        rim!(3, 0; W),
        cell!(1, 1),
        cell!(2, 1),
        cell!(1, 2),
        cell!(2, 2),
    ],
    &[
        edge!(3, 2; W, S),
        edge!(3, 1; W, S),
        edge!(3, 0; W),
        cell!(1, 2),
        cell!(1, 1),
        cell!(1, 0),
        cell!(2, 2),
        cell!(2, 1),
        cell!(2, 0),
    ],
    &[
        rim!(3, 2; W),
        edge!(3, 1; W, N),
        edge!(3, 0; W, N),
        edge!(3, -1; W, N),
        edge!(2, -1; W, N),
        edge!(1, -1; W, N),
        rim!(0, -1; N),
        cell!(1, 1),
        cell!(2, 1),
        cell!(1, 0),
        cell!(2, 0),
    ],
    &[
        edge!(0, -1; N, E),
        edge!(1, -1; N, E),
        edge!(2, -1; N),
        cell!(0, 1),
        cell!(1, 1),
        cell!(2, 1),
        cell!(0, 0),
        cell!(1, 0),
        cell!(2, 0),
    ],
    &[
        rim!(-1, 2; E),
        edge!(-1, 1; E, N),
        edge!(-1, 0; E, N),
        edge!(-1, -1; E, N),
        edge!(0, -1; E, N),
        edge!(1, -1; E, N),
        rim!(2, -1; N),
        cell!(0, 0),
        cell!(1, 0),
        cell!(0, 1),
        cell!(1, 1),
    ],
    &[
        edge!(-1, 2; E, S),
        edge!(-1, 1; E, S),
        edge!(-1, 0; E),
        cell!(0, 0),
        cell!(0, 1),
        cell!(0, 2),
        cell!(1, 0),
        cell!(1, 1),
        cell!(1, 2),
    ],
    &[
        rim!(-1, 0; E),
        edge!(-1, 1; E, S),
        edge!(-1, 2; E, S),
        edge!(-1, 3; E, S),
        edge!(0, 3; E, S),
        edge!(1, 3; E, S),
        rim!(2, 3; S),
        cell!(0, 1),
        cell!(1, 1),
        cell!(0, 2),
        cell!(1, 2),
    ],
];

/// Step table for a footprint `squares` wide, if that size is supported.
pub(crate) fn step_table(squares: u32) -> Option<&'static StepTable> {
    match squares {
        1 => Some(&SINGLE),
        2 => Some(&DOUBLE),
        3 => Some(&TRIPLE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_walls_skip_terrain() {
        for squares in 1..=3 {
            let table = step_table(squares).expect("supported size");
            for check in table.iter().flat_map(|checks| checks.iter()) {
                if check.dx == 0 && check.dy == 0 && !check.walls.is_empty() {
                    assert!(!check.terrain, "anchor terrain checked for size {squares}");
                }
            }
        }
    }

    #[test]
    fn every_entered_square_is_checked() {
        for squares in 1..=3_i32 {
            let table = step_table(squares as u32).expect("supported size");
            for (direction, checks) in table.iter().enumerate() {
                let (dx, dy) = STEP_OFFSETS[direction];
                for column in dx..dx + squares {
                    for row in dy..dy + squares {
                        if (0..squares).contains(&column) && (0..squares).contains(&row) {
                            continue;
                        }
                        assert!(
                            checks
                                .iter()
                                .any(|check| check.dx == column && check.dy == row && check.terrain),
                            "size {squares} direction {direction} misses ({column}, {row})"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn unsupported_sizes_have_no_table() {
        assert!(step_table(4).is_none());
        assert!(step_table(6).is_none());
        assert!(step_table(0).is_none());
    }

    #[test]
    fn diagonal_steps_have_odd_indices() {
        assert!(!is_diagonal(0));
        assert!(is_diagonal(1));
        assert!(is_diagonal(7));
        assert_eq!(STEP_OFFSETS[1], (1, 1));
        assert_eq!(STEP_OFFSETS[5], (-1, -1));
    }
}
