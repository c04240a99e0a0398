#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Movement costs for a creature on a battle map.
//!
//! Starting from the creature's square, every reachable anchor square gets the
//! cheapest cost of getting there. Orthogonal steps cost one, diagonal steps
//! alternate between one and two, and difficult terrain raises both. Creatures
//! larger than a single square also count every square their footprint covers
//! at the cheapest anchor cost that covers it.

use skirmish_core::{Creature, CreatureSize, Dimension, Location};
use skirmish_grid::BattleMap;

mod tables;

use tables::{is_diagonal, step_table, MoveCheck, STEP_OFFSETS};

/// Cost recorded for squares the creature cannot reach.
pub const UNREACHABLE: u8 = 127;

/// Errors raised while computing movement costs.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MovementError {
    /// Only creatures up to [`CreatureSize::Huge`] can be moved.
    #[error("movement is not supported for {0:?} creatures")]
    UnsupportedCreatureSize(CreatureSize),
    /// The movement map and the battle map differ in size.
    #[error("movement map is {expected} but the battle map is {found}")]
    DimensionMismatch {
        /// Size of the movement map.
        expected: Dimension,
        /// Size of the battle map.
        found: Dimension,
    },
    /// The creature's footprint does not fit on the map.
    #[error("creature at {0} does not fit on the map")]
    CreatureOutOfBounds(Location),
}

#[derive(Clone, Copy, Debug)]
struct Step {
    destination: Location,
    difficult: bool,
}

/// Cheapest movement cost to every square of a map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovementMap {
    dimension: Dimension,
    moves: Vec<u8>,
    diagonal: Vec<bool>,
}

impl MovementMap {
    /// Creates a map where every square is unreachable.
    #[must_use]
    pub fn new(dimension: Dimension) -> Self {
        Self {
            dimension,
            moves: vec![UNREACHABLE; dimension.area()],
            diagonal: vec![false; dimension.area()],
        }
    }

    /// Size of the map.
    #[must_use]
    pub const fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Marks every square unreachable again.
    pub fn clear(&mut self) {
        self.moves.fill(UNREACHABLE);
        self.diagonal.fill(false);
    }

    /// Cost of reaching `location`, or [`UNREACHABLE`].
    #[must_use]
    pub fn get_move(&self, location: Location) -> u8 {
        self.dimension
            .index(location)
            .map_or(UNREACHABLE, |index| self.moves[index])
    }

    /// Cost of reaching `location`, if it can be reached.
    #[must_use]
    pub fn cost(&self, location: Location) -> Option<u32> {
        let value = self.get_move(location);
        (value < UNREACHABLE).then(|| u32::from(value))
    }

    /// Reachable squares with their costs, row by row.
    pub fn reachable(&self) -> impl Iterator<Item = (Location, u32)> + '_ {
        self.dimension
            .locations()
            .filter_map(|location| self.cost(location).map(|cost| (location, cost)))
    }

    /// Replaces the contents with the costs for `creature` on `map`.
    pub fn compute(&mut self, map: &BattleMap, creature: &Creature) -> Result<(), MovementError> {
        if map.dimension() != self.dimension {
            return Err(MovementError::DimensionMismatch {
                expected: self.dimension,
                found: map.dimension(),
            });
        }
        let size = creature.size();
        let squares = size.squares();
        let table = step_table(squares).ok_or(MovementError::UnsupportedCreatureSize(size))?;
        let start = creature.location();
        if !self.dimension.contains_rect(&creature.footprint()) {
            return Err(MovementError::CreatureOutOfBounds(start));
        }

        self.clear();
        let mut pending = vec![(start, 0_u32, false)];
        let mut expanded = 0_usize;
        while let Some((location, cost, diagonal)) = pending.pop() {
            if !self.improve(location, cost, diagonal) {
                continue;
            }
            expanded += 1;
            for (direction, checks) in table.iter().enumerate() {
                let Some(step) = try_step(map, location, direction, checks) else {
                    continue;
                };
                let (step_cost, arrived_diagonally) = if !is_diagonal(direction) {
                    (if step.difficult { 2 } else { 1 }, diagonal)
                } else if step.difficult {
                    (3, diagonal)
                } else if diagonal {
                    (2, false)
                } else {
                    (1, true)
                };
                pending.push((step.destination, cost + step_cost, arrived_diagonally));
            }
        }

        if squares > 1 {
            self.spread_over_footprint(squares);
        }
        log::debug!(
            "movement for {size:?} creature at {start}: {expanded} expansions, {} squares reachable",
            self.moves.iter().filter(|value| **value < UNREACHABLE).count()
        );
        Ok(())
    }

    /// Records `cost` at `location` when it beats the stored value.
    ///
    /// At equal cost, arriving orthogonally beats arriving diagonally because
    /// the next diagonal step is cheaper.
    fn improve(&mut self, location: Location, cost: u32, diagonal: bool) -> bool {
        let Some(index) = self.dimension.index(location) else {
            return false;
        };
        let current = u32::from(self.moves[index]);
        let better = cost < current || (cost == current && !diagonal && self.diagonal[index]);
        if better {
            self.moves[index] = cost as u8;
            self.diagonal[index] = diagonal;
        }
        better
    }

    /// Gives every square the cheapest cost of an anchor whose footprint covers it.
    fn spread_over_footprint(&mut self, squares: u32) {
        let anchors = self.moves.clone();
        let width = self.dimension.width();
        let height = self.dimension.height();
        let (Some(last_column), Some(last_row)) =
            (width.checked_sub(squares), height.checked_sub(squares))
        else {
            return;
        };
        for row in 0..=last_row {
            for column in 0..=last_column {
                let anchor = (row * width + column) as usize;
                let value = anchors[anchor];
                if value == UNREACHABLE {
                    continue;
                }
                for covered_row in row..row + squares {
                    for covered_column in column..column + squares {
                        let index = (covered_row * width + covered_column) as usize;
                        self.moves[index] = self.moves[index].min(value);
                    }
                }
            }
        }
    }
}

/// Computes movement costs for `creature` on a fresh map.
pub fn compute_movement(map: &BattleMap, creature: &Creature) -> Result<MovementMap, MovementError> {
    let mut movement = MovementMap::new(map.dimension());
    movement.compute(map, creature)?;
    Ok(movement)
}

fn try_step(
    map: &BattleMap,
    location: Location,
    direction: usize,
    checks: &[MoveCheck],
) -> Option<Step> {
    let dimension = map.dimension();
    let mut difficult = false;
    for check in checks {
        let square = map.get(location.offset(check.dx, check.dy, dimension)?)?;
        if check.terrain {
            if square.is_impassable() {
                return None;
            }
            difficult |= square.is_difficult();
        }
        if check.walls.iter().any(|wall| square.wall(*wall)) {
            return None;
        }
    }
    let (dx, dy) = STEP_OFFSETS[direction];
    Some(Step {
        destination: location.offset(dx, dy, dimension)?,
        difficult,
    })
}
