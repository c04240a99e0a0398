#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grid model for skirmish battle maps.
//!
//! A [`BattleMap`] stores per-square terrain, wall flags and colors, plus any
//! free-standing wall segments that do not follow grid edges. Authoring
//! collaborators populate it through [`BattleMap::mark_solid`],
//! [`BattleMap::add_wall`], [`BattleMap::add_polygon`] and
//! [`BattleMap::add_feature`]; the visibility and movement engines read it
//! through [`BattleMap::wall_set`], [`BattleMap::area_blockers`] and
//! [`BattleMap::get`].

use skirmish_core::{
    CoreError, Creature, Dimension, Direction, Line, Location, MapFeature, Polygon, Rectangle,
};

mod square;
mod walls;

pub use square::{MapSquare, SquareColor};
pub use walls::{BlockerSet, WallSet};

/// Errors raised while authoring a map.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// The square lies outside the map.
    #[error("square {0} lies outside the map")]
    OutOfBounds(Location),
    /// The segment leaves the map area.
    #[error("wall {0} leaves the map area")]
    NotOnGrid(Line),
    /// A core value could not be constructed.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Grid of squares forming a battle map, with row 0 at the bottom.
#[derive(Clone, Debug)]
pub struct BattleMap {
    name: String,
    dimension: Dimension,
    squares: Vec<MapSquare>,
    free_walls: Vec<Line>,
}

impl BattleMap {
    /// Creates an open map without walls or features.
    #[must_use]
    pub fn new(dimension: Dimension, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dimension,
            squares: vec![MapSquare::default(); dimension.area()],
            free_walls: Vec::new(),
        }
    }

    /// Name of the map.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Extent of the map.
    #[must_use]
    pub const fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Square at the provided location, if it lies on the map.
    #[must_use]
    pub fn get(&self, location: Location) -> Option<&MapSquare> {
        self.dimension
            .index(location)
            .and_then(|index| self.squares.get(index))
    }

    fn square_mut(&mut self, location: Location) -> Result<&mut MapSquare, GridError> {
        self.dimension
            .index(location)
            .and_then(|index| self.squares.get_mut(index))
            .ok_or(GridError::OutOfBounds(location))
    }

    /// Reports whether the square is solid rock. Squares off the map are not.
    #[must_use]
    pub fn is_solid(&self, location: Location) -> bool {
        self.get(location).is_some_and(MapSquare::is_solid)
    }

    /// Walls one edge of a square on both sides.
    pub fn add_double_wall(
        &mut self,
        location: Location,
        direction: Direction,
    ) -> Result<(), GridError> {
        self.square_mut(location)?.set_wall(direction);
        if let Some(neighbor) = location.neighbor(direction, self.dimension) {
            self.square_mut(neighbor)?.set_wall(direction.opposite());
        }
        Ok(())
    }

    /// Turns a square into solid rock by walling all four of its edges.
    pub fn mark_solid(&mut self, location: Location) -> Result<(), GridError> {
        for direction in Direction::ALL {
            self.add_double_wall(location, direction)?;
        }
        Ok(())
    }

    /// Adds a thin wall.
    ///
    /// Segments that follow grid edges are recorded as double walls on the
    /// squares they separate, so movement honours them. Any other segment is
    /// kept as a free wall that only blocks sight.
    pub fn add_wall(&mut self, line: Line) -> Result<(), GridError> {
        let width = f64::from(self.dimension.width());
        let height = f64::from(self.dimension.height());
        let (start, end) = (line.start(), line.end());
        let inside = |x: f64, y: f64| (0.0..=width).contains(&x) && (0.0..=height).contains(&y);
        if !inside(start.x(), start.y()) || !inside(end.x(), end.y()) {
            return Err(GridError::NotOnGrid(line));
        }

        let integral = [start.x(), start.y(), end.x(), end.y()]
            .iter()
            .all(|value| value.fract() == 0.0);
        if integral && line.is_horizontal() {
            let row = start.y() as u32;
            for column in start.x() as u32..end.x() as u32 {
                if row < self.dimension.height() {
                    self.add_double_wall(Location::new(column, row)?, Direction::South)?;
                } else {
                    self.add_double_wall(Location::new(column, row - 1)?, Direction::North)?;
                }
            }
        } else if integral && line.is_vertical() {
            let column = start.x() as u32;
            for row in start.y() as u32..end.y() as u32 {
                if column < self.dimension.width() {
                    self.add_double_wall(Location::new(column, row)?, Direction::West)?;
                } else {
                    self.add_double_wall(Location::new(column - 1, row)?, Direction::East)?;
                }
            }
        } else {
            self.free_walls.push(line);
        }
        Ok(())
    }

    /// Adds a thick wall.
    ///
    /// Every square whose center lies inside the polygon becomes solid, and
    /// the polygon outline is added as thin walls.
    pub fn add_polygon(&mut self, polygon: &Polygon) -> Result<(), GridError> {
        let width = f64::from(self.dimension.width());
        let height = f64::from(self.dimension.height());
        if let Some(edge) = polygon.edges().find(|edge| {
            let bounds = edge.bounds();
            bounds.min_x < 0.0 || bounds.min_y < 0.0 || bounds.max_x > width || bounds.max_y > height
        }) {
            return Err(GridError::NotOnGrid(edge));
        }

        let enclosed: Vec<Location> = self
            .dimension
            .locations()
            .filter(|location| {
                polygon.contains(
                    f64::from(location.column()) + 0.5,
                    f64::from(location.row()) + 0.5,
                )
            })
            .collect();
        for location in enclosed {
            self.mark_solid(location)?;
        }
        for edge in polygon.edges() {
            self.add_wall(edge)?;
        }
        Ok(())
    }

    /// Marks every square of the rectangle solid.
    pub fn mark_solid_area(&mut self, area: &Rectangle) -> Result<(), GridError> {
        for location in area.locations() {
            self.mark_solid(location)?;
        }
        Ok(())
    }

    /// Adds a terrain feature, returning whether it was newly added.
    pub fn add_feature(&mut self, location: Location, feature: MapFeature) -> Result<bool, GridError> {
        Ok(self.square_mut(location)?.features_mut().insert(feature))
    }

    /// Removes a terrain feature, returning whether it was present.
    pub fn remove_feature(
        &mut self,
        location: Location,
        feature: MapFeature,
    ) -> Result<bool, GridError> {
        Ok(self.square_mut(location)?.features_mut().remove(feature))
    }

    /// Paints a square.
    pub fn set_color(&mut self, location: Location, color: SquareColor) -> Result<(), GridError> {
        self.square_mut(location)?.set_color(color);
        Ok(())
    }

    /// Reports whether any square carries the feature.
    #[must_use]
    pub fn has(&self, feature: MapFeature) -> bool {
        self.squares.iter().any(|square| square.has(feature))
    }

    /// Number of squares carrying the feature.
    #[must_use]
    pub fn feature_count(&self, feature: MapFeature) -> usize {
        self.squares
            .iter()
            .filter(|square| square.has(feature))
            .count()
    }

    /// Free-standing wall segments that do not follow grid edges.
    #[must_use]
    pub fn free_walls(&self) -> &[Line] {
        &self.free_walls
    }

    /// Reports whether the creature fits at its location.
    ///
    /// The footprint must lie on the map, contain no solid square, and have no
    /// wall running between two of its own squares.
    #[must_use]
    pub fn can_place_creature(&self, creature: &Creature) -> bool {
        let footprint = creature.footprint();
        if !self.dimension.contains_rect(&footprint) {
            return false;
        }
        footprint.locations().all(|location| {
            let Some(square) = self.get(location) else {
                return false;
            };
            let (column, row) = (location.column(), location.row());
            !(square.is_solid()
                || (column > footprint.left() && square.wall(Direction::West))
                || (column < footprint.right() && square.wall(Direction::East))
                || (row > footprint.bottom() && square.wall(Direction::South))
                || (row < footprint.top() && square.wall(Direction::North)))
        })
    }

    /// Derives the consolidated wall set used for sight.
    ///
    /// Elemental walls always close their square; smoke does so only when
    /// `smoke_blocks_los` is set.
    #[must_use]
    pub fn wall_set(&self, smoke_blocks_los: bool) -> WallSet {
        let mut raw = Vec::new();
        for location in self.dimension.locations() {
            let Some(square) = self.get(location) else {
                continue;
            };
            let cell = Rectangle::single(location);
            let closed = (smoke_blocks_los && square.has(MapFeature::Smoke))
                || square.has(MapFeature::ElementalWall);
            for direction in Direction::ALL {
                if closed || square.wall(direction) {
                    raw.push(cell.edge(direction));
                }
            }
        }
        raw.extend(self.free_walls.iter().copied());
        WallSet::build(self.dimension, raw)
    }

    /// Squares whose interior blocks sight.
    #[must_use]
    pub fn area_blockers(&self) -> BlockerSet {
        BlockerSet::new(
            self.dimension
                .locations()
                .filter(|location| {
                    self.get(*location)
                        .is_some_and(|square| square.has(MapFeature::Forest))
                }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::{CreatureSize, Point};

    fn at(column: u32, row: u32) -> Location {
        Location::new(column, row).expect("valid location")
    }

    fn map(width: u32, height: u32) -> BattleMap {
        BattleMap::new(Dimension::new(width, height).expect("valid dimension"), "test")
    }

    #[test]
    fn double_walls_mark_both_sides() {
        let mut map = map(4, 4);
        map.add_double_wall(at(1, 1), Direction::East).expect("on map");
        assert!(map.get(at(1, 1)).is_some_and(|s| s.wall(Direction::East)));
        assert!(map.get(at(2, 1)).is_some_and(|s| s.wall(Direction::West)));

        map.add_double_wall(at(0, 0), Direction::South).expect("on map");
        assert!(map.get(at(0, 0)).is_some_and(|s| s.wall(Direction::South)));
        assert!(matches!(
            map.add_double_wall(at(4, 0), Direction::North),
            Err(GridError::OutOfBounds(_))
        ));
    }

    #[test]
    fn solid_squares_wall_their_neighbours() {
        let mut map = map(4, 4);
        map.mark_solid(at(1, 1)).expect("on map");
        assert!(map.is_solid(at(1, 1)));
        assert!(!map.is_solid(at(1, 2)));
        assert!(map.get(at(1, 2)).is_some_and(|s| s.wall(Direction::South)));
        assert!(map.get(at(0, 1)).is_some_and(|s| s.wall(Direction::East)));
    }

    #[test]
    fn grid_aligned_walls_become_double_walls() {
        let mut map = map(5, 5);
        let wall = Line::from_coords(1.0, 2.0, 3.0, 2.0).expect("valid line");
        map.add_wall(wall).expect("on map");
        assert!(map.get(at(1, 2)).is_some_and(|s| s.wall(Direction::South)));
        assert!(map.get(at(2, 1)).is_some_and(|s| s.wall(Direction::North)));
        assert!(map.free_walls().is_empty());

        let border = Line::from_coords(5.0, 0.0, 5.0, 1.0).expect("valid line");
        map.add_wall(border).expect("on map");
        assert!(map.get(at(4, 0)).is_some_and(|s| s.wall(Direction::East)));
    }

    #[test]
    fn off_grid_walls_are_kept_free() {
        let mut map = map(5, 5);
        let diagonal = Line::from_coords(1.0, 1.0, 3.0, 3.0).expect("valid line");
        map.add_wall(diagonal).expect("on map");
        assert_eq!(map.free_walls(), &[diagonal]);
        assert!(map.wall_set(false).has_diagonal());

        let outside = Line::from_coords(4.0, 4.0, 6.0, 4.0).expect("valid line");
        assert!(matches!(map.add_wall(outside), Err(GridError::NotOnGrid(_))));
    }

    #[test]
    fn polygons_fill_enclosed_squares() {
        let mut map = map(6, 6);
        let triangle = Polygon::new(vec![
            Point::new(1.0, 1.0),
            Point::new(5.0, 1.0),
            Point::new(1.0, 5.0),
        ])
        .expect("valid polygon");
        map.add_polygon(&triangle).expect("on map");
        assert!(map.is_solid(at(1, 1)));
        assert!(map.is_solid(at(2, 2)));
        assert!(!map.is_solid(at(3, 3)));
        assert!(map
            .free_walls()
            .contains(&Line::from_coords(1.0, 5.0, 5.0, 1.0).expect("valid line")));
    }

    #[test]
    fn placement_rejects_solid_and_internal_walls() {
        let mut map = map(6, 6);
        let large = Creature::new(CreatureSize::Large, at(1, 1));
        assert!(map.can_place_creature(&large));
        assert!(!map.can_place_creature(&Creature::new(CreatureSize::Large, at(5, 5))));

        map.add_double_wall(at(1, 1), Direction::East).expect("on map");
        assert!(!map.can_place_creature(&large));
        assert!(map.can_place_creature(&Creature::new(CreatureSize::Large, at(2, 1))));

        map.mark_solid(at(4, 4)).expect("on map");
        assert!(!map.can_place_creature(&Creature::new(CreatureSize::Medium, at(4, 4))));
        assert!(map.can_place_creature(&Creature::new(CreatureSize::Medium, at(4, 3))));
    }

    #[test]
    fn feature_queries() {
        let mut map = map(4, 4);
        assert!(map.add_feature(at(1, 1), MapFeature::Forest).expect("on map"));
        assert!(map.add_feature(at(2, 3), MapFeature::Forest).expect("on map"));
        assert!(!map.add_feature(at(2, 3), MapFeature::Forest).expect("on map"));
        assert!(map.has(MapFeature::Forest));
        assert!(!map.has(MapFeature::Smoke));
        assert_eq!(map.feature_count(MapFeature::Forest), 2);
        assert_eq!(map.area_blockers().squares(), &[at(1, 1), at(2, 3)]);
        assert!(map.remove_feature(at(1, 1), MapFeature::Forest).expect("on map"));
        assert_eq!(map.area_blockers().len(), 1);
    }
}
