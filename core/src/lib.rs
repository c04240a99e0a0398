#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the skirmish map engines.
//!
//! This crate defines the value types that connect the grid model, the
//! visibility engine, and the movement engine: square addresses
//! ([`Location`]), map extents ([`Dimension`]), creatures and their
//! footprints, terrain vocabulary, and the exact geometry primitives the
//! visibility engine is built on. Map rows are numbered from the bottom edge,
//! so [`Direction::North`] points toward increasing rows.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

mod geometry;
mod region;

pub use geometry::{Bounds, IntersectionResult, Line, Overlap, Point};
pub use region::{Polygon, Rectangle};

/// Largest number of rows a map may contain; rows are labelled `A` to `Z`.
pub const MAX_ROWS: u32 = 26;

/// Largest number of columns a map may contain.
pub const MAX_COLUMNS: u32 = 99;

/// Errors raised when a value violates its construction contract.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CoreError {
    /// The column lies outside the supported range.
    #[error("column out of range: {0}")]
    ColumnOutOfRange(u32),
    /// The row lies outside the supported range.
    #[error("row out of range: {0}")]
    RowOutOfRange(u32),
    /// The requested map extent is empty or too large.
    #[error("invalid map dimension {width}x{height}")]
    InvalidDimension {
        /// Requested number of columns.
        width: u32,
        /// Requested number of rows.
        height: u32,
    },
    /// A segment was requested between two identical points.
    #[error("zero-length line at ({x}; {y})")]
    DegenerateLine {
        /// Horizontal coordinate of the repeated point.
        x: f64,
        /// Vertical coordinate of the repeated point.
        y: f64,
    },
    /// A polygon needs at least three distinct consecutive vertices.
    #[error("polygon needs at least three distinct vertices, got {0}")]
    DegeneratePolygon(usize),
    /// The text does not describe a square.
    #[error("invalid location: {0:?}")]
    InvalidLocation(String),
    /// The text does not describe a rectangle of squares.
    #[error("invalid rectangle: {0:?}")]
    InvalidRectangle(String),
}

/// Address of a single map square expressed as column and row.
///
/// The textual form is the row letter followed by the 1-based column number,
/// so `A1` is the bottom-left square and `C21` is column 20 of row 2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "LocationFields")]
pub struct Location {
    column: u32,
    row: u32,
}

#[derive(Deserialize)]
struct LocationFields {
    column: u32,
    row: u32,
}

impl TryFrom<LocationFields> for Location {
    type Error = CoreError;

    fn try_from(fields: LocationFields) -> Result<Self, Self::Error> {
        Location::new(fields.column, fields.row)
    }
}

impl Location {
    /// Creates a location after checking it against the supported map limits.
    pub fn new(column: u32, row: u32) -> Result<Self, CoreError> {
        if column >= MAX_COLUMNS {
            return Err(CoreError::ColumnOutOfRange(column));
        }
        if row >= MAX_ROWS {
            return Err(CoreError::RowOutOfRange(row));
        }
        Ok(Self { column, row })
    }

    /// Zero-based column index of the square.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the square, counted from the bottom edge.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Square displaced by the provided offsets, if it lies inside `bounds`.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32, bounds: Dimension) -> Option<Location> {
        let column = self.column.checked_add_signed(dx)?;
        let row = self.row.checked_add_signed(dy)?;
        let candidate = Location { column, row };
        bounds.contains(candidate).then_some(candidate)
    }

    /// Square adjacent across the provided edge, if it lies inside `bounds`.
    #[must_use]
    pub fn neighbor(self, direction: Direction, bounds: Dimension) -> Option<Location> {
        let (dx, dy) = direction.offset();
        self.offset(dx, dy, bounds)
    }

    /// Reports whether the squares touch at an edge or a corner.
    ///
    /// A square counts as its own neighbour.
    #[must_use]
    pub fn is_neighbor_of(&self, other: Location) -> bool {
        self.column.abs_diff(other.column) <= 1 && self.row.abs_diff(other.row) <= 1
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = char::from(b'A' + self.row as u8);
        write!(f, "{letter}{}", self.column + 1)
    }
}

impl FromStr for Location {
    type Err = CoreError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidLocation(text.to_owned());
        let mut chars = text.chars();
        let letter = chars.next().ok_or_else(invalid)?.to_ascii_uppercase();
        if !letter.is_ascii_uppercase() {
            return Err(invalid());
        }
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(invalid());
        }
        let number: u32 = digits.parse().map_err(|_| invalid())?;
        let column = number.checked_sub(1).ok_or_else(invalid)?;
        let row = u32::from(letter) - u32::from('A');
        Location::new(column, row).map_err(|_| invalid())
    }
}

/// Extent of a map measured in whole squares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DimensionFields")]
pub struct Dimension {
    width: u32,
    height: u32,
}

#[derive(Deserialize)]
struct DimensionFields {
    width: u32,
    height: u32,
}

impl TryFrom<DimensionFields> for Dimension {
    type Error = CoreError;

    fn try_from(fields: DimensionFields) -> Result<Self, Self::Error> {
        Dimension::new(fields.width, fields.height)
    }
}

impl Dimension {
    /// Creates a map extent within the supported limits.
    pub fn new(width: u32, height: u32) -> Result<Self, CoreError> {
        if width == 0 || height == 0 || width > MAX_COLUMNS || height > MAX_ROWS {
            return Err(CoreError::InvalidDimension { width, height });
        }
        Ok(Self { width, height })
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of squares.
    #[must_use]
    pub const fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Reports whether the square lies on the map.
    #[must_use]
    pub const fn contains(&self, location: Location) -> bool {
        location.column < self.width && location.row < self.height
    }

    /// Reports whether every square of the rectangle lies on the map.
    #[must_use]
    pub fn contains_rect(&self, rect: &Rectangle) -> bool {
        rect.right() < self.width && rect.top() < self.height
    }

    /// Row-major index of the square, if it lies on the map.
    #[must_use]
    pub fn index(&self, location: Location) -> Option<usize> {
        self.contains(location)
            .then(|| location.row as usize * self.width as usize + location.column as usize)
    }

    /// Square stored at the provided row-major index.
    #[must_use]
    pub fn location_at(&self, index: usize) -> Option<Location> {
        (index < self.area()).then(|| Location {
            column: (index % self.width as usize) as u32,
            row: (index / self.width as usize) as u32,
        })
    }

    /// Iterator over every square in row-major order, bottom row first.
    pub fn locations(&self) -> impl Iterator<Item = Location> {
        let Self { width, height } = *self;
        (0..height).flat_map(move |row| (0..width).map(move |column| Location { column, row }))
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Edges of a square, named after the compass with north toward higher rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Edge shared with the square in the next row.
    North,
    /// Edge shared with the square in the next column.
    East,
    /// Edge shared with the square in the previous row.
    South,
    /// Edge shared with the square in the previous column.
    West,
}

impl Direction {
    /// All edges in clockwise order starting at north.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Edge seen from the neighbouring square.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Column and row offsets toward the neighbouring square.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, 1),
            Self::East => (1, 0),
            Self::South => (0, -1),
            Self::West => (-1, 0),
        }
    }

    /// Dense index suitable for per-edge storage.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::North => 0,
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }
}

/// Size categories for creatures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CreatureSize {
    /// Occupies a single square.
    Tiny,
    /// Occupies a single square.
    Small,
    /// Occupies a single square.
    Medium,
    /// Occupies a 2x2 block of squares.
    Large,
    /// Occupies a 3x3 block of squares.
    Huge,
    /// Occupies a 4x4 block of squares.
    Gargantuan,
    /// Occupies a 6x6 block of squares.
    Colossal,
}

impl CreatureSize {
    /// Side length of the creature's footprint in squares.
    #[must_use]
    pub const fn squares(self) -> u32 {
        match self {
            Self::Tiny | Self::Small | Self::Medium => 1,
            Self::Large => 2,
            Self::Huge => 3,
            Self::Gargantuan => 4,
            Self::Colossal => 6,
        }
    }
}

/// A creature placed on the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Creature {
    size: CreatureSize,
    location: Location,
}

impl Creature {
    /// Creates a creature whose lower-left square is `location`.
    #[must_use]
    pub const fn new(size: CreatureSize, location: Location) -> Self {
        Self { size, location }
    }

    /// Size category of the creature.
    #[must_use]
    pub const fn size(&self) -> CreatureSize {
        self.size
    }

    /// Lower-left square occupied by the creature.
    #[must_use]
    pub const fn location(&self) -> Location {
        self.location
    }

    /// Squares covered by the creature.
    #[must_use]
    pub fn footprint(&self) -> Rectangle {
        Rectangle::square(self.location, self.size.squares())
    }

    /// Reports whether the creature covers the provided square.
    #[must_use]
    pub fn occupies(&self, location: Location) -> bool {
        self.footprint().contains(location)
    }

    /// Reports whether the footprints share at least one square.
    #[must_use]
    pub fn overlaps(&self, other: &Creature) -> bool {
        self.footprint().intersects(&other.footprint())
    }
}

/// Terrain features a square may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MapFeature {
    /// Costs extra movement to enter.
    Difficult,
    /// Decorative statue.
    Statue,
    /// Sacred circle.
    SacredCircle,
    /// Summoning circle.
    SummoningCircle,
    /// Spike stones; movement counts them as difficult terrain.
    SpikeStones,
    /// Blood rock.
    BloodRock,
    /// Haunted ground.
    Haunted,
    /// Risky terrain.
    Risky,
    /// Impassable pit.
    Pit,
    /// Impassable lava.
    Lava,
    /// Smoke; blocks sight when smoke blocking is enabled.
    Smoke,
    /// Forest; blocks sight passing through the square's interior.
    Forest,
    /// Elemental wall; always blocks sight like a closed square of walls.
    ElementalWall,
    /// Start area of the first warband.
    StartA,
    /// Start area of the second warband.
    StartB,
    /// Exit of the first warband.
    ExitA,
    /// Exit of the second warband.
    ExitB,
    /// Victory area of the first warband.
    VictoryA,
    /// Victory area of the second warband.
    VictoryB,
}

impl MapFeature {
    /// Every feature in declaration order.
    pub const ALL: [MapFeature; 19] = [
        MapFeature::Difficult,
        MapFeature::Statue,
        MapFeature::SacredCircle,
        MapFeature::SummoningCircle,
        MapFeature::SpikeStones,
        MapFeature::BloodRock,
        MapFeature::Haunted,
        MapFeature::Risky,
        MapFeature::Pit,
        MapFeature::Lava,
        MapFeature::Smoke,
        MapFeature::Forest,
        MapFeature::ElementalWall,
        MapFeature::StartA,
        MapFeature::StartB,
        MapFeature::ExitA,
        MapFeature::ExitB,
        MapFeature::VictoryA,
        MapFeature::VictoryB,
    ];

    const fn bit(self) -> u32 {
        1 << self as u32
    }
}

/// Compact set of terrain features.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FeatureSet(u32);

impl FeatureSet {
    /// Creates an empty feature set.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Adds a feature, returning whether it was newly inserted.
    pub fn insert(&mut self, feature: MapFeature) -> bool {
        let fresh = !self.contains(feature);
        self.0 |= feature.bit();
        fresh
    }

    /// Removes a feature, returning whether it was present.
    pub fn remove(&mut self, feature: MapFeature) -> bool {
        let present = self.contains(feature);
        self.0 &= !feature.bit();
        present
    }

    /// Reports whether the feature is present.
    #[must_use]
    pub const fn contains(&self, feature: MapFeature) -> bool {
        self.0 & feature.bit() != 0
    }

    /// Reports whether no feature is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterator over the present features in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = MapFeature> + '_ {
        MapFeature::ALL
            .into_iter()
            .filter(move |feature| self.contains(*feature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    fn loc(column: u32, row: u32) -> Location {
        Location::new(column, row).expect("valid location")
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn parses_textual_locations() {
        let cases = [
            ("A1", 0, 0),
            ("A2", 1, 0),
            ("B1", 0, 1),
            ("A10", 9, 0),
            ("A21", 20, 0),
            ("C21", 20, 2),
            ("Z34", 33, 25),
        ];
        for (text, column, row) in cases {
            let parsed: Location = text.parse().expect("valid text");
            assert_eq!(parsed, loc(column, row));
            let lower: Location = text.to_lowercase().parse().expect("valid text");
            assert_eq!(lower, loc(column, row));
            assert_eq!(parsed.to_string(), text);
        }
    }

    #[test]
    fn rejects_malformed_locations() {
        for text in ["A0", "A-1", "", "A", "1", "12", "A1x", "A100"] {
            assert!(
                text.parse::<Location>().is_err(),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert_eq!(
            Location::new(MAX_COLUMNS, 0),
            Err(CoreError::ColumnOutOfRange(MAX_COLUMNS))
        );
        assert_eq!(
            Location::new(0, MAX_ROWS),
            Err(CoreError::RowOutOfRange(MAX_ROWS))
        );
        assert!(Dimension::new(0, 4).is_err());
        assert!(Dimension::new(13, 27).is_err());
    }

    #[test]
    fn offsets_stay_inside_bounds() {
        let bounds = Dimension::new(3, 3).expect("valid dimension");
        assert_eq!(loc(0, 0).offset(-1, 0, bounds), None);
        assert_eq!(loc(2, 2).offset(1, 1, bounds), None);
        assert_eq!(loc(1, 1).offset(1, -1, bounds), Some(loc(2, 0)));
        assert_eq!(loc(1, 1).neighbor(Direction::North, bounds), Some(loc(1, 2)));
    }

    #[test]
    fn dimension_indexes_row_major() {
        let bounds = Dimension::new(4, 3).expect("valid dimension");
        assert_eq!(bounds.index(loc(1, 2)), Some(9));
        assert_eq!(bounds.location_at(9), Some(loc(1, 2)));
        assert_eq!(bounds.index(loc(4, 0)), None);
        let all: Vec<_> = bounds.locations().collect();
        assert_eq!(all.len(), 12);
        assert_eq!(all[5], loc(1, 1));
    }

    #[test]
    fn creature_overlap_requires_a_shared_square() {
        let a = Creature::new(CreatureSize::Huge, loc(1, 1));
        let b = Creature::new(CreatureSize::Medium, loc(4, 4));
        assert!(!a.overlaps(&b) && !b.overlaps(&a));

        let b = Creature::new(CreatureSize::Medium, loc(3, 3));
        assert!(a.overlaps(&b) && b.overlaps(&a));

        let b = Creature::new(CreatureSize::Medium, loc(3, 4));
        assert!(!a.overlaps(&b) && !b.overlaps(&a));

        let a = Creature::new(CreatureSize::Huge, loc(1, 2));
        let b = Creature::new(CreatureSize::Medium, loc(1, 1));
        assert!(!a.overlaps(&b) && !b.overlaps(&a));

        let a = Creature::new(CreatureSize::Large, loc(2, 2));
        let b = Creature::new(CreatureSize::Large, loc(1, 3));
        assert!(a.overlaps(&b) && b.overlaps(&a));
    }

    #[test]
    fn footprint_sizes_follow_category() {
        assert_eq!(CreatureSize::Small.squares(), 1);
        assert_eq!(CreatureSize::Large.squares(), 2);
        assert_eq!(CreatureSize::Colossal.squares(), 6);
        let huge = Creature::new(CreatureSize::Huge, loc(2, 5));
        assert!(huge.occupies(loc(4, 7)));
        assert!(!huge.occupies(loc(5, 7)));
    }

    #[test]
    fn feature_set_tracks_membership() {
        let mut set = FeatureSet::new();
        assert!(set.insert(MapFeature::Forest));
        assert!(!set.insert(MapFeature::Forest));
        assert!(set.insert(MapFeature::Pit));
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![MapFeature::Pit, MapFeature::Forest]
        );
        assert!(set.remove(MapFeature::Pit));
        assert!(!set.contains(MapFeature::Pit));
        assert!(!set.is_empty());
    }

    #[test]
    fn value_types_round_trip_through_bincode() {
        assert_round_trip(&loc(7, 3));
        assert_round_trip(&Dimension::new(13, 12).expect("valid dimension"));
        assert_round_trip(&CreatureSize::Huge);
        assert_round_trip(&MapFeature::ElementalWall);
    }

    #[test]
    fn deserialization_checks_map_limits() {
        let bytes = bincode::serialize(&(0_u32, 26_u32)).expect("serialize");
        assert!(bincode::deserialize::<Location>(&bytes).is_err());
        let bytes = bincode::serialize(&(99_u32, 0_u32)).expect("serialize");
        assert!(bincode::deserialize::<Location>(&bytes).is_err());
        let bytes = bincode::serialize(&(98_u32, 25_u32)).expect("serialize");
        let corner: Location = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(corner.to_string(), "Z99");

        let bytes = bincode::serialize(&(0_u32, 12_u32)).expect("serialize");
        assert!(bincode::deserialize::<Dimension>(&bytes).is_err());
        let bytes = bincode::serialize(&(13_u32, 27_u32)).expect("serialize");
        assert!(bincode::deserialize::<Dimension>(&bytes).is_err());
    }
}
