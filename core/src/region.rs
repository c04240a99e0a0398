//! Areas of the map: rectangles of whole squares and free-form polygons.

use std::{fmt, str::FromStr};

use crate::{Bounds, CoreError, Direction, Line, Location, Point};

/// Closed block of squares between two corner squares, inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rectangle {
    left: u32,
    bottom: u32,
    right: u32,
    top: u32,
}

impl Rectangle {
    /// Creates the rectangle spanned by two squares given in any order.
    #[must_use]
    pub fn new(a: Location, b: Location) -> Self {
        Self {
            left: a.column().min(b.column()),
            bottom: a.row().min(b.row()),
            right: a.column().max(b.column()),
            top: a.row().max(b.row()),
        }
    }

    /// Square block of `size` squares per side whose lower-left square is `origin`.
    #[must_use]
    pub fn square(origin: Location, size: u32) -> Self {
        let extent = size.max(1) - 1;
        Self {
            left: origin.column(),
            bottom: origin.row(),
            right: origin.column() + extent,
            top: origin.row() + extent,
        }
    }

    /// Rectangle covering exactly one square.
    #[must_use]
    pub fn single(location: Location) -> Self {
        Self::new(location, location)
    }

    /// Leftmost column.
    #[must_use]
    pub const fn left(&self) -> u32 {
        self.left
    }

    /// Lowest row.
    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.bottom
    }

    /// Rightmost column, inclusive.
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.right
    }

    /// Highest row, inclusive.
    #[must_use]
    pub const fn top(&self) -> u32 {
        self.top
    }

    /// Number of columns covered.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.right - self.left + 1
    }

    /// Number of rows covered.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.top - self.bottom + 1
    }

    /// Lower-left square of the rectangle.
    #[must_use]
    pub const fn bottom_left(&self) -> Location {
        self.corner(self.left, self.bottom)
    }

    /// Upper-right square of the rectangle.
    #[must_use]
    pub const fn top_right(&self) -> Location {
        self.corner(self.right, self.top)
    }

    const fn corner(&self, column: u32, row: u32) -> Location {
        Location { column, row }
    }

    /// Reports whether the square lies inside the rectangle.
    #[must_use]
    pub const fn contains(&self, location: Location) -> bool {
        location.column() >= self.left
            && location.column() <= self.right
            && location.row() >= self.bottom
            && location.row() <= self.top
    }

    /// Reports whether the point lies inside or on the boundary of the covered area.
    #[must_use]
    pub fn contains_point(&self, point: Point) -> bool {
        point.x() >= f64::from(self.left)
            && point.x() <= f64::from(self.right + 1)
            && point.y() >= f64::from(self.bottom)
            && point.y() <= f64::from(self.top + 1)
    }

    /// Reports whether the rectangles share at least one square.
    #[must_use]
    pub const fn intersects(&self, other: &Rectangle) -> bool {
        self.left <= other.right
            && other.left <= self.right
            && self.bottom <= other.top
            && other.bottom <= self.top
    }

    /// Covered area in map coordinates, grown by `margin` on every side.
    #[must_use]
    pub fn bounds(&self, margin: f64) -> Bounds {
        Bounds {
            min_x: f64::from(self.left) - margin,
            min_y: f64::from(self.bottom) - margin,
            max_x: f64::from(self.right + 1) + margin,
            max_y: f64::from(self.top + 1) + margin,
        }
    }

    /// Boundary segment of the covered area on the provided side.
    #[must_use]
    pub fn edge(&self, direction: Direction) -> Line {
        let left = f64::from(self.left);
        let bottom = f64::from(self.bottom);
        let right = f64::from(self.right + 1);
        let top = f64::from(self.top + 1);
        let (a, b) = match direction {
            Direction::North => (Point::new(left, top), Point::new(right, top)),
            Direction::East => (Point::new(right, bottom), Point::new(right, top)),
            Direction::South => (Point::new(left, bottom), Point::new(right, bottom)),
            Direction::West => (Point::new(left, bottom), Point::new(left, top)),
        };
        Line::ordered(a, b)
    }

    /// Iterator over the covered squares in row-major order, bottom row first.
    pub fn locations(&self) -> impl Iterator<Item = Location> {
        let Self {
            left,
            bottom,
            right,
            top,
        } = *self;
        (bottom..=top).flat_map(move |row| {
            (left..=right).map(move |column| Location { column, row })
        })
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.left == self.right && self.bottom == self.top {
            write!(f, "{}", self.bottom_left())
        } else {
            write!(f, "{}-{}", self.bottom_left(), self.top_right())
        }
    }
}

impl FromStr for Rectangle {
    type Err = CoreError;

    /// Parses `A1` or `A1-C3`.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = |_| CoreError::InvalidRectangle(text.to_owned());
        match text.split_once('-') {
            Some((from, to)) => Ok(Self::new(
                from.trim().parse().map_err(invalid)?,
                to.trim().parse().map_err(invalid)?,
            )),
            None => Ok(Self::single(text.trim().parse().map_err(invalid)?)),
        }
    }
}

/// Closed polygon given by its vertices in drawing order.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    vertices: Vec<Point>,
}

impl Polygon {
    /// Creates a polygon, rejecting fewer than three vertices or repeated
    /// consecutive vertices.
    pub fn new(vertices: Vec<Point>) -> Result<Self, CoreError> {
        if vertices.len() < 3 {
            return Err(CoreError::DegeneratePolygon(vertices.len()));
        }
        for (index, vertex) in vertices.iter().enumerate() {
            let next = vertices[(index + 1) % vertices.len()];
            if *vertex == next {
                return Err(CoreError::DegenerateLine {
                    x: vertex.x(),
                    y: vertex.y(),
                });
            }
        }
        Ok(Self { vertices })
    }

    /// Vertices in drawing order.
    #[must_use]
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Boundary segments, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = Line> + '_ {
        let count = self.vertices.len();
        (0..count).map(move |index| {
            Line::ordered(self.vertices[index], self.vertices[(index + 1) % count])
        })
    }

    /// Even-odd containment test for the point `(x, y)`.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let count = self.vertices.len();
        let mut inside = false;
        let mut previous = count - 1;
        for current in 0..count {
            let (a, b) = (self.vertices[current], self.vertices[previous]);
            if (a.y() > y) != (b.y() > y)
                && x < (b.x() - a.x()) * (y - a.y()) / (b.y() - a.y()) + a.x()
            {
                inside = !inside;
            }
            previous = current;
        }
        inside
    }
}

impl From<Rectangle> for Polygon {
    fn from(rect: Rectangle) -> Self {
        let left = f64::from(rect.left);
        let bottom = f64::from(rect.bottom);
        let right = f64::from(rect.right + 1);
        let top = f64::from(rect.top + 1);
        Self {
            vertices: vec![
                Point::new(left, bottom),
                Point::new(right, bottom),
                Point::new(right, top),
                Point::new(left, top),
            ],
        }
    }
}
