//! Exact two-dimensional segment algebra used by the visibility engine.
//!
//! Grid corners sit on integral coordinates: square `(column, row)` spans
//! `[column, column + 1] x [row, row + 1]`, with row 0 at the bottom of the map.
//! All coordinates are non-negative and never NaN, which allows points to be
//! totally ordered and stored in ordered collections.

use std::{cmp::Ordering, fmt};

use crate::{CoreError, Location};

/// Map position with floating-point coordinates.
#[derive(Clone, Copy, Debug)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    /// Creates a new point. Negative zero is normalised to positive zero.
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: x + 0.0,
            y: y + 0.0,
        }
    }

    /// Horizontal coordinate of the point.
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.x
    }

    /// Vertical coordinate of the point.
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.y
    }

    /// Lower-left corner of the provided square.
    #[must_use]
    pub fn corner_of(location: Location) -> Self {
        Self::new(f64::from(location.column()), f64::from(location.row()))
    }

    /// Center of the provided square.
    #[must_use]
    pub fn center_of(location: Location) -> Self {
        Self::new(
            f64::from(location.column()) + 0.5,
            f64::from(location.row()) + 0.5,
        )
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Point {}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}; {})", self.x, self.y)
    }
}

/// Line segment whose start point always precedes its end point.
///
/// Keeping the endpoints ordered makes equality, merging and ordered storage
/// independent of the direction in which a segment was authored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Line {
    start: Point,
    end: Point,
}

impl Line {
    /// Creates a segment between two distinct points.
    pub fn new(a: Point, b: Point) -> Result<Self, CoreError> {
        match a.cmp(&b) {
            Ordering::Less => Ok(Self { start: a, end: b }),
            Ordering::Greater => Ok(Self { start: b, end: a }),
            Ordering::Equal => Err(CoreError::DegenerateLine { x: a.x, y: a.y }),
        }
    }

    /// Creates a segment from a raw coordinate quadruple.
    pub fn from_coords(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self, CoreError> {
        Self::new(Point::new(x1, y1), Point::new(x2, y2))
    }

    /// Builds a segment from points the caller already knows to be distinct.
    pub(crate) fn ordered(a: Point, b: Point) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// Lexicographically smaller endpoint.
    #[must_use]
    pub const fn start(&self) -> Point {
        self.start
    }

    /// Lexicographically larger endpoint.
    #[must_use]
    pub const fn end(&self) -> Point {
        self.end
    }

    /// Reports whether both endpoints share a vertical coordinate.
    #[must_use]
    pub fn is_horizontal(&self) -> bool {
        self.start.y == self.end.y
    }

    /// Reports whether both endpoints share a horizontal coordinate.
    #[must_use]
    pub fn is_vertical(&self) -> bool {
        self.start.x == self.end.x
    }

    /// Reports whether the segment is neither horizontal nor vertical.
    #[must_use]
    pub fn is_diagonal(&self) -> bool {
        !self.is_horizontal() && !self.is_vertical()
    }

    /// Smallest axis-aligned box enclosing the segment.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds {
            min_x: self.start.x.min(self.end.x),
            min_y: self.start.y.min(self.end.y),
            max_x: self.start.x.max(self.end.x),
            max_y: self.start.y.max(self.end.y),
        }
    }

    /// Classifies how this segment relates to `other`.
    ///
    /// The classification is symmetric: `a.intersects(&b) == b.intersects(&a)`
    /// holds as a value, including the computed intersection point.
    #[must_use]
    pub fn intersects(&self, other: &Line) -> IntersectionResult {
        let (a, b) = canonical_pair(Segment::from_line(self), Segment::from_line(other));
        match classify(&a, &b) {
            Relation::Parallel => IntersectionResult::Parallel,
            Relation::Collinear => match collinear_overlap(&a, &b) {
                None => IntersectionResult::OutsideCoincident,
                Some((low, high)) if low == high => {
                    IntersectionResult::Coincident(Overlap::Point(low))
                }
                Some((low, high)) => {
                    IntersectionResult::Coincident(Overlap::Segment(Line::ordered(low, high)))
                }
            },
            Relation::Crossing {
                num_a,
                denom,
                within,
            } => {
                let ua = num_a / denom;
                let point = Point::new(a.x1 + ua * (a.x2 - a.x1), a.y1 + ua * (a.y2 - a.y1));
                if within {
                    IntersectionResult::Intersection(point)
                } else {
                    IntersectionResult::OutsideIntersection(point)
                }
            }
        }
    }

    /// Reports whether the segment `(x1, y1)-(x2, y2)` crosses, touches or
    /// overlaps this segment.
    ///
    /// Agrees with `is_intersection() || is_coincident()` on the full
    /// [`IntersectionResult`] but never materialises points or lines.
    #[must_use]
    pub fn intersects_or_touches(&self, x1: f64, y1: f64, x2: f64, y2: f64) -> bool {
        let (a, b) = canonical_pair(Segment::from_line(self), Segment::from_coords(x1, y1, x2, y2));
        match classify(&a, &b) {
            Relation::Parallel => false,
            Relation::Collinear => collinear_overlap(&a, &b).is_some(),
            Relation::Crossing { within, .. } => within,
        }
    }

    /// Combines two collinear segments that touch or overlap into one.
    ///
    /// Returns `None` when the segments are not collinear or leave a gap.
    #[must_use]
    pub fn extend(&self, other: &Line) -> Option<Line> {
        if !self.is_collinear_with(other) {
            return None;
        }
        if other.start > self.end || self.start > other.end {
            return None;
        }
        Some(Line {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        })
    }

    /// Reports whether `other` lies entirely on this segment.
    #[must_use]
    pub fn contains(&self, other: &Line) -> bool {
        self.is_collinear_with(other) && self.start <= other.start && other.end <= self.end
    }

    /// Reports whether `point` lies on this segment, endpoints included.
    #[must_use]
    pub fn contains_point(&self, point: Point) -> bool {
        self.cross(point) == 0.0 && self.start <= point && point <= self.end
    }

    /// Splits the segment at an interior point.
    #[must_use]
    pub fn split_at(&self, point: Point) -> Option<(Line, Line)> {
        if point == self.start || point == self.end || !self.contains_point(point) {
            return None;
        }
        Some((
            Line {
                start: self.start,
                end: point,
            },
            Line {
                start: point,
                end: self.end,
            },
        ))
    }

    fn is_collinear_with(&self, other: &Line) -> bool {
        self.cross(other.start) == 0.0 && self.cross(other.end) == 0.0
    }

    fn cross(&self, point: Point) -> f64 {
        (self.end.x - self.start.x) * (point.y - self.start.y)
            - (self.end.y - self.start.y) * (point.x - self.start.x)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Region shared by two collinear segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Overlap {
    /// The segments touch end to end at a single point.
    Point(Point),
    /// The segments share a sub-segment of positive length.
    Segment(Line),
}

/// Outcome of the exact segment intersection test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntersectionResult {
    /// The segments cross or touch at a point lying on both.
    Intersection(Point),
    /// The carrier lines cross at a point outside at least one segment.
    OutsideIntersection(Point),
    /// The segments are parallel and not collinear.
    Parallel,
    /// The segments are collinear and share the provided region.
    Coincident(Overlap),
    /// The segments are collinear but disjoint.
    OutsideCoincident,
}

impl IntersectionResult {
    /// Reports whether the segments meet at a single point lying on both.
    #[must_use]
    pub const fn is_intersection(&self) -> bool {
        matches!(self, Self::Intersection(_))
    }

    /// Reports whether only the carrier lines meet.
    #[must_use]
    pub const fn is_outside_intersection(&self) -> bool {
        matches!(self, Self::OutsideIntersection(_))
    }

    /// Reports whether the segments are parallel and apart.
    #[must_use]
    pub const fn is_parallel(&self) -> bool {
        matches!(self, Self::Parallel)
    }

    /// Reports whether the segments are collinear and share at least one point.
    #[must_use]
    pub const fn is_coincident(&self) -> bool {
        matches!(self, Self::Coincident(_))
    }

    /// Reports whether the segments are collinear without touching.
    #[must_use]
    pub const fn is_outside_coincident(&self) -> bool {
        matches!(self, Self::OutsideCoincident)
    }

    /// Crossing point of the carrier lines, when they cross.
    #[must_use]
    pub const fn point(&self) -> Option<Point> {
        match self {
            Self::Intersection(point) | Self::OutsideIntersection(point) => Some(*point),
            Self::Coincident(Overlap::Point(point)) => Some(*point),
            _ => None,
        }
    }
}

/// Axis-aligned box in map coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// Smallest horizontal coordinate.
    pub min_x: f64,
    /// Smallest vertical coordinate.
    pub min_y: f64,
    /// Largest horizontal coordinate.
    pub max_x: f64,
    /// Largest vertical coordinate.
    pub max_y: f64,
}

impl Bounds {
    /// Reports whether the segment has any part strictly inside the box's
    /// horizontal and vertical extent.
    ///
    /// Segments that only run along or outside the box boundary are rejected.
    #[must_use]
    pub fn admits(&self, line: &Line) -> bool {
        let (start, end) = (line.start(), line.end());
        !((start.x <= self.min_x && end.x <= self.min_x)
            || (start.x >= self.max_x && end.x >= self.max_x)
            || (start.y <= self.min_y && end.y <= self.min_y)
            || (start.y >= self.max_y && end.y >= self.max_y))
    }
}

#[derive(Clone, Copy)]
struct Segment {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

impl Segment {
    fn from_line(line: &Line) -> Self {
        Self {
            x1: line.start.x,
            y1: line.start.y,
            x2: line.end.x,
            y2: line.end.y,
        }
    }

    fn from_coords(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        if compare(x1, y1, x2, y2) == Ordering::Greater {
            Self {
                x1: x2,
                y1: y2,
                x2: x1,
                y2: y1,
            }
        } else {
            Self { x1, y1, x2, y2 }
        }
    }

    fn order(&self, other: &Segment) -> Ordering {
        compare(self.x1, self.y1, other.x1, other.y1)
            .then_with(|| compare(self.x2, self.y2, other.x2, other.y2))
    }
}

enum Relation {
    Parallel,
    Collinear,
    Crossing { num_a: f64, denom: f64, within: bool },
}

fn compare(x1: f64, y1: f64, x2: f64, y2: f64) -> Ordering {
    x1.total_cmp(&x2).then_with(|| y1.total_cmp(&y2))
}

fn canonical_pair(a: Segment, b: Segment) -> (Segment, Segment) {
    if a.order(&b) == Ordering::Greater {
        (b, a)
    } else {
        (a, b)
    }
}

fn classify(a: &Segment, b: &Segment) -> Relation {
    let denom = (b.y2 - b.y1) * (a.x2 - a.x1) - (b.x2 - b.x1) * (a.y2 - a.y1);
    let d1 = a.y1 - b.y1;
    let d2 = a.x1 - b.x1;
    let num_a = (b.x2 - b.x1) * d1 - (b.y2 - b.y1) * d2;
    let num_b = (a.x2 - a.x1) * d1 - (a.y2 - a.y1) * d2;

    if denom == 0.0 {
        if num_a == 0.0 && num_b == 0.0 {
            Relation::Collinear
        } else {
            Relation::Parallel
        }
    } else {
        Relation::Crossing {
            num_a,
            denom,
            within: within_unit(num_a, denom) && within_unit(num_b, denom),
        }
    }
}

/// Tests `0 <= num / denom <= 1` without dividing.
fn within_unit(num: f64, denom: f64) -> bool {
    if denom > 0.0 {
        num >= 0.0 && num <= denom
    } else {
        num <= 0.0 && num >= denom
    }
}

/// Shared stretch of two collinear segments, ordered along the carrier line.
///
/// Along a common line the lexicographic point order matches the order of
/// positions on the line, so the overlap is bounded by the later start and
/// the earlier end.
fn collinear_overlap(a: &Segment, b: &Segment) -> Option<(Point, Point)> {
    let low = Point::new(a.x1, a.y1).max(Point::new(b.x1, b.y1));
    let high = Point::new(a.x2, a.y2).min(Point::new(b.x2, b.y2));
    (low <= high).then_some((low, high))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Line {
        Line::from_coords(x1, y1, x2, y2).expect("valid line")
    }

    #[test]
    fn endpoints_are_stored_in_order() {
        let forward = line(5.0, 1.0, 1.0, 1.0);
        assert_eq!(forward.start(), Point::new(1.0, 1.0));
        assert_eq!(forward.end(), Point::new(5.0, 1.0));
        assert_eq!(forward, line(1.0, 1.0, 5.0, 1.0));
    }

    #[test]
    fn zero_length_segments_are_rejected() {
        assert!(matches!(
            Line::from_coords(2.0, 2.0, 2.0, 2.0),
            Err(CoreError::DegenerateLine { .. })
        ));
    }

    #[test]
    fn classifies_reference_cases() {
        let g1 = line(1.0, 1.0, 5.0, 1.0);
        let g2 = line(1.0, 2.0, 5.0, 2.0);
        let g3 = line(2.0, 0.0, 2.0, 5.0);

        assert!(g1.intersects(&g2).is_parallel());
        assert_eq!(
            g1.intersects(&g3),
            IntersectionResult::Intersection(Point::new(2.0, 1.0))
        );
        assert_eq!(
            g1.intersects(&line(2.0, 1.0, 2.5, 1.0)),
            IntersectionResult::Coincident(Overlap::Segment(line(2.0, 1.0, 2.5, 1.0)))
        );
        assert_eq!(
            g1.intersects(&line(1.0, 1.0, 2.0, 2.0)),
            IntersectionResult::Intersection(Point::new(1.0, 1.0))
        );
        assert_eq!(
            g1.intersects(&line(2.0, 2.0, 2.0, 3.0)),
            IntersectionResult::OutsideIntersection(Point::new(2.0, 1.0))
        );
    }

    #[test]
    fn collinear_segments_touching_end_to_end_meet_at_a_point() {
        let a = line(1.0, 1.0, 5.0, 1.0);
        let b = line(5.0, 1.0, 7.0, 1.0);
        assert_eq!(
            a.intersects(&b),
            IntersectionResult::Coincident(Overlap::Point(Point::new(5.0, 1.0)))
        );
    }

    #[test]
    fn collinear_disjoint_segments_are_outside_coincident() {
        let a = line(1.0, 1.0, 3.0, 3.0);
        let b = line(4.0, 4.0, 6.0, 6.0);
        assert!(a.intersects(&b).is_outside_coincident());
        assert!(!a.intersects_or_touches(4.0, 4.0, 6.0, 6.0));
    }

    #[test]
    fn intersection_is_symmetric_as_a_value() {
        let lines = [
            line(1.0, 1.0, 5.0, 1.0),
            line(2.0, 0.0, 2.0, 5.0),
            line(0.0, 0.0, 3.0, 7.0),
            line(1.5, 3.25, 6.0, 0.5),
            line(5.0, 1.0, 7.0, 1.0),
            line(0.0, 3.0, 3.0, 0.0),
            line(2.0, 1.0, 2.5, 1.0),
            line(4.0, 4.0, 6.0, 6.0),
        ];
        for a in &lines {
            for b in &lines {
                assert_eq!(a.intersects(b), b.intersects(a), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn fast_test_agrees_with_full_classification() {
        let lines = [
            line(1.0, 1.0, 5.0, 1.0),
            line(2.0, 0.0, 2.0, 5.0),
            line(0.0, 0.0, 3.0, 7.0),
            line(1.5, 3.25, 6.0, 0.5),
            line(5.0, 1.0, 7.0, 1.0),
            line(0.0, 3.0, 3.0, 0.0),
            line(3.0, 0.0, 3.0, 1.0),
            line(8.0, 1.0, 9.0, 1.0),
        ];
        for a in &lines {
            for b in &lines {
                let full = a.intersects(b);
                let expected = full.is_intersection() || full.is_coincident();
                let (s, e) = (b.start(), b.end());
                assert_eq!(a.intersects_or_touches(s.x(), s.y(), e.x(), e.y()), expected);
                assert_eq!(a.intersects_or_touches(e.x(), e.y(), s.x(), s.y()), expected);
            }
        }
    }

    #[test]
    fn extending_touching_segments_and_splitting_restores_them() {
        let a = line(1.0, 1.0, 5.0, 1.0);
        let b = line(5.0, 1.0, 7.0, 1.0);
        let merged = a.extend(&b).expect("collinear touching segments merge");
        assert_eq!(merged, line(1.0, 1.0, 7.0, 1.0));
        assert_eq!(b.extend(&a), Some(merged));
        assert_eq!(merged.split_at(Point::new(5.0, 1.0)), Some((a, b)));
    }

    #[test]
    fn extend_merges_overlap_and_rejects_gaps() {
        let a = line(0.0, 0.0, 2.0, 2.0);
        assert_eq!(
            a.extend(&line(1.0, 1.0, 3.0, 3.0)),
            Some(line(0.0, 0.0, 3.0, 3.0))
        );
        assert_eq!(a.extend(&line(2.5, 2.5, 3.0, 3.0)), None);
        assert_eq!(a.extend(&line(2.0, 2.0, 3.0, 2.0)), None);
    }

    #[test]
    fn containment_requires_collinearity() {
        let wall = line(0.0, 3.0, 6.0, 3.0);
        assert!(wall.contains(&line(2.0, 3.0, 3.0, 3.0)));
        assert!(!wall.contains(&line(2.0, 3.0, 7.0, 3.0)));
        assert!(!wall.contains(&line(2.0, 3.0, 3.0, 4.0)));
        assert!(wall.contains_point(Point::new(6.0, 3.0)));
        assert_eq!(wall.split_at(Point::new(6.0, 3.0)), None);
    }

    #[test]
    fn orientation_queries() {
        assert!(line(1.0, 3.0, 5.0, 3.0).is_horizontal());
        assert!(line(1.0, 3.0, 1.0, 8.0).is_vertical());
        assert!(line(1.0, 3.0, 5.0, 4.0).is_diagonal());
        assert!(!line(1.0, 3.0, 1.0, 8.0).is_horizontal());
    }

    #[test]
    fn bounds_reject_segments_on_the_boundary() {
        let bounds = Bounds {
            min_x: 1.0,
            min_y: 1.0,
            max_x: 4.0,
            max_y: 4.0,
        };
        assert!(bounds.admits(&line(0.0, 2.0, 5.0, 2.0)));
        assert!(!bounds.admits(&line(1.0, 0.0, 1.0, 5.0)));
        assert!(!bounds.admits(&line(5.0, 0.0, 6.0, 6.0)));
    }
}
