use skirmish_core::{Direction, FeatureSet, MapFeature};

/// Display color of a map square.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SquareColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl SquareColor {
    /// Plain white, the color of unpainted squares.
    pub const WHITE: SquareColor = SquareColor::new(0xff, 0xff, 0xff);

    /// Creates a color from its channels.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red channel.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green channel.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue channel.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

impl Default for SquareColor {
    fn default() -> Self {
        Self::WHITE
    }
}

/// State of a single grid cell.
///
/// A square whose four edges are all walled is solid rock.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MapSquare {
    features: FeatureSet,
    walls: [bool; 4],
    color: SquareColor,
}

impl MapSquare {
    /// Terrain features present on the square.
    #[must_use]
    pub const fn features(&self) -> FeatureSet {
        self.features
    }

    /// Reports whether the square carries the feature.
    #[must_use]
    pub const fn has(&self, feature: MapFeature) -> bool {
        self.features.contains(feature)
    }

    /// Reports whether the edge on the given side is walled.
    #[must_use]
    pub const fn wall(&self, direction: Direction) -> bool {
        self.walls[direction.index()]
    }

    /// Reports whether the square is solid rock.
    #[must_use]
    pub fn is_solid(&self) -> bool {
        self.walls.iter().all(|wall| *wall)
    }

    /// Reports whether movement may not enter the square at all.
    #[must_use]
    pub const fn is_impassable(&self) -> bool {
        self.has(MapFeature::Pit) || self.has(MapFeature::Lava)
    }

    /// Reports whether entering the square costs extra movement.
    #[must_use]
    pub const fn is_difficult(&self) -> bool {
        self.has(MapFeature::Difficult) || self.has(MapFeature::SpikeStones)
    }

    /// Display color of the square.
    #[must_use]
    pub const fn color(&self) -> SquareColor {
        self.color
    }

    pub(crate) fn set_wall(&mut self, direction: Direction) {
        self.walls[direction.index()] = true;
    }

    pub(crate) fn features_mut(&mut self) -> &mut FeatureSet {
        &mut self.features
    }

    pub(crate) fn set_color(&mut self, color: SquareColor) {
        self.color = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_requires_all_four_walls() {
        let mut square = MapSquare::default();
        assert!(!square.wall(Direction::North));
        for direction in [Direction::North, Direction::East, Direction::South] {
            square.set_wall(direction);
        }
        assert!(square.wall(Direction::North));
        assert!(!square.wall(Direction::West));
        assert!(!square.is_solid());
        square.set_wall(Direction::West);
        assert!(square.is_solid());
    }

    #[test]
    fn terrain_classification() {
        let mut square = MapSquare::default();
        let _ = square.features_mut().insert(MapFeature::SpikeStones);
        assert!(square.is_difficult());
        assert!(!square.is_impassable());
        let _ = square.features_mut().insert(MapFeature::Lava);
        assert!(square.is_impassable());
        assert_eq!(square.color(), SquareColor::WHITE);
    }
}
