use parking_lot::Mutex;
use skirmish_core::{Dimension, Location};

const WORD_BITS: usize = u64::BITS as usize;

/// Bitmap of squares found visible, one bit per square in row-major order.
///
/// Workers set bits concurrently; every access takes the internal lock.
#[derive(Debug)]
pub struct LosMap {
    dimension: Dimension,
    bits: Mutex<Vec<u64>>,
}

impl LosMap {
    /// Creates a map with no visible square.
    #[must_use]
    pub fn new(dimension: Dimension) -> Self {
        Self {
            dimension,
            bits: Mutex::new(vec![0; dimension.area().div_ceil(WORD_BITS)]),
        }
    }

    /// Extent of the covered map.
    #[must_use]
    pub const fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Reports whether the square is visible. Squares off the map never are.
    #[must_use]
    pub fn get(&self, location: Location) -> bool {
        self.dimension.index(location).is_some_and(|index| {
            self.bits.lock()[index / WORD_BITS] & (1_u64 << (index % WORD_BITS)) != 0
        })
    }

    /// Marks the square visible, returning whether it was newly marked.
    pub fn set(&self, location: Location) -> bool {
        let Some(index) = self.dimension.index(location) else {
            return false;
        };
        let mask = 1_u64 << (index % WORD_BITS);
        let mut bits = self.bits.lock();
        let word = &mut bits[index / WORD_BITS];
        let fresh = *word & mask == 0;
        *word |= mask;
        fresh
    }

    /// Forgets every visible square.
    pub fn clear(&self) {
        self.bits.lock().iter_mut().for_each(|word| *word = 0);
    }

    /// Number of visible squares.
    #[must_use]
    pub fn count(&self) -> usize {
        self.bits
            .lock()
            .iter()
            .map(|word| word.count_ones() as usize)
            .sum()
    }

    /// Visible squares in row-major order.
    #[must_use]
    pub fn visible(&self) -> Vec<Location> {
        self.dimension
            .locations()
            .filter(|location| self.get(*location))
            .collect()
    }

    /// Independent copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> LosMap {
        LosMap {
            dimension: self.dimension,
            bits: Mutex::new(self.bits.lock().clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(column: u32, row: u32) -> Location {
        Location::new(column, row).expect("valid location")
    }

    #[test]
    fn bits_span_word_boundaries() {
        let map = LosMap::new(Dimension::new(13, 12).expect("valid dimension"));
        assert!(map.set(at(12, 4)));
        assert!(!map.set(at(12, 4)));
        assert!(map.set(at(0, 5)));
        assert!(map.set(at(12, 11)));
        assert!(map.get(at(0, 5)));
        assert!(!map.get(at(1, 5)));
        assert!(!map.set(at(13, 0)));
        assert_eq!(map.count(), 3);
        assert_eq!(map.visible(), vec![at(12, 4), at(0, 5), at(12, 11)]);
    }

    #[test]
    fn snapshot_is_detached() {
        let map = LosMap::new(Dimension::new(4, 4).expect("valid dimension"));
        let _ = map.set(at(1, 1));
        let copy = map.snapshot();
        map.clear();
        assert_eq!(map.count(), 0);
        assert!(copy.get(at(1, 1)));
    }
}
