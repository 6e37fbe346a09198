use std::cmp::{max, min};
use std::fmt;

use crate::orientation::AxisDirection;

/// A directed, half-open integer range
///
/// `start` is the first position covered and `end` is one step past the last position, moving
/// in the direction of the range. An increasing range `(100,140)` covers positions 100..=139, and
/// a decreasing range `(140,100)` covers positions 140 down to 101.
///
/// A range with `start == end` is not valid. Empty results are expressed with `Option` instead.
///
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct OrientedRange {
    pub start: i64,
    pub end: i64,
}

impl OrientedRange {
    pub fn new(start: i64, end: i64) -> Self {
        assert_ne!(start, end, "Empty oriented range at position {start}");
        Self { start, end }
    }

    /// Convert from a range in the direction-transformed coordinate space
    ///
    /// In the transformed space every range increases, so `start < end` is required.
    ///
    pub fn from_canonical(dir: AxisDirection, start: i64, end: i64) -> Self {
        assert!(start < end, "Invalid canonical range [{start},{end})");
        Self::new(dir.apply(start), dir.apply(end))
    }

    pub fn direction(&self) -> AxisDirection {
        if self.start < self.end {
            AxisDirection::Up
        } else {
            AxisDirection::Down
        }
    }

    /// Range bounds in the transformed coordinate space for `dir`, where the range increases
    ///
    pub fn to_canonical(&self, dir: AxisDirection) -> (i64, i64) {
        debug_assert_eq!(self.direction(), dir);
        (dir.apply(self.start), dir.apply(self.end))
    }

    /// Lowest position covered by the range
    pub fn min_pos(&self) -> i64 {
        match self.direction() {
            AxisDirection::Up => self.start,
            AxisDirection::Down => self.end + 1,
        }
    }

    /// Highest position covered by the range
    pub fn max_pos(&self) -> i64 {
        match self.direction() {
            AxisDirection::Up => self.end - 1,
            AxisDirection::Down => self.start,
        }
    }

    pub fn contains(&self, pos: i64) -> bool {
        pos >= self.min_pos() && pos <= self.max_pos()
    }
}

impl fmt::Debug for OrientedRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.direction() {
            AxisDirection::Up => write!(f, "[{}->{})", self.start, self.end),
            AxisDirection::Down => write!(f, "[{}<-{})", self.start, self.end),
        }
    }
}

/// Return true if two ranges with direction `dir` share at least one position
///
/// Adjacency does not count as overlap.
///
pub fn ranges_overlap(dir: AxisDirection, a: &OrientedRange, b: &OrientedRange) -> bool {
    let (a0, a1) = a.to_canonical(dir);
    let (b0, b1) = b.to_canonical(dir);
    a0 < a1 && b0 < b1 && b0 < a1 && a0 < b1
}

/// Intersection of two ranges with direction `dir`, or None if they do not overlap
///
pub fn intersect_ranges(
    dir: AxisDirection,
    a: &OrientedRange,
    b: &OrientedRange,
) -> Option<OrientedRange> {
    let (a0, a1) = a.to_canonical(dir);
    let (b0, b1) = b.to_canonical(dir);
    let start = max(a0, b0);
    let end = min(a1, b1);
    if start < end {
        Some(OrientedRange::from_canonical(dir, start, end))
    } else {
        None
    }
}

/// Smallest range with direction `dir` covering both input ranges
///
pub fn hull_ranges(dir: AxisDirection, a: &OrientedRange, b: &OrientedRange) -> OrientedRange {
    let (a0, a1) = a.to_canonical(dir);
    let (b0, b1) = b.to_canonical(dir);
    OrientedRange::from_canonical(dir, min(a0, b0), max(a1, b1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use AxisDirection::*;

    #[test]
    fn test_positions() {
        let up = OrientedRange::new(100, 140);
        assert_eq!(up.direction(), Up);
        assert_eq!((up.min_pos(), up.max_pos()), (100, 139));

        let down = OrientedRange::new(140, 100);
        assert_eq!(down.direction(), Down);
        assert_eq!((down.min_pos(), down.max_pos()), (101, 140));
        assert!(down.contains(140));
        assert!(!down.contains(100));
    }

    #[test]
    fn test_canonical_round_trip() {
        let down = OrientedRange::new(140, 100);
        let (s, e) = down.to_canonical(Down);
        assert_eq!((s, e), (-140, -100));
        assert_eq!(OrientedRange::from_canonical(Down, s, e), down);
    }

    #[test]
    fn test_ranges_overlap() {
        let a = OrientedRange::new(100, 140);
        let b = OrientedRange::new(139, 200);
        let c = OrientedRange::new(140, 200);
        assert!(ranges_overlap(Up, &a, &b));
        assert!(ranges_overlap(Up, &b, &a));
        assert!(!ranges_overlap(Up, &a, &c));
        assert!(!ranges_overlap(Up, &c, &a));

        let a = OrientedRange::new(140, 100);
        let b = OrientedRange::new(101, 50);
        let c = OrientedRange::new(100, 50);
        assert!(ranges_overlap(Down, &a, &b));
        assert!(!ranges_overlap(Down, &a, &c));
    }

    #[test]
    fn test_intersect_ranges() {
        let a = OrientedRange::new(100, 140);
        let b = OrientedRange::new(120, 200);
        assert_eq!(
            intersect_ranges(Up, &a, &b),
            Some(OrientedRange::new(120, 140))
        );
        assert_eq!(
            intersect_ranges(Up, &a, &OrientedRange::new(140, 150)),
            None
        );

        let a = OrientedRange::new(140, 100);
        let b = OrientedRange::new(120, 0);
        assert_eq!(
            intersect_ranges(Down, &a, &b),
            Some(OrientedRange::new(120, 100))
        );
    }

    #[test]
    fn test_hull_ranges() {
        let a = OrientedRange::new(140, 100);
        let b = OrientedRange::new(90, 20);
        assert_eq!(hull_ranges(Down, &a, &b), OrientedRange::new(140, 20));

        let a = OrientedRange::new(0, 10);
        let b = OrientedRange::new(5, 8);
        assert_eq!(hull_ranges(Up, &a, &b), a);
    }
}
