//! Geometric region of possible breakpoint locations
//!
//! A breakpoint joins position x on one reference axis to position y on another. A region bounds
//! the breakpoint on x, on y, and on the anti-diagonal coordinate `r = x(x) + y(y)` defined by
//! the region's orientation.
//!
//! All region algebra is computed in the direction-transformed space, where every axis range
//! increases and the constraint between the axes is simply `r = X + Y`. Genome-coordinate ranges
//! are only used at the boundary of this type.
//!

use std::cmp::{max, min};
use std::fmt;
use std::sync::Arc;

use crate::orientation::{AxisDirection, Orientation};
use crate::oriented_range::{OrientedRange, hull_ranges, intersect_ranges, ranges_overlap};

/// Region bounds in the direction-transformed space, each as a half-open [start,end) range
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct CanonicalBounds {
    x: (i64, i64),
    y: (i64, i64),
    r: (i64, i64),
}

impl CanonicalBounds {
    /// Describe why the bounds fail to represent a valid region, if they do
    ///
    fn integrity_error(&self) -> Option<String> {
        let (x0, x1) = self.x;
        let (y0, y1) = self.y;
        let (r0, r1) = self.r;
        if x0 >= x1 {
            return Some(format!("empty x range [{x0},{x1})"));
        }
        if y0 >= y1 {
            return Some(format!("empty y range [{y0},{y1})"));
        }
        if r0 >= r1 {
            return Some(format!("empty r range [{r0},{r1})"));
        }

        // The r values reachable from integer points in the x/y box are exactly [x0+y0, x1+y1-2]
        let min_corner_r = x0 + y0;
        let max_corner_r = x1 + y1 - 2;
        if r0 > max_corner_r {
            return Some(format!(
                "r range start {r0} exceeds the maximum corner r value {max_corner_r}"
            ));
        }
        if r1 <= min_corner_r {
            return Some(format!(
                "r range end {r1} does not exceed the minimum corner r value {min_corner_r}"
            ));
        }
        None
    }
}

/// A six-sided region of possible breakpoint locations in (x, y, r) space
///
/// The region always contains at least one integer lattice point, this is asserted on every
/// construction.
///
#[derive(Clone)]
pub struct BreakpointRegion {
    orientation: Orientation,
    x_axis: Arc<str>,
    y_axis: Arc<str>,
    x_range: OrientedRange,
    y_range: OrientedRange,

    /// The r range is always increasing
    r_range: OrientedRange,
}

impl BreakpointRegion {
    /// Create a new region
    ///
    /// The x and y ranges must point in the directions given by `orientation`. Panics if the
    /// bounds do not describe a valid region.
    ///
    pub fn new(
        orientation: Orientation,
        x_axis: Arc<str>,
        y_axis: Arc<str>,
        x_range: OrientedRange,
        y_range: OrientedRange,
        r_range: OrientedRange,
    ) -> Self {
        assert_eq!(
            x_range.direction(),
            orientation.x_dir(),
            "x range {x_range:?} conflicts with orientation {orientation}"
        );
        assert_eq!(
            y_range.direction(),
            orientation.y_dir(),
            "y range {y_range:?} conflicts with orientation {orientation}"
        );
        assert_eq!(
            r_range.direction(),
            AxisDirection::Up,
            "r range {r_range:?} must be increasing"
        );
        let region = Self {
            orientation,
            x_axis,
            y_axis,
            x_range,
            y_range,
            r_range,
        };
        region.assert_integrity();
        region
    }

    fn from_canonical(
        orientation: Orientation,
        x_axis: Arc<str>,
        y_axis: Arc<str>,
        bounds: CanonicalBounds,
    ) -> Self {
        Self::new(
            orientation,
            x_axis,
            y_axis,
            OrientedRange::from_canonical(orientation.x_dir(), bounds.x.0, bounds.x.1),
            OrientedRange::from_canonical(orientation.y_dir(), bounds.y.0, bounds.y.1),
            OrientedRange::new(bounds.r.0, bounds.r.1),
        )
    }

    fn canonical(&self) -> CanonicalBounds {
        CanonicalBounds {
            x: self.x_range.to_canonical(self.orientation.x_dir()),
            y: self.y_range.to_canonical(self.orientation.y_dir()),
            r: (self.r_range.start, self.r_range.end),
        }
    }

    /// Panic with a diagnostic if the region bounds are malformed
    ///
    pub fn assert_integrity(&self) {
        if let Some(msg) = self.canonical().integrity_error() {
            panic!("Invalid breakpoint region {self:?}: {msg}");
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn x_axis(&self) -> &str {
        &self.x_axis
    }

    pub fn y_axis(&self) -> &str {
        &self.y_axis
    }

    pub fn x_axis_id(&self) -> &Arc<str> {
        &self.x_axis
    }

    pub fn x_range(&self) -> &OrientedRange {
        &self.x_range
    }

    pub fn y_range(&self) -> &OrientedRange {
        &self.y_range
    }

    pub fn r_range(&self) -> &OrientedRange {
        &self.r_range
    }

    pub fn x_lo(&self) -> i64 {
        self.x_range.start
    }

    pub fn x_hi(&self) -> i64 {
        self.x_range.end
    }

    pub fn y_lo(&self) -> i64 {
        self.y_range.start
    }

    pub fn y_hi(&self) -> i64 {
        self.y_range.end
    }

    pub fn r_lo(&self) -> i64 {
        self.r_range.start
    }

    pub fn r_hi(&self) -> i64 {
        self.r_range.end
    }

    /// True if the two regions describe breakpoints between the same axes in the same orientation
    ///
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.orientation == other.orientation
            && self.x_axis == other.x_axis
            && self.y_axis == other.y_axis
    }

    /// Return true if the x, y and r projections of the two regions all overlap
    ///
    pub fn overlaps(&self, other: &Self) -> bool {
        self.is_compatible(other)
            && ranges_overlap(self.orientation.x_dir(), &self.x_range, &other.x_range)
            && ranges_overlap(self.orientation.y_dir(), &self.y_range, &other.y_range)
            && ranges_overlap(AxisDirection::Up, &self.r_range, &other.r_range)
    }

    /// Intersect two regions
    ///
    /// Each axis is first intersected independently, then each axis range is tightened to the
    /// values reachable from the other two ranges under `r = X + Y`. Returns None if the regions
    /// are not compatible or any tightened range is empty.
    ///
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        if !self.is_compatible(other) {
            return None;
        }

        let x = intersect_ranges(self.orientation.x_dir(), &self.x_range, &other.x_range)?;
        let y = intersect_ranges(self.orientation.y_dir(), &self.y_range, &other.y_range)?;
        let r = intersect_ranges(AxisDirection::Up, &self.r_range, &other.r_range)?;

        let (x0, x1) = x.to_canonical(self.orientation.x_dir());
        let (y0, y1) = y.to_canonical(self.orientation.y_dir());
        let (r0, r1) = (r.start, r.end);

        let bounds = CanonicalBounds {
            x: (max(x0, r0 - (y1 - 1)), min(x1, r1 - y0)),
            y: (max(y0, r0 - (x1 - 1)), min(y1, r1 - x0)),
            r: (max(r0, x0 + y0), min(r1, x1 + y1 - 1)),
        };

        let is_empty = bounds.x.0 >= bounds.x.1
            || bounds.y.0 >= bounds.y.1
            || bounds.r.0 >= bounds.r.1;
        if is_empty {
            return None;
        }

        Some(Self::from_canonical(
            self.orientation,
            self.x_axis.clone(),
            self.y_axis.clone(),
            bounds,
        ))
    }

    /// Smallest region whose x, y and r ranges each cover both input regions
    ///
    /// Panics if the regions are not compatible.
    ///
    pub fn union(&self, other: &Self) -> Self {
        assert!(
            self.is_compatible(other),
            "Union requested for incompatible regions {self:?} and {other:?}"
        );
        Self::new(
            self.orientation,
            self.x_axis.clone(),
            self.y_axis.clone(),
            hull_ranges(self.orientation.x_dir(), &self.x_range, &other.x_range),
            hull_ranges(self.orientation.y_dir(), &self.y_range, &other.y_range),
            hull_ranges(AxisDirection::Up, &self.r_range, &other.r_range),
        )
    }

    /// The same region expressed from the mate's perspective, with the x and y axes swapped
    ///
    /// The r range is unchanged because r is symmetric under the swap.
    ///
    pub fn flip(&self) -> Self {
        Self {
            orientation: self.orientation.flip(),
            x_axis: self.y_axis.clone(),
            y_axis: self.x_axis.clone(),
            x_range: self.y_range,
            y_range: self.x_range,
            r_range: self.r_range,
        }
    }

    /// Test if the point (x,y) is inside the region
    ///
    pub fn contains(&self, x: i64, y: i64) -> bool {
        self.x_range.contains(x)
            && self.y_range.contains(y)
            && self.r_range.contains(self.orientation.r(x, y))
    }

    /// Field-by-field comparison without flip symmetry
    ///
    fn is_identical(&self, other: &Self) -> bool {
        self.is_compatible(other)
            && self.x_range == other.x_range
            && self.y_range == other.y_range
            && self.r_range == other.r_range
    }
}

/// Regions are equal if they match directly or if either matches the flip of the other
///
impl PartialEq for BreakpointRegion {
    fn eq(&self, other: &Self) -> bool {
        self.is_identical(other) || self.flip().is_identical(other)
    }
}

impl Eq for BreakpointRegion {}

impl fmt::Debug for BreakpointRegion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Region: {} x: {}:{:?} y: {}:{:?} r: [{},{})",
            self.orientation,
            self.x_axis,
            self.x_range,
            self.y_axis,
            self.y_range,
            self.r_range.start,
            self.r_range.end
        )
    }
}
