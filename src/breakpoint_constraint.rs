use std::fmt;
use std::sync::Arc;

use crate::breakpoint_region::BreakpointRegion;
use crate::orientation::Orientation;
use crate::oriented_range::OrientedRange;
use crate::read_group_stats::ReadGroupGapStats;

/// Gaussian belief over the anti-diagonal breakpoint coordinate r
///
#[derive(Clone, Copy, PartialEq)]
pub struct GaussianBelief {
    pub mean: f64,
    pub std_dev: f64,
}

impl GaussianBelief {
    pub fn new(mean: f64, std_dev: f64) -> Self {
        assert!(mean.is_finite(), "Non-finite gaussian mean: {mean}");
        assert!(
            std_dev.is_finite() && std_dev > 0.0,
            "Invalid gaussian standard deviation: {std_dev}"
        );
        Self { mean, std_dev }
    }

    /// Precision-weighted combination of two beliefs
    ///
    /// The merged belief is always at least as narrow as the more confident input.
    ///
    pub fn merge(&self, other: &Self) -> Self {
        let w1 = 0.5 / (self.std_dev * self.std_dev);
        let w2 = 0.5 / (other.std_dev * other.std_dev);
        let w = w1 + w2;
        Self::new(
            (self.mean * w1 + other.mean * w2) / w,
            (0.5 / w).sqrt(),
        )
    }
}

impl fmt::Debug for GaussianBelief {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "N({:.2},{:.2})", self.mean, self.std_dev)
    }
}

/// A breakpoint region combined with a gaussian belief over r
///
/// Constraints are never modified after construction, all operations produce a new constraint.
///
#[derive(Clone, PartialEq)]
pub struct BreakpointConstraint {
    pub region: BreakpointRegion,
    pub belief: GaussianBelief,
}

impl BreakpointConstraint {
    pub fn new(region: BreakpointRegion, belief: GaussianBelief) -> Self {
        Self { region, belief }
    }

    /// Build the constraint implied by a single read pair
    ///
    /// # Arguments
    /// * `x` - Breakpoint-adjacent anchor position of the read on the x axis
    /// * `y` - Breakpoint-adjacent anchor position of the mate on the y axis
    ///
    pub fn from_read_pair_anchors(
        orientation: Orientation,
        x_axis: Arc<str>,
        y_axis: Arc<str>,
        x: i64,
        y: i64,
        gap_stats: &ReadGroupGapStats,
    ) -> Self {
        let gap_max = gap_stats.gap_max;
        let anchor_r = orientation.r(x, y);
        let r_lo = anchor_r + std::cmp::max(gap_stats.gap_min, 0);
        let r_hi = anchor_r + gap_max;
        let mean_r = anchor_r as f64 + gap_stats.gap_mean;
        assert!(
            (r_lo as f64) < mean_r && mean_r < (r_hi as f64),
            "Gap mean {mean_r} outside of breakpoint r range [{r_lo},{r_hi})"
        );

        let region = BreakpointRegion::new(
            orientation,
            x_axis,
            y_axis,
            OrientedRange::new(x, x + orientation.x(gap_max)),
            OrientedRange::new(y, y + orientation.y(gap_max)),
            OrientedRange::new(r_lo, r_hi),
        );
        debug_assert!(region.contains(x, y + orientation.y(std::cmp::max(gap_stats.gap_min, 0))));
        let belief = GaussianBelief::new(mean_r, gap_stats.fragment_std_dev);
        Self { region, belief }
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.region.overlaps(&other.region)
    }

    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let region = self.region.intersect(&other.region)?;
        Some(Self::new(region, self.belief.merge(&other.belief)))
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::new(
            self.region.union(&other.region),
            self.belief.merge(&other.belief),
        )
    }

    #[cfg(test)]
    pub fn flip(&self) -> Self {
        Self::new(self.region.flip(), self.belief)
    }

    /// Return true if this constraint looks like a normal fragment from the reference
    ///
    /// This is only meaningful for a constraint built from a single read pair with `gap_stats`,
    /// so that the pair's anchor r value can be recovered from the r range end.
    ///
    pub fn is_concordant(&self, gap_stats: &ReadGroupGapStats) -> bool {
        let region = &self.region;
        if region.x_axis() != region.y_axis() || !region.orientation().is_inward_facing() {
            return false;
        }
        let anchor_r = region.r_hi() - gap_stats.gap_max;
        anchor_r + gap_stats.gap_min <= 0 && 0 < anchor_r + gap_stats.gap_max
    }
}

impl fmt::Debug for BreakpointConstraint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?} belief: {:?}", self.region, self.belief)
    }
}
