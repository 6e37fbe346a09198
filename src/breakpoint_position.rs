use crate::breakpoint_constraint::BreakpointConstraint;
use crate::orientation::AxisDirection;
use crate::oriented_range::OrientedRange;

/// Point estimate of a breakpoint, with bounds on the x axis
///
/// `lo` and `hi` are the lowest and highest x axis coordinates in the constraint region, and
/// `position_alt` is the point estimate on the y axis.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BreakpointPosition {
    pub lo: i64,
    pub position: i64,
    pub hi: i64,
    pub position_alt: i64,
}

/// Midpoint of the x values reachable at anti-diagonal coordinate r_est, in transformed space
///
fn canonical_axis_midpoint(x: (i64, i64), y: (i64, i64), r_est: i64) -> i64 {
    let (x0, x1) = x;
    let (y0, y1) = y;
    let lo = std::cmp::max(x0, r_est - (y1 - 1));
    let hi = std::cmp::min(x1 - 1, r_est - y0);
    assert!(lo <= hi, "No x value reachable at r={r_est}");
    lo + (hi - lo) / 2
}

/// Estimate the x axis breakpoint position given the constraint's r value estimate
///
fn estimate_axis_position(
    x_range: &OrientedRange,
    x_dir: AxisDirection,
    y_range: &OrientedRange,
    y_dir: AxisDirection,
    r_est: i64,
) -> i64 {
    let x = x_range.to_canonical(x_dir);
    let y = y_range.to_canonical(y_dir);
    x_dir.apply(canonical_axis_midpoint(x, y, r_est))
}

/// Estimate the breakpoint position from the region and gaussian belief of a constraint
///
/// The gaussian mean is rounded and clamped into the range of r values which are reachable in
/// the region. At this r value the set of possible x positions is a single segment, and the
/// segment midpoint is used as the x position estimate. The y position is found the same way
/// from the flipped constraint.
///
pub fn estimate_breakpoint_position(constraint: &BreakpointConstraint) -> BreakpointPosition {
    let region = &constraint.region;
    let orientation = region.orientation();
    let x_dir = orientation.x_dir();
    let y_dir = orientation.y_dir();

    let (x0, x1) = region.x_range().to_canonical(x_dir);
    let (y0, y1) = region.y_range().to_canonical(y_dir);
    let r_min = std::cmp::max(region.r_lo(), x0 + y0);
    let r_max = std::cmp::min(region.r_hi() - 1, x1 + y1 - 2);
    let r_est = (constraint.belief.mean.round() as i64).clamp(r_min, r_max);

    let position = estimate_axis_position(region.x_range(), x_dir, region.y_range(), y_dir, r_est);
    let position_alt =
        estimate_axis_position(region.y_range(), y_dir, region.x_range(), x_dir, r_est);

    let bpos = BreakpointPosition {
        lo: region.x_range().min_pos(),
        position,
        hi: region.x_range().max_pos(),
        position_alt,
    };
    debug_assert!(bpos.lo <= bpos.position && bpos.position <= bpos.hi);
    debug_assert!(region.y_range().contains(bpos.position_alt));
    bpos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakpoint_constraint::GaussianBelief;
    use crate::breakpoint_region::tests::region;
    use crate::orientation::Orientation;

    fn constraint(
        orientation: Orientation,
        x: (i64, i64),
        y: (i64, i64),
        r: (i64, i64),
        mean: f64,
    ) -> BreakpointConstraint {
        BreakpointConstraint::new(
            region(orientation, "chr1", "chr2", x, y, r),
            GaussianBelief::new(mean, 20.0),
        )
    }

    #[test]
    fn test_estimate_up_up() {
        // At r=340 the reachable x values are [101,139], y follows from r
        let c = constraint(Orientation::UpUp, (100, 140), (200, 240), (310, 370), 340.0);
        let bpos = estimate_breakpoint_position(&c);
        assert_eq!(
            bpos,
            BreakpointPosition {
                lo: 100,
                position: 120,
                hi: 139,
                position_alt: 220,
            }
        );
    }

    #[test]
    fn test_estimate_clamps_mean() {
        let c = constraint(
            Orientation::UpUp,
            (100, 140),
            (200, 240),
            (310, 370),
            1000.0,
        );
        let bpos = estimate_breakpoint_position(&c);

        // r is clamped to 369, giving x in [130,139]
        assert_eq!(bpos.position, 134);
        assert_eq!(bpos.position_alt, 234);

        let c = constraint(Orientation::UpUp, (100, 140), (200, 240), (310, 370), -50.0);
        let bpos = estimate_breakpoint_position(&c);

        // r is clamped to 310, giving x in [100,110]
        assert_eq!(bpos.position, 105);
        assert_eq!(bpos.position_alt, 205);
    }

    #[test]
    fn test_estimate_down_axis() {
        // DownUp: x decreasing over positions 140..=101, r = -x + y
        let c = constraint(
            Orientation::DownUp,
            (140, 100),
            (200, 240),
            (70, 130),
            100.0,
        );
        let bpos = estimate_breakpoint_position(&c);
        assert_eq!((bpos.lo, bpos.hi), (101, 140));

        // Transformed x in [-140,-101], y in [200,239]. At r=100, X in [-139,-101] -> mid -120
        assert_eq!(bpos.position, 120);
        assert_eq!(bpos.position_alt, 220);
        assert!(c.region.contains(bpos.position, bpos.position_alt));
    }

    #[test]
    fn test_estimate_is_flip_consistent() {
        let c = constraint(
            Orientation::UpDown,
            (100, 140),
            (300, 260),
            (-200, -160),
            -180.0,
        );
        let bpos = estimate_breakpoint_position(&c);
        let flipped = estimate_breakpoint_position(&c.flip());
        assert_eq!(bpos.position, flipped.position_alt);
        assert_eq!(bpos.position_alt, flipped.position);
        assert!(c.region.contains(bpos.position, bpos.position_alt));
    }
}
