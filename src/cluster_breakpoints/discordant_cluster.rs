use std::fmt;
use std::sync::Arc;

use crate::breakpoint_constraint::BreakpointConstraint;

/// An accumulating group of overlapping breakpoint constraints
///
/// The cluster tracks the running union and running intersection of all member constraints. Once
/// the intersection becomes empty it stays empty, since adding members can only shrink it.
///
#[derive(Clone)]
pub struct DiscordantCluster {
    sequence_name: Arc<str>,

    /// Largest fragment gap among all read groups, fixed at cluster creation
    max_variation: i64,

    union: BreakpointConstraint,
    intersection: Option<BreakpointConstraint>,

    /// Member constraints in insertion order
    members: Vec<BreakpointConstraint>,
}

impl DiscordantCluster {
    pub fn new(seed: BreakpointConstraint, max_variation: i64) -> Self {
        Self {
            sequence_name: seed.region.x_axis_id().clone(),
            max_variation,
            union: seed.clone(),
            intersection: Some(seed.clone()),
            members: vec![seed],
        }
    }

    pub fn sequence_name(&self) -> &str {
        &self.sequence_name
    }

    #[cfg(test)]
    pub fn max_variation(&self) -> i64 {
        self.max_variation
    }

    pub fn union(&self) -> &BreakpointConstraint {
        &self.union
    }

    pub fn intersection(&self) -> Option<&BreakpointConstraint> {
        self.intersection.as_ref()
    }

    pub fn members(&self) -> &[BreakpointConstraint] {
        &self.members
    }

    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// True if all member constraints share at least one common breakpoint location
    ///
    pub fn is_consistent(&self) -> bool {
        self.intersection.is_some()
    }

    /// Test whether a new constraint should join this cluster
    ///
    pub fn belongs(&self, c: &BreakpointConstraint) -> bool {
        if !self.union.overlaps(c) {
            return false;
        }

        // For breakpoints within one sequence, don't join mirror-image events where the x and y
        // ordering is reversed:
        let union_region = &self.union.region;
        if union_region.x_axis() == union_region.y_axis() {
            let union_order = union_region.x_lo() <= union_region.y_lo();
            let c_order = c.region.x_lo() <= c.region.y_lo();
            if union_order != c_order {
                return false;
            }
        }

        if let Some(intersection) = &self.intersection
            && intersection.overlaps(c)
        {
            return true;
        }

        self.members.iter().any(|x| x.overlaps(c))
    }

    pub fn add(&mut self, c: BreakpointConstraint) {
        self.union = self.union.union(&c);
        self.intersection = self.intersection.as_ref().and_then(|x| x.intersect(&c));
        self.members.push(c);
    }

    /// Merge all constraints of `other` into this cluster
    ///
    pub fn absorb(&mut self, other: DiscordantCluster) {
        self.union = self.union.union(&other.union);
        self.intersection = match (self.intersection.as_ref(), other.intersection.as_ref()) {
            (Some(a), Some(b)) => a.intersect(b),
            _ => None,
        };
        self.max_variation = std::cmp::max(self.max_variation, other.max_variation);
        self.members.extend(other.members);
    }

    /// Scan position at which this cluster can no longer receive a matching constraint
    ///
    /// This is the end of the union's x range plus the maximum variation. For a decreasing x
    /// range the numeric upper end of the range is used.
    ///
    pub fn flush_position(&self) -> i64 {
        self.union.region.x_range().max_pos() + 1 + self.max_variation
    }
}

impl fmt::Debug for DiscordantCluster {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "DiscordantCluster: seq: {} count: {} union: {:?} intersection: {:?}",
            self.sequence_name,
            self.count(),
            self.union,
            self.intersection
        )
    }
}
