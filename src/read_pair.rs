//! Discordant read pair evidence and its translation into a breakpoint constraint
//!

use std::sync::Arc;

use rust_htslib::bam;

use crate::bam_utils::{get_alignment_end, get_mate_alignment_end, get_read_group};
use crate::breakpoint_constraint::BreakpointConstraint;
use crate::chrom_list::ChromList;
use crate::orientation::{AxisDirection, Orientation};
use crate::platform::LibraryOrientation;
use crate::read_group_stats::ReadGroupGapStats;

/// Alignment of one read from a pair
///
#[derive(Clone, Debug, PartialEq)]
pub struct ReadEnd {
    pub chrom_index: usize,

    /// Zero-indexed alignment start
    pub start: i64,

    /// Zero-indexed alignment end, one past the last aligned reference position
    pub end: i64,

    pub is_reverse: bool,
    pub is_first_in_template: bool,
}

impl ReadEnd {
    /// Best guess of the breakpoint-adjacent position of this read
    ///
    /// This is the aligned read edge in the read direction, pulled back by an assumed overlap of
    /// the read into the breakpoint.
    ///
    /// # Arguments
    /// * `read_overlap_fraction` - Fraction of the aligned read span which is assumed to possibly
    ///   extend past the breakpoint
    ///
    pub fn breakpoint_anchor(&self, dir: AxisDirection, read_overlap_fraction: f64) -> i64 {
        let span = self.end - self.start;
        let overlap = (read_overlap_fraction * span as f64).floor() as i64;
        match dir {
            AxisDirection::Up => self.end - 1 - overlap,
            AxisDirection::Down => self.start + overlap,
        }
    }
}

/// A read pair as viewed from one of its reads
///
#[derive(Clone, Debug, PartialEq)]
pub struct ReadPair {
    pub read: ReadEnd,
    pub mate: ReadEnd,
    pub read_group: String,
}

impl ReadPair {
    /// Build the read pair from one of its alignment records
    ///
    /// The mate alignment end is taken from the MC tag if present, otherwise the mate is assumed
    /// to span the same reference length as the read.
    ///
    pub fn from_bam_record(record: &bam::Record) -> Self {
        let read_end = get_alignment_end(record);
        let read = ReadEnd {
            chrom_index: record.tid() as usize,
            start: record.pos(),
            end: read_end,
            is_reverse: record.is_reverse(),
            is_first_in_template: record.is_first_in_template(),
        };
        let mate_end = get_mate_alignment_end(record)
            .unwrap_or_else(|| record.mpos() + (read_end - record.pos()));
        let mate = ReadEnd {
            chrom_index: record.mtid() as usize,
            start: record.mpos(),
            end: std::cmp::max(mate_end, record.mpos() + 1),
            is_reverse: record.is_mate_reverse(),
            is_first_in_template: !record.is_first_in_template(),
        };
        Self {
            read,
            mate,
            read_group: get_read_group(record),
        }
    }

    /// Orientation of the pair, with the read on the x axis and the mate on the y axis
    ///
    pub fn orientation(&self, library: LibraryOrientation) -> Orientation {
        Orientation::from_directions(
            library.read_direction(self.read.is_first_in_template, self.read.is_reverse),
            library.read_direction(self.mate.is_first_in_template, self.mate.is_reverse),
        )
    }

    /// Translate the read pair into a breakpoint constraint
    ///
    pub fn to_constraint(
        &self,
        chrom_list: &ChromList,
        library: LibraryOrientation,
        gap_stats: &ReadGroupGapStats,
        read_overlap_fraction: f64,
    ) -> BreakpointConstraint {
        let orientation = self.orientation(library);
        let axis_name =
            |chrom_index: usize| -> Arc<str> { chrom_list.data[chrom_index].label.clone() };
        BreakpointConstraint::from_read_pair_anchors(
            orientation,
            axis_name(self.read.chrom_index),
            axis_name(self.mate.chrom_index),
            self.read
                .breakpoint_anchor(orientation.x_dir(), read_overlap_fraction),
            self.mate
                .breakpoint_anchor(orientation.y_dir(), read_overlap_fraction),
            gap_stats,
        )
    }
}
