use log::{debug, info};
use rust_htslib::bam::{self, Read};
use serde::Serialize;
use simple_error::{SimpleResult, bail};
use thousands::Separable;
use unwrap::unwrap;

use crate::bam_utils::{RecordFilterCounts, get_record_filter_reason};
use crate::chrom_list::ChromList;
use crate::cluster_breakpoints::{EmittedCluster, StreamingClusterer};
use crate::platform::{ReadGroupLibraryMap, get_header_read_groups};
use crate::read_group_stats::{ReadGroupStatsMap, UNGROUPED_READ_GROUP_ID};
use crate::read_pair::ReadPair;

pub struct ScanSettings {
    pub min_mapq: u32,
    pub read_overlap_fraction: f64,
}

#[derive(Clone, Default, Serialize)]
pub struct ScanStats {
    pub records_scanned: usize,
    pub records_filtered: RecordFilterCounts,

    /// Records skipped because the pair is processed from the other read
    pub mate_records_skipped: usize,

    pub concordant_pairs_excluded: usize,
    pub discordant_pairs_clustered: usize,
}

/// Check that gap statistics are available for every read group in the alignment file
///
/// If the header has no read groups, statistics are required for ungrouped reads.
///
pub fn check_read_group_stats(
    header: &bam::HeaderView,
    gap_stats_map: &ReadGroupStatsMap,
) -> SimpleResult<()> {
    let read_groups = get_header_read_groups(header)?;
    if read_groups.is_empty() {
        gap_stats_map.get(UNGROUPED_READ_GROUP_ID)?;
    }
    for (read_group, _) in read_groups.iter() {
        gap_stats_map.get(read_group)?;
    }
    Ok(())
}

/// True if this record is the read from which its pair is processed
///
/// Each pair is processed from the read first in coordinate order, or from the first read in
/// template if both reads start at the same position. This read is placed on the x axis.
///
fn is_pair_primary_read(record: &bam::Record) -> bool {
    let read_key = (record.tid(), record.pos());
    let mate_key = (record.mtid(), record.mpos());
    match read_key.cmp(&mate_key) {
        std::cmp::Ordering::Less => true,
        std::cmp::Ordering::Greater => false,
        std::cmp::Ordering::Equal => record.is_first_in_template(),
    }
}

/// Tracks the scan position to enforce coordinate sorted input and detect chromosome changes
///
#[derive(Default)]
struct ScanPosition {
    tid: Option<i32>,
    pos: i64,
}

impl ScanPosition {
    /// Update scan position and return true if this is a new chromosome
    ///
    fn update(&mut self, chrom_list: &ChromList, tid: i32, pos: i64) -> SimpleResult<bool> {
        let is_new_chrom = match self.tid {
            Some(last_tid) if tid < last_tid => {
                bail!(
                    "Alignment file is not coordinate sorted, chromosome order changes at index {tid}"
                )
            }
            Some(last_tid) if tid == last_tid => {
                if pos < self.pos {
                    let chrom_label = &chrom_list.data[tid as usize].label;
                    bail!(
                        "Alignment file is not coordinate sorted, position {} follows {} on chromosome '{chrom_label}'",
                        pos + 1,
                        self.pos + 1
                    );
                }
                false
            }
            _ => true,
        };
        self.tid = Some(tid);
        self.pos = pos;
        Ok(is_new_chrom)
    }
}

/// Scan a coordinate sorted alignment file for discordant read pairs, and cluster them
///
/// All clusters emitted by the clusterer are passed to `process_emitted`.
///
pub fn scan_bam_for_discordant_pairs<F>(
    bam_reader: &mut bam::Reader,
    chrom_list: &ChromList,
    library_map: &ReadGroupLibraryMap,
    gap_stats_map: &ReadGroupStatsMap,
    settings: &ScanSettings,
    clusterer: &mut StreamingClusterer,
    mut process_emitted: F,
) -> SimpleResult<ScanStats>
where
    F: FnMut(Vec<EmittedCluster>),
{
    let mut stats = ScanStats::default();
    let mut scan_pos = ScanPosition::default();

    let mut record = bam::Record::new();
    while let Some(r) = bam_reader.read(&mut record) {
        unwrap!(r, "Failed to parse alignment record");
        stats.records_scanned += 1;

        let tid = record.tid();
        if tid >= 0 && scan_pos.update(chrom_list, tid, record.pos())? {
            debug!(
                "Starting chromosome '{}', closing {} active clusters",
                chrom_list.data[tid as usize].label,
                clusterer.active_count()
            );
            process_emitted(clusterer.finish());
        }

        if let Some(reason) = get_record_filter_reason(&record, settings.min_mapq) {
            stats.records_filtered.increment(reason);
            continue;
        }

        if !is_pair_primary_read(&record) {
            stats.mate_records_skipped += 1;
            continue;
        }

        process_emitted(clusterer.flush(record.pos()));

        let pair = ReadPair::from_bam_record(&record);
        let gap_stats = gap_stats_map.get(&pair.read_group)?;
        let library = library_map.get(&pair.read_group);
        let constraint = pair.to_constraint(
            chrom_list,
            library,
            gap_stats,
            settings.read_overlap_fraction,
        );
        if constraint.is_concordant(gap_stats) {
            stats.concordant_pairs_excluded += 1;
            continue;
        }

        stats.discordant_pairs_clustered += 1;
        clusterer.process_constraint(constraint);
    }
    process_emitted(clusterer.finish());

    info!(
        "Finished scanning {} alignment records, found {} discordant read pairs",
        stats.records_scanned.separate_with_commas(),
        stats.discordant_pairs_clustered.separate_with_commas()
    );
    info!(
        "Alignment records filtered: {}",
        stats.records_filtered.total().separate_with_commas()
    );

    Ok(stats)
}
