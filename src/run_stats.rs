//! Track stats for the whole pairbreak run
//!

use std::fs::File;

use camino::Utf8Path;
use log::info;
use serde::Serialize;
use unwrap::unwrap;

use crate::bam_scanner::ScanStats;
use crate::cluster_breakpoints::ClusteringStats;
use crate::cluster_output::ReorderFailureCounts;
use crate::discover::RUN_STATS_FILENAME;

#[derive(Serialize)]
pub struct DiscoverRunStats {
    pub scan_stats: ScanStats,
    pub clustering_stats: ClusteringStats,

    /// Records dropped from each output because they arrived too far out of order
    pub reorder_failure_counts: ReorderFailureCounts,

    pub total_runtime_secs: f64,
}

/// Write run_stats structure out in json format
pub fn write_discover_run_stats(output_dir: &Utf8Path, run_stats: &DiscoverRunStats) {
    let filename = output_dir.join(RUN_STATS_FILENAME);

    info!("Writing run statistics to file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create run statistics json file: '{filename}'"
    );

    unwrap!(
        serde_json::to_writer_pretty(&f, &run_stats),
        "Unable to write run statistics json file: '{filename}'"
    );
}
