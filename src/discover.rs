use camino::Utf8Path;
use log::info;
use rust_htslib::bam::{self, Read};
use simple_error::{SimpleResult, try_with};
use unwrap::unwrap;

use crate::bam_scanner::{ScanSettings, check_read_group_stats, scan_bam_for_discordant_pairs};
use crate::chrom_list::ChromList;
use crate::cli;
use crate::cluster_breakpoints::{ClusteringSettings, StreamingClusterer};
use crate::cluster_output::ClusterOutput;
use crate::platform::ReadGroupLibraryMap;
use crate::read_group_stats::ReadGroupStatsMap;
use crate::run_stats::{DiscoverRunStats, write_discover_run_stats};
use crate::vcf_utils;

pub const RUN_STATS_FILENAME: &str = "run.stats.json";
pub const SETTINGS_FILENAME: &str = "discover.settings.json";

pub fn run_discover(
    shared_settings: &cli::SharedSettings,
    settings: &cli::DiscoverSettings,
) -> SimpleResult<()> {
    let start = std::time::Instant::now();

    cli::validate_discover_settings_data(settings);
    cli::write_discover_settings(&settings.output_dir, settings);

    let mut bam_reader = try_with!(
        bam::Reader::from_path(&settings.bam_filename),
        "Unable to open alignment file: '{}'",
        settings.bam_filename
    );
    unwrap!(
        bam_reader.set_threads(shared_settings.thread_count),
        "Unable to set alignment file reader threads"
    );

    let chrom_list = ChromList::from_bam_header(bam_reader.header());

    let gap_stats_map =
        ReadGroupStatsMap::from_json_file(Utf8Path::new(&settings.read_group_stats_filename))?;
    check_read_group_stats(bam_reader.header(), &gap_stats_map)?;

    let library_map = ReadGroupLibraryMap::from_bam_header(
        bam_reader.header(),
        &settings.default_platform,
        settings.library_orientation,
    )?;

    let max_variation = gap_stats_map.max_gap();
    info!("Maximum breakpoint cluster variation: {max_variation}");
    let mut clusterer = StreamingClusterer::new(
        ClusteringSettings {
            min_support_depth: settings.min_support_depth,
            intersection_only: settings.intersection_only,
        },
        max_variation,
    );

    let scan_settings = ScanSettings {
        min_mapq: settings.min_mapq,
        read_overlap_fraction: settings.read_overlap_fraction,
    };

    let mut output = ClusterOutput::new(
        &settings.output_dir,
        &chrom_list,
        settings.reorder_window,
        settings.debug_output,
    );

    let scan_stats = scan_bam_for_discordant_pairs(
        &mut bam_reader,
        &chrom_list,
        &library_map,
        &gap_stats_map,
        &scan_settings,
        &mut clusterer,
        |clusters| output.add_clusters(clusters),
    )?;

    let vcf_filename = output.vcf_filename().to_owned();
    let reorder_failure_counts = output.close();
    vcf_utils::build_bcf_index(&vcf_filename, shared_settings.thread_count, true)?;

    let clustering_stats = clusterer.stats().clone();
    info!(
        "Emitted {} breakpoint clusters, {} with no common breakpoint region",
        clustering_stats.clusters_emitted, clustering_stats.inconsistent_clusters_emitted
    );

    let run_stats = DiscoverRunStats {
        scan_stats,
        clustering_stats,
        reorder_failure_counts,
        total_runtime_secs: start.elapsed().as_secs_f64(),
    };
    write_discover_run_stats(&settings.output_dir, &run_stats);

    Ok(())
}
