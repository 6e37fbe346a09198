use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use const_format::concatcp;
use serde::{Deserialize, Serialize};
use simple_error::{SimpleResult, bail, try_with};
use unwrap::unwrap;

use super::defaults::{
    DEFAULT_PLATFORM, MIN_MAPQ, MIN_SUPPORT_DEPTH, READ_OVERLAP_FRACTION, REORDER_WINDOW,
};
use super::utils::check_required_filename;
use crate::chrom_list::ChromList;
use crate::discover::SETTINGS_FILENAME;
use crate::platform::{LibraryOrientation, get_platform_library_orientation};

#[derive(Args, Default, Deserialize, Serialize)]
pub struct DiscoverSettings {
    /// Directory for all discover command output (must not already exist)
    #[arg(long, value_name = "DIR", default_value = concatcp!(env!("CARGO_PKG_NAME"), "_discover_output"))]
    pub output_dir: Utf8PathBuf,

    /// Alignment file for query sample in BAM or CRAM format, sorted by coordinate
    #[arg(long = "bam", value_name = "FILE")]
    pub bam_filename: String,

    /// Fragment gap statistics for each read group, in JSON format
    ///
    /// The file is a JSON object keyed on read group id, where each value gives the "gap_min",
    /// "gap_mean", "gap_max" and "fragment_std_dev" of the read group. Reads without a read group
    /// use the id "*".
    ///
    #[arg(long = "read-group-stats", value_name = "FILE")]
    pub read_group_stats_filename: String,

    /// Minimum number of read pairs required to report a breakpoint cluster
    #[arg(long, default_value_t = MIN_SUPPORT_DEPTH)]
    pub min_support_depth: usize,

    /// Only report clusters where all read pairs share a common breakpoint region
    #[arg(long)]
    pub intersection_only: bool,

    /// Maximum distance an output record can arrive behind the furthest position already written
    /// on its chromosome. Records further out of order than this are dropped with a warning.
    #[arg(hide = true, long, default_value_t = REORDER_WINDOW)]
    pub reorder_window: i64,

    /// Minimum MAPQ value for both reads of a pair to be used as breakpoint evidence
    ///
    /// The mate MAPQ is taken from the MQ tag, and is not checked when the tag is missing.
    #[arg(long, default_value_t = MIN_MAPQ)]
    pub min_mapq: u32,

    /// Fraction of each read's aligned length which may extend past the breakpoint
    #[arg(hide = true, long, default_value_t = READ_OVERLAP_FRACTION)]
    pub read_overlap_fraction: f64,

    /// Sequencing platform assumed for read groups without a PL tag
    #[arg(long, value_name = "PLATFORM", default_value = DEFAULT_PLATFORM)]
    pub default_platform: String,

    /// Expected read pair orientation for all read groups, overriding the orientation found from
    /// each read group's sequencing platform
    #[arg(long, value_enum)]
    pub library_orientation: Option<LibraryOrientation>,

    /// Write a table of every read pair constraint in each reported cluster
    #[arg(long)]
    pub debug_output: bool,

    /// Don't canonicalize input file paths
    ///
    /// By default, all input file paths are canonicalized before they are stored in the discover
    /// settings file.
    ///
    #[arg(hide = true, long)]
    pub disable_path_canonicalization: bool,
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
/// Assumes that the logger is not setup
///
pub fn validate_and_fix_discover_settings(
    settings: DiscoverSettings,
) -> SimpleResult<DiscoverSettings> {
    check_required_filename(&settings.bam_filename, "alignment")?;

    check_required_filename(&settings.read_group_stats_filename, "read group statistics")?;

    if settings.min_support_depth == 0 {
        bail!("--min-support-depth argument must be greater than 0");
    }

    if settings.reorder_window < 1 {
        bail!("--reorder-window argument must be greater than 0");
    }

    if !(0.0..1.0).contains(&settings.read_overlap_fraction) {
        bail!(
            "--read-overlap-fraction argument must be in [0,1), found {}",
            settings.read_overlap_fraction
        );
    }

    if settings.library_orientation.is_none() {
        get_platform_library_orientation(&settings.default_platform)?;
    }

    fn canonicalize_string_path(s: &str) -> SimpleResult<String> {
        let path = try_with!(
            Utf8PathBuf::from(s).canonicalize_utf8(),
            "Can't canonicalize file path: '{s}'"
        );
        Ok(path.to_string())
    }

    let mut settings = settings;
    if !settings.disable_path_canonicalization {
        settings.bam_filename = canonicalize_string_path(&settings.bam_filename)?;
        settings.read_group_stats_filename =
            canonicalize_string_path(&settings.read_group_stats_filename)?;
    }

    Ok(settings)
}

#[derive(Debug, PartialEq)]
enum SettingValidationError {
    NotFound,
    UnMapped,
}

fn validate_discover_settings_data_impl(
    settings: &DiscoverSettings,
) -> Result<(), SettingValidationError> {
    use log::error;
    use rust_htslib::bam::{self, Read};

    let chrom_list = {
        let bam_reader = match bam::Reader::from_path(&settings.bam_filename) {
            Ok(x) => x,
            Err(error) => {
                error!("Failed to open input alignment file: {}", error);
                return Err(SettingValidationError::NotFound);
            }
        };
        ChromList::from_bam_header(bam_reader.header())
    };

    if chrom_list.data.is_empty() {
        error!(
            "Input alignment file is not mapped: '{}'",
            &settings.bam_filename
        );
        return Err(SettingValidationError::UnMapped);
    }

    Ok(())
}

/// Extended input data/settings validation that's too complex/slow to put in the cmdline parser
///
/// Assumes that the logger is setup
///
pub fn validate_discover_settings_data(settings: &DiscoverSettings) {
    if let Err(err) = validate_discover_settings_data_impl(settings) {
        match err {
            SettingValidationError::NotFound => std::process::exit(exitcode::USAGE),
            _ => std::process::exit(exitcode::DATAERR),
        }
    }
}

/// Write discover settings out in json format
pub fn write_discover_settings(output_dir: &Utf8Path, settings: &DiscoverSettings) {
    use log::info;

    let filename = output_dir.join(SETTINGS_FILENAME);

    info!("Writing discover settings to file: '{filename}'");

    let f = unwrap!(
        std::fs::File::create(&filename),
        "Unable to create discover settings json file: '{filename}'"
    );

    unwrap!(
        serde_json::to_writer_pretty(&f, &settings),
        "Unable to write discover settings json file: '{filename}'"
    );
}
