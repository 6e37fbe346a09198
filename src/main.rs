mod bam_scanner;
mod bam_utils;
mod breakpoint_constraint;
mod breakpoint_position;
mod breakpoint_region;
mod chrom_list;
mod cli;
mod cluster_breakpoints;
mod cluster_output;
mod discover;
mod globals;
mod log_utils;
mod logger;
mod orientation;
mod oriented_range;
mod os_utils;
mod platform;
mod read_group_stats;
mod read_pair;
mod reordering_buffer;
mod run_stats;
mod vcf_utils;

use std::process;

use hhmmss::Hhmmss;
use log::{error, info};

use crate::cli::Commands;
use crate::discover::run_discover;
use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};
use crate::logger::setup_output_dir_and_logger;

/// Run system configuration steps prior to starting any other program logic
///
fn system_configuration_prelude() {
    os_utils::attempt_max_open_file_limit();
}

fn run(settings: &cli::Settings) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting {PROGRAM_NAME} {PROGRAM_VERSION}");
    info!(
        "cmdline: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    );
    info!("Running on {} threads", settings.shared.thread_count);

    let start = std::time::Instant::now();

    match &settings.command {
        Commands::Discover(x) => {
            run_discover(&settings.shared, x)?;
        }
    }

    info!(
        "{PROGRAM_NAME} completed. Total Runtime: {}",
        start.elapsed().hhmmssxxx()
    );
    Ok(())
}

fn main() {
    system_configuration_prelude();

    let settings = cli::validate_and_fix_settings(cli::parse_settings());

    // Setup logger, including creation of the output directory for the log file:
    setup_output_dir_and_logger(
        settings.get_output_dir(),
        settings.shared.clobber,
        settings.shared.debug,
    );

    if let Err(err) = run(&settings) {
        error!("{err}");
        process::exit(exitcode::DATAERR);
    }
}
