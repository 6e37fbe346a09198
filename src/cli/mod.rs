mod defaults;
mod discover;
mod shared;
mod utils;

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use simple_error::{SimpleResult, bail};

use self::discover::validate_and_fix_discover_settings;
pub use self::discover::{
    DiscoverSettings, validate_discover_settings_data, write_discover_settings,
};
use self::shared::validate_and_fix_shared_settings;
pub use self::shared::SharedSettings;

#[derive(Subcommand)]
pub enum Commands {
    /// Cluster discordant read pairs from one sample into SV breakpoint candidates
    Discover(DiscoverSettings),
}

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}"
)]
#[clap(propagate_version = true, rename_all = "kebab_case")]
pub struct Settings {
    #[command(flatten)]
    pub shared: SharedSettings,

    #[command(subcommand)]
    pub command: Commands,
}

impl Settings {
    pub fn get_output_dir(&self) -> &Utf8Path {
        match &self.command {
            Commands::Discover(x) => &x.output_dir,
        }
    }
}

/// Checks if a directory does not exist
///
pub fn check_novel_dirname(dirname: &Utf8Path, label: &str) -> SimpleResult<()> {
    if dirname.exists() {
        bail!("{label} already exists: \"{dirname}\"");
    }
    Ok(())
}

/// Validate settings and update parameters that can't be processed by clap
///
fn validate_and_fix_settings_impl(mut settings: Settings) -> SimpleResult<Settings> {
    settings.shared = validate_and_fix_shared_settings(settings.shared)?;

    settings.command = match settings.command {
        Commands::Discover(x) => {
            let x = validate_and_fix_discover_settings(x)?;
            Commands::Discover(x)
        }
    };

    Ok(settings)
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
pub fn validate_and_fix_settings(settings: Settings) -> Settings {
    match validate_and_fix_settings_impl(settings) {
        Ok(x) => x,
        Err(msg) => {
            eprintln!("Invalid command-line setting: {}", msg);
            std::process::exit(exitcode::USAGE);
        }
    }
}

pub fn parse_settings() -> Settings {
    Settings::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_discover_settings() {
        let settings = Settings::try_parse_from([
            "pairbreak",
            "--threads",
            "4",
            "discover",
            "--bam",
            "sample.bam",
            "--read-group-stats",
            "stats.json",
            "--library-orientation",
            "rf",
            "--intersection-only",
        ])
        .unwrap();
        assert!(!settings.shared.clobber);
        assert_eq!(settings.get_output_dir().as_str(), "pairbreak_discover_output");

        let Commands::Discover(x) = &settings.command;
        assert_eq!(x.bam_filename, "sample.bam");
        assert_eq!(x.min_support_depth, 2);
        assert_eq!(x.reorder_window, 100_000);
        assert_eq!(x.default_platform, "ILLUMINA");
        assert_eq!(
            x.library_orientation,
            Some(crate::platform::LibraryOrientation::Rf)
        );
        assert!(x.intersection_only);
        assert!(!x.debug_output);
    }
}
