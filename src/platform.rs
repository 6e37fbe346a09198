//! Expected read pair orientation for each sequencing platform
//!

use std::collections::HashMap;

use clap::ValueEnum;
use log::{info, warn};
use rust_htslib::bam;
use serde::{Deserialize, Serialize};
use simple_error::{SimpleResult, bail};

use crate::orientation::{AxisDirection, Orientation};
use crate::read_group_stats::UNGROUPED_READ_GROUP_ID;

/// Relative strand orientation of the two reads from a normal library fragment
///
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LibraryOrientation {
    /// Forward-reverse, reads point toward each other
    Fr,

    /// Reverse-forward, reads point away from each other
    Rf,

    /// Forward-forward, both reads on the same strand
    Ff,
}

impl LibraryOrientation {
    /// Directions of the first and second reads in template when each is aligned to the forward
    /// strand, given as an orientation of (first read, second read)
    ///
    pub fn forward_strand_orientation(self) -> Orientation {
        match self {
            LibraryOrientation::Fr => Orientation::UpUp,
            LibraryOrientation::Rf => Orientation::DownDown,
            LibraryOrientation::Ff => Orientation::UpDown,
        }
    }

    /// Direction of a single read, given its template arm and strand
    ///
    pub fn read_direction(self, is_first_in_template: bool, is_reverse: bool) -> AxisDirection {
        let forward_orientation = self.forward_strand_orientation();
        let dir = if is_first_in_template {
            forward_orientation.x_dir()
        } else {
            forward_orientation.y_dir()
        };
        if is_reverse { dir.reverse() } else { dir }
    }
}

/// Look up the library orientation for a sequencing platform name, as found in the read group
/// PL tag
///
pub fn get_platform_library_orientation(platform: &str) -> SimpleResult<LibraryOrientation> {
    let orientation = match platform.to_ascii_uppercase().as_str() {
        "ILLUMINA" | "BGI" | "MGI" | "DNBSEQ" | "ELEMENT" | "ULTIMA" => LibraryOrientation::Fr,
        "SOLID" => LibraryOrientation::Ff,
        "LS454" => LibraryOrientation::Rf,
        _ => {
            bail!("Unrecognized sequencing platform: '{platform}'");
        }
    };
    Ok(orientation)
}

/// Read group id and optional platform from each @RG line of an alignment file header
///
pub fn get_header_read_groups(
    header: &bam::HeaderView,
) -> SimpleResult<Vec<(String, Option<String>)>> {
    let header_text = match std::str::from_utf8(header.as_bytes()) {
        Ok(x) => x,
        Err(_) => bail!("Alignment file header is not valid UTF-8"),
    };

    let mut read_groups = Vec::new();
    for line in header_text.lines() {
        let mut words = line.split('\t');
        if words.next() != Some("@RG") {
            continue;
        }
        let mut id = None;
        let mut platform = None;
        for word in words {
            if let Some(x) = word.strip_prefix("ID:") {
                id = Some(x.to_string());
            } else if let Some(x) = word.strip_prefix("PL:") {
                platform = Some(x.to_string());
            }
        }
        match id {
            Some(id) => read_groups.push((id, platform)),
            None => bail!("Alignment file header has an @RG line with no ID tag: '{line}'"),
        }
    }
    Ok(read_groups)
}

/// Library orientation for each read group in the alignment file
///
pub struct ReadGroupLibraryMap {
    data: HashMap<String, LibraryOrientation>,

    /// Orientation used for reads with no read group, or a read group missing from the header
    default_orientation: LibraryOrientation,
}

impl ReadGroupLibraryMap {
    /// # Arguments
    /// * `default_platform` - Platform assumed for read groups without a PL tag
    /// * `orientation_override` - If defined, this orientation is used for all read groups
    ///
    pub fn new(
        read_groups: &[(String, Option<String>)],
        default_platform: &str,
        orientation_override: Option<LibraryOrientation>,
    ) -> SimpleResult<Self> {
        let default_orientation = match orientation_override {
            Some(x) => x,
            None => get_platform_library_orientation(default_platform)?,
        };

        let mut data = HashMap::new();
        for (read_group, platform) in read_groups {
            let orientation = match (orientation_override, platform) {
                (Some(x), _) => x,
                (None, Some(platform)) => {
                    match get_platform_library_orientation(platform) {
                        Ok(x) => x,
                        Err(e) => bail!("Read group '{read_group}': {e}"),
                    }
                }
                (None, None) => {
                    warn!(
                        "Read group '{read_group}' has no platform tag, assuming platform '{default_platform}'"
                    );
                    default_orientation
                }
            };
            info!("Read group '{read_group}' library orientation: {orientation:?}");
            data.insert(read_group.clone(), orientation);
        }

        Ok(Self {
            data,
            default_orientation,
        })
    }

    pub fn from_bam_header(
        header: &bam::HeaderView,
        default_platform: &str,
        orientation_override: Option<LibraryOrientation>,
    ) -> SimpleResult<Self> {
        let read_groups = get_header_read_groups(header)?;
        Self::new(&read_groups, default_platform, orientation_override)
    }

    pub fn get(&self, read_group: &str) -> LibraryOrientation {
        if read_group == UNGROUPED_READ_GROUP_ID {
            return self.default_orientation;
        }
        self.data
            .get(read_group)
            .copied()
            .unwrap_or(self.default_orientation)
    }
}
