//! Per read group fragment gap statistics
//!
//! The fragment gap is the unsequenced distance between the breakpoint-adjacent ends of the two
//! reads of a pair. Its distribution is estimated outside of pairbreak and provided as a JSON
//! object keyed on read group id:
//!
//! ```json
//! {
//!   "rg1": {"gap_min": -20, "gap_mean": 180.0, "gap_max": 600, "fragment_std_dev": 60.0}
//! }
//! ```
//!

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};

use camino::Utf8Path;
use log::info;
use serde::{Deserialize, Serialize};
use simple_error::{SimpleResult, bail, try_with};

/// Read group id used for alignment records without an RG tag
pub const UNGROUPED_READ_GROUP_ID: &str = "*";

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ReadGroupGapStats {
    pub gap_min: i64,
    pub gap_mean: f64,
    pub gap_max: i64,
    pub fragment_std_dev: f64,
}

impl ReadGroupGapStats {
    fn validate(&self, read_group: &str) -> SimpleResult<()> {
        if self.gap_max < 1 {
            bail!(
                "Read group '{read_group}' gap_max must be positive, found {}",
                self.gap_max
            );
        }
        if self.gap_min >= self.gap_max {
            bail!(
                "Read group '{read_group}' gap_min ({}) must be less than gap_max ({})",
                self.gap_min,
                self.gap_max
            );
        }
        let mean_floor = std::cmp::max(self.gap_min, 0) as f64;
        if !(self.gap_mean.is_finite()
            && self.gap_mean > mean_floor
            && self.gap_mean < self.gap_max as f64)
        {
            bail!(
                "Read group '{read_group}' gap_mean ({}) must fall strictly between {} and gap_max ({})",
                self.gap_mean,
                mean_floor,
                self.gap_max
            );
        }
        if !(self.fragment_std_dev.is_finite() && self.fragment_std_dev > 0.0) {
            bail!(
                "Read group '{read_group}' fragment_std_dev must be positive, found {}",
                self.fragment_std_dev
            );
        }
        Ok(())
    }
}

/// Gap statistics for every read group in the alignment input
///
#[derive(Default)]
pub struct ReadGroupStatsMap {
    data: BTreeMap<String, ReadGroupGapStats>,
}

impl ReadGroupStatsMap {
    pub fn from_map(data: BTreeMap<String, ReadGroupGapStats>) -> SimpleResult<Self> {
        if data.is_empty() {
            bail!("No read group statistics found");
        }
        for (read_group, stats) in data.iter() {
            stats.validate(read_group)?;
        }
        Ok(Self { data })
    }

    pub fn from_reader<R: Read>(reader: R) -> SimpleResult<Self> {
        let data = try_with!(
            serde_json::from_reader(reader),
            "Unable to parse read group statistics json"
        );
        Self::from_map(data)
    }

    pub fn from_json_file(filename: &Utf8Path) -> SimpleResult<Self> {
        info!("Reading read group statistics from file: '{filename}'");
        let file = try_with!(
            File::open(filename),
            "Unable to open read group statistics file: '{filename}'"
        );
        let stats_map = try_with!(
            Self::from_reader(BufReader::new(file)),
            "Invalid read group statistics file: '{filename}'"
        );
        info!("Read statistics for {} read groups", stats_map.len());
        Ok(stats_map)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Get statistics for one read group, or an error naming the missing read group
    ///
    pub fn get(&self, read_group: &str) -> SimpleResult<&ReadGroupGapStats> {
        match self.data.get(read_group) {
            Some(x) => Ok(x),
            None => bail!("No fragment gap statistics provided for read group '{read_group}'"),
        }
    }

    /// Largest gap over all read groups
    ///
    pub fn max_gap(&self) -> i64 {
        self.data.values().map(|x| x.gap_max).max().unwrap_or(0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::{Seek, SeekFrom, Write};

    pub(crate) fn get_test_gap_stats() -> ReadGroupGapStats {
        ReadGroupGapStats {
            gap_min: -20,
            gap_mean: 150.0,
            gap_max: 300,
            fragment_std_dev: 40.0,
        }
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"rg1": {{"gap_min": -20, "gap_mean": 150.0, "gap_max": 300, "fragment_std_dev": 40.0}},
                "rg2": {{"gap_min": 0, "gap_mean": 400.0, "gap_max": 1000, "fragment_std_dev": 90.0}}}}"#
        )
        .unwrap();
        file.as_file_mut().seek(SeekFrom::Start(0)).unwrap();

        let path = Utf8Path::from_path(file.path()).unwrap();
        let stats_map = ReadGroupStatsMap::from_json_file(path).unwrap();
        assert_eq!(stats_map.len(), 2);
        assert_eq!(stats_map.get("rg1").unwrap(), &get_test_gap_stats());
        assert_eq!(stats_map.max_gap(), 1000);
    }

    #[test]
    fn test_missing_read_group() {
        let mut data = BTreeMap::new();
        data.insert("rg1".to_string(), get_test_gap_stats());
        let stats_map = ReadGroupStatsMap::from_map(data).unwrap();
        let err = stats_map.get("rg9").unwrap_err();
        assert!(err.as_str().contains("rg9"));
    }

    #[test]
    fn test_invalid_stats() {
        let mut stats = get_test_gap_stats();
        stats.fragment_std_dev = 0.0;
        assert!(stats.validate("rg1").is_err());

        let mut stats = get_test_gap_stats();
        stats.gap_mean = 300.0;
        assert!(stats.validate("rg1").is_err());

        let mut stats = get_test_gap_stats();
        stats.gap_min = 400;
        assert!(stats.validate("rg1").is_err());

        assert!(ReadGroupStatsMap::from_map(BTreeMap::new()).is_err());
    }
}
