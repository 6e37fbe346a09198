pub const MIN_SUPPORT_DEPTH: usize = 2;

pub const REORDER_WINDOW: i64 = 100_000;

pub const MIN_MAPQ: u32 = 10;

/// Fraction of each read's aligned span assumed to possibly extend past the breakpoint
pub const READ_OVERLAP_FRACTION: f64 = 0.1;

pub const DEFAULT_PLATFORM: &str = "ILLUMINA";
