//! Streaming clustering of read pair breakpoint constraints
//!

pub(crate) mod discordant_cluster;
mod streaming_clusterer;

pub use discordant_cluster::DiscordantCluster;
pub use streaming_clusterer::*;
