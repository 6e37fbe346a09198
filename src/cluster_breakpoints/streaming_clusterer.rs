use std::collections::BTreeMap;

use serde::Serialize;

use super::discordant_cluster::DiscordantCluster;
use crate::breakpoint_constraint::BreakpointConstraint;
use crate::log_utils::debug_msg;

pub struct ClusteringSettings {
    /// Minimum number of supporting read pairs required to emit a cluster
    pub min_support_depth: usize,

    /// If true, only emit clusters where all member constraints share a common breakpoint
    pub intersection_only: bool,
}

#[derive(Clone, Default, Serialize)]
pub struct ClusteringStats {
    pub constraints_processed: usize,
    pub clusters_created: usize,

    /// Number of times a constraint bridged two or more existing clusters
    pub cluster_merge_events: usize,

    pub clusters_flushed: usize,
    pub clusters_emitted: usize,
    pub inconsistent_clusters_emitted: usize,
    pub clusters_discarded: usize,
    pub max_active_clusters: usize,
}

/// A flushed cluster which passed all emission filters
///
pub struct EmittedCluster {
    /// Sequential id of the emitted cluster, starting from 1
    pub id: usize,
    pub cluster: DiscordantCluster,
}

impl EmittedCluster {
    /// Constraint describing the breakpoint, either the cluster intersection or its union
    ///
    pub fn consensus(&self) -> &BreakpointConstraint {
        self.cluster
            .intersection()
            .unwrap_or_else(|| self.cluster.union())
    }

    /// True if the union had to be used because no common breakpoint exists for all members
    ///
    pub fn is_inconsistent(&self) -> bool {
        !self.cluster.is_consistent()
    }
}

/// Key for open clusters, ordered by flush position and then creation order
type ActiveClusterKey = (i64, usize);

/// Single-pass clustering of breakpoint constraints
///
/// Constraints must be provided in non-decreasing order of their x axis lower bound. The engine
/// keeps the set of open clusters ordered on flush position, so that clusters which can no longer
/// receive a matching constraint are found at the front of the set.
///
pub struct StreamingClusterer {
    settings: ClusteringSettings,

    /// Largest fragment gap over all read groups, assigned to each new cluster
    max_variation: i64,

    active: BTreeMap<ActiveClusterKey, DiscordantCluster>,
    next_cluster_index: usize,
    next_emit_id: usize,
    stats: ClusteringStats,
}

impl StreamingClusterer {
    pub fn new(settings: ClusteringSettings, max_variation: i64) -> Self {
        assert!(settings.min_support_depth > 0);
        assert!(max_variation >= 0);
        Self {
            settings,
            max_variation,
            active: BTreeMap::new(),
            next_cluster_index: 0,
            next_emit_id: 1,
            stats: ClusteringStats::default(),
        }
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn stats(&self) -> &ClusteringStats {
        &self.stats
    }

    fn insert_cluster(&mut self, cluster_index: usize, cluster: DiscordantCluster) {
        self.active
            .insert((cluster.flush_position(), cluster_index), cluster);
        self.stats.max_active_clusters =
            std::cmp::max(self.stats.max_active_clusters, self.active.len());
    }

    /// Add one constraint to the open cluster set
    ///
    /// The constraint is added to the single cluster it belongs to, or starts a new cluster if it
    /// belongs to none. If it belongs to several clusters, these are all merged together with the
    /// new constraint.
    ///
    pub fn process_constraint(&mut self, constraint: BreakpointConstraint) {
        let debug = false;
        self.stats.constraints_processed += 1;

        let mut matches = self
            .active
            .iter()
            .filter(|(_, cluster)| cluster.belongs(&constraint))
            .map(|(key, _)| *key)
            .collect::<Vec<_>>();

        if matches.is_empty() {
            debug_msg!(debug, "Starting new cluster from {constraint:?}");
            let cluster_index = self.next_cluster_index;
            self.next_cluster_index += 1;
            self.stats.clusters_created += 1;
            self.insert_cluster(
                cluster_index,
                DiscordantCluster::new(constraint, self.max_variation),
            );
            return;
        }

        // Merge into the oldest matching cluster so that member order follows cluster creation
        matches.sort_by_key(|(_, cluster_index)| *cluster_index);
        if matches.len() > 1 {
            debug_msg!(
                debug,
                "Constraint {constraint:?} bridges {} clusters",
                matches.len()
            );
            self.stats.cluster_merge_events += 1;
        }

        let mut matched_clusters = matches.iter().filter_map(|key| self.active.remove(key));
        let Some(mut cluster) = matched_clusters.next() else {
            unreachable!("Matched cluster missing from the active set");
        };
        for other in matched_clusters {
            cluster.absorb(other);
        }
        cluster.add(constraint);

        let (_, cluster_index) = matches[0];
        self.insert_cluster(cluster_index, cluster);
    }

    /// Flush all open clusters which can't be extended by a constraint at or after `scan_pos`
    ///
    /// Returns flushed clusters which pass the emission filters.
    ///
    pub fn flush(&mut self, scan_pos: i64) -> Vec<EmittedCluster> {
        let mut emitted = Vec::new();
        while let Some(entry) = self.active.first_entry() {
            let (flush_pos, _) = *entry.key();
            if flush_pos > scan_pos {
                break;
            }
            let cluster = entry.remove();
            self.emit_filter(cluster, &mut emitted);
        }
        emitted
    }

    /// Flush all open clusters unconditionally
    ///
    /// This is used at the end of each reference sequence.
    ///
    pub fn finish(&mut self) -> Vec<EmittedCluster> {
        let mut emitted = Vec::new();
        let active = std::mem::take(&mut self.active);
        for cluster in active.into_values() {
            self.emit_filter(cluster, &mut emitted);
        }
        emitted
    }

    fn emit_filter(&mut self, cluster: DiscordantCluster, emitted: &mut Vec<EmittedCluster>) {
        let debug = false;
        self.stats.clusters_flushed += 1;

        let is_emitted = cluster.count() >= self.settings.min_support_depth
            && (cluster.is_consistent() || !self.settings.intersection_only);
        if !is_emitted {
            self.stats.clusters_discarded += 1;
            return;
        }

        debug_msg!(debug, "Emitting cluster {cluster:?}");
        self.stats.clusters_emitted += 1;
        if !cluster.is_consistent() {
            self.stats.inconsistent_clusters_emitted += 1;
        }
        emitted.push(EmittedCluster {
            id: self.next_emit_id,
            cluster,
        });
        self.next_emit_id += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakpoint_constraint::GaussianBelief;
    use crate::breakpoint_region::tests::region;
    use crate::cluster_breakpoints::discordant_cluster::tests::uu_constraint;
    use crate::orientation::Orientation;

    fn get_clusterer(min_support_depth: usize, intersection_only: bool) -> StreamingClusterer {
        StreamingClusterer::new(
            ClusteringSettings {
                min_support_depth,
                intersection_only,
            },
            300,
        )
    }

    #[test]
    fn test_cluster_scenario() {
        let mut clusterer = get_clusterer(2, false);
        clusterer.process_constraint(uu_constraint((100, 140), (200, 240), (310, 370)));
        clusterer.process_constraint(uu_constraint((110, 150), (205, 245), (320, 380)));
        clusterer.process_constraint(uu_constraint((120, 160), (210, 250), (340, 400)));
        assert_eq!(clusterer.active_count(), 1);

        clusterer.process_constraint(uu_constraint((500, 540), (210, 250), (720, 780)));
        assert_eq!(clusterer.active_count(), 2);

        let emitted = clusterer.finish();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].id, 1);
        assert_eq!(emitted[0].cluster.count(), 3);
        assert!(!emitted[0].is_inconsistent());
        assert_eq!(clusterer.active_count(), 0);

        let stats = clusterer.stats();
        assert_eq!(stats.clusters_created, 2);
        assert_eq!(stats.clusters_emitted, 1);
        assert_eq!(stats.clusters_discarded, 1);
    }

    #[test]
    fn test_flush_timing() {
        let mut clusterer = get_clusterer(1, false);
        clusterer.process_constraint(uu_constraint((100, 140), (200, 240), (310, 370)));

        assert!(clusterer.flush(300).is_empty());
        assert!(clusterer.flush(439).is_empty());
        assert_eq!(clusterer.active_count(), 1);

        let emitted = clusterer.flush(440);
        assert_eq!(emitted.len(), 1);
        assert_eq!(clusterer.active_count(), 0);
    }

    #[test]
    fn test_flush_key_follows_cluster_growth() {
        let mut clusterer = get_clusterer(1, false);
        clusterer.process_constraint(uu_constraint((100, 140), (200, 240), (310, 370)));
        clusterer.process_constraint(uu_constraint((120, 160), (210, 250), (340, 400)));

        // The union now ends at 160, so the cluster stays open past 440
        assert!(clusterer.flush(440).is_empty());
        assert_eq!(clusterer.flush(460).len(), 1);
    }

    /// Build a DD chr1/chr2 constraint, the x and y ranges are given high to low
    fn dd_constraint(x: (i64, i64), y: (i64, i64), r: (i64, i64)) -> BreakpointConstraint {
        BreakpointConstraint::new(
            region(Orientation::DownDown, "chr1", "chr2", x, y, r),
            GaussianBelief::new((r.0 + r.1) as f64 / 2.0, 20.0),
        )
    }

    #[test]
    fn test_flush_timing_down_axis() {
        let mut clusterer = get_clusterer(2, false);
        clusterer.process_constraint(dd_constraint((140, 100), (240, 200), (-370, -310)));
        clusterer.process_constraint(dd_constraint((150, 110), (245, 205), (-385, -325)));
        clusterer.process_constraint(dd_constraint((160, 120), (250, 210), (-400, -340)));
        assert_eq!(clusterer.active_count(), 1);

        // The union x range covers 101-160, so the flush position is 160 + 1 + 300
        assert!(clusterer.flush(160).is_empty());
        assert!(clusterer.flush(460).is_empty());
        assert_eq!(clusterer.active_count(), 1);

        let emitted = clusterer.flush(461);
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].cluster.count(), 3);
        assert!(!emitted[0].is_inconsistent());
        assert_eq!(emitted[0].consensus().region.x_range().max_pos(), 140);
        assert_eq!(clusterer.active_count(), 0);
    }

    /// Three constraints where the last one bridges two unrelated clusters
    fn bridged_constraints() -> Vec<BreakpointConstraint> {
        vec![
            uu_constraint((100, 140), (200, 240), (310, 370)),
            uu_constraint((110, 150), (400, 440), (520, 580)),
            uu_constraint((120, 160), (220, 420), (350, 560)),
        ]
    }

    #[test]
    fn test_bridging_constraint_merges_clusters() {
        let mut clusterer = get_clusterer(2, false);
        let mut constraints = bridged_constraints().into_iter();
        clusterer.process_constraint(constraints.next().unwrap());
        clusterer.process_constraint(constraints.next().unwrap());
        assert_eq!(clusterer.active_count(), 2);

        clusterer.process_constraint(constraints.next().unwrap());
        assert_eq!(clusterer.active_count(), 1);
        assert_eq!(clusterer.stats().cluster_merge_events, 1);

        let emitted = clusterer.finish();
        assert_eq!(emitted.len(), 1);
        let cluster = &emitted[0].cluster;
        assert_eq!(cluster.count(), 3);
        assert_eq!(cluster.members()[0].region.x_lo(), 100);
        assert!(emitted[0].is_inconsistent());
        assert_eq!(emitted[0].consensus().region, cluster.union().region);
        assert_eq!(clusterer.stats().inconsistent_clusters_emitted, 1);
    }

    #[test]
    fn test_intersection_only() {
        let mut clusterer = get_clusterer(2, true);
        for c in bridged_constraints() {
            clusterer.process_constraint(c);
        }
        assert!(clusterer.finish().is_empty());
        assert_eq!(clusterer.stats().clusters_discarded, 1);
    }
}
