//! Sorted output of emitted breakpoint clusters
//!
//! Clusters leave the clustering engine in flush order, which is close to but not exactly
//! genome order. Each output file is fed through its own reordering buffer.
//!

use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;
use log::{info, warn};
use rust_htslib::bcf;
use serde::Serialize;
use unwrap::unwrap;

use crate::breakpoint_constraint::BreakpointConstraint;
use crate::breakpoint_position::{BreakpointPosition, estimate_breakpoint_position};
use crate::chrom_list::ChromList;
use crate::cluster_breakpoints::EmittedCluster;
use crate::orientation::{AxisDirection, Orientation};
use crate::reordering_buffer::{ReorderRecord, ReorderingBuffer};
use crate::vcf_utils;

pub const CANDIDATE_SV_FILENAME: &str = "candidate.sv.vcf.gz";
pub const CLUSTER_BED_FILENAME: &str = "clusters.bed";
pub const CLUSTER_MEMBERS_FILENAME: &str = "debug.cluster_members.tsv";

const INCONSISTENT_FILTER_LABEL: &str = "InconsistentConsensus";

fn get_cluster_id_label(id: usize) -> String {
    format!("{}_{id}", crate::globals::PROGRAM_NAME)
}

/// Breakend ALT allele for a cluster, given the orientation and the 1-indexed mate position
///
/// The bracket direction follows the mate axis direction, and the side of the reference base
/// follows the primary axis direction.
///
fn get_bnd_alt_allele(
    orientation: Orientation,
    ref_base: &str,
    mate_chrom: &str,
    mate_pos: i64,
) -> String {
    let bracket = match orientation.y_dir() {
        AxisDirection::Up => ']',
        AxisDirection::Down => '[',
    };
    let mate_locus = format!("{bracket}{mate_chrom}:{mate_pos}{bracket}");
    match orientation.x_dir() {
        AxisDirection::Up => format!("{ref_base}{mate_locus}"),
        AxisDirection::Down => format!("{mate_locus}{ref_base}"),
    }
}

/// Cluster summary shared by the VCF and BED outputs
///
struct ClusterSummary {
    id: usize,
    chrom_index: usize,
    chrom: Arc<str>,
    mate_chrom: Arc<str>,
    orientation: Orientation,
    bpos: BreakpointPosition,
    pair_count: usize,
    is_inconsistent: bool,
}

impl ClusterSummary {
    fn new(chrom_list: &ChromList, emitted: &EmittedCluster) -> Self {
        let consensus = emitted.consensus();
        let region = &consensus.region;
        let chrom_index = chrom_list.label_to_index[emitted.cluster.sequence_name()];
        let chrom = region.x_axis_id().clone();
        Self {
            id: emitted.id,
            chrom_index,
            chrom,
            mate_chrom: Arc::from(region.y_axis()),
            orientation: region.orientation(),
            bpos: estimate_breakpoint_position(consensus),
            pair_count: emitted.cluster.count(),
            is_inconsistent: emitted.is_inconsistent(),
        }
    }
}

struct ClusterVcfRecord(Arc<ClusterSummary>);

impl ReorderRecord for ClusterVcfRecord {
    fn reference_name(&self) -> &str {
        &self.0.chrom
    }

    fn position(&self) -> i64 {
        self.0.bpos.position
    }
}

struct ClusterBedRecord(Arc<ClusterSummary>);

impl ReorderRecord for ClusterBedRecord {
    fn reference_name(&self) -> &str {
        &self.0.chrom
    }

    fn position(&self) -> i64 {
        self.0.bpos.lo
    }
}

struct ClusterMemberRecord {
    cluster_id: usize,
    chrom_index: usize,
    member: BreakpointConstraint,
}

impl ReorderRecord for ClusterMemberRecord {
    fn reference_name(&self) -> &str {
        self.member.region.x_axis()
    }

    fn position(&self) -> i64 {
        self.member.region.x_range().min_pos()
    }
}

fn get_vcf_header(chrom_list: &ChromList) -> bcf::Header {
    let mut header = vcf_utils::get_basic_vcf_header(chrom_list);

    // The `PASS` and `.` FILTER records are not typically included in the header, but htslib
    // requires them to be present, and ordered before INFO, when creating a vcf.
    //
    let inconsistent_filter = format!(
        "##FILTER=<ID={INCONSISTENT_FILTER_LABEL},Description=\"No single breakpoint region is shared by all read pairs in the cluster\">"
    );
    let records: Vec<&[u8]> = vec![
        br#"##FILTER=<ID=PASS,Description="All filters passed">"#,
        br#"##FILTER=<ID=.,Description="Unknown filtration status">"#,
        inconsistent_filter.as_bytes(),
        br#"##INFO=<ID=SVTYPE,Number=1,Type=String,Description="Type of structural variant">"#,
        br#"##INFO=<ID=IMPRECISE,Number=0,Type=Flag,Description="Imprecise structural variation">"#,
        br#"##INFO=<ID=CIPOS,Number=2,Type=Integer,Description="Confidence interval around POS for imprecise variants">"#,
        br#"##INFO=<ID=PAIR_COUNT,Number=1,Type=Integer,Description="Number of discordant read pairs supporting the breakpoint">"#,
    ];
    for x in records.into_iter() {
        header.push_record(x);
    }
    header
}

fn write_vcf_record(vcf: &mut bcf::Writer, summary: &ClusterSummary) {
    const REF_BASE: &str = "N";

    let bpos = &summary.bpos;
    let mut record = vcf.empty_record();
    record.set_rid(Some(summary.chrom_index as u32));
    record.set_pos(bpos.position);
    record
        .set_id(get_cluster_id_label(summary.id).as_bytes())
        .unwrap();

    let alt_allele = get_bnd_alt_allele(
        summary.orientation,
        REF_BASE,
        &summary.mate_chrom,
        bpos.position_alt + 1,
    );
    record
        .set_alleles(&[REF_BASE.as_bytes(), alt_allele.as_bytes()])
        .unwrap();

    if summary.is_inconsistent {
        record
            .push_filter(INCONSISTENT_FILTER_LABEL.as_bytes())
            .unwrap();
    } else {
        record.push_filter("PASS".as_bytes()).unwrap();
    }

    record
        .push_info_string(b"SVTYPE", &["BND".as_bytes()])
        .unwrap();
    record.push_info_flag(b"IMPRECISE").unwrap();
    let cipos = [
        (bpos.lo - bpos.position) as i32,
        (bpos.hi - bpos.position) as i32,
    ];
    record.push_info_integer(b"CIPOS", &cipos).unwrap();
    record
        .push_info_integer(b"PAIR_COUNT", &[summary.pair_count as i32])
        .unwrap();

    unwrap!(vcf.write(&record), "Unable to write candidate SV vcf record");
}

/// Write one bed line in IGV gffTags format, so that the name column is displayed as multiple
/// key/value pairs
///
fn write_bed_record(f: &mut impl Write, summary: &ClusterSummary) {
    let bpos = &summary.bpos;
    let name_tags = [
        ("Name", get_cluster_id_label(summary.id)),
        ("Orientation", summary.orientation.label()),
        (
            "MateLocus",
            format!("{}:{}", summary.mate_chrom, bpos.position_alt + 1),
        ),
        ("PairCount", summary.pair_count.to_string()),
        ("Consistent", (!summary.is_inconsistent).to_string()),
    ];
    let name = name_tags
        .iter()
        .map(|(key, val)| format!("{key}={val}"))
        .join(";");
    unwrap!(
        writeln!(f, "{}\t{}\t{}\t{name}", summary.chrom, bpos.lo, bpos.hi + 1),
        "Unable to write cluster bed record"
    );
}

fn write_member_record(f: &mut impl Write, rec: &ClusterMemberRecord) {
    let region = &rec.member.region;
    let belief = &rec.member.belief;
    unwrap!(
        writeln!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.2}\t{:.2}",
            get_cluster_id_label(rec.cluster_id),
            region.x_axis(),
            region.orientation(),
            region.x_lo(),
            region.x_hi(),
            region.y_axis(),
            region.y_lo(),
            region.y_hi(),
            region.r_lo(),
            region.r_hi(),
            region.x_range().min_pos(),
            belief.mean,
            belief.std_dev,
        ),
        "Unable to write cluster member record"
    );
}

fn create_text_file(filename: &Utf8Path, label: &str) -> BufWriter<File> {
    info!("Writing {label} to file: '{filename}'");
    let f = unwrap!(
        File::create(filename),
        "Unable to create {label} file: '{filename}'"
    );
    BufWriter::new(f)
}

/// Count of records dropped by each output's reordering buffer
///
#[derive(Clone, Default, Serialize)]
pub struct ReorderFailureCounts {
    pub vcf: usize,
    pub bed: usize,
    pub cluster_members: Option<usize>,
}

impl ReorderFailureCounts {
    pub fn total(&self) -> usize {
        self.vcf + self.bed + self.cluster_members.unwrap_or(0)
    }
}

/// All cluster output files, each written through a reordering buffer
///
pub struct ClusterOutput<'a> {
    chrom_list: &'a ChromList,
    vcf_filename: Utf8PathBuf,
    vcf_buffer: ReorderingBuffer<'a, ClusterVcfRecord>,
    bed_buffer: ReorderingBuffer<'a, ClusterBedRecord>,
    member_buffer: Option<ReorderingBuffer<'a, ClusterMemberRecord>>,
}

impl<'a> ClusterOutput<'a> {
    /// # Arguments
    /// * `reorder_window` - Maximum distance a record can be behind the furthest position seen on
    ///   its chromosome and still be written in sorted order
    /// * `debug_output` - If true, also write the diagnostic cluster member table
    ///
    pub fn new(
        output_dir: &Utf8Path,
        chrom_list: &'a ChromList,
        reorder_window: i64,
        debug_output: bool,
    ) -> Self {
        let vcf_filename = output_dir.join(CANDIDATE_SV_FILENAME);
        info!("Writing candidate structural variants to file: '{vcf_filename}'");
        let header = get_vcf_header(chrom_list);
        let mut vcf = unwrap!(
            bcf::Writer::from_path(&vcf_filename, &header, false, bcf::Format::Vcf),
            "Unable to create candidate SV vcf file: '{vcf_filename}'"
        );
        let vcf_buffer = ReorderingBuffer::new(
            reorder_window,
            Box::new(|a: &ClusterVcfRecord, b: &ClusterVcfRecord| {
                let (a, b) = (&a.0, &b.0);
                (a.chrom_index, a.bpos.position, a.id).cmp(&(b.chrom_index, b.bpos.position, b.id))
            }),
            Box::new(move |rec: ClusterVcfRecord| write_vcf_record(&mut vcf, &rec.0)),
            Box::new(|rec: ClusterVcfRecord| {
                warn!(
                    "Dropping out of order vcf record {} at {}:{}",
                    get_cluster_id_label(rec.0.id),
                    rec.0.chrom,
                    rec.0.bpos.position + 1
                )
            }),
        );

        let mut bed = create_text_file(&output_dir.join(CLUSTER_BED_FILENAME), "cluster bed");
        unwrap!(writeln!(bed, "#gffTags"), "Unable to write cluster bed header");
        let bed_buffer = ReorderingBuffer::new(
            reorder_window,
            Box::new(|a: &ClusterBedRecord, b: &ClusterBedRecord| {
                let (a, b) = (&a.0, &b.0);
                (a.chrom_index, a.bpos.lo, a.bpos.hi, a.id)
                    .cmp(&(b.chrom_index, b.bpos.lo, b.bpos.hi, b.id))
            }),
            Box::new(move |rec: ClusterBedRecord| write_bed_record(&mut bed, &rec.0)),
            Box::new(|rec: ClusterBedRecord| {
                warn!(
                    "Dropping out of order bed record {} at {}:{}",
                    get_cluster_id_label(rec.0.id),
                    rec.0.chrom,
                    rec.0.bpos.lo
                )
            }),
        );

        let member_buffer = if debug_output {
            let mut f = create_text_file(
                &output_dir.join(CLUSTER_MEMBERS_FILENAME),
                "cluster member debug table",
            );
            unwrap!(
                writeln!(
                    f,
                    "#cluster_id\tx_axis\torientation\tx_lo\tx_hi\ty_axis\ty_lo\ty_hi\tr_lo\tr_hi\tx_min_pos\tgap_mean\tgap_std_dev"
                ),
                "Unable to write cluster member table header"
            );
            Some(ReorderingBuffer::new(
                reorder_window,
                Box::new(|a: &ClusterMemberRecord, b: &ClusterMemberRecord| {
                    (a.chrom_index, a.position(), a.cluster_id).cmp(&(
                        b.chrom_index,
                        b.position(),
                        b.cluster_id,
                    ))
                }),
                Box::new(move |rec: ClusterMemberRecord| write_member_record(&mut f, &rec)),
                Box::new(|rec: ClusterMemberRecord| {
                    warn!(
                        "Dropping out of order cluster member record from {} at {}:{}",
                        get_cluster_id_label(rec.cluster_id),
                        rec.reference_name(),
                        rec.position()
                    )
                }),
            ))
        } else {
            None
        };

        Self {
            chrom_list,
            vcf_filename,
            vcf_buffer,
            bed_buffer,
            member_buffer,
        }
    }

    pub fn vcf_filename(&self) -> &Utf8Path {
        &self.vcf_filename
    }

    pub fn add_clusters(&mut self, clusters: Vec<EmittedCluster>) {
        for emitted in clusters {
            let summary = Arc::new(ClusterSummary::new(self.chrom_list, &emitted));
            if let Some(member_buffer) = self.member_buffer.as_mut() {
                for member in emitted.cluster.members() {
                    member_buffer.add(ClusterMemberRecord {
                        cluster_id: emitted.id,
                        chrom_index: summary.chrom_index,
                        member: member.clone(),
                    });
                }
            }
            self.vcf_buffer.add(ClusterVcfRecord(summary.clone()));
            self.bed_buffer.add(ClusterBedRecord(summary));
        }
    }

    /// Flush all buffered records and close the output files
    ///
    pub fn close(self) -> ReorderFailureCounts {
        let counts = ReorderFailureCounts {
            vcf: self.vcf_buffer.close(),
            bed: self.bed_buffer.close(),
            cluster_members: self.member_buffer.map(|x| x.close()),
        };
        if counts.total() > 0 {
            warn!(
                "{} output records were dropped because they were too far out of order",
                counts.total()
            );
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakpoint_constraint::GaussianBelief;
    use crate::breakpoint_region::tests::region;
    use crate::cluster_breakpoints::DiscordantCluster;
    use crate::cluster_breakpoints::discordant_cluster::tests::uu_constraint;
    use rust_htslib::bcf::Read;

    fn get_test_chrom_list() -> ChromList {
        let mut chrom_list = ChromList::default();
        chrom_list.add_chrom("chr1", 10000);
        chrom_list.add_chrom("chr2", 10000);
        chrom_list
    }

    fn emitted(id: usize, c: BreakpointConstraint) -> EmittedCluster {
        EmittedCluster {
            id,
            cluster: DiscordantCluster::new(c, 300),
        }
    }

    #[test]
    fn test_bnd_alt_allele() {
        use Orientation::*;
        assert_eq!(get_bnd_alt_allele(UpDown, "N", "chr2", 100), "N[chr2:100[");
        assert_eq!(get_bnd_alt_allele(UpUp, "N", "chr2", 100), "N]chr2:100]");
        assert_eq!(get_bnd_alt_allele(DownUp, "N", "chr2", 100), "]chr2:100]N");
        assert_eq!(get_bnd_alt_allele(DownDown, "N", "chr2", 100), "[chr2:100[N");
    }

    #[test]
    fn test_cluster_output_files() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = Utf8Path::from_path(dir.path()).unwrap();
        let chrom_list = get_test_chrom_list();

        let mut output = ClusterOutput::new(output_dir, &chrom_list, 2000, true);

        // Emitted out of order, breakpoint estimates at 1120 and 120 on chr1
        let far = uu_constraint((1100, 1140), (200, 240), (1310, 1370));
        let near = uu_constraint((100, 140), (200, 240), (310, 370));
        output.add_clusters(vec![emitted(1, far), emitted(2, near)]);

        // Inconsistent cluster on chr2, flipped onto the other axis
        let mut cluster = DiscordantCluster::new(
            BreakpointConstraint::new(
                region(
                    Orientation::UpUp,
                    "chr2",
                    "chr1",
                    (500, 540),
                    (3000, 3040),
                    (3510, 3570),
                ),
                GaussianBelief::new(3540.0, 20.0),
            ),
            300,
        );
        cluster.add(BreakpointConstraint::new(
            region(
                Orientation::UpUp,
                "chr2",
                "chr1",
                (530, 570),
                (3030, 3070),
                (3590, 3630),
            ),
            GaussianBelief::new(3610.0, 20.0),
        ));
        output.add_clusters(vec![EmittedCluster { id: 3, cluster }]);

        let vcf_filename = output.vcf_filename().to_owned();
        let counts = output.close();
        assert_eq!(counts.total(), 0);
        assert_eq!(counts.cluster_members, Some(0));

        let bed = std::fs::read_to_string(output_dir.join(CLUSTER_BED_FILENAME)).unwrap();
        let bed_lines = bed.lines().collect::<Vec<_>>();
        assert_eq!(bed_lines.len(), 4);
        assert_eq!(bed_lines[0], "#gffTags");
        assert_eq!(
            bed_lines[1],
            "chr1\t100\t140\tName=pairbreak_2;Orientation=UU;MateLocus=chr2:221;PairCount=1;Consistent=true"
        );
        assert!(bed_lines[2].starts_with("chr1\t1100\t1140\tName=pairbreak_1;"));
        assert!(bed_lines[3].starts_with("chr2\t"));
        assert!(bed_lines[3].ends_with("PairCount=2;Consistent=false"));

        let members =
            std::fs::read_to_string(output_dir.join(CLUSTER_MEMBERS_FILENAME)).unwrap();
        assert_eq!(members.lines().count(), 5);

        let mut reader = bcf::Reader::from_path(&vcf_filename).unwrap();
        let records = reader
            .records()
            .map(|x| x.unwrap())
            .collect::<Vec<_>>();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id(), b"pairbreak_2");
        assert_eq!(records[0].pos(), 120);
        assert_eq!(records[0].alleles(), vec![&b"N"[..], &b"N]chr2:221]"[..]]);
        assert_eq!(records[1].id(), b"pairbreak_1");
        assert_eq!(records[2].rid(), Some(1));

        vcf_utils::build_bcf_index(&vcf_filename, 1, true).unwrap();
        assert!(output_dir.join(format!("{CANDIDATE_SV_FILENAME}.tbi")).exists());
    }

    #[test]
    fn test_out_of_order_record_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = Utf8Path::from_path(dir.path()).unwrap();
        let chrom_list = get_test_chrom_list();

        let mut output = ClusterOutput::new(output_dir, &chrom_list, 100, false);
        output.add_clusters(vec![emitted(
            1,
            uu_constraint((1100, 1140), (200, 240), (1310, 1370)),
        )]);
        output.add_clusters(vec![emitted(
            2,
            uu_constraint((100, 140), (200, 240), (310, 370)),
        )]);
        let counts = output.close();
        assert_eq!(counts.vcf, 1);
        assert_eq!(counts.bed, 1);
        assert_eq!(counts.cluster_members, None);
        assert!(!output_dir.join(CLUSTER_MEMBERS_FILENAME).exists());

        let bed = std::fs::read_to_string(output_dir.join(CLUSTER_BED_FILENAME)).unwrap();
        assert_eq!(bed.lines().count(), 2);
    }
}
