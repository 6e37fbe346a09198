//! Alignment record utilities used to extract read pair evidence
//!

use rust_htslib::bam::{
    self,
    record::{Cigar, CigarString},
};
use serde::Serialize;

use crate::read_group_stats::UNGROUPED_READ_GROUP_ID;

const MATE_CIGAR_AUX_TAG: &[u8] = b"MC";
const MATE_MAPQ_AUX_TAG: &[u8] = b"MQ";
const READ_GROUP_AUX_TAG: &[u8] = b"RG";

/// Reasons an alignment record is not used as read pair evidence
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RecordFilterReason {
    NotPaired,
    Unmapped,
    MateUnmapped,
    Secondary,
    Supplementary,
    Duplicate,
    QcFail,
    LowMapq,
}

/// Count of filtered alignment records per filter reason
///
#[derive(Clone, Default, Serialize)]
pub struct RecordFilterCounts {
    pub not_paired: usize,
    pub unmapped: usize,
    pub mate_unmapped: usize,
    pub secondary: usize,
    pub supplementary: usize,
    pub duplicate: usize,
    pub qc_fail: usize,
    pub low_mapq: usize,
}

impl RecordFilterCounts {
    pub fn increment(&mut self, reason: RecordFilterReason) {
        use RecordFilterReason::*;
        let count = match reason {
            NotPaired => &mut self.not_paired,
            Unmapped => &mut self.unmapped,
            MateUnmapped => &mut self.mate_unmapped,
            Secondary => &mut self.secondary,
            Supplementary => &mut self.supplementary,
            Duplicate => &mut self.duplicate,
            QcFail => &mut self.qc_fail,
            LowMapq => &mut self.low_mapq,
        };
        *count += 1;
    }

    pub fn total(&self) -> usize {
        self.not_paired
            + self.unmapped
            + self.mate_unmapped
            + self.secondary
            + self.supplementary
            + self.duplicate
            + self.qc_fail
            + self.low_mapq
    }
}

/// True if either read of the pair has MAPQ below `min_mapq`
///
/// The mate MAPQ is only checked when the MQ tag is present.
///
fn is_low_mapq_pair(record: &bam::Record, min_mapq: u32) -> bool {
    if (record.mapq() as u32) < min_mapq {
        return true;
    }
    match get_optional_int_aux_tag(record, MATE_MAPQ_AUX_TAG) {
        Some(mate_mapq) => mate_mapq < min_mapq as i64,
        None => false,
    }
}

/// Find the first reason to skip this alignment record as read pair evidence, if any
///
pub fn get_record_filter_reason(record: &bam::Record, min_mapq: u32) -> Option<RecordFilterReason> {
    use RecordFilterReason::*;
    let reason = if !record.is_paired() {
        NotPaired
    } else if record.is_unmapped() {
        Unmapped
    } else if record.is_mate_unmapped() {
        MateUnmapped
    } else if record.is_secondary() {
        Secondary
    } else if record.is_supplementary() {
        Supplementary
    } else if record.is_duplicate() {
        Duplicate
    } else if record.is_quality_check_failed() {
        QcFail
    } else if is_low_mapq_pair(record, min_mapq) {
        LowMapq
    } else {
        return None;
    };
    Some(reason)
}

/// Length of the reference span of an alignment
///
pub fn get_cigar_ref_span(cigar: &[Cigar]) -> i64 {
    use Cigar::*;
    cigar
        .iter()
        .map(|c| match c {
            Match(len) | Del(len) | RefSkip(len) | Equal(len) | Diff(len) => *len as i64,
            Ins(_) | SoftClip(_) | HardClip(_) | Pad(_) => 0,
        })
        .sum()
}

/// The end reference position of a bam record
///
/// The end position is the zero-indexed right-most mapped position + 1
///
pub fn get_alignment_end(record: &bam::Record) -> i64 {
    record.pos() + get_cigar_ref_span(record.cigar().as_slice())
}

fn unexpected_aux_val_err(
    record: &bam::Record,
    aux_tag: &[u8],
    aux_val: bam::record::Aux<'_>,
) -> ! {
    let qname = String::from_utf8_lossy(record.qname());
    panic!(
        "Unexpected {} tag format in read {qname}: {:?}",
        String::from_utf8_lossy(aux_tag),
        aux_val,
    );
}

/// Retrieve a string aux tag from bam file
///
/// Function will panic if the tag has a non-string value
///
pub fn get_optional_string_aux_tag(record: &bam::Record, aux_tag: &[u8]) -> Option<String> {
    match record.aux(aux_tag) {
        Ok(aux_val) => Some(match aux_val {
            bam::record::Aux::String(val) => val.to_string(),
            _ => unexpected_aux_val_err(record, aux_tag, aux_val),
        }),
        _ => None,
    }
}

/// Retrieve an integer aux tag from bam file
///
/// Function will panic if the tag has a non-integer value
///
pub fn get_optional_int_aux_tag(record: &bam::Record, aux_tag: &[u8]) -> Option<i64> {
    use bam::record::Aux;
    match record.aux(aux_tag) {
        Ok(aux_val) => Some(match aux_val {
            Aux::I8(val) => val as i64,
            Aux::U8(val) => val as i64,
            Aux::I16(val) => val as i64,
            Aux::U16(val) => val as i64,
            Aux::I32(val) => val as i64,
            Aux::U32(val) => val as i64,
            _ => unexpected_aux_val_err(record, aux_tag, aux_val),
        }),
        _ => None,
    }
}

/// Read group of the alignment record, or the ungrouped id if the record has no RG tag
///
pub fn get_read_group(record: &bam::Record) -> String {
    get_optional_string_aux_tag(record, READ_GROUP_AUX_TAG)
        .unwrap_or_else(|| UNGROUPED_READ_GROUP_ID.to_string())
}

/// End position of the mate alignment, if the mate cigar is available from the MC tag
///
/// Function will panic if the MC tag is present but can't be parsed.
///
pub fn get_mate_alignment_end(record: &bam::Record) -> Option<i64> {
    let mate_cigar = get_optional_string_aux_tag(record, MATE_CIGAR_AUX_TAG)?;
    let mate_cigar = match CigarString::try_from(mate_cigar.as_str()) {
        Ok(x) => x,
        Err(e) => {
            let qname = String::from_utf8_lossy(record.qname());
            panic!("Unable to parse mate cigar string '{mate_cigar}' in read {qname}: {e}");
        }
    };
    Some(record.mpos() + get_cigar_ref_span(&mate_cigar.0))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_htslib::bam::{Header, HeaderView, header};

    pub(crate) fn get_test_header() -> HeaderView {
        let mut header = Header::new();
        for label in ["chr1", "chr2"] {
            header.push_record(
                header::HeaderRecord::new(b"SQ")
                    .push_tag(b"SN", label)
                    .push_tag(b"LN", 10000000),
            );
        }
        HeaderView::from_header(&header)
    }

    /// Build a record from a sam line with a 20 base read sequence
    ///
    pub(crate) fn get_test_record(header: &HeaderView, fields: &str) -> bam::Record {
        let sam_line = fields.replace(
            "SEQ\tQUAL",
            "ACGCCGTATCGTCTCGAGGA\tDDDDDEEEEEDDDDDEEEEE",
        );
        bam::Record::from_sam(header, sam_line.as_bytes()).unwrap()
    }

    #[test]
    fn test_get_record_filter_reason() {
        let header = get_test_header();

        let rec = get_test_record(
            &header,
            "qname\t99\tchr1\t1001\t60\t20M\t=\t1301\t320\tSEQ\tQUAL",
        );
        assert_eq!(get_record_filter_reason(&rec, 10), None);
        assert_eq!(
            get_record_filter_reason(&rec, 61),
            Some(RecordFilterReason::LowMapq)
        );

        // Mate unmapped
        let rec = get_test_record(
            &header,
            "qname\t73\tchr1\t1001\t60\t20M\t=\t1001\t0\tSEQ\tQUAL",
        );
        assert_eq!(
            get_record_filter_reason(&rec, 10),
            Some(RecordFilterReason::MateUnmapped)
        );

        // Duplicate
        let rec = get_test_record(
            &header,
            "qname\t1123\tchr1\t1001\t60\t20M\t=\t1301\t320\tSEQ\tQUAL",
        );
        assert_eq!(
            get_record_filter_reason(&rec, 10),
            Some(RecordFilterReason::Duplicate)
        );

        // Mate MAPQ from the MQ tag
        let rec = get_test_record(
            &header,
            "qname\t65\tchr1\t1001\t60\t20M\tchr2\t5001\t0\tSEQ\tQUAL\tMQ:i:0",
        );
        assert_eq!(
            get_record_filter_reason(&rec, 10),
            Some(RecordFilterReason::LowMapq)
        );
        assert_eq!(get_record_filter_reason(&rec, 0), None);

        let rec = get_test_record(
            &header,
            "qname\t65\tchr1\t1001\t60\t20M\tchr2\t5001\t0\tSEQ\tQUAL\tMQ:i:30",
        );
        assert_eq!(get_record_filter_reason(&rec, 10), None);
        assert_eq!(
            get_record_filter_reason(&rec, 31),
            Some(RecordFilterReason::LowMapq)
        );

        // Not paired
        let rec = get_test_record(&header, "qname\t0\tchr1\t1001\t60\t20M\t*\t0\t0\tSEQ\tQUAL");
        assert_eq!(
            get_record_filter_reason(&rec, 10),
            Some(RecordFilterReason::NotPaired)
        );
    }

    #[test]
    fn test_filter_counts() {
        let mut counts = RecordFilterCounts::default();
        counts.increment(RecordFilterReason::LowMapq);
        counts.increment(RecordFilterReason::LowMapq);
        counts.increment(RecordFilterReason::Secondary);
        assert_eq!(counts.low_mapq, 2);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_get_alignment_end() {
        let header = get_test_header();
        let rec = get_test_record(
            &header,
            "qname\t99\tchr1\t1001\t60\t5M100D3I12M\t=\t1301\t320\tSEQ\tQUAL",
        );
        assert_eq!(get_alignment_end(&rec), 1000 + 117);
    }

    #[test]
    fn test_mate_alignment_end() {
        let header = get_test_header();
        let rec = get_test_record(
            &header,
            "qname\t99\tchr1\t1001\t60\t20M\t=\t1301\t320\tSEQ\tQUAL\tMC:Z:10M50N10M\tRG:Z:rg1",
        );
        assert_eq!(get_mate_alignment_end(&rec), Some(1300 + 70));
        assert_eq!(get_read_group(&rec), "rg1");

        let rec = get_test_record(
            &header,
            "qname\t99\tchr1\t1001\t60\t20M\t=\t1301\t320\tSEQ\tQUAL",
        );
        assert_eq!(get_mate_alignment_end(&rec), None);
        assert_eq!(get_read_group(&rec), UNGROUPED_READ_GROUP_ID);
    }
}
