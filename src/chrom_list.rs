use std::collections::HashMap;
use std::sync::Arc;

use rust_htslib::bam;

pub struct ChromInfo {
    /// Shared label, used as the axis name of all breakpoint regions on this chromosome
    pub label: Arc<str>,
    pub length: u64,
}

/// Reference sequence list, in alignment file header order
///
#[derive(Default)]
pub struct ChromList {
    pub data: Vec<ChromInfo>,
    pub label_to_index: HashMap<String, usize>,
}

impl ChromList {
    pub fn add_chrom(&mut self, label: &str, length: u64) {
        let chrom_index = self.data.len();
        self.data.push(ChromInfo {
            label: Arc::from(label),
            length,
        });
        self.label_to_index.insert(label.to_string(), chrom_index);
    }

    pub fn from_bam_header(header: &bam::HeaderView) -> Self {
        let mut chrom_list = Self::default();
        for (tid, name) in header.target_names().iter().enumerate() {
            let label = String::from_utf8_lossy(name);
            let length = header.target_len(tid as u32).unwrap_or(0);
            chrom_list.add_chrom(&label, length);
        }
        chrom_list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_htslib::bam::{Header, HeaderView, header};

    #[test]
    fn test_from_bam_header() {
        let mut header = Header::new();
        for (label, length) in [("chr1", 1000), ("chr2", 500)] {
            header.push_record(
                header::HeaderRecord::new(b"SQ")
                    .push_tag(b"SN", label)
                    .push_tag(b"LN", length),
            );
        }
        let header = HeaderView::from_header(&header);
        let chrom_list = ChromList::from_bam_header(&header);
        assert_eq!(chrom_list.data.len(), 2);
        assert_eq!(&*chrom_list.data[1].label, "chr2");
        assert_eq!(chrom_list.data[1].length, 500);
        assert_eq!(chrom_list.label_to_index.get("chr1"), Some(&0));
    }
}
