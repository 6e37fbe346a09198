use rust_htslib::bcf::header::Header;
use rust_htslib::{htslib, utils};
use simple_error::{SimpleResult, bail};

use crate::chrom_list::ChromList;
use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};

/// Get a new bcf header which is actually empty so that we can set our own version number
///
pub fn get_empty_bcf_header() -> Header {
    // Give the incorrect mode to htslib to prevent it from writing the wrong VCF version number.
    // As of 202409 htslib doesn't store the mode argument so this shouldn't break the output.
    //
    let mode = c"r";
    Header {
        inner: unsafe { htslib::bcf_hdr_init(mode.as_ptr()) },
        subset: None,
    }
}

/// Builds common fields into a sites-only VCF header, upon which more app specific details can
/// be added
///
pub fn get_basic_vcf_header(chrom_list: &ChromList) -> Header {
    let mut header = get_empty_bcf_header();
    header.push_record(b"##fileformat=VCFv4.4");

    let date_string = chrono::Local::now().format("%Y%m%d").to_string();
    header.push_record(format!("##fileDate={date_string}").as_bytes());
    header.push_record(format!("##source=\"{PROGRAM_NAME} {PROGRAM_VERSION}\"").as_bytes());
    let cmdline = std::env::args().collect::<Vec<_>>().join(" ");
    header.push_record(format!("##{PROGRAM_NAME}_cmdline=\"{cmdline}\"").as_bytes());

    for chrom_info in chrom_list.data.iter() {
        let header_contig_line = format!(
            "##contig=<ID={},length={}>",
            chrom_info.label, chrom_info.length
        );
        header.push_record(header_contig_line.as_bytes());
    }

    header
}

fn index_build_error_message(error: i32) -> &'static str {
    match error {
        -1 => "indexing failed",
        -2 => "opening @fn failed",
        -3 => "format not indexable",
        -4 => "failed to create and/or save the index",
        _ => "unknown error",
    }
}

/// Build index for bcf or vcf.gz file
///
/// # Arguments
/// * `bcf_path` - Path to bcf/vcf file for indexing
/// * `build_tbi` - If true build older tbi style index, otherwise build csi index
///
pub fn build_bcf_index<P: AsRef<std::path::Path>>(
    bcf_path: P,
    n_threads: usize,
    build_tbi: bool,
) -> SimpleResult<()> {
    let min_shift = if build_tbi { 0 } else { 14 };
    let bcf_path_cstr = match utils::path_to_cstring(&bcf_path) {
        Some(x) => x,
        None => bail!(
            "Can't convert variant file path for indexing: '{}'",
            bcf_path.as_ref().display()
        ),
    };
    let idx_path_ptr = std::ptr::null();
    let ret = unsafe {
        /*
         *  bcf_index_build3() - Generate and save an index to a specific file
         *  @fn:         Input VCF/BCF filename
         *  @fnidx:      Output filename, or NULL to add .csi/.tbi to @fn
         *  @min_shift:  Positive to generate CSI, or 0 to generate TBI
         *  @n_threads:  Number of VCF/BCF decoder threads
         *
         *  Returns 0 if successful, or negative if an error occurred.
         */
        htslib::bcf_index_build3(
            bcf_path_cstr.as_ptr(),
            idx_path_ptr,
            min_shift,
            n_threads as i32,
        )
    };
    if ret != 0 {
        bail!(
            "Failed to build index for variant file '{}'. Error: {ret}/{}",
            bcf_path.as_ref().display(),
            index_build_error_message(ret)
        );
    }
    Ok(())
}
