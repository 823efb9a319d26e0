use crate::utils::Result;
use rust_htslib::bam::{self, Read};
use std::path::Path;

pub fn get_bam_header(bam_path: &Path) -> Result<bam::Header> {
    let bam = bam::Reader::from_path(bam_path)
        .map_err(|e| format!("Failed to create bam reader: {}", e))?;
    Ok(bam::Header::from_template(bam.header()))
}

pub fn is_bam_mapped(bam_header: &bam::Header) -> bool {
    // Contig coordinates can only be resolved against @SQ lines
    String::from_utf8_lossy(&bam_header.to_bytes())
        .lines()
        .any(|line| line.starts_with("@SQ"))
}

pub fn is_bam_indexed(bam_path: &Path) -> bool {
    bam::IndexedReader::from_path(bam_path).is_ok()
}
