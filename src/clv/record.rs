//! Cleavage site keys and output records.
//!

use super::{hexamer::format_match, HexamerMatch, Strand};
use std::fmt;

/// Columns of an output row, in order.
pub const HEADER: [&str; 25] = [
    "seqname",
    "strand",
    "clv",
    "evidence_type",
    "contig_id",
    "contig_len",
    "contig_mapq",
    "contig_is_hardclipped",
    "num_suffix_reads",
    "max_suffix_read_tail_len",
    "suffix_contig_tail_len",
    "num_suffix_contigs",
    "num_bridge_reads",
    "max_bridge_read_tail_len",
    "num_bridge_contigs",
    "num_link_reads",
    "num_link_contigs",
    "num_blank_contigs",
    "ctg_hex",
    "ctg_hex_id",
    "ctg_hex_pos",
    "ref_hex",
    "ref_hex_id",
    "ref_hex_pos",
    "ctg_clv",
];

/// Identifies a candidate cleavage site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClvKey {
    pub seqname: String,
    pub strand: Strand,
    pub clv: i64,
}

impl ClvKey {
    pub fn new(seqname: impl Into<String>, strand: Strand, clv: i64) -> Self {
        ClvKey {
            seqname: seqname.into(),
            strand,
            clv,
        }
    }
}

impl fmt::Display for ClvKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.seqname, self.strand, self.clv)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidenceType {
    Suffix,
    Bridge,
    Link,
    Blank,
}

impl fmt::Display for EvidenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvidenceType::Suffix => "suffix",
            EvidenceType::Bridge => "bridge",
            EvidenceType::Link => "link",
            EvidenceType::Blank => "blank",
        };
        write!(f, "{}", name)
    }
}

/// Evidence counters of a record; all zero unless set by the evidence type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvidenceCounts {
    pub num_suffix_reads: u32,
    pub max_suffix_read_tail_len: u32,
    pub suffix_contig_tail_len: u32,
    pub num_suffix_contigs: u32,
    pub num_bridge_reads: u32,
    pub max_bridge_read_tail_len: u32,
    pub num_bridge_contigs: u32,
    pub num_link_reads: u32,
    pub num_link_contigs: u32,
    pub num_blank_contigs: u32,
}

/// A cleavage site resolved from a single contig.
#[derive(Debug, Clone, PartialEq)]
pub struct ClvRecord {
    pub key: ClvKey,
    pub evidence_type: EvidenceType,
    pub contig_id: String,
    pub contig_len: i64,
    pub contig_mapq: u8,
    pub contig_is_hardclipped: bool,
    pub counts: EvidenceCounts,
    pub ctg_hex: Option<HexamerMatch>,
    pub ref_hex: Option<HexamerMatch>,
    /// Cleavage site in the contig frame.
    pub ctg_clv: i64,
}

impl ClvRecord {
    /// Fields of the record in `HEADER` order.
    pub fn to_row(&self) -> Vec<String> {
        let c = &self.counts;
        let mut row = vec![
            self.key.seqname.clone(),
            self.key.strand.to_string(),
            self.key.clv.to_string(),
            self.evidence_type.to_string(),
            self.contig_id.clone(),
            self.contig_len.to_string(),
            self.contig_mapq.to_string(),
            self.contig_is_hardclipped.to_string(),
        ];
        row.extend(
            [
                c.num_suffix_reads,
                c.max_suffix_read_tail_len,
                c.suffix_contig_tail_len,
                c.num_suffix_contigs,
                c.num_bridge_reads,
                c.max_bridge_read_tail_len,
                c.num_bridge_contigs,
                c.num_link_reads,
                c.num_link_contigs,
                c.num_blank_contigs,
            ]
            .iter()
            .map(|n| n.to_string()),
        );
        row.extend(format_match(&self.ctg_hex));
        row.extend(format_match(&self.ref_hex));
        row.push(self.ctg_clv.to_string());
        row
    }
}
