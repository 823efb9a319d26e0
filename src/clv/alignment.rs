//! Alignment records as seen by the cleavage site resolver.
//!

use super::{cigar::CigarOp, ClvError, ClvResult};
use rust_htslib::bam::{self, ext::BamRecordExtensions, record::Aux};
use std::str;

/// Tag holding the bases removed by hardclipping.
pub const HARDCLIP_TAG: &[u8; 2] = b"XH";

/// Read-only view of a contig or read alignment.
pub trait Alignment {
    fn query_name(&self) -> &str;
    fn reference_name(&self) -> &str;
    /// 0-based start of the alignment on its reference.
    fn reference_start(&self) -> i64;
    /// Query bases as stored in the record, hardclipped bases excluded.
    fn query_sequence(&self) -> &[u8];
    fn cigar(&self) -> &[CigarOp];
    fn mapq(&self) -> u8;
    fn is_reverse(&self) -> bool;
    fn is_unmapped(&self) -> bool;
    /// Bases recorded in the `XH` tag, if any.
    fn hardclip_bases(&self) -> Option<&[u8]>;

    /// Half-open end of the alignment on its reference.
    fn reference_end(&self) -> i64 {
        self.reference_start() + self.cigar().iter().map(|op| op.get_ref_len()).sum::<i64>()
    }

    /// Query length including hardclipped bases.
    fn infer_query_length(&self) -> i64 {
        self.cigar().iter().map(|op| op.get_query_len()).sum()
    }
}

/// An owned alignment record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Segment {
    pub name: String,
    pub seqname: String,
    pub start: i64,
    pub bases: Vec<u8>,
    pub ops: Vec<CigarOp>,
    pub mapq: u8,
    pub is_reverse: bool,
    pub is_unmapped: bool,
    pub hardclip_tag: Option<Vec<u8>>,
}

impl Segment {
    /// Creates a `Segment` from an HTSlib record.
    ///
    /// # Arguments
    /// * `rec` - A BAM record from HTSlib.
    /// * `target_names` - Reference names indexed by target id.
    pub fn from_hts_rec(rec: &bam::Record, target_names: &[String]) -> ClvResult<Segment> {
        let name = str::from_utf8(rec.qname())
            .map_err(|e| ClvError::MalformedAlignment(format!("query name: {}", e)))?
            .to_string();
        let seqname = if rec.tid() >= 0 {
            target_names
                .get(rec.tid() as usize)
                .cloned()
                .ok_or_else(|| {
                    ClvError::MalformedAlignment(format!("{}: unknown target id {}", name, rec.tid()))
                })?
        } else {
            String::new()
        };
        let hardclip_tag = match rec.aux(HARDCLIP_TAG) {
            Ok(Aux::String(value)) => Some(value.as_bytes().to_vec()),
            _ => None,
        };

        Ok(Segment {
            name,
            seqname,
            start: rec.reference_start(),
            bases: rec.seq().as_bytes(),
            ops: rec.cigar().iter().map(CigarOp::from).collect(),
            mapq: rec.mapq(),
            is_reverse: rec.is_reverse(),
            is_unmapped: rec.is_unmapped(),
            hardclip_tag,
        })
    }
}

impl Alignment for Segment {
    fn query_name(&self) -> &str {
        &self.name
    }

    fn reference_name(&self) -> &str {
        &self.seqname
    }

    fn reference_start(&self) -> i64 {
        self.start
    }

    fn query_sequence(&self) -> &[u8] {
        &self.bases
    }

    fn cigar(&self) -> &[CigarOp] {
        &self.ops
    }

    fn mapq(&self) -> u8 {
        self.mapq
    }

    fn is_reverse(&self) -> bool {
        self.is_reverse
    }

    fn is_unmapped(&self) -> bool {
        self.is_unmapped
    }

    fn hardclip_bases(&self) -> Option<&[u8]> {
        self.hardclip_tag.as_deref()
    }
}

pub fn is_hardclipped<A: Alignment + ?Sized>(segment: &A) -> bool {
    segment
        .cigar()
        .iter()
        .any(|op| matches!(op, CigarOp::HardClip(_)))
}

/// Bases recovered for the hardclip at CIGAR position `index`.
///
/// Only a first or last operation may be a hardclip, and the `XH` tag must cover it exactly.
pub fn recover_hardclip<A: Alignment + ?Sized>(segment: &A, index: usize) -> ClvResult<&[u8]> {
    let error = |reason: String| ClvError::HardclipRecovery {
        name: segment.query_name().to_string(),
        reason,
    };
    let ops = segment.cigar();
    let len = match ops.get(index) {
        Some(CigarOp::HardClip(len)) => *len as usize,
        _ => return Err(error(format!("CIGAR operation {} is not a hardclip", index))),
    };
    if index != 0 && index + 1 != ops.len() {
        return Err(error(format!("interior hardclip at CIGAR operation {}", index)));
    }
    let bases = segment
        .hardclip_bases()
        .ok_or_else(|| error("XH tag is missing".to_string()))?;
    if bases.len() != len {
        return Err(error(format!(
            "XH tag has {} bases for a hardclip of {}",
            bases.len(),
            len
        )));
    }
    Ok(bases)
}

/// Query sequence with hardclipped bases restored from the `XH` tag.
pub fn infer_query_sequence<A: Alignment + ?Sized>(segment: &A) -> ClvResult<Vec<u8>> {
    let mut seq = Vec::with_capacity(segment.infer_query_length().max(0) as usize);
    for (index, op) in segment.cigar().iter().enumerate() {
        if let CigarOp::HardClip(_) = op {
            let bases = recover_hardclip(segment, index)?;
            if index == 0 {
                seq.extend_from_slice(bases);
                seq.extend_from_slice(segment.query_sequence());
            } else {
                if seq.is_empty() {
                    seq.extend_from_slice(segment.query_sequence());
                }
                seq.extend_from_slice(bases);
            }
        }
    }
    if seq.is_empty() {
        seq.extend_from_slice(segment.query_sequence());
    }
    Ok(seq)
}
