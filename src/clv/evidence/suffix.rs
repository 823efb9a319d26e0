use super::build_record;
use crate::clv::{
    record::EvidenceCounts, reference::ReferenceAccessor, tail::classify_tail, Alignment, ClvKey,
    ClvRecord, ClvResult, EvidenceType, TailSide,
};

/// A contig ending in its own poly tail.
#[derive(Debug, Clone, PartialEq)]
pub struct SuffixEvidence {
    pub key: ClvKey,
    pub tail_side: TailSide,
    pub tail_len: u32,
    pub ctg_clv: i64,
}

pub fn analyze_suffix<A: Alignment + ?Sized>(contig: &A) -> Option<SuffixEvidence> {
    if contig.is_unmapped() {
        return None;
    }
    let (tail_side, tail_len) = classify_tail(contig.query_sequence(), contig.cigar())?;
    let (ref_clv, ctg_clv) = match tail_side {
        TailSide::Left => (contig.reference_start(), tail_len as i64),
        TailSide::Right => (
            contig.reference_end() - 1,
            contig.infer_query_length() - tail_len as i64 - 1,
        ),
    };
    Some(SuffixEvidence {
        key: ClvKey::new(contig.reference_name(), tail_side.strand(), ref_clv),
        tail_side,
        tail_len,
        ctg_clv,
    })
}

/// Interval of the contig tail in the coordinates reads were aligned to.
///
/// Reads are aligned to contigs as assembled, so the tail of a reversed contig
/// sits at the opposite end.
pub fn tail_region<A: Alignment + ?Sized>(contig: &A, evidence: &SuffixEvidence) -> (i64, i64) {
    let ctg_len = contig.infer_query_length();
    let tail_len = evidence.tail_len as i64;
    let (beg, end) = match evidence.tail_side {
        TailSide::Left => (0, tail_len),
        TailSide::Right => (ctg_len - tail_len, ctg_len),
    };
    if contig.is_reverse() {
        (ctg_len - end, ctg_len - beg)
    } else {
        (beg, end)
    }
}

/// Number of reads covering the contig tail, and the longest stretch of the
/// tail covered by one of them.
pub fn count_suffix_reads<A, B>(contig: &A, evidence: &SuffixEvidence, reads: &[B]) -> (u32, u32)
where
    A: Alignment + ?Sized,
    B: Alignment,
{
    let (beg, end) = tail_region(contig, evidence);
    reads
        .iter()
        .filter(|read| !read.is_unmapped())
        .map(|read| read.reference_end().min(end) - read.reference_start().max(beg))
        .filter(|&overlap| overlap > 0)
        .fold((0, 0), |(num, max_len), overlap| {
            (num + 1, max_len.max(overlap as u32))
        })
}

pub fn gen_clv_record<A, B, R>(
    contig: &A,
    evidence: &SuffixEvidence,
    reads: &[B],
    window: usize,
    reference: &R,
) -> ClvResult<ClvRecord>
where
    A: Alignment + ?Sized,
    B: Alignment,
    R: ReferenceAccessor + ?Sized,
{
    let (num_suffix_reads, max_suffix_read_tail_len) = count_suffix_reads(contig, evidence, reads);
    let counts = EvidenceCounts {
        num_suffix_reads,
        max_suffix_read_tail_len,
        suffix_contig_tail_len: evidence.tail_len,
        num_suffix_contigs: 1,
        ..Default::default()
    };
    build_record(
        contig,
        evidence.key.clone(),
        EvidenceType::Suffix,
        counts,
        evidence.ctg_clv,
        window,
        reference,
    )
}
