use super::build_record;
use crate::clv::{
    record::EvidenceCounts, reference::ReferenceAccessor, Alignment, CigarOp, ClvKey, ClvRecord,
    ClvResult, EvidenceType, Strand, SupportedClvKeys,
};

fn is_clip(op: &CigarOp) -> bool {
    matches!(op, CigarOp::SoftClip(_) | CigarOp::HardClip(_))
}

fn clipped_len<'a>(ops: impl Iterator<Item = &'a CigarOp>) -> i64 {
    ops.take_while(|op| is_clip(op))
        .map(|op| op.len() as i64)
        .sum()
}

/// Both ends of a contig without tail evidence, paired with their contig offsets.
///
/// The 3' end of the transcript may lie at either end of the contig.
pub fn candidates<A: Alignment + ?Sized>(contig: &A) -> [(ClvKey, i64); 2] {
    let seqname = contig.reference_name();
    let ops = contig.cigar();
    let last_aligned = contig.infer_query_length() - clipped_len(ops.iter().rev()) - 1;
    let first_aligned = clipped_len(ops.iter());
    [
        (
            ClvKey::new(seqname, Strand::Plus, contig.reference_end() - 1),
            last_aligned,
        ),
        (
            ClvKey::new(seqname, Strand::Minus, contig.reference_start()),
            first_aligned,
        ),
    ]
}

/// Candidates of `contig` not yet covered by other evidence, claiming them.
pub fn claim_candidates<A: Alignment + ?Sized>(
    contig: &A,
    supported: &SupportedClvKeys,
) -> Vec<(ClvKey, i64)> {
    candidates(contig)
        .into_iter()
        .filter(|(key, _)| supported.claim(key))
        .collect()
}

pub fn gen_clv_record<A, R>(
    contig: &A,
    key: &ClvKey,
    ctg_clv: i64,
    window: usize,
    reference: &R,
) -> ClvResult<ClvRecord>
where
    A: Alignment + ?Sized,
    R: ReferenceAccessor + ?Sized,
{
    let counts = EvidenceCounts {
        num_blank_contigs: 1,
        ..Default::default()
    };
    build_record(
        contig,
        key.clone(),
        EvidenceType::Blank,
        counts,
        ctg_clv,
        window,
        reference,
    )
}
