use super::build_record;
use crate::clv::{
    calc_genome_offset, record::EvidenceCounts, reference::ReferenceAccessor,
    tail::classify_tail, Alignment, ClvKey, ClvRecord, ClvResult, EvidenceType, Strand, TailSide,
};
use std::collections::BTreeMap;

/// A tailed read aligned to a contig, projected onto the genome.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeEvidence {
    pub key: ClvKey,
    pub tail_len: u32,
    pub ctg_clv: i64,
}

/// Tail side and length of a read that bridges its contig to a poly tail.
pub fn is_a_bridge_read<B: Alignment + ?Sized>(read: &B) -> Option<(TailSide, u32)> {
    if read.is_unmapped() {
        return None;
    }
    classify_tail(read.query_sequence(), read.cigar())
}

/// Strand and contig offset of the cleavage site marked by a tailed read.
///
/// The offset is given in the contig frame as aligned to the genome, so reads
/// on a reversed contig are flipped and their strand swapped.
pub fn do_bridge<A, B>(contig: &A, read: &B, tail_side: TailSide) -> (Strand, i64)
where
    A: Alignment + ?Sized,
    B: Alignment + ?Sized,
{
    let (read_beg, read_end) = (read.reference_start(), read.reference_end());
    if contig.is_reverse() {
        let ctg_len = contig.infer_query_length();
        match tail_side {
            TailSide::Left => (Strand::Plus, ctg_len - read_beg - 1),
            TailSide::Right => (Strand::Minus, ctg_len - read_end),
        }
    } else {
        match tail_side {
            TailSide::Left => (Strand::Minus, read_beg),
            TailSide::Right => (Strand::Plus, read_end - 1),
        }
    }
}

pub fn analyze_bridge<A, B>(contig: &A, read: &B) -> ClvResult<Option<BridgeEvidence>>
where
    A: Alignment + ?Sized,
    B: Alignment + ?Sized,
{
    let (tail_side, tail_len) = match is_a_bridge_read(read) {
        Some(tail) => tail,
        None => return Ok(None),
    };
    let (strand, ctg_offset) = do_bridge(contig, read, tail_side);
    let offset = calc_genome_offset(contig.cigar(), ctg_offset, tail_side)?;
    Ok(Some(BridgeEvidence {
        key: ClvKey::new(
            contig.reference_name(),
            strand,
            contig.reference_start() + offset,
        ),
        tail_len,
        ctg_clv: ctg_offset,
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeTally {
    pub num_reads: u32,
    pub max_tail_len: u32,
    pub ctg_clv: i64,
}

/// Bridge evidence of one contig aggregated per cleavage site.
#[derive(Debug, Default)]
pub struct BridgeEvidenceHolder {
    tallies: BTreeMap<ClvKey, BridgeTally>,
}

impl BridgeEvidenceHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, evidence: BridgeEvidence) {
        let tally = self.tallies.entry(evidence.key).or_insert(BridgeTally {
            num_reads: 0,
            max_tail_len: 0,
            ctg_clv: evidence.ctg_clv,
        });
        tally.num_reads += 1;
        tally.max_tail_len = tally.max_tail_len.max(evidence.tail_len);
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    pub fn get(&self, key: &ClvKey) -> Option<&BridgeTally> {
        self.tallies.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ClvKey, &BridgeTally)> {
        self.tallies.iter()
    }
}

/// Collects the bridge evidence of all reads aligned to `contig`.
pub fn collect_bridge_evidence<A, B>(contig: &A, reads: &[B]) -> ClvResult<BridgeEvidenceHolder>
where
    A: Alignment + ?Sized,
    B: Alignment,
{
    let mut holder = BridgeEvidenceHolder::new();
    for read in reads {
        if let Some(evidence) = analyze_bridge(contig, read)? {
            holder.update(evidence);
        }
    }
    Ok(holder)
}

pub fn gen_clv_record<A, R>(
    contig: &A,
    key: &ClvKey,
    tally: &BridgeTally,
    window: usize,
    reference: &R,
) -> ClvResult<ClvRecord>
where
    A: Alignment + ?Sized,
    R: ReferenceAccessor + ?Sized,
{
    let counts = EvidenceCounts {
        num_bridge_reads: tally.num_reads,
        max_bridge_read_tail_len: tally.max_tail_len,
        num_bridge_contigs: 1,
        ..Default::default()
    };
    build_record(
        contig,
        key.clone(),
        EvidenceType::Bridge,
        counts,
        tally.ctg_clv,
        window,
        reference,
    )
}
