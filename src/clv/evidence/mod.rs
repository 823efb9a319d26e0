//! Evidence types supporting a cleavage site.
//!
//! * suffix: the contig itself ends in a poly tail
//! * bridge: a read aligned to the contig ends in a poly tail
//! * blank: no tail at all, both contig ends are candidates

pub mod blank;
pub mod bridge;
pub mod suffix;

use super::{
    alignment::is_hardclipped,
    extract::extract_window,
    hexamer::search,
    record::EvidenceCounts,
    reference::{fetch_seq, ReferenceAccessor},
    Alignment, ClvKey, ClvRecord, ClvResult, EvidenceType, HexamerMatch, Strand,
};

/// Strongest hexamer in the contig window next to the cleavage site.
pub fn gen_contig_hexamer<A, R>(
    contig: &A,
    strand: Strand,
    ref_clv: i64,
    ctg_clv: i64,
    window: usize,
    reference: &R,
) -> ClvResult<Option<HexamerMatch>>
where
    A: Alignment + ?Sized,
    R: ReferenceAccessor + ?Sized,
{
    let seq = extract_window(contig, strand, ref_clv, ctg_clv, window, reference)?;
    Ok(search(strand, ref_clv, &seq, window))
}

/// Strongest hexamer in the reference window next to the cleavage site.
pub fn gen_reference_hexamer<R: ReferenceAccessor + ?Sized>(
    reference: &R,
    seqname: &str,
    strand: Strand,
    ref_clv: i64,
    window: usize,
) -> ClvResult<Option<HexamerMatch>> {
    let window_len = window as i64;
    let (beg, end) = match strand {
        Strand::Plus => (ref_clv - window_len + 1, ref_clv + 1),
        Strand::Minus => (ref_clv, ref_clv + window_len),
    };
    let seq = fetch_seq(reference, seqname, beg, end)?;
    Ok(search(strand, ref_clv, &seq, window))
}

/// Record of a cleavage site supported by `contig`, annotated with hexamers.
pub(crate) fn build_record<A, R>(
    contig: &A,
    key: ClvKey,
    evidence_type: EvidenceType,
    counts: EvidenceCounts,
    ctg_clv: i64,
    window: usize,
    reference: &R,
) -> ClvResult<ClvRecord>
where
    A: Alignment + ?Sized,
    R: ReferenceAccessor + ?Sized,
{
    let ctg_hex = gen_contig_hexamer(contig, key.strand, key.clv, ctg_clv, window, reference)?;
    let ref_hex = gen_reference_hexamer(reference, &key.seqname, key.strand, key.clv, window)?;
    Ok(ClvRecord {
        evidence_type,
        contig_id: contig.query_name().to_string(),
        contig_len: contig.infer_query_length(),
        contig_mapq: contig.mapq(),
        contig_is_hardclipped: is_hardclipped(contig),
        counts,
        ctg_hex,
        ref_hex,
        ctg_clv,
        key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clv::{reference::tests::MockReference, Cigar, Segment};

    #[test]
    fn reference_hexamer_on_plus_strand() {
        let reference = MockReference::new(&[("chr1", "GGGGCAATAAAGTCCCC")]);
        let hexamer = gen_reference_hexamer(&reference, "chr1", Strand::Plus, 12, 50).unwrap();
        assert_eq!(
            hexamer,
            Some(HexamerMatch {
                motif: "AATAAA",
                rank: 1,
                pos: 5
            })
        );
        assert_eq!(
            gen_reference_hexamer(&reference, "chr1", Strand::Plus, 12, 6).unwrap(),
            None
        );
    }

    #[test]
    fn reference_hexamer_on_minus_strand() {
        let reference = MockReference::new(&[("chr1", "CCCCGTTTATTGCCCC")]);
        let hexamer = gen_reference_hexamer(&reference, "chr1", Strand::Minus, 4, 50).unwrap();
        assert_eq!(
            hexamer,
            Some(HexamerMatch {
                motif: "AATAAA",
                rank: 1,
                pos: 10
            })
        );
    }

    #[test]
    fn contig_hexamer_counts_inserted_bases() {
        //  CAATAAAttGT   <-contig, 7M2I2M
        //  0123456789    <-contig coord
        //  CAATAAA  GT   <-genome 10..=18
        let reference = MockReference::new(&[("chr1", "GGGGGGGGGGCAATAAAGTCCCC")]);
        let contig = Segment {
            name: "contig".to_string(),
            seqname: "chr1".to_string(),
            start: 10,
            bases: b"CAATAAATTGT".to_vec(),
            ops: "7M2I2M".parse::<Cigar>().unwrap().ops,
            mapq: 60,
            ..Default::default()
        };
        let ctg_hex = gen_contig_hexamer(&contig, Strand::Plus, 18, 10, 50, &reference).unwrap();
        let ref_hex = gen_reference_hexamer(&reference, "chr1", Strand::Plus, 18, 50).unwrap();
        assert_eq!(ctg_hex.map(|h| h.pos), Some(9));
        assert_eq!(ref_hex.map(|h| h.pos), Some(11));
    }
}
