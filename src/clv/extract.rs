//! Extraction of the sequence window next to a cleavage site on a contig.
//!

use super::{
    alignment::recover_hardclip,
    reference::{fetch_seq, ReferenceAccessor},
    Alignment, CigarOp, ClvError, ClvResult, Strand,
};

/// Stretch of the contig contributing bases to a window.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Block {
    /// Query bases in `[beg, end)` of the clip-inclusive contig frame, with the
    /// genome coordinate of the first base when aligned.
    Query { beg: i64, end: i64, gnm_beg: Option<i64> },
    /// Hardclipped bases at CIGAR position `index`.
    HardClip { index: usize, beg: i64, end: i64 },
    /// Reference bases in `[beg, end)` skipped by the contig.
    Skip { beg: i64, end: i64 },
}

fn split_into_blocks<A: Alignment + ?Sized>(contig: &A) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(contig.cigar().len());
    let mut ctg_pos = 0;
    let mut gnm_pos = contig.reference_start();
    for (index, op) in contig.cigar().iter().enumerate() {
        let len = op.len() as i64;
        match op {
            CigarOp::Match(_) | CigarOp::Equal(_) | CigarOp::Diff(_) => {
                blocks.push(Block::Query {
                    beg: ctg_pos,
                    end: ctg_pos + len,
                    gnm_beg: Some(gnm_pos),
                });
                ctg_pos += len;
                gnm_pos += len;
            }
            CigarOp::Ins(_) | CigarOp::SoftClip(_) => {
                blocks.push(Block::Query {
                    beg: ctg_pos,
                    end: ctg_pos + len,
                    gnm_beg: None,
                });
                ctg_pos += len;
            }
            CigarOp::HardClip(_) => {
                blocks.push(Block::HardClip {
                    index,
                    beg: ctg_pos,
                    end: ctg_pos + len,
                });
                ctg_pos += len;
            }
            CigarOp::RefSkip(_) => {
                blocks.push(Block::Skip {
                    beg: gnm_pos,
                    end: gnm_pos + len,
                });
                gnm_pos += len;
            }
            CigarOp::Del(_) => gnm_pos += len,
            CigarOp::Pad(_) | CigarOp::Back(_) => {
                log::warn!("{}, skipped", ClvError::UnsupportedCigarOp(op.char()));
            }
        }
    }
    blocks
}

/// Collects window bases from a single block.
struct Collector<'a, A: Alignment + ?Sized, R: ReferenceAccessor + ?Sized> {
    contig: &'a A,
    reference: &'a R,
    /// Contig frame offset of the first stored query base.
    leading_hardclip: i64,
}

impl<A: Alignment + ?Sized, R: ReferenceAccessor + ?Sized> Collector<'_, A, R> {
    /// Bases of the contig frame interval `[beg, end)`, which lies within one block.
    fn query_bases(&self, beg: i64, end: i64) -> ClvResult<&[u8]> {
        let seq = self.contig.query_sequence();
        let (beg, end) = (beg - self.leading_hardclip, end - self.leading_hardclip);
        if beg < 0 || end as usize > seq.len() {
            return Err(ClvError::MalformedAlignment(format!(
                "{}: CIGAR does not match sequence of length {}",
                self.contig.query_name(),
                seq.len()
            )));
        }
        Ok(&seq[beg as usize..end as usize])
    }

    fn hardclip_bases(&self, index: usize, block_beg: i64, beg: i64, end: i64) -> ClvResult<&[u8]> {
        let bases = recover_hardclip(self.contig, index)?;
        Ok(&bases[(beg - block_beg) as usize..(end - block_beg) as usize])
    }

    fn skip_bases(&self, beg: i64, end: i64) -> ClvResult<Vec<u8>> {
        fetch_seq(self.reference, self.contig.reference_name(), beg, end)
    }
}

/// Extracts up to `window` bases of the contig next to its cleavage site.
///
/// On the plus strand the window ends at `ctg_clv` and extends leftward, on the
/// minus strand it starts at `ctg_clv` and extends rightward. Bases skipped by the
/// contig (introns) are filled in from the reference; deleted bases are not.
/// Hardclipped bases are recovered from the `XH` tag only when the window needs them.
pub fn extract_window<A, R>(
    contig: &A,
    strand: Strand,
    ref_clv: i64,
    ctg_clv: i64,
    window: usize,
    reference: &R,
) -> ClvResult<Vec<u8>>
where
    A: Alignment + ?Sized,
    R: ReferenceAccessor + ?Sized,
{
    let blocks = split_into_blocks(contig);
    let leading_hardclip = match contig.cigar().first() {
        Some(CigarOp::HardClip(len)) => *len as i64,
        _ => 0,
    };
    let collector = Collector {
        contig,
        reference,
        leading_hardclip,
    };

    let clv_index = blocks
        .iter()
        .position(|block| match *block {
            Block::Query { beg, end, .. } | Block::HardClip { beg, end, .. } => {
                beg <= ctg_clv && ctg_clv < end
            }
            Block::Skip { .. } => false,
        })
        .ok_or_else(|| {
            ClvError::MalformedAlignment(format!(
                "{}: contig clv {} is outside of the contig",
                contig.query_name(),
                ctg_clv
            ))
        })?;

    if let Block::Query {
        beg,
        gnm_beg: Some(gnm_beg),
        ..
    } = blocks[clv_index]
    {
        let walked_clv = gnm_beg + ctg_clv - beg;
        if walked_clv != ref_clv {
            log::debug!(
                "{}: contig clv {} maps to {} rather than {}",
                contig.query_name(),
                ctg_clv,
                walked_clv,
                ref_clv
            );
        }
    }

    let window = window as i64;
    let mut pieces: Vec<Vec<u8>> = Vec::new();
    let mut remaining = window;
    match strand {
        Strand::Plus => {
            for (i, block) in blocks[..=clv_index].iter().enumerate().rev() {
                if remaining == 0 {
                    break;
                }
                let piece = match *block {
                    Block::Query { beg, end, .. } => {
                        let end = if i == clv_index { ctg_clv + 1 } else { end };
                        let beg = beg.max(end - remaining);
                        collector.query_bases(beg, end)?.to_vec()
                    }
                    Block::HardClip { index, beg: block_beg, end } => {
                        let end = if i == clv_index { ctg_clv + 1 } else { end };
                        let beg = block_beg.max(end - remaining);
                        collector.hardclip_bases(index, block_beg, beg, end)?.to_vec()
                    }
                    Block::Skip { beg, end } => {
                        collector.skip_bases(beg.max(end - remaining), end)?
                    }
                };
                remaining -= piece.len() as i64;
                pieces.push(piece);
            }
            pieces.reverse();
        }
        Strand::Minus => {
            for (i, block) in blocks.iter().enumerate().skip(clv_index) {
                if remaining == 0 {
                    break;
                }
                let piece = match *block {
                    Block::Query { beg, end, .. } => {
                        let beg = if i == clv_index { ctg_clv } else { beg };
                        collector.query_bases(beg, end.min(beg + remaining))?.to_vec()
                    }
                    Block::HardClip { index, beg: block_beg, end } => {
                        let beg = if i == clv_index { ctg_clv } else { block_beg };
                        let end = end.min(beg + remaining);
                        collector.hardclip_bases(index, block_beg, beg, end)?.to_vec()
                    }
                    Block::Skip { beg, end } => {
                        collector.skip_bases(beg, end.min(beg + remaining))?
                    }
                };
                remaining -= piece.len() as i64;
                pieces.push(piece);
            }
        }
    }
    Ok(pieces.concat())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clv::{
        calc_genome_offset, reference::tests::MockReference, Cigar, Segment, TailSide,
    };

    fn make_contig(bases: &str, start: i64, encoding: &str) -> Segment {
        Segment {
            name: "contig".to_string(),
            seqname: "chr2".to_string(),
            start,
            bases: bases.as_bytes().to_vec(),
            ops: encoding.parse::<Cigar>().unwrap().ops,
            ..Default::default()
        }
    }

    /// chr2 with `bases` placed at `offset`, padded by `N`.
    fn make_reference(offset: usize, bases: &str) -> MockReference {
        let seq = "N".repeat(offset) + bases + &"N".repeat(100 - offset - bases.len());
        MockReference::new(&[("chr2", &seq)])
    }

    fn extract(
        contig: &Segment,
        strand: Strand,
        ref_clv: i64,
        ctg_clv: i64,
        window: usize,
        reference: &MockReference,
    ) -> String {
        let seq = extract_window(contig, strand, ref_clv, ctg_clv, window, reference).unwrap();
        String::from_utf8(seq).unwrap()
    }

    #[test]
    fn minus_strand_match_only() {
        //   T
        //   └CG          <-bridge read
        //  GACGGTTGC     <-bridge contig
        //  012345678     <-contig coord
        //    ^ctg_clv
        //  567890123     <-genome coord
        //    ^ref_clv
        let contig = make_contig("GACGGTTGC", 5, "9M");
        let reference = make_reference(5, "GACGGTTGC");
        assert_eq!(extract(&contig, Strand::Minus, 7, 2, 50, &reference), "CGGTTGC");
        assert_eq!(extract(&contig, Strand::Minus, 7, 2, 3, &reference), "CGG");
        assert_eq!(extract(&contig, Strand::Minus, 7, 2, 1, &reference), "C");
        assert!(reference.fetches.borrow().is_empty());
    }

    #[test]
    fn minus_strand_with_skip() {
        //  GACGGT-GC     <-bridge contig
        //  012345 67     <-contig coord
        //  GACGGTAGC     <-genome, skipped base at 11
        let contig = make_contig("GACGGTGC", 5, "6M1N2M");
        let reference = make_reference(5, "GACGGTAGC");
        assert_eq!(extract(&contig, Strand::Minus, 7, 2, 50, &reference), "CGGTAGC");
        assert_eq!(
            reference.fetches.borrow().last(),
            Some(&("chr2".to_string(), 11, 12))
        );
        assert_eq!(extract(&contig, Strand::Minus, 7, 2, 5, &reference), "CGGTA");
        assert_eq!(extract(&contig, Strand::Minus, 7, 2, 1, &reference), "C");
    }

    #[test]
    fn minus_strand_with_skip_before_clv() {
        //  GA--GGTAGC    <-bridge contig
        //  01  234567    <-contig coord
        //         ^ctg_clv
        let contig = make_contig("GAGGTAGC", 5, "2M2N6M");
        let reference = make_reference(5, "GACTGGTAGC");
        assert_eq!(extract(&contig, Strand::Minus, 12, 5, 50, &reference), "AGC");
        assert_eq!(extract(&contig, Strand::Minus, 12, 5, 2, &reference), "AG");
        assert!(reference.fetches.borrow().is_empty());
    }

    #[test]
    fn minus_strand_with_multiple_skips_before_clv() {
        let contig = make_contig("GCGTAGC", 5, "1M1N1M2N5M");
        let reference = make_reference(5, "GACTGGTAGC");
        assert_eq!(extract(&contig, Strand::Minus, 12, 4, 50, &reference), "AGC");
        assert_eq!(extract(&contig, Strand::Minus, 12, 4, 1, &reference), "A");
    }

    #[test]
    fn deleted_bases_are_not_filled_in() {
        let contig = make_contig("GACGGTCGC", 5, "6M1D3M");
        let reference = make_reference(5, "GACGGTCCTC");
        assert_eq!(extract(&contig, Strand::Minus, 7, 2, 50, &reference), "CGGTCGC");
        assert_eq!(extract(&contig, Strand::Minus, 7, 2, 4, &reference), "CGGT");
    }

    #[test]
    fn inserted_bases_are_kept() {
        let contig = make_contig("GACGGTAGCTC", 5, "6M2I3M");
        let reference = make_reference(5, "GACGGTCTC");
        assert_eq!(extract(&contig, Strand::Minus, 7, 2, 50, &reference), "CGGTAGCTC");
        assert_eq!(extract(&contig, Strand::Minus, 7, 2, 4, &reference), "CGGT");
        assert_eq!(extract(&contig, Strand::Minus, 7, 2, 5, &reference), "CGGTA");
        assert_eq!(extract(&contig, Strand::Minus, 7, 2, 6, &reference), "CGGTAG");
        assert_eq!(extract(&contig, Strand::Minus, 7, 2, 7, &reference), "CGGTAGC");
    }

    #[test]
    fn plus_strand_with_hardclip_after_clv() {
        //  A-GGTTGCAGA   <-bridge contig
        //  | |    |///   <-hardclip mask
        //  0 1234567890  <-contig coord
        //       ^ctg_clv
        //  789012345678  <-genome coord
        //       ^ref_clv
        let mut contig = make_contig("AGGTTGC", 7, "1M1N6M3H");
        contig.hardclip_tag = Some(b"AGA".to_vec());
        let reference = make_reference(7, "ACGGTTGCAGA");
        assert_eq!(extract(&contig, Strand::Plus, 12, 4, 50, &reference), "ACGGTT");
        assert_eq!(extract(&contig, Strand::Plus, 12, 4, 3, &reference), "GTT");
        assert_eq!(extract(&contig, Strand::Plus, 12, 4, 5, &reference), "CGGTT");
        assert_eq!(
            reference.fetches.borrow().last(),
            Some(&("chr2".to_string(), 8, 9))
        );
    }

    #[test]
    fn hardclip_is_recovered_only_when_needed() {
        let contig = make_contig("AGGTTGC", 7, "1M1N6M3H");
        let reference = make_reference(7, "ACGGTTGCAGA");
        // no XH tag, but the window never reaches the hardclip
        assert_eq!(extract(&contig, Strand::Minus, 9, 1, 3, &reference), "GGT");
        assert!(matches!(
            extract_window(&contig, Strand::Minus, 9, 1, 50, &reference),
            Err(ClvError::HardclipRecovery { .. })
        ));
    }

    #[test]
    fn plus_strand_with_leading_hardclip() {
        //  CGCATTCGTCG   <-contig, first three bases hardclipped
        //  01234567890   <-contig coord
        //        ^ctg_clv
        let mut contig = make_contig("ATTCGTCG", 5, "3H8M");
        contig.hardclip_tag = Some(b"CGC".to_vec());
        let reference = make_reference(5, "ATTCGTCG");
        assert_eq!(extract(&contig, Strand::Plus, 8, 6, 50, &reference), "CGCATTC");
        assert_eq!(extract(&contig, Strand::Plus, 8, 6, 3, &reference), "TTC");
    }

    #[test]
    fn skip_is_fetched_only_as_far_as_the_window_reaches() {
        let contig = make_contig("ACGTAC", 10, "3M40N3M");
        let reference = make_reference(10, &("ACG".to_string() + &"T".repeat(40) + "TAC"));
        assert_eq!(extract(&contig, Strand::Plus, 55, 5, 6, &reference), "TTTTAC");
        assert_eq!(
            reference.fetches.borrow().last(),
            Some(&("chr2".to_string(), 50, 53))
        );
    }

    #[test]
    fn clv_outside_the_contig_is_an_error() {
        let contig = make_contig("ACGT", 0, "4M");
        let reference = make_reference(0, "ACGT");
        assert!(matches!(
            extract_window(&contig, Strand::Plus, 4, 4, 50, &reference),
            Err(ClvError::MalformedAlignment(_))
        ));
    }

    #[test]
    fn window_and_walker_agree_on_genome_positions() {
        let contig = make_contig("GACGGTAGCTC", 5, "6M2I1M3N2M");
        let reference = make_reference(5, "GACGGTCAAATC");
        for ctg_clv in [0, 3, 5, 8, 9] {
            let offset = calc_genome_offset(&contig.ops, ctg_clv, TailSide::Left).unwrap();
            let ref_clv = contig.start + offset;
            let window = extract(&contig, Strand::Plus, ref_clv, ctg_clv, 1, &reference);
            let expected = reference.seqs["chr2"][ref_clv as usize] as char;
            assert_eq!(window, expected.to_string(), "ctg_clv {}", ctg_clv);
        }
    }
}
