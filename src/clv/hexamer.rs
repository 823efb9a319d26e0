//! Polyadenylation signal (PAS) hexamer search.
//!

use super::Strand;
use itertools::Itertools;

pub const HEXAMER_LEN: usize = 6;

/// Known PAS hexamers ordered from the strongest (rank 1) to the weakest (rank 16).
pub const CANDIDATE_HEXAMERS: [(&str, u8); 16] = [
    ("AATAAA", 1),
    ("ATTAAA", 2),
    ("AGTAAA", 3),
    ("TATAAA", 4),
    ("CATAAA", 5),
    ("GATAAA", 6),
    ("AATATA", 7),
    ("AATACA", 8),
    ("AATAGA", 9),
    ("AAAAAG", 10),
    ("ACTAAA", 11),
    ("AAGAAA", 12),
    ("AATGAA", 13),
    ("TTTAAA", 14),
    ("AAAACA", 15),
    ("GGGGCT", 16),
];

/// Best hexamer found next to a cleavage site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexamerMatch {
    pub motif: &'static str,
    pub rank: u8,
    /// Genome coordinate of the hexamer's 5' end on the searched strand.
    ///
    /// Window bases are counted from `clv` as if they were contiguous on the
    /// genome. In a contig window, insertions or spliced-in skips between the
    /// hexamer and `clv` shift `pos` by their net length.
    pub pos: i64,
}

pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|base| match base.to_ascii_uppercase() {
            b'A' => b'T',
            b'T' => b'A',
            b'C' => b'G',
            b'G' => b'C',
            _ => b'N',
        })
        .collect()
}

fn uppercase(seq: &[u8]) -> Vec<u8> {
    seq.iter().map(|b| b.to_ascii_uppercase()).collect()
}

/// Searches a plus strand sequence whose last base sits at `clv`.
///
/// The strongest hexamer wins; among its occurrences the one closest to `clv` is kept.
pub fn plus_search(seq: &[u8], clv: i64) -> Option<HexamerMatch> {
    let seq = uppercase(seq);
    let seq_beg = clv - seq.len() as i64 + 1;
    CANDIDATE_HEXAMERS.iter().find_map(|&(motif, rank)| {
        seq.windows(HEXAMER_LEN)
            .rposition(|w| w == motif.as_bytes())
            .map(|index| HexamerMatch {
                motif,
                rank,
                pos: seq_beg + index as i64,
            })
    })
}

/// Searches a plus strand sequence whose first base sits at `clv` for minus strand hexamers.
pub fn minus_search(seq: &[u8], clv: i64) -> Option<HexamerMatch> {
    let seq = uppercase(seq);
    CANDIDATE_HEXAMERS.iter().find_map(|&(motif, rank)| {
        let target = reverse_complement(motif.as_bytes());
        seq.windows(HEXAMER_LEN)
            .position(|w| w == target.as_slice())
            .map(|index| HexamerMatch {
                motif,
                rank,
                pos: clv + (index + HEXAMER_LEN - 1) as i64,
            })
    })
}

/// Searches the `window` bases next to `clv` on the given strand.
///
/// On the plus strand `seq` ends at `clv`, on the minus strand it starts there.
pub fn search(strand: Strand, clv: i64, seq: &[u8], window: usize) -> Option<HexamerMatch> {
    let window = window.min(seq.len());
    match strand {
        Strand::Plus => plus_search(&seq[seq.len() - window..], clv),
        Strand::Minus => minus_search(&seq[..window], clv),
    }
}

/// Formats a match as `motif:rank:pos`, or `NA` when absent.
pub fn format_match(hexamer: &Option<HexamerMatch>) -> [String; 3] {
    match hexamer {
        Some(m) => [m.motif.to_string(), m.rank.to_string(), m.pos.to_string()],
        None => ["NA", "-1", "-1"].map(|s| s.to_string()),
    }
}

/// Comma separated list of the candidate hexamers, strongest first.
pub fn candidate_list() -> String {
    CANDIDATE_HEXAMERS.iter().map(|(motif, _)| motif).join(",")
}
