//! Detection of poly(A)/poly(T) tails carried in softclips.
//!

use super::{Alignment, CigarOp, ClvError, ClvResult, TailSide};

fn is_tail_clip(clip: &[u8], tail_base: u8) -> bool {
    !clip.is_empty() && clip.iter().all(|b| b.eq_ignore_ascii_case(&tail_base))
}

fn softclip_len(op: Option<&CigarOp>) -> Option<usize> {
    match op {
        Some(CigarOp::SoftClip(len)) if *len > 0 => Some(*len as usize),
        _ => None,
    }
}

/// Softclip of the first `L` bases, all of them `tail_base`.
pub fn left_tail(seq: &[u8], ops: &[CigarOp], tail_base: u8) -> bool {
    match softclip_len(ops.first()) {
        Some(len) if len <= seq.len() => is_tail_clip(&seq[..len], tail_base),
        _ => false,
    }
}

/// Softclip of the last `L` bases, all of them `tail_base`.
pub fn right_tail(seq: &[u8], ops: &[CigarOp], tail_base: u8) -> bool {
    match softclip_len(ops.last()) {
        Some(len) if len <= seq.len() => is_tail_clip(&seq[seq.len() - len..], tail_base),
        _ => false,
    }
}

/// Classifies the tail of a query; a poly(T) head takes priority over a poly(A) tail.
pub fn classify_tail(seq: &[u8], ops: &[CigarOp]) -> Option<(TailSide, u32)> {
    if left_tail(seq, ops, b'T') {
        Some((TailSide::Left, ops[0].len()))
    } else if right_tail(seq, ops, b'A') {
        Some((TailSide::Right, ops[ops.len() - 1].len()))
    } else {
        None
    }
}

pub fn has_tail<A: Alignment + ?Sized>(segment: &A) -> Option<TailSide> {
    classify_tail(segment.query_sequence(), segment.cigar()).map(|(side, _)| side)
}

/// Length of the softclip on the given side of a tailed segment.
pub fn calc_tail_length<A: Alignment + ?Sized>(segment: &A, side: TailSide) -> ClvResult<u32> {
    let (op, which) = match side {
        TailSide::Left => (segment.cigar().first(), "first"),
        TailSide::Right => (segment.cigar().last(), "last"),
    };
    match op {
        Some(CigarOp::SoftClip(len)) => Ok(*len),
        _ => Err(ClvError::InvalidTailSide(format!(
            "{} is not {:?} tailed, its {} CIGAR operation is not a softclip",
            segment.query_name(),
            side,
            which
        ))),
    }
}
