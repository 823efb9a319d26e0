use super::{ClvError, ClvResult, TailSide};
use rust_htslib::bam::record::Cigar as HtsCigar;
use std::str::FromStr;

/// A single CIGAR operation and its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarOp {
    Match(u32),
    Ins(u32),
    Del(u32),
    RefSkip(u32),
    SoftClip(u32),
    HardClip(u32),
    Pad(u32),
    Equal(u32),
    Diff(u32),
    Back(u32),
}

impl CigarOp {
    pub fn len(&self) -> u32 {
        match self {
            CigarOp::Match(len)
            | CigarOp::Ins(len)
            | CigarOp::Del(len)
            | CigarOp::RefSkip(len)
            | CigarOp::SoftClip(len)
            | CigarOp::HardClip(len)
            | CigarOp::Pad(len)
            | CigarOp::Equal(len)
            | CigarOp::Diff(len)
            | CigarOp::Back(len) => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn char(&self) -> char {
        match self {
            CigarOp::Match(_) => 'M',
            CigarOp::Ins(_) => 'I',
            CigarOp::Del(_) => 'D',
            CigarOp::RefSkip(_) => 'N',
            CigarOp::SoftClip(_) => 'S',
            CigarOp::HardClip(_) => 'H',
            CigarOp::Pad(_) => 'P',
            CigarOp::Equal(_) => '=',
            CigarOp::Diff(_) => 'X',
            CigarOp::Back(_) => 'B',
        }
    }

    pub fn get_ref_len(&self) -> i64 {
        match self {
            CigarOp::Match(len)
            | CigarOp::RefSkip(len)
            | CigarOp::Del(len)
            | CigarOp::Equal(len)
            | CigarOp::Diff(len) => *len as i64,
            CigarOp::Ins(_)
            | CigarOp::SoftClip(_)
            | CigarOp::HardClip(_)
            | CigarOp::Pad(_)
            | CigarOp::Back(_) => 0,
        }
    }

    /// Number of bases consumed in the clip-inclusive contig frame, hardclips included.
    pub fn get_query_len(&self) -> i64 {
        match self {
            CigarOp::Match(len)
            | CigarOp::Equal(len)
            | CigarOp::Diff(len)
            | CigarOp::Ins(len)
            | CigarOp::SoftClip(len)
            | CigarOp::HardClip(len) => *len as i64,
            CigarOp::RefSkip(_) | CigarOp::Del(_) | CigarOp::Pad(_) | CigarOp::Back(_) => 0,
        }
    }
}

impl From<&HtsCigar> for CigarOp {
    fn from(op: &HtsCigar) -> Self {
        match *op {
            HtsCigar::Match(len) => CigarOp::Match(len),
            HtsCigar::Ins(len) => CigarOp::Ins(len),
            HtsCigar::Del(len) => CigarOp::Del(len),
            HtsCigar::RefSkip(len) => CigarOp::RefSkip(len),
            HtsCigar::SoftClip(len) => CigarOp::SoftClip(len),
            HtsCigar::HardClip(len) => CigarOp::HardClip(len),
            HtsCigar::Pad(len) => CigarOp::Pad(len),
            HtsCigar::Equal(len) => CigarOp::Equal(len),
            HtsCigar::Diff(len) => CigarOp::Diff(len),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Cigar {
    pub ref_pos: i64,
    pub ops: Vec<CigarOp>,
}

impl Cigar {
    pub fn query_len(&self) -> usize {
        self.ops.iter().map(|op| op.get_query_len() as usize).sum()
    }

    pub fn ref_len(&self) -> i64 {
        self.ops.iter().map(|op| op.get_ref_len()).sum()
    }
}

impl FromStr for Cigar {
    type Err = ClvError;

    /// Parses a CIGAR string such as `5S3=2D2=1X` anchored at reference position 0.
    fn from_str(encoding: &str) -> ClvResult<Self> {
        let error = || ClvError::MalformedAlignment(format!("invalid CIGAR: {}", encoding));
        let mut ops = Vec::new();
        let mut len: Option<u32> = None;
        for c in encoding.chars() {
            if let Some(digit) = c.to_digit(10) {
                len = Some(
                    len.unwrap_or(0)
                        .checked_mul(10)
                        .and_then(|l| l.checked_add(digit))
                        .ok_or_else(error)?,
                );
                continue;
            }
            let len = len.take().ok_or_else(error)?;
            ops.push(match c {
                'M' => CigarOp::Match(len),
                'I' => CigarOp::Ins(len),
                'D' => CigarOp::Del(len),
                'N' => CigarOp::RefSkip(len),
                'S' => CigarOp::SoftClip(len),
                'H' => CigarOp::HardClip(len),
                'P' => CigarOp::Pad(len),
                '=' => CigarOp::Equal(len),
                'X' => CigarOp::Diff(len),
                'B' => CigarOp::Back(len),
                _ => return Err(error()),
            });
        }
        if len.is_some() {
            return Err(error());
        }
        Ok(Cigar { ref_pos: 0, ops })
    }
}

/// Converts an offset along the contig into an offset along the genome.
///
/// `ctg_offset` is a base index in the ungapped, clip-inclusive contig frame,
/// oriented as the contig lies on the reference. The returned offset is relative
/// to the contig's reference start.
///
/// An operation contains the cutoff when the last base it consumes is at or
/// past the cutoff, so an offset landing on an operation boundary belongs to the
/// operation that starts there. When the cutoff falls inside an insertion or a
/// clip, `tie_break` decides between the genome base following the run (`Left`)
/// and the one after it (`Right`).
pub fn calc_genome_offset(ops: &[CigarOp], ctg_offset: i64, tie_break: TailSide) -> ClvResult<i64> {
    if ops.is_empty() {
        return Err(ClvError::MalformedAlignment("empty CIGAR".to_string()));
    }
    let ctg_len: i64 = ops.iter().map(|op| op.get_query_len()).sum();
    if ctg_offset < 0 || ctg_offset > ctg_len {
        return Err(ClvError::MalformedAlignment(format!(
            "contig offset {} outside of contig of length {}",
            ctg_offset, ctg_len
        )));
    }

    let mut cur_ctg_ofs: i64 = 0;
    let mut cur_gnm_ofs: i64 = 0;
    for op in ops {
        let len = op.len() as i64;
        match op {
            CigarOp::Match(_) | CigarOp::Equal(_) | CigarOp::Diff(_) => {
                if cur_ctg_ofs + len > ctg_offset {
                    return Ok(cur_gnm_ofs + ctg_offset - cur_ctg_ofs);
                }
                cur_ctg_ofs += len;
                cur_gnm_ofs += len;
            }
            CigarOp::RefSkip(_) | CigarOp::Del(_) => cur_gnm_ofs += len,
            CigarOp::Ins(_) | CigarOp::SoftClip(_) | CigarOp::HardClip(_) => {
                cur_ctg_ofs += len;
                if cur_ctg_ofs > ctg_offset {
                    return Ok(match tie_break {
                        TailSide::Left => cur_gnm_ofs,
                        TailSide::Right => cur_gnm_ofs + 1,
                    });
                }
            }
            CigarOp::Pad(_) | CigarOp::Back(_) => {
                log::warn!("{}, skipped", ClvError::UnsupportedCigarOp(op.char()));
            }
        }
    }
    Ok(cur_gnm_ofs)
}
