//! Access to reference genome sequence.
//!

use super::{ClvError, ClvResult};
use rust_htslib::faidx;
use std::collections::HashMap;

/// Contigs whose coordinates wrap around their end.
pub const CIRCULAR_CONTIGS: [&str; 2] = ["chrM", "MT"];

/// Random access to reference sequences over half-open intervals.
pub trait ReferenceAccessor {
    /// Fetches `[beg, end)`; callers keep the interval within `0..=length`.
    fn fetch(&self, seqname: &str, beg: i64, end: i64) -> ClvResult<Vec<u8>>;
    fn reference_length(&self, seqname: &str) -> ClvResult<i64>;
}

/// Faidx-indexed FASTA reference.
pub struct FastaReference {
    reader: faidx::Reader,
    lengths: HashMap<String, i64>,
}

impl FastaReference {
    pub fn new(reader: faidx::Reader) -> ClvResult<Self> {
        let num_seqs = reader.n_seqs() as usize;
        let mut lengths = HashMap::with_capacity(num_seqs);
        for i in 0..num_seqs {
            let name = reader
                .seq_name(i as i32)
                .map_err(|e| ClvError::Reference(e.to_string()))?;
            let len = reader.fetch_seq_len(&name);
            let len = i64::try_from(len).map_err(|_| {
                ClvError::Reference(format!("Sequence length for '{}' is out of range", name))
            })?;
            lengths.insert(name, len);
        }
        Ok(FastaReference { reader, lengths })
    }
}

impl ReferenceAccessor for FastaReference {
    fn fetch(&self, seqname: &str, beg: i64, end: i64) -> ClvResult<Vec<u8>> {
        if end <= beg {
            return Ok(Vec::new());
        }
        // faidx intervals are inclusive
        self.reader
            .fetch_seq(seqname, beg as usize, end as usize - 1)
            .map(|seq| seq.to_ascii_uppercase())
            .map_err(|e| {
                ClvError::Reference(format!(
                    "Error fetching sequence for region {}:{}-{}: {}",
                    seqname, beg, end, e
                ))
            })
    }

    fn reference_length(&self, seqname: &str) -> ClvResult<i64> {
        self.lengths.get(seqname).copied().ok_or_else(|| {
            ClvError::Reference(format!(
                "FASTA reference does not contain chromosome '{}'",
                seqname
            ))
        })
    }
}

/// Fetches `[beg, end)` from `seqname`, shifting out-of-range coordinates by
/// the sequence length.
///
/// Circular contigs are stitched across their origin; other contigs are
/// truncated at their ends.
pub fn fetch_seq<R: ReferenceAccessor + ?Sized>(
    reference: &R,
    seqname: &str,
    beg: i64,
    end: i64,
) -> ClvResult<Vec<u8>> {
    let seq_len = reference.reference_length(seqname)?;
    let out_of_range = || ClvError::ReferenceOutOfRange {
        seqname: seqname.to_string(),
        beg,
        end,
        len: seq_len,
    };
    if seq_len <= 0 {
        return Err(out_of_range());
    }
    let is_circular = CIRCULAR_CONTIGS.contains(&seqname);

    let (mut beg, mut end) = (beg, end);
    while beg > end {
        beg -= seq_len;
    }
    // Shift whole intervals lying beyond either end
    while beg >= seq_len {
        beg -= seq_len;
        end -= seq_len;
    }
    while end <= 0 && beg < 0 {
        beg += seq_len;
        end += seq_len;
    }

    if beg >= 0 {
        if end <= seq_len {
            reference.fetch(seqname, beg, end)
        } else if is_circular {
            let mut seq = reference.fetch(seqname, beg, seq_len)?;
            seq.extend(reference.fetch(seqname, 0, end - seq_len)?);
            Ok(seq)
        } else {
            reference.fetch(seqname, beg, seq_len)
        }
    } else if end <= seq_len {
        if is_circular {
            let mut seq = reference.fetch(seqname, seq_len + beg, seq_len)?;
            seq.extend(reference.fetch(seqname, 0, end)?);
            Ok(seq)
        } else {
            reference.fetch(seqname, 0, end)
        }
    } else {
        Err(out_of_range())
    }
}
