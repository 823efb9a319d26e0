//! Resolution of cleavage sites from contig alignments.
//!

use super::{
    evidence::{blank, bridge, suffix},
    reference::ReferenceAccessor,
    Alignment, ClvKey, ClvRecord, ClvResult,
};
use std::collections::HashSet;
use std::sync::Mutex;

/// Cleavage sites already reported, shared across all contigs of a run.
#[derive(Debug, Default)]
pub struct SupportedClvKeys {
    keys: Mutex<HashSet<ClvKey>>,
}

impl SupportedClvKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` as reported. Returns false if it already was.
    pub fn claim(&self, key: &ClvKey) -> bool {
        let mut keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        if keys.contains(key) {
            return false;
        }
        keys.insert(key.clone())
    }

    pub fn contains(&self, key: &ClvKey) -> bool {
        self.keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverParams {
    /// Number of bases searched for a hexamer next to a cleavage site.
    pub hexamer_window: usize,
}

impl Default for ResolverParams {
    fn default() -> Self {
        ResolverParams { hexamer_window: 50 }
    }
}

pub struct ClvResolver<'a, R: ReferenceAccessor + ?Sized> {
    reference: &'a R,
    supported: &'a SupportedClvKeys,
    params: ResolverParams,
}

impl<'a, R: ReferenceAccessor + ?Sized> ClvResolver<'a, R> {
    pub fn new(reference: &'a R, supported: &'a SupportedClvKeys, params: ResolverParams) -> Self {
        ClvResolver {
            reference,
            supported,
            params,
        }
    }

    /// Records of the cleavage sites supported by the tails of `contig` and of the
    /// reads aligned to it, strongest evidence first.
    ///
    /// Returns `None` when there is no tail evidence at all; such contigs are left
    /// for `resolve_blank` once every contig's tail evidence has been claimed.
    pub fn resolve_tails<A, B>(&self, contig: &A, reads: &[B]) -> ClvResult<Option<Vec<ClvRecord>>>
    where
        A: Alignment + ?Sized,
        B: Alignment,
    {
        if contig.is_unmapped() {
            return Ok(Some(Vec::new()));
        }
        if contig.query_sequence().is_empty() {
            log::warn!("{}: no stored sequence, skipped", contig.query_name());
            return Ok(Some(Vec::new()));
        }
        let window = self.params.hexamer_window;
        let mut records = Vec::new();

        let suffix_evidence = suffix::analyze_suffix(contig);
        if let Some(evidence) = &suffix_evidence {
            if self.supported.claim(&evidence.key) {
                records.push(suffix::gen_clv_record(
                    contig,
                    evidence,
                    reads,
                    window,
                    self.reference,
                )?);
            }
        }

        let bridge_evidence = bridge::collect_bridge_evidence(contig, reads)?;
        for (key, tally) in bridge_evidence.iter() {
            if self.supported.claim(key) {
                records.push(bridge::gen_clv_record(
                    contig,
                    key,
                    tally,
                    window,
                    self.reference,
                )?);
            }
        }

        if suffix_evidence.is_none() && bridge_evidence.is_empty() {
            return Ok(None);
        }
        log::debug!(
            "{}: {} cleavage site(s) resolved",
            contig.query_name(),
            records.len()
        );
        Ok(Some(records))
    }

    /// Records for both ends of a contig without tail evidence, skipping ends
    /// already claimed.
    pub fn resolve_blank<A: Alignment + ?Sized>(&self, contig: &A) -> ClvResult<Vec<ClvRecord>> {
        blank::claim_candidates(contig, self.supported)
            .into_iter()
            .map(|(key, ctg_clv)| {
                blank::gen_clv_record(
                    contig,
                    &key,
                    ctg_clv,
                    self.params.hexamer_window,
                    self.reference,
                )
            })
            .collect()
    }

    /// Resolves a single contig, falling back to its ends when it has no tail evidence.
    ///
    /// When resolving many contigs against one key set, call `resolve_tails` on all
    /// of them before `resolve_blank`, so that blank ends never hide tail evidence.
    pub fn resolve<A, B>(&self, contig: &A, reads: &[B]) -> ClvResult<Vec<ClvRecord>>
    where
        A: Alignment + ?Sized,
        B: Alignment,
    {
        match self.resolve_tails(contig, reads)? {
            Some(records) => Ok(records),
            None => self.resolve_blank(contig),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clv::{reference::tests::MockReference, Cigar, EvidenceType, Segment, Strand};
    use std::sync::Arc;
    use std::thread;

    fn make_segment(name: &str, bases: &str, start: i64, encoding: &str) -> Segment {
        Segment {
            name: name.to_string(),
            seqname: "chr1".to_string(),
            start,
            bases: bases.as_bytes().to_vec(),
            ops: encoding.parse::<Cigar>().unwrap().ops,
            mapq: 60,
            ..Default::default()
        }
    }

    fn reference() -> MockReference {
        MockReference::new(&[("chr1", "CCCCCCCCCCGAATAAACCGTTTACCCCC")])
    }

    #[test]
    fn claim_is_check_and_insert() {
        let supported = SupportedClvKeys::new();
        let key = ClvKey::new("chr1", Strand::Plus, 10);
        assert!(supported.is_empty());
        assert!(supported.claim(&key));
        assert!(!supported.claim(&key));
        assert!(supported.contains(&key));
        assert_eq!(supported.len(), 1);
    }

    #[test]
    fn concurrent_claims_succeed_once() {
        let supported = Arc::new(SupportedClvKeys::new());
        let key = ClvKey::new("chr1", Strand::Minus, 7);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let supported = Arc::clone(&supported);
                let key = key.clone();
                thread::spawn(move || supported.claim(&key))
            })
            .collect();
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(wins, 1);
    }

    #[test]
    fn suffix_contig_yields_one_record() {
        // GAATAAACCGAAAA  <-contig, last 4 bases clipped
        // 0123456789      <-contig coord, genome coord offset by 10
        let reference = reference();
        let supported = SupportedClvKeys::new();
        let resolver = ClvResolver::new(&reference, &supported, ResolverParams::default());
        let contig = make_segment("contig", "GAATAAACCGAAAA", 10, "10M4S");
        let reads = vec![make_segment("read", "ACCGAAAA", 6, "8M")];
        let records = resolver.resolve(&contig, &reads).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.key, ClvKey::new("chr1", Strand::Plus, 19));
        assert_eq!(record.evidence_type, EvidenceType::Suffix);
        assert_eq!(record.counts.num_suffix_reads, 1);
        assert_eq!(record.counts.max_suffix_read_tail_len, 4);
        assert_eq!(record.counts.suffix_contig_tail_len, 4);
        assert_eq!(record.ctg_clv, 9);
        assert_eq!(record.ctg_hex.map(|h| (h.motif, h.pos)), Some(("AATAAA", 11)));
        assert_eq!(record.ref_hex.map(|h| (h.motif, h.pos)), Some(("AATAAA", 11)));
    }

    #[test]
    fn bridge_reads_are_aggregated() {
        let reference = reference();
        let supported = SupportedClvKeys::new();
        let resolver = ClvResolver::new(&reference, &supported, ResolverParams::default());
        let contig = make_segment("contig", "GAATAAACCGTTTAC", 10, "15M");
        let reads = vec![
            make_segment("r1", "ATAAACCGAAA", 2, "8M3S"),
            make_segment("r2", "AACCGAA", 5, "5M2S"),
            make_segment("r3", "AATAAACC", 1, "8M"),
        ];
        let records = resolver.resolve(&contig, &reads).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.key, ClvKey::new("chr1", Strand::Plus, 19));
        assert_eq!(record.evidence_type, EvidenceType::Bridge);
        assert_eq!(record.counts.num_bridge_reads, 2);
        assert_eq!(record.counts.max_bridge_read_tail_len, 3);
        assert_eq!(record.counts.num_bridge_contigs, 1);
        assert_eq!(record.ctg_clv, 9);
    }

    #[test]
    fn contig_without_tails_yields_both_ends() {
        let reference = reference();
        let supported = SupportedClvKeys::new();
        let resolver = ClvResolver::new(&reference, &supported, ResolverParams::default());
        let contig = make_segment("contig", "GAATAAACCG", 10, "10M");
        let records = resolver.resolve::<_, Segment>(&contig, &[]).unwrap();
        let keys: Vec<_> = records.iter().map(|r| r.key.to_string()).collect();
        assert_eq!(keys, vec!["chr1|+|19", "chr1|-|10"]);
        assert!(records
            .iter()
            .all(|r| r.evidence_type == EvidenceType::Blank));
    }

    #[test]
    fn resolution_is_idempotent() {
        let reference = reference();
        let supported = SupportedClvKeys::new();
        let resolver = ClvResolver::new(&reference, &supported, ResolverParams::default());
        let contig = make_segment("contig", "GAATAAACCGAAAA", 10, "10M4S");
        let reads = vec![make_segment("read", "CCGAAA", 7, "3M3S")];
        let first = resolver.resolve(&contig, &reads).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(supported.len(), 1);
        let second = resolver.resolve(&contig, &reads).unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn unmapped_contig_yields_nothing() {
        let reference = reference();
        let supported = SupportedClvKeys::new();
        let resolver = ClvResolver::new(&reference, &supported, ResolverParams::default());
        let mut contig = make_segment("contig", "GAATAAACCG", 10, "10M");
        contig.is_unmapped = true;
        assert!(resolver.resolve::<_, Segment>(&contig, &[]).unwrap().is_empty());
        assert!(supported.is_empty());
    }

    #[test]
    fn blank_ends_never_hide_tail_evidence() {
        let reference = reference();
        let supported = SupportedClvKeys::new();
        let resolver = ClvResolver::new(&reference, &supported, ResolverParams::default());
        let blank_contig = make_segment("blank", "GAATAAACCG", 10, "10M");
        let suffix_contig = make_segment("suffix", "GAATAAACCGAAAA", 10, "10M4S");

        // blank contig comes first in the input
        assert_eq!(resolver.resolve_tails::<_, Segment>(&blank_contig, &[]).unwrap(), None);
        let records = resolver
            .resolve_tails::<_, Segment>(&suffix_contig, &[])
            .unwrap()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, ClvKey::new("chr1", Strand::Plus, 19));
        assert_eq!(records[0].evidence_type, EvidenceType::Suffix);

        let records = resolver.resolve_blank(&blank_contig).unwrap();
        let keys: Vec<_> = records.iter().map(|r| r.key.to_string()).collect();
        assert_eq!(keys, vec!["chr1|-|10"]);
    }

    #[test]
    fn contig_without_stored_sequence_is_skipped() {
        let reference = reference();
        let supported = SupportedClvKeys::new();
        let resolver = ClvResolver::new(&reference, &supported, ResolverParams::default());
        let contig = make_segment("secondary", "", 10, "10M");
        assert_eq!(
            resolver.resolve_tails::<_, Segment>(&contig, &[]).unwrap(),
            Some(Vec::new())
        );
        assert!(resolver.resolve::<_, Segment>(&contig, &[]).unwrap().is_empty());
        assert!(supported.is_empty());
    }
}
