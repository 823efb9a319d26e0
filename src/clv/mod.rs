//! Cleavage site (CLV) detection from contig and read alignments.
//!

pub mod alignment;
pub mod cigar;
mod error;
pub mod evidence;
pub mod extract;
pub mod hexamer;
pub mod record;
pub mod reference;
pub mod resolver;
mod strand;
pub mod tail;
pub mod writers;

pub use alignment::{Alignment, Segment};
pub use cigar::{calc_genome_offset, Cigar, CigarOp};
pub use error::{ClvError, ClvResult};
pub use hexamer::{search, HexamerMatch};
pub use record::{ClvKey, ClvRecord, EvidenceType, HEADER};
pub use reference::{fetch_seq, FastaReference, ReferenceAccessor};
pub use resolver::{ClvResolver, ResolverParams, SupportedClvKeys};
pub use strand::{calc_strand, Strand, TailSide};
