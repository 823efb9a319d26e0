/// Errors raised while resolving cleavage sites.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ClvError {
    #[error("invalid tail side: {0}")]
    InvalidTailSide(String),

    #[error("unsupported CIGAR operation: {0}")]
    UnsupportedCigarOp(char),

    #[error("hardclip recovery failed for {name}: {reason}")]
    HardclipRecovery { name: String, reason: String },

    #[error("reference range {seqname}:{beg}-{end} is out of range (length {len})")]
    ReferenceOutOfRange {
        seqname: String,
        beg: i64,
        end: i64,
        len: i64,
    },

    #[error("malformed alignment: {0}")]
    MalformedAlignment(String),

    #[error("reference error: {0}")]
    Reference(String),
}

pub type ClvResult<T> = std::result::Result<T, ClvError>;
