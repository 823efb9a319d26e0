use super::{ClvError, ClvResult};
use std::{fmt, str::FromStr};

/// Strand of a cleavage site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strand {
    Plus,
    Minus,
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Plus => write!(f, "+"),
            Strand::Minus => write!(f, "-"),
        }
    }
}

impl FromStr for Strand {
    type Err = &'static str;
    fn from_str(strand: &str) -> Result<Self, Self::Err> {
        match strand {
            "+" | "plus" => Ok(Strand::Plus),
            "-" | "minus" => Ok(Strand::Minus),
            _ => Err("Invalid strand"),
        }
    }
}

/// End of a query carrying a clipped poly tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TailSide {
    Left,
    Right,
}

impl TailSide {
    /// A poly(T) head marks the minus strand, a poly(A) tail the plus strand.
    pub fn strand(self) -> Strand {
        match self {
            TailSide::Left => Strand::Minus,
            TailSide::Right => Strand::Plus,
        }
    }
}

pub fn calc_strand(side: Option<TailSide>) -> ClvResult<Strand> {
    side.map(TailSide::strand)
        .ok_or_else(|| ClvError::InvalidTailSide("neither left nor right".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strand_follows_tail_side() {
        assert_eq!(calc_strand(Some(TailSide::Left)), Ok(Strand::Minus));
        assert_eq!(calc_strand(Some(TailSide::Right)), Ok(Strand::Plus));
    }

    #[test]
    fn missing_tail_side_is_an_error() {
        assert!(matches!(
            calc_strand(None),
            Err(ClvError::InvalidTailSide(_))
        ));
    }

    #[test]
    fn strand_round_trips_through_display() {
        assert_eq!(Strand::Plus.to_string(), "+");
        assert_eq!("-".parse::<Strand>(), Ok(Strand::Minus));
        assert!("*".parse::<Strand>().is_err());
    }
}
