//! Error interface for this crate.
//!
//! Every error raised by the assembler or the simulator implements [`Error`],
//! which extends [`std::error::Error`] with the source location of the error
//! and a short suggestion for how to fix it.
//!
//! This module also re-exports the error types of the crate:
//! - [`AsmErr`] (and its [`AsmErrKind`]): errors raised while assembling source code
//! - [`SimErr`]: errors raised while executing an assembled program
use std::borrow::Cow;
use std::ops::Range;

pub use crate::asm::{AsmErr, AsmErrKind};
pub use crate::sim::SimErr;

/// Error type for this crate.
pub trait Error: std::error::Error {
    /// The range(s) in source code associated with this error.
    fn span(&self) -> Option<ErrSpan> {
        None
    }

    /// A help message for this error, if one exists.
    fn help(&self) -> Option<Cow<'_, str>>;
}

/// Location(s) in source code associated with an error.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrSpan {
    /// One range.
    One(Range<usize>),
    /// Two ranges (e.g., two conflicting definitions).
    Two([Range<usize>; 2]),
    /// Three or more ranges.
    Many(Vec<Range<usize>>)
}
impl ErrSpan {
    /// Gets the first range of this span.
    pub fn first(&self) -> Range<usize> {
        match self {
            ErrSpan::One(r) => r.clone(),
            ErrSpan::Two([r, _]) => r.clone(),
            ErrSpan::Many(rs) => rs.first().cloned().unwrap_or(0..0),
        }
    }

    /// Iterates over every range in this span.
    pub fn iter(&self) -> impl Iterator<Item=&Range<usize>> + '_ {
        match self {
            ErrSpan::One(r) => std::slice::from_ref(r).iter(),
            ErrSpan::Two(rs) => rs.iter(),
            ErrSpan::Many(rs) => rs.iter(),
        }
    }
}
impl From<Range<usize>> for ErrSpan {
    fn from(value: Range<usize>) -> Self {
        ErrSpan::One(value)
    }
}
impl From<[Range<usize>; 2]> for ErrSpan {
    fn from(value: [Range<usize>; 2]) -> Self {
        ErrSpan::Two(value)
    }
}
impl From<Vec<Range<usize>>> for ErrSpan {
    fn from(value: Vec<Range<usize>>) -> Self {
        match <[_; 2]>::try_from(value) {
            Ok(pair) => ErrSpan::Two(pair),
            Err(mut v) if v.len() == 1 => ErrSpan::One(v.remove(0)),
            Err(v) => ErrSpan::Many(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ErrSpan;

    #[test]
    fn test_span_from_vec() {
        assert_eq!(ErrSpan::from(vec![0..2]), ErrSpan::One(0..2));
        assert_eq!(ErrSpan::from(vec![0..2, 4..6]), ErrSpan::Two([0..2, 4..6]));
        assert_eq!(ErrSpan::from(vec![0..2, 4..6, 8..9]), ErrSpan::Many(vec![0..2, 4..6, 8..9]));
    }

    #[test]
    fn test_span_first_iter() {
        let span = ErrSpan::from([3..5, 7..9]);
        assert_eq!(span.first(), 3..5);
        assert_eq!(span.iter().cloned().collect::<Vec<_>>(), vec![3..5, 7..9]);

        let span = ErrSpan::from(Vec::<std::ops::Range<usize>>::new());
        assert_eq!(span.first(), 0..0);
        assert_eq!(span.iter().count(), 0);
    }
}
