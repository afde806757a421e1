//! Answer spans in token and byte coordinates.
//!
//! A span carries two independent half-open ranges. Each range is either absent
//! (both ends `-1`) or a proper range with `end > start`. The span is null when
//! both ranges are absent.

use std::collections::HashSet;

use crate::error::{EvalError, Result};

/// Sentinel for an absent offset.
pub const ABSENT: i64 = -1;

/// Immutable answer location. Equality is field-exact: a token-only span never
/// equals a byte-only span, even when the numbers coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    start_token: i64,
    end_token: i64,
    start_byte: i64,
    end_byte: i64,
}

impl Span {
    /// Validating constructor.
    pub fn new(start_token: i64, end_token: i64, start_byte: i64, end_byte: i64) -> Result<Self> {
        let invalid = |reason| EvalError::InvalidSpan {
            start_token,
            end_token,
            start_byte,
            end_byte,
            reason,
        };
        check_pair(start_token, end_token).map_err(invalid)?;
        check_pair(start_byte, end_byte).map_err(invalid)?;
        Ok(Self {
            start_token,
            end_token,
            start_byte,
            end_byte,
        })
    }

    /// The null span (all four offsets absent).
    pub const fn null() -> Self {
        Self {
            start_token: ABSENT,
            end_token: ABSENT,
            start_byte: ABSENT,
            end_byte: ABSENT,
        }
    }

    /// Token-only span.
    pub fn from_tokens(start: i64, end: i64) -> Result<Self> {
        Self::new(start, end, ABSENT, ABSENT)
    }

    /// Byte-only span.
    pub fn from_bytes(start: i64, end: i64) -> Result<Self> {
        Self::new(ABSENT, ABSENT, start, end)
    }

    pub fn start_token(&self) -> i64 {
        self.start_token
    }

    pub fn end_token(&self) -> i64 {
        self.end_token
    }

    pub fn start_byte(&self) -> i64 {
        self.start_byte
    }

    pub fn end_byte(&self) -> i64 {
        self.end_byte
    }

    pub fn has_tokens(&self) -> bool {
        self.start_token != ABSENT
    }

    pub fn has_bytes(&self) -> bool {
        self.start_byte != ABSENT
    }

    pub fn is_null(&self) -> bool {
        !self.has_tokens() && !self.has_bytes()
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::null()
    }
}

// one coordinate pair: both absent, or both set with end > start
fn check_pair(start: i64, end: i64) -> std::result::Result<(), &'static str> {
    match (start == ABSENT, end == ABSENT) {
        (true, true) => Ok(()),
        (true, false) | (false, true) => Err("only one end of a coordinate pair is absent"),
        (false, false) if start < 0 || end < 0 => Err("offsets must be -1 or non-negative"),
        (false, false) if end <= start => Err("end must be greater than start"),
        (false, false) => Ok(()),
    }
}

/// Exact four-field equality.
pub fn span_equal(a: &Span, b: &Span) -> bool {
    a == b
}

/// True when the list is empty or holds only null spans.
pub fn is_null_span_list(spans: &[Span]) -> bool {
    spans.iter().all(Span::is_null)
}

/// Set equality after dropping null spans from both sides. Duplicates collapse
/// and order is ignored.
pub fn span_set_equal(a: &[Span], b: &[Span]) -> bool {
    non_null_set(a) == non_null_set(b)
}

fn non_null_set(spans: &[Span]) -> HashSet<&Span> {
    spans.iter().filter(|s| !s.is_null()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(start: i64, end: i64) -> Span {
        Span::from_bytes(start, end).unwrap()
    }

    #[test]
    fn rejects_inconsistent_pairs() {
        assert!(Span::new(-1, 1, -1, 1).is_err());
        assert!(Span::new(-1, -1, -1, 1).is_err());
        assert!(Span::new(-1, -1, 3, 1).is_err());
        assert!(Span::new(5, 5, -1, -1).is_err());
        assert!(Span::new(-3, 2, -1, -1).is_err());
    }

    #[test]
    fn accepts_single_coordinate_system() {
        assert!(Span::new(100, 102, -1, -1).is_ok());
        assert!(Span::new(-1, -1, 100, 102).is_ok());
        assert!(Span::new(3, 7, 10, 42).is_ok());
    }

    #[test]
    fn invalid_span_reports_fields() {
        let err = Span::new(-1, -1, 3, 1).unwrap_err();
        match err {
            EvalError::InvalidSpan {
                start_byte,
                end_byte,
                ..
            } => {
                assert_eq!(start_byte, 3);
                assert_eq!(end_byte, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn null_only_when_all_absent() {
        assert!(Span::new(-1, -1, -1, -1).unwrap().is_null());
        assert!(Span::null().is_null());
        assert!(!Span::new(-1, -1, 0, 1).unwrap().is_null());
        assert!(!Span::from_tokens(0, 1).unwrap().is_null());
    }

    #[test]
    fn equality_is_representation_exact() {
        let a = Span::new(100, 102, -1, -1).unwrap();
        let b = Span::new(100, 102, -1, -1).unwrap();
        assert!(span_equal(&a, &b));

        assert!(span_equal(&bytes(100, 102), &bytes(100, 102)));

        let token_only = Span::new(100, 102, -1, -1).unwrap();
        let byte_only = Span::new(-1, -1, 100, 102).unwrap();
        assert!(!span_equal(&token_only, &byte_only));

        // both systems present on one side only
        let both = Span::new(100, 102, 100, 102).unwrap();
        assert!(!span_equal(&both, &token_only));
    }

    #[test]
    fn set_equality_ignores_nulls_and_order() {
        let a1 = bytes(100, 102);
        let a2 = bytes(100, 102);
        let b = bytes(101, 105);
        let null = Span::null();

        assert!(span_set_equal(&[a1, b], &[a2, b]));
        assert!(span_set_equal(&[a1, b], &[a2, b, null]));
        assert!(span_set_equal(&[b, a1], &[a2, b]));
        assert!(span_set_equal(&[a1, a1, b], &[b, a2]));
        assert!(!span_set_equal(&[a1], &[a2, b, null]));
    }

    #[test]
    fn null_span_lists() {
        assert!(is_null_span_list(&[]));
        assert!(is_null_span_list(&[Span::null(), Span::null()]));
        assert!(!is_null_span_list(&[Span::null(), bytes(0, 1)]));
        assert!(span_set_equal(&[], &[Span::null()]));
    }
}
