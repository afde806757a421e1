//! Majority-vote gold existence over a list of raters.

use serde::{Deserialize, Serialize};

use crate::label::NqLabel;

/// Minimum number of raters that must supply an answer before the gold answer
/// is considered to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldPolicy {
    pub min_agreeing_raters: usize,
}

impl GoldPolicy {
    pub const fn new(min_agreeing_raters: usize) -> Self {
        Self {
            min_agreeing_raters,
        }
    }

    /// Five-way adjudicated dev data: 2 of 5 raters.
    pub const fn adjudicated() -> Self {
        Self::new(2)
    }

    /// Single-rater data: the one rater decides.
    pub const fn single_rater() -> Self {
        Self::new(1)
    }

    /// Vote over `raters` with an arbitrary "has answer" predicate. An empty
    /// rater list never has a gold answer.
    pub fn reaches_quorum<F>(&self, raters: &[NqLabel], has_answer: F) -> bool
    where
        F: Fn(&NqLabel) -> bool,
    {
        if raters.is_empty() {
            return false;
        }
        let votes = raters.iter().filter(|&r| has_answer(r)).count();
        votes >= self.min_agreeing_raters
    }
}

impl Default for GoldPolicy {
    fn default() -> Self {
        Self::adjudicated()
    }
}

pub fn has_gold_long_answer(raters: &[NqLabel], policy: &GoldPolicy) -> bool {
    policy.reaches_quorum(raters, NqLabel::has_long_answer)
}

/// A rater counts when it gave short spans or a yes/no verdict.
pub fn has_gold_short_answer(raters: &[NqLabel], policy: &GoldPolicy) -> bool {
    policy.reaches_quorum(raters, NqLabel::has_short_answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::YesNoAnswer;
    use crate::span::Span;

    fn long_rater(span: Option<(i64, i64)>) -> NqLabel {
        let span = span
            .map(|(s, e)| Span::from_bytes(s, e).unwrap())
            .unwrap_or_default();
        NqLabel::new("0", span, vec![], YesNoAnswer::None)
    }

    #[test]
    fn adjudicated_needs_two_of_five() {
        let policy = GoldPolicy::adjudicated();
        let one = vec![
            long_rater(Some((0, 10))),
            long_rater(None),
            long_rater(None),
            long_rater(None),
            long_rater(None),
        ];
        assert!(!has_gold_long_answer(&one, &policy));

        let two = vec![
            long_rater(Some((0, 10))),
            long_rater(Some((0, 9))),
            long_rater(None),
            long_rater(None),
            long_rater(None),
        ];
        assert!(has_gold_long_answer(&two, &policy));
    }

    #[test]
    fn single_rater_decides_alone() {
        let policy = GoldPolicy::single_rater();
        assert!(has_gold_long_answer(&[long_rater(Some((3, 4)))], &policy));
        assert!(!has_gold_long_answer(&[long_rater(None)], &policy));
    }

    #[test]
    fn empty_rater_list_has_no_gold() {
        assert!(!has_gold_long_answer(&[], &GoldPolicy::single_rater()));
        assert!(!has_gold_short_answer(&[], &GoldPolicy::new(0)));
    }

    #[test]
    fn verdicts_count_toward_short_answer() {
        let policy = GoldPolicy::adjudicated();
        let raters = vec![
            NqLabel::new("0", Span::null(), vec![], YesNoAnswer::Yes),
            NqLabel::new(
                "0",
                Span::null(),
                vec![Span::from_bytes(1, 3).unwrap()],
                YesNoAnswer::None,
            ),
            NqLabel::new("0", Span::null(), vec![], YesNoAnswer::None),
        ];
        assert!(has_gold_short_answer(&raters, &policy));
        assert!(!has_gold_short_answer(&raters[..1], &policy));
    }
}
