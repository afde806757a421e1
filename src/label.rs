//! One rater's (or one system's) annotation for one example.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EvalError;
use crate::span::{is_null_span_list, Span};

/// Identifier shared by the gold annotations and the prediction of one question.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExampleId(String);

impl ExampleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExampleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ExampleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for ExampleId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// Yes/no verdict of a short answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YesNoAnswer {
    #[default]
    None,
    Yes,
    No,
}

impl YesNoAnswer {
    pub fn is_none(self) -> bool {
        self == YesNoAnswer::None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            YesNoAnswer::None => "none",
            YesNoAnswer::Yes => "yes",
            YesNoAnswer::No => "no",
        }
    }
}

impl fmt::Display for YesNoAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive: raw gold data writes `"NONE"`, predictions write `"none"`.
impl FromStr for YesNoAnswer {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "" => Ok(YesNoAnswer::None),
            "yes" => Ok(YesNoAnswer::Yes),
            "no" => Ok(YesNoAnswer::No),
            _ => Err(EvalError::UnknownVerdict(s.to_string())),
        }
    }
}

/// Annotation record: a long answer span, a set of short answer spans, a yes/no
/// verdict and, for predictions, confidence scores.
#[derive(Debug, Clone, PartialEq)]
pub struct NqLabel {
    example_id: ExampleId,
    long_answer_span: Span,
    short_answer_span_list: Vec<Span>,
    yes_no_answer: YesNoAnswer,
    long_score: Option<f64>,
    short_score: Option<f64>,
}

impl NqLabel {
    pub fn new(
        example_id: impl Into<ExampleId>,
        long_answer_span: Span,
        short_answer_span_list: Vec<Span>,
        yes_no_answer: YesNoAnswer,
    ) -> Self {
        Self {
            example_id: example_id.into(),
            long_answer_span,
            short_answer_span_list,
            yes_no_answer,
            long_score: None,
            short_score: None,
        }
    }

    /// Attach confidence scores (predictions only).
    pub fn with_scores(mut self, long_score: Option<f64>, short_score: Option<f64>) -> Self {
        self.long_score = long_score;
        self.short_score = short_score;
        self
    }

    pub fn example_id(&self) -> &ExampleId {
        &self.example_id
    }

    pub fn long_answer_span(&self) -> &Span {
        &self.long_answer_span
    }

    pub fn short_answer_span_list(&self) -> &[Span] {
        &self.short_answer_span_list
    }

    pub fn yes_no_answer(&self) -> YesNoAnswer {
        self.yes_no_answer
    }

    pub fn long_score(&self) -> Option<f64> {
        self.long_score
    }

    pub fn short_score(&self) -> Option<f64> {
        self.short_score
    }

    /// Non-null long answer span.
    pub fn has_long_answer(&self) -> bool {
        !self.long_answer_span.is_null()
    }

    /// Non-null short span or a yes/no verdict.
    pub fn has_short_answer(&self) -> bool {
        !is_null_span_list(&self.short_answer_span_list) || !self.yes_no_answer.is_none()
    }

    /// True when either confidence score was absent from the input.
    pub fn is_missing_score(&self) -> bool {
        self.long_score.is_none() || self.short_score.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yes_no_parses_any_case() {
        assert_eq!("NONE".parse::<YesNoAnswer>().unwrap(), YesNoAnswer::None);
        assert_eq!("Yes".parse::<YesNoAnswer>().unwrap(), YesNoAnswer::Yes);
        assert_eq!("no".parse::<YesNoAnswer>().unwrap(), YesNoAnswer::No);
        assert!("maybe".parse::<YesNoAnswer>().is_err());
    }

    #[test]
    fn short_answer_presence() {
        let span = Span::from_bytes(1, 3).unwrap();
        let spans_only = NqLabel::new("1", Span::null(), vec![span], YesNoAnswer::None);
        let verdict_only = NqLabel::new("1", Span::null(), vec![], YesNoAnswer::Yes);
        let nulls_only = NqLabel::new("1", Span::null(), vec![Span::null()], YesNoAnswer::None);

        assert!(spans_only.has_short_answer());
        assert!(verdict_only.has_short_answer());
        assert!(!nulls_only.has_short_answer());
        assert!(!nulls_only.has_long_answer());
    }

    #[test]
    fn scores_default_to_missing() {
        let label = NqLabel::new(7_i64, Span::null(), vec![], YesNoAnswer::None);
        assert_eq!(label.example_id().as_str(), "7");
        assert!(label.is_missing_score());

        let scored = label.with_scores(Some(1.5), Some(0.25));
        assert!(!scored.is_missing_score());
        assert_eq!(scored.long_score(), Some(1.5));
    }
}
