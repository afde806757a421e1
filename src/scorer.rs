//! Per-example correctness for the long and short answer sub-tasks.

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};
use crate::gold::{has_gold_long_answer, has_gold_short_answer, GoldPolicy};
use crate::label::NqLabel;
use crate::span::{is_null_span_list, span_equal, span_set_equal};

/// One example's contribution to a precision-recall curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnswerStat {
    pub has_gold_answer: bool,
    pub has_pred_answer: bool,
    pub is_correct: bool,
    pub score: f64,
}

impl AnswerStat {
    pub fn new(has_gold_answer: bool, has_pred_answer: bool, is_correct: bool, score: f64) -> Self {
        Self {
            has_gold_answer,
            has_pred_answer,
            is_correct,
            score,
        }
    }
}

/// Long and short stats for the same example.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExampleScores {
    pub long: AnswerStat,
    pub short: AnswerStat,
}

fn require_raters(gold: &[NqLabel], pred: Option<&NqLabel>) -> Result<()> {
    if gold.is_empty() {
        let id = pred.map(|p| p.example_id().to_string()).unwrap_or_default();
        return Err(EvalError::malformed(id, "example has zero raters"));
    }
    Ok(())
}

/// Long answer: correct when the gold answer exists and the predicted span
/// reproduces any single rater's non-null span exactly.
pub fn score_long_answer(
    gold: &[NqLabel],
    pred: &NqLabel,
    policy: &GoldPolicy,
) -> Result<AnswerStat> {
    require_raters(gold, Some(pred))?;

    let has_gold_answer = has_gold_long_answer(gold, policy);
    let has_pred_answer = pred.has_long_answer();
    let is_correct = has_gold_answer
        && has_pred_answer
        && gold
            .iter()
            .filter(|rater| rater.has_long_answer())
            .any(|rater| span_equal(rater.long_answer_span(), pred.long_answer_span()));

    Ok(AnswerStat::new(
        has_gold_answer,
        has_pred_answer,
        is_correct,
        pred.long_score().unwrap_or(0.0),
    ))
}

/// Short answer: a yes/no prediction matches on verdict only, a span
/// prediction matches a verdict-free rater's span set exactly. The two kinds
/// never match each other.
pub fn score_short_answer(
    gold: &[NqLabel],
    pred: &NqLabel,
    policy: &GoldPolicy,
) -> Result<AnswerStat> {
    require_raters(gold, Some(pred))?;

    let has_gold_answer = has_gold_short_answer(gold, policy);
    let has_pred_answer = pred.has_short_answer();

    let is_correct = has_gold_answer && has_pred_answer && short_answer_matches(gold, pred);

    Ok(AnswerStat::new(
        has_gold_answer,
        has_pred_answer,
        is_correct,
        pred.short_score().unwrap_or(0.0),
    ))
}

fn short_answer_matches(gold: &[NqLabel], pred: &NqLabel) -> bool {
    let verdict = pred.yes_no_answer();
    if !verdict.is_none() {
        return gold
            .iter()
            .any(|rater| !rater.yes_no_answer().is_none() && rater.yes_no_answer() == verdict);
    }
    gold.iter().any(|rater| {
        rater.yes_no_answer().is_none()
            && !is_null_span_list(rater.short_answer_span_list())
            && span_set_equal(rater.short_answer_span_list(), pred.short_answer_span_list())
    })
}

/// Both sub-tasks for one example.
pub fn score_example(
    gold: &[NqLabel],
    pred: &NqLabel,
    policy: &GoldPolicy,
) -> Result<ExampleScores> {
    Ok(ExampleScores {
        long: score_long_answer(gold, pred, policy)?,
        short: score_short_answer(gold, pred, policy)?,
    })
}

/// Stats for a gold example that received no prediction: nothing predicted,
/// nothing correct, ranked at score 0.
pub fn score_missing_prediction(gold: &[NqLabel], policy: &GoldPolicy) -> Result<ExampleScores> {
    require_raters(gold, None)?;
    Ok(ExampleScores {
        long: AnswerStat::new(has_gold_long_answer(gold, policy), false, false, 0.0),
        short: AnswerStat::new(has_gold_short_answer(gold, policy), false, false, 0.0),
    })
}
