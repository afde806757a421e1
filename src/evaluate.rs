//! Batch evaluation: score every gold example against its prediction, then
//! reduce the per-example stats into one curve per sub-task.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use chrono::{DateTime, Local};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::EvalConfig;
use crate::error::{EvalError, Result};
use crate::label::{ExampleId, NqLabel};
use crate::pr_curve::{compute_pr_curve, PrSummary};
use crate::scorer::{score_example, score_missing_prediction, AnswerStat};

/// All rater annotations for one question.
#[derive(Debug, Clone, PartialEq)]
pub struct GoldExample {
    pub example_id: ExampleId,
    pub raters: Vec<NqLabel>,
}

impl GoldExample {
    pub fn new(example_id: impl Into<ExampleId>, raters: Vec<NqLabel>) -> Self {
        Self {
            example_id: example_id.into(),
            raters,
        }
    }

    pub fn num_raters(&self) -> usize {
        self.raters.len()
    }
}

/// A gold or prediction record left out of the evaluation, and why. A
/// duplicate gold record is listed here while the first record with the same
/// id is still scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedExample {
    pub example_id: Option<ExampleId>,
    pub reason: String,
}

impl RejectedExample {
    pub fn new(example_id: Option<ExampleId>, reason: impl Into<String>) -> Self {
        Self {
            example_id,
            reason: reason.into(),
        }
    }
}

/// Per-example stats for the whole batch, before the curve reduction.
#[derive(Debug, Clone, Default)]
pub struct ScoredBatch {
    pub example_ids: Vec<ExampleId>,
    pub long: Vec<AnswerStat>,
    pub short: Vec<AnswerStat>,
    pub rejected: Vec<RejectedExample>,
    pub missing_predictions: Vec<ExampleId>,
    pub missing_scores: Vec<ExampleId>,
    pub unmatched_predictions: Vec<ExampleId>,
    /// Ids with more than one prediction; the first one was scored
    pub duplicate_predictions: Vec<ExampleId>,
}

/// Engine output for one run.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub long: PrSummary,
    pub short: PrSummary,
    pub num_examples: usize,
    pub rejected: Vec<RejectedExample>,
    pub missing_predictions: Vec<ExampleId>,
    pub missing_scores: Vec<ExampleId>,
    pub unmatched_predictions: Vec<ExampleId>,
    pub duplicate_predictions: Vec<ExampleId>,
    pub generated_at: DateTime<Local>,
}

impl EvaluationReport {
    /// Flat metric map keyed like `long-best-threshold-f1` or
    /// `short-recall-at-precision-0.75`.
    pub fn metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();
        for (prefix, summary) in [("long", &self.long), ("short", &self.short)] {
            metrics.insert(format!("{prefix}-best-threshold-f1"), summary.best.f1);
            metrics.insert(format!("{prefix}-best-threshold-precision"), summary.best.precision);
            metrics.insert(format!("{prefix}-best-threshold-recall"), summary.best.recall);
            metrics.insert(format!("{prefix}-best-threshold"), summary.best.threshold);
            for &(target, recall) in &summary.recall_at_precision {
                metrics.insert(format!("{prefix}-recall-at-precision-{target}"), recall);
            }
        }
        metrics
    }

    /// Append rejections made upstream (e.g. while parsing).
    pub fn with_rejected(mut self, rejected: Vec<RejectedExample>) -> Self {
        self.rejected.extend(rejected);
        self
    }
}

fn write_summary(f: &mut fmt::Formatter<'_>, title: &str, summary: &PrSummary) -> fmt::Result {
    writeln!(f, "================== {title} ==================")?;
    writeln!(
        f,
        "best threshold {:>8.4} | F1 {:6.4} | precision {:6.4} | recall {:6.4}",
        summary.best.threshold, summary.best.f1, summary.best.precision, summary.best.recall
    )?;
    for (target, recall) in &summary.recall_at_precision {
        writeln!(f, "    recall @ precision {target:<5}: {recall:6.4}")?;
    }
    writeln!(f, "    gold answers: {}", summary.total_gold)
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_summary(f, "LONG ANSWER", &self.long)?;
        write_summary(f, "SHORT ANSWER", &self.short)?;
        writeln!(f, "================== COVERAGE ==================")?;
        writeln!(f, "examples scored       : {}", self.num_examples)?;
        writeln!(f, "rejected              : {}", self.rejected.len())?;
        writeln!(f, "missing predictions   : {}", self.missing_predictions.len())?;
        writeln!(f, "missing scores        : {}", self.missing_scores.len())?;
        writeln!(f, "unmatched predictions : {}", self.unmatched_predictions.len())?;
        write!(f, "duplicate predictions : {}", self.duplicate_predictions.len())
    }
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

/// Scores gold examples against predictions under one configuration.
#[derive(Debug, Clone)]
pub struct Evaluator {
    config: EvalConfig,
}

impl Evaluator {
    pub fn new(config: EvalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Per-example pass. Examples are visited in ascending id order. Examples
    /// without raters and duplicate gold ids are rejected, later predictions
    /// for an id are listed as duplicates, and gold examples without a
    /// prediction are scored as unanswered.
    ///
    /// Fails when the accepted gold examples disagree on their rater count,
    /// when nothing is left to score, or on any error that is not tied to a
    /// single example.
    pub fn score_examples(
        &self,
        gold: &[GoldExample],
        predictions: &[NqLabel],
    ) -> Result<ScoredBatch> {
        let policy = self.config.gold_policy();
        let mut batch = ScoredBatch::default();

        // predictions by id, first one wins
        let mut by_id: HashMap<&ExampleId, &NqLabel> = HashMap::with_capacity(predictions.len());
        for pred in predictions {
            match by_id.entry(pred.example_id()) {
                Entry::Vacant(slot) => {
                    slot.insert(pred);
                }
                Entry::Occupied(_) => {
                    warn!("duplicate prediction for example {}", pred.example_id());
                    batch.duplicate_predictions.push(pred.example_id().clone());
                }
            }
        }

        // gold by id, rejecting duplicates and empty rater lists
        let mut accepted: BTreeMap<&ExampleId, &GoldExample> = BTreeMap::new();
        for example in gold {
            if example.raters.is_empty() {
                let err = EvalError::malformed(
                    example.example_id.to_string(),
                    "example has zero raters",
                );
                warn!("{err}");
                batch
                    .rejected
                    .push(RejectedExample::new(Some(example.example_id.clone()), err.to_string()));
            } else if accepted.contains_key(&example.example_id) {
                warn!("duplicate gold example {}", example.example_id);
                batch.rejected.push(RejectedExample::new(
                    Some(example.example_id.clone()),
                    "duplicate gold example",
                ));
            } else {
                accepted.insert(&example.example_id, example);
            }
        }

        if accepted.is_empty() {
            return Err(EvalError::EmptyGoldSet);
        }
        let rater_counts: BTreeSet<usize> = accepted.values().map(|e| e.num_raters()).collect();
        if rater_counts.len() > 1 {
            return Err(EvalError::InconsistentRaterCounts(rater_counts.into_iter().collect()));
        }
        if let Some(&n) = rater_counts.iter().next() {
            if policy.min_agreeing_raters > n {
                warn!(
                    "min_agreeing_raters={} exceeds the {n} raters per example; \
                     no gold answer can exist",
                    policy.min_agreeing_raters
                );
            }
        }

        let bar = progress_bar(accepted.len(), self.config.show_progress);
        for (id, example) in &accepted {
            let scored = match by_id.get(id) {
                Some(pred) => {
                    if pred.is_missing_score() {
                        debug!("prediction for {id} has no score; ranking it at 0");
                        batch.missing_scores.push((*id).clone());
                    }
                    score_example(&example.raters, pred, &policy)
                }
                None => {
                    debug!("{}", EvalError::MissingPrediction(id.to_string()));
                    batch.missing_predictions.push((*id).clone());
                    score_missing_prediction(&example.raters, &policy)
                }
            };
            match scored {
                Ok(scores) => {
                    batch.example_ids.push((*id).clone());
                    batch.long.push(scores.long);
                    batch.short.push(scores.short);
                }
                Err(e) if e.is_per_example() => {
                    warn!("rejected example {id}: {e}");
                    batch
                        .rejected
                        .push(RejectedExample::new(Some((*id).clone()), e.to_string()));
                }
                Err(e) => {
                    bar.abandon();
                    return Err(e);
                }
            }
            bar.inc(1);
        }
        bar.finish_and_clear();

        let mut unmatched: Vec<ExampleId> = by_id
            .keys()
            .filter(|id| !accepted.contains_key(*id))
            .map(|id| (*id).clone())
            .collect();
        unmatched.sort();
        if !unmatched.is_empty() {
            warn!("{} predictions have no gold example and are ignored", unmatched.len());
        }
        batch.unmatched_predictions = unmatched;

        Ok(batch)
    }

    /// Reduce a scored batch into curve summaries.
    pub fn summarise(&self, batch: ScoredBatch) -> EvaluationReport {
        let targets = &self.config.target_precisions;
        let denominator = self.config.precision_denominator;
        let report = EvaluationReport {
            long: compute_pr_curve(&batch.long, targets, denominator),
            short: compute_pr_curve(&batch.short, targets, denominator),
            num_examples: batch.example_ids.len(),
            rejected: batch.rejected,
            missing_predictions: batch.missing_predictions,
            missing_scores: batch.missing_scores,
            unmatched_predictions: batch.unmatched_predictions,
            duplicate_predictions: batch.duplicate_predictions,
            generated_at: Local::now(),
        };
        info!(
            "evaluated {} examples: long F1 {:.4}, short F1 {:.4}",
            report.num_examples, report.long.best.f1, report.short.best.f1
        );
        report
    }

    pub fn evaluate(
        &self,
        gold: &[GoldExample],
        predictions: &[NqLabel],
    ) -> Result<EvaluationReport> {
        let batch = self.score_examples(gold, predictions)?;
        Ok(self.summarise(batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gold::GoldPolicy;
    use crate::label::YesNoAnswer;
    use crate::span::Span;

    fn long_label(id: &str, span: Option<(i64, i64)>) -> NqLabel {
        let span = span
            .map(|(s, e)| Span::from_tokens(s, e).unwrap())
            .unwrap_or_default();
        NqLabel::new(id, span, vec![], YesNoAnswer::None)
    }

    fn single_rater_gold(id: &str, span: Option<(i64, i64)>) -> GoldExample {
        GoldExample::new(id, vec![long_label(id, span)])
    }

    fn evaluator() -> Evaluator {
        Evaluator::new(EvalConfig::single_rater()).unwrap()
    }

    #[test]
    fn missing_prediction_counts_against_recall() {
        let gold = vec![
            single_rater_gold("a", Some((0, 5))),
            single_rater_gold("b", Some((3, 9))),
        ];
        let preds = vec![long_label("a", Some((0, 5))).with_scores(Some(1.0), Some(0.0))];

        let report = evaluator().evaluate(&gold, &preds).unwrap();
        assert_eq!(report.num_examples, 2);
        assert_eq!(report.missing_predictions, vec![ExampleId::from("b")]);
        assert_eq!(report.long.best.recall, 0.5);
        assert_eq!(report.long.best.precision, 1.0);
    }

    #[test]
    fn rater_count_mismatch_is_fatal() {
        let gold = vec![
            single_rater_gold("a", Some((0, 5))),
            GoldExample::new("b", vec![long_label("b", None), long_label("b", None)]),
        ];
        let err = evaluator().evaluate(&gold, &[]).unwrap_err();
        match err {
            EvalError::InconsistentRaterCounts(counts) => assert_eq!(counts, vec![1, 2]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_gold_is_fatal() {
        assert!(matches!(
            evaluator().evaluate(&[], &[]).unwrap_err(),
            EvalError::EmptyGoldSet
        ));
        let only_bad = vec![GoldExample::new("x", vec![])];
        assert!(matches!(
            evaluator().evaluate(&only_bad, &[]).unwrap_err(),
            EvalError::EmptyGoldSet
        ));
    }

    #[test]
    fn bad_examples_are_reported_and_skipped() {
        let gold = vec![
            GoldExample::new("empty", vec![]),
            single_rater_gold("a", Some((0, 5))),
            single_rater_gold("a", None),
        ];
        let preds = vec![
            long_label("a", Some((0, 5))).with_scores(Some(2.0), Some(0.0)),
            long_label("a", None).with_scores(Some(9.0), Some(0.0)),
            long_label("ghost", Some((1, 2))),
        ];

        let report = evaluator().evaluate(&gold, &preds).unwrap();
        assert_eq!(report.num_examples, 1);
        assert_eq!(report.long.best.f1, 1.0);
        assert_eq!(report.unmatched_predictions, vec![ExampleId::from("ghost")]);

        // the first prediction for "a" was scored, the second only reported
        assert_eq!(report.duplicate_predictions, vec![ExampleId::from("a")]);

        let reasons: Vec<&str> = report.rejected.iter().map(|r| r.reason.as_str()).collect();
        assert!(!reasons.contains(&"duplicate prediction"));
        assert!(reasons.contains(&"duplicate gold example"));
        assert!(reasons.iter().any(|r| r.contains("zero raters")));
    }

    #[test]
    fn unscored_predictions_are_flagged() {
        let gold = vec![single_rater_gold("a", Some((0, 5)))];
        let preds = vec![long_label("a", Some((0, 5)))];
        let report = evaluator().evaluate(&gold, &preds).unwrap();
        assert_eq!(report.missing_scores, vec![ExampleId::from("a")]);
        assert_eq!(report.long.best.threshold, 0.0);
        assert_eq!(report.long.best.f1, 1.0);
    }

    #[test]
    fn metric_keys() {
        let gold = vec![single_rater_gold("a", Some((0, 5)))];
        let report = evaluator().evaluate(&gold, &[]).unwrap();
        let metrics = report.metrics();

        for key in [
            "long-best-threshold-f1",
            "long-best-threshold-precision",
            "long-best-threshold-recall",
            "long-best-threshold",
            "long-recall-at-precision-0.5",
            "long-recall-at-precision-0.75",
            "long-recall-at-precision-0.9",
            "short-best-threshold-f1",
            "short-recall-at-precision-0.9",
        ] {
            assert!(metrics.contains_key(key), "missing {key}");
        }
        assert_eq!(metrics.len(), 14);
        assert!(report.to_string().contains("LONG ANSWER"));
    }

    #[test]
    fn invalid_config_is_refused() {
        let bad = EvalConfig {
            min_agreeing_raters: 0,
            ..EvalConfig::default()
        };
        assert!(matches!(Evaluator::new(bad), Err(EvalError::InvalidConfig(_))));
        assert_eq!(evaluator().config().gold_policy(), GoldPolicy::single_rater());
    }

    #[test]
    fn examples_are_scored_in_id_order() {
        let gold = vec![
            single_rater_gold("c", None),
            single_rater_gold("a", None),
            single_rater_gold("b", None),
        ];
        let batch = evaluator().score_examples(&gold, &[]).unwrap();
        let ids: Vec<&str> = batch.example_ids.iter().map(ExampleId::as_str).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(batch.missing_predictions.len(), 3);
    }
}
