//! Precision-recall curves over per-example answer stats.
//!
//! Stats are ranked by descending score and every prefix of the ranking is one
//! operating point. The reported best point maximises F1; recall at a target
//! precision is the largest recall among points that reach the target.
//!
//! # Example
//!
//! ```rust
//! use nq_eval::pr_curve::{compute_pr_curve, PrecisionDenominator};
//! use nq_eval::scorer::AnswerStat;
//!
//! let stats = vec![
//!     AnswerStat::new(true, true, true, 1.0),
//!     AnswerStat::new(false, true, false, 10.0),
//! ];
//! let summary = compute_pr_curve(&stats, &[0.5, 0.75], PrecisionDenominator::AllExamples);
//!
//! assert_eq!(summary.best.precision, 0.5);
//! assert_eq!(summary.best.recall, 1.0);
//! assert_eq!(summary.recall_at_precision, vec![(0.5, 1.0), (0.75, 0.0)]);
//! ```

use serde::{Deserialize, Serialize};

use crate::scorer::AnswerStat;

/// Which ranked stats count toward the precision denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecisionDenominator {
    /// Every ranked example, with or without a predicted answer.
    #[default]
    AllExamples,
    /// Only examples whose prediction claims an answer.
    PredictedOnly,
}

/// Metrics after admitting one more ranked example.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Score of the last admitted example
    pub threshold: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Precision denominator so far
    pub num_predicted: usize,
    pub num_correct: usize,
}

/// Best-F1 point of a curve.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OperatingPoint {
    pub threshold: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl From<&CurvePoint> for OperatingPoint {
    fn from(p: &CurvePoint) -> Self {
        Self {
            threshold: p.threshold,
            precision: p.precision,
            recall: p.recall,
            f1: p.f1,
        }
    }
}

/// Curve summary for one sub-task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrSummary {
    pub best: OperatingPoint,
    /// `(target precision, best recall at that precision)` in caller order
    pub recall_at_precision: Vec<(f64, f64)>,
    pub curve: Vec<CurvePoint>,
    /// Recall denominator
    pub total_gold: usize,
}

fn safe_divide(x: f64, y: f64) -> f64 {
    if y == 0.0 {
        0.0
    } else {
        x / y
    }
}

pub fn f1_score(precision: f64, recall: f64) -> f64 {
    safe_divide(2.0 * precision * recall, precision + recall)
}

/// Stable descending sort by score: equal scores keep input order.
pub fn rank_by_score(stats: &[AnswerStat]) -> Vec<AnswerStat> {
    let mut ranked = stats.to_vec();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

/// One curve point per prefix of the score ranking.
pub fn curve_points(ranked: &[AnswerStat], denominator: PrecisionDenominator) -> Vec<CurvePoint> {
    let total_gold = ranked.iter().filter(|s| s.has_gold_answer).count();

    let mut num_predicted = 0usize;
    let mut num_correct = 0usize;
    ranked
        .iter()
        .map(|stat| {
            if denominator == PrecisionDenominator::AllExamples || stat.has_pred_answer {
                num_predicted += 1;
            }
            if stat.is_correct {
                num_correct += 1;
            }
            let precision = safe_divide(num_correct as f64, num_predicted as f64);
            let recall = safe_divide(num_correct as f64, total_gold as f64);
            CurvePoint {
                threshold: stat.score,
                precision,
                recall,
                f1: f1_score(precision, recall),
                num_predicted,
                num_correct,
            }
        })
        .collect()
}

/// Earliest point with the highest F1; zeroed for an empty curve.
pub fn best_operating_point(curve: &[CurvePoint]) -> OperatingPoint {
    let mut best: Option<&CurvePoint> = None;
    for point in curve {
        // strict: ties keep the higher threshold
        if best.map_or(true, |b| point.f1 > b.f1) {
            best = Some(point);
        }
    }
    best.map(OperatingPoint::from).unwrap_or_default()
}

/// Largest recall among points with precision at or above `target`; `0.0`
/// when no point qualifies. Recall is not assumed monotonic.
pub fn recall_at_precision(curve: &[CurvePoint], target: f64) -> f64 {
    curve
        .iter()
        .filter(|p| p.precision >= target)
        .map(|p| p.recall)
        .fold(0.0, f64::max)
}

/// Rank `stats`, build the curve and summarise it.
pub fn compute_pr_curve(
    stats: &[AnswerStat],
    targets: &[f64],
    denominator: PrecisionDenominator,
) -> PrSummary {
    let ranked = rank_by_score(stats);
    let curve = curve_points(&ranked, denominator);
    let best = best_operating_point(&curve);
    let recall_at_precision = targets
        .iter()
        .map(|&t| (t, recall_at_precision(&curve, t)))
        .collect();

    PrSummary {
        best,
        recall_at_precision,
        total_gold: ranked.iter().filter(|s| s.has_gold_answer).count(),
        curve,
    }
}
