//! Evaluation of Natural Questions style reading-comprehension predictions.
//!
//! Gold examples carry one annotation per rater; a prediction carries one long
//! answer span, a set of short answer spans or a yes/no verdict, and a
//! confidence score per sub-task. Each example is scored against its raters,
//! then the per-example stats are ranked by score into a precision-recall
//! curve for the long and short answer sub-tasks.
//!
//! ```rust
//! use nq_eval::{wire, EvalConfig, Evaluator};
//!
//! # fn main() -> nq_eval::Result<()> {
//! let gold = wire::parse_gold_examples(
//!     r#"[{"example_id": 1, "annotations": [{"long_answer": {"start_byte": 0, "end_byte": 40},
//!        "short_answers": [], "yes_no_answer": "NONE"}]}]"#,
//! )?;
//! let preds = wire::parse_predictions(
//!     r#"{"predictions": [{"example_id": 1,
//!        "long_answer": {"start_byte": 0, "end_byte": 40}, "long_answer_score": 3.0}]}"#,
//! )?;
//!
//! let evaluator = Evaluator::new(EvalConfig::single_rater())?;
//! let report = evaluator.evaluate(&gold.records, &preds.records)?;
//! assert_eq!(report.metrics()["long-best-threshold-f1"], 1.0);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod evaluate;
pub mod gold;
pub mod label;
pub mod logging;
pub mod pr_curve;
pub mod scorer;
pub mod span;
pub mod synthetic;
pub mod wire;

pub use config::EvalConfig;
pub use error::{EvalError, Result};
pub use evaluate::{EvaluationReport, Evaluator, GoldExample, RejectedExample};
pub use gold::GoldPolicy;
pub use label::{ExampleId, NqLabel, YesNoAnswer};
pub use pr_curve::{compute_pr_curve, PrSummary, PrecisionDenominator};
pub use scorer::AnswerStat;
pub use span::Span;
