//! Synthetic predictions built from gold annotations, for exercising the
//! evaluator end to end.
//!
//! 1. True answers are dropped at rate `1 - desired_recall`.
//! 2. Scores are uniform in `[0, 1)` and doubled for kept true answers.
//! 3. With `generate_false_positives`, examples without a gold answer get a
//!    first-token long and short answer.

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};
use crate::evaluate::GoldExample;
use crate::gold::{has_gold_long_answer, has_gold_short_answer, GoldPolicy};
use crate::label::{NqLabel, YesNoAnswer};
use crate::span::{is_null_span_list, Span};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    /// Probability of keeping an example's true answers
    pub desired_recall: f64,
    pub generate_false_positives: bool,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            desired_recall: 1.0,
            generate_false_positives: false,
        }
    }
}

impl SyntheticConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.desired_recall) {
            return Err(EvalError::invalid_config(format!(
                "desired_recall {} is outside [0, 1]",
                self.desired_recall
            )));
        }
        Ok(())
    }
}

fn first_token() -> Result<Span> {
    Span::from_tokens(0, 1)
}

/// One prediction per gold example, in input order.
pub fn predictions_from_gold<R: Rng + ?Sized>(
    gold: &[GoldExample],
    config: &SyntheticConfig,
    policy: &GoldPolicy,
    rng: &mut R,
) -> Result<Vec<NqLabel>> {
    config.validate()?;
    gold.iter()
        .map(|example| prediction_for(example, config, policy, &mut *rng))
        .collect()
}

fn prediction_for<R: Rng + ?Sized>(
    example: &GoldExample,
    config: &SyntheticConfig,
    policy: &GoldPolicy,
    rng: &mut R,
) -> Result<NqLabel> {
    let gold_has_long = has_gold_long_answer(&example.raters, policy);
    let gold_has_short = has_gold_short_answer(&example.raters, policy);

    let mut long_score: f64 = rng.gen();
    let mut short_score: f64 = rng.gen();
    let keep = rng.gen::<f64>() < config.desired_recall;

    let mut long = Span::null();
    let mut short = Vec::new();
    let mut yes_no = YesNoAnswer::None;

    if keep {
        // last qualifying rater wins
        for rater in &example.raters {
            if gold_has_short {
                if !is_null_span_list(rater.short_answer_span_list()) {
                    short = rater.short_answer_span_list().to_vec();
                    yes_no = YesNoAnswer::None;
                } else if !rater.yes_no_answer().is_none() {
                    short.clear();
                    yes_no = rater.yes_no_answer();
                }
            }
            if gold_has_long && rater.has_long_answer() {
                long = *rater.long_answer_span();
            }
        }
        if gold_has_short {
            short_score *= 2.0;
        }
        if gold_has_long {
            long_score *= 2.0;
        }
    } else {
        debug!("dropping true answers for {}", example.example_id);
    }

    if config.generate_false_positives {
        if !gold_has_short {
            short = vec![first_token()?];
        }
        if !gold_has_long {
            long = first_token()?;
        }
    }

    Ok(NqLabel::new(example.example_id.clone(), long, short, yes_no)
        .with_scores(Some(long_score), Some(short_score)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rater(long: Option<(i64, i64)>, short: &[(i64, i64)], yes_no: YesNoAnswer) -> NqLabel {
        let long = long
            .map(|(s, e)| Span::from_bytes(s, e).unwrap())
            .unwrap_or_default();
        let short = short
            .iter()
            .map(|&(s, e)| Span::from_bytes(s, e).unwrap())
            .collect();
        NqLabel::new("q", long, short, yes_no)
    }

    fn answered() -> GoldExample {
        GoldExample::new(
            "q",
            vec![
                rater(Some((0, 50)), &[(5, 9)], YesNoAnswer::None),
                rater(Some((0, 50)), &[], YesNoAnswer::Yes),
            ],
        )
    }

    fn unanswered() -> GoldExample {
        GoldExample::new(
            "n",
            vec![
                rater(None, &[], YesNoAnswer::None),
                rater(None, &[], YesNoAnswer::None),
            ],
        )
    }

    #[test]
    fn full_recall_copies_gold() {
        let mut rng = StdRng::seed_from_u64(7);
        let preds = predictions_from_gold(
            &[answered()],
            &SyntheticConfig::default(),
            &GoldPolicy::adjudicated(),
            &mut rng,
        )
        .unwrap();

        let pred = &preds[0];
        assert_eq!(pred.long_answer_span(), &Span::from_bytes(0, 50).unwrap());
        // last rater gave a verdict
        assert_eq!(pred.yes_no_answer(), YesNoAnswer::Yes);
        assert!(pred.short_answer_span_list().is_empty());
        assert!(!pred.is_missing_score());
    }

    #[test]
    fn zero_recall_predicts_nothing() {
        let mut rng = StdRng::seed_from_u64(7);
        let config = SyntheticConfig {
            desired_recall: 0.0,
            ..SyntheticConfig::default()
        };
        let preds =
            predictions_from_gold(&[answered()], &config, &GoldPolicy::adjudicated(), &mut rng)
                .unwrap();
        assert!(!preds[0].has_long_answer());
        assert!(!preds[0].has_short_answer());
        assert!(preds[0].long_score().unwrap() < 1.0);
    }

    #[test]
    fn false_positives_on_empty_gold() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = SyntheticConfig {
            generate_false_positives: true,
            ..SyntheticConfig::default()
        };
        let preds =
            predictions_from_gold(&[unanswered()], &config, &GoldPolicy::adjudicated(), &mut rng)
                .unwrap();
        let token = Span::from_tokens(0, 1).unwrap();
        assert_eq!(preds[0].long_answer_span(), &token);
        assert_eq!(preds[0].short_answer_span_list(), &[token]);
    }

    #[test]
    fn rejects_out_of_range_recall() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = SyntheticConfig {
            desired_recall: 1.5,
            ..SyntheticConfig::default()
        };
        let result =
            predictions_from_gold(&[answered()], &config, &GoldPolicy::default(), &mut rng);
        assert!(result.is_err());
    }
}
