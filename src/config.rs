//! Evaluation settings.

use std::str::FromStr;

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};
use crate::gold::GoldPolicy;
use crate::pr_curve::PrecisionDenominator;

/// Precision levels reported by default.
pub const DEFAULT_TARGET_PRECISIONS: [f64; 3] = [0.5, 0.75, 0.9];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Raters that must supply an answer for the gold answer to exist (2 for
    /// five-way annotated data, 1 for single-rater data)
    pub min_agreeing_raters: usize,
    pub target_precisions: Vec<f64>,
    pub precision_denominator: PrecisionDenominator,
    /// Draw an indicatif progress bar while scoring
    pub show_progress: bool,
    /// off | error | warn | info | debug | trace
    pub log_level: String,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            min_agreeing_raters: GoldPolicy::adjudicated().min_agreeing_raters,
            target_precisions: DEFAULT_TARGET_PRECISIONS.to_vec(),
            precision_denominator: PrecisionDenominator::default(),
            show_progress: false,
            log_level: "info".to_string(),
        }
    }
}

impl EvalConfig {
    /// Settings for single-rater (training-style) data.
    pub fn single_rater() -> Self {
        Self {
            min_agreeing_raters: GoldPolicy::single_rater().min_agreeing_raters,
            ..Self::default()
        }
    }

    /// Parse from JSON; absent keys take their defaults. The result is validated.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn gold_policy(&self) -> GoldPolicy {
        GoldPolicy::new(self.min_agreeing_raters)
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(&self.log_level).map_err(|_| {
            EvalError::invalid_config(format!("unknown log level {:?}", self.log_level))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_agreeing_raters == 0 {
            return Err(EvalError::invalid_config("min_agreeing_raters must be at least 1"));
        }
        if let Some(t) = self
            .target_precisions
            .iter()
            .find(|t| !(0.0..=1.0).contains(*t))
        {
            return Err(EvalError::invalid_config(format!(
                "target precision {t} is outside [0, 1]"
            )));
        }
        self.level_filter()?;
        Ok(())
    }
}
