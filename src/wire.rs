//! JSON shapes of gold annotations and predictions.
//!
//! Gold data is one object per example (JSON lines or a JSON array):
//!
//! ```text
//! {"example_id": -1220107454853145579,
//!  "annotations": [{"long_answer": {"start_token": 10, "end_token": 50, "start_byte": 100, "end_byte": 400},
//!                   "short_answers": [...], "yes_no_answer": "NONE"}, ...]}
//! ```
//!
//! Predictions come wrapped in `{"predictions": [...]}`. Records that fail to
//! convert, and JSON lines that fail to read, are collected as rejections;
//! only a document that is not JSON at all is an error.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EvalError, Result};
use crate::evaluate::{GoldExample, RejectedExample};
use crate::label::{ExampleId, NqLabel, YesNoAnswer};
use crate::span::{Span, ABSENT};

fn absent() -> i64 {
    ABSENT
}

// accept either 123 or "123" for example_id
fn de_example_id<'de, D>(de: D) -> std::result::Result<ExampleId, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct Visitor;
    impl<'de> serde::de::Visitor<'de> for Visitor {
        type Value = ExampleId;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("integer or string for example_id")
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
            Ok(ExampleId::from(v))
        }
        fn visit_u64<E: serde::de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
            Ok(ExampleId::new(v.to_string()))
        }
        fn visit_str<E: serde::de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
            if v.is_empty() {
                return Err(E::custom("empty example_id"));
            }
            Ok(ExampleId::new(v))
        }
    }
    de.deserialize_any(Visitor)
}

fn de_yes_no<'de, D>(de: D) -> std::result::Result<YesNoAnswer, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<String>::deserialize(de)? {
        Some(raw) => raw.parse().map_err(serde::de::Error::custom),
        None => Ok(YesNoAnswer::None),
    }
}

/// Four-offset span; omitted offsets read as `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSpan {
    #[serde(default = "absent")]
    pub start_token: i64,
    #[serde(default = "absent")]
    pub end_token: i64,
    #[serde(default = "absent")]
    pub start_byte: i64,
    #[serde(default = "absent")]
    pub end_byte: i64,
}

impl Default for WireSpan {
    fn default() -> Self {
        Self::from(&Span::null())
    }
}

impl WireSpan {
    pub fn to_span(&self) -> Result<Span> {
        Span::new(self.start_token, self.end_token, self.start_byte, self.end_byte)
    }
}

impl From<&Span> for WireSpan {
    fn from(span: &Span) -> Self {
        Self {
            start_token: span.start_token(),
            end_token: span.end_token(),
            start_byte: span.start_byte(),
            end_byte: span.end_byte(),
        }
    }
}

fn to_spans(spans: &[WireSpan]) -> Result<Vec<Span>> {
    spans.iter().map(WireSpan::to_span).collect()
}

/// One rater's annotation. All three fields are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireAnnotation {
    pub long_answer: WireSpan,
    pub short_answers: Vec<WireSpan>,
    #[serde(deserialize_with = "de_yes_no")]
    pub yes_no_answer: YesNoAnswer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireGoldExample {
    #[serde(deserialize_with = "de_example_id")]
    pub example_id: ExampleId,
    pub annotations: Vec<WireAnnotation>,
}

impl WireGoldExample {
    pub fn into_gold(self) -> Result<GoldExample> {
        let raters = self
            .annotations
            .iter()
            .map(|a| {
                Ok(NqLabel::new(
                    self.example_id.clone(),
                    a.long_answer.to_span()?,
                    to_spans(&a.short_answers)?,
                    a.yes_no_answer,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(GoldExample::new(self.example_id, raters))
    }
}

/// One system prediction. Everything but the id may be omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WirePrediction {
    #[serde(deserialize_with = "de_example_id")]
    pub example_id: ExampleId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_answer: Option<WireSpan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_answer_score: Option<f64>,
    #[serde(default)]
    pub short_answers: Vec<WireSpan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_answers_score: Option<f64>,
    #[serde(default, deserialize_with = "de_yes_no")]
    pub yes_no_answer: YesNoAnswer,
}

impl WirePrediction {
    pub fn into_label(self) -> Result<NqLabel> {
        let long = match &self.long_answer {
            Some(span) => span.to_span()?,
            None => Span::null(),
        };
        Ok(NqLabel::new(
            self.example_id,
            long,
            to_spans(&self.short_answers)?,
            self.yes_no_answer,
        )
        .with_scores(self.long_answer_score, self.short_answers_score))
    }

    pub fn from_label(label: &NqLabel) -> Self {
        Self {
            example_id: label.example_id().clone(),
            long_answer: label.has_long_answer().then(|| WireSpan::from(label.long_answer_span())),
            long_answer_score: label.long_score(),
            short_answers: label.short_answer_span_list().iter().map(WireSpan::from).collect(),
            short_answers_score: label.short_score(),
            yes_no_answer: label.yes_no_answer(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WirePredictionFile {
    pub predictions: Vec<WirePrediction>,
}

impl WirePredictionFile {
    pub fn from_labels(labels: &[NqLabel]) -> Self {
        Self {
            predictions: labels.iter().map(WirePrediction::from_label).collect(),
        }
    }
}

/// Converted records plus the ones that were turned away.
#[derive(Debug, Clone)]
pub struct Parsed<T> {
    pub records: Vec<T>,
    pub rejected: Vec<RejectedExample>,
}

fn id_hint(value: &Value) -> Option<ExampleId> {
    match value.get("example_id")? {
        Value::String(s) => Some(ExampleId::new(s.as_str())),
        Value::Number(n) => Some(ExampleId::new(n.to_string())),
        _ => None,
    }
}

fn convert_each<W, T, F>(values: Vec<Value>, kind: &str, convert: F) -> Parsed<T>
where
    W: serde::de::DeserializeOwned,
    F: Fn(W) -> Result<T>,
{
    let mut parsed = Parsed {
        records: Vec::with_capacity(values.len()),
        rejected: Vec::new(),
    };
    for value in values {
        let hint = id_hint(&value);
        let converted = serde_json::from_value::<W>(value)
            .map_err(|e| {
                let id = hint.as_ref().map(ToString::to_string).unwrap_or_default();
                EvalError::malformed(id, e.to_string())
            })
            .and_then(&convert);
        match converted {
            Ok(record) => parsed.records.push(record),
            Err(e) => {
                warn!("rejected {kind} {:?}: {e}", hint);
                parsed.rejected.push(RejectedExample::new(hint, e.to_string()));
            }
        }
    }
    debug!(
        "parsed {} {kind} records, rejected {}",
        parsed.records.len(),
        parsed.rejected.len()
    );
    parsed
}

/// Gold examples from a JSON array or from JSON lines. In JSON lines mode an
/// unreadable line is rejected on its own; the input is an error only when no
/// line reads as JSON.
pub fn parse_gold_examples(text: &str) -> Result<Parsed<GoldExample>> {
    if text.trim_start().starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(text)?;
        return Ok(convert_each(values, "gold example", WireGoldExample::into_gold));
    }

    let mut values = Vec::new();
    let mut unreadable = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(value) => values.push(value),
            Err(e) => {
                warn!("unreadable gold line {}: {e}", idx + 1);
                unreadable.push((idx + 1, e));
            }
        }
    }
    if values.is_empty() {
        if let Some((_, e)) = unreadable.into_iter().next() {
            return Err(e.into());
        }
        return Ok(Parsed {
            records: Vec::new(),
            rejected: Vec::new(),
        });
    }

    let mut parsed = convert_each(values, "gold example", WireGoldExample::into_gold);
    parsed.rejected.extend(
        unreadable
            .into_iter()
            .map(|(line, e)| RejectedExample::new(None, format!("line {line}: {e}"))),
    );
    Ok(parsed)
}

/// Predictions from a `{"predictions": [...]}` document.
pub fn parse_predictions(text: &str) -> Result<Parsed<NqLabel>> {
    let root: Value = serde_json::from_str(text)?;
    let values = match root {
        Value::Object(mut obj) => match obj.remove("predictions") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(EvalError::malformed(
                    "",
                    "prediction document needs a \"predictions\" array",
                ))
            }
        },
        _ => {
            return Err(EvalError::malformed(
                "",
                "prediction document must be a JSON object",
            ))
        }
    };
    Ok(convert_each(values, "prediction", WirePrediction::into_label))
}
