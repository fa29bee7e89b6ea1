//! Webhook payload normalisation.
//!
//! The analysis webhook is not consistent about the shape of its response.
//! Seen in the wild:
//!
//! - a bare array of case objects
//! - an object wrapping the array in `items`
//! - a single case object
//! - any of the above embedded in surrounding text (log lines, markdown
//!   fences, a JSON string holding the JSON)
//!
//! Each shape is an attempt in a fixed chain; the first that yields a
//! candidate sequence wins. Candidates are then converted one by one into
//! [`CanonicalCase`]s, dropping any that lack a required field.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::case::{self, CanonicalCase};
use crate::error::{MalformedCase, PipelineError};

/// First `[` to last `]`, or first `{` to last `}`, whichever opens earlier.
static EMBEDDED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)(\[.*\]|\{.*\})").expect("static regex"));

/// Recognised payload shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadShape {
    /// `[ {...}, {...} ]`
    Sequence(Vec<Value>),
    /// `{ "items": [ {...} ] }`
    Items(Vec<Value>),
    /// `{ "lettertodriver1": ..., "lettertodriver2": ... }`
    Single(Value),
}

impl PayloadShape {
    /// Classify a parsed JSON value, or `None` when it matches no known shape.
    ///
    /// A JSON string is unwrapped once more, since some webhook nodes
    /// serialise their output twice.
    pub fn detect(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(Self::Sequence(items)),
            Value::Object(mut map) => {
                if matches!(map.get("items"), Some(Value::Array(_))) {
                    let Some(Value::Array(items)) = map.remove("items") else {
                        return None;
                    };
                    return Some(Self::Items(items));
                }
                let value = Value::Object(map);
                case::has_letters(&value).then_some(Self::Single(value))
            }
            Value::String(text) => serde_json::from_str::<Value>(text.trim())
                .ok()
                .and_then(Self::detect),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sequence(_) => "sequence",
            Self::Items(_) => "items",
            Self::Single(_) => "single",
        }
    }

    pub fn into_candidates(self) -> Vec<Value> {
        match self {
            Self::Sequence(items) | Self::Items(items) => items,
            Self::Single(value) => vec![value],
        }
    }
}

/// Extract the candidate case objects from a raw webhook body.
///
/// Fails with [`PipelineError::UnparsableResponse`] when no JSON at all can
/// be recovered from the text, and with [`PipelineError::NoCaseDataFound`]
/// when JSON was found but yielded no candidates.
pub fn extract_candidates(raw: &str) -> Result<Vec<Value>, PipelineError> {
    let shape = match serde_json::from_str::<Value>(raw) {
        Ok(value) => PayloadShape::detect(value)
            .or_else(|| embedded_value(raw).and_then(PayloadShape::detect)),
        Err(err) => match embedded_value(raw) {
            Some(value) => PayloadShape::detect(value),
            None => return Err(PipelineError::UnparsableResponse(err.to_string())),
        },
    };

    let Some(shape) = shape else {
        warn!("webhook response parsed but matched no known payload shape");
        return Err(PipelineError::NoCaseDataFound);
    };

    debug!(shape = shape.name(), "detected payload shape");
    let candidates = shape.into_candidates();
    if candidates.is_empty() {
        warn!("webhook response contained an empty case list");
        return Err(PipelineError::NoCaseDataFound);
    }
    Ok(candidates)
}

/// Parse the first JSON-looking span of `raw`, if any.
fn embedded_value(raw: &str) -> Option<Value> {
    let span = EMBEDDED_JSON.find(raw)?;
    match serde_json::from_str(span.as_str()) {
        Ok(value) => Some(value),
        Err(err) => {
            debug!(error = %err, "embedded JSON span did not parse");
            None
        }
    }
}

/// Result of normalising one webhook body.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub cases: Vec<CanonicalCase>,
    /// Number of candidate objects found in the payload.
    pub candidates: usize,
    /// Candidates dropped for missing fields.
    pub dropped: Vec<MalformedCase>,
}

impl Normalized {
    pub fn from_raw(raw: &str) -> Result<Self, PipelineError> {
        let candidates = extract_candidates(raw)?;
        let mut out = Self {
            candidates: candidates.len(),
            ..Self::default()
        };

        for (index, candidate) in candidates.iter().enumerate() {
            match CanonicalCase::from_candidate(index, candidate) {
                Ok(case) => out.cases.push(case),
                Err(malformed) => {
                    warn!(
                        index,
                        field = malformed.field,
                        "skipping case with missing required field"
                    );
                    out.dropped.push(malformed);
                }
            }
        }

        debug!(
            candidates = out.candidates,
            cases = out.cases.len(),
            dropped = out.dropped.len(),
            "normalised webhook payload"
        );
        Ok(out)
    }
}

/// Normalise a raw webhook body into canonical cases.
///
/// Malformed candidates are skipped, so the result may be empty even on
/// success.
pub fn normalize(raw: &str) -> Result<Vec<CanonicalCase>, PipelineError> {
    Normalized::from_raw(raw).map(|n| n.cases)
}
