//! Canonical accident case: one case number and the two letters drafted for it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MalformedCase;

/// Source spellings accepted for each canonical field, in lookup order.
pub const CASE_NUMBER_KEYS: &[&str] = &["case_number", "caseNumber"];
pub const LETTER_1_KEYS: &[&str] = &["lettertodriver1", "letterToDriver1"];
pub const LETTER_2_KEYS: &[&str] = &["lettertodriver2", "letterToDriver2"];

/// A fully populated case. Every field is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalCase {
    pub case_number: String,
    pub letter_to_driver1: String,
    pub letter_to_driver2: String,
}

impl CanonicalCase {
    /// Build a case from one candidate object of the webhook payload.
    ///
    /// `index` is the candidate's position in the payload and only feeds the
    /// error report.
    pub fn from_candidate(index: usize, candidate: &Value) -> Result<Self, MalformedCase> {
        let require = |keys: &[&str], field: &'static str| {
            lookup(candidate, keys).ok_or(MalformedCase { index, field })
        };

        Ok(Self {
            case_number: require(CASE_NUMBER_KEYS, "case_number")?,
            letter_to_driver1: require(LETTER_1_KEYS, "letterToDriver1")?,
            letter_to_driver2: require(LETTER_2_KEYS, "letterToDriver2")?,
        })
    }
}

/// True when `value` carries both letters under any accepted spelling.
pub fn has_letters(value: &Value) -> bool {
    lookup(value, LETTER_1_KEYS).is_some() && lookup(value, LETTER_2_KEYS).is_some()
}

/// First non-empty value among `keys`. Numbers are accepted and stringified
/// (case numbers sometimes arrive as spreadsheet integers).
fn lookup(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
