// Entity Models - the four lists that make up a ledger Document
//
// Every record has:
// - Opaque identity (UUID string) assigned once at creation
// - camelCase JSON field names matching the persisted layout
// - Lenient reads: missing or null fields default, amounts coerce to numbers
//   only when a total is computed
// - Absent keys stay absent and unknown keys are kept in `extra`, so a
//   loaded record saves back the way it was read

pub mod document;
pub mod expense;
pub mod payment;
pub mod student;

pub use document::{Document, MISSING_PLACEHOLDER};
pub use expense::Expense;
pub use payment::{Payment, PaymentMethod};
pub use student::{Student, StudentStatus};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fresh opaque identifier for a new record
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Best-effort numeric reading of a stored amount.
/// Numbers pass through, numeric strings parse, everything else is 0.
pub fn coerce_amount(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Optional text field as `&str`, empty when absent
pub(crate) fn text_or_empty(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

// ============================================================================
// AMOUNT
// ============================================================================

/// A stored amount, kept as the exact JSON value that was read.
/// `"TBD"`, `"250"`, `1500` and `10.5` all save back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(pub serde_json::Value);

impl Amount {
    /// Numeric reading used for totals
    pub fn value(&self) -> f64 {
        coerce_amount(&self.0)
    }
}

impl From<f64> for Amount {
    /// Whole numbers are stored as JSON integers (`1500`, not `1500.0`)
    fn from(amount: f64) -> Self {
        if amount.is_finite() && amount.fract() == 0.0 && amount.abs() < 1e15 {
            Amount(serde_json::Value::from(amount as i64))
        } else {
            Amount(serde_json::Value::from(amount))
        }
    }
}

// ============================================================================
// ENTITY KIND
// ============================================================================

/// The three deletable record lists (staff is a plain name list)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Students,
    Payments,
    Expenses,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Students => "students",
            EntityKind::Payments => "payments",
            EntityKind::Expenses => "expenses",
        }
    }

    /// Table title as shown on screen and used in export file names
    pub fn title(&self) -> &'static str {
        match self {
            EntityKind::Students => "Students",
            EntityKind::Payments => "Payments (Income)",
            EntityKind::Expenses => "Expenses",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "students" | "student" => Ok(EntityKind::Students),
            "payments" | "payment" => Ok(EntityKind::Payments),
            "expenses" | "expense" => Ok(EntityKind::Expenses),
            other => Err(format!(
                "unknown table '{}' (expected students, payments or expenses)",
                other
            )),
        }
    }
}

// ============================================================================
// LENIENT SERDE HELPERS
// ============================================================================

/// Field readers that never reject a document over a single odd value
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Value>::deserialize(deserializer)?
            .map(value_to_text)
            .unwrap_or_default())
    }

    pub fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Value>::deserialize(deserializer)?.map(value_to_text))
    }

    /// Any present value, `null` included, becomes `Some`; with
    /// `#[serde(default)]` an absent key stays `None`
    pub fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        T::deserialize(deserializer).map(Some)
    }

    pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
    }

    fn value_to_text(value: Value) -> String {
        match value {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_amount() {
        assert_eq!(coerce_amount(&json!(1500)), 1500.0);
        assert_eq!(coerce_amount(&json!(12.5)), 12.5);
        assert_eq!(coerce_amount(&json!(" 400 ")), 400.0);
        assert_eq!(coerce_amount(&json!("abc")), 0.0);
        assert_eq!(coerce_amount(&json!("inf")), 0.0);
        assert_eq!(coerce_amount(&json!(null)), 0.0);
        assert_eq!(coerce_amount(&json!([1])), 0.0);
    }

    #[test]
    fn test_amount_keeps_raw_value() {
        let junk = Amount(json!("TBD"));
        assert_eq!(junk.value(), 0.0);
        assert_eq!(serde_json::to_string(&junk).unwrap(), r#""TBD""#);

        assert_eq!(Amount::from(1500.0), Amount(json!(1500)));
        assert_eq!(serde_json::to_string(&Amount::from(1500.0)).unwrap(), "1500");
        assert_eq!(Amount::from(10.5).value(), 10.5);
        assert_eq!(Amount::from(f64::NAN).value(), 0.0);
    }

    #[test]
    fn test_new_ids_are_unique() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn test_entity_kind_parse() {
        assert_eq!("Payments".parse::<EntityKind>(), Ok(EntityKind::Payments));
        assert_eq!("expense".parse::<EntityKind>(), Ok(EntityKind::Expenses));
        assert!("staff".parse::<EntityKind>().is_err());
        assert_eq!(EntityKind::Payments.title(), "Payments (Income)");
    }
}
