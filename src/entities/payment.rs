// 💵 Payment Entity - income received from a student
//
// `student_id` may be empty or point at a student that no longer exists.
// Resolution goes through `Document::find_student`, never a panic.

use super::{lenient, text_or_empty, Amount};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// PAYMENT METHOD (shared with expenses)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Card,
    Bank,
    Transfer,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Bank => "bank",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Other => "other",
        }
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "bank" => Ok(PaymentMethod::Bank),
            "transfer" => Ok(PaymentMethod::Transfer),
            "other" => Ok(PaymentMethod::Other),
            other => Err(other.to_string()),
        }
    }
}

// ============================================================================
// PAYMENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Student.id, or empty when the payment is unlinked. Always written,
    /// since loading links every payment.
    #[serde(default, deserialize_with = "lenient::text")]
    pub student_id: String,

    /// Raw stored value; `amount()` gives the number
    #[serde(default, deserialize_with = "lenient::present", skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,

    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Staff name; not required to be in the staff list
    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub received_by: Option<String>,

    /// Payments without a timestamp never fall inside a window
    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Payment {
    /// Amount as a number; missing or non-numeric reads as 0
    pub fn amount(&self) -> f64 {
        self.amount.as_ref().map(Amount::value).unwrap_or(0.0)
    }

    pub fn currency(&self) -> &str {
        text_or_empty(&self.currency)
    }

    pub fn method(&self) -> &str {
        text_or_empty(&self.method)
    }

    pub fn received_by(&self) -> &str {
        text_or_empty(&self.received_by)
    }

    pub fn is_linked(&self) -> bool {
        !self.student_id.is_empty()
    }

    /// Key used to count distinct payers: student id, else note, else payment id
    pub fn payer_key(&self) -> &str {
        if !self.student_id.is_empty() {
            return &self.student_id;
        }
        match self.note.as_deref() {
            Some(note) if !note.is_empty() => note,
            _ => &self.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payment_reads_camel_case() {
        let payment: Payment = serde_json::from_value(json!({
            "id": "p1",
            "studentId": "s1",
            "amount": 1500,
            "currency": "USD",
            "method": "card",
            "receivedBy": "Adham",
            "paidAt": "2024-05-03T10:00:00.000Z",
            "note": "Standard package"
        }))
        .unwrap();

        assert_eq!(payment.amount(), 1500.0);
        assert_eq!(payment.received_by(), "Adham");
        assert!(payment.is_linked());
    }

    #[test]
    fn test_amount_coerced_leniently() {
        let text: Payment = serde_json::from_value(json!({ "id": "p", "amount": "250" })).unwrap();
        let junk: Payment = serde_json::from_value(json!({ "id": "p", "amount": "lots" })).unwrap();
        let missing: Payment = serde_json::from_value(json!({ "id": "p" })).unwrap();

        assert_eq!(text.amount(), 250.0);
        assert_eq!(junk.amount(), 0.0);
        assert_eq!(missing.amount(), 0.0);
    }

    #[test]
    fn test_saves_back_what_was_read() {
        for stored in [
            json!({ "id": "p1", "studentId": "s1", "amount": "TBD" }),
            json!({ "id": "p2", "studentId": "", "amount": 1500, "note": "Deposit" }),
            json!({ "id": "p3", "studentId": "s1", "amount": 10.5, "currency": "USD",
                    "method": "card", "receivedBy": "Adham", "paidAt": "2024-05-03T10:00:00.000Z" }),
            json!({ "id": "p4", "studentId": "s1", "amount": null }),
        ] {
            let payment: Payment = serde_json::from_value(stored.clone()).unwrap();
            assert_eq!(serde_json::to_value(&payment).unwrap(), stored);
        }
    }

    #[test]
    fn test_missing_text_fields_read_empty() {
        let payment: Payment = serde_json::from_value(json!({ "id": "p" })).unwrap();
        assert_eq!(payment.currency(), "");
        assert_eq!(payment.method(), "");
        assert_eq!(payment.received_by(), "");
        assert!(payment.currency.is_none());
    }

    #[test]
    fn test_null_student_id_reads_as_unlinked() {
        let payment: Payment =
            serde_json::from_value(json!({ "id": "p", "studentId": null })).unwrap();
        assert_eq!(payment.student_id, "");
        assert!(!payment.is_linked());
    }

    #[test]
    fn test_payer_key_fallbacks() {
        let mut payment = Payment {
            id: "p1".to_string(),
            student_id: "s1".to_string(),
            note: Some("Premium".to_string()),
            ..Default::default()
        };
        assert_eq!(payment.payer_key(), "s1");

        payment.student_id.clear();
        assert_eq!(payment.payer_key(), "Premium");

        payment.note = Some(String::new());
        assert_eq!(payment.payer_key(), "p1");

        payment.note = None;
        assert_eq!(payment.payer_key(), "p1");
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("BANK".parse::<PaymentMethod>(), Ok(PaymentMethod::Bank));
        assert!("crypto".parse::<PaymentMethod>().is_err());
        assert_eq!(PaymentMethod::default().as_str(), "cash");
    }
}
