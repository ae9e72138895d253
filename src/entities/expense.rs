// 🧾 Expense Entity - money paid out by the business

use super::{lenient, text_or_empty, Amount};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, deserialize_with = "lenient::present", skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,

    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub paid_to: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Staff name of whoever recorded the expense
    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub entered_by: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Expense {
    /// Amount as a number; missing or non-numeric reads as 0
    pub fn amount(&self) -> f64 {
        self.amount.as_ref().map(Amount::value).unwrap_or(0.0)
    }

    pub fn category(&self) -> &str {
        text_or_empty(&self.category)
    }

    pub fn currency(&self) -> &str {
        text_or_empty(&self.currency)
    }

    pub fn paid_to(&self) -> &str {
        text_or_empty(&self.paid_to)
    }

    pub fn method(&self) -> &str {
        text_or_empty(&self.method)
    }

    pub fn entered_by(&self) -> &str {
        text_or_empty(&self.entered_by)
    }
}
