// 🎓 Student Entity
//
// Status is an open string in storage; `StudentStatus` is what forms accept.

use super::{lenient, text_or_empty};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// STUDENT STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StudentStatus {
    /// Interested, nothing signed yet
    Lead,
    /// Signed up for a program
    Enrolled,
    /// At least one payment received
    Paid,
}

impl StudentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudentStatus::Lead => "lead",
            StudentStatus::Enrolled => "enrolled",
            StudentStatus::Paid => "paid",
        }
    }
}

impl Default for StudentStatus {
    fn default() -> Self {
        StudentStatus::Lead
    }
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lead" => Ok(StudentStatus::Lead),
            "enrolled" => Ok(StudentStatus::Enrolled),
            "paid" => Ok(StudentStatus::Paid),
            other => Err(other.to_string()),
        }
    }
}

// ============================================================================
// STUDENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,

    /// Stored verbatim; see `StudentStatus` for the accepted values on input
    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Canonical timestamp; students without one appear in every window
    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub enrolled_at: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Student {
    pub fn name(&self) -> &str {
        text_or_empty(&self.name)
    }

    /// Parsed status, if it is one of the known values
    pub fn known_status(&self) -> Option<StudentStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }
}
