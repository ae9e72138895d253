// 📝 Form submissions - typed input for new records
//
// Each form is validated before the store touches the document. Blank
// optional fields fall back to the same defaults the dashboard offered:
// currency USD, method cash, staff = first staff member (or "Admin"),
// paid-to "Vendor".

use crate::entities::{
    new_id, Amount, Document, Expense, Payment, PaymentMethod, Student, StudentStatus,
};
use crate::error::ValidationError;
use crate::temporal::iso_timestamp;
use chrono::{DateTime, Utc};

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_PAYEE: &str = "Vendor";

pub fn parse_status(input: &str) -> Result<StudentStatus, ValidationError> {
    input
        .parse()
        .map_err(ValidationError::UnknownStatus)
}

pub fn parse_method(input: &str) -> Result<PaymentMethod, ValidationError> {
    input
        .parse()
        .map_err(ValidationError::UnknownMethod)
}

fn check_amount(amount: f64) -> Result<(), ValidationError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidAmount(amount))
    }
}

/// Trimmed value, or `None` when blank
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// STUDENT
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct NewStudent {
    pub name: String,
    pub phone: Option<String>,
    pub program: Option<String>,
    pub status: StudentStatus,
}

impl NewStudent {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(())
    }

    /// Build the stored record, enrolled at `now`
    pub fn into_student(self, now: DateTime<Utc>) -> Result<Student, ValidationError> {
        self.validate()?;
        Ok(Student {
            id: new_id(),
            name: Some(self.name.trim().to_string()),
            phone: non_blank(self.phone),
            program: non_blank(self.program),
            status: Some(self.status.as_str().to_string()),
            enrolled_at: Some(iso_timestamp(now)),
            ..Default::default()
        })
    }
}

// ============================================================================
// PAYMENT
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct NewPayment {
    /// Student to link; `None` leaves the payment unlinked
    pub student_id: Option<String>,
    pub amount: f64,
    pub currency: Option<String>,
    pub method: PaymentMethod,
    pub received_by: Option<String>,
    pub note: Option<String>,
}

impl NewPayment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_amount(self.amount)
    }

    /// Build the stored record, paid at `now`. The student id is not checked
    /// against `doc`; orphaned links are allowed.
    pub fn into_payment(self, doc: &Document, now: DateTime<Utc>) -> Result<Payment, ValidationError> {
        self.validate()?;
        Ok(Payment {
            id: new_id(),
            student_id: non_blank(self.student_id).unwrap_or_default(),
            amount: Some(Amount::from(self.amount)),
            currency: Some(non_blank(self.currency).unwrap_or_else(|| DEFAULT_CURRENCY.to_string())),
            method: Some(self.method.as_str().to_string()),
            received_by: Some(
                non_blank(self.received_by).unwrap_or_else(|| doc.default_staff().to_string()),
            ),
            paid_at: Some(iso_timestamp(now)),
            note: self.note,
            ..Default::default()
        })
    }
}

// ============================================================================
// EXPENSE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct NewExpense {
    pub category: String,
    pub amount: f64,
    pub currency: Option<String>,
    pub paid_to: Option<String>,
    pub method: PaymentMethod,
    pub entered_by: Option<String>,
    pub note: Option<String>,
}

impl NewExpense {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.category.trim().is_empty() {
            return Err(ValidationError::EmptyCategory);
        }
        check_amount(self.amount)
    }

    pub fn into_expense(self, doc: &Document, now: DateTime<Utc>) -> Result<Expense, ValidationError> {
        self.validate()?;
        Ok(Expense {
            id: new_id(),
            category: Some(self.category.trim().to_string()),
            amount: Some(Amount::from(self.amount)),
            currency: Some(non_blank(self.currency).unwrap_or_else(|| DEFAULT_CURRENCY.to_string())),
            paid_to: Some(non_blank(self.paid_to).unwrap_or_else(|| DEFAULT_PAYEE.to_string())),
            paid_at: Some(iso_timestamp(now)),
            method: Some(self.method.as_str().to_string()),
            note: self.note,
            entered_by: Some(
                non_blank(self.entered_by).unwrap_or_else(|| doc.default_staff().to_string()),
            ),
            ..Default::default()
        })
    }
}

// ============================================================================
// STAFF
// ============================================================================

/// Trimmed staff name, refused when blank or already listed
pub fn validate_staff_name(doc: &Document, name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if doc.has_staff(name) {
        return Err(ValidationError::DuplicateStaff(name.to_string()));
    }
    Ok(name.to_string())
}
