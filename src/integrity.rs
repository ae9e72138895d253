// ✅ Integrity Check - flags what the store tolerates silently
//
// The ledger accepts orphaned links, unknown staff, odd amounts and any
// timestamp text. None of that is an error at write time, but some of it
// quietly distorts reports (a non-canonical timestamp breaks window
// comparisons). This check reports; it never repairs.

use crate::entities::{Amount, Document, EntityKind};
use crate::temporal::is_canonical_timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ============================================================================
// ISSUES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Warning, // Reports may be wrong because of this
    Info,    // Expected in practice, shown for awareness
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityIssue {
    pub severity: Severity,
    pub kind: EntityKind,
    pub record_id: String,
    pub field: String,
    pub issue: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub checked_records: usize,
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    pub fn summary(&self) -> String {
        format!(
            "Checked {} records: {} issues ({} warnings)",
            self.checked_records,
            self.issues.len(),
            self.warning_count()
        )
    }
}

// ============================================================================
// CHECKER
// ============================================================================

#[derive(Debug, Default)]
pub struct IntegrityChecker {
    issues: Vec<IntegrityIssue>,
}

impl IntegrityChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(mut self, doc: &Document) -> IntegrityReport {
        let staff: HashSet<&str> = doc.staff.iter().map(String::as_str).collect();

        self.check_duplicate_ids(EntityKind::Students, doc.students.iter().map(|s| s.id.as_str()));
        self.check_duplicate_ids(EntityKind::Payments, doc.payments.iter().map(|p| p.id.as_str()));
        self.check_duplicate_ids(EntityKind::Expenses, doc.expenses.iter().map(|e| e.id.as_str()));

        for student in &doc.students {
            if let Some(ts) = &student.enrolled_at {
                self.check_timestamp(EntityKind::Students, &student.id, "enrolledAt", ts);
            }
        }

        for payment in &doc.payments {
            let id = payment.id.as_str();
            self.check_paid_at(EntityKind::Payments, id, payment.paid_at.as_deref());
            self.check_amount(EntityKind::Payments, id, payment.amount.as_ref());

            if payment.is_linked() && doc.find_student(&payment.student_id).is_none() {
                self.push(
                    Severity::Info,
                    EntityKind::Payments,
                    id,
                    "studentId",
                    format!("Student '{}' does not exist", payment.student_id),
                    "Link the payment to an existing student if the payer is known",
                );
            }
            self.check_staff(&staff, EntityKind::Payments, id, "receivedBy", payment.received_by());
        }

        for expense in &doc.expenses {
            let id = expense.id.as_str();
            self.check_paid_at(EntityKind::Expenses, id, expense.paid_at.as_deref());
            self.check_amount(EntityKind::Expenses, id, expense.amount.as_ref());
            self.check_staff(&staff, EntityKind::Expenses, id, "enteredBy", expense.entered_by());
        }

        IntegrityReport {
            checked_records: doc.students.len() + doc.payments.len() + doc.expenses.len(),
            issues: self.issues,
        }
    }

    fn check_duplicate_ids<'a>(&mut self, kind: EntityKind, ids: impl Iterator<Item = &'a str>) {
        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(id) {
                self.push(
                    Severity::Warning,
                    kind,
                    id,
                    "id",
                    "Id used by more than one record".to_string(),
                    "Deleting by this id removes every record that shares it",
                );
            }
        }
    }

    fn check_paid_at(&mut self, kind: EntityKind, id: &str, paid_at: Option<&str>) {
        match paid_at {
            Some(ts) => self.check_timestamp(kind, id, "paidAt", ts),
            None => self.push(
                Severity::Warning,
                kind,
                id,
                "paidAt",
                "Missing date; excluded from every report window".to_string(),
                "Add the date the money moved",
            ),
        }
    }

    fn check_timestamp(&mut self, kind: EntityKind, id: &str, field: &str, ts: &str) {
        if !is_canonical_timestamp(ts) {
            self.push(
                Severity::Warning,
                kind,
                id,
                field,
                format!("Timestamp '{}' is not in YYYY-MM-DDTHH:MM:SS.sssZ form", ts),
                "Window filters compare text; this record may land in the wrong month",
            );
        }
    }

    fn check_amount(&mut self, kind: EntityKind, id: &str, amount: Option<&Amount>) {
        let Some(amount) = amount else {
            self.push(
                Severity::Warning,
                kind,
                id,
                "amount",
                "Missing amount; counts as 0 in totals".to_string(),
                "Check the amount was entered correctly",
            );
            return;
        };
        if amount.value() <= 0.0 {
            self.push(
                Severity::Warning,
                kind,
                id,
                "amount",
                format!("Amount {} is not a positive number", amount.0),
                "Check the amount was entered correctly",
            );
        }
    }

    fn check_staff(
        &mut self,
        staff: &HashSet<&str>,
        kind: EntityKind,
        id: &str,
        field: &str,
        name: &str,
    ) {
        if !staff.contains(name) {
            self.push(
                Severity::Info,
                kind,
                id,
                field,
                format!("'{}' is not in the staff list", name),
                "Add the staff member or correct the name",
            );
        }
    }

    fn push(
        &mut self,
        severity: Severity,
        kind: EntityKind,
        id: &str,
        field: &str,
        issue: String,
        recommendation: &str,
    ) {
        self.issues.push(IntegrityIssue {
            severity,
            kind,
            record_id: id.to_string(),
            field: field.to_string(),
            issue,
            recommendation: recommendation.to_string(),
        });
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_document;
    use serde_json::json;

    fn fields(report: &IntegrityReport) -> Vec<(&str, &str)> {
        report
            .issues
            .iter()
            .map(|i| (i.record_id.as_str(), i.field.as_str()))
            .collect()
    }

    #[test]
    fn test_seed_document_is_clean() {
        let report = IntegrityChecker::new().check(&seed_document());
        assert!(report.is_clean(), "{:?}", report.issues);
        assert_eq!(report.checked_records, 8);
    }

    #[test]
    fn test_flags_mixed_timestamp_formats() {
        let doc: Document = serde_json::from_value(json!({
            "staff": ["Adham"],
            "payments": [
                { "id": "p1", "amount": 10, "receivedBy": "Adham",
                  "paidAt": "2024-05-01T10:00:00+05:00" }
            ]
        }))
        .unwrap();

        let report = IntegrityChecker::new().check(&doc);
        assert_eq!(fields(&report), vec![("p1", "paidAt")]);
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn test_flags_orphans_unknown_staff_and_amounts() {
        let doc: Document = serde_json::from_value(json!({
            "staff": ["Adham"],
            "students": [{ "id": "s1", "name": "X" }],
            "payments": [
                { "id": "p1", "studentId": "ghost", "amount": 10, "receivedBy": "Adham",
                  "paidAt": "2024-05-01T10:00:00.000Z" },
                { "id": "p2", "studentId": "s1", "amount": 0, "receivedBy": "Bobur",
                  "paidAt": "2024-05-01T10:00:00.000Z" }
            ],
            "expenses": [
                { "id": "e1", "category": "Rent", "amount": 5, "enteredBy": "Adham" }
            ]
        }))
        .unwrap();

        let report = IntegrityChecker::new().check(&doc);
        assert_eq!(
            fields(&report),
            vec![
                ("p1", "studentId"),
                ("p2", "amount"),
                ("p2", "receivedBy"),
                ("e1", "paidAt"),
            ]
        );
        assert_eq!(report.warning_count(), 2);
        assert!(report.summary().contains("4 issues"));
    }

    #[test]
    fn test_amount_issue_quotes_stored_value() {
        let doc: Document = serde_json::from_value(json!({
            "staff": ["Adham"],
            "payments": [
                { "id": "p1", "amount": "TBD", "receivedBy": "Adham",
                  "paidAt": "2024-05-01T10:00:00.000Z" },
                { "id": "p2", "receivedBy": "Adham",
                  "paidAt": "2024-05-01T10:00:00.000Z" }
            ]
        }))
        .unwrap();

        let report = IntegrityChecker::new().check(&doc);
        assert_eq!(fields(&report), vec![("p1", "amount"), ("p2", "amount")]);
        assert!(report.issues[0].issue.contains("\"TBD\""));
        assert!(report.issues[1].issue.starts_with("Missing amount"));
    }

    #[test]
    fn test_flags_duplicate_ids() {
        let doc: Document = serde_json::from_value(json!({
            "students": [
                { "id": "same", "name": "A" },
                { "id": "same", "name": "B" }
            ]
        }))
        .unwrap();

        let report = IntegrityChecker::new().check(&doc);
        assert_eq!(fields(&report), vec![("same", "id")]);
    }

    #[test]
    fn test_check_does_not_mutate() {
        let doc = seed_document();
        let before = doc.clone();
        let _ = IntegrityChecker::new().check(&doc);
        assert_eq!(doc, before);
    }
}
