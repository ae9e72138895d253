// 📒 Document - the entire persisted ledger
//
// Shape: { staff: string[], students: Student[], payments: Payment[], expenses: Expense[] }
// No schema version, no checksum. Lists are replaced wholesale, never edited in place.

use super::{lenient, EntityKind, Expense, Payment, Student};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Rendered wherever a reference cannot be resolved
pub const MISSING_PLACEHOLDER: &str = "—";

/// Fallback staff name when the staff list is empty
pub const DEFAULT_STAFF: &str = "Admin";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, deserialize_with = "lenient::list")]
    pub staff: Vec<String>,

    #[serde(default, deserialize_with = "lenient::list")]
    pub students: Vec<Student>,

    #[serde(default, deserialize_with = "lenient::list")]
    pub payments: Vec<Payment>,

    #[serde(default, deserialize_with = "lenient::list")]
    pub expenses: Vec<Expense>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Resolve a student reference; empty or orphaned ids give `None`
    pub fn find_student(&self, id: &str) -> Option<&Student> {
        if id.is_empty() {
            return None;
        }
        self.students.iter().find(|s| s.id == id)
    }

    /// Student name for display, or the placeholder when unresolved
    pub fn student_label(&self, id: &str) -> String {
        self.find_student(id)
            .map(|s| s.name().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| MISSING_PLACEHOLDER.to_string())
    }

    pub fn has_staff(&self, name: &str) -> bool {
        self.staff.iter().any(|s| s == name)
    }

    /// Staff name used when a form leaves "received by"/"entered by" blank
    pub fn default_staff(&self) -> &str {
        self.staff
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_STAFF)
    }

    /// Point every unlinked payment at the first student.
    /// Stays empty when there are no students. Returns how many were rewritten.
    pub fn link_unassigned_payments(&mut self) -> usize {
        let fallback = match self.students.first() {
            Some(student) => student.id.clone(),
            None => return 0,
        };
        if fallback.is_empty() {
            return 0;
        }

        let mut rewritten = 0;
        for payment in self.payments.iter_mut().filter(|p| !p.is_linked()) {
            payment.student_id = fallback.clone();
            rewritten += 1;
        }
        rewritten
    }

    /// Drop the record with `id` from one list. Returns whether anything went.
    pub fn remove(&mut self, kind: EntityKind, id: &str) -> bool {
        match kind {
            EntityKind::Students => retain_len_changed(&mut self.students, |s| s.id != id),
            EntityKind::Payments => retain_len_changed(&mut self.payments, |p| p.id != id),
            EntityKind::Expenses => retain_len_changed(&mut self.expenses, |e| e.id != id),
        }
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Students => self.students.len(),
            EntityKind::Payments => self.payments.len(),
            EntityKind::Expenses => self.expenses.len(),
        }
    }
}

fn retain_len_changed<T>(items: &mut Vec<T>, keep: impl FnMut(&T) -> bool) -> bool {
    let before = items.len();
    items.retain(keep);
    items.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Document {
        serde_json::from_value(json!({
            "staff": ["Adham", "Malika"],
            "students": [
                { "id": "s1", "name": "Xayitbek" },
                { "id": "s2", "name": "Olloyor" }
            ],
            "payments": [
                { "id": "p1", "studentId": "", "amount": 1500 },
                { "id": "p2", "studentId": "s2", "amount": 4000 },
                { "id": "p3", "amount": 10 }
            ],
            "expenses": [
                { "id": "e1", "category": "Office Rent", "amount": 400 }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_find_student_handles_orphans() {
        let doc = sample();
        assert_eq!(doc.find_student("s1").map(|s| s.name()), Some("Xayitbek"));
        assert!(doc.find_student("gone").is_none());
        assert!(doc.find_student("").is_none());
        assert_eq!(doc.student_label("gone"), MISSING_PLACEHOLDER);
        assert_eq!(doc.student_label("s2"), "Olloyor");
    }

    #[test]
    fn test_link_unassigned_payments() {
        let mut doc = sample();
        assert_eq!(doc.link_unassigned_payments(), 2);
        assert_eq!(doc.payments[0].student_id, "s1");
        assert_eq!(doc.payments[1].student_id, "s2");
        assert_eq!(doc.payments[2].student_id, "s1");

        // Second pass changes nothing
        let once = doc.clone();
        assert_eq!(doc.link_unassigned_payments(), 0);
        assert_eq!(doc, once);
    }

    #[test]
    fn test_link_without_students_leaves_payments_unlinked() {
        let mut doc = sample();
        doc.students.clear();
        assert_eq!(doc.link_unassigned_payments(), 0);
        assert_eq!(doc.payments[0].student_id, "");
    }

    #[test]
    fn test_remove_by_id() {
        let mut doc = sample();
        assert!(doc.remove(EntityKind::Payments, "p2"));
        assert!(!doc.remove(EntityKind::Payments, "p2"));
        assert_eq!(doc.len(EntityKind::Payments), 2);
        assert!(doc.remove(EntityKind::Expenses, "e1"));
        assert_eq!(doc.len(EntityKind::Expenses), 0);
    }

    #[test]
    fn test_default_staff() {
        let mut doc = sample();
        assert_eq!(doc.default_staff(), "Adham");
        doc.staff.clear();
        assert_eq!(doc.default_staff(), DEFAULT_STAFF);
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let doc: Document = serde_json::from_value(json!({ "staff": null })).unwrap();
        assert!(doc.staff.is_empty());
        assert!(doc.students.is_empty());
        assert!(doc.payments.is_empty());
    }

    #[test]
    fn test_non_object_document_is_rejected() {
        assert!(serde_json::from_value::<Document>(json!([1, 2, 3])).is_err());
        assert!(serde_json::from_value::<Document>(json!({ "payments": 5 })).is_err());
    }
}
