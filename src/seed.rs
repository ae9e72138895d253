// 🌱 Seed Document - used on first run, after reset, and when stored data is corrupt
//
// Dates are relative to "now" so a fresh install always shows activity in
// the current reporting month.

use crate::entities::{new_id, Amount, Document, Expense, Payment, Student};
use crate::temporal::iso_days_ago;
use chrono::{DateTime, Utc};

/// Seed built against the current clock
pub fn seed_document() -> Document {
    seed_document_at(Utc::now())
}

/// Seed with dates offset from `now`: students enrolled 18/10/3 days ago,
/// payments 15/7 days ago, expenses 20/8/6 days ago.
/// Payments are linked to the first seed student.
pub fn seed_document_at(now: DateTime<Utc>) -> Document {
    let students = vec![
        student(now, "Xayitbek", "+998 90 123 45 67", "USA - Bachelor", "paid", 18),
        student(now, "Olloyor", "+998 97 555 77 00", "Malaysia - Diploma", "enrolled", 10),
        student(now, "Makhliyo", "+998 97 385 79 25", "TESOL - Master", "lead", 3),
    ];
    let first_student = students[0].id.clone();

    let payments = vec![
        Payment {
            id: new_id(),
            student_id: first_student.clone(),
            amount: Some(Amount::from(1500.0)),
            currency: Some("USD".to_string()),
            method: Some("card".to_string()),
            received_by: Some("Adham".to_string()),
            paid_at: Some(iso_days_ago(now, 15)),
            note: Some("Standard package".to_string()),
            ..Default::default()
        },
        Payment {
            id: new_id(),
            student_id: first_student,
            amount: Some(Amount::from(4000.0)),
            currency: Some("USD".to_string()),
            method: Some("bank".to_string()),
            received_by: Some("Malika".to_string()),
            paid_at: Some(iso_days_ago(now, 7)),
            note: Some("Premium package".to_string()),
            ..Default::default()
        },
    ];

    let expenses = vec![
        expense(now, "Office Rent", 400.0, "Landlord", 20, "bank", "Andijan office", "Shahzod"),
        expense(now, "Marketing (Instagram)", 120.0, "Meta Ads", 8, "card", "Reels boost", "Adham"),
        expense(now, "Referral Commission", 100.0, "Teacher Zaynab", 6, "cash", "1 student", "Malika"),
    ];

    Document {
        staff: ["Adham", "Shahzod", "Malika", "Nodira"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        students,
        payments,
        expenses,
        extra: Default::default(),
    }
}

fn student(
    now: DateTime<Utc>,
    name: &str,
    phone: &str,
    program: &str,
    status: &str,
    days_ago: i64,
) -> Student {
    Student {
        id: new_id(),
        name: Some(name.to_string()),
        phone: Some(phone.to_string()),
        program: Some(program.to_string()),
        status: Some(status.to_string()),
        enrolled_at: Some(iso_days_ago(now, days_ago)),
        ..Default::default()
    }
}

#[allow(clippy::too_many_arguments)]
fn expense(
    now: DateTime<Utc>,
    category: &str,
    amount: f64,
    paid_to: &str,
    days_ago: i64,
    method: &str,
    note: &str,
    entered_by: &str,
) -> Expense {
    Expense {
        id: new_id(),
        category: Some(category.to_string()),
        amount: Some(Amount::from(amount)),
        currency: Some("USD".to_string()),
        paid_to: Some(paid_to.to_string()),
        paid_at: Some(iso_days_ago(now, days_ago)),
        method: Some(method.to_string()),
        note: Some(note.to_string()),
        entered_by: Some(entered_by.to_string()),
        ..Default::default()
    }
}

/// Copy of `doc` with every record id blanked, for comparing two seeds
/// generated at different times. Student links are blanked too.
pub fn without_ids(doc: &Document) -> Document {
    let mut out = doc.clone();
    out.students.iter_mut().for_each(|s| s.id.clear());
    out.payments.iter_mut().for_each(|p| {
        p.id.clear();
        p.student_id.clear();
    });
    out.expenses.iter_mut().for_each(|e| e.id.clear());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_seed_shape() {
        let doc = seed_document();
        assert_eq!(doc.staff, vec!["Adham", "Shahzod", "Malika", "Nodira"]);
        assert_eq!(doc.students.len(), 3);
        assert_eq!(doc.payments.len(), 2);
        assert_eq!(doc.expenses.len(), 3);
    }

    #[test]
    fn test_seed_payments_linked_to_first_student() {
        let doc = seed_document();
        let first = &doc.students[0].id;
        assert!(doc.payments.iter().all(|p| &p.student_id == first));
    }

    #[test]
    fn test_seed_ids_are_unique() {
        let doc = seed_document();
        let mut ids: Vec<&str> = doc
            .students
            .iter()
            .map(|s| s.id.as_str())
            .chain(doc.payments.iter().map(|p| p.id.as_str()))
            .chain(doc.expenses.iter().map(|e| e.id.as_str()))
            .collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn test_seed_dates_relative_to_now() {
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap();
        let doc = seed_document_at(now);

        assert_eq!(doc.students[0].enrolled_at.as_deref(), Some("2024-05-02T12:00:00.000Z"));
        assert_eq!(doc.payments[0].paid_at.as_deref(), Some("2024-05-05T12:00:00.000Z"));
        assert_eq!(doc.payments[1].paid_at.as_deref(), Some("2024-05-13T12:00:00.000Z"));
        assert_eq!(doc.expenses[0].paid_at.as_deref(), Some("2024-04-30T12:00:00.000Z"));
    }

    #[test]
    fn test_two_seeds_equal_ignoring_ids() {
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap();
        let a = seed_document_at(now);
        let b = seed_document_at(now);

        assert_ne!(a, b);
        assert_eq!(without_ids(&a), without_ids(&b));
    }
}
