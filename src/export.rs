// 📤 Export - CSV tables and download file names
//
// Tables render the same cells the dashboard shows: resolved student names,
// formatted money, local dates, and "—" for anything missing.
// Data cells are JSON string literals (`"say \"hi\""`), the header is bare
// labels, and rows are joined by `\n` with no trailing newline.

use crate::entities::{Document, EntityKind, Expense, Payment, Student, MISSING_PLACEHOLDER};
use crate::error::Result;
use crate::temporal::format_local;
use chrono::{DateTime, FixedOffset, Utc};

pub const STUDENT_COLUMNS: [&str; 5] = ["Name", "Phone", "Program", "Status", "Enrolled At"];

pub const PAYMENT_COLUMNS: [&str; 7] = [
    "Paid At",
    "Student",
    "Amount",
    "Curr.",
    "Method",
    "Received By",
    "Note",
];

pub const EXPENSE_COLUMNS: [&str; 8] = [
    "Paid At",
    "Category",
    "Amount",
    "Curr.",
    "Method",
    "Paid To",
    "Entered By",
    "Note",
];

/// `1500.00 USD`
pub fn format_money(amount: f64, currency: &str) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    if currency.is_empty() {
        format!("{:.2}", amount)
    } else {
        format!("{:.2} {}", amount, currency)
    }
}

pub fn columns(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Students => &STUDENT_COLUMNS,
        EntityKind::Payments => &PAYMENT_COLUMNS,
        EntityKind::Expenses => &EXPENSE_COLUMNS,
    }
}

// ============================================================================
// ROW RENDERING
// ============================================================================

fn optional(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn money_cell(amount: f64, currency: &Option<String>) -> String {
    format_money(amount, currency.as_deref().unwrap_or(""))
}

fn date_cell(value: &Option<String>, offset: &FixedOffset) -> String {
    match value.as_deref() {
        Some(ts) if !ts.is_empty() => format_local(ts, offset),
        _ => MISSING_PLACEHOLDER.to_string(),
    }
}

pub fn student_row(student: &Student, offset: &FixedOffset) -> Vec<String> {
    vec![
        optional(&student.name),
        optional(&student.phone),
        optional(&student.program),
        optional(&student.status),
        date_cell(&student.enrolled_at, offset),
    ]
}

pub fn payment_row(doc: &Document, payment: &Payment, offset: &FixedOffset) -> Vec<String> {
    vec![
        date_cell(&payment.paid_at, offset),
        doc.student_label(&payment.student_id),
        money_cell(payment.amount(), &payment.currency),
        optional(&payment.currency),
        optional(&payment.method),
        optional(&payment.received_by),
        optional(&payment.note),
    ]
}

pub fn expense_row(expense: &Expense, offset: &FixedOffset) -> Vec<String> {
    vec![
        date_cell(&expense.paid_at, offset),
        optional(&expense.category),
        money_cell(expense.amount(), &expense.currency),
        optional(&expense.currency),
        optional(&expense.method),
        optional(&expense.paid_to),
        optional(&expense.entered_by),
        optional(&expense.note),
    ]
}

// ============================================================================
// CSV
// ============================================================================

/// Bare header labels, then one line per row of JSON-quoted cells.
/// An empty table is the header followed by a single `\n`.
pub fn write_csv(header: &[&str], rows: &[Vec<String>]) -> Result<String> {
    let lines = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(serde_json::to_string)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(|cells| cells.join(","))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(format!("{}\n{}", header.join(","), lines.join("\n")))
}

pub fn students_csv(students: &[&Student], offset: &FixedOffset) -> Result<String> {
    let rows: Vec<Vec<String>> = students.iter().map(|s| student_row(s, offset)).collect();
    write_csv(&STUDENT_COLUMNS, &rows)
}

pub fn payments_csv(doc: &Document, payments: &[&Payment], offset: &FixedOffset) -> Result<String> {
    let rows: Vec<Vec<String>> = payments
        .iter()
        .map(|p| payment_row(doc, p, offset))
        .collect();
    write_csv(&PAYMENT_COLUMNS, &rows)
}

pub fn expenses_csv(expenses: &[&Expense], offset: &FixedOffset) -> Result<String> {
    let rows: Vec<Vec<String>> = expenses.iter().map(|e| expense_row(e, offset)).collect();
    write_csv(&EXPENSE_COLUMNS, &rows)
}

// ============================================================================
// FILE NAMES
// ============================================================================

/// `ledger-data-<unix millis>.json`
pub fn snapshot_file_name(now: DateTime<Utc>) -> String {
    format!("ledger-data-{}.json", now.timestamp_millis())
}

/// Table title with whitespace runs replaced by `_`, then `-<unix millis>.csv`
pub fn table_file_name(kind: EntityKind, now: DateTime<Utc>) -> String {
    let title = kind.title().split_whitespace().collect::<Vec<_>>().join("_");
    format!("{}-{}.csv", title, now.timestamp_millis())
}
