// 📊 Aggregation Layer - pure views over a Document
//
// Window filters are half-open [start, end) string comparisons on canonical
// timestamps. Search matches the record's JSON form, case-insensitively.
// Nothing here mutates or persists.

use crate::entities::{Document, Expense, Payment, Student};
use crate::temporal::{month_label, Window};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ============================================================================
// SEARCH
// ============================================================================

/// True when the record's serialized form contains `term`, ignoring case.
/// An empty term matches everything.
pub fn matches_search<T: Serialize>(record: &T, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    match serde_json::to_string(record) {
        Ok(json) => json.to_lowercase().contains(&term.to_lowercase()),
        Err(_) => false,
    }
}

// ============================================================================
// FILTERS
// ============================================================================

/// Students enrolled inside the window, plus students with no enrollment date
pub fn filter_students<'a>(doc: &'a Document, window: &Window, search: &str) -> Vec<&'a Student> {
    doc.students
        .iter()
        .filter(|s| s.enrolled_at.as_deref().map_or(true, |ts| window.contains(ts)))
        .filter(|s| matches_search(*s, search))
        .collect()
}

/// Payments paid inside the window; undated payments never match
pub fn filter_payments<'a>(doc: &'a Document, window: &Window, search: &str) -> Vec<&'a Payment> {
    doc.payments
        .iter()
        .filter(|p| p.paid_at.as_deref().map_or(false, |ts| window.contains(ts)))
        .filter(|p| matches_search(*p, search))
        .collect()
}

/// Expenses paid inside the window; undated expenses never match
pub fn filter_expenses<'a>(doc: &'a Document, window: &Window, search: &str) -> Vec<&'a Expense> {
    doc.expenses
        .iter()
        .filter(|e| e.paid_at.as_deref().map_or(false, |ts| window.contains(ts)))
        .filter(|e| matches_search(*e, search))
        .collect()
}

// ============================================================================
// TOTALS
// ============================================================================

pub fn revenue_total(payments: &[&Payment]) -> f64 {
    payments.iter().map(|p| p.amount()).sum()
}

pub fn expense_total(expenses: &[&Expense]) -> f64 {
    expenses.iter().map(|e| e.amount()).sum()
}

pub fn profit(revenue: f64, expenses: f64) -> f64 {
    revenue - expenses
}

/// Distinct payers: student id, falling back to note, then payment id
pub fn paid_student_count(payments: &[&Payment]) -> usize {
    payments
        .iter()
        .map(|p| p.payer_key())
        .collect::<HashSet<_>>()
        .len()
}

// ============================================================================
// YEARLY SERIES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthTotals {
    /// 1-based month number
    pub month: u32,
    pub label: String,
    pub revenue: f64,
    pub expenses: f64,
    pub profit: f64,
}

/// Revenue and expenses for each calendar month of `year`, over the whole
/// document. Search and the reporting window do not apply.
pub fn yearly_series(doc: &Document, year: i32, offset: &FixedOffset) -> Vec<MonthTotals> {
    (1..=12)
        .filter_map(|month| {
            let window = Window::month_at(year, month, offset)?;
            let revenue = revenue_total(&filter_payments(doc, &window, ""));
            let expenses = expense_total(&filter_expenses(doc, &window, ""));
            Some(MonthTotals {
                month,
                label: month_label(month).to_string(),
                revenue,
                expenses,
                profit: profit(revenue, expenses),
            })
        })
        .collect()
}

// ============================================================================
// BY STAFF
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffTotal {
    pub name: String,
    pub total: f64,
}

/// Payment amounts grouped by `received_by`, in first-seen order
pub fn by_staff_totals(payments: &[&Payment]) -> Vec<StaffTotal> {
    let mut totals: Vec<StaffTotal> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for payment in payments {
        let slot = *index
            .entry(payment.received_by())
            .or_insert_with(|| {
                totals.push(StaffTotal {
                    name: payment.received_by().to_string(),
                    total: 0.0,
                });
                totals.len() - 1
            });
        totals[slot].total += payment.amount();
    }

    totals
}

// ============================================================================
// FILTERED VIEW + SUMMARY
// ============================================================================

/// The three filtered lists for one window and search term
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    pub students: Vec<&'a Student>,
    pub payments: Vec<&'a Payment>,
    pub expenses: Vec<&'a Expense>,
}

impl<'a> FilteredView<'a> {
    pub fn new(doc: &'a Document, window: &Window, search: &str) -> Self {
        FilteredView {
            students: filter_students(doc, window, search),
            payments: filter_payments(doc, window, search),
            expenses: filter_expenses(doc, window, search),
        }
    }

    pub fn summary(&self) -> Summary {
        let revenue = revenue_total(&self.payments);
        let expenses = expense_total(&self.expenses);
        Summary {
            revenue,
            payment_count: self.payments.len(),
            expense_total: expenses,
            expense_count: self.expenses.len(),
            profit: profit(revenue, expenses),
            student_count: self.students.len(),
            paid_student_count: paid_student_count(&self.payments),
        }
    }

    pub fn by_staff(&self) -> Vec<StaffTotal> {
        by_staff_totals(&self.payments)
    }
}

/// KPI figures for one window and search term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub revenue: f64,
    pub payment_count: usize,
    pub expense_total: f64,
    pub expense_count: usize,
    pub profit: f64,
    pub student_count: usize,
    pub paid_student_count: usize,
}

impl Summary {
    pub fn compute(doc: &Document, window: &Window, search: &str) -> Self {
        FilteredView::new(doc, window, search).summary()
    }

    pub fn is_profitable(&self) -> bool {
        self.profit >= 0.0
    }
}

// ============================================================================
// TESTS
// ============================================================================
