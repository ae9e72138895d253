// Consult Ledger - Core Library
// Exposes all modules for use in the CLI, the TUI, and tests

pub mod aggregate;  // KPI totals, windows, yearly series, per-staff totals
pub mod config;     // CLI > env > TOML > default resolution
pub mod db;         // SQLite key-value backend
pub mod entities;   // Document, Student, Payment, Expense
pub mod error;
pub mod export;     // CSV tables and export file names
pub mod forms;      // Validated new-record input
pub mod integrity;  // Read-only consistency report
pub mod seed;
pub mod storage;    // Storage trait, memory and file backends
pub mod store;      // LedgerStore: load/save/reset/import/export + mutations
pub mod temporal;   // Canonical timestamps and reporting windows

// Re-export commonly used types
pub use aggregate::{
    by_staff_totals, filter_expenses, filter_payments, filter_students, yearly_series,
    FilteredView, MonthTotals, StaffTotal, Summary,
};
pub use config::{BackendKind, Config, Overrides};
pub use db::SqliteStorage;
pub use entities::{
    Amount, Document, EntityKind, Expense, Payment, PaymentMethod, Student, StudentStatus,
    MISSING_PLACEHOLDER,
};
pub use error::{Error, Result, ValidationError};
pub use forms::{NewExpense, NewPayment, NewStudent};
pub use integrity::{IntegrityChecker, IntegrityIssue, IntegrityReport, Severity};
pub use seed::seed_document;
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{LedgerStore, DEFAULT_STORAGE_KEY};
pub use temporal::Window;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
