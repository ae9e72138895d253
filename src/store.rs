// 🗄️ Ledger Store - owns the canonical Document and its persistence
//
// Every mutation builds the next Document, writes it in full to the backend,
// and only then replaces the in-memory snapshot. There is no batching and no
// partial write: one add or delete is one whole-document rewrite.

use crate::entities::{Document, EntityKind, Expense, Payment, Student};
use crate::error::{Error, Result};
use crate::forms::{validate_staff_name, NewExpense, NewPayment, NewStudent};
use crate::seed::seed_document_at;
use crate::storage::Storage;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// Key the document lives under when none is configured
pub const DEFAULT_STORAGE_KEY: &str = "ledger_data_v1";

pub type Clock = fn() -> DateTime<Utc>;

pub struct LedgerStore<S: Storage> {
    backend: S,
    key: String,
    clock: Clock,
    doc: Document,
}

impl<S: Storage> LedgerStore<S> {
    /// Construct the store and load the current document from `backend`
    pub fn open(backend: S, key: impl Into<String>) -> Result<Self> {
        Self::open_with_clock(backend, key, Utc::now)
    }

    /// As `open`, with an explicit clock for timestamps and seed dates.
    ///
    /// Empty storage gets the seed written on the spot, so seed ids stay the
    /// same from one run to the next. Unreadable bytes are left alone.
    pub fn open_with_clock(backend: S, key: impl Into<String>, clock: Clock) -> Result<Self> {
        let mut store = LedgerStore {
            backend,
            key: key.into(),
            clock,
            doc: Document::default(),
        };
        if store.backend.get(&store.key)?.is_none() {
            info!("No ledger stored under '{}', writing seed", store.key);
            let seed = store.seed();
            store.save(seed)?;
        } else {
            store.doc = store.load()?;
        }
        Ok(store)
    }

    /// Current in-memory snapshot
    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    // ========================================================================
    // LOAD / SAVE / RESET / IMPORT / EXPORT
    // ========================================================================

    /// Read the persisted document.
    ///
    /// Nothing stored, or stored bytes that do not parse, both yield the seed
    /// document; the latter is logged and otherwise silent. A parsed document
    /// gets its unlinked payments pointed at the first student.
    /// Only a failing backend read is an error.
    pub fn load(&self) -> Result<Document> {
        let raw = match self.backend.get(&self.key)? {
            Some(raw) => raw,
            None => {
                debug!("No ledger stored under '{}', using seed", self.key);
                return Ok(self.seed());
            }
        };

        match serde_json::from_str::<Document>(&raw) {
            Ok(mut doc) => {
                let linked = doc.link_unassigned_payments();
                if linked > 0 {
                    debug!("Linked {} legacy payments to the first student", linked);
                }
                Ok(doc)
            }
            Err(e) => {
                warn!("Stored ledger under '{}' is unreadable ({}), using seed", self.key, e);
                Ok(self.seed())
            }
        }
    }

    /// Re-read storage into the in-memory snapshot
    pub fn reload(&mut self) -> Result<()> {
        self.doc = self.load()?;
        Ok(())
    }

    /// Serialize `doc` in full, overwrite storage, then adopt it as the snapshot
    pub fn save(&mut self, doc: Document) -> Result<()> {
        let raw = serde_json::to_string(&doc)?;
        self.backend.set(&self.key, &raw)?;
        debug!("Saved ledger ({} bytes)", raw.len());
        self.doc = doc;
        Ok(())
    }

    /// Discard persisted data and start over from a fresh seed, which is
    /// written back the same way a first open writes it
    pub fn reset(&mut self) -> Result<()> {
        self.backend.remove(&self.key)?;
        info!("Ledger reset; persisted data discarded");

        let seed = self.seed();
        self.doc = seed.clone();
        self.save(seed)
    }

    /// Replace storage wholesale with imported bytes.
    ///
    /// Any well-formed JSON is accepted and written as-is; no field checks.
    /// Malformed JSON returns `Error::ImportInvalid` and changes nothing.
    pub fn replace_document(&mut self, bytes: &[u8]) -> Result<()> {
        let parsed: serde_json::Value =
            serde_json::from_slice(bytes).map_err(Error::ImportInvalid)?;
        let raw = serde_json::to_string(&parsed)?;

        self.backend.set(&self.key, &raw)?;
        info!("Imported ledger ({} bytes)", raw.len());

        self.reload()
    }

    /// Exact persisted bytes, or the current snapshot when the key has gone
    /// missing from the backend since open
    pub fn export_snapshot(&self) -> Result<Vec<u8>> {
        match self.backend.get(&self.key)? {
            Some(raw) => Ok(raw.into_bytes()),
            None => Ok(serde_json::to_vec(&self.doc)?),
        }
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// New students go to the front of the list
    pub fn add_student(&mut self, form: NewStudent) -> Result<Student> {
        let student = form.into_student(self.now())?;

        let mut next = self.doc.clone();
        next.students.insert(0, student.clone());
        self.save(next)?;

        info!("Added student {} ({})", student.name(), student.id);
        Ok(student)
    }

    pub fn add_payment(&mut self, form: NewPayment) -> Result<Payment> {
        let payment = form.into_payment(&self.doc, self.now())?;

        let mut next = self.doc.clone();
        next.payments.insert(0, payment.clone());
        self.save(next)?;

        info!("Added payment {} of {} {}", payment.id, payment.amount(), payment.currency());
        Ok(payment)
    }

    pub fn add_expense(&mut self, form: NewExpense) -> Result<Expense> {
        let expense = form.into_expense(&self.doc, self.now())?;

        let mut next = self.doc.clone();
        next.expenses.insert(0, expense.clone());
        self.save(next)?;

        info!("Added expense {} ({})", expense.id, expense.category());
        Ok(expense)
    }

    /// Staff names are appended, and must be unique
    pub fn add_staff(&mut self, name: &str) -> Result<String> {
        let name = validate_staff_name(&self.doc, name)?;

        let mut next = self.doc.clone();
        next.staff.push(name.clone());
        self.save(next)?;

        info!("Added staff member {}", name);
        Ok(name)
    }

    /// Filter one record out by id. Returns false (and writes nothing) when
    /// no record has that id.
    pub fn delete(&mut self, kind: EntityKind, id: &str) -> Result<bool> {
        let mut next = self.doc.clone();
        if !next.remove(kind, id) {
            debug!("Nothing to delete in {} with id {}", kind, id);
            return Ok(false);
        }
        self.save(next)?;

        info!("Deleted {} record {}", kind, id);
        Ok(true)
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn seed(&self) -> Document {
        seed_document_at(self.now())
    }
}
