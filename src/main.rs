// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use chrono::{FixedOffset, Utc};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use consult_ledger::aggregate::{yearly_series, FilteredView, Summary};
use consult_ledger::export::{
    self, expense_row, format_money, payment_row, snapshot_file_name, student_row,
    table_file_name,
};
use consult_ledger::forms::{parse_method, parse_status};
use consult_ledger::temporal::{current_month, month_label};
use consult_ledger::{
    Config, EntityKind, IntegrityChecker, LedgerStore, NewExpense, NewPayment, NewStudent,
    Overrides, Storage, Window,
};

type Store = LedgerStore<Box<dyn Storage>>;

/// Income, expense and student ledger for a consulting office
#[derive(Parser, Debug)]
#[command(name = "consult-ledger")]
#[command(version)]
struct Cli {
    /// Folder holding the ledger data
    #[arg(long, global = true, env = "LEDGER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Storage backend: file or sqlite
    #[arg(long, global = true, env = "LEDGER_BACKEND")]
    backend: Option<String>,

    /// Key the ledger document is stored under
    #[arg(long, global = true, env = "LEDGER_STORAGE_KEY")]
    storage_key: Option<String>,

    /// Minutes east of UTC used for month boundaries and displayed dates
    #[arg(long, global = true, allow_hyphen_values = true, env = "LEDGER_UTC_OFFSET_MINUTES")]
    utc_offset_minutes: Option<i32>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args, Debug, Clone, Default)]
struct WindowArgs {
    /// Reporting year (default: current)
    #[arg(long)]
    year: Option<i32>,

    /// Reporting month 1-12 (default: current)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,

    /// Case-insensitive text filter over every field
    #[arg(long, default_value = "")]
    search: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// KPI totals for a month
    Summary(WindowArgs),
    /// Students enrolled in a month
    Students(WindowArgs),
    /// Payments received in a month
    Payments(WindowArgs),
    /// Expenses paid in a month
    Expenses(WindowArgs),
    /// Revenue, expenses and profit for each month of a year
    Yearly {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Payment totals per staff member for a month
    ByStaff(WindowArgs),
    AddStudent {
        name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        program: Option<String>,
        /// lead, enrolled or paid
        #[arg(long, default_value = "lead")]
        status: String,
    },
    AddPayment {
        amount: f64,
        /// Student id to link
        #[arg(long)]
        student: Option<String>,
        #[arg(long)]
        currency: Option<String>,
        /// cash, card, bank, transfer or other
        #[arg(long, default_value = "cash")]
        method: String,
        #[arg(long)]
        received_by: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    AddExpense {
        category: String,
        amount: f64,
        #[arg(long)]
        currency: Option<String>,
        #[arg(long)]
        paid_to: Option<String>,
        #[arg(long, default_value = "cash")]
        method: String,
        #[arg(long)]
        entered_by: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    AddStaff {
        name: String,
    },
    /// Remove one record by id
    Delete {
        /// students, payments or expenses
        kind: EntityKind,
        id: String,
    },
    /// Replace the whole ledger with a JSON file
    Import {
        path: PathBuf,
    },
    /// Write the persisted ledger JSON (stdout, or a generated file in --out)
    ExportJson {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Write one filtered table as CSV (stdout, or a generated file in --out)
    ExportCsv {
        kind: EntityKind,
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Discard all data and start again from the sample ledger
    Reset {
        /// Required; reset cannot be undone
        #[arg(long)]
        yes: bool,
    },
    /// Report records that may distort totals
    Check,
    /// Interactive dashboard
    Tui,
}

fn main() -> Result<()> {
    // Logs go to stderr so exports on stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "consult_ledger=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::resolve(Overrides {
        data_dir: cli.data_dir.clone(),
        backend: cli.backend.clone(),
        storage_key: cli.storage_key.clone(),
        utc_offset_minutes: cli.utc_offset_minutes,
    })
    .context("Failed to resolve configuration")?;
    let offset = config.offset()?;

    info!(
        "consult-ledger v{} using {} storage in {}",
        consult_ledger::VERSION,
        config.backend,
        config.data_dir.display()
    );

    let backend = config
        .open_storage()
        .with_context(|| format!("Failed to open storage in {}", config.data_dir.display()))?;
    let mut store = LedgerStore::open(backend, config.storage_key.clone())
        .context("Failed to load ledger")?;

    match cli.command {
        Some(Command::Tui) => run_tui(store, offset),
        Some(command) => run_command(&mut store, &offset, command),
        None => run_default(store, offset),
    }
}

#[cfg(feature = "tui")]
fn run_default(store: Store, offset: FixedOffset) -> Result<()> {
    run_tui(store, offset)
}

#[cfg(not(feature = "tui"))]
fn run_default(mut store: Store, offset: FixedOffset) -> Result<()> {
    run_command(&mut store, &offset, Command::Summary(WindowArgs::default()))
}

#[cfg(feature = "tui")]
fn run_tui(store: Store, offset: FixedOffset) -> Result<()> {
    let mut app = ui::App::new(store, offset);
    ui::run_ui(&mut app)
}

#[cfg(not(feature = "tui"))]
fn run_tui(_store: Store, _offset: FixedOffset) -> Result<()> {
    bail!("TUI mode not available; rebuild with --features tui")
}

fn run_command(store: &mut Store, offset: &FixedOffset, command: Command) -> Result<()> {
    match command {
        Command::Summary(args) => {
            let window = resolve_window(&args, offset)?;
            let summary = Summary::compute(store.document(), &window, &args.search);
            print_summary(&summary, &args, offset);
        }
        Command::Students(args) => {
            let window = resolve_window(&args, offset)?;
            let view = FilteredView::new(store.document(), &window, &args.search);
            let rows = view
                .students
                .iter()
                .map(|s| (s.id.clone(), student_row(s, offset)))
                .collect();
            print_table(EntityKind::Students, rows);
        }
        Command::Payments(args) => {
            let window = resolve_window(&args, offset)?;
            let doc = store.document();
            let view = FilteredView::new(doc, &window, &args.search);
            let rows = view
                .payments
                .iter()
                .map(|p| (p.id.clone(), payment_row(doc, p, offset)))
                .collect();
            print_table(EntityKind::Payments, rows);
        }
        Command::Expenses(args) => {
            let window = resolve_window(&args, offset)?;
            let view = FilteredView::new(store.document(), &window, &args.search);
            let rows = view
                .expenses
                .iter()
                .map(|e| (e.id.clone(), expense_row(e, offset)))
                .collect();
            print_table(EntityKind::Expenses, rows);
        }
        Command::Yearly { year } => {
            let year = year.unwrap_or_else(|| current_month(Utc::now(), offset).0);
            println!("{:<5} {:>12} {:>12} {:>12}", year, "Revenue", "Expenses", "Profit");
            for month in yearly_series(store.document(), year, offset) {
                println!(
                    "{:<5} {:>12.2} {:>12.2} {:>12.2}",
                    month.label, month.revenue, month.expenses, month.profit
                );
            }
        }
        Command::ByStaff(args) => {
            let window = resolve_window(&args, offset)?;
            let view = FilteredView::new(store.document(), &window, &args.search);
            for total in view.by_staff() {
                println!("{:<20} {:>12.2}", total.name, total.total);
            }
        }
        Command::AddStudent {
            name,
            phone,
            program,
            status,
        } => {
            let student = store.add_student(NewStudent {
                name,
                phone,
                program,
                status: parse_status(&status)?,
            })?;
            println!("{}", student.id);
        }
        Command::AddPayment {
            amount,
            student,
            currency,
            method,
            received_by,
            note,
        } => {
            let payment = store.add_payment(NewPayment {
                student_id: student,
                amount,
                currency,
                method: parse_method(&method)?,
                received_by,
                note,
            })?;
            println!("{}", payment.id);
        }
        Command::AddExpense {
            category,
            amount,
            currency,
            paid_to,
            method,
            entered_by,
            note,
        } => {
            let expense = store.add_expense(NewExpense {
                category,
                amount,
                currency,
                paid_to,
                method: parse_method(&method)?,
                entered_by,
                note,
            })?;
            println!("{}", expense.id);
        }
        Command::AddStaff { name } => {
            let name = store.add_staff(&name)?;
            println!("{}", name);
        }
        Command::Delete { kind, id } => {
            if !store.delete(kind, &id)? {
                bail!("No {} record with id {}", kind, id);
            }
        }
        Command::Import { path } => {
            let bytes =
                fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
            store
                .replace_document(&bytes)
                .with_context(|| format!("Import of {} failed", path.display()))?;
            let doc = store.document();
            println!(
                "Imported {} students, {} payments, {} expenses",
                doc.students.len(),
                doc.payments.len(),
                doc.expenses.len()
            );
        }
        Command::ExportJson { out } => {
            let bytes = store.export_snapshot()?;
            write_output(out.as_deref(), &snapshot_file_name(Utc::now()), &bytes)?;
        }
        Command::ExportCsv { kind, window, out } => {
            let range = resolve_window(&window, offset)?;
            let doc = store.document();
            let view = FilteredView::new(doc, &range, &window.search);
            let csv = match kind {
                EntityKind::Students => export::students_csv(&view.students, offset)?,
                EntityKind::Payments => export::payments_csv(doc, &view.payments, offset)?,
                EntityKind::Expenses => export::expenses_csv(&view.expenses, offset)?,
            };
            write_output(out.as_deref(), &table_file_name(kind, Utc::now()), csv.as_bytes())?;
        }
        Command::Reset { yes } => {
            if !yes {
                bail!("Reset discards all data; pass --yes to confirm");
            }
            store.reset()?;
            println!("Ledger reset to sample data");
        }
        Command::Check => {
            let report = IntegrityChecker::new().check(store.document());
            for issue in &report.issues {
                println!(
                    "[{}] {} {} {}: {}",
                    issue.severity.as_str(),
                    issue.kind,
                    issue.record_id,
                    issue.field,
                    issue.issue
                );
                println!("        → {}", issue.recommendation);
            }
            println!("{}", report.summary());
        }
        Command::Tui => bail!("tui is interactive; run it without other commands"),
    }
    Ok(())
}

fn resolve_window(args: &WindowArgs, offset: &FixedOffset) -> Result<Window> {
    let (year, month) = current_month(Utc::now(), offset);
    let year = args.year.unwrap_or(year);
    let month = args.month.unwrap_or(month);
    Window::month_at(year, month, offset)
        .with_context(|| format!("No calendar month {}-{:02}", year, month))
}

fn print_summary(summary: &Summary, args: &WindowArgs, offset: &FixedOffset) {
    let (year, month) = current_month(Utc::now(), offset);
    let month = args.month.unwrap_or(month);
    println!("{} {}", month_label(month), args.year.unwrap_or(year));
    if !args.search.is_empty() {
        println!("Search:        \"{}\"", args.search);
    }
    println!(
        "Revenue:       {} ({} payments)",
        format_money(summary.revenue, ""),
        summary.payment_count
    );
    println!(
        "Expenses:      {} ({} expenses)",
        format_money(summary.expense_total, ""),
        summary.expense_count
    );
    println!("Profit:        {}", format_money(summary.profit, ""));
    println!("Students:      {}", summary.student_count);
    println!("Paid students: {}", summary.paid_student_count);
}

fn print_table(kind: EntityKind, rows: Vec<(String, Vec<String>)>) {
    println!("{} ({})", kind.title(), rows.len());
    println!("{:<36}  {}", "Id", export::columns(kind).join(" | "));
    for (id, cells) in rows {
        println!("{:<36}  {}", id, cells.join(" | "));
    }
}

/// Write to stdout, or to `<dir>/<file_name>` when a folder is given
fn write_output(dir: Option<&Path>, file_name: &str, bytes: &[u8]) -> Result<()> {
    match dir {
        None => {
            use std::io::Write;
            std::io::stdout().write_all(bytes)?;
        }
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let path = dir.join(file_name);
            fs::write(&path, bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
