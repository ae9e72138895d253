use anyhow::Result;
use chrono::{FixedOffset, Utc};
use consult_ledger::aggregate::{yearly_series, FilteredView, MonthTotals, StaffTotal, Summary};
use consult_ledger::export::{columns, expense_row, payment_row, student_row};
use consult_ledger::temporal::{current_month, month_label};
use consult_ledger::{EntityKind, LedgerStore, Storage, Window};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Overview,
    Students,
    Payments,
    Expenses,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Overview => Page::Students,
            Page::Students => Page::Payments,
            Page::Payments => Page::Expenses,
            Page::Expenses => Page::Overview,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Overview => Page::Expenses,
            Page::Students => Page::Overview,
            Page::Payments => Page::Students,
            Page::Expenses => Page::Payments,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Overview => "Overview",
            Page::Students => EntityKind::Students.title(),
            Page::Payments => EntityKind::Payments.title(),
            Page::Expenses => EntityKind::Expenses.title(),
        }
    }

    /// Table shown on this page; the overview has none
    pub fn kind(&self) -> Option<EntityKind> {
        match self {
            Page::Overview => None,
            Page::Students => Some(EntityKind::Students),
            Page::Payments => Some(EntityKind::Payments),
            Page::Expenses => Some(EntityKind::Expenses),
        }
    }
}

const PAGES: [Page; 4] = [Page::Overview, Page::Students, Page::Payments, Page::Expenses];

pub struct App<S: Storage> {
    pub store: LedgerStore<S>,
    pub offset: FixedOffset,
    pub year: i32,
    pub month: u32,
    pub search: String,
    pub editing_search: bool,
    pub current_page: Page,
    pub state: TableState,
    pub status: Option<String>,
}

impl<S: Storage> App<S> {
    pub fn new(store: LedgerStore<S>, offset: FixedOffset) -> Self {
        let (year, month) = current_month(Utc::now(), &offset);
        Self {
            store,
            offset,
            year,
            month,
            search: String::new(),
            editing_search: false,
            current_page: Page::Overview,
            state: TableState::default(),
            status: None,
        }
    }

    pub fn window(&self) -> Window {
        Window::month_at(self.year, self.month, &self.offset)
            .unwrap_or_else(|| Window::new("", ""))
    }

    fn row_count(&self) -> usize {
        let window = self.window();
        let view = FilteredView::new(self.store.document(), &window, &self.search);
        match self.current_page.kind() {
            Some(EntityKind::Students) => view.students.len(),
            Some(EntityKind::Payments) => view.payments.len(),
            Some(EntityKind::Expenses) => view.expenses.len(),
            None => 0,
        }
    }

    /// Id of the highlighted row on the current page
    pub fn selected_id(&self) -> Option<(EntityKind, String)> {
        let kind = self.current_page.kind()?;
        let i = self.state.selected()?;
        let window = self.window();
        let view = FilteredView::new(self.store.document(), &window, &self.search);
        let id = match kind {
            EntityKind::Students => view.students.get(i).map(|s| s.id.clone()),
            EntityKind::Payments => view.payments.get(i).map(|p| p.id.clone()),
            EntityKind::Expenses => view.expenses.get(i).map(|e| e.id.clone()),
        }?;
        Some((kind, id))
    }

    /// Keep the selection inside the current table after anything changes
    fn clamp_selection(&mut self) {
        let len = self.row_count();
        match self.state.selected() {
            _ if len == 0 => self.state.select(None),
            Some(i) if i >= len => self.state.select(Some(len - 1)),
            None => self.state.select(Some(0)),
            Some(_) => {}
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
        self.state.select(None);
        self.clamp_selection();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
        self.state.select(None);
        self.clamp_selection();
    }

    pub fn next_month(&mut self) {
        if self.month == 12 {
            self.month = 1;
            self.year += 1;
        } else {
            self.month += 1;
        }
        self.clamp_selection();
    }

    pub fn previous_month(&mut self) {
        if self.month == 1 {
            self.month = 12;
            self.year -= 1;
        } else {
            self.month -= 1;
        }
        self.clamp_selection();
    }

    pub fn shift_year(&mut self, delta: i32) {
        self.year += delta;
        self.clamp_selection();
    }

    pub fn next(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn delete_selected(&mut self) {
        let Some((kind, id)) = self.selected_id() else {
            return;
        };
        self.status = Some(match self.store.delete(kind, &id) {
            Ok(true) => format!("Deleted {} record", kind),
            Ok(false) => "Nothing deleted".to_string(),
            Err(e) => {
                warn!("Delete failed: {}", e);
                format!("Delete failed: {}", e)
            }
        });
        self.clamp_selection();
    }

    /// Apply one key press. Returns true when the app should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.editing_search {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => self.editing_search = false,
                KeyCode::Backspace => {
                    self.search.pop();
                }
                KeyCode::Char(c) => self.search.push(c),
                _ => {}
            }
            self.clamp_selection();
            return false;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => self.next_page(),
            KeyCode::BackTab => self.previous_page(),
            KeyCode::Left => self.previous_month(),
            KeyCode::Right => self.next_month(),
            KeyCode::Char('[') => self.shift_year(-1),
            KeyCode::Char(']') => self.shift_year(1),
            KeyCode::Char('/') => {
                self.editing_search = true;
                self.status = None;
            }
            KeyCode::Char('d') => self.delete_selected(),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Home => {
                if self.row_count() > 0 {
                    self.state.select(Some(0));
                }
            }
            KeyCode::End => {
                let len = self.row_count();
                if len > 0 {
                    self.state.select(Some(len - 1));
                }
            }
            _ => {}
        }
        false
    }
}

pub fn run_ui<S: Storage>(app: &mut App<S>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    info!("Dashboard closed");
    Ok(())
}

fn run_app<B: ratatui::backend::Backend, S: Storage>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                return Ok(());
            }
            if app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui<S: Storage>(f: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Tabs + KPIs
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    match app.current_page {
        Page::Overview => render_overview(f, chunks[1], app),
        _ => render_table(f, chunks[1], app),
    }
    render_status_bar(f, chunks[2], app);
}

fn render_header<S: Storage>(f: &mut Frame, area: Rect, app: &App<S>) {
    let window = app.window();
    let summary = Summary::compute(app.store.document(), &window, &app.search);

    let mut tab_spans = vec![];
    for (i, page) in PAGES.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }
        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        tab_spans.push(Span::styled(page.title().to_string(), style));
    }
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("{} {}", month_label(app.month), app.year),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ));

    let profit_color = if summary.is_profitable() {
        Color::Green
    } else {
        Color::Red
    };
    let kpi_spans = vec![
        Span::styled(
            format!("Revenue {:.2} ({})", summary.revenue, summary.payment_count),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  "),
        Span::styled(
            format!("Expenses {:.2} ({})", summary.expense_total, summary.expense_count),
            Style::default().fg(Color::Red),
        ),
        Span::raw("  "),
        Span::styled(
            format!("Profit {:.2}", summary.profit),
            Style::default().fg(profit_color).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!(
                "Students {} / paid {}",
                summary.student_count, summary.paid_student_count
            ),
            Style::default().fg(Color::White),
        ),
    ];

    let header = Paragraph::new(vec![Line::from(tab_spans), Line::from(kpi_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(header, area);
}

fn render_overview<S: Storage>(f: &mut Frame, area: Rect, app: &App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let doc = app.store.document();
    let series = yearly_series(doc, app.year, &app.offset);
    let (revenue, expenses, profit) = series.iter().fold((0.0, 0.0, 0.0), |acc, m| {
        (acc.0 + m.revenue, acc.1 + m.expenses, acc.2 + m.profit)
    });

    let title = Line::from(vec![
        Span::raw(format!(" {} ", app.year)),
        Span::styled(format!("■ Revenue {:.0} ", revenue), Style::default().fg(SERIES_COLORS[0])),
        Span::styled(format!("■ Expenses {:.0} ", expenses), Style::default().fg(SERIES_COLORS[1])),
        Span::styled(format!("■ Profit {:.0} ", profit), Style::default().fg(SERIES_COLORS[2])),
    ]);

    let mut chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .bar_width(1)
        .bar_gap(0)
        .group_gap(1);
    for month in &series {
        let bars: Vec<Bar> = month_bar_values(month)
            .into_iter()
            .zip(SERIES_COLORS)
            .map(|(value, color)| {
                Bar::default()
                    .value(value)
                    .text_value(String::new())
                    .style(Style::default().fg(color))
            })
            .collect();
        chart = chart.data(
            BarGroup::default()
                .label(Line::from(month.label.clone()))
                .bars(&bars),
        );
    }
    f.render_widget(chart, chunks[0]);

    let window = app.window();
    let view = FilteredView::new(doc, &window, &app.search);
    render_staff_totals(f, chunks[1], &view.by_staff());
}

/// Revenue, expenses, profit
const SERIES_COLORS: [Color; 3] = [Color::Green, Color::Red, Color::Cyan];

/// Bar heights for one month; a loss draws as an empty profit bar
fn month_bar_values(month: &MonthTotals) -> [u64; 3] {
    [month.revenue, month.expenses, month.profit].map(|v| v.max(0.0).round() as u64)
}

fn render_staff_totals(f: &mut Frame, area: Rect, totals: &[StaffTotal]) {
    let header = Row::new(["Received By", "Total"].map(|h| {
        Cell::from(h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    }))
    .style(Style::default().bg(Color::DarkGray));

    let rows = totals.iter().map(|t| {
        Row::new(vec![
            Cell::from(t.name.clone()),
            Cell::from(format!("{:.2}", t.total)).style(Style::default().fg(Color::Green)),
        ])
    });

    let table = Table::new(
        rows,
        [Constraint::Min(12), Constraint::Length(12)],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" By staff (this month) "),
    );
    f.render_widget(table, area);
}

fn render_table<S: Storage>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let Some(kind) = app.current_page.kind() else {
        return;
    };
    let window = app.window();
    let doc = app.store.document();
    let view = FilteredView::new(doc, &window, &app.search);

    let rows: Vec<Vec<String>> = match kind {
        EntityKind::Students => view
            .students
            .iter()
            .map(|s| student_row(s, &app.offset))
            .collect(),
        EntityKind::Payments => view
            .payments
            .iter()
            .map(|p| payment_row(doc, p, &app.offset))
            .collect(),
        EntityKind::Expenses => view
            .expenses
            .iter()
            .map(|e| expense_row(e, &app.offset))
            .collect(),
    };
    let row_total = rows.len();

    let header_cells = columns(kind).iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let amount_color = match kind {
        EntityKind::Payments => Color::Green,
        EntityKind::Expenses => Color::Red,
        EntityKind::Students => Color::White,
    };
    let body = rows.into_iter().map(|cells| {
        Row::new(cells.into_iter().enumerate().map(|(i, cell)| {
            // Amount is the third column in both money tables
            if i == 2 && kind != EntityKind::Students {
                Cell::from(cell).style(Style::default().fg(amount_color))
            } else {
                Cell::from(truncate(&cell, 28))
            }
        }))
        .height(1)
    });

    let widths: Vec<Constraint> = columns(kind)
        .iter()
        .map(|h| match *h {
            "Paid At" | "Enrolled At" => Constraint::Length(17),
            "Amount" => Constraint::Length(14),
            "Curr." | "Method" | "Status" => Constraint::Length(9),
            _ => Constraint::Min(10),
        })
        .collect();

    let title = format!(
        " {} - {} {} ({} rows) ",
        kind.title(),
        month_label(app.month),
        app.year,
        row_total
    );

    let table = Table::new(body, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(title),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar<S: Storage>(f: &mut Frame, area: Rect, app: &App<S>) {
    let mut status_spans = vec![];

    if app.editing_search {
        status_spans.push(Span::styled(" Search: ", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(format!("{}▏", app.search)));
        status_spans.push(Span::styled(
            "  (Enter to finish)",
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        if !app.search.is_empty() {
            status_spans.push(Span::styled(
                format!(" Search: \"{}\" ", app.search),
                Style::default().fg(Color::Green),
            ));
            status_spans.push(Span::raw("|"));
        }
        if let Some(message) = &app.status {
            status_spans.push(Span::styled(
                format!(" {} ", message),
                Style::default().fg(Color::Cyan),
            ));
            status_spans.push(Span::raw("|"));
        }
        for (key, label, color) in [
            ("Tab", "Page", Color::Yellow),
            ("←/→", "Month", Color::Yellow),
            ("[/]", "Year", Color::Yellow),
            ("/", "Search", Color::Yellow),
            ("d", "Delete", Color::Yellow),
            ("q", "Quit", Color::Red),
        ] {
            status_spans.push(Span::raw(" "));
            status_spans.push(Span::styled(key, Style::default().fg(color)));
            status_spans.push(Span::raw(format!(" {} ", label)));
        }
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );
    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
