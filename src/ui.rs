use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use money_tracker::{format_row_date, ExpenseForm, ExpenseList, Field, Store};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Status {
    pub kind: StatusKind,
    pub message: String,
}

pub struct App {
    pub store: Store,
    pub list: ExpenseList,
    pub form: Option<ExpenseForm>,
    pub state: TableState,
    pub currency_symbol: String,
    pub status: Option<Status>,
    pub should_quit: bool,
}

impl App {
    pub fn new(mut store: Store, currency_symbol: String) -> money_tracker::Result<Self> {
        let list = ExpenseList::new(&mut store)?;
        let mut app = Self {
            store,
            list,
            form: None,
            state: TableState::default(),
            currency_symbol,
            status: None,
            should_quit: false,
        };
        app.state.select(app.list.cursor());
        Ok(app)
    }

    fn info(&mut self, message: impl Into<String>) {
        self.status = Some(Status {
            kind: StatusKind::Info,
            message: message.into(),
        });
    }

    fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(%message, "user action failed");
        self.status = Some(Status {
            kind: StatusKind::Error,
            message,
        });
    }

    /// Pull pending store changes into the list before drawing
    pub fn refresh(&mut self) {
        if let Err(err) = self.list.sync(&self.store) {
            self.error(err.to_string());
        }
        self.state.select(self.list.cursor());
    }

    pub fn open_add(&mut self) {
        self.status = None;
        self.form = Some(ExpenseForm::add());
    }

    pub fn open_edit(&mut self) {
        if let Some(expense) = self.list.selected() {
            let form = ExpenseForm::edit(expense);
            self.status = None;
            self.form = Some(form);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.form.is_some() {
            self.handle_form_key(key);
        } else {
            self.handle_list_key(key);
        }
        self.refresh();
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc if self.list.marked_count() > 0 => self.list.clear_marks(),
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::Char('a') | KeyCode::Char('+') => self.open_add(),
            KeyCode::Enter => self.open_edit(),
            KeyCode::Char(' ') => self.list.toggle_mark(),
            KeyCode::Char('d') | KeyCode::Delete => self.delete_selected(),
            KeyCode::Down | KeyCode::Char('j') => self.list.next(),
            KeyCode::Up | KeyCode::Char('k') => self.list.previous(),
            KeyCode::PageDown => self.list.page_down(),
            KeyCode::PageUp => self.list.page_up(),
            KeyCode::Home => self.list.first(),
            KeyCode::End => self.list.last(),
            _ => {}
        }
    }

    fn delete_selected(&mut self) {
        match self.list.delete_selected(&mut self.store) {
            Ok(0) => {}
            Ok(1) => self.info("Deleted 1 expense"),
            Ok(n) => self.info(format!("Deleted {} expenses", n)),
            Err(err) => self.error(err.to_string()),
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') if ctrl => {
                if let Some(form) = self.form.take() {
                    form.cancel();
                }
                self.should_quit = true;
                return;
            }
            KeyCode::Esc => {
                if let Some(form) = self.form.take() {
                    form.cancel();
                }
                self.status = None;
                return;
            }
            KeyCode::Enter => {
                self.confirm_form();
                return;
            }
            _ => {}
        }

        let Some(form) = self.form.as_mut() else {
            return;
        };

        match key.code {
            KeyCode::Tab | KeyCode::Down => form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => form.focus_previous(),
            KeyCode::Left if form.focus() == Field::Date => form.shift_days(-1),
            KeyCode::Right if form.focus() == Field::Date => form.shift_days(1),
            KeyCode::PageUp if form.focus() == Field::Date => form.shift_months(-1),
            KeyCode::PageDown if form.focus() == Field::Date => form.shift_months(1),
            KeyCode::Char('t') if form.focus() == Field::Date => form.set_today(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(c) if !ctrl => {
                form.input_char(c);
            }
            _ => {}
        }
    }

    fn confirm_form(&mut self) {
        let Some(form) = self.form.as_ref() else {
            return;
        };

        match form.confirm(&mut self.store) {
            Ok(expense) => {
                self.form = None;
                self.refresh();
                if let Some(i) = self.list.position(&expense.id) {
                    self.list.select(i);
                }
                self.info(format!("Saved \"{}\"", expense.name));
            }
            // Keep the form open so the user can fix the input
            Err(err) => self.error(err.to_string()),
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                app.handle_key(key);
            }
        }
    }
    Ok(())
}

fn ui(f: &mut Frame, app: &mut App) {
    let size = f.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Expense list
            Constraint::Length(3), // Status bar
        ])
        .split(size);

    render_header(f, chunks[0], app);

    if app.list.is_empty() {
        render_empty_state(f, chunks[1]);
    } else {
        render_table(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);

    if let Some(form) = app.form.as_ref() {
        render_form(f, size, form);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        "Expenses",
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )];

    if !app.list.is_empty() {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            format!("{} recorded", app.list.len()),
            Style::default().fg(Color::White),
        ));
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled("a", Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(" Add Expense"));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_empty_state(f: &mut Frame, area: Rect) {
    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "No expenses",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Start adding expenses to see your list.",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw("Press "),
            Span::styled("a", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" to Add Expenses"),
        ]),
    ];

    let placeholder = Paragraph::new(content)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(placeholder, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["", "Date", "Name", "Value"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let name_width = area.width.saturating_sub(2 + 2 + 3 + 8 + 16) as usize;
    let rows = app
        .list
        .rows(&app.currency_symbol)
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let mark = if app.list.is_marked(i) { "●" } else { "" };
            let cells = vec![
                Cell::from(mark).style(Style::default().fg(Color::Red)),
                Cell::from(row.date),
                Cell::from(money_tracker::format::truncate(&row.name, name_width.max(4))),
                Cell::from(row.value).style(Style::default().fg(Color::Green)),
            ];
            Row::new(cells).height(1)
        })
        .collect::<Vec<_>>();

    let table = Table::new(
        rows,
        [
            Constraint::Length(1),
            Constraint::Length(8),
            Constraint::Min(4),
            Constraint::Length(16),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL))
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = Vec::new();

    if let Some(status) = &app.status {
        let color = match status.kind {
            StatusKind::Info => Color::Green,
            StatusKind::Error => Color::Red,
        };
        status_spans.push(Span::styled(format!(" {} ", status.message), Style::default().fg(color)));
        status_spans.push(Span::raw("| "));
    }

    let hints: &[(&str, &str)] = if app.form.is_some() {
        &[
            ("Enter", "Confirm"),
            ("Esc", "Cancel"),
            ("Tab", "Field"),
            ("←/→", "Day"),
            ("PgUp/PgDn", "Month"),
            ("t", "Today"),
        ]
    } else if app.list.is_empty() {
        &[("a", "Add"), ("q", "Quit")]
    } else {
        &[
            ("a", "Add"),
            ("Enter", "Edit"),
            ("Space", "Mark"),
            ("d", "Delete"),
            ("↑/↓", "Nav"),
            ("q", "Quit"),
        ]
    };

    for (i, (key, label)) in hints.iter().enumerate() {
        if i > 0 {
            status_spans.push(Span::raw(" | "));
        }
        let color = if *key == "q" { Color::Red } else { Color::Yellow };
        status_spans.push(Span::styled(*key, Style::default().fg(color)));
        status_spans.push(Span::raw(format!(" {}", label)));
    }

    if app.list.marked_count() > 0 && app.form.is_none() {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("{} marked", app.list.marked_count()),
            Style::default().fg(Color::Cyan),
        ));
    }

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_form(f: &mut Frame, area: Rect, form: &ExpenseForm) {
    let popup = centered_rect(60, 11, area);

    let label_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let mut content = vec![Line::from("")];

    for field in Field::ALL {
        let focused = form.focus() == field;
        let value = match field {
            Field::Name => form.draft().name.clone(),
            Field::Date => format!(
                "{}  ({})",
                format_row_date(&form.draft().date.with_timezone(&chrono::Local)),
                form.draft().date.with_timezone(&chrono::Local).format("%Y-%m-%d"),
            ),
            Field::Value => {
                if form.value_input().is_empty() {
                    "0".to_string()
                } else {
                    form.value_input().to_string()
                }
            }
        };

        let value_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::UNDERLINED)
        } else {
            Style::default()
        };

        content.push(Line::from(vec![
            Span::raw(if focused { " → " } else { "   " }),
            Span::styled(format!("{:<14}", field.label()), label_style),
            Span::styled(value, value_style),
        ]));
        content.push(Line::from(""));
    }

    content.push(Line::from(vec![
        Span::raw("   "),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::raw(" Cancel   "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(format!(" {}", form.mode().confirm_label())),
    ]));

    let panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(format!(" {} ", form.mode().title())),
    );

    f.render_widget(Clear, popup);
    f.render_widget(panel, popup);
}

/// Rect of `percent_x` width and `height` rows centered in `area`
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(area.height.saturating_sub(height) / 2),
            Constraint::Length(height.min(area.height)),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use money_tracker::StoreConfig;

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn app() -> App {
        let store = Store::open_in_memory(StoreConfig::default()).unwrap();
        App::new(store, "₹".to_string()).unwrap()
    }

    fn add_through_form(app: &mut App, name: &str, value: &str) {
        press(app, KeyCode::Char('a'));
        type_text(app, name);
        press(app, KeyCode::Tab);
        press(app, KeyCode::Tab);
        type_text(app, value);
        press(app, KeyCode::Enter);
    }

    #[test]
    fn test_add_flow_updates_list() {
        let mut app = app();
        assert!(app.list.is_empty());

        add_through_form(&mut app, "Coffee", "4.50");

        assert!(app.form.is_none(), "Form closes after save");
        assert_eq!(app.list.len(), 1);
        assert_eq!(app.list.rows("₹")[0].value, "₹4.50");
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_escape_in_add_mode_saves_nothing() {
        let mut app = app();

        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "Coffee");
        press(&mut app, KeyCode::Esc);

        assert!(app.form.is_none());
        assert_eq!(app.store.count().unwrap(), 0);
        assert!(!app.should_quit, "Esc in a form only closes the form");
    }

    #[test]
    fn test_duplicate_name_shows_error_and_keeps_form() {
        let mut app = app();
        add_through_form(&mut app, "Coffee", "4");
        add_through_form(&mut app, "Coffee", "5");

        assert!(app.form.is_some(), "Form stays open on error");
        let status = app.status.clone().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert!(status.message.contains("already exists"));
        assert_eq!(app.store.count().unwrap(), 1);
    }

    #[test]
    fn test_edit_flow_keeps_identity() {
        let mut app = app();
        add_through_form(&mut app, "Coffee", "4");
        let id = app.list.selected().unwrap().id.clone();

        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::BackTab);
        press(&mut app, KeyCode::Backspace);
        type_text(&mut app, "7");
        press(&mut app, KeyCode::Enter);

        let all = app.store.list().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].value, 7.0);
    }

    #[test]
    fn test_mark_and_delete() {
        let mut app = app();
        add_through_form(&mut app, "A", "1");
        add_through_form(&mut app, "B", "2");
        add_through_form(&mut app, "C", "3");

        press(&mut app, KeyCode::Home);
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::End);
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('d'));

        assert_eq!(app.store.count().unwrap(), 1);
        assert_eq!(app.list.len(), 1);
        assert_eq!(app.status.unwrap().message, "Deleted 2 expenses");
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_c_in_form_quits_without_typing() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "Co");

        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));

        assert!(app.should_quit, "Ctrl+C quits from inside the form");
        assert!(app.form.is_none(), "Open form is discarded");
        assert_eq!(app.store.count().unwrap(), 0, "Nothing is saved");
    }

    #[test]
    fn test_control_chars_are_not_typed_into_fields() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "Tea");

        app.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));

        assert_eq!(app.form.as_ref().unwrap().draft().name, "Tea");
        assert!(!app.should_quit);
    }

    #[test]
    fn test_date_keys_only_apply_on_date_field() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        let start = app.form.as_ref().unwrap().draft().date;

        press(&mut app, KeyCode::Right);
        assert_eq!(app.form.as_ref().unwrap().draft().date, start);

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Right);
        assert_eq!(
            app.form.as_ref().unwrap().draft().date,
            start + chrono::Duration::days(1)
        );
    }
}
