use anyhow::Result;
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
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use student_registry::config::ChoiceConfig;
use student_registry::{Registration, RegistrationForm, Registry};
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Register,
    Find,
    Records,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Register => Page::Find,
            Page::Find => Page::Records,
            Page::Records => Page::Register,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Register => Page::Records,
            Page::Find => Page::Register,
            Page::Records => Page::Find,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Register => "Register",
            Page::Find => "Find Student",
            Page::Records => "Records",
        }
    }
}

/// Inputs on the registration page, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    FatherName,
    MotherName,
    Dob,
    Mobile,
    Aadhaar,
    Address,
    City,
    State,
    Pin,
    Course,
    Photo,
}

impl FormField {
    pub const ALL: [FormField; 12] = [
        FormField::Name,
        FormField::FatherName,
        FormField::MotherName,
        FormField::Dob,
        FormField::Mobile,
        FormField::Aadhaar,
        FormField::Address,
        FormField::City,
        FormField::State,
        FormField::Pin,
        FormField::Course,
        FormField::Photo,
    ];

    pub fn label(&self) -> &str {
        match self {
            FormField::Name => "Full Name",
            FormField::FatherName => "Father's Name",
            FormField::MotherName => "Mother's Name",
            FormField::Dob => "DOB (DD-MM-YYYY)",
            FormField::Mobile => "Mobile",
            FormField::Aadhaar => "Aadhaar",
            FormField::Address => "Address",
            FormField::City => "City",
            FormField::State => "State",
            FormField::Pin => "PIN Code",
            FormField::Course => "Course",
            FormField::Photo => "Photo (file path)",
        }
    }

    pub fn value<'a>(&self, form: &'a RegistrationForm) -> &'a str {
        match self {
            FormField::Name => &form.name,
            FormField::FatherName => &form.father_name,
            FormField::MotherName => &form.mother_name,
            FormField::Dob => &form.dob,
            FormField::Mobile => &form.mobile,
            FormField::Aadhaar => &form.aadhaar,
            FormField::Address => &form.address,
            FormField::City => &form.city,
            FormField::State => &form.state,
            FormField::Pin => &form.pin,
            FormField::Course => &form.course,
            FormField::Photo => &form.photo,
        }
    }

    fn value_mut<'a>(&self, form: &'a mut RegistrationForm) -> &'a mut String {
        match self {
            FormField::Name => &mut form.name,
            FormField::FatherName => &mut form.father_name,
            FormField::MotherName => &mut form.mother_name,
            FormField::Dob => &mut form.dob,
            FormField::Mobile => &mut form.mobile,
            FormField::Aadhaar => &mut form.aadhaar,
            FormField::Address => &mut form.address,
            FormField::City => &mut form.city,
            FormField::State => &mut form.state,
            FormField::Pin => &mut form.pin,
            FormField::Course => &mut form.course,
            FormField::Photo => &mut form.photo,
        }
    }

    /// Suggestions for combo inputs; `None` for plain text inputs
    pub fn choices<'a>(&self, choices: &'a ChoiceConfig) -> Option<&'a [String]> {
        match self {
            FormField::City => Some(&choices.cities),
            FormField::State => Some(&choices.states),
            FormField::Course => Some(&choices.courses),
            _ => None,
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, FormField::Name | FormField::Mobile | FormField::Aadhaar)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

pub struct App {
    registry: Registry,
    choices: ChoiceConfig,
    pub current_page: Page,
    pub form: RegistrationForm,
    pub focus: usize,
    pub search: String,
    pub found: Option<Registration>,
    pub records: Vec<Registration>,
    pub records_state: TableState,
    pub next_id: String,
    pub status: Option<StatusMessage>,
    pub should_quit: bool,
}

impl App {
    pub fn new(registry: Registry, choices: ChoiceConfig) -> Self {
        let mut app = Self {
            registry,
            choices,
            current_page: Page::Register,
            form: RegistrationForm::default(),
            focus: 0,
            search: String::new(),
            found: None,
            records: Vec::new(),
            records_state: TableState::default(),
            next_id: String::new(),
            status: None,
            should_quit: false,
        };
        app.refresh_records();
        app
    }

    pub fn focused_field(&self) -> FormField {
        FormField::ALL[self.focus]
    }

    fn form_value_width(&self) -> u16 {
        self.focused_field().value(&self.form).chars().count() as u16
    }

    fn info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            kind: StatusKind::Info,
            text: text.into(),
        });
    }

    fn error(&mut self, text: impl Into<String>) {
        let text = text.into();
        error!(message = %text, "operation failed");
        self.status = Some(StatusMessage {
            kind: StatusKind::Error,
            text,
        });
    }

    pub fn refresh_records(&mut self) {
        match self.registry.records() {
            Ok(records) => {
                self.records = records;
                if self.records.is_empty() {
                    self.records_state.select(None);
                } else if self.records_state.selected().is_none() {
                    self.records_state.select(Some(0));
                }
            }
            Err(e) => self.error(format!("Could not read records: {e}")),
        }

        self.next_id = match self.registry.next_identifier() {
            Ok(id) => id,
            Err(e) => {
                self.error(e.to_string());
                "?".to_string()
            }
        };
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::BackTab => {
                self.previous_page();
                return;
            }
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.previous_page();
                } else {
                    self.next_page();
                }
                return;
            }
            _ => {}
        }

        match self.current_page {
            Page::Register => self.handle_register_key(key.code, ctrl),
            Page::Find => self.handle_find_key(key.code, ctrl),
            Page::Records => self.handle_records_key(key.code),
        }
    }

    fn handle_register_key(&mut self, code: KeyCode, ctrl: bool) {
        match code {
            KeyCode::Char('s') if ctrl => self.submit(),
            KeyCode::Char(_) if ctrl => {}
            KeyCode::Char(c) => {
                let field = self.focused_field();
                field.value_mut(&mut self.form).push(c);
            }
            KeyCode::Backspace => {
                let field = self.focused_field();
                field.value_mut(&mut self.form).pop();
            }
            KeyCode::Down => self.focus = (self.focus + 1) % FormField::ALL.len(),
            KeyCode::Up => {
                self.focus = (self.focus + FormField::ALL.len() - 1) % FormField::ALL.len();
            }
            KeyCode::Right => self.cycle_choice(true),
            KeyCode::Left => self.cycle_choice(false),
            KeyCode::Enter => {
                if self.focus + 1 == FormField::ALL.len() {
                    self.submit();
                } else {
                    self.focus += 1;
                }
            }
            _ => {}
        }
    }

    fn handle_find_key(&mut self, code: KeyCode, ctrl: bool) {
        match code {
            KeyCode::Char('p') if ctrl => self.generate_pdf(),
            KeyCode::Char(_) if ctrl => {}
            KeyCode::Char(c) => {
                self.search.push(c);
            }
            KeyCode::Backspace => {
                self.search.pop();
            }
            KeyCode::Enter => self.find(),
            _ => {}
        }
    }

    fn handle_records_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::PageDown => self.page_down(),
            KeyCode::PageUp => self.page_up(),
            KeyCode::Home => {
                if !self.records.is_empty() {
                    self.records_state.select(Some(0));
                }
            }
            KeyCode::End => {
                if !self.records.is_empty() {
                    self.records_state.select(Some(self.records.len() - 1));
                }
            }
            KeyCode::Char('r') => self.refresh_records(),
            KeyCode::Enter => self.open_selected(),
            _ => {}
        }
    }

    /// Step a combo input through its suggestions
    fn cycle_choice(&mut self, forward: bool) {
        let field = self.focused_field();
        let Some(choices) = field.choices(&self.choices) else {
            return;
        };
        if choices.is_empty() {
            return;
        }

        let len = choices.len();
        let current = choices
            .iter()
            .position(|choice| choice.as_str() == field.value(&self.form));
        let index = match (current, forward) {
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
            (None, true) => 0,
            (None, false) => len - 1,
        };

        let value = choices[index].clone();
        *field.value_mut(&mut self.form) = value;
    }

    pub fn submit(&mut self) {
        let result = self.registry.submit(&self.form);
        match result {
            Ok(submission) => {
                self.info(format!(
                    "Registered {} ({}). PDF generated: {}",
                    submission.record.id,
                    submission.record.name,
                    submission.document.display()
                ));
                self.form = RegistrationForm::default();
                self.focus = 0;
            }
            Err(e) => self.error(e.to_string()),
        }
        self.refresh_records();
    }

    pub fn find(&mut self) {
        match self.registry.lookup(&self.search) {
            Ok(record) => {
                self.info(format!("Found {}", record.id));
                self.found = Some(record);
            }
            Err(e) => {
                self.found = None;
                self.error(e.to_string());
            }
        }
    }

    pub fn generate_pdf(&mut self) {
        let Some(record) = self.found.clone() else {
            self.error("Find a student first");
            return;
        };

        match self.registry.render_document(&record) {
            Ok(path) => self.info(format!("PDF generated: {}", path.display())),
            Err(e) => self.error(e.to_string()),
        }
    }

    pub fn selected_record(&self) -> Option<&Registration> {
        self.records_state
            .selected()
            .and_then(|i| self.records.get(i))
    }

    /// Show the highlighted record on the Find page
    fn open_selected(&mut self) {
        if let Some(record) = self.selected_record().cloned() {
            self.search = record.id.clone();
            self.found = Some(record);
            self.current_page = Page::Find;
        }
    }

    pub fn next(&mut self) {
        let len = self.records.len();
        if len == 0 {
            return;
        }
        let i = match self.records_state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.records_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.records.len();
        if len == 0 {
            return;
        }
        let i = match self.records_state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.records_state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.records.len();
        if len == 0 {
            return;
        }
        let i = match self.records_state.selected() {
            Some(i) => (i + 20).min(len - 1),
            None => 0,
        };
        self.records_state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.records.is_empty() {
            return;
        }
        let i = self.records_state.selected().map_or(0, |i| i.saturating_sub(20));
        self.records_state.select(Some(i));
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

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            app.handle_key(key);
            if app.should_quit {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Register => render_form(f, chunks[1], app),
        Page::Find => render_find(f, chunks[1], app),
        Page::Records => render_records(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Register, Page::Find, Page::Records];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
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

        tab_spans.push(Span::styled(page.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Students: {}", app.records.len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Next: {}", app.next_id),
        Style::default().fg(Color::Green),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Student Registration "),
    );

    f.render_widget(header, area);
}

const LABEL_WIDTH: usize = 20;

fn render_form(f: &mut Frame, area: Rect, app: &App) {
    let label_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let mut lines = vec![Line::from("")];
    for (i, field) in FormField::ALL.iter().enumerate() {
        let focused = i == app.focus;
        let marker = if focused {
            Span::styled("→ ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        } else {
            Span::raw("  ")
        };

        let label = if field.is_required() {
            format!("{}*", field.label())
        } else {
            field.label().to_string()
        };

        let value_style = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        };

        let mut spans = vec![
            marker,
            Span::styled(format!("{label:<LABEL_WIDTH$}"), label_style),
            Span::styled(field.value(&app.form).to_string(), value_style),
        ];
        if focused && field.choices(&app.choices).is_some() {
            spans.push(Span::styled(
                "   ◂ ▸ choices",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("  Hint: ", Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC)),
        Span::styled(
            "Enter next field, Ctrl-S submit, * required",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ),
    ]));

    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" New Registration ({}) ", app.next_id)),
    );
    f.render_widget(form, area);

    // Cursor at the end of the focused input
    let value_len = app.form_value_width();
    let x = area.x + 1 + 2 + LABEL_WIDTH as u16 + value_len;
    let y = area.y + 2 + app.focus as u16;
    if x < area.right() && y < area.bottom() {
        f.set_cursor(x, y);
    }
}

fn render_find(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let search = Paragraph::new(Line::from(vec![
        Span::styled(" Reg No / Mobile: ", Style::default().fg(Color::Cyan)),
        Span::styled(app.search.clone(), Style::default().fg(Color::Yellow)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Find Student "),
    );
    f.render_widget(search, chunks[0]);

    let cursor_x = chunks[0].x + 1 + 18 + app.search.chars().count() as u16;
    if cursor_x < chunks[0].right() {
        f.set_cursor(cursor_x, chunks[0].y + 1);
    }

    render_detail_panel(f, chunks[1], app);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let record = match &app.found {
        Some(r) => r,
        None => {
            let no_selection = Paragraph::new("  Type a registration number or mobile and press Enter")
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Yellow))
                        .title(" Student Details "),
                );
            f.render_widget(no_selection, area);
            return;
        }
    };

    let label_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let mut content = vec![Line::from("")];

    for (label, value) in record.display_fields() {
        let mut value_lines = value.lines();
        let first = value_lines.next().unwrap_or("");
        content.push(Line::from(vec![
            Span::styled(format!("  {:<16}", format!("{label}:")), label_style),
            Span::raw(truncate(first, 60)),
        ]));
        for more in value_lines {
            content.push(Line::from(vec![
                Span::raw(" ".repeat(18)),
                Span::raw(truncate(more, 60)),
            ]));
        }
    }

    content.push(Line::from(""));
    content.push(Line::from("  ─────────────────────────────────────"));
    content.push(Line::from(""));

    match record.photo_path() {
        Some(path) if path.is_file() => content.push(Line::from(vec![
            Span::styled("  Photo:          ", label_style),
            Span::styled(path.display().to_string(), Style::default().fg(Color::Green)),
        ])),
        _ => content.push(Line::from(Span::styled(
            "  No Photo Available",
            Style::default().fg(Color::Red),
        ))),
    }

    content.push(Line::from(""));
    content.push(Line::from(vec![
        Span::styled(
            "  Press ",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ),
        Span::styled(
            "Ctrl-P",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        ),
        Span::styled(
            " to generate the PDF",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ),
    ]));

    let detail_panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(format!(" Student Details - {} ", record.id)),
    );

    f.render_widget(detail_panel, area);
}

fn render_records(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Reg No", "Name", "Mobile", "Course", "City"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.records.iter().map(|record| {
        let cells = vec![
            Cell::from(record.id.clone()).style(Style::default().fg(Color::Green)),
            Cell::from(truncate(&record.name, 28)),
            Cell::from(record.mobile.clone()),
            Cell::from(truncate(&record.course, 22)),
            Cell::from(truncate(&record.city, 16)),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(30),
            Constraint::Length(14),
            Constraint::Length(24),
            Constraint::Length(18),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Registrations "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.records_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![];

    if let Some(status) = &app.status {
        let color = match status.kind {
            StatusKind::Info => Color::Green,
            StatusKind::Error => Color::Red,
        };
        status_spans.push(Span::styled(
            format!(" {} ", status.text),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
        status_spans.push(Span::raw(" | "));
    }

    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Select | "));
    status_spans.push(Span::styled("Esc", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
