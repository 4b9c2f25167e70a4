use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;
use tracing::debug;

use crate::db::JobStore;
use crate::listing::{run_query, FilterField, ListingPage, ListingQuery};
use crate::models::{Company, JobListing};

const DESCRIPTION_PLACEHOLDER: &str = "Detailed description for this role will appear here.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Browse,
    Search,
    Filter(FilterField),
}

struct BoardState {
    company_name: String,
    listings: Vec<JobListing>,
    query: ListingQuery,
    mode: InputMode,
    selected: usize,
    scroll_offset: u16,
}

impl BoardState {
    fn new(company_name: String, listings: Vec<JobListing>) -> Self {
        Self {
            company_name,
            listings,
            query: ListingQuery::default(),
            mode: InputMode::Browse,
            selected: 0,
            scroll_offset: 0,
        }
    }

    fn page(&self) -> ListingPage<'_> {
        run_query(&self.listings, &self.query)
    }

    /// Every query change goes through here so the selection follows the page.
    fn update(&mut self, reduce: impl FnOnce(ListingQuery) -> ListingQuery) {
        let query = std::mem::take(&mut self.query);
        self.query = reduce(query);
        self.selected = 0;
        self.scroll_offset = 0;
        debug!(query = ?self.query, "Board query changed");
    }

    fn edit_text(&mut self, edit: impl FnOnce(&mut String)) {
        match self.mode {
            InputMode::Browse => {}
            InputMode::Search => {
                let mut term = self.query.search_term.clone();
                edit(&mut term);
                self.update(|q| q.with_search(term));
            }
            InputMode::Filter(field) => {
                let mut pattern = self.query.filters.get(field).to_string();
                edit(&mut pattern);
                self.update(|q| q.with_filter(field, pattern));
            }
        }
    }

    fn clear_current(&mut self) {
        match self.mode {
            InputMode::Browse => {}
            InputMode::Search => self.update(|q| q.with_search("")),
            InputMode::Filter(field) => self.update(|q| q.clear_filter(field)),
        }
    }

    fn next(&mut self, page_len: usize) {
        if page_len > 0 && self.selected < page_len - 1 {
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
        }
    }
}

pub fn run_board(store: &dyn JobStore, company: &Company) -> Result<()> {
    let listings = store.list_listings(company.id)?;
    let mut state = BoardState::new(company.name.clone(), listings);

    enable_raw_mode()?;
    run_restoring(
        || {
            stdout().execute(EnterAlternateScreen)?;
            let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
            run_loop(&mut terminal, &mut state)
        },
        || {
            disable_raw_mode()?;
            stdout().execute(LeaveAlternateScreen)?;
            Ok(())
        },
    )
}

/// Runs `body`, then `restore` whether or not `body` failed. The body's error wins.
fn run_restoring<T>(
    body: impl FnOnce() -> Result<T>,
    restore: impl FnOnce() -> Result<()>,
) -> Result<T> {
    let result = body();
    let restored = restore();
    let value = result?;
    restored?;
    Ok(value)
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut BoardState,
) -> Result<()> {
    let mut list_state = ListState::default();

    loop {
        terminal.draw(|frame| draw(frame, state, &mut list_state))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if state.mode != InputMode::Browse {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => state.mode = InputMode::Browse,
                KeyCode::Delete => state.clear_current(),
                KeyCode::Backspace => state.edit_text(|s| {
                    s.pop();
                }),
                KeyCode::Char(c) => state.edit_text(|s| s.push(c)),
                _ => {}
            }
            continue;
        }

        let (effective_page, total_pages, page_len, filtered) = {
            let page = state.page();
            (
                page.effective_page,
                page.total_pages,
                page.items.len(),
                page.has_active_filters,
            )
        };

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Down | KeyCode::Char('j') => state.next(page_len),
            KeyCode::Up | KeyCode::Char('k') => state.prev(),
            KeyCode::Char('J') => state.scroll_offset = state.scroll_offset.saturating_add(3),
            KeyCode::Char('K') => state.scroll_offset = state.scroll_offset.saturating_sub(3),
            KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown => {
                if effective_page < total_pages {
                    state.update(|q| q.with_page(effective_page).next_page());
                }
            }
            KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp => {
                if effective_page > 1 {
                    state.update(|q| q.with_page(effective_page).prev_page());
                }
            }
            KeyCode::Char('s') => state.update(|q| {
                let size = q.page_size.cycle();
                q.with_page_size(size)
            }),
            KeyCode::Char('/') => state.mode = InputMode::Search,
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                state.mode = InputMode::Filter(FilterField::ALL[index]);
            }
            KeyCode::Char('x') if filtered => state.update(|q| q.clear_filters().with_search("")),
            _ => {}
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame, state: &BoardState, list_state: &mut ListState) {
    let page = state.page();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    frame.render_widget(build_query_bar(state), rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[1]);

    let items: Vec<ListItem> = page
        .items
        .iter()
        .map(|job| {
            let remote = if job.is_remote == Some(true) { "R" } else { " " };
            ListItem::new(format!(
                "{} {} | {}",
                remote,
                job.title.as_deref().unwrap_or("(untitled)"),
                job.location.as_deref().unwrap_or_default()
            ))
        })
        .collect();

    let selected = state.selected.min(page.items.len().saturating_sub(1));
    list_state.select(if page.items.is_empty() { None } else { Some(selected) });

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!(
            " Open Roles at {} ({}) ",
            state.company_name, page.total_matching
        )))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, columns[0], list_state);

    let detail = Paragraph::new(build_detail(page.items.get(selected).copied()))
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));
    frame.render_widget(detail, columns[1]);

    frame.render_widget(Paragraph::new(status_line(&page)), rows[2]);

    let help = match state.mode {
        InputMode::Browse => {
            " j/k:select  n/p:page  s:rows per page  /:search  1-4:filter  x:clear  q:quit"
        }
        _ => " type to filter  backspace:delete  del:clear field  enter/esc:done",
    };
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        rows[3],
    );
}

fn status_line(page: &ListingPage) -> String {
    match page.item_range() {
        Some((first, last)) => format!(
            " Showing {}–{} of {} roles · Page {} of {} · {} per page",
            first, last, page.total_matching, page.effective_page, page.total_pages, page.page_size
        ),
        None => " No roles match your search or filters.".to_string(),
    }
}

fn build_query_bar(state: &BoardState) -> Paragraph<'_> {
    let active = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let idle = Style::default();

    let mut spans = vec![
        Span::styled(
            format!("Search: [{}]", state.query.search_term),
            if state.mode == InputMode::Search { active } else { idle },
        ),
    ];
    for (i, field) in FilterField::ALL.iter().enumerate() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("{}:{} [{}]", i + 1, field.label(), state.query.filters.get(*field)),
            if state.mode == InputMode::Filter(*field) { active } else { idle },
        ));
    }

    Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL).title(
        if state.query.has_active_filters() {
            " Filters (x to clear all) "
        } else {
            " Filters "
        },
    ))
}

fn build_detail(job: Option<&JobListing>) -> Text<'_> {
    let Some(job) = job else {
        return Text::raw("No job selected");
    };

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(
        job.title.as_deref().unwrap_or("(untitled)"),
        Style::default().add_modifier(Modifier::BOLD),
    )));

    let mut summary = job.location.clone().unwrap_or_default();
    if let Some(kind) = job.employment_type.as_deref().filter(|s| !s.is_empty()) {
        summary.push_str(&format!(" · {}", kind));
    }
    if job.is_remote == Some(true) {
        summary.push_str(" · Remote");
    }
    lines.push(Line::from(summary));

    if let Some(salary) = job.salary_range.as_deref().filter(|s| !s.is_empty()) {
        lines.push(Line::from(format!("Salary: {}", salary)));
    }

    let badges: Vec<Span> = [&job.department, &job.employment_type, &job.experience_level]
        .iter()
        .filter_map(|v| v.as_deref().filter(|s| !s.is_empty()))
        .map(|badge| Span::styled(format!("[{}] ", badge), Style::default().fg(Color::Cyan)))
        .collect();
    if !badges.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(badges));
    }

    lines.push(Line::from(""));
    match job.description.as_deref().filter(|s| !s.is_empty()) {
        Some(description) => {
            for line in textwrap::fill(description, 70).lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
        None => lines.push(Line::from(Span::styled(
            DESCRIPTION_PLACEHOLDER,
            Style::default().fg(Color::DarkGray),
        ))),
    }

    Text::from(lines)
}
