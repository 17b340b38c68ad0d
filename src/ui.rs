use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ej_dashboard::chart::{Annotation, StackedBar};
use ej_dashboard::config::pause_stderr_logs;
use ej_dashboard::dashboard::{self, ChartPanel, DashboardView, Selection, SelectionError};
use ej_dashboard::{Dataset, RiskBucket};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs},
    Frame, Terminal,
};
use std::io;

/// Rows of the stacked bar itself
const BAR_HEIGHT: usize = 3;

pub struct App {
    pub dataset: Dataset,
    pub selection: Selection,
    pub view: DashboardView,
    pub county_state: ListState,
}

impl App {
    pub fn new(dataset: Dataset) -> Result<Self, SelectionError> {
        let selection = Selection::default_for(&dataset)?;
        let view = dashboard::render(&dataset, &selection)?;

        let mut county_state = ListState::default();
        county_state.select(Some(0));

        Ok(Self {
            dataset,
            selection,
            view,
            county_state,
        })
    }

    fn county_count(&self) -> usize {
        self.dataset.counties().len()
    }

    fn select(&mut self, selection: Selection) {
        // selections only come from the county list and RiskBucket::ALL
        match dashboard::render(&self.dataset, &selection) {
            Ok(view) => {
                self.selection = selection;
                self.view = view;
            }
            Err(err) => tracing::error!(error = %err, "failed to render selection"),
        }
    }

    pub fn select_county_index(&mut self, index: usize) {
        let Some(info) = self.dataset.counties().get(index) else {
            return;
        };
        let selection = self.selection.with_county(info.county.clone());
        self.county_state.select(Some(index));
        self.select(selection);
    }

    pub fn select_bucket(&mut self, bucket: RiskBucket) {
        let selection = self.selection.with_bucket(bucket);
        self.select(selection);
    }

    pub fn next_county(&mut self) {
        let len = self.county_count();
        if len == 0 {
            return;
        }
        let i = match self.county_state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.select_county_index(i);
    }

    pub fn previous_county(&mut self) {
        let len = self.county_count();
        if len == 0 {
            return;
        }
        let i = match self.county_state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.select_county_index(i);
    }

    pub fn page_down(&mut self) {
        let len = self.county_count();
        if len == 0 {
            return;
        }
        let i = match self.county_state.selected() {
            Some(i) => (i + 10).min(len - 1),
            None => 0,
        };
        self.select_county_index(i);
    }

    pub fn page_up(&mut self) {
        let i = match self.county_state.selected() {
            Some(i) => i.saturating_sub(10),
            None => 0,
        };
        self.select_county_index(i);
    }

    pub fn next_bucket(&mut self) {
        self.select_bucket(self.selection.bucket.next());
    }

    pub fn previous_bucket(&mut self) {
        self.select_bucket(self.selection.bucket.previous());
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // stderr would draw over the alternate screen
    let _log_pause = pause_stderr_logs();

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
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next_county(),
                KeyCode::Up | KeyCode::Char('k') => app.previous_county(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.select_county_index(0),
                KeyCode::End => {
                    let len = app.county_count();
                    if len > 0 {
                        app.select_county_index(len - 1);
                    }
                }
                KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => app.next_bucket(),
                KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => app.previous_bucket(),
                KeyCode::Char(c @ '1'..='4') => {
                    let index = c as usize - '1' as usize;
                    app.select_bucket(RiskBucket::ALL[index]);
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Title + legend
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], &app.view);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(30), // County list
            Constraint::Min(0),     // Bucket tabs + charts
        ])
        .split(chunks[1]);

    render_county_list(f, content_chunks[0], app);

    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(content_chunks[1]);

    render_bucket_tabs(f, right_chunks[0], app.selection.bucket);

    let chart_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(right_chunks[1]);

    render_panel(f, chart_chunks[0], &app.view.bucket_panel, "No tracts in this risk bucket");
    render_panel(f, chart_chunks[1], &app.view.overall_panel, "No population data");

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, view: &DashboardView) {
    let mut legend_spans = vec![];
    for entry in &view.legend {
        let (r, g, b) = entry.demographic.rgb();
        legend_spans.push(Span::styled("  ", Style::default().bg(Color::Rgb(r, g, b))));
        legend_spans.push(Span::raw(format!(" {}   ", entry.label)));
    }

    let header_text = vec![
        Line::from(Span::styled(
            view.title.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(legend_spans),
    ];

    let header = Paragraph::new(header_text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_county_list(f: &mut Frame, area: Rect, app: &mut App) {
    let items: Vec<ListItem> = app
        .dataset
        .counties()
        .iter()
        .map(|c| ListItem::new(truncate(&format!("{}, {}", c.county, c.state_abbr), 24)))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" County "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ");

    f.render_stateful_widget(list, area, &mut app.county_state);
}

fn render_bucket_tabs(f: &mut Frame, area: Rect, selected: RiskBucket) {
    let titles: Vec<Line> = RiskBucket::ALL
        .iter()
        .enumerate()
        .map(|(i, bucket)| Line::from(format!("{} {}", i + 1, bucket.name())))
        .collect();
    let index = RiskBucket::ALL.iter().position(|b| *b == selected).unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(index)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" EJI Category "),
        )
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )
        .divider(" │ ");

    f.render_widget(tabs, area);
}

fn render_panel(f: &mut Frame, area: Rect, panel: &ChartPanel, blank_message: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(format!(" {} ", panel.heading));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let width = inner.width as usize;
    let mut lines: Vec<Line> = Vec::new();

    if panel.chart.is_blank() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            blank_message.to_string(),
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        lines.push(Line::from(""));
        lines.extend(bar_lines(&panel.chart, width));
        lines.push(Line::from(annotation_line(&panel.chart.annotations, width)));
        lines.push(Line::from(""));

        for segment in &panel.chart.segments {
            let (r, g, b) = segment.demographic.rgb();
            lines.push(Line::from(vec![
                Span::styled("■ ", Style::default().fg(Color::Rgb(r, g, b))),
                Span::raw(segment.hover_text.clone()),
            ]));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Tracts: {}", panel.rows),
        Style::default().fg(Color::Cyan),
    )));

    f.render_widget(Paragraph::new(lines), inner);
}

fn bar_lines(chart: &StackedBar, width: usize) -> Vec<Line<'static>> {
    let percentages: Vec<f64> = chart.segments.iter().map(|s| s.percentage).collect();
    let widths = segment_widths(&percentages, width);

    let spans: Vec<Span> = chart
        .segments
        .iter()
        .zip(widths)
        .filter(|(_, w)| *w > 0)
        .map(|(segment, w)| {
            let (r, g, b) = segment.demographic.rgb();
            Span::styled(" ".repeat(w), Style::default().bg(Color::Rgb(r, g, b)))
        })
        .collect();

    vec![Line::from(spans); BAR_HEIGHT]
}

/// Split `width` cells between segments proportionally (largest remainder),
/// so the bar always fills the full width when there is any population.
pub fn segment_widths(percentages: &[f64], width: usize) -> Vec<usize> {
    let total: f64 = percentages.iter().sum();
    if total <= 0.0 || width == 0 {
        return vec![0; percentages.len()];
    }

    let exact: Vec<f64> = percentages.iter().map(|p| p / total * width as f64).collect();
    let mut widths: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();

    let mut by_remainder: Vec<usize> = (0..exact.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra)
    });

    let assigned: usize = widths.iter().sum();
    for &i in by_remainder.iter().take(width.saturating_sub(assigned)) {
        widths[i] += 1;
    }

    widths
}

/// Place annotation texts centered on their x position (0..100 mapped onto
/// `width`). Labels that would overlap an earlier one are dropped.
pub fn annotation_line(annotations: &[Annotation], width: usize) -> String {
    let mut cells = vec![' '; width];
    let mut taken = vec![false; width];

    for annotation in annotations {
        let text: Vec<char> = annotation.text.chars().collect();
        if text.len() > width {
            continue;
        }

        let center = (annotation.x / 100.0 * width as f64).round() as isize;
        let start = (center - text.len() as isize / 2).clamp(0, (width - text.len()) as isize) as usize;
        let end = start + text.len();

        if taken[start..end].iter().any(|t| *t) {
            continue;
        }
        for (offset, c) in text.into_iter().enumerate() {
            cells[start + offset] = c;
            taken[start + offset] = true;
        }
    }

    cells.into_iter().collect()
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.county_state.selected().map(|i| i + 1).unwrap_or(0);

    let status_spans = vec![
        Span::styled(
            format!(" County: {}/{} ", selected, app.county_count()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" | "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" County | "),
        Span::styled("←/→ 1-4", Style::default().fg(Color::Yellow)),
        Span::raw(" EJI Category | "),
        Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)),
        Span::raw(" Fast | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

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
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ej_dashboard::load_csv_from_reader;
    use ej_dashboard::Demographic;

    const SAMPLE: &str = "\
COUNTY,StateAbbr,RPL_EJI,white,black,asian,latino,other
Alpha,NC,0.1,50,50,0,0,0
Alpha,NC,0.9,0,0,100,0,0
Beta,SC,0.6,10,10,10,10,10
Gamma,NC,0.3,1,0,0,0,0
";

    fn app() -> App {
        App::new(load_csv_from_reader(SAMPLE.as_bytes()).unwrap()).unwrap()
    }

    fn annotation(x: f64, text: &str) -> Annotation {
        Annotation { demographic: Demographic::White, x, text: text.to_string() }
    }

    #[test]
    fn test_app_starts_on_first_county_low_bucket() {
        let app = app();

        assert_eq!(app.selection, Selection::new("Alpha", RiskBucket::Low));
        assert_eq!(app.view.title, "Alpha, NC");
        assert_eq!(app.county_state.selected(), Some(0));
    }

    #[test]
    fn test_county_navigation_wraps() {
        let mut app = app();

        app.previous_county();
        assert_eq!(app.selection.county, "Gamma");

        app.next_county();
        app.next_county();
        assert_eq!(app.selection.county, "Beta");
        assert_eq!(app.view.title, "Beta, SC");
    }

    #[test]
    fn test_bucket_change_recomputes_view() {
        let mut app = app();

        app.select_bucket(RiskBucket::High);

        assert_eq!(app.view.bucket_panel.heading, "Alpha High EJ Risk");
        assert_eq!(app.view.bucket_panel.composition.get(Demographic::Asian), 100.0);

        app.next_bucket();
        assert_eq!(app.selection.bucket, RiskBucket::Low);
    }

    #[test]
    fn test_paging_clamps() {
        let mut app = app();

        app.page_down();
        assert_eq!(app.selection.county, "Gamma");

        app.page_up();
        assert_eq!(app.selection.county, "Alpha");
    }

    #[test]
    fn test_empty_dataset_has_no_app() {
        assert!(App::new(Dataset::new(vec![])).is_err());
    }

    #[test]
    fn test_segment_widths_fill_bar() {
        let widths = segment_widths(&[33.3, 33.3, 33.4, 0.0, 0.0], 10);

        assert_eq!(widths.iter().sum::<usize>(), 10);
        assert_eq!(widths[3], 0);
        assert_eq!(widths[4], 0);
    }

    #[test]
    fn test_segment_widths_of_blank_chart() {
        assert_eq!(segment_widths(&[0.0; 5], 40), vec![0; 5]);
    }

    #[test]
    fn test_annotation_is_centered() {
        let line = annotation_line(&[annotation(50.0, "ab")], 10);

        assert_eq!(line, "    ab    ");
    }

    #[test]
    fn test_annotation_is_clamped_to_edges() {
        let line = annotation_line(&[annotation(100.0, "abcd")], 10);

        assert_eq!(line, "      abcd");
    }

    #[test]
    fn test_overlapping_annotation_is_dropped() {
        let line = annotation_line(&[annotation(50.0, "first"), annotation(55.0, "second")], 20);

        assert!(line.contains("first"));
        assert!(!line.contains("second"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Mecklenburg, NC", 24), "Mecklenburg, NC");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
    }
}
