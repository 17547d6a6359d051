//! Ratatui-based dashboard.
//!
//! A series picker on the left, the selected series on a shared date axis on
//! the right, start/end editors and a CSV export key. Each series is loaded
//! once over its full history and cached; the date range only filters what is
//! displayed and exported.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use plotters::style::RGBColor;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Terminal,
};

use crate::app::pipeline::{LoadedSeries, Pipeline, DEFAULT_RETRY_PAUSE};
use crate::config::DashConfig;
use crate::data::{Endpoints, FallbackStore, HttpFetcher, SeriesRegistry};
use crate::domain::{parse_date_bound, BoundKind, DateRange, SeriesStatus, SeriesTable};
use crate::error::AppError;
use crate::io::{export_table, ExportOutcome};

mod plotters_chart;

use plotters_chart::{ChartLine, SeriesPlottersChart};

const EXPORT_PRECISION: usize = 6;
const EMPTY_RANGE_MESSAGE: &str = "No observations within the selected range.";

const PALETTE: [(u8, u8, u8); 6] = [
    (0, 255, 255),
    (255, 255, 0),
    (0, 255, 0),
    (255, 0, 255),
    (255, 96, 96),
    (96, 160, 255),
];

/// Start the dashboard.
pub fn run(config: DashConfig) -> Result<(), AppError> {
    let registry = SeriesRegistry::new(config.source.measure);
    let fetcher = HttpFetcher::new(
        Endpoints::default(),
        config.source.fred_api_key.clone(),
        config.source.timeout,
    )?;
    let pipeline = Pipeline::new(registry, fetcher, FallbackStore::bundled())
        .with_retries(config.source.retries, DEFAULT_RETRY_PAUSE);

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(pipeline, config);
    terminal
        .draw(|f| app.draw(f))
        .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
    app.load_selected();
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Series,
    Start,
    End,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Series => Focus::Start,
            Focus::Start => Focus::End,
            Focus::End => Focus::Series,
        }
    }
}

struct App {
    pipeline: Pipeline<'static, HttpFetcher>,
    keys: Vec<String>,
    selected: Vec<String>,
    cursor: usize,
    cache: HashMap<String, LoadedSeries>,
    range: DateRange,
    start_input: String,
    end_input: String,
    focus: Focus,
    editing: bool,
    export_path: PathBuf,
    status: String,
}

impl App {
    fn new(pipeline: Pipeline<'static, HttpFetcher>, config: DashConfig) -> Self {
        let keys = pipeline.registry().keys();
        let cursor = config
            .series
            .first()
            .and_then(|k| keys.iter().position(|x| x == k))
            .unwrap_or(0);
        Self {
            pipeline,
            keys,
            selected: config.series,
            cursor,
            cache: HashMap::new(),
            start_input: config.range.start.map(|d| d.to_string()).unwrap_or_default(),
            end_input: config.range.end.map(|d| d.to_string()).unwrap_or_default(),
            range: config.range,
            focus: Focus::Series,
            editing: false,
            export_path: config.export_path,
            status: "Loading series...".to_string(),
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing {
            self.handle_date_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::Up if self.focus == Focus::Series => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Down if self.focus == Focus::Series => {
                if self.cursor + 1 < self.keys.len() {
                    self.cursor += 1;
                }
            }
            KeyCode::PageUp if self.focus == Focus::Series => {
                self.cursor = self.cursor.saturating_sub(10);
            }
            KeyCode::PageDown if self.focus == Focus::Series => {
                self.cursor = (self.cursor + 10).min(self.keys.len().saturating_sub(1));
            }
            KeyCode::Char(' ') | KeyCode::Enter if self.focus == Focus::Series => self.toggle_cursor(),
            KeyCode::Enter => {
                self.editing = true;
                self.status = "Editing date (YYYY, YYYY-MM or YYYY-MM-DD). Enter to apply, Esc to cancel."
                    .to_string();
            }
            KeyCode::Char('e') => self.export(),
            KeyCode::Char('r') => {
                self.cache.clear();
                self.load_selected();
            }
            _ => {}
        }
        false
    }

    fn handle_date_edit(&mut self, code: KeyCode) {
        let input = match self.focus {
            Focus::End => &mut self.end_input,
            _ => &mut self.start_input,
        };
        match code {
            KeyCode::Esc => {
                self.editing = false;
                self.reset_inputs();
                self.status = "Date edit canceled.".to_string();
            }
            KeyCode::Enter => {
                self.editing = false;
                self.apply_date_inputs();
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => input.push(c),
            _ => {}
        }
    }

    fn reset_inputs(&mut self) {
        self.start_input = self.range.start.map(|d| d.to_string()).unwrap_or_default();
        self.end_input = self.range.end.map(|d| d.to_string()).unwrap_or_default();
    }

    fn apply_date_inputs(&mut self) {
        match parse_inputs(&self.start_input, &self.end_input) {
            Ok(range) => {
                self.range = range;
                self.reset_inputs();
                self.status = format!("Range: {}", describe_range(&self.range));
            }
            Err(msg) => {
                self.reset_inputs();
                self.status = msg;
            }
        }
    }

    fn toggle_cursor(&mut self) {
        let Some(key) = self.keys.get(self.cursor).cloned() else {
            return;
        };
        if let Some(pos) = self.selected.iter().position(|k| *k == key) {
            self.selected.remove(pos);
            self.status = format!("Removed {key}");
        } else {
            self.selected.push(key.clone());
            self.load(&key);
        }
    }

    fn load_selected(&mut self) {
        for key in self.selected.clone() {
            self.load(&key);
        }
        let loaded = self.selected.iter().filter(|k| self.cache.contains_key(*k)).count();
        self.status = format!("Loaded {loaded} series.");
    }

    fn load(&mut self, key: &str) {
        if self.cache.contains_key(key) {
            return;
        }
        match self.pipeline.load(key, &DateRange::unbounded()) {
            Ok(loaded) => {
                self.status = format!("{key}: {} ({} obs)", loaded.status.label(), loaded.series.len());
                self.cache.insert(key.to_string(), loaded);
            }
            Err(err) => self.status = err.to_string(),
        }
    }

    fn export(&mut self) {
        let table = displayed_table(&self.selected, &self.cache, &self.range);
        if table.is_empty() {
            self.status = EMPTY_RANGE_MESSAGE.to_string();
            return;
        }
        self.status = match export_table(&table, &self.export_path, EXPORT_PRECISION, true) {
            Ok(ExportOutcome::Written { rows }) | Ok(ExportOutcome::AlreadyPresent { rows }) => {
                format!("Exported {rows} rows to {}", self.export_path.display())
            }
            Err(err) => format!("Export failed: {err}"),
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let banner = banner_lines(&self.selected, &self.cache);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(if banner.is_empty() { 0 } else { banner.len() as u16 + 2 }),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        if !banner.is_empty() {
            let p = Paragraph::new(Text::from(banner))
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().title("Warnings").borders(Borders::ALL));
            frame.render_widget(p, chunks[1]);
        }
        self.draw_body(frame, chunks[2]);
        self.draw_footer(frame, chunks[3]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("econ", Style::default().fg(Color::Cyan)),
            Span::raw(" | US & euro-area macro series"),
        ]));

        let field = |label: &str, value: &str, focus: Focus| -> Span<'static> {
            let text = format!("{label}: {}", if value.is_empty() { "(open)" } else { value });
            let mut style = Style::default().fg(Color::Gray);
            if self.focus == focus {
                style = style.fg(Color::Black).bg(Color::White);
                if self.editing {
                    style = style.add_modifier(Modifier::BOLD);
                }
            }
            Span::styled(text, style)
        };
        lines.push(Line::from(vec![
            field("start", &self.start_input, Focus::Start),
            Span::raw("  "),
            field("end", &self.end_input, Focus::End),
            Span::raw(format!(
                "  | measure: {} | export: {}",
                self.pipeline.registry().measure().code(),
                self.export_path.display()
            )),
        ]));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(32), Constraint::Min(0)])
            .split(area);

        self.draw_picker(frame, chunks[0]);
        self.draw_chart(frame, chunks[1]);
    }

    fn draw_picker(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .keys
            .iter()
            .map(|k| {
                let mark = match self.selected.iter().position(|s| s == k) {
                    Some(i) => Span::styled("[x] ", Style::default().fg(color_for(i))),
                    None => Span::raw("[ ] "),
                };
                ListItem::new(Line::from(vec![mark, Span::raw(k.clone())]))
            })
            .collect();

        let title = if self.focus == Focus::Series { "Series *" } else { "Series" };
        let list = List::new(items)
            .block(Block::default().title(title).borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.cursor));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let legend: Vec<Span> = self
            .selected
            .iter()
            .enumerate()
            .flat_map(|(i, k)| {
                [
                    Span::styled(format!("■ {k}"), Style::default().fg(color_for(i))),
                    Span::raw(" "),
                ]
            })
            .collect();
        let block = Block::default().title(Line::from(legend)).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let data = chart_data(&self.selected, &self.cache, &self.range);
        let Some((series, x_bounds, y_bounds)) = data else {
            let msg = if self.selected.is_empty() {
                "Select one or more series (Space)."
            } else {
                EMPTY_RANGE_MESSAGE
            };
            frame.render_widget(Paragraph::new(msg).style(Style::default().fg(Color::Yellow)), inner);
            return;
        };

        let lines: Vec<ChartLine> = series
            .iter()
            .map(|(i, points)| {
                let (r, g, b) = PALETTE[i % PALETTE.len()];
                ChartLine {
                    points,
                    color: RGBColor(r, g, b),
                }
            })
            .collect();

        let widget = SeriesPlottersChart {
            lines: &lines,
            x_bounds,
            y_bounds,
            y_label: "value",
            fmt_x: fmt_axis_date,
            fmt_y: fmt_axis_value,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "Tab focus  ↑/↓ move  Space select  Enter edit date  e export  r reload  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn color_for(i: usize) -> Color {
    let (r, g, b) = PALETTE[i % PALETTE.len()];
    Color::Rgb(r, g, b)
}

fn parse_inputs(start: &str, end: &str) -> Result<DateRange, String> {
    let bound = |raw: &str, kind| {
        let raw = raw.trim();
        if raw.is_empty() {
            Ok(None)
        } else {
            parse_date_bound(raw, kind).map(Some)
        }
    };
    DateRange::new(bound(start, BoundKind::Start)?, bound(end, BoundKind::End)?)
}

fn describe_range(range: &DateRange) -> String {
    let side = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "(open)".to_string());
    format!("{} .. {}", side(range.start), side(range.end))
}

/// Selected series outer-joined on dates inside `range` (what `e` exports).
fn displayed_table(selected: &[String], cache: &HashMap<String, LoadedSeries>, range: &DateRange) -> SeriesTable {
    SeriesTable::from_columns(
        selected
            .iter()
            .filter_map(|k| cache.get(k).map(|l| (k.clone(), l.series.filter(range)))),
    )
}

/// Banner lines for series shown from offline samples or not available at all.
fn banner_lines(selected: &[String], cache: &HashMap<String, LoadedSeries>) -> Vec<Line<'static>> {
    let with_status = |status: SeriesStatus| -> Vec<String> {
        selected
            .iter()
            .filter(|k| cache.get(*k).is_some_and(|l| l.status == status))
            .cloned()
            .collect()
    };

    let mut out = Vec::new();
    let fallback = with_status(SeriesStatus::Fallback);
    if !fallback.is_empty() {
        out.push(Line::from(format!(
            "Live fetch failed; showing offline sample data for: {}",
            fallback.join(", ")
        )));
    }
    let failed = with_status(SeriesStatus::Failed);
    if !failed.is_empty() {
        out.push(Line::from(format!("Unavailable (no live data, no sample): {}", failed.join(", "))));
    }
    out
}

type ChartData = (Vec<(usize, Vec<(f64, f64)>)>, [f64; 2], [f64; 2]);

/// Per-series points (x = days from CE, missing = NaN) plus padded bounds.
///
/// `None` when nothing inside `range` carries a value.
fn chart_data(selected: &[String], cache: &HashMap<String, LoadedSeries>, range: &DateRange) -> Option<ChartData> {
    let mut series = Vec::new();
    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);

    for (i, key) in selected.iter().enumerate() {
        let Some(loaded) = cache.get(key) else {
            continue;
        };
        let points: Vec<(f64, f64)> = loaded
            .series
            .filter(range)
            .points()
            .iter()
            .map(|o| (o.date.num_days_from_ce() as f64, o.value.unwrap_or(f64::NAN)))
            .collect();
        for &(x, y) in points.iter().filter(|(_, y)| y.is_finite()) {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
        series.push((i, points));
    }

    if !x_min.is_finite() || !y_min.is_finite() {
        return None;
    }
    if x_max <= x_min {
        x_min -= 15.0;
        x_max += 15.0;
    }
    if y_max <= y_min {
        y_min -= 1.0;
        y_max += 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
    Some((series, [x_min, x_max], [y_min - pad, y_max + pad]))
}

fn fmt_axis_date(v: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(v.round() as i32)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default()
}

fn fmt_axis_value(v: f64) -> String {
    format!("{v:.2}")
}
