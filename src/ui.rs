use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use chrono::{Local, NaiveDate};
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use crossterm::{ExecutableCommand, execute};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use tracing::{info, warn};

use crate::calendar::{MAX_YEAR, MIN_YEAR, WEEKDAY_NAMES, parse_date, shift_month, weekday_name};
use crate::config::{Settings, absolutize};
use crate::csv_codec::{CsvError, PendingRead, import_csv, write_export};
use crate::slots::{DATE_FORMAT, Period, SlotStore, format_duration};
use crate::storage::save_store;
use crate::view::{
	DailyView, MonthlyView, Panel, SLOTS_PER_ROW, Screen, SummaryStats, ViewMode, ViewState, WeeklyView, render,
};

const ACTIVE_TAB_COLOR: Color = Color::Blue;
const FOCUSED_CELL_COLOR: Color = Color::Yellow;
const CHECKED_CELL_COLOR: Color = Color::Rgb(59, 130, 246);
const BAR_COLOR: Color = Color::Rgb(59, 130, 246);
const BAR_ROWS: u16 = 8;
const WEEK_COLUMN_WIDTH: usize = 12;
const MONTH_CELL_WIDTH: usize = 8;
const INTENSITY_COLORS: [Color; 5] = [
	Color::Rgb(229, 231, 235),
	Color::Rgb(191, 219, 254),
	Color::Rgb(96, 165, 250),
	Color::Rgb(37, 99, 235),
	Color::Rgb(30, 64, 175),
];

pub fn run_dashboard(store: &mut SlotStore, settings: &Settings) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, store, settings);

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	store: &mut SlotStore,
	settings: &Settings,
) -> Result<(), Box<dyn Error>> {
	let mut app = App::new(Local::now().date_naive());

	loop {
		let today = Local::now().date_naive();
		if let Some(result) = app.pending_import.as_ref().and_then(|pending| pending.poll()) {
			if let Some(pending) = app.pending_import.take() {
				finish_import(&mut app, store, &settings.store_path, pending.path(), result);
			}
		}

		let screen = render(&app.view, store, today);
		terminal.draw(|frame| draw_dashboard(frame, &app, &screen))?;

		if event::poll(StdDuration::from_millis(250))? {
			if let CEvent::Key(key) = event::read()? {
				if key.kind != KeyEventKind::Press {
					continue;
				}

				let should_quit = match &app.mode {
					InputMode::Prompt(_) => handle_prompt_key(&mut app, key.code),
					InputMode::Notice(_) => handle_notice_key(&mut app, key.code),
					InputMode::Normal => handle_normal_key(&mut app, key.code, store, settings, today),
				};

				if should_quit {
					break;
				}
			}
		}
	}

	Ok(())
}

fn draw_dashboard(frame: &mut Frame, app: &App, screen: &Screen) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Length(3),
			Constraint::Min(14),
			Constraint::Length(3),
			Constraint::Length(4),
		])
		.split(frame.area());

	render_header(frame, layout[0], screen);
	match &screen.panel {
		Panel::Daily(daily) => render_daily_panel(frame, layout[1], daily),
		Panel::Weekly(weekly) => render_weekly_panel(frame, layout[1], weekly),
		Panel::Monthly(monthly) => render_monthly_panel(frame, layout[1], monthly),
	}
	render_summary(frame, layout[2], &screen.summary);
	render_footer(frame, layout[3], app);

	if let InputMode::Notice(notice) = &app.mode {
		render_notice_popup(frame, notice);
	}
}

fn render_header(frame: &mut Frame, area: Rect, screen: &Screen) {
	let mut spans = Vec::new();
	for (index, mode) in ViewMode::ALL.iter().enumerate() {
		let style = if *mode == screen.mode {
			Style::default()
				.fg(Color::White)
				.bg(ACTIVE_TAB_COLOR)
				.add_modifier(Modifier::BOLD)
		} else {
			Style::default().fg(Color::Gray)
		};
		spans.push(Span::styled(format!(" {} {} ", index + 1, mode.label()), style));
		spans.push(Span::raw(" "));
	}
	spans.push(Span::raw(format!(
		"  date {} ({})",
		screen.selected_date.format(DATE_FORMAT),
		weekday_name(screen.selected_date)
	)));

	let header = Paragraph::new(Line::from(spans))
		.block(Block::default().borders(Borders::ALL).title("Writing Time"));
	frame.render_widget(header, area);
}

fn render_daily_panel(frame: &mut Frame, area: Rect, daily: &DailyView) {
	let mut lines = Vec::new();
	let mut legend = Vec::new();
	for period in Period::ALL {
		legend.push(Span::styled("■ ", period_style(period)));
		legend.push(Span::styled(
			format!(
				"{} ({:02}-{:02})   ",
				period.name(),
				period.start_hour(),
				period.start_hour() + 6
			),
			period_style(period),
		));
	}
	lines.push(Line::from(legend));
	lines.push(Line::from(""));

	for row in &daily.rows {
		let labels = row
			.cells
			.iter()
			.map(|cell| Span::styled(format!("{:<6}", cell.slot.label()), period_style(row.period)))
			.collect::<Vec<_>>();
		let boxes = row
			.cells
			.iter()
			.map(|cell| {
				let mark = if cell.checked { "[x]" } else { "[ ]" };
				let mut style = if cell.checked {
					Style::default().fg(Color::White).bg(CHECKED_CELL_COLOR)
				} else {
					Style::default().fg(Color::DarkGray)
				};
				if cell.focused {
					style = style
						.fg(Color::Black)
						.bg(FOCUSED_CELL_COLOR)
						.add_modifier(Modifier::BOLD);
				}
				Span::styled(format!("{mark:<6}"), style)
			})
			.collect::<Vec<_>>();
		lines.push(Line::from(labels));
		lines.push(Line::from(boxes));
		lines.push(Line::from(""));
	}

	let title = format!(
		"{} ({}) | total {}",
		daily.date.format(DATE_FORMAT),
		daily.weekday,
		format_duration(daily.total_hours)
	);
	let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
	frame.render_widget(panel, area);
}

fn render_weekly_panel(frame: &mut Frame, area: Rect, weekly: &WeeklyView) {
	let mut lines = Vec::new();
	let heights = weekly
		.bars
		.iter()
		.map(|bar| bar_rows(bar.fill))
		.collect::<Vec<_>>();

	for level in (1..=BAR_ROWS).rev() {
		let spans = heights
			.iter()
			.map(|height| {
				if *height >= level {
					Span::styled(centered("███", WEEK_COLUMN_WIDTH), Style::default().fg(BAR_COLOR))
				} else {
					Span::raw(" ".repeat(WEEK_COLUMN_WIDTH))
				}
			})
			.collect::<Vec<_>>();
		lines.push(Line::from(spans));
	}

	let day_labels = weekly
		.bars
		.iter()
		.map(|bar| {
			let style = if bar.selected {
				Style::default().fg(FOCUSED_CELL_COLOR).add_modifier(Modifier::BOLD)
			} else {
				Style::default()
			};
			Span::styled(
				centered(&format!("{} {}", bar.date.format("%d"), bar.weekday), WEEK_COLUMN_WIDTH),
				style,
			)
		})
		.collect::<Vec<_>>();
	let hour_labels = weekly
		.bars
		.iter()
		.map(|bar| Span::raw(centered(&format!("{}h", bar.hours), WEEK_COLUMN_WIDTH)))
		.collect::<Vec<_>>();
	lines.push(Line::from(day_labels));
	lines.push(Line::from(hour_labels));

	let title = match (weekly.bars.first(), weekly.bars.last()) {
		(Some(first), Some(last)) => format!(
			"Weekly pattern {} - {}",
			first.date.format(DATE_FORMAT),
			last.date.format(DATE_FORMAT)
		),
		_ => "Weekly pattern".to_string(),
	};
	let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
	frame.render_widget(panel, area);
}

fn render_monthly_panel(frame: &mut Frame, area: Rect, monthly: &MonthlyView) {
	let mut lines = Vec::new();
	lines.push(Line::from(
		WEEKDAY_NAMES
			.iter()
			.map(|name| Span::styled(centered(name, MONTH_CELL_WIDTH), Style::default().fg(Color::Gray)))
			.collect::<Vec<_>>(),
	));

	for week in monthly.weeks() {
		let mut day_spans = Vec::new();
		let mut hour_spans = Vec::new();
		for cell in week {
			let Some(cell) = cell else {
				day_spans.push(Span::raw(" ".repeat(MONTH_CELL_WIDTH)));
				hour_spans.push(Span::raw(" ".repeat(MONTH_CELL_WIDTH)));
				continue;
			};

			let mut style = intensity_style(cell.intensity);
			if cell.selected {
				style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
			}
			let day = if cell.selected {
				format!(">{}<", cell.date.format("%d"))
			} else {
				cell.date.format("%d").to_string()
			};
			let hours = if cell.hours > 0.0 {
				format!("{}h", cell.hours)
			} else {
				String::new()
			};
			day_spans.push(Span::styled(centered(&day, MONTH_CELL_WIDTH - 1), style));
			day_spans.push(Span::raw(" "));
			hour_spans.push(Span::styled(centered(&hours, MONTH_CELL_WIDTH - 1), style));
			hour_spans.push(Span::raw(" "));
		}
		lines.push(Line::from(day_spans));
		lines.push(Line::from(hour_spans));
	}

	lines.push(Line::from(""));
	let mut legend = vec![Span::raw("less ")];
	for bucket in 0..INTENSITY_COLORS.len() {
		legend.push(Span::styled("  ", intensity_style(bucket as u8)));
		legend.push(Span::raw(" "));
	}
	legend.push(Span::raw("more"));
	lines.push(Line::from(legend));

	let title = format!("Monthly pattern {}", monthly.month.format("%B %Y"));
	let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
	frame.render_widget(panel, area);
}

fn render_summary(frame: &mut Frame, area: Rect, summary: &SummaryStats) {
	let line = Line::from(vec![
		Span::raw("Today: "),
		Span::styled(
			format_duration(summary.today_hours),
			Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
		),
		Span::raw("   This week average: "),
		Span::styled(
			format_duration(summary.week_average),
			Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
		),
		Span::raw("   This week total: "),
		Span::styled(
			format_duration(summary.week_total),
			Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
		),
	]);
	let panel = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Stats"));
	frame.render_widget(panel, area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
	let footer_lines = match &app.mode {
		InputMode::Prompt(prompt) => vec![
			Line::from(format!("{}: {}", prompt.title, prompt.input)),
			Line::from("Enter submit | Esc cancel"),
		],
		InputMode::Normal | InputMode::Notice(_) => vec![
			Line::from(
				"d/w/m view | arrows/hjkl move | space toggle | [ ] day | n/N month | t today | g date | e export | i import | q quit",
			),
			Line::from(app.status.clone()),
		],
	};

	let footer = Paragraph::new(footer_lines).block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn render_notice_popup(frame: &mut Frame, notice: &Notice) {
	let area = centered_rect(50, 30, frame.area());
	frame.render_widget(Clear, area);

	let lines = vec![
		Line::from(notice.message.clone()),
		Line::from(""),
		Line::from(Span::styled("Enter to dismiss", Style::default().fg(Color::DarkGray))),
	];
	let popup = Paragraph::new(lines)
		.wrap(Wrap { trim: true })
		.block(
			Block::default()
				.borders(Borders::ALL)
				.title(notice.title.clone())
				.border_style(Style::default().fg(FOCUSED_CELL_COLOR)),
		);
	frame.render_widget(popup, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
	let popup_layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Percentage((100 - percent_y) / 2),
			Constraint::Percentage(percent_y),
			Constraint::Percentage((100 - percent_y) / 2),
		])
		.split(area);
	Layout::default()
		.direction(Direction::Horizontal)
		.constraints([
			Constraint::Percentage((100 - percent_x) / 2),
			Constraint::Percentage(percent_x),
			Constraint::Percentage((100 - percent_x) / 2),
		])
		.split(popup_layout[1])[1]
}

fn handle_normal_key(
	app: &mut App,
	code: KeyCode,
	store: &mut SlotStore,
	settings: &Settings,
	today: NaiveDate,
) -> bool {
	match code {
		KeyCode::Char('q') | KeyCode::Esc => true,
		KeyCode::Char('d') | KeyCode::Char('1') => {
			app.switch_mode(ViewMode::Daily);
			false
		}
		KeyCode::Char('w') | KeyCode::Char('2') => {
			app.switch_mode(ViewMode::Weekly);
			false
		}
		KeyCode::Char('m') | KeyCode::Char('3') => {
			app.switch_mode(ViewMode::Monthly);
			false
		}
		KeyCode::Char('[') => {
			app.view.shift_selected_date(-1);
			false
		}
		KeyCode::Char(']') => {
			app.view.shift_selected_date(1);
			false
		}
		KeyCode::Char('n') => {
			app.view.select_date(shift_month(app.view.selected_date, 1));
			false
		}
		KeyCode::Char('N') => {
			app.view.select_date(shift_month(app.view.selected_date, -1));
			false
		}
		KeyCode::Char('t') => {
			app.view.select_date(today);
			false
		}
		KeyCode::Char('g') => {
			let mut prompt = PromptState::new("Go to date (YYYY-MM-DD)", PromptKind::GotoDate);
			prompt.input = app.view.selected_date.format(DATE_FORMAT).to_string();
			app.mode = InputMode::Prompt(prompt);
			false
		}
		KeyCode::Char('e') => {
			export_record(app, store, &settings.export_dir, today);
			false
		}
		KeyCode::Char('i') => {
			if let Some(pending) = &app.pending_import {
				app.status = format!("still reading {}", pending.path().display());
			} else {
				app.mode = InputMode::Prompt(PromptState::new("Import CSV file", PromptKind::ImportPath));
			}
			false
		}
		KeyCode::Left | KeyCode::Char('h') => {
			app.move_selection(-1, 0);
			false
		}
		KeyCode::Right | KeyCode::Char('l') => {
			app.move_selection(1, 0);
			false
		}
		KeyCode::Up | KeyCode::Char('k') => {
			app.move_selection(0, -1);
			false
		}
		KeyCode::Down | KeyCode::Char('j') => {
			app.move_selection(0, 1);
			false
		}
		KeyCode::Char(' ') | KeyCode::Enter => {
			match app.view.mode {
				ViewMode::Daily => toggle_slot(app, store, &settings.store_path),
				ViewMode::Weekly => app.status = "Weekly view is read-only".to_string(),
				ViewMode::Monthly => {
					app.status = format!("Selected {}", app.view.selected_date.format(DATE_FORMAT));
				}
			}
			false
		}
		_ => false,
	}
}

fn handle_prompt_key(app: &mut App, code: KeyCode) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Input cancelled".to_string();
		}
		KeyCode::Backspace => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.pop();
			}
		}
		KeyCode::Char(value) => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.push(value);
			}
		}
		KeyCode::Enter => {
			let prompt = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Prompt(prompt) => prompt,
				InputMode::Normal | InputMode::Notice(_) => return false,
			};

			if let Err(err) = submit_prompt(app, &prompt) {
				app.mode = InputMode::Prompt(prompt);
				app.status = format!("error: {err}");
			}
		}
		_ => {}
	}

	false
}

fn handle_notice_key(app: &mut App, code: KeyCode) -> bool {
	if matches!(code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
		app.mode = InputMode::Normal;
	}
	false
}

fn submit_prompt(app: &mut App, prompt: &PromptState) -> Result<(), String> {
	match prompt.kind {
		PromptKind::GotoDate => {
			let date = parse_date_input(&prompt.input)?;
			app.view.select_date(date);
			app.status = format!("Selected {}", date.format(DATE_FORMAT));
		}
		PromptKind::ImportPath => {
			let path = parse_import_path(&prompt.input)?;
			info!(path = %path.display(), "reading CSV import");
			app.status = format!("Reading {}...", path.display());
			app.pending_import = Some(PendingRead::spawn(path));
		}
	}
	Ok(())
}

fn parse_date_input(input: &str) -> Result<NaiveDate, String> {
	let value = input.trim();
	parse_date(value).ok_or_else(|| {
		format!("invalid date '{value}', expected YYYY-MM-DD between years {MIN_YEAR} and {MAX_YEAR}")
	})
}

fn parse_import_path(input: &str) -> Result<PathBuf, String> {
	let value = input.trim();
	if value.is_empty() {
		return Err("file path is required".to_string());
	}

	let path = PathBuf::from(value);
	let is_csv = path
		.extension()
		.and_then(|extension| extension.to_str())
		.is_some_and(|extension| extension.eq_ignore_ascii_case("csv"));
	if !is_csv {
		return Err("only .csv files can be imported".to_string());
	}
	Ok(absolutize(path))
}

fn toggle_slot(app: &mut App, store: &mut SlotStore, store_path: &Path) {
	let date = app.view.selected_date;
	let slot = app.view.cursor;
	let checked = store.toggle(date, slot);
	info!(date = %date, slot = %slot, checked, "slot toggled");

	app.status = match persist(store_path, store) {
		Ok(()) => format!(
			"{} {} {}",
			date.format(DATE_FORMAT),
			slot,
			if checked { "recorded" } else { "cleared" }
		),
		Err(err) => format!("error: {err}"),
	};
}

fn export_record(app: &mut App, store: &SlotStore, export_dir: &Path, today: NaiveDate) {
	let notice = match write_export(export_dir, today, store) {
		Ok(path) => Notice::new("Export", format!("Exported writing record to {}", path.display())),
		Err(CsvError::NothingToExport) => Notice::new("Export", "Nothing to export yet"),
		Err(err) => {
			warn!(error = %err, "export failed");
			Notice::new("Export failed", format!("Could not write the CSV file: {err}"))
		}
	};
	app.mode = InputMode::Notice(notice);
}

fn finish_import(
	app: &mut App,
	store: &mut SlotStore,
	store_path: &Path,
	file_path: &Path,
	result: Result<String, CsvError>,
) {
	let outcome = result.and_then(|content| import_csv(store, &content));
	let notice = match outcome {
		Ok(summary) => match persist(store_path, store) {
			Ok(()) => Notice::new(
				"Import",
				format!(
					"Imported {} slots from {} rows of {}",
					summary.slots_marked,
					summary.rows_applied,
					file_path.display()
				),
			),
			Err(err) => Notice::new("Import failed", format!("Imported but could not save: {err}")),
		},
		Err(err) => {
			warn!(path = %file_path.display(), error = %err, "import failed");
			if let Err(save_err) = persist(store_path, store) {
				warn!(error = %save_err, "failed to persist partial import");
			}
			Notice::new("Import failed", format!("Error while reading the CSV file: {err}"))
		}
	};
	app.status = "Ready".to_string();
	app.mode = InputMode::Notice(notice);
}

fn persist(path: &Path, store: &SlotStore) -> Result<(), String> {
	save_store(path, store).map_err(|err| {
		warn!(path = %path.display(), error = %err, "failed to persist slot store");
		err.to_string()
	})
}

/// Bar height in rows; any day gets at least one row.
fn bar_rows(fill: f64) -> u16 {
	((fill * f64::from(BAR_ROWS)).round() as u16).clamp(1, BAR_ROWS)
}

fn centered(text: &str, width: usize) -> String {
	format!("{text:^width$}")
}

fn period_style(period: Period) -> Style {
	let color = match period {
		Period::Dawn => Color::Magenta,
		Period::Morning => Color::Blue,
		Period::Afternoon => Color::Green,
		Period::Evening => Color::Rgb(234, 88, 12),
	};
	Style::default().fg(color)
}

fn intensity_style(bucket: u8) -> Style {
	let index = usize::from(bucket).min(INTENSITY_COLORS.len() - 1);
	let fg = if index > 2 { Color::White } else { Color::Black };
	Style::default().fg(fg).bg(INTENSITY_COLORS[index])
}

#[derive(Debug, Clone)]
struct PromptState {
	title: String,
	input: String,
	kind: PromptKind,
}

impl PromptState {
	fn new(title: impl Into<String>, kind: PromptKind) -> Self {
		Self {
			title: title.into(),
			input: String::new(),
			kind,
		}
	}
}

#[derive(Debug, Clone, Copy)]
enum PromptKind {
	GotoDate,
	ImportPath,
}

#[derive(Debug, Clone)]
struct Notice {
	title: String,
	message: String,
}

impl Notice {
	fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			message: message.into(),
		}
	}
}

#[derive(Debug, Clone)]
enum InputMode {
	Normal,
	Prompt(PromptState),
	Notice(Notice),
}

struct App {
	view: ViewState,
	mode: InputMode,
	status: String,
	pending_import: Option<PendingRead>,
}

impl App {
	fn new(today: NaiveDate) -> Self {
		Self {
			view: ViewState::new(today),
			mode: InputMode::Normal,
			status: "Ready".to_string(),
			pending_import: None,
		}
	}

	fn switch_mode(&mut self, mode: ViewMode) {
		self.view.set_mode(mode);
		self.status = format!("{} view", mode.label());
	}

	/// Arrow movement: slot cursor in the daily grid, the week in the weekly
	/// view, the selected day in the monthly calendar.
	fn move_selection(&mut self, dx: i32, dy: i32) {
		match self.view.mode {
			ViewMode::Daily => self.view.move_cursor(dx + dy * i32::from(SLOTS_PER_ROW)),
			ViewMode::Weekly => self.view.shift_selected_date(i64::from(dx) * 7),
			ViewMode::Monthly => self.view.shift_selected_date(i64::from(dx) + i64::from(dy) * 7),
		}
	}
}

#[cfg(test)]
mod tests {
	use std::fs;

	use chrono::NaiveDate;
	use crossterm::event::KeyCode;

	use crate::config::Settings;
	use crate::csv_codec::PendingRead;
	use crate::slots::{SlotStore, SlotTime};
	use crate::storage::load_store;
	use crate::view::ViewMode;

	use super::{
		App, InputMode, bar_rows, finish_import, handle_normal_key, handle_notice_key, handle_prompt_key,
	};

	fn day(raw: &str) -> NaiveDate {
		NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
	}

	/// Settings whose store sits under a regular file, so every save fails.
	fn unwritable_settings_in(dir: &std::path::Path) -> Settings {
		let blocker = dir.join("not-a-directory");
		fs::write(&blocker, "").expect("write");
		Settings {
			store_path: blocker.join("writingTimeData.json"),
			..settings_in(dir)
		}
	}

	fn settings_in(dir: &std::path::Path) -> Settings {
		Settings {
			state_dir: dir.to_path_buf(),
			store_path: dir.join("writingTimeData.json"),
			export_dir: dir.join("exports"),
			log_level: None,
		}
	}

	fn type_text(app: &mut App, text: &str) {
		for value in text.chars() {
			handle_prompt_key(app, KeyCode::Char(value));
		}
	}

	#[test]
	fn space_toggles_and_persists_slot() {
		let dir = tempfile::tempdir().expect("tempdir");
		let settings = settings_in(dir.path());
		let today = day("2024-03-10");
		let mut store = SlotStore::new();
		let mut app = App::new(today);

		handle_normal_key(&mut app, KeyCode::Char(' '), &mut store, &settings, today);
		handle_normal_key(&mut app, KeyCode::Right, &mut store, &settings, today);
		handle_normal_key(&mut app, KeyCode::Char(' '), &mut store, &settings, today);

		assert_eq!(store.total_hours(today), 1.0);
		assert_eq!(load_store(&settings.store_path), store);
	}

	#[test]
	fn monthly_navigation_changes_date_not_mode() {
		let dir = tempfile::tempdir().expect("tempdir");
		let settings = settings_in(dir.path());
		let today = day("2024-03-10");
		let mut store = SlotStore::new();
		let mut app = App::new(today);

		handle_normal_key(&mut app, KeyCode::Char('m'), &mut store, &settings, today);
		handle_normal_key(&mut app, KeyCode::Down, &mut store, &settings, today);
		handle_normal_key(&mut app, KeyCode::Right, &mut store, &settings, today);
		handle_normal_key(&mut app, KeyCode::Enter, &mut store, &settings, today);

		assert_eq!(app.view.mode, ViewMode::Monthly);
		assert_eq!(app.view.selected_date, day("2024-03-18"));
		assert!(store.is_empty());
		assert!(!settings.store_path.exists());
	}

	#[test]
	fn goto_prompt_selects_date() {
		let dir = tempfile::tempdir().expect("tempdir");
		let settings = settings_in(dir.path());
		let today = day("2024-03-10");
		let mut store = SlotStore::new();
		let mut app = App::new(today);

		handle_normal_key(&mut app, KeyCode::Char('g'), &mut store, &settings, today);
		for _ in 0..10 {
			handle_prompt_key(&mut app, KeyCode::Backspace);
		}
		type_text(&mut app, "2023-12-31");
		handle_prompt_key(&mut app, KeyCode::Enter);

		assert!(matches!(app.mode, InputMode::Normal));
		assert_eq!(app.view.selected_date, day("2023-12-31"));
	}

	#[test]
	fn export_with_empty_store_raises_notice() {
		let dir = tempfile::tempdir().expect("tempdir");
		let settings = settings_in(dir.path());
		let today = day("2024-03-10");
		let mut store = SlotStore::new();
		let mut app = App::new(today);

		handle_normal_key(&mut app, KeyCode::Char('e'), &mut store, &settings, today);
		let InputMode::Notice(notice) = &app.mode else {
			panic!("expected notice");
		};
		assert_eq!(notice.message, "Nothing to export yet");
		assert!(!settings.export_dir.exists());

		handle_notice_key(&mut app, KeyCode::Enter);
		assert!(matches!(app.mode, InputMode::Normal));
	}

	#[test]
	fn import_prompt_rejects_non_csv_path() {
		let dir = tempfile::tempdir().expect("tempdir");
		let settings = settings_in(dir.path());
		let today = day("2024-03-10");
		let mut store = SlotStore::new();
		let mut app = App::new(today);

		handle_normal_key(&mut app, KeyCode::Char('i'), &mut store, &settings, today);
		type_text(&mut app, "backup.txt");
		handle_prompt_key(&mut app, KeyCode::Enter);

		assert!(matches!(app.mode, InputMode::Prompt(_)));
		assert!(app.pending_import.is_none());
		assert!(app.status.starts_with("error:"));
	}

	#[test]
	fn finished_import_merges_persists_and_notifies() {
		let dir = tempfile::tempdir().expect("tempdir");
		let settings = settings_in(dir.path());
		let csv_path = dir.path().join("backup.csv");
		fs::write(&csv_path, "header\n2024-03-10,Sun,1,60,\"09:00;09:30\"\n").expect("write");
		let mut store = SlotStore::new();
		let mut app = App::new(day("2024-03-10"));

		let content = PendingRead::spawn(csv_path.clone()).wait();
		finish_import(&mut app, &mut store, &settings.store_path, &csv_path, content);

		assert_eq!(store.total_hours(day("2024-03-10")), 1.0);
		assert_eq!(load_store(&settings.store_path), store);
		let InputMode::Notice(notice) = &app.mode else {
			panic!("expected notice");
		};
		assert_eq!(notice.title, "Import");
	}

	#[test]
	fn failed_import_keeps_earlier_rows() {
		let dir = tempfile::tempdir().expect("tempdir");
		let settings = settings_in(dir.path());
		let csv_path = dir.path().join("broken.csv");
		let mut store = SlotStore::new();
		let mut app = App::new(day("2024-03-10"));

		let content = "header\n2024-03-10,Sun,0.5,30,\"09:00\"\nbad-date,Sun,0.5,30,\"10:00\"\n".to_string();
		finish_import(&mut app, &mut store, &settings.store_path, &csv_path, Ok(content));

		let slot = SlotTime::parse("09:00").expect("slot");
		assert!(store.is_checked(day("2024-03-10"), slot));
		assert!(load_store(&settings.store_path).is_checked(day("2024-03-10"), slot));
		let InputMode::Notice(notice) = &app.mode else {
			panic!("expected notice");
		};
		assert_eq!(notice.title, "Import failed");
	}

	#[test]
	fn bars_have_minimum_height() {
		assert_eq!(bar_rows(0.0), 1);
		assert_eq!(bar_rows(0.5), 4);
		assert_eq!(bar_rows(1.0), 8);
	}

	#[test]
	fn goto_prompt_rejects_years_out_of_range() {
		let dir = tempfile::tempdir().expect("tempdir");
		let settings = settings_in(dir.path());
		let today = day("2024-03-10");
		let mut store = SlotStore::new();
		let mut app = App::new(today);

		handle_normal_key(&mut app, KeyCode::Char('g'), &mut store, &settings, today);
		for _ in 0..10 {
			handle_prompt_key(&mut app, KeyCode::Backspace);
		}
		type_text(&mut app, "+262142-12-31");
		handle_prompt_key(&mut app, KeyCode::Enter);

		assert!(matches!(app.mode, InputMode::Prompt(_)));
		assert!(app.status.starts_with("error:"));
		assert_eq!(app.view.selected_date, today);
	}

	#[test]
	fn navigation_stops_at_last_supported_day() {
		let dir = tempfile::tempdir().expect("tempdir");
		let settings = settings_in(dir.path());
		let today = day("9999-12-31");
		let mut store = SlotStore::new();
		let mut app = App::new(today);

		for code in [KeyCode::Char(']'), KeyCode::Char('n')] {
			handle_normal_key(&mut app, code, &mut store, &settings, today);
			assert_eq!(app.view.selected_date, today);
		}
		handle_normal_key(&mut app, KeyCode::Char('m'), &mut store, &settings, today);
		handle_normal_key(&mut app, KeyCode::Down, &mut store, &settings, today);
		assert_eq!(app.view.selected_date, today);
	}

	#[test]
	fn failed_save_reports_error_and_keeps_toggle() {
		let dir = tempfile::tempdir().expect("tempdir");
		let settings = unwritable_settings_in(dir.path());
		let today = day("2024-03-10");
		let mut store = SlotStore::new();
		let mut app = App::new(today);

		handle_normal_key(&mut app, KeyCode::Char(' '), &mut store, &settings, today);

		assert!(app.status.starts_with("error:"), "status was {:?}", app.status);
		assert!(store.is_checked(today, app.view.cursor));
		assert!(matches!(app.mode, InputMode::Normal));
	}

	#[test]
	fn import_that_cannot_be_saved_says_so() {
		let dir = tempfile::tempdir().expect("tempdir");
		let settings = unwritable_settings_in(dir.path());
		let csv_path = dir.path().join("backup.csv");
		let mut store = SlotStore::new();
		let mut app = App::new(day("2024-03-10"));

		let content = "header\n2024-03-10,Sun,0.5,30,\"09:00\"\n".to_string();
		finish_import(&mut app, &mut store, &settings.store_path, &csv_path, Ok(content));

		assert!(store.is_checked(day("2024-03-10"), SlotTime::parse("09:00").expect("slot")));
		let InputMode::Notice(notice) = &app.mode else {
			panic!("expected notice");
		};
		assert_eq!(notice.title, "Import failed");
		assert!(notice.message.starts_with("Imported but could not save"));
	}
}
