use chrono::NaiveDate;

use crate::calendar::{first_day_of_month, month_of, offset_date, week_of, weekday_index, weekday_name};
use crate::slots::{Period, SLOTS_PER_DAY, SlotStore, SlotTime, time_slots};

/// Daily totals at or above this fill a weekly bar completely.
pub const REFERENCE_MAX_HOURS: f64 = 8.0;
pub const INTENSITY_BUCKETS: u8 = 5;
pub const SLOTS_PER_ROW: u8 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
	Daily,
	Weekly,
	Monthly,
}

impl ViewMode {
	pub const ALL: [ViewMode; 3] = [ViewMode::Daily, ViewMode::Weekly, ViewMode::Monthly];

	pub fn label(self) -> &'static str {
		match self {
			ViewMode::Daily => "daily",
			ViewMode::Weekly => "weekly",
			ViewMode::Monthly => "monthly",
		}
	}
}

/// Transient UI state. Nothing here touches the slot store.
#[derive(Debug, Clone)]
pub struct ViewState {
	pub selected_date: NaiveDate,
	pub mode: ViewMode,
	pub cursor: SlotTime,
}

impl ViewState {
	pub fn new(today: NaiveDate) -> Self {
		Self {
			selected_date: today,
			mode: ViewMode::Daily,
			cursor: SlotTime::from_hm(9, 0).unwrap_or(SlotTime::MIDNIGHT),
		}
	}

	pub fn set_mode(&mut self, mode: ViewMode) {
		self.mode = mode;
	}

	pub fn select_date(&mut self, date: NaiveDate) {
		self.selected_date = date;
	}

	/// Moves the selection; a move past the supported years is ignored.
	pub fn shift_selected_date(&mut self, delta_days: i64) {
		if let Some(date) = offset_date(self.selected_date, delta_days) {
			self.selected_date = date;
		}
	}

	/// Moves the daily-grid cursor, clamped to the day.
	pub fn move_cursor(&mut self, delta: i32) {
		let next = (i32::from(self.cursor.index()) + delta).clamp(0, i32::from(SLOTS_PER_DAY) - 1);
		if let Some(slot) = SlotTime::from_index(next as u8) {
			self.cursor = slot;
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotCell {
	pub slot: SlotTime,
	pub checked: bool,
	pub focused: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodRow {
	pub period: Period,
	pub cells: Vec<SlotCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyView {
	pub date: NaiveDate,
	pub weekday: &'static str,
	pub total_hours: f64,
	pub rows: Vec<PeriodRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekBar {
	pub date: NaiveDate,
	pub weekday: &'static str,
	pub hours: f64,
	pub fill: f64,
	pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyView {
	pub bars: Vec<WeekBar>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthCell {
	pub date: NaiveDate,
	pub hours: f64,
	pub intensity: u8,
	pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyView {
	pub month: NaiveDate,
	pub leading_blanks: usize,
	pub cells: Vec<MonthCell>,
}

impl MonthlyView {
	/// Calendar rows of seven columns, `None` for padding.
	pub fn weeks(&self) -> Vec<Vec<Option<&MonthCell>>> {
		let mut padded = vec![None; self.leading_blanks];
		padded.extend(self.cells.iter().map(Some));
		while padded.len() % 7 != 0 {
			padded.push(None);
		}
		padded.chunks(7).map(|week| week.to_vec()).collect()
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Panel {
	Daily(DailyView),
	Weekly(WeeklyView),
	Monthly(MonthlyView),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStats {
	pub today_hours: f64,
	pub week_total: f64,
	pub week_average: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
	pub mode: ViewMode,
	pub selected_date: NaiveDate,
	pub panel: Panel,
	pub summary: SummaryStats,
}

/// Builds everything the dashboard shows from the latest state. Call after
/// every transition so the picture never lags the store.
pub fn render(state: &ViewState, store: &SlotStore, today: NaiveDate) -> Screen {
	let panel = match state.mode {
		ViewMode::Daily => Panel::Daily(daily_view(state, store)),
		ViewMode::Weekly => Panel::Weekly(weekly_view(state.selected_date, store)),
		ViewMode::Monthly => Panel::Monthly(monthly_view(state.selected_date, store)),
	};

	Screen {
		mode: state.mode,
		selected_date: state.selected_date,
		panel,
		summary: summary_stats(state.selected_date, store, today),
	}
}

pub fn daily_view(state: &ViewState, store: &SlotStore) -> DailyView {
	let date = state.selected_date;
	let rows = Period::ALL
		.iter()
		.map(|period| PeriodRow {
			period: *period,
			cells: time_slots()
				.filter(|slot| slot.period() == *period)
				.map(|slot| SlotCell {
					slot,
					checked: store.is_checked(date, slot),
					focused: slot == state.cursor,
				})
				.collect(),
		})
		.collect();

	DailyView {
		date,
		weekday: weekday_name(date),
		total_hours: store.total_hours(date),
		rows,
	}
}

pub fn weekly_view(selected_date: NaiveDate, store: &SlotStore) -> WeeklyView {
	let bars = week_of(selected_date)
		.into_iter()
		.map(|date| {
			let hours = store.total_hours(date);
			WeekBar {
				date,
				weekday: weekday_name(date),
				hours,
				fill: bar_fill(hours),
				selected: date == selected_date,
			}
		})
		.collect();
	WeeklyView { bars }
}

pub fn monthly_view(selected_date: NaiveDate, store: &SlotStore) -> MonthlyView {
	let month = first_day_of_month(selected_date);
	let cells = month_of(selected_date)
		.into_iter()
		.map(|date| {
			let hours = store.total_hours(date);
			MonthCell {
				date,
				hours,
				intensity: intensity_bucket(hours),
				selected: date == selected_date,
			}
		})
		.collect();

	MonthlyView {
		month,
		leading_blanks: weekday_index(month),
		cells,
	}
}

pub fn summary_stats(selected_date: NaiveDate, store: &SlotStore, today: NaiveDate) -> SummaryStats {
	let week_total = week_of(selected_date)
		.into_iter()
		.map(|date| store.total_hours(date))
		.sum::<f64>();
	SummaryStats {
		today_hours: store.total_hours(today),
		week_total,
		week_average: week_total / 7.0,
	}
}

/// 0 for an empty day, otherwise `ceil(hours / 2)` capped at 4.
pub fn intensity_bucket(hours: f64) -> u8 {
	if hours <= 0.0 {
		return 0;
	}
	((hours / 2.0).ceil() as u8).min(INTENSITY_BUCKETS - 1)
}

/// Fraction of a full weekly bar.
pub fn bar_fill(hours: f64) -> f64 {
	(hours / REFERENCE_MAX_HOURS).clamp(0.0, 1.0)
}
