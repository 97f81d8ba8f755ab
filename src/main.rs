mod calendar;
mod config;
mod csv_codec;
mod logging;
mod slots;
mod storage;
mod ui;
mod view;

use std::error::Error;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::calendar::{MAX_YEAR, MIN_YEAR, WEEKDAY_NAMES, parse_date, weekday_name};
use crate::config::{Settings, absolutize};
use crate::csv_codec::{CsvError, PendingRead, import_csv, write_export};
use crate::logging::enable_logging;
use crate::slots::{DATE_FORMAT, SlotStore, SlotTime, format_duration};
use crate::storage::{load_store, save_store};
use crate::ui::run_dashboard;
use crate::view::{REFERENCE_MAX_HOURS, ViewState, daily_view, monthly_view, summary_stats, weekly_view};

const TEXT_BAR_WIDTH: f64 = 24.0;

#[derive(Debug, Parser)]
#[command(name = "writing-time", about = "Half-hour writing time tracker")]
struct Cli {
	#[arg(long)]
	store: Option<PathBuf>,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Init,
	Dashboard,
	Toggle {
		#[arg(long)]
		date: String,
		#[arg(long)]
		time: String,
	},
	Day {
		#[arg(long)]
		date: Option<String>,
	},
	Week {
		#[arg(long)]
		date: Option<String>,
	},
	Month {
		#[arg(long)]
		date: Option<String>,
	},
	Stats {
		#[arg(long)]
		date: Option<String>,
	},
	Export {
		#[arg(long)]
		dir: Option<PathBuf>,
	},
	Import {
		#[arg(long)]
		file: PathBuf,
	},
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();
	let settings = Settings::resolve(cli.store)?;
	if let Err(err) = enable_logging(&settings.log_dir(), settings.log_level.as_deref()) {
		eprintln!("warning: logging disabled: {err}");
	}

	let mut store = load_store(&settings.store_path);
	info!(path = %settings.store_path.display(), "slot store loaded");
	let today = Local::now().date_naive();

	match cli.command.unwrap_or(Command::Dashboard) {
		Command::Init => {
			if !settings.store_path.exists() {
				save_store(&settings.store_path, &store)?;
			}
			println!("store at {}", settings.store_path.display());
		}
		Command::Dashboard => {
			run_dashboard(&mut store, &settings)?;
		}
		Command::Toggle { date, time } => {
			let date = parse_day(Some(&date), today)?;
			let slot = SlotTime::parse(&time).ok_or_else(|| format!("invalid time '{time}', expected HH:00 or HH:30"))?;
			let checked = store.toggle(date, slot);
			save_store(&settings.store_path, &store)?;
			info!(date = %date, slot = %slot, checked, "slot toggled");
			println!(
				"{} {} {} | total {}",
				date.format(DATE_FORMAT),
				slot,
				if checked { "recorded" } else { "cleared" },
				format_duration(store.total_hours(date))
			);
		}
		Command::Day { date } => {
			print_day(&store, parse_day(date.as_deref(), today)?);
		}
		Command::Week { date } => {
			print_week(&store, parse_day(date.as_deref(), today)?);
		}
		Command::Month { date } => {
			print_month(&store, parse_day(date.as_deref(), today)?);
		}
		Command::Stats { date } => {
			print_stats(&store, parse_day(date.as_deref(), today)?, today);
		}
		Command::Export { dir } => {
			let dir = dir.map(absolutize).unwrap_or_else(|| settings.export_dir.clone());
			match write_export(&dir, today, &store) {
				Ok(path) => println!("exported writing record to {}", path.display()),
				Err(CsvError::NothingToExport) => println!("nothing to export"),
				Err(err) => return Err(err.into()),
			}
		}
		Command::Import { file } => {
			let content = PendingRead::spawn(absolutize(file.clone())).wait()?;
			let result = import_csv(&mut store, &content);
			save_store(&settings.store_path, &store)?;
			let summary = result?;
			println!(
				"imported {} slots from {} rows ({} skipped) of {}",
				summary.slots_marked,
				summary.rows_applied,
				summary.rows_skipped,
				file.display()
			);
		}
	}

	Ok(())
}

fn parse_day(input: Option<&str>, today: NaiveDate) -> Result<NaiveDate, Box<dyn Error>> {
	let Some(raw) = input else {
		return Ok(today);
	};
	parse_date(raw).ok_or_else(|| {
		format!("invalid date '{raw}', expected YYYY-MM-DD between years {MIN_YEAR} and {MAX_YEAR}").into()
	})
}

fn print_day(store: &SlotStore, date: NaiveDate) {
	let daily = daily_view(&ViewState::new(date), store);
	println!(
		"{} ({}) | total {}",
		date.format(DATE_FORMAT),
		daily.weekday,
		format_duration(daily.total_hours)
	);
	for row in &daily.rows {
		let cells = row
			.cells
			.iter()
			.map(|cell| format!("{}{}", cell.slot, if cell.checked { "*" } else { " " }))
			.collect::<Vec<_>>()
			.join(" ");
		println!("{:<10} {}", row.period.name(), cells);
	}
}

fn print_week(store: &SlotStore, date: NaiveDate) {
	let weekly = weekly_view(date, store);
	for bar in &weekly.bars {
		let filled = (bar.fill * TEXT_BAR_WIDTH).round() as usize;
		println!(
			"{} {} {:<column$} {}",
			bar.date.format(DATE_FORMAT),
			bar.weekday,
			"#".repeat(filled),
			format_duration(bar.hours),
			column = TEXT_BAR_WIDTH as usize
		);
	}
	println!("(bars full at {REFERENCE_MAX_HOURS} hours)");
}

fn print_month(store: &SlotStore, date: NaiveDate) {
	let monthly = monthly_view(date, store);
	println!("{}", monthly.month.format("%B %Y"));
	println!(
		"{}",
		WEEKDAY_NAMES
			.iter()
			.map(|name| format!("{name:^7}"))
			.collect::<String>()
	);
	for week in monthly.weeks() {
		let line = week
			.iter()
			.map(|cell| match cell {
				Some(cell) => format!("{}:{}", cell.date.format("%d"), cell.intensity),
				None => String::new(),
			})
			.map(|text| format!("{text:^7}"))
			.collect::<String>();
		println!("{line}");
	}
	println!("(day:intensity, 0 none .. 4 eight hours or more)");
}

fn print_stats(store: &SlotStore, date: NaiveDate, today: NaiveDate) {
	let stats = summary_stats(date, store, today);
	println!(
		"today ({} {}): {}",
		today.format(DATE_FORMAT),
		weekday_name(today),
		format_duration(stats.today_hours)
	);
	println!("this week average: {}", format_duration(stats.week_average));
	println!("this week total: {}", format_duration(stats.week_total));
}
