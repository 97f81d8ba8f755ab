use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::calendar::weekday_name;
use crate::slots::{DATE_FORMAT, SlotStore, SlotTime};

pub const CSV_HEADER: &str = "date,weekday,total_hours,total_minutes,slot_list";
const MIN_FIELDS: usize = 5;

#[derive(Debug)]
pub enum CsvError {
    NothingToExport,
    Io(std::io::Error),
    InvalidDate { line: usize, value: String },
    InvalidSlot { line: usize, value: String },
    ReaderGone,
}

impl Display for CsvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CsvError::NothingToExport => write!(f, "nothing to export"),
            CsvError::Io(err) => write!(f, "io error: {err}"),
            CsvError::InvalidDate { line, value } => {
                write!(f, "line {line}: invalid date '{value}', expected YYYY-MM-DD")
            }
            CsvError::InvalidSlot { line, value } => {
                write!(f, "line {line}: invalid slot '{value}', expected HH:00 or HH:30")
            }
            CsvError::ReaderGone => write!(f, "file reader stopped before finishing"),
        }
    }
}

impl std::error::Error for CsvError {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub rows_applied: usize,
    pub rows_skipped: usize,
    pub slots_marked: usize,
}

/// One row per date with at least one checked slot, ascending by date.
pub fn export_csv(store: &SlotStore) -> Result<String, CsvError> {
    let dates = store.recorded_dates();
    if dates.is_empty() {
        return Err(CsvError::NothingToExport);
    }

    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for date in dates {
        let total_hours = store.total_hours(date);
        let total_minutes = (total_hours * 60.0).round() as u64;
        let slot_list = store
            .checked_slots(date)
            .iter()
            .map(|slot| slot.label())
            .collect::<Vec<_>>()
            .join(";");
        out.push_str(&format!(
            "{},{},{},{},\"{}\"\n",
            date.format(DATE_FORMAT),
            weekday_name(date),
            total_hours,
            total_minutes,
            slot_list
        ));
    }

    Ok(out)
}

pub fn export_file_name(today: NaiveDate) -> String {
    format!("writing-record_{}.csv", today.format(DATE_FORMAT))
}

/// Writes the export into `dir` and returns the file path.
pub fn write_export(dir: &Path, today: NaiveDate, store: &SlotStore) -> Result<PathBuf, CsvError> {
    let content = export_csv(store)?;
    fs::create_dir_all(dir).map_err(CsvError::Io)?;
    let path = dir.join(export_file_name(today));
    fs::write(&path, content).map_err(CsvError::Io)?;
    info!(path = %path.display(), "exported writing record");
    Ok(path)
}

/// Merges rows into `store`. Rows applied before a failing row stay applied.
pub fn import_csv(store: &mut SlotStore, content: &str) -> Result<ImportSummary, CsvError> {
    let mut summary = ImportSummary::default();

    for (index, raw_line) in content.split('\n').enumerate().skip(1) {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let fields = line.split(',').collect::<Vec<_>>();
        if fields.len() < MIN_FIELDS {
            debug!(line = index + 1, fields = fields.len(), "skipping short CSV row");
            summary.rows_skipped += 1;
            continue;
        }

        let line_number = index + 1;
        let date = NaiveDate::parse_from_str(fields[0].trim(), DATE_FORMAT).map_err(|_| {
            CsvError::InvalidDate {
                line: line_number,
                value: fields[0].to_string(),
            }
        })?;

        let slot_list = fields[4].replace('"', "");
        for label in slot_list.split(';').map(str::trim).filter(|label| !label.is_empty()) {
            let slot = SlotTime::parse(label).ok_or_else(|| CsvError::InvalidSlot {
                line: line_number,
                value: label.to_string(),
            })?;
            store.mark(date, slot);
            summary.slots_marked += 1;
        }
        summary.rows_applied += 1;
    }

    info!(
        rows_applied = summary.rows_applied,
        rows_skipped = summary.rows_skipped,
        slots_marked = summary.slots_marked,
        "imported writing record"
    );
    Ok(summary)
}

/// A file read running on a background thread. There is no cancellation;
/// dropping it simply discards the result.
pub struct PendingRead {
    path: PathBuf,
    receiver: Receiver<Result<String, std::io::Error>>,
}

impl PendingRead {
    pub fn spawn(path: PathBuf) -> Self {
        let (sender, receiver) = mpsc::channel();
        let reader_path = path.clone();
        thread::spawn(move || {
            let _ = sender.send(fs::read_to_string(&reader_path));
        });
        Self { path, receiver }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the file contents once the read has finished.
    pub fn poll(&self) -> Option<Result<String, CsvError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result.map_err(CsvError::Io)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                warn!(path = %self.path.display(), "import reader disconnected");
                Some(Err(CsvError::ReaderGone))
            }
        }
    }

    pub fn wait(self) -> Result<String, CsvError> {
        match self.receiver.recv() {
            Ok(result) => result.map_err(CsvError::Io),
            Err(_) => Err(CsvError::ReaderGone),
        }
    }
}
