use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const SLOTS_PER_DAY: u8 = 48;
pub const SLOT_HOURS: f64 = 0.5;
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One of the 48 half-hour slots of a calendar day, `00:00` through `23:30`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotTime(u8);

impl SlotTime {
    pub const MIDNIGHT: SlotTime = SlotTime(0);

    pub fn from_index(index: u8) -> Option<Self> {
        (index < SLOTS_PER_DAY).then_some(Self(index))
    }

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour >= 24 || !(minute == 0 || minute == 30) {
            return None;
        }
        Some(Self((hour * 2 + minute / 30) as u8))
    }

    /// Parses an `HH:MM` label on the 30-minute grid.
    pub fn parse(label: &str) -> Option<Self> {
        let (hour, minute) = label.trim().split_once(':')?;
        if hour.len() != 2 || minute.len() != 2 {
            return None;
        }
        Self::from_hm(hour.parse().ok()?, minute.parse().ok()?)
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn hour(self) -> u32 {
        u32::from(self.0 / 2)
    }

    pub fn minute(self) -> u32 {
        u32::from(self.0 % 2) * 30
    }

    pub fn period(self) -> Period {
        period_of(self.hour())
    }

    pub fn label(self) -> String {
        self.to_string()
    }
}

impl Display for SlotTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// The fixed ordered day grid.
pub fn time_slots() -> impl Iterator<Item = SlotTime> {
    (0..SLOTS_PER_DAY).map(SlotTime)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Dawn,
    Morning,
    Afternoon,
    Evening,
}

impl Period {
    pub const ALL: [Period; 4] = [
        Period::Dawn,
        Period::Morning,
        Period::Afternoon,
        Period::Evening,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Period::Dawn => "dawn",
            Period::Morning => "morning",
            Period::Afternoon => "afternoon",
            Period::Evening => "evening",
        }
    }

    pub fn start_hour(self) -> u32 {
        match self {
            Period::Dawn => 0,
            Period::Morning => 6,
            Period::Afternoon => 12,
            Period::Evening => 18,
        }
    }
}

/// Hours outside 0..24 fall into the evening band.
pub fn period_of(hour: u32) -> Period {
    match hour {
        0..6 => Period::Dawn,
        6..12 => Period::Morning,
        12..18 => Period::Afternoon,
        _ => Period::Evening,
    }
}

pub fn slot_key(date: NaiveDate, slot: SlotTime) -> String {
    format!("{}_{}", date.format(DATE_FORMAT), slot)
}

/// Persistent `date_time -> checked` mapping. Absent keys read as unchecked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotStore {
    slots: BTreeMap<String, bool>,
}

impl SlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_checked(&self, date: NaiveDate, slot: SlotTime) -> bool {
        self.slots
            .get(&slot_key(date, slot))
            .copied()
            .unwrap_or(false)
    }

    /// Flips the slot and returns its new state.
    pub fn toggle(&mut self, date: NaiveDate, slot: SlotTime) -> bool {
        let entry = self.slots.entry(slot_key(date, slot)).or_insert(false);
        *entry = !*entry;
        *entry
    }

    /// Sets the slot to checked, leaving every other entry untouched.
    pub fn mark(&mut self, date: NaiveDate, slot: SlotTime) {
        self.slots.insert(slot_key(date, slot), true);
    }

    pub fn checked_slots(&self, date: NaiveDate) -> Vec<SlotTime> {
        time_slots()
            .filter(|slot| self.is_checked(date, *slot))
            .collect()
    }

    pub fn total_hours(&self, date: NaiveDate) -> f64 {
        time_slots()
            .filter(|slot| self.is_checked(date, *slot))
            .map(|_| SLOT_HOURS)
            .sum()
    }

    /// Dates carrying at least one checked slot, ascending.
    pub fn recorded_dates(&self) -> BTreeSet<NaiveDate> {
        self.slots
            .iter()
            .filter(|(_, checked)| **checked)
            .filter_map(|(key, _)| key.split_once('_'))
            .filter_map(|(date, _)| NaiveDate::parse_from_str(date, DATE_FORMAT).ok())
            .collect()
    }

    pub fn checked_keys(&self) -> BTreeSet<&str> {
        self.slots
            .iter()
            .filter(|(_, checked)| **checked)
            .map(|(key, _)| key.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.checked_keys().is_empty()
    }
}

/// Renders a fractional hour count as whole hours and minutes.
pub fn format_duration(hours: f64) -> String {
    let total_minutes = (hours.max(0.0) * 60.0 + 1e-6).floor() as u64;
    let h = total_minutes / 60;
    let m = total_minutes % 60;
    match (h, m) {
        (0, m) => plural(m, "minute"),
        (h, 0) => plural(h, "hour"),
        (h, m) => format!("{} {}", plural(h, "hour"), plural(m, "minute")),
    }
}

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("{count} {unit}")
    } else {
        format!("{count} {unit}s")
    }
}
