//! Weekly timetable model and ingestion.
//!
//! A `Schedule` is a fixed 7×24 grid of `Slot`s.  Documents come in two
//! shapes (one program object per slot, or a list of them) and older ones
//! spell the embed URL `url` and capitalise day names; all of that is folded
//! into the canonical shape here so lookups only ever see one layout.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, TimetableError};

pub const DAYS_PER_WEEK: u8 = 7;
pub const HOURS_PER_DAY: u8 = 24;

/// Day names indexed by day index (0 = Sunday).
pub const DAY_NAMES: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

// ── Day / Hour ───────────────────────────────────────────────────────────────

/// Day of the week, 0 = Sunday … 6 = Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Day(u8);

impl Day {
    pub const SUNDAY: Day = Day(0);
    pub const MONDAY: Day = Day(1);
    pub const TUESDAY: Day = Day(2);
    pub const WEDNESDAY: Day = Day(3);
    pub const THURSDAY: Day = Day(4);
    pub const FRIDAY: Day = Day(5);
    pub const SATURDAY: Day = Day(6);

    /// Wraps any integer into the week.
    pub fn from_index(index: usize) -> Self {
        Day((index % DAYS_PER_WEEK as usize) as u8)
    }

    pub fn from_chrono(day: chrono::Weekday) -> Self {
        Day(day.num_days_from_sunday() as u8)
    }

    /// Case-insensitive lookup of an English day name.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        DAY_NAMES
            .iter()
            .position(|n| *n == lower)
            .map(Day::from_index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn name(self) -> &'static str {
        DAY_NAMES[self.index()]
    }

    pub fn all() -> impl Iterator<Item = Day> {
        (0..DAYS_PER_WEEK).map(Day)
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Day {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Day {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Day::from_name(&name).ok_or_else(|| de::Error::custom(format!("unknown day {name:?}")))
    }
}

/// Hour of the day (0..=23), keyed as `"HH:00"` in timetable documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hour(u8);

impl Hour {
    pub fn new(hour: u32) -> Option<Self> {
        (hour < HOURS_PER_DAY as u32).then_some(Hour(hour as u8))
    }

    /// Parses `"HH:00"` (a single-digit hour is tolerated).
    pub fn from_key(key: &str) -> Option<Self> {
        let (h, m) = key.trim().split_once(':')?;
        if m != "00" || h.is_empty() || h.len() > 2 || !h.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Hour::new(h.parse().ok()?)
    }

    pub fn value(self) -> u32 {
        self.0 as u32
    }

    pub fn key(self) -> String {
        format!("{:02}:00", self.0)
    }

    pub fn all() -> impl Iterator<Item = Hour> {
        (0..HOURS_PER_DAY).map(Hour)
    }
}

impl fmt::Display for Hour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00", self.0)
    }
}

impl Serialize for Hour {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key())
    }
}

impl<'de> Deserialize<'de> for Hour {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Hour::from_key(&key).ok_or_else(|| de::Error::custom(format!("bad hour key {key:?}")))
    }
}

/// A `(day, hour)` coordinate in the weekly grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Moment {
    pub day: Day,
    pub hour: Hour,
}

impl Moment {
    pub fn new(day: Day, hour: Hour) -> Self {
        Self { day, hour }
    }
}

impl fmt::Display for Moment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.day, self.hour)
    }
}

// ── Program entries and slots ────────────────────────────────────────────────

/// One program airing in a slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgramEntry {
    pub channel: String,
    pub program_name: String,
    /// Embeddable player URL.  Older documents call this `url`.
    #[serde(default, alias = "url", skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
    /// Canonical watch page, used when the entry cannot be embedded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
}

impl ProgramEntry {
    pub fn new(channel: impl Into<String>, program_name: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            program_name: program_name.into(),
            embed_url: None,
            live_url: None,
        }
    }

    pub fn with_embed_url(mut self, url: impl Into<String>) -> Self {
        self.embed_url = Some(url.into());
        self
    }

    pub fn with_live_url(mut self, url: impl Into<String>) -> Self {
        self.live_url = Some(url.into());
        self
    }

    /// Blank URLs carry no information; store them as absent.
    fn normalized(mut self) -> Self {
        self.embed_url = self.embed_url.filter(|u| !u.trim().is_empty());
        self.live_url = self.live_url.filter(|u| !u.trim().is_empty());
        self
    }
}

/// Programs scheduled for one weekday+hour.  Empty means standby.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slot(Vec<ProgramEntry>);

impl Slot {
    pub fn new(entries: Vec<ProgramEntry>) -> Self {
        Self(entries)
    }

    pub fn entries(&self) -> &[ProgramEntry] {
        &self.0
    }

    pub fn get(&self, idx: usize) -> Option<&ProgramEntry> {
        self.0.get(idx)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProgramEntry> {
        self.0.iter()
    }

    /// Adds a co-airing entry unless an identical one is already present.
    pub fn push_unique(&mut self, entry: ProgramEntry) -> bool {
        if self.0.contains(&entry) {
            return false;
        }
        self.0.push(entry);
        true
    }
}

impl From<Vec<ProgramEntry>> for Slot {
    fn from(entries: Vec<ProgramEntry>) -> Self {
        Self(entries)
    }
}

impl<'a> IntoIterator for &'a Slot {
    type Item = &'a ProgramEntry;
    type IntoIter = std::slice::Iter<'a, ProgramEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ── Schedule ─────────────────────────────────────────────────────────────────

/// Read-only weekly timetable.  Every `(day, hour)` has a slot; absent keys in
/// the source document are empty slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    days: [[Slot; HOURS_PER_DAY as usize]; DAYS_PER_WEEK as usize],
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            days: std::array::from_fn(|_| std::array::from_fn(|_| Slot::default())),
        }
    }
}

/// Slot value as it may appear on the wire: a list (current format) or a
/// bare object (older documents).  `null` is handled by the surrounding
/// `Option`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSlot {
    Many(Vec<ProgramEntry>),
    One(ProgramEntry),
}

type RawTimetable = HashMap<String, Option<HashMap<String, Option<RawSlot>>>>;

impl Schedule {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: RawTimetable = serde_json::from_str(content)?;
        Self::from_raw(raw)
    }

    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        let raw: RawTimetable = serde_json::from_value(value)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawTimetable) -> Result<Self> {
        let mut schedule = Self::default();
        for (day_name, hours) in raw {
            let day =
                Day::from_name(&day_name).ok_or_else(|| TimetableError::UnknownDay(day_name))?;
            let Some(hours) = hours else { continue };
            for (key, value) in hours {
                let hour = Hour::from_key(&key).ok_or_else(|| TimetableError::BadHourKey(key))?;
                let entries = match value {
                    None => Vec::new(),
                    Some(RawSlot::One(entry)) => vec![entry],
                    Some(RawSlot::Many(entries)) => entries,
                };
                let slot = schedule.slot_mut(day, hour);
                for entry in entries {
                    slot.0.push(entry.normalized());
                }
            }
        }
        Ok(schedule)
    }

    pub fn slot(&self, day: Day, hour: Hour) -> &Slot {
        &self.days[day.index()][hour.value() as usize]
    }

    pub fn slot_mut(&mut self, day: Day, hour: Hour) -> &mut Slot {
        &mut self.days[day.index()][hour.value() as usize]
    }

    pub fn set_slot(&mut self, day: Day, hour: Hour, slot: Slot) {
        *self.slot_mut(day, hour) = slot;
    }

    /// Number of non-empty slots across the week.
    pub fn airing_slots(&self) -> usize {
        self.days.iter().flatten().filter(|s| !s.is_empty()).count()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Canonical document: lowercase day names from Monday, every hour key
/// present, every slot a list.
impl Serialize for Schedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        struct DayHours<'a>(&'a [Slot; HOURS_PER_DAY as usize]);

        impl Serialize for DayHours<'_> {
            fn serialize<S: Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for hour in Hour::all() {
                    map.serialize_entry(&hour.key(), &self.0[hour.value() as usize])?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(DAYS_PER_WEEK as usize))?;
        for offset in 1..=DAYS_PER_WEEK as usize {
            let day = Day::from_index(offset);
            map.serialize_entry(day.name(), &DayHours(&self.days[day.index()]))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Schedule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawTimetable::deserialize(deserializer)?;
        Schedule::from_raw(raw).map_err(de::Error::custom)
    }
}
