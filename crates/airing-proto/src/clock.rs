//! TimeResolver: maps a clock reading to a `(day, hour)` moment.
//!
//! A simulated time ("HHMM") pins the reading to that minute of the current
//! date.  Invalid simulated values are ignored and the live clock is used.

use chrono::{DateTime, Datelike, Duration, Local, Offset, TimeZone, Timelike};
use regex::Regex;
use tracing::warn;

use crate::schedule::{Day, Hour, Moment};

/// Source of wall-clock readings.  Swapped for a fixed clock in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// Simulated wall-clock time parsed from a 4-digit `HHMM` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedTime {
    hour: u32,
    minute: u32,
}

impl SimulatedTime {
    /// Accepts `^[0-2][0-9][0-5][0-9]$` with an hour of at most 23.
    pub fn parse(param: &str) -> Option<Self> {
        let well_formed = Regex::new(r"^[0-2][0-9][0-5][0-9]$")
            .map(|re| re.is_match(param))
            .unwrap_or(false);
        if !well_formed {
            return None;
        }
        let hour: u32 = param[..2].parse().ok()?;
        let minute: u32 = param[2..].parse().ok()?;
        (hour < 24).then_some(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// Moves `now` to HH:MM:00.000 on the same local date.
    pub fn apply<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let tz = now.timezone();
        let Some(naive) = now.date_naive().and_hms_opt(self.hour, self.minute, 0) else {
            return now.clone();
        };
        match tz.from_local_datetime(&naive).earliest() {
            Some(t) => t,
            // Nonexistent local time (DST gap): keep the current offset.
            None => {
                let offset = now.offset().fix().local_minus_utc() as i64;
                tz.from_utc_datetime(&(naive - Duration::seconds(offset)))
            }
        }
    }
}

/// Resolves clock readings into schedule moments.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeResolver {
    simulated: Option<SimulatedTime>,
}

impl TimeResolver {
    pub fn live() -> Self {
        Self { simulated: None }
    }

    pub fn simulated(time: SimulatedTime) -> Self {
        Self {
            simulated: Some(time),
        }
    }

    /// Builds a resolver from an optional external parameter.  Anything that
    /// does not parse falls back to the live clock.
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::trim).filter(|p| !p.is_empty()) {
            None => Self::live(),
            Some(p) => match SimulatedTime::parse(p) {
                Some(t) => Self::simulated(t),
                None => {
                    warn!("ignoring invalid simulated time {:?}, using live clock", p);
                    Self::live()
                }
            },
        }
    }

    /// True when readings are pinned; periodic re-evaluation must be off.
    pub fn is_simulated(&self) -> bool {
        self.simulated.is_some()
    }

    pub fn simulated_time(&self) -> Option<SimulatedTime> {
        self.simulated
    }

    /// The effective reading: simulated if set, otherwise `now` verbatim.
    pub fn reading<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        match &self.simulated {
            Some(t) => t.apply(now),
            None => now.clone(),
        }
    }

    pub fn resolve<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Moment {
        moment_at(&self.reading(now))
    }

    pub fn resolve_with(&self, clock: &dyn Clock) -> Moment {
        self.resolve(&clock.now())
    }
}

/// The weekly grid coordinate containing `t`.
pub fn moment_at<Tz: TimeZone>(t: &DateTime<Tz>) -> Moment {
    let day = Day::from_chrono(t.weekday());
    // `hour()` is always < 24.
    let hour = Hour::new(t.hour()).unwrap_or_default();
    Moment::new(day, hour)
}
