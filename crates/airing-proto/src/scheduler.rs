//! HourlyScheduler: when to re-run the evaluation cycle.
//!
//! Evaluate once now, wake again a few seconds past the next hour boundary,
//! then every hour after that.  The boundary maths is kept apart from the
//! timer primitive: anything implementing `Scheduler` can drive it.
//!
//! Clock adjustments and suspend/resume after start-up are not compensated;
//! only the first wake is aligned to the wall clock.

use chrono::{DateTime, Duration as ChronoDuration, Local, TimeZone, Timelike};
use std::time::Duration;
use tracing::info;

use crate::config::SchedulerConfig;

pub const DEFAULT_BOUNDARY_OFFSET: Duration = Duration::from_secs(5);
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(3600);

/// Timer primitive used by `HourlyScheduler`.
pub trait Scheduler {
    /// Evaluate immediately.
    fn run_now(&mut self);
    /// Evaluate once at `instant`.
    fn schedule_at(&mut self, instant: DateTime<Local>);
    /// Evaluate every `period`, the first time one `period` after the most
    /// recent `schedule_at` instant.
    fn schedule_every(&mut self, period: Duration);
}

/// `(now.hour + 1):00:00 + offset`.
pub fn next_boundary<Tz: TimeZone>(now: &DateTime<Tz>, offset: Duration) -> DateTime<Tz> {
    let into_hour = ChronoDuration::minutes(now.minute() as i64)
        + ChronoDuration::seconds(now.second() as i64)
        + ChronoDuration::nanoseconds(now.nanosecond() as i64);
    let top_of_hour = now.clone() - into_hour;
    let offset = ChronoDuration::from_std(offset).unwrap_or_else(|_| ChronoDuration::zero());
    top_of_hour + ChronoDuration::hours(1) + offset
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourlyScheduler {
    offset: Duration,
    period: Duration,
}

impl Default for HourlyScheduler {
    fn default() -> Self {
        Self {
            offset: DEFAULT_BOUNDARY_OFFSET,
            period: DEFAULT_PERIOD,
        }
    }
}

impl From<&SchedulerConfig> for HourlyScheduler {
    fn from(cfg: &SchedulerConfig) -> Self {
        Self {
            offset: Duration::from_secs(cfg.boundary_offset_secs),
            // A zero period would spin.
            period: Duration::from_secs(cfg.period_secs.max(1)),
        }
    }
}

impl HourlyScheduler {
    pub fn new(offset: Duration, period: Duration) -> Self {
        Self { offset, period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_wake(&self, now: &DateTime<Local>) -> DateTime<Local> {
        next_boundary(now, self.offset)
    }

    /// Kicks everything off.  With simulated time only the immediate run is
    /// scheduled, since no boundary will ever be crossed.
    pub fn start<S: Scheduler>(&self, now: DateTime<Local>, simulated: bool, timer: &mut S) {
        timer.run_now();
        if simulated {
            info!("simulated time active, periodic re-evaluation disabled");
            return;
        }
        let wake = self.next_wake(&now);
        info!(
            "next evaluation at {}, then every {}s",
            wake.format("%Y-%m-%d %H:%M:%S"),
            self.period.as_secs()
        );
        timer.schedule_at(wake);
        timer.schedule_every(self.period);
    }
}
