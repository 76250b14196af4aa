//! Weekly-timetable "on air now" engine.
//!
//! Leaves first: `clock` turns a reading into a moment, `schedule` holds the
//! timetable, `lookup` finds the current and next slot, `change` gates
//! re-rendering, `view` tracks which view is up, `session` runs one
//! evaluation cycle over all of them and `scheduler` decides when the next
//! cycle happens.

pub mod builder;
pub mod change;
pub mod clock;
pub mod config;
pub mod error;
pub mod input;
pub mod lookup;
pub mod platform;
pub mod protocol;
pub mod render;
pub mod schedule;
pub mod scheduler;
pub mod session;
pub mod state;
pub mod timetable;
pub mod view;
