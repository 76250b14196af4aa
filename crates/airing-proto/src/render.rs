//! Render frames: the rendering surface expressed as data.
//!
//! A `RenderFrame` is built from a `RenderPlan` and holds everything a
//! painter needs: which content view, the 7×24 grid with the current cell
//! marked, and the "next program" line.  Painting itself is up to the
//! consumer.

use serde::{Deserialize, Serialize};

use crate::lookup::{EmbedPolicy, NextSlot, PlaybackTarget};
use crate::schedule::{Day, Hour, Moment, ProgramEntry, Schedule};
use crate::session::{ContentView, RenderPlan};

pub const NO_FURTHER_PROGRAMS: &str = "No further programs this week.";
pub const STANDBY_MESSAGE: &str = "Nothing on air right now.";

/// One playable entry as offered to the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub index: usize,
    pub channel: String,
    pub program_name: String,
    pub target: PlaybackTarget,
}

impl Choice {
    fn new(index: usize, entry: &ProgramEntry, policy: &EmbedPolicy) -> Self {
        Self {
            index,
            channel: entry.channel.clone(),
            program_name: entry.program_name.clone(),
            target: policy.target(entry),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ContentFrame {
    Live {
        playing: Choice,
        /// Co-airing entries the viewer can switch to.
        alternatives: Vec<Choice>,
    },
    Standby {
        message: String,
    },
    Selection {
        choices: Vec<Choice>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridProgram {
    pub channel: String,
    pub program_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    pub day: Day,
    pub programs: Vec<GridProgram>,
    pub current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRow {
    pub hour: Hour,
    pub cells: Vec<GridCell>,
}

/// 24 rows × 7 columns, Sunday first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleGrid {
    pub rows: Vec<GridRow>,
}

impl ScheduleGrid {
    pub fn build(schedule: &Schedule, current: Option<Moment>) -> Self {
        let rows = Hour::all()
            .map(|hour| GridRow {
                hour,
                cells: Day::all()
                    .map(|day| GridCell {
                        day,
                        programs: schedule
                            .slot(day, hour)
                            .iter()
                            .map(|e| GridProgram {
                                channel: e.channel.clone(),
                                program_name: e.program_name.clone(),
                            })
                            .collect(),
                        current: current == Some(Moment::new(day, hour)),
                    })
                    .collect(),
            })
            .collect();
        Self { rows }
    }

    pub fn current_cell(&self) -> Option<&GridCell> {
        self.rows.iter().flat_map(|r| &r.cells).find(|c| c.current)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub moment: Moment,
    pub schedule_visible: bool,
    pub content: ContentFrame,
    pub next: Option<NextSlot>,
    pub next_summary: String,
    pub grid: ScheduleGrid,
}

impl RenderFrame {
    pub fn build(plan: &RenderPlan, schedule: &Schedule, policy: &EmbedPolicy) -> Self {
        let content = match &plan.content {
            ContentView::Standby => ContentFrame::Standby {
                message: STANDBY_MESSAGE.to_string(),
            },
            ContentView::Live { program } => ContentFrame::Live {
                playing: Choice::new(program.selected(), program.entry(), policy),
                alternatives: program
                    .alternatives()
                    .map(|(i, e)| Choice::new(i, e, policy))
                    .collect(),
            },
            ContentView::Selection { entries } => ContentFrame::Selection {
                choices: entries
                    .iter()
                    .enumerate()
                    .map(|(i, e)| Choice::new(i, e, policy))
                    .collect(),
            },
        };

        Self {
            moment: plan.moment,
            schedule_visible: plan.view.schedule_visible(),
            content,
            next_summary: next_summary(plan.moment, plan.next.as_ref()),
            next: plan.next.clone(),
            grid: ScheduleGrid::build(schedule, Some(plan.moment)),
        }
    }
}

/// `"HH:00 - channel - program"`, prefixed with the day when it is not
/// today, or the terminal message when nothing else airs this week.
pub fn next_summary(now: Moment, next: Option<&NextSlot>) -> String {
    let Some(next) = next else {
        return NO_FURTHER_PROGRAMS.to_string();
    };
    let programs = next
        .programs
        .iter()
        .map(|e| format!("{} - {}", e.channel, e.program_name))
        .collect::<Vec<_>>()
        .join(" / ");
    if next.day == now.day {
        format!("{} - {}", next.hour, programs)
    } else {
        format!("{} {} - {}", capitalize(next.day.name()), next.hour, programs)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Slot;
    use crate::session::{evaluate, SessionState};

    fn h(n: u32) -> Hour {
        Hour::new(n).unwrap()
    }

    fn schedule() -> Schedule {
        let mut s = Schedule::empty();
        s.set_slot(
            Day::MONDAY,
            h(9),
            Slot::new(vec![ProgramEntry::new("A", "News").with_embed_url("https://e/a")]),
        );
        s.set_slot(
            Day::MONDAY,
            h(21),
            Slot::new(vec![ProgramEntry::new("B", "Late"), ProgramEntry::new("C", "Film")]),
        );
        s
    }

    #[test]
    fn test_next_summary_formats() {
        let s = schedule();
        let now = Moment::new(Day::MONDAY, h(9));
        let next = crate::lookup::next_slot(&s, now.day, now.hour);
        assert_eq!(next_summary(now, next.as_ref()), "21:00 - B - Late / C - Film");

        let sunday = Moment::new(Day::SUNDAY, h(22));
        let next = crate::lookup::next_slot(&s, sunday.day, sunday.hour);
        assert_eq!(next_summary(sunday, next.as_ref()), "Monday 09:00 - A - News");

        assert_eq!(next_summary(sunday, None), NO_FURTHER_PROGRAMS);
    }

    #[test]
    fn test_frame_live_with_grid_highlight() {
        let s = schedule();
        let now = Moment::new(Day::MONDAY, h(9));
        let (_, plan) = evaluate(&s, now, SessionState::new());
        let frame = RenderFrame::build(&plan.unwrap(), &s, &EmbedPolicy::new(Vec::new(), false));

        assert!(!frame.schedule_visible);
        match &frame.content {
            ContentFrame::Live { playing, alternatives } => {
                assert_eq!(playing.program_name, "News");
                assert_eq!(playing.target, PlaybackTarget::Embed { url: "https://e/a".into() });
                assert!(alternatives.is_empty());
            }
            other => panic!("unexpected content {other:?}"),
        }

        assert_eq!(frame.grid.rows.len(), 24);
        assert!(frame.grid.rows.iter().all(|r| r.cells.len() == 7));
        let cell = frame.grid.current_cell().unwrap();
        assert_eq!(cell.day, Day::MONDAY);
        assert_eq!(cell.programs[0].program_name, "News");
        assert_eq!(frame.grid.rows.iter().flat_map(|r| &r.cells).filter(|c| c.current).count(), 1);
    }

    #[test]
    fn test_frame_selection_lists_unavailable_entries() {
        let s = schedule();
        let (_, plan) = evaluate(&s, Moment::new(Day::MONDAY, h(21)), SessionState::new());
        let frame = RenderFrame::build(&plan.unwrap(), &s, &EmbedPolicy::default());
        match frame.content {
            ContentFrame::Selection { choices } => {
                assert_eq!(choices.len(), 2);
                assert!(choices.iter().all(|c| c.target == PlaybackTarget::Unavailable));
            }
            other => panic!("unexpected content {other:?}"),
        }
        // Monday 09:00 is earlier the same day, so the week is exhausted.
        assert!(frame.next.is_none());
        assert_eq!(frame.next_summary, NO_FURTHER_PROGRAMS);
    }
}
