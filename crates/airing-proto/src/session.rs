//! The evaluation cycle.
//!
//! All cross-cycle state lives in one `SessionState` record that is passed
//! into `evaluate` and handed back out, so a cycle is a pure function of
//! `(moment, schedule, previous state)`:
//!
//! ```text
//!  moment ─▶ current_slot ─▶ ChangeDetector ──unchanged──▶ (state, None)
//!                                  │
//!                               changed
//!                                  ▼
//!              force view + reset selection + next_slot ─▶ (state, Some(plan))
//! ```

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::change::ChangeDetector;
use crate::clock::TimeResolver;
use crate::lookup::{current_slot, disambiguate, next_slot, ActiveProgram, NextSlot, SlotAction};
use crate::schedule::{Moment, Schedule, Slot};
use crate::view::{Trigger, ViewState, ViewStateMachine};

/// Which content view the renderer should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ContentView {
    /// Nothing airing.
    Standby,
    /// A program is playing; `program` keeps its co-airing siblings.
    Live { program: ActiveProgram },
    /// Several programs share the slot and none is picked yet.
    Selection { entries: Slot },
}

/// Everything the renderer needs for one paint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderPlan {
    pub moment: Moment,
    pub slot: Slot,
    pub content: ContentView,
    pub view: ViewState,
    /// `None`: no further programs this week.
    pub next: Option<NextSlot>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    detector: ChangeDetector,
    view: ViewStateMachine,
    active: Option<ActiveProgram>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> ViewState {
        self.view.state()
    }

    pub fn active(&self) -> Option<&ActiveProgram> {
        self.active.as_ref()
    }

    /// Gesture-driven view change.  Returns true if the view flipped.
    pub fn apply(&mut self, trigger: Trigger) -> bool {
        self.view.apply(trigger)
    }

    /// Picks entry `idx` of the current slot.  The resolved slot and the
    /// next-program answer are untouched.  Returns false if there is nothing
    /// at `idx`.
    pub fn select(&mut self, idx: usize) -> bool {
        if let Some(active) = self.active.as_mut() {
            return active.select(idx);
        }
        let Some(slot) = self.detector.last_slot() else {
            return false;
        };
        match ActiveProgram::new(slot.clone(), idx) {
            Some(active) => {
                self.active = Some(active);
                true
            }
            None => false,
        }
    }

    /// Returns a co-airing slot to its selection list.  No-op for single
    /// entry slots.
    pub fn clear_selection(&mut self) -> bool {
        let multi = self.detector.last_slot().is_some_and(|s| s.len() > 1);
        if multi && self.active.is_some() {
            self.active = None;
            return true;
        }
        false
    }

    /// Rebuilds the plan for the last rendered moment without running
    /// change detection.  `None` before the first cycle.
    pub fn plan(&self, schedule: &Schedule) -> Option<RenderPlan> {
        let moment = self.detector.last_moment()?;
        let slot = self.detector.last_slot()?.clone();
        let content = if slot.is_empty() {
            ContentView::Standby
        } else {
            match &self.active {
                Some(program) => ContentView::Live {
                    program: program.clone(),
                },
                None => ContentView::Selection {
                    entries: slot.clone(),
                },
            }
        };
        Some(RenderPlan {
            moment,
            next: next_slot(schedule, moment.day, moment.hour),
            slot,
            content,
            view: self.view.state(),
        })
    }
}

/// One evaluation cycle.  `None` in the output means nothing changed and no
/// state was touched.
pub fn evaluate(
    schedule: &Schedule,
    moment: Moment,
    mut state: SessionState,
) -> (SessionState, Option<RenderPlan>) {
    let slot = current_slot(schedule, moment.day, moment.hour);
    if !state.detector.observe(moment, slot) {
        debug!(%moment, "slot unchanged, skipping render");
        return (state, None);
    }

    match disambiguate(slot) {
        SlotAction::Standby => {
            state.active = None;
            state.view.force_show();
        }
        SlotAction::Direct(_) => {
            state.active = ActiveProgram::new(slot.clone(), 0);
            state.view.force_hide();
        }
        SlotAction::Choose(_) => {
            state.active = None;
            state.view.force_hide();
        }
    }
    debug!(%moment, entries = slot.len(), view = ?state.view.state(), "slot changed");

    let plan = state.plan(schedule);
    (state, plan)
}

/// `evaluate` fed straight from a clock reading.
pub fn evaluate_at<Tz: TimeZone>(
    schedule: &Schedule,
    resolver: &TimeResolver,
    now: &DateTime<Tz>,
    state: SessionState,
) -> (SessionState, Option<RenderPlan>) {
    evaluate(schedule, resolver.resolve(now), state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{Day, Hour, ProgramEntry};

    fn h(n: u32) -> Hour {
        Hour::new(n).unwrap()
    }

    fn schedule() -> Schedule {
        let mut s = Schedule::empty();
        s.set_slot(Day::MONDAY, h(9), Slot::new(vec![ProgramEntry::new("A", "News")]));
        s.set_slot(Day::MONDAY, h(10), Slot::new(vec![ProgramEntry::new("A", "News")]));
        s.set_slot(
            Day::TUESDAY,
            h(14),
            Slot::new(vec![
                ProgramEntry::new("B", "Match"),
                ProgramEntry::new("C", "Match (alt)"),
            ]),
        );
        s
    }

    #[test]
    fn test_first_cycle_always_renders() {
        let (state, plan) = evaluate(&schedule(), Moment::new(Day::MONDAY, h(3)), SessionState::new());
        let plan = plan.expect("first cycle renders");
        assert_eq!(plan.content, ContentView::Standby);
        assert_eq!(state.view(), ViewState::Schedule);
    }

    #[test]
    fn test_repeat_cycle_is_silent() {
        let s = schedule();
        let m = Moment::new(Day::MONDAY, h(9));
        let (state, first) = evaluate(&s, m, SessionState::new());
        assert!(first.is_some());
        let (mut state, second) = evaluate(&s, m, state);
        assert!(second.is_none());

        // A user toggle between cycles survives a silent re-check.
        state.apply(Trigger::Toggle);
        let (state, third) = evaluate(&s, m, state);
        assert!(third.is_none());
        assert_eq!(state.view(), ViewState::Schedule);
    }

    #[test]
    fn test_same_program_next_hour_rerenders() {
        let s = schedule();
        let (state, _) = evaluate(&s, Moment::new(Day::MONDAY, h(9)), SessionState::new());
        let (_, plan) = evaluate(&s, Moment::new(Day::MONDAY, h(10)), state);
        assert!(plan.is_some());
    }

    #[test]
    fn test_live_slot_forces_live_view() {
        let s = schedule();
        let (mut state, _) = evaluate(&s, Moment::new(Day::MONDAY, h(8)), SessionState::new());
        assert_eq!(state.view(), ViewState::Schedule);
        state.apply(Trigger::ForceShow);
        let (state, plan) = evaluate(&s, Moment::new(Day::MONDAY, h(9)), state);
        let plan = plan.unwrap();
        assert_eq!(state.view(), ViewState::Live);
        assert_eq!(plan.view, ViewState::Live);
        match plan.content {
            ContentView::Live { program } => assert_eq!(program.entry().program_name, "News"),
            other => panic!("expected live content, got {other:?}"),
        }
    }

    #[test]
    fn test_selection_then_pick() {
        let s = schedule();
        let m = Moment::new(Day::TUESDAY, h(14));
        let (mut state, plan) = evaluate(&s, m, SessionState::new());
        let plan = plan.unwrap();
        assert!(matches!(plan.content, ContentView::Selection { ref entries } if entries.len() == 2));
        assert_eq!(plan.view, ViewState::Live);

        assert!(!state.select(5));
        assert!(state.select(1));
        let picked = state.plan(&s).unwrap();
        assert_eq!(picked.slot, plan.slot);
        assert_eq!(picked.next, plan.next);
        match &picked.content {
            ContentView::Live { program } => {
                assert_eq!(program.entry().channel, "C");
                assert_eq!(program.siblings().len(), 2);
            }
            other => panic!("expected live content, got {other:?}"),
        }

        // Switch sibling without another lookup.
        assert!(state.select(0));
        assert_eq!(state.active().unwrap().entry().channel, "B");
        assert!(state.clear_selection());
        assert!(matches!(state.plan(&s).unwrap().content, ContentView::Selection { .. }));
    }

    #[test]
    fn test_slot_change_resets_selection() {
        let s = schedule();
        let (mut state, _) = evaluate(&s, Moment::new(Day::TUESDAY, h(14)), SessionState::new());
        state.select(1);
        let (state, _) = evaluate(&s, Moment::new(Day::TUESDAY, h(15)), state);
        assert!(state.active().is_none());
    }

    #[test]
    fn test_plan_before_first_cycle() {
        assert!(SessionState::new().plan(&schedule()).is_none());
        assert!(!SessionState::new().select(0));
    }
}
