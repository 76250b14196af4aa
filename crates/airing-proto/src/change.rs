//! ChangeDetector: gates re-rendering on sub-hour re-checks.
//!
//! Slots are compared by value over their ordered entries.  An hour change
//! always counts as a change, even when the same program repeats.

use crate::schedule::{Hour, Moment, Slot};

/// `None` for the previous values means nothing has been rendered yet,
/// which is always a change.
pub fn has_changed(
    previous_slot: Option<&Slot>,
    new_slot: &Slot,
    previous_hour: Option<Hour>,
    new_hour: Hour,
) -> bool {
    match (previous_slot, previous_hour) {
        (Some(prev), Some(hour)) => hour != new_hour || prev != new_slot,
        _ => true,
    }
}

/// The last slot that was handed to the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum Rendered {
    /// Sentinel: cannot equal any real slot, so the first cycle renders.
    #[default]
    Never,
    At { moment: Moment, slot: Slot },
}

#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
    last: Rendered,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compares against the last rendered slot.  The day takes part in the
    /// comparison alongside the hour.
    pub fn is_changed(&self, moment: Moment, slot: &Slot) -> bool {
        match &self.last {
            Rendered::Never => true,
            Rendered::At {
                moment: prev_moment,
                slot: prev_slot,
            } => {
                prev_moment.day != moment.day
                    || has_changed(Some(prev_slot), slot, Some(prev_moment.hour), moment.hour)
            }
        }
    }

    /// Records `slot` as rendered if it differs from the last one.
    /// Returns whether it did; an unchanged slot leaves the detector as is.
    pub fn observe(&mut self, moment: Moment, slot: &Slot) -> bool {
        if !self.is_changed(moment, slot) {
            return false;
        }
        self.last = Rendered::At {
            moment,
            slot: slot.clone(),
        };
        true
    }

    pub fn last_moment(&self) -> Option<Moment> {
        match &self.last {
            Rendered::Never => None,
            Rendered::At { moment, .. } => Some(*moment),
        }
    }

    pub fn last_slot(&self) -> Option<&Slot> {
        match &self.last {
            Rendered::Never => None,
            Rendered::At { slot, .. } => Some(slot),
        }
    }
}
