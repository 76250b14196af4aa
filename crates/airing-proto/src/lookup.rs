//! ProgramLookup: current slot, next slot, and what to do with a slot.

use serde::{Deserialize, Serialize};

use crate::schedule::{Day, Hour, ProgramEntry, Schedule, Slot, DAYS_PER_WEEK};

/// The slot at `(day, hour)`.  Missing keys are empty slots.
pub fn current_slot(schedule: &Schedule, day: Day, hour: Hour) -> &Slot {
    schedule.slot(day, hour)
}

/// The first non-empty slot strictly after `(day, hour)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextSlot {
    pub day: Day,
    pub hour: Hour,
    pub programs: Slot,
}

/// Forward search for the next airing slot.
///
/// Scans the rest of `day`, then the six following days (wrapping past
/// Saturday) from midnight.  The scan stops before coming back round to
/// `day`, so today's earlier hours are never returned.  `None` is the
/// terminal "nothing further this week" answer.
pub fn next_slot(schedule: &Schedule, day: Day, hour: Hour) -> Option<NextSlot> {
    let found = |d: Day, h: Hour| {
        let slot = schedule.slot(d, h);
        (!slot.is_empty()).then(|| NextSlot {
            day: d,
            hour: h,
            programs: slot.clone(),
        })
    };

    if let Some(next) = Hour::all()
        .filter(|h| *h > hour)
        .find_map(|h| found(day, h))
    {
        return Some(next);
    }

    (1..DAYS_PER_WEEK as usize)
        .map(|offset| Day::from_index(day.index() + offset))
        .find_map(|d| Hour::all().find_map(|h| found(d, h)))
}

// ── Disambiguation ───────────────────────────────────────────────────────────

/// How a resolved slot should be presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotAction {
    /// Nothing airing: placeholder view.
    Standby,
    /// Exactly one program: play it.
    Direct(ProgramEntry),
    /// Several co-airing programs: the viewer picks one.
    Choose(Slot),
}

pub fn disambiguate(slot: &Slot) -> SlotAction {
    match slot.entries() {
        [] => SlotAction::Standby,
        [only] => SlotAction::Direct(only.clone()),
        _ => SlotAction::Choose(slot.clone()),
    }
}

/// The entry being watched plus the slot it came from, so the viewer can
/// hop between co-airing programs without another lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveProgram {
    siblings: Slot,
    selected: usize,
}

impl ActiveProgram {
    /// `None` if `selected` is out of range (which includes empty slots).
    pub fn new(siblings: Slot, selected: usize) -> Option<Self> {
        (selected < siblings.len()).then_some(Self { siblings, selected })
    }

    pub fn entry(&self) -> &ProgramEntry {
        // `selected` is validated on construction and on every `select`.
        &self.siblings.entries()[self.selected]
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn siblings(&self) -> &Slot {
        &self.siblings
    }

    /// Co-airing entries other than the selected one, with their indices.
    pub fn alternatives(&self) -> impl Iterator<Item = (usize, &ProgramEntry)> {
        self.siblings
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != self.selected)
    }

    /// Switches to another sibling.  Returns false if `idx` is out of range.
    pub fn select(&mut self, idx: usize) -> bool {
        if idx >= self.siblings.len() {
            return false;
        }
        self.selected = idx;
        true
    }
}

// ── Embed policy ─────────────────────────────────────────────────────────────

/// Where the player should point for a given entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlaybackTarget {
    /// Embed the player in place.
    Embed { url: String },
    /// Embedding is not allowed; offer a link that opens elsewhere.
    External { url: String },
    /// No URL at all; the entry is listed but cannot be played.
    Unavailable,
}

/// Channels that refuse embedding, and URL tweaks applied to embeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbedPolicy {
    external_only: Vec<String>,
    autoplay: bool,
}

impl EmbedPolicy {
    pub fn new(external_only: impl IntoIterator<Item = String>, autoplay: bool) -> Self {
        Self {
            external_only: external_only
                .into_iter()
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty())
                .collect(),
            autoplay,
        }
    }

    pub fn is_external_only(&self, channel: &str) -> bool {
        let channel = channel.trim().to_lowercase();
        self.external_only.iter().any(|c| *c == channel)
    }

    pub fn target(&self, entry: &ProgramEntry) -> PlaybackTarget {
        let restricted = self.is_external_only(&entry.channel);
        match (&entry.embed_url, &entry.live_url) {
            (Some(embed), _) if !restricted => PlaybackTarget::Embed {
                url: self.embed_src(embed),
            },
            (_, Some(live)) => PlaybackTarget::External { url: live.clone() },
            (Some(embed), None) => PlaybackTarget::External {
                url: embed.clone(),
            },
            (None, None) => PlaybackTarget::Unavailable,
        }
    }

    fn embed_src(&self, url: &str) -> String {
        if !self.autoplay || url.contains("autoplay=") {
            return url.to_string();
        }
        let sep = if url.contains('?') { '&' } else { '?' };
        format!("{url}{sep}autoplay=1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(n: u32) -> Hour {
        Hour::new(n).unwrap()
    }

    fn one(channel: &str, name: &str) -> Slot {
        Slot::new(vec![ProgramEntry::new(channel, name)])
    }

    #[test]
    fn test_current_slot_absent_is_standby() {
        let schedule = Schedule::empty();
        for day in Day::all() {
            for hour in Hour::all() {
                assert!(current_slot(&schedule, day, hour).is_empty());
            }
        }
    }

    #[test]
    fn test_next_slot_same_day_first() {
        let mut s = Schedule::empty();
        s.set_slot(Day::MONDAY, h(9), one("A", "News"));
        s.set_slot(Day::MONDAY, h(12), one("B", "Noon"));
        s.set_slot(Day::MONDAY, h(20), one("C", "Late"));

        let next = next_slot(&s, Day::MONDAY, h(9)).unwrap();
        assert_eq!((next.day, next.hour), (Day::MONDAY, h(12)));
        assert_eq!(next.programs.entries()[0].program_name, "Noon");
    }

    #[test]
    fn test_next_slot_skips_current_hour() {
        let mut s = Schedule::empty();
        s.set_slot(Day::MONDAY, h(9), one("A", "News"));
        s.set_slot(Day::TUESDAY, h(9), one("A", "News"));
        let next = next_slot(&s, Day::MONDAY, h(9)).unwrap();
        assert_eq!((next.day, next.hour), (Day::TUESDAY, h(9)));
    }

    #[test]
    fn test_next_slot_wraps_saturday_to_sunday() {
        let mut s = Schedule::empty();
        s.set_slot(Day::SUNDAY, h(6), one("A", "Morning"));
        s.set_slot(Day::WEDNESDAY, h(1), one("B", "Later"));
        let next = next_slot(&s, Day::SATURDAY, h(23)).unwrap();
        assert_eq!((next.day, next.hour), (Day::SUNDAY, h(6)));
    }

    #[test]
    fn test_next_slot_does_not_revisit_earlier_hours_today() {
        let mut s = Schedule::empty();
        s.set_slot(Day::FRIDAY, h(8), one("A", "Only"));
        assert!(next_slot(&s, Day::FRIDAY, h(10)).is_none());
        assert!(next_slot(&s, Day::FRIDAY, h(8)).is_none());
        let from_thursday = next_slot(&s, Day::THURSDAY, h(23)).unwrap();
        assert_eq!(from_thursday.day, Day::FRIDAY);
    }

    #[test]
    fn test_next_slot_empty_week() {
        let s = Schedule::empty();
        assert!(next_slot(&s, Day::WEDNESDAY, h(0)).is_none());
    }

    #[test]
    fn test_next_slot_is_earliest_in_wraparound_order() {
        let mut s = Schedule::empty();
        let slots = [
            (Day::TUESDAY, 3),
            (Day::THURSDAY, 22),
            (Day::SUNDAY, 0),
            (Day::SATURDAY, 5),
        ];
        for (d, hour) in slots {
            s.set_slot(d, h(hour), one("X", "P"));
        }
        // Brute-force reference: walk hour by hour through the following week.
        for start_day in Day::all() {
            for start_hour in Hour::all() {
                let start = start_day.index() * 24 + start_hour.value() as usize;
                let expected = (1..7 * 24).map(|i| start + i).find_map(|abs| {
                    let d = Day::from_index(abs / 24);
                    let hr = h((abs % 24) as u32);
                    (!s.slot(d, hr).is_empty() && !(d == start_day && hr <= start_hour))
                        .then_some((d, hr))
                });
                let got = next_slot(&s, start_day, start_hour).map(|n| (n.day, n.hour));
                assert_eq!(got, expected, "from {start_day} {start_hour}");
            }
        }
    }

    #[test]
    fn test_disambiguate() {
        assert_eq!(disambiguate(&Slot::default()), SlotAction::Standby);
        assert!(matches!(disambiguate(&one("A", "News")), SlotAction::Direct(e) if e.channel == "A"));
        let two = Slot::new(vec![
            ProgramEntry::new("A", "Match"),
            ProgramEntry::new("B", "Match"),
        ]);
        assert!(matches!(disambiguate(&two), SlotAction::Choose(s) if s.len() == 2));
    }

    #[test]
    fn test_active_program_keeps_siblings() {
        let slot = Slot::new(vec![
            ProgramEntry::new("A", "Match"),
            ProgramEntry::new("B", "Match"),
            ProgramEntry::new("C", "Talk"),
        ]);
        assert!(ActiveProgram::new(slot.clone(), 3).is_none());
        assert!(ActiveProgram::new(Slot::default(), 0).is_none());

        let mut active = ActiveProgram::new(slot.clone(), 1).unwrap();
        assert_eq!(active.entry().channel, "B");
        let others: Vec<usize> = active.alternatives().map(|(i, _)| i).collect();
        assert_eq!(others, vec![0, 2]);

        assert!(active.select(2));
        assert_eq!(active.entry().channel, "C");
        assert!(!active.select(9));
        assert_eq!(active.selected(), 2);
        assert_eq!(active.siblings(), &slot);
    }

    #[test]
    fn test_embed_policy_targets() {
        let policy = EmbedPolicy::new(vec!["Restricted TV".to_string()], true);

        let embeddable = ProgramEntry::new("A", "News").with_embed_url("https://e/1");
        assert_eq!(
            policy.target(&embeddable),
            PlaybackTarget::Embed { url: "https://e/1?autoplay=1".into() }
        );

        let query = ProgramEntry::new("A", "News").with_embed_url("https://e/1?x=2");
        assert_eq!(
            policy.target(&query),
            PlaybackTarget::Embed { url: "https://e/1?x=2&autoplay=1".into() }
        );

        let restricted = ProgramEntry::new("restricted tv", "Show")
            .with_embed_url("https://e/2")
            .with_live_url("https://watch/2");
        assert_eq!(
            policy.target(&restricted),
            PlaybackTarget::External { url: "https://watch/2".into() }
        );

        let restricted_no_live = ProgramEntry::new("Restricted TV", "Show").with_embed_url("https://e/3");
        assert_eq!(
            policy.target(&restricted_no_live),
            PlaybackTarget::External { url: "https://e/3".into() }
        );

        let link_only = ProgramEntry::new("B", "Show").with_live_url("https://watch/4");
        assert!(matches!(policy.target(&link_only), PlaybackTarget::External { .. }));

        assert_eq!(policy.target(&ProgramEntry::new("C", "Bare")), PlaybackTarget::Unavailable);
    }
}
