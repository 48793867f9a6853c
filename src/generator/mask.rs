// Weekly occupancy bitmask used for O(1) conflict checks during the search.
//
// 5 weekdays x 90 ten-minute slots (07:00-22:00) = 450 bits, stored in 8 u64
// words so that a slot index maps straight to word/bit.

use crate::models::{BlockedTime, MeetingTime};

const SLOTS_PER_DAY: usize = 90;
const DAY_START_MINS: i32 = 7 * 60;
const WORDS: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TimeMask([u64; WORDS]);

impl TimeMask {
    pub const EMPTY: TimeMask = TimeMask([0; WORDS]);

    fn set_slot(&mut self, day: usize, slot: usize) {
        let idx = day * SLOTS_PER_DAY + slot;
        self.0[idx / 64] |= 1u64 << (idx % 64);
    }

    fn set_range(&mut self, day: usize, start_slot: usize, end_slot: usize) {
        for slot in start_slot..end_slot {
            self.set_slot(day, slot);
        }
    }

    /// True if any slot is occupied in both masks.
    pub fn conflicts(&self, other: &TimeMask) -> bool {
        self.0.iter().zip(other.0.iter()).any(|(a, b)| a & b != 0)
    }

    pub fn merge(&self, other: &TimeMask) -> TimeMask {
        let mut out = [0u64; WORDS];
        for (i, word) in out.iter_mut().enumerate() {
            *word = self.0[i] | other.0[i];
        }
        TimeMask(out)
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|w| *w == 0)
    }

    pub fn count_slots(&self) -> u32 {
        self.0.iter().map(|w| w.count_ones()).sum()
    }

    /// Builds the mask for a section's meetings. Meetings whose times are
    /// missing, unparsable or outside 07:00-22:00 are skipped; partial slots
    /// are truncated to the ten-minute grid.
    pub fn from_meetings(meetings: &[MeetingTime]) -> TimeMask {
        let mut mask = TimeMask::EMPTY;
        for mt in meetings {
            let (Some(start), Some(end)) = (time_to_slot(&mt.start_time), time_to_slot(&mt.end_time)) else {
                continue;
            };
            for day in 0..5 {
                if mt.meets_on(day) {
                    mask.set_range(day, start, end);
                }
            }
        }
        mask
    }

    pub fn from_blocked_times(blocked: &[BlockedTime]) -> TimeMask {
        let mut mask = TimeMask::EMPTY;
        for bt in blocked {
            if !(0..5).contains(&bt.day) {
                continue;
            }
            let (Some(start), Some(end)) = (time_to_slot(&bt.start_time), time_to_slot(&bt.end_time)) else {
                continue;
            };
            mask.set_range(bt.day as usize, start, end);
        }
        mask
    }
}

/// Parses `"1030"` or `"10:30"` into minutes after midnight.
pub fn parse_time_to_mins(t: &str) -> Option<i32> {
    let digits = t.trim().replace(':', "");
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

fn time_to_slot(t: &str) -> Option<usize> {
    let mins = parse_time_to_mins(t)?;
    let offset = mins - DAY_START_MINS;
    if offset < 0 {
        return None;
    }
    let slot = (offset / 10) as usize;
    (slot < SLOTS_PER_DAY).then_some(slot)
}
