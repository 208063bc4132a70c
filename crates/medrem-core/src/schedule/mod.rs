//! Schedule engine: which doses are due and which one comes next.

mod engine;

pub use engine::{
    find_due_slots, find_next, minutes_until, settle_passed_slots, DueDose, DueMode, NextDose,
};

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::reminder::{DoseSlot, Reminder};

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Minute of the day (0..1440), seconds dropped.
pub fn minute_of_day(time: &NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Owned form of [`NextDose`], handed to presentation callbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextReminder {
    pub reminder: Reminder,
    pub slot_index: usize,
    pub slot: DoseSlot,
    pub minutes_until: u32,
}

impl From<NextDose<'_>> for NextReminder {
    fn from(next: NextDose<'_>) -> Self {
        Self {
            reminder: next.reminder.clone(),
            slot_index: next.slot_index,
            slot: next.slot.clone(),
            minutes_until: next.minutes_until,
        }
    }
}
