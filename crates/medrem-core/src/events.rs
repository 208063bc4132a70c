use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::reminder::{DoseSlot, Reminder};
use crate::schedule::NextReminder;

/// Every state change in the system produces an Event.
/// The CLI prints them as JSON; the poller's sink receives the same data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    ReminderAdded {
        reminder: Reminder,
        at: DateTime<FixedOffset>,
    },
    ReminderUpdated {
        reminder: Reminder,
        at: DateTime<FixedOffset>,
    },
    ReminderRemoved {
        id: i64,
        medicine_name: String,
        at: DateTime<FixedOffset>,
    },
    /// Reminder paused or resumed.
    ReminderToggled {
        id: i64,
        is_active: bool,
        at: DateTime<FixedOffset>,
    },
    /// A dose slot fired.
    DoseDue {
        reminder: Reminder,
        slot_index: usize,
        slot: DoseSlot,
        at: DateTime<FixedOffset>,
    },
    /// Current next-dose projection; `next` is `None` when nothing is scheduled.
    NextReminder {
        next: Option<NextReminder>,
        at: DateTime<FixedOffset>,
    },
}
