//! Human-readable rendering of reminders, slots and countdowns.

use chrono::{NaiveTime, Timelike};

use crate::reminder::{DoseSlot, Reminder};

/// 12-hour clock, e.g. `8:05 AM`, `12:30 PM`.
pub fn format_time(time: &NaiveTime) -> String {
    let (pm, hour) = time.hour12();
    format!("{}:{:02} {}", hour, time.minute(), if pm { "PM" } else { "AM" })
}

/// `Morning at 8:00 AM (Before Meal)`; the time part is left out for untimed slots.
pub fn describe_slot(slot: &DoseSlot) -> String {
    match &slot.specific_time {
        Some(t) => format!("{} at {} ({})", slot.time, format_time(t), slot.meal),
        None => format!("{} ({})", slot.time, slot.meal),
    }
}

/// All slots of a reminder, comma separated.
pub fn describe_schedule(reminder: &Reminder) -> String {
    reminder
        .schedule
        .iter()
        .map(describe_slot)
        .collect::<Vec<_>>()
        .join(", ")
}

/// `in 11h 0m`.
pub fn format_countdown(minutes_until: u32) -> String {
    format!("in {}h {}m", minutes_until / 60, minutes_until % 60)
}
