//! Due detection and next-dose projection.
//!
//! Both operations are pure: they read a slice of reminders and an instant,
//! and never mutate. Stamping `last_triggered` after a firing is the
//! caller's job (see [`crate::scheduler::SchedulerService::check_due`]).

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{minute_of_day, MINUTES_PER_DAY};
use crate::reminder::{DoseSlot, Reminder};

/// How a slot's time is compared against the current minute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DueMode {
    /// Due once the slot's time has been reached today and it has not fired
    /// today. A check that lands late still fires.
    #[default]
    CatchUp,
    /// Due only during the exact minute of the slot's time.
    ExactMinute,
}

/// A slot that should fire now.
#[derive(Debug, Clone, Copy)]
pub struct DueDose<'a> {
    pub reminder: &'a Reminder,
    pub slot_index: usize,
    pub slot: &'a DoseSlot,
}

/// The closest upcoming slot.
#[derive(Debug, Clone, Copy)]
pub struct NextDose<'a> {
    pub reminder: &'a Reminder,
    pub slot_index: usize,
    pub slot: &'a DoseSlot,
    /// 0 means due this very minute.
    pub minutes_until: u32,
}

/// Slots of active reminders that are due at `now`.
///
/// A slot already triggered on `now`'s calendar date is never due again that
/// day. Calendar dates are compared in `now`'s time zone.
pub fn find_due_slots<'a, Tz: TimeZone>(
    reminders: &'a [Reminder],
    now: &DateTime<Tz>,
    mode: DueMode,
) -> Vec<DueDose<'a>> {
    let now_minute = minute_of_day(&now.time());
    let today = now.date_naive();
    let tz = now.timezone();

    let mut due = Vec::new();
    for reminder in reminders.iter().filter(|r| r.is_active) {
        for (slot_index, slot) in reminder.timed_slots() {
            let Some(slot_minute) = slot.minute_of_day() else {
                continue;
            };
            let reached = match mode {
                DueMode::ExactMinute => slot_minute == now_minute,
                DueMode::CatchUp => slot_minute <= now_minute,
            };
            if !reached {
                continue;
            }
            let fired_today = slot
                .last_triggered
                .is_some_and(|last| last.with_timezone(&tz).date_naive() == today);
            if !fired_today {
                due.push(DueDose {
                    reminder,
                    slot_index,
                    slot,
                });
            }
        }
    }
    due
}

/// The timed slot of an active reminder that fires soonest after `now`.
///
/// Slots whose time already passed today wrap to tomorrow. Ties keep the
/// first slot in iteration order.
pub fn find_next<'a, Tz: TimeZone>(reminders: &'a [Reminder], now: &DateTime<Tz>) -> Option<NextDose<'a>> {
    let now_minute = minute_of_day(&now.time());

    let mut best: Option<NextDose<'a>> = None;
    for reminder in reminders.iter().filter(|r| r.is_active) {
        for (slot_index, slot) in reminder.timed_slots() {
            let Some(slot_minute) = slot.minute_of_day() else {
                continue;
            };
            let minutes_until = minutes_until(slot_minute, now_minute);
            if best.map_or(true, |b| minutes_until < b.minutes_until) {
                best = Some(NextDose {
                    reminder,
                    slot_index,
                    slot,
                    minutes_until,
                });
            }
        }
    }
    best
}

/// Stamp the timed slots whose minute is already behind `now`, so a newly
/// created or edited reminder does not fire for a time of day that passed
/// before it existed. The slot of the current minute is left due.
pub fn settle_passed_slots<Tz: TimeZone>(reminder: &mut Reminder, now: &DateTime<Tz>) {
    let now_minute = minute_of_day(&now.time());
    let stamp = now.with_timezone(&Utc);
    for slot in &mut reminder.schedule {
        if slot.minute_of_day().is_some_and(|m| m < now_minute) {
            slot.mark_triggered(stamp);
        }
    }
}

/// Minutes from `now_minute` forward to `slot_minute`, wrapping at midnight.
pub fn minutes_until(slot_minute: u32, now_minute: u32) -> u32 {
    (slot_minute + MINUTES_PER_DAY - now_minute % MINUTES_PER_DAY) % MINUTES_PER_DAY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::{DosePeriod, Frequency, MealTiming};
    use chrono::{Duration, NaiveDate, NaiveTime, Utc};

    fn reminder(id: i64, times: &[(u32, u32)]) -> Reminder {
        Reminder {
            id,
            medicine_name: format!("med-{id}"),
            dosage: "1 tab".into(),
            frequency: Frequency::OnceDaily,
            schedule: times
                .iter()
                .map(|&(h, m)| {
                    DoseSlot::new(
                        DosePeriod::Morning,
                        MealTiming::Anytime,
                        NaiveTime::from_hms_opt(h, m, 0),
                    )
                })
                .collect(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: None,
            notes: String::new(),
            is_active: true,
        }
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, h, m, s).unwrap()
    }

    #[test]
    fn next_wraps_past_slots_to_tomorrow() {
        let reminders = vec![reminder(1, &[(8, 0), (20, 0)])];
        let next = find_next(&reminders, &at(9, 0, 0)).unwrap();
        assert_eq!(next.slot_index, 1);
        assert_eq!(next.minutes_until, 660);
    }

    #[test]
    fn next_is_zero_during_the_slot_minute() {
        let reminders = vec![reminder(1, &[(8, 0)])];
        let next = find_next(&reminders, &at(8, 0, 42)).unwrap();
        assert_eq!(next.minutes_until, 0);
    }

    #[test]
    fn next_ignores_paused_and_untimed() {
        let mut paused = reminder(1, &[(8, 0)]);
        paused.is_active = false;
        let mut untimed = reminder(2, &[(9, 0)]);
        untimed.schedule[0].specific_time = None;

        assert!(find_next(&[paused, untimed], &at(7, 0, 0)).is_none());
        assert!(find_next(&[], &at(7, 0, 0)).is_none());
    }

    #[test]
    fn next_ties_keep_first_encountered() {
        let reminders = vec![reminder(1, &[(12, 0)]), reminder(2, &[(12, 0)])];
        let next = find_next(&reminders, &at(11, 0, 0)).unwrap();
        assert_eq!(next.reminder.id, 1);
    }

    #[test]
    fn exact_minute_fires_only_on_match() {
        let reminders = vec![reminder(1, &[(8, 0)])];
        assert_eq!(
            find_due_slots(&reminders, &at(8, 0, 30), DueMode::ExactMinute).len(),
            1
        );
        assert!(find_due_slots(&reminders, &at(8, 1, 0), DueMode::ExactMinute).is_empty());
        assert!(find_due_slots(&reminders, &at(7, 59, 59), DueMode::ExactMinute).is_empty());
    }

    #[test]
    fn catch_up_fires_after_the_slot_time() {
        let reminders = vec![reminder(1, &[(8, 0), (20, 0)])];
        let due = find_due_slots(&reminders, &at(9, 15, 0), DueMode::CatchUp);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].slot_index, 0);
    }

    #[test]
    fn stamped_slot_does_not_fire_again_same_day() {
        let mut reminders = vec![reminder(1, &[(8, 0)])];
        reminders[0].schedule[0].mark_triggered(at(8, 0, 5));

        for mode in [DueMode::ExactMinute, DueMode::CatchUp] {
            assert!(find_due_slots(&reminders, &at(8, 0, 50), mode).is_empty());
        }
        assert!(find_due_slots(&reminders, &at(23, 0, 0), DueMode::CatchUp).is_empty());
    }

    #[test]
    fn stamp_from_yesterday_does_not_block() {
        let mut reminders = vec![reminder(1, &[(8, 0)])];
        reminders[0].schedule[0].mark_triggered(at(8, 0, 5) - Duration::days(1));
        assert_eq!(
            find_due_slots(&reminders, &at(8, 0, 0), DueMode::ExactMinute).len(),
            1
        );
    }

    #[test]
    fn stamp_date_is_read_in_local_offset() {
        use chrono::FixedOffset;

        // 23:30 UTC on the 9th is 01:30 on the 10th at UTC+2.
        let mut reminders = vec![reminder(1, &[(1, 30)])];
        reminders[0].schedule[0]
            .mark_triggered(Utc.with_ymd_and_hms(2024, 6, 9, 23, 30, 0).unwrap());

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = plus_two.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap();
        assert!(find_due_slots(&reminders, &now, DueMode::CatchUp).is_empty());
    }

    #[test]
    fn paused_reminders_never_fire() {
        let mut reminders = vec![reminder(1, &[(8, 0)])];
        reminders[0].is_active = false;
        assert!(find_due_slots(&reminders, &at(8, 0, 0), DueMode::ExactMinute).is_empty());
    }

    #[test]
    fn settling_stamps_only_slots_already_behind() {
        let mut r = reminder(1, &[(8, 0), (12, 0), (20, 0)]);
        settle_passed_slots(&mut r, &at(12, 0, 10));
        assert_eq!(r.schedule[0].last_triggered, Some(at(12, 0, 10)));
        assert_eq!(r.schedule[1].last_triggered, None);
        assert_eq!(r.schedule[2].last_triggered, None);

        let reminders = vec![r];
        let due = find_due_slots(&reminders, &at(12, 0, 20), DueMode::CatchUp);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].slot_index, 1);

        let tomorrow = at(8, 0, 0) + Duration::days(1);
        let due = find_due_slots(&reminders, &tomorrow, DueMode::CatchUp);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].slot_index, 0);
    }

    #[test]
    fn minutes_until_wraps() {
        assert_eq!(minutes_until(0, 1439), 1);
        assert_eq!(minutes_until(600, 600), 0);
        assert_eq!(minutes_until(599, 600), 1439);
    }
}
