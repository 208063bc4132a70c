//! Due checks and the next-dose projection from the command line.

use chrono::Local;
use medrem_core::display::{format_countdown, format_time};
use medrem_core::{
    Config, DoseSlot, Event, NextReminder, NullSink, Poller, PollerConfig, Reminder, ReminderSink,
};
use std::io::Write;
use std::sync::{Arc, Mutex};

use super::{open_service, print_json};

/// `Metformin - 500mg at 8:00 AM (After Meal), in 11h 0m`.
fn next_line(next: &NextReminder) -> String {
    let when = match &next.slot.specific_time {
        Some(t) => format!("at {} ({})", format_time(t), next.slot.meal),
        None => format!("({})", next.slot.meal),
    };
    format!(
        "{} {}, {}",
        next.reminder.title(),
        when,
        format_countdown(next.minutes_until)
    )
}

pub fn next(plain: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let service = open_service(&config, Arc::new(NullSink))?;
    let next = service.next_reminder();

    if plain {
        match &next {
            Some(n) => println!("{}", next_line(n)),
            None => println!("No upcoming doses."),
        }
        return Ok(());
    }
    print_json(&Event::NextReminder {
        next,
        at: service.now(),
    })
}

/// One due-check pass. Due doses print as JSON lines, even when the stamps
/// could not be saved.
pub fn check() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut service = open_service(&config, Arc::new(StdoutSink::default()))?;
    service.check_due()?;
    Ok(())
}

/// Prints due doses as JSON lines and next-dose changes as they happen.
#[derive(Default)]
struct StdoutSink {
    last_next: Mutex<Option<Option<NextReminder>>>,
}

impl ReminderSink for StdoutSink {
    fn on_due(&self, reminder: &Reminder, slot_index: usize, slot: &DoseSlot) {
        emit(&due_event(reminder, slot_index, slot));
    }

    fn on_next_reminder_changed(&self, next: Option<&NextReminder>) {
        let next = next.cloned();
        let mut last = match self.last_next.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if last.as_ref() == Some(&next) {
            return;
        }
        *last = Some(next.clone());
        emit(&Event::NextReminder {
            next,
            at: Local::now().fixed_offset(),
        });
    }

    fn on_audio_cue(&self) {
        let mut stderr = std::io::stderr();
        let _ = stderr.write_all(b"\x07");
        let _ = stderr.flush();
    }
}

fn due_event(reminder: &Reminder, slot_index: usize, slot: &DoseSlot) -> Event {
    Event::DoseDue {
        reminder: reminder.clone(),
        slot_index,
        slot: slot.clone(),
        at: Local::now().fixed_offset(),
    }
}

fn emit(event: &Event) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!(error = %e, "failed to encode event"),
    }
}

/// Ticks do blocking file I/O under the service lock, so the poller gets a
/// thread of its own rather than a worker pool.
fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

pub fn watch() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let service = open_service(&config, Arc::new(StdoutSink::default()))?;
    runtime()?.block_on(async {
        let mut poller = Poller::new(Arc::new(Mutex::new(service)), PollerConfig::from(&config));
        poller.start();
        tracing::info!(
            due_check_secs = config.polling.due_check_secs,
            projection_secs = config.polling.projection_secs,
            "watching reminders"
        );

        let signal = tokio::signal::ctrl_c().await;
        poller.stop().await;
        signal
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use medrem_core::{DosePeriod, Frequency, MealTiming};

    fn next(time: Option<NaiveTime>, minutes_until: u32) -> NextReminder {
        let slot = DoseSlot::new(DosePeriod::Morning, MealTiming::After, time);
        NextReminder {
            reminder: Reminder {
                id: 1,
                medicine_name: "Metformin".into(),
                dosage: "500mg".into(),
                frequency: Frequency::OnceDaily,
                schedule: vec![slot.clone()],
                start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                end_date: None,
                notes: String::new(),
                is_active: true,
            },
            slot_index: 0,
            slot,
            minutes_until,
        }
    }

    #[test]
    fn next_line_reads_naturally() {
        let n = next(NaiveTime::from_hms_opt(8, 0, 0), 660);
        assert_eq!(
            next_line(&n),
            "Metformin - 500mg at 8:00 AM (After Meal), in 11h 0m"
        );
    }

    #[test]
    fn due_event_keeps_the_index_of_identical_slots() {
        let mut n = next(NaiveTime::from_hms_opt(8, 0, 0), 0);
        n.reminder.schedule.push(n.slot.clone());

        match due_event(&n.reminder, 1, &n.reminder.schedule[1]) {
            Event::DoseDue { slot_index, .. } => assert_eq!(slot_index, 1),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn watch_runs_on_a_single_thread() {
        let flavor = runtime()
            .unwrap()
            .block_on(async { tokio::runtime::Handle::current().runtime_flavor() });
        assert_eq!(flavor, tokio::runtime::RuntimeFlavor::CurrentThread);
    }

    #[test]
    fn sink_dedupes_unchanged_projection() {
        let sink = StdoutSink::default();
        let n = next(NaiveTime::from_hms_opt(8, 0, 0), 5);
        sink.on_next_reminder_changed(Some(&n));
        sink.on_next_reminder_changed(Some(&n));
        let last = sink.last_next.lock().unwrap().clone();
        assert_eq!(last, Some(Some(n)));
    }
}
