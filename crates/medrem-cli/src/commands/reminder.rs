//! Reminder management commands for CLI.

use chrono::{NaiveDate, NaiveTime};
use clap::Subcommand;
use medrem_core::display::{describe_schedule, format_countdown};
use medrem_core::{
    Config, CoreError, DosePeriod, Event, Frequency, MealTiming, NullSink, Reminder, ReminderDraft,
    SlotDraft,
};
use std::sync::Arc;

use super::{open_service, print_json};

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Add a new reminder
    Add {
        /// Medicine name
        name: String,
        /// Dosage, e.g. "500mg"
        #[arg(long)]
        dosage: String,
        /// once-daily, twice-daily, thrice-daily, as-needed or weekly
        #[arg(long, default_value = "once-daily", value_parser = parse_frequency)]
        frequency: Frequency,
        /// Dose slot as PERIOD/MEAL[/HH:MM], e.g. "morning/before/08:00" (repeatable)
        #[arg(long = "slot", value_parser = parse_slot)]
        slots: Vec<SlotDraft>,
        /// Start date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        start: Option<NaiveDate>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Free-text notes
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// List reminders ordered by start date
    List {
        /// Print human-readable lines instead of JSON
        #[arg(long)]
        plain: bool,
    },
    /// Get reminder details
    Get {
        /// Reminder ID
        id: i64,
    },
    /// Edit a reminder; omitted fields keep their current value
    Edit {
        /// Reminder ID
        id: i64,
        /// New medicine name
        #[arg(long)]
        name: Option<String>,
        /// New dosage
        #[arg(long)]
        dosage: Option<String>,
        /// New frequency
        #[arg(long, value_parser = parse_frequency)]
        frequency: Option<Frequency>,
        /// Replacement dose slots (repeatable); all slots are replaced
        #[arg(long = "slot", value_parser = parse_slot)]
        slots: Vec<SlotDraft>,
        /// New start date
        #[arg(long)]
        start: Option<NaiveDate>,
        /// New end date
        #[arg(long, conflicts_with = "clear_end")]
        end: Option<NaiveDate>,
        /// Remove the end date
        #[arg(long)]
        clear_end: bool,
        /// New notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a reminder
    Remove {
        /// Reminder ID
        id: i64,
    },
    /// Pause a reminder
    Pause {
        /// Reminder ID
        id: i64,
    },
    /// Resume a paused reminder
    Resume {
        /// Reminder ID
        id: i64,
    },
    /// Pause an active reminder or resume a paused one
    Toggle {
        /// Reminder ID
        id: i64,
    },
}

fn parse_frequency(s: &str) -> Result<Frequency, String> {
    s.parse()
}

/// `PERIOD/MEAL[/HH:MM]`.
pub fn parse_slot(s: &str) -> Result<SlotDraft, String> {
    let parts: Vec<&str> = s.split('/').map(str::trim).collect();
    let (period, meal, time) = match parts.as_slice() {
        [period, meal] => (period, meal, None),
        [period, meal, time] => (period, meal, Some(*time)),
        _ => return Err(format!("invalid slot '{s}' (expected PERIOD/MEAL[/HH:MM])")),
    };

    let specific_time = match time {
        None | Some("") => None,
        Some(t) => Some(
            NaiveTime::parse_from_str(t, "%H:%M")
                .map_err(|e| format!("invalid time '{t}': {e}"))?,
        ),
    };
    Ok(SlotDraft::new(
        period.parse::<DosePeriod>()?,
        meal.parse::<MealTiming>()?,
        specific_time,
    ))
}

fn plain_line(reminder: &Reminder) -> String {
    let status = if reminder.is_active { "active" } else { "paused" };
    let schedule = describe_schedule(reminder);
    let end = reminder
        .end_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "ongoing".into());
    let mut line = format!(
        "{}  {}  [{}, {}]  {} -> {}",
        reminder.id,
        reminder.title(),
        reminder.frequency,
        status,
        reminder.start_date,
        end
    );
    if !schedule.is_empty() {
        line.push_str(&format!("  {schedule}"));
    }
    line
}

pub fn run(action: ReminderAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut service = open_service(&config, Arc::new(NullSink))?;

    match action {
        ReminderAction::Add {
            name,
            dosage,
            frequency,
            slots,
            start,
            end,
            notes,
        } => {
            let draft = ReminderDraft {
                medicine_name: name,
                dosage,
                frequency,
                start_date: start,
                end_date: end,
                notes,
                slots,
            };
            let reminder = service.add_reminder(draft)?;
            print_json(&Event::ReminderAdded {
                reminder,
                at: service.now(),
            })?;
        }
        ReminderAction::List { plain } => {
            let reminders = service.store().sorted_by_start_date();
            if plain {
                if reminders.is_empty() {
                    println!("No reminders yet.");
                }
                for reminder in reminders {
                    println!("{}", plain_line(reminder));
                }
                if let Some(next) = service.next_reminder() {
                    println!(
                        "Next: {} {}",
                        next.reminder.title(),
                        format_countdown(next.minutes_until)
                    );
                }
            } else {
                print_json(&reminders)?;
            }
        }
        ReminderAction::Get { id } => {
            let reminder = service
                .store()
                .get(id)
                .ok_or(CoreError::NotFound(id))?;
            print_json(reminder)?;
        }
        ReminderAction::Edit {
            id,
            name,
            dosage,
            frequency,
            slots,
            start,
            end,
            clear_end,
            notes,
        } => {
            let current = service
                .store()
                .get(id)
                .ok_or(CoreError::NotFound(id))?;
            let mut draft = ReminderDraft::from(current);

            if let Some(n) = name {
                draft.medicine_name = n;
            }
            if let Some(d) = dosage {
                draft.dosage = d;
            }
            if let Some(f) = frequency {
                draft.frequency = f;
            }
            if !slots.is_empty() {
                draft.slots = slots;
            }
            if let Some(s) = start {
                draft.start_date = Some(s);
            }
            if let Some(e) = end {
                draft.end_date = Some(e);
            }
            if clear_end {
                draft.end_date = None;
            }
            if let Some(n) = notes {
                draft.notes = n;
            }

            let reminder = service.update_reminder(id, draft)?;
            print_json(&Event::ReminderUpdated {
                reminder,
                at: service.now(),
            })?;
        }
        ReminderAction::Remove { id } => {
            let removed = service.remove_reminder(id)?;
            print_json(&Event::ReminderRemoved {
                id,
                medicine_name: removed.medicine_name,
                at: service.now(),
            })?;
        }
        ReminderAction::Pause { id } => {
            let reminder = service.set_active(id, false)?;
            print_toggled(&reminder, service.now())?;
        }
        ReminderAction::Resume { id } => {
            let reminder = service.set_active(id, true)?;
            print_toggled(&reminder, service.now())?;
        }
        ReminderAction::Toggle { id } => {
            let reminder = service.toggle(id)?;
            print_toggled(&reminder, service.now())?;
        }
    }
    Ok(())
}

fn print_toggled(
    reminder: &Reminder,
    at: chrono::DateTime<chrono::FixedOffset>,
) -> Result<(), Box<dyn std::error::Error>> {
    print_json(&Event::ReminderToggled {
        id: reminder.id,
        is_active: reminder.is_active,
        at,
    })
}
