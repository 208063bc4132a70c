//! Reminder drafts: the user-submitted shape a reminder is created or edited from.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{DosePeriod, DoseSlot, Frequency, MealTiming, Reminder};
use crate::error::ValidationError;

/// One submitted slot. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotDraft {
    pub time: Option<DosePeriod>,
    pub meal: Option<MealTiming>,
    pub specific_time: Option<NaiveTime>,
}

impl SlotDraft {
    pub fn new(time: DosePeriod, meal: MealTiming, specific_time: Option<NaiveTime>) -> Self {
        Self {
            time: Some(time),
            meal: Some(meal),
            specific_time,
        }
    }
}

/// A reminder as submitted for creation or edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderDraft {
    pub medicine_name: String,
    pub dosage: String,
    pub frequency: Frequency,
    /// Defaults to the current date when the reminder is stored.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub notes: String,
    pub slots: Vec<SlotDraft>,
}

impl ReminderDraft {
    pub fn new(
        medicine_name: impl Into<String>,
        dosage: impl Into<String>,
        frequency: Frequency,
    ) -> Self {
        Self {
            medicine_name: medicine_name.into(),
            dosage: dosage.into(),
            frequency,
            start_date: None,
            end_date: None,
            notes: String::new(),
            slots: Vec::new(),
        }
    }

    pub fn with_slot(mut self, slot: SlotDraft) -> Self {
        self.slots.push(slot);
        self
    }

    pub fn with_dates(mut self, start: NaiveDate, end: Option<NaiveDate>) -> Self {
        self.start_date = Some(start);
        self.end_date = end;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Build the dose schedule for this draft.
    ///
    /// Daily frequencies need exactly `frequency.slot_count()` complete slots.
    /// Slots submitted for as-needed or weekly reminders are ignored.
    /// Every built slot starts with no trigger history.
    pub fn build_schedule(&self) -> Result<Vec<DoseSlot>, ValidationError> {
        if !self.frequency.is_daily() {
            return Ok(Vec::new());
        }

        let expected = self.frequency.slot_count();
        if self.slots.len() != expected {
            return Err(ValidationError::SlotCount {
                frequency: self.frequency,
                expected,
                actual: self.slots.len(),
            });
        }

        self.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| {
                let time = slot.time.ok_or(ValidationError::IncompleteSlot {
                    index,
                    missing: "a time of day",
                })?;
                let meal = slot.meal.ok_or(ValidationError::IncompleteSlot {
                    index,
                    missing: "a meal timing",
                })?;
                Ok(DoseSlot::new(time, meal, slot.specific_time))
            })
            .collect()
    }

    /// Validate and turn the draft into a reminder with the given identity.
    pub(crate) fn into_reminder(
        self,
        id: i64,
        is_active: bool,
        today: NaiveDate,
    ) -> Result<Reminder, ValidationError> {
        let medicine_name = self.medicine_name.trim().to_string();
        if medicine_name.is_empty() {
            return Err(ValidationError::EmptyField("medicine name"));
        }
        let dosage = self.dosage.trim().to_string();
        if dosage.is_empty() {
            return Err(ValidationError::EmptyField("dosage"));
        }

        let start_date = self.start_date.unwrap_or(today);
        if let Some(end) = self.end_date {
            if end < start_date {
                return Err(ValidationError::InvalidDateRange {
                    start: start_date,
                    end,
                });
            }
        }

        let schedule = self.build_schedule()?;
        Ok(Reminder {
            id,
            medicine_name,
            dosage,
            frequency: self.frequency,
            schedule,
            start_date,
            end_date: self.end_date,
            notes: self.notes,
            is_active,
        })
    }
}

/// Prefill a draft from an existing reminder, as the edit form does.
impl From<&Reminder> for ReminderDraft {
    fn from(reminder: &Reminder) -> Self {
        Self {
            medicine_name: reminder.medicine_name.clone(),
            dosage: reminder.dosage.clone(),
            frequency: reminder.frequency,
            start_date: Some(reminder.start_date),
            end_date: reminder.end_date,
            notes: reminder.notes.clone(),
            slots: reminder
                .schedule
                .iter()
                .map(|s| SlotDraft::new(s.time, s.meal, s.specific_time))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, m, 0)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn daily_frequencies_produce_matching_slot_counts() {
        let periods = [DosePeriod::Morning, DosePeriod::Afternoon, DosePeriod::Night];
        for frequency in [
            Frequency::OnceDaily,
            Frequency::TwiceDaily,
            Frequency::ThriceDaily,
        ] {
            let mut draft = ReminderDraft::new("Metformin", "500mg", frequency);
            for period in periods.iter().take(frequency.slot_count()) {
                draft = draft.with_slot(SlotDraft::new(*period, MealTiming::After, at(8, 0)));
            }
            let reminder = draft.into_reminder(1, true, today()).unwrap();
            assert_eq!(reminder.schedule.len(), frequency.slot_count());
        }
    }

    #[test]
    fn incomplete_slot_is_rejected() {
        let draft = ReminderDraft::new("Metformin", "500mg", Frequency::OnceDaily).with_slot(
            SlotDraft {
                time: Some(DosePeriod::Morning),
                meal: None,
                specific_time: at(8, 0),
            },
        );
        assert_eq!(
            draft.build_schedule(),
            Err(ValidationError::IncompleteSlot {
                index: 0,
                missing: "a meal timing"
            })
        );
    }

    #[test]
    fn wrong_slot_count_is_rejected() {
        let draft = ReminderDraft::new("Metformin", "500mg", Frequency::TwiceDaily)
            .with_slot(SlotDraft::new(DosePeriod::Morning, MealTiming::After, at(8, 0)));
        assert!(matches!(
            draft.build_schedule(),
            Err(ValidationError::SlotCount {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn slots_are_ignored_for_as_needed() {
        let draft = ReminderDraft::new("Ibuprofen", "200mg", Frequency::AsNeeded)
            .with_slot(SlotDraft::new(DosePeriod::Night, MealTiming::After, at(22, 0)));
        assert!(draft.build_schedule().unwrap().is_empty());
    }

    #[test]
    fn start_date_defaults_to_today() {
        let reminder = ReminderDraft::new("Ibuprofen", "200mg", Frequency::Weekly)
            .into_reminder(5, true, today())
            .unwrap();
        assert_eq!(reminder.start_date, today());
        assert_eq!(reminder.end_date, None);
    }

    #[test]
    fn end_before_start_is_rejected() {
        let end = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let result = ReminderDraft::new("Ibuprofen", "200mg", Frequency::Weekly)
            .with_dates(today(), Some(end))
            .into_reminder(5, true, today());
        assert!(matches!(
            result,
            Err(ValidationError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn blank_name_is_rejected() {
        let result = ReminderDraft::new("   ", "200mg", Frequency::Weekly).into_reminder(
            1,
            true,
            today(),
        );
        assert_eq!(result, Err(ValidationError::EmptyField("medicine name")));
    }

    #[test]
    fn prefill_round_trips_through_draft() {
        let original = ReminderDraft::new("Amoxicillin", "250mg", Frequency::TwiceDaily)
            .with_slot(SlotDraft::new(DosePeriod::Morning, MealTiming::Before, at(7, 30)))
            .with_slot(SlotDraft::new(DosePeriod::Night, MealTiming::After, None))
            .with_notes("with water")
            .into_reminder(9, false, today())
            .unwrap();

        let rebuilt = ReminderDraft::from(&original)
            .into_reminder(original.id, original.is_active, today())
            .unwrap();
        assert_eq!(rebuilt, original);
    }
}
