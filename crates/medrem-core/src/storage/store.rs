//! Reminder collection backed by a [`Persistence`] slot.
//!
//! Every mutation rewrites the whole collection with a single `write`, and
//! only becomes visible in memory once that write succeeded.

use chrono::{DateTime, FixedOffset, Utc};

use super::Persistence;
use crate::error::{CoreError, Result, StorageError};
use crate::reminder::{Reminder, ReminderDraft};
use crate::schedule::settle_passed_slots;

pub struct ReminderStore {
    persistence: Box<dyn Persistence>,
    reminders: Vec<Reminder>,
    /// Trigger stamps held in memory that no write has persisted yet.
    unsaved_stamps: bool,
}

impl ReminderStore {
    /// Open a store over `persistence`, loading whatever it holds.
    pub fn open(persistence: impl Persistence + 'static) -> Self {
        let reminders = Self::load(&persistence);
        Self {
            persistence: Box::new(persistence),
            reminders,
            unsaved_stamps: false,
        }
    }

    /// Deserialize the reminder collection.
    ///
    /// Absent, unreadable or malformed data yields an empty collection.
    pub fn load(persistence: &dyn Persistence) -> Vec<Reminder> {
        Self::read_collection(persistence).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "stored reminders unavailable, starting empty");
            Vec::new()
        })
    }

    /// Re-read the collection so changes written by another process show up.
    ///
    /// Unreadable or malformed data keeps the copy already in memory. Trigger
    /// stamps that were never persisted are carried onto the fresh copy.
    pub fn refresh(&mut self) {
        let mut fresh = match Self::read_collection(self.persistence.as_ref()) {
            Ok(fresh) => fresh,
            Err(e) => {
                tracing::warn!(error = %e, "could not re-read reminders, keeping loaded copy");
                return;
            }
        };
        if self.unsaved_stamps {
            carry_stamps(&self.reminders, &mut fresh);
        }
        self.reminders = fresh;
    }

    /// Serialize the full collection and write it in one call.
    pub fn save(&mut self) -> Result<()> {
        write_collection(self.persistence.as_mut(), &self.reminders)?;
        self.unsaved_stamps = false;
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn get(&self, id: i64) -> Option<&Reminder> {
        self.reminders.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.reminders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty()
    }

    /// Whether a trigger stamp is waiting for a successful write.
    pub fn has_unsaved_stamps(&self) -> bool {
        self.unsaved_stamps
    }

    /// Reminders ordered by start date, insertion order within a date.
    pub fn sorted_by_start_date(&self) -> Vec<&Reminder> {
        let mut sorted: Vec<&Reminder> = self.reminders.iter().collect();
        sorted.sort_by_key(|r| r.start_date);
        sorted
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Create a reminder from `draft`. It starts active.
    ///
    /// Slots whose time already passed today count as handled for today.
    pub fn add(&mut self, draft: ReminderDraft, now: DateTime<FixedOffset>) -> Result<Reminder> {
        let id = self.next_id(now.timestamp_millis());
        let mut reminder = draft.into_reminder(id, true, now.date_naive())?;
        settle_passed_slots(&mut reminder, &now);

        let mut next = self.reminders.clone();
        next.push(reminder.clone());
        self.commit(next)?;
        Ok(reminder)
    }

    /// Replace the reminder's fields with `draft`, keeping id and active flag.
    ///
    /// The schedule is rebuilt, so slot trigger history is discarded, then
    /// slots already passed today are settled as in [`Self::add`]. A draft
    /// without a start date keeps the current one.
    pub fn update(
        &mut self,
        id: i64,
        draft: ReminderDraft,
        now: DateTime<FixedOffset>,
    ) -> Result<Reminder> {
        let index = self.index_of(id)?;
        let current = &self.reminders[index];
        let mut updated = draft.into_reminder(id, current.is_active, current.start_date)?;
        settle_passed_slots(&mut updated, &now);

        let mut next = self.reminders.clone();
        next[index] = updated.clone();
        self.commit(next)?;
        Ok(updated)
    }

    pub fn remove(&mut self, id: i64) -> Result<Reminder> {
        let index = self.index_of(id)?;
        let mut next = self.reminders.clone();
        let removed = next.remove(index);
        self.commit(next)?;
        Ok(removed)
    }

    pub fn set_active(&mut self, id: i64, active: bool) -> Result<Reminder> {
        let index = self.index_of(id)?;
        let mut next = self.reminders.clone();
        next[index].is_active = active;
        let reminder = next[index].clone();
        self.commit(next)?;
        Ok(reminder)
    }

    /// Flip the active flag.
    pub fn toggle(&mut self, id: i64) -> Result<Reminder> {
        let active = self.get(id).ok_or(CoreError::NotFound(id))?.is_active;
        self.set_active(id, !active)
    }

    /// Stamp a slot as fired at `at` and persist.
    ///
    /// A failed write keeps the stamp in memory, and the next save persists
    /// it, so the slot does not fire twice on the same day.
    pub fn mark_triggered(&mut self, id: i64, slot_index: usize, at: DateTime<Utc>) -> Result<()> {
        self.stamp(id, slot_index, at)?;
        self.save()
    }

    /// Stamp a slot in memory only. See [`Self::mark_triggered`].
    pub fn stamp(&mut self, id: i64, slot_index: usize, at: DateTime<Utc>) -> Result<()> {
        let index = self.index_of(id)?;
        let reminder = &mut self.reminders[index];
        let len = reminder.schedule.len();
        let slot = reminder
            .schedule
            .get_mut(slot_index)
            .ok_or(CoreError::SlotOutOfRange {
                id,
                index: slot_index,
                len,
            })?;
        slot.mark_triggered(at);
        self.unsaved_stamps = true;
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Write `next`, then make it the in-memory collection.
    fn commit(&mut self, next: Vec<Reminder>) -> Result<()> {
        write_collection(self.persistence.as_mut(), &next)?;
        self.reminders = next;
        self.unsaved_stamps = false;
        Ok(())
    }

    fn read_collection(persistence: &dyn Persistence) -> Result<Vec<Reminder>, StorageError> {
        match persistence.read()? {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }

    fn index_of(&self, id: i64) -> Result<usize> {
        self.reminders
            .iter()
            .position(|r| r.id == id)
            .ok_or(CoreError::NotFound(id))
    }

    /// Creation timestamp, bumped past the largest id in use.
    fn next_id(&self, now_ms: i64) -> i64 {
        match self.reminders.iter().map(|r| r.id).max() {
            Some(max) if max >= now_ms => max + 1,
            _ => now_ms,
        }
    }
}

fn write_collection(persistence: &mut dyn Persistence, reminders: &[Reminder]) -> Result<()> {
    let raw = serde_json::to_string(reminders).map_err(StorageError::from)?;
    persistence.write(&raw)?;
    tracing::debug!(count = reminders.len(), "reminders saved");
    Ok(())
}

/// Copy trigger stamps from `stale` onto matching, unchanged slots of `fresh`.
fn carry_stamps(stale: &[Reminder], fresh: &mut [Reminder]) {
    for reminder in fresh.iter_mut() {
        let Some(old) = stale.iter().find(|r| r.id == reminder.id) else {
            continue;
        };
        for (slot, old_slot) in reminder.schedule.iter_mut().zip(&old.schedule) {
            let same_slot = slot.time == old_slot.time
                && slot.meal == old_slot.meal
                && slot.specific_time == old_slot.specific_time;
            match old_slot.last_triggered {
                Some(at) if same_slot => slot.mark_triggered(at),
                _ => {}
            }
        }
    }
}
