//! Scheduler service: owns the reminder store and drives the schedule engine.
//!
//! - Holds the [`ReminderStore`], an injected [`Clock`] and a [`ReminderSink`]
//!   for presentation callbacks
//! - `check_due` fires due slots, stamping each before anything else sees it
//! - `refresh_next` forwards the next-dose projection to the sink
//!
//! The [`Poller`] runs both on timers.

mod poller;

pub use poller::{Poller, PollerConfig, PollerState};

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clock::Clock;
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::reminder::{DoseSlot, Reminder, ReminderDraft};
use crate::schedule::{find_due_slots, find_next, DueMode, NextReminder};
use crate::storage::{Config, ReminderStore};

/// Presentation callbacks.
///
/// Callbacks run while the service is borrowed, so they must not call back
/// into the service.
pub trait ReminderSink: Send + Sync {
    /// A dose slot became due. `slot_index` is the slot's position in
    /// `reminder.schedule`.
    fn on_due(&self, reminder: &Reminder, slot_index: usize, slot: &DoseSlot);

    /// Latest next-dose projection; `None` means there is nothing to show.
    fn on_next_reminder_changed(&self, next: Option<&NextReminder>);

    /// Play the alert sound.
    fn on_audio_cue(&self);
}

/// Sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ReminderSink for NullSink {
    fn on_due(&self, _reminder: &Reminder, _slot_index: usize, _slot: &DoseSlot) {}
    fn on_next_reminder_changed(&self, _next: Option<&NextReminder>) {}
    fn on_audio_cue(&self) {}
}

/// A slot fired by [`SchedulerService::check_due`], after stamping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DueAlert {
    pub reminder: Reminder,
    pub slot_index: usize,
    pub slot: DoseSlot,
    pub at: DateTime<FixedOffset>,
}

impl From<DueAlert> for Event {
    fn from(alert: DueAlert) -> Self {
        Event::DoseDue {
            reminder: alert.reminder,
            slot_index: alert.slot_index,
            slot: alert.slot,
            at: alert.at,
        }
    }
}

pub struct SchedulerService {
    store: ReminderStore,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn ReminderSink>,
    due_mode: DueMode,
    sound: bool,
}

impl SchedulerService {
    pub fn new(store: ReminderStore, clock: Arc<dyn Clock>, sink: Arc<dyn ReminderSink>) -> Self {
        Self {
            store,
            clock,
            sink,
            due_mode: DueMode::default(),
            sound: true,
        }
    }

    pub fn with_due_mode(mut self, due_mode: DueMode) -> Self {
        self.due_mode = due_mode;
        self
    }

    pub fn with_sound(mut self, sound: bool) -> Self {
        self.sound = sound;
        self
    }

    /// Apply the polling and notification settings from `config`.
    pub fn configured(self, config: &Config) -> Self {
        self.with_due_mode(config.polling.due_mode)
            .with_sound(config.notifications.sound)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn store(&self) -> &ReminderStore {
        &self.store
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now()
    }

    pub fn due_mode(&self) -> DueMode {
        self.due_mode
    }

    /// Next-dose projection at the clock's current instant.
    pub fn next_reminder(&self) -> Option<NextReminder> {
        find_next(self.store.reminders(), &self.clock.now()).map(NextReminder::from)
    }

    // ── Reminder CRUD ────────────────────────────────────────────────
    //
    // Each mutation persists through the store, then refreshes the projection.

    pub fn add_reminder(&mut self, draft: ReminderDraft) -> Result<Reminder> {
        let reminder = self.store.add(draft, self.clock.now())?;
        tracing::debug!(id = reminder.id, medicine = %reminder.medicine_name, "reminder added");
        self.refresh_next();
        Ok(reminder)
    }

    pub fn update_reminder(&mut self, id: i64, draft: ReminderDraft) -> Result<Reminder> {
        let reminder = self.store.update(id, draft, self.clock.now())?;
        tracing::debug!(id, "reminder updated");
        self.refresh_next();
        Ok(reminder)
    }

    pub fn remove_reminder(&mut self, id: i64) -> Result<Reminder> {
        let reminder = self.store.remove(id)?;
        tracing::debug!(id, "reminder removed");
        self.refresh_next();
        Ok(reminder)
    }

    pub fn set_active(&mut self, id: i64, active: bool) -> Result<Reminder> {
        let reminder = self.store.set_active(id, active)?;
        tracing::debug!(id, active, "reminder active flag set");
        self.refresh_next();
        Ok(reminder)
    }

    pub fn toggle(&mut self, id: i64) -> Result<Reminder> {
        let reminder = self.store.toggle(id)?;
        tracing::debug!(id, active = reminder.is_active, "reminder toggled");
        self.refresh_next();
        Ok(reminder)
    }

    // ── Ticks ────────────────────────────────────────────────────────

    /// Fire every due slot.
    ///
    /// The collection is re-read first, so reminders written by another
    /// process are seen and kept. All due slots are stamped and persisted in
    /// one write, then handed to the sink one by one in reminder and slot
    /// order (alert, then audio cue).
    ///
    /// A failed write does not hold back the alerts: they are delivered, the
    /// stamps stay in memory so the slots do not fire again today, the write
    /// is retried on the next check, and the storage error is returned.
    pub fn check_due(&mut self) -> Result<Vec<DueAlert>> {
        self.store.refresh();
        let now = self.clock.now();
        let due: Vec<(i64, usize)> = find_due_slots(self.store.reminders(), &now, self.due_mode)
            .iter()
            .map(|d| (d.reminder.id, d.slot_index))
            .collect();
        if due.is_empty() && !self.store.has_unsaved_stamps() {
            return Ok(Vec::new());
        }

        let stamp = now.with_timezone(&Utc);
        for &(id, slot_index) in &due {
            self.store.stamp(id, slot_index, stamp)?;
        }
        let saved = self.store.save();
        if let Err(e) = &saved {
            tracing::warn!(error = %e, "could not persist trigger stamps");
        }

        let mut alerts = Vec::with_capacity(due.len());
        for (id, slot_index) in due {
            let reminder = self.store.get(id).cloned().ok_or(CoreError::NotFound(id))?;
            let slot = reminder.schedule[slot_index].clone();
            tracing::info!(
                id,
                slot_index,
                medicine = %reminder.medicine_name,
                "dose due"
            );

            self.sink.on_due(&reminder, slot_index, &slot);
            if self.sound {
                self.sink.on_audio_cue();
            }
            alerts.push(DueAlert {
                reminder,
                slot_index,
                slot,
                at: now,
            });
        }
        saved.map(|()| alerts)
    }

    /// Compute the next-dose projection and forward it to the sink.
    pub fn refresh_next(&self) -> Option<NextReminder> {
        let next = self.next_reminder();
        self.sink.on_next_reminder_changed(next.as_ref());
        next
    }
}
