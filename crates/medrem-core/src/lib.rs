//! # medrem Core Library
//!
//! This library provides the core logic for medrem, a medicine reminder
//! manager. All operations are available through the standalone `medrem`
//! CLI, which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Reminders**: medication records with a recurring daily dose schedule
//! - **Storage**: a JSON reminder collection behind a [`Persistence`] slot and
//!   TOML-based configuration
//! - **Schedule engine**: pure due detection and next-dose projection
//! - **Scheduler**: an owned service that stamps and delivers due doses, and
//!   a poller that runs it on timers
//!
//! ## Key Components
//!
//! - [`ReminderStore`]: reminder collection, persisted after every mutation
//! - [`find_due_slots`] / [`find_next`]: schedule engine
//! - [`SchedulerService`]: store + clock + presentation callbacks
//! - [`Poller`]: start/stop timer loop around the service
//! - [`Config`]: application configuration management

pub mod clock;
pub mod display;
pub mod error;
pub mod events;
pub mod reminder;
pub mod schedule;
pub mod scheduler;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use reminder::{DosePeriod, DoseSlot, Frequency, MealTiming, Reminder, ReminderDraft, SlotDraft};
pub use schedule::{find_due_slots, find_next, DueDose, DueMode, NextDose, NextReminder};
pub use scheduler::{
    DueAlert, NullSink, Poller, PollerConfig, PollerState, ReminderSink, SchedulerService,
};
pub use storage::{Config, FilePersistence, MemoryPersistence, Persistence, ReminderStore};
