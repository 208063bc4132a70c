pub mod config;
pub mod reminder;
pub mod watch;

use std::sync::Arc;

use medrem_core::{
    Config, FilePersistence, ReminderSink, ReminderStore, SchedulerService, SystemClock,
};

/// Open the reminder store named in the config and wrap it in a service.
pub fn open_service(
    config: &Config,
    sink: Arc<dyn ReminderSink>,
) -> Result<SchedulerService, Box<dyn std::error::Error>> {
    let persistence = FilePersistence::in_data_dir(&config.storage.file)?;
    tracing::debug!(path = %persistence.path().display(), "opening reminders");
    let store = ReminderStore::open(persistence);
    Ok(SchedulerService::new(store, Arc::new(SystemClock), sink).configured(config))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
