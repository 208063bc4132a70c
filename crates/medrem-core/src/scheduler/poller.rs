//! Poller: drives a [`SchedulerService`] on two timers.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Idle
//! ```
//!
//! While running, a due-check timer calls `check_due` and a projection
//! timer calls `refresh_next`. Both tick once immediately on start.
//!
//! ## Usage
//!
//! ```ignore
//! let service = Arc::new(Mutex::new(service));
//! let mut poller = Poller::new(service, PollerConfig::default());
//! poller.start();
//! // ...
//! poller.stop().await;
//! ```

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::SchedulerService;
use crate::storage::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollerState {
    Idle,
    Running,
}

/// Timer cadences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub due_check_interval: Duration,
    pub projection_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            due_check_interval: Duration::from_secs(10),
            projection_interval: Duration::from_secs(1),
        }
    }
}

impl From<&Config> for PollerConfig {
    fn from(config: &Config) -> Self {
        Self {
            due_check_interval: config.due_check_interval(),
            projection_interval: config.projection_interval(),
        }
    }
}

struct Running {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

pub struct Poller {
    service: Arc<Mutex<SchedulerService>>,
    config: PollerConfig,
    running: Option<Running>,
}

impl Poller {
    pub fn new(service: Arc<Mutex<SchedulerService>>, config: PollerConfig) -> Self {
        Self {
            service,
            config,
            running: None,
        }
    }

    pub fn state(&self) -> PollerState {
        if self.running.is_some() {
            PollerState::Running
        } else {
            PollerState::Idle
        }
    }

    /// Spawn both timers on the current tokio runtime. No-op when running.
    ///
    /// Ticks lock the service and write the reminder file synchronously, so
    /// callers run the poller on a `current_thread` runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn start(&mut self) {
        if self.running.is_some() {
            return;
        }

        let (shutdown, rx) = watch::channel(false);
        let due_check = spawn_timer(
            self.service.clone(),
            self.config.due_check_interval,
            rx.clone(),
            |service| {
                if let Err(e) = service.check_due() {
                    tracing::warn!(error = %e, "due check failed");
                }
            },
        );
        let projection = spawn_timer(
            self.service.clone(),
            self.config.projection_interval,
            rx,
            |service| {
                service.refresh_next();
            },
        );

        tracing::debug!(
            due_check_secs = self.config.due_check_interval.as_secs_f64(),
            projection_secs = self.config.projection_interval.as_secs_f64(),
            "poller started"
        );
        self.running = Some(Running {
            shutdown,
            tasks: vec![due_check, projection],
        });
    }

    /// Stop both timers and wait for them to exit. No-op when idle.
    ///
    /// No callback runs once this returns.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        let _ = running.shutdown.send(true);
        for task in running.tasks {
            if let Err(e) = task.await {
                if e.is_panic() {
                    tracing::warn!(error = %e, "poller task panicked");
                }
            }
        }
        tracing::debug!("poller stopped");
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            for task in running.tasks {
                task.abort();
            }
        }
    }
}

fn spawn_timer(
    service: Arc<Mutex<SchedulerService>>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    on_tick: fn(&mut SchedulerService),
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    let mut guard = lock(&service);
                    on_tick(&mut guard);
                }
            }
        }
    })
}

fn lock(service: &Mutex<SchedulerService>) -> MutexGuard<'_, SchedulerService> {
    // Ticks run to completion, so a poisoned guard still holds consistent state.
    service.lock().unwrap_or_else(|e| e.into_inner())
}
