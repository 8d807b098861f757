//! `daybell run`: the long-lived scheduling loop.
//!
//! Each timer is a tokio task that sleeps and then reports back on a channel.
//! Every pass reloads the store, so edits from other invocations show up at
//! the next firing, capped checkpoint or periodic rescan.

use anyhow::Result;
use chrono::NaiveDateTime;
use daybell_core::time::{format_local, local_now};
use daybell_core::{AlertMessage, AlertSink, Elapsed, Reminder, ReminderScheduler, TimerBackend};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::alerts::DesktopAlert;
use crate::config::Config;
use crate::store::ReminderStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerFired {
    pub reminder_id: String,
    pub generation: u64,
}

pub struct TokioTimers {
    tx: mpsc::UnboundedSender<TimerFired>,
}

impl TokioTimers {
    pub fn new(tx: mpsc::UnboundedSender<TimerFired>) -> Self {
        Self { tx }
    }
}

impl TimerBackend for TokioTimers {
    type Handle = JoinHandle<()>;

    fn arm(&mut self, reminder_id: &str, generation: u64, delay: std::time::Duration) -> JoinHandle<()> {
        let tx = self.tx.clone();
        let reminder_id = reminder_id.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the loop is shutting down.
            let _ = tx.send(TimerFired {
                reminder_id,
                generation,
            });
        })
    }

    fn cancel(&mut self, handle: JoinHandle<()>) {
        handle.abort();
    }
}

/// Wall-clock source for passes.
type Clock = Box<dyn Fn() -> NaiveDateTime + Send>;

struct Runner<T: TimerBackend, S: AlertSink> {
    store: ReminderStore,
    scheduler: ReminderScheduler<T>,
    sink: S,
    clock: Clock,
    reminders: Vec<Reminder>,
}

impl<T: TimerBackend, S: AlertSink> Runner<T, S> {
    fn new(store: ReminderStore, scheduler: ReminderScheduler<T>, sink: S, clock: Clock) -> Self {
        Self {
            store,
            scheduler,
            sink,
            clock,
            reminders: Vec::new(),
        }
    }

    /// Reload the store and re-arm everything. A store that fails to load
    /// keeps the previous reminder set armed.
    fn pass(&mut self, why: &str) {
        match self.store.load() {
            Ok(list) => self.reminders = list,
            Err(e) => warn!(error = %e, "reminder store unreadable; keeping previous set"),
        }

        let now = (self.clock)();
        let resolutions = self.scheduler.reschedule_all(&self.reminders, now);
        let next = resolutions.iter().filter_map(|r| r.fire_at).min();
        info!(
            reason = why,
            reminders = self.reminders.len(),
            armed = self.scheduler.armed_count(),
            next = %next.map(format_local).unwrap_or_else(|| "none".to_string()),
            "reschedule pass"
        );
    }

    fn handle_fired(&mut self, fired: TimerFired) {
        match self.scheduler.on_elapsed(&fired.reminder_id, fired.generation) {
            Elapsed::Due { fire_at, repeating } => {
                self.ring(&fired.reminder_id, fire_at);
                if repeating {
                    self.pass("repeat");
                }
            }
            Elapsed::Capped => self.pass("checkpoint"),
            Elapsed::Stale => {
                debug!(reminder = %fired.reminder_id, generation = fired.generation, "stale timer ignored");
            }
        }
    }

    fn ring(&mut self, id: &str, fire_at: NaiveDateTime) {
        let Some(reminder) = self.reminders.iter().find(|r| r.id == id) else {
            warn!(reminder = %id, "fired reminder no longer in store");
            return;
        };
        let message = AlertMessage::for_reminder(reminder);
        info!(reminder = %id, at = %format_local(fire_at), "ringing");
        if let Err(e) = self.sink.ring(reminder, &message) {
            warn!(reminder = %id, error = %e, "alert failed");
        }
    }
}

pub async fn run(store: ReminderStore, cfg: Config) -> Result<()> {
    let tz = cfg.scheduler.timezone()?;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut runner = Runner::new(
        store,
        ReminderScheduler::with_max_delay(TokioTimers::new(tx), cfg.scheduler.max_delay()),
        DesktopAlert::new(cfg.alerts.clone()),
        Box::new(move || local_now(tz)),
    );

    // A corrupt store is fatal at startup; later passes keep the last good set.
    runner.reminders = runner.store.load()?;
    runner.pass("startup");
    println!(
        "daybell running with {} reminder(s) from {}. Ctrl-C to stop.",
        runner.reminders.len(),
        runner.store.path().display()
    );

    let mut rescan = tokio::time::interval(cfg.scheduler.rescan_interval());
    rescan.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately; startup already ran a pass.
    rescan.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
            Some(fired) = rx.recv() => runner.handle_fired(fired),
            _ = rescan.tick() => runner.pass("rescan"),
        }
    }

    runner.scheduler.cancel_all();
    Ok(())
}
