//! Reminder scheduler: owns the id -> armed timer table.
//!
//! The scheduler never sleeps or spawns anything itself. Timers are armed and
//! cancelled through a [`TimerBackend`], so the harness decides what a timer
//! is (a tokio task, a test double, an OS alarm).

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use crate::recurrence::{next_fire_instant, Resolution};
use crate::reminder::{Reminder, ReminderId};

/// Longest single timer the harness will arm (2^31 - 1 ms, about 24.8 days).
pub const DEFAULT_MAX_DELAY: std::time::Duration = std::time::Duration::from_millis(2_147_483_647);

/// Arms and cancels single-shot timers.
///
/// When a timer elapses the backend must report `(reminder_id, generation)`
/// back to [`ReminderScheduler::on_elapsed`].
pub trait TimerBackend {
    type Handle;

    fn arm(&mut self, reminder_id: &str, generation: u64, delay: std::time::Duration)
        -> Self::Handle;

    fn cancel(&mut self, handle: Self::Handle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerDelay {
    pub delay: std::time::Duration,
    /// The real delay was longer than the cap; the timer is a checkpoint only.
    pub capped: bool,
}

/// Delay from `now` until `fire_at`, clamped to `[0, max_delay]`.
pub fn timer_delay(
    fire_at: NaiveDateTime,
    now: NaiveDateTime,
    max_delay: std::time::Duration,
) -> TimerDelay {
    // Negative gaps (fire instant already reached) fail `to_std` and clamp to zero.
    let real = (fire_at - now).to_std().unwrap_or_default();
    if real > max_delay {
        TimerDelay {
            delay: max_delay,
            capped: true,
        }
    } else {
        TimerDelay {
            delay: real,
            capped: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArmedTimer<H> {
    pub handle: H,
    pub generation: u64,
    pub fire_at: NaiveDateTime,
    pub capped: bool,
    pub repeating: bool,
}

/// What an elapsed timer means for the harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Elapsed {
    /// The reminder is due: ring it. Repeating reminders need a fresh pass.
    Due {
        fire_at: NaiveDateTime,
        repeating: bool,
    },
    /// A capped checkpoint timer ran out; re-run a pass.
    Capped,
    /// Cancelled or superseded timer; ignore.
    Stale,
}

pub struct ReminderScheduler<T: TimerBackend> {
    backend: T,
    active: HashMap<ReminderId, ArmedTimer<T::Handle>>,
    /// Last fire instant handed out as `Elapsed::Due`, per reminder.
    delivered: HashMap<ReminderId, NaiveDateTime>,
    max_delay: std::time::Duration,
    next_generation: u64,
}

impl<T: TimerBackend> ReminderScheduler<T> {
    pub fn new(backend: T) -> Self {
        Self::with_max_delay(backend, DEFAULT_MAX_DELAY)
    }

    pub fn with_max_delay(backend: T, max_delay: std::time::Duration) -> Self {
        Self {
            backend,
            active: HashMap::new(),
            delivered: HashMap::new(),
            max_delay,
            next_generation: 0,
        }
    }

    pub fn backend(&self) -> &T {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut T {
        &mut self.backend
    }

    pub fn armed(&self, id: &str) -> Option<&ArmedTimer<T::Handle>> {
        self.active.get(id)
    }

    pub fn armed_count(&self) -> usize {
        self.active.len()
    }

    /// Cancel every armed timer, then resolve and arm each reminder afresh.
    ///
    /// Each reminder resolves from `now`, pulled back to its own still-armed
    /// fire instant if that is earlier, so an occurrence whose timer has not
    /// been processed yet is re-armed instead of skipped. Other reminders'
    /// timers never lower the reference. A reminder never resolves to an
    /// instant at or before the one it was last delivered for.
    ///
    /// Returns one resolution per reminder in input order.
    pub fn reschedule_all(&mut self, reminders: &[Reminder], now: NaiveDateTime) -> Vec<Resolution> {
        let pending: HashMap<ReminderId, NaiveDateTime> = self
            .active
            .iter()
            .map(|(id, t)| (id.clone(), t.fire_at))
            .collect();
        self.cancel_all();
        self.delivered
            .retain(|id, _| reminders.iter().any(|r| &r.id == id));

        let mut out = Vec::with_capacity(reminders.len());
        for r in reminders {
            let base = pending.get(&r.id).map_or(now, |armed| (*armed).min(now));
            let from = match self.delivered.get(&r.id) {
                Some(last) => base.max(*last + Duration::milliseconds(1)),
                None => base,
            };
            let fire_at = next_fire_instant(&r.definition, from);
            if let Some(fire_at) = fire_at {
                self.arm(r, fire_at, now);
            }
            out.push(Resolution {
                id: r.id.clone(),
                fire_at,
            });
        }
        out
    }

    /// Cancel one reminder's timer. Returns whether anything was armed.
    pub fn cancel(&mut self, id: &str) -> bool {
        match self.active.remove(id) {
            Some(t) => {
                self.backend.cancel(t.handle);
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, t) in self.active.drain() {
            self.backend.cancel(t.handle);
        }
    }

    /// Classify a timer the backend reports as elapsed.
    pub fn on_elapsed(&mut self, id: &str, generation: u64) -> Elapsed {
        let matches = self
            .active
            .get(id)
            .is_some_and(|t| t.generation == generation);
        if !matches {
            return Elapsed::Stale;
        }

        let Some(t) = self.active.remove(id) else {
            return Elapsed::Stale;
        };
        if t.capped {
            Elapsed::Capped
        } else {
            self.delivered.insert(id.to_string(), t.fire_at);
            Elapsed::Due {
                fire_at: t.fire_at,
                repeating: t.repeating,
            }
        }
    }

    fn arm(&mut self, reminder: &Reminder, fire_at: NaiveDateTime, now: NaiveDateTime) {
        if let Some(previous) = self.active.remove(&reminder.id) {
            self.backend.cancel(previous.handle);
        }

        let TimerDelay { delay, capped } = timer_delay(fire_at, now, self.max_delay);
        self.next_generation += 1;
        let generation = self.next_generation;

        debug!(
            reminder = %reminder.id,
            %fire_at,
            delay_ms = delay.as_millis() as u64,
            capped,
            "arming reminder timer"
        );

        let handle = self.backend.arm(&reminder.id, generation, delay);
        self.active.insert(
            reminder.id.clone(),
            ArmedTimer {
                handle,
                generation,
                fire_at,
                capped,
                repeating: reminder.is_repeating(),
            },
        );
    }
}
