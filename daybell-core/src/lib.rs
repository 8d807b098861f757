//! daybell-core: reminder model, recurrence resolution and scheduling for Daybell

pub mod alert;
pub mod recurrence;
pub mod reminder;
pub mod scheduler;
pub mod template;
pub mod time;

pub use alert::{AlertMessage, AlertPattern, AlertSink, DEFAULT_PATTERN};
pub use recurrence::{next_fire_instant, resolve_all, upcoming, Resolution};
pub use reminder::{Recurrence, Reminder, ReminderDefinition, ReminderId, ReminderKind};
pub use scheduler::{
    timer_delay, ArmedTimer, Elapsed, ReminderScheduler, TimerBackend, TimerDelay,
    DEFAULT_MAX_DELAY,
};
pub use template::definition_from_template;
