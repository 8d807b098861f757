//! Alert wording and the sink trait that turns a firing reminder into noise.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::reminder::{Reminder, ReminderKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertMessage {
    pub title: String,
    pub body: String,
}

impl AlertMessage {
    pub fn for_reminder(reminder: &Reminder) -> Self {
        let kind = reminder.definition.kind;
        Self {
            title: format!("{}: {}", kind_label(kind), reminder.definition.title),
            body: kind_body(kind).to_string(),
        }
    }
}

fn kind_label(kind: ReminderKind) -> &'static str {
    match kind {
        ReminderKind::Class => "Class",
        ReminderKind::Meal => "Meal",
        ReminderKind::Wake => "Wake-up",
    }
}

fn kind_body(kind: ReminderKind) -> &'static str {
    match kind {
        ReminderKind::Class => "Class is starting soon.",
        ReminderKind::Meal => "Time to eat something",
        ReminderKind::Wake => "Wake up!",
    }
}

/// Buzz shape for sinks that can pulse (a terminal bell, a vibration motor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPattern {
    /// Alternating on/off durations, starting with "on".
    pub vibration_ms: &'static [u32],
}

impl AlertPattern {
    /// Number of "on" segments.
    pub fn pulses(&self) -> usize {
        self.vibration_ms.len().div_ceil(2)
    }
}

pub const DEFAULT_PATTERN: AlertPattern = AlertPattern {
    vibration_ms: &[200, 100, 200, 100, 400],
};

/// Produces a human-perceptible signal for a firing reminder.
pub trait AlertSink {
    fn ring(&mut self, reminder: &Reminder, message: &AlertMessage) -> Result<()>;
}
