//! Reminder model: what the user asked to be reminded about, and when.
//!
//! Definitions are plain data. The resolver reads them and never writes back.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type ReminderId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderKind {
    Class,
    Meal,
    Wake,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderKind::Class => "class",
            ReminderKind::Meal => "meal",
            ReminderKind::Wake => "wake",
        }
    }
}

impl fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReminderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "class" => Ok(ReminderKind::Class),
            "meal" => Ok(ReminderKind::Meal),
            "wake" => Ok(ReminderKind::Wake),
            other => Err(anyhow::anyhow!("unknown reminder kind: {other}")),
        }
    }
}

/// How a reminder repeats.
///
/// Stored as a bare lowercase string. Anything outside the four known rules
/// is kept verbatim in `Unrecognized` and resolves like `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekdays,
    Weekly,
    Unrecognized(String),
}

impl Recurrence {
    /// Infallible parse; unknown values are preserved, not rejected.
    pub fn parse(s: &str) -> Self {
        match s {
            "none" => Recurrence::None,
            "daily" => Recurrence::Daily,
            "weekdays" => Recurrence::Weekdays,
            "weekly" => Recurrence::Weekly,
            other => Recurrence::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Recurrence::None => "none",
            Recurrence::Daily => "daily",
            Recurrence::Weekdays => "weekdays",
            Recurrence::Weekly => "weekly",
            Recurrence::Unrecognized(raw) => raw,
        }
    }

    /// True for the rules that produce more than one occurrence.
    pub fn is_repeating(&self) -> bool {
        matches!(
            self,
            Recurrence::Daily | Recurrence::Weekdays | Recurrence::Weekly
        )
    }

    /// Map an unknown rule to `None`. Known rules pass through.
    pub fn normalized(self) -> Self {
        match self {
            Recurrence::Unrecognized(_) => Recurrence::None,
            known => known,
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Recurrence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Recurrence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // `null` loads as one-off.
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map_or(Recurrence::None, |raw| Recurrence::parse(&raw)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderDefinition {
    pub kind: ReminderKind,
    pub title: String,

    /// Nominal time of the first occurrence, local wall clock.
    pub anchor: NaiveDateTime,

    #[serde(default)]
    pub recurrence: Recurrence,

    /// Minutes before each occurrence that the alert fires.
    #[serde(default)]
    pub lead_minutes: u32,
}

impl ReminderDefinition {
    pub fn new(kind: ReminderKind, title: impl Into<String>, anchor: NaiveDateTime) -> Self {
        Self {
            kind,
            title: title.into(),
            anchor,
            recurrence: Recurrence::None,
            lead_minutes: 0,
        }
    }

    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = recurrence;
        self
    }

    pub fn with_lead_minutes(mut self, minutes: u32) -> Self {
        self.lead_minutes = minutes;
        self
    }
}

/// A stored reminder: identity plus definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: ReminderId,
    #[serde(flatten)]
    pub definition: ReminderDefinition,
}

impl Reminder {
    pub fn new(id: impl Into<ReminderId>, definition: ReminderDefinition) -> Self {
        Self {
            id: id.into(),
            definition,
        }
    }

    pub fn is_repeating(&self) -> bool {
        self.definition.recurrence.is_repeating()
    }
}
