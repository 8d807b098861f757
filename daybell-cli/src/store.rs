//! JSON-file reminder store.

use anyhow::{Context, Result};
use daybell_core::{Reminder, ReminderDefinition};
use std::fs;
use std::path::{Path, PathBuf};

pub struct ReminderStore {
    path: PathBuf,
}

impl ReminderStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file means no reminders yet; a corrupt one is an error.
    pub fn load(&self) -> Result<Vec<Reminder>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let s = fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        if s.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&s).with_context(|| format!("parse {}", self.path.display()))
    }

    pub fn save(&self, reminders: &[Reminder]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(reminders)?;
        fs::write(&self.path, json).with_context(|| format!("write {}", self.path.display()))?;
        Ok(())
    }

    /// Sorted by anchor, earliest first.
    pub fn list_sorted(&self) -> Result<Vec<Reminder>> {
        let mut all = self.load()?;
        all.sort_by_key(|r| r.definition.anchor);
        Ok(all)
    }

    pub fn add(&self, definition: ReminderDefinition) -> Result<Reminder> {
        let mut all = self.load()?;
        let reminder = Reminder::new(uuid::Uuid::new_v4().to_string(), definition);
        all.push(reminder.clone());
        self.save(&all)?;
        Ok(reminder)
    }

    pub fn find(&self, id: &str) -> Result<Option<Reminder>> {
        Ok(self.load()?.into_iter().find(|r| r.id == id))
    }

    /// Replace a reminder in place. Returns false when the id is unknown.
    pub fn update(&self, reminder: Reminder) -> Result<bool> {
        let mut all = self.load()?;
        let Some(slot) = all.iter_mut().find(|r| r.id == reminder.id) else {
            return Ok(false);
        };
        *slot = reminder;
        self.save(&all)?;
        Ok(true)
    }

    pub fn remove(&self, id: &str) -> Result<bool> {
        let mut all = self.load()?;
        let before = all.len();
        all.retain(|r| r.id != id);
        if all.len() == before {
            return Ok(false);
        }
        self.save(&all)?;
        Ok(true)
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("remove {}", self.path.display()))?;
        }
        Ok(())
    }

    /// The stored list as pretty JSON (an empty list when nothing is stored).
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.load()?)?)
    }
}
