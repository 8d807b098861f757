use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$DAYBELL_HOME`, or `~/.daybell`.
pub fn daybell_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("DAYBELL_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".daybell"))
}

pub fn ensure_daybell_home() -> Result<PathBuf> {
    let dir = daybell_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn reminders_path() -> Result<PathBuf> {
    Ok(ensure_daybell_home()?.join("reminders.json"))
}
