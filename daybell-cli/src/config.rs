use anyhow::{Context, Result};
use chrono_tz::Tz;
use daybell_core::time::parse_timezone;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::state::ensure_daybell_home;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scheduler: SchedulerSection,
    pub alerts: AlertsSection,
    pub templates: TemplatesSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    /// Longest single timer; longer waits re-check at this interval.
    pub max_delay_ms: u64,
    /// How often `daybell run` reloads the reminder file.
    pub rescan_interval_secs: u64,
    /// IANA zone used for "now". System zone when unset.
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsSection {
    pub terminal_bell: bool,
    pub desktop_notification: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesSection {
    pub default_lead_minutes: u32,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            max_delay_ms: daybell_core::DEFAULT_MAX_DELAY.as_millis() as u64,
            rescan_interval_secs: 60,
            timezone: None,
        }
    }
}

impl Default for AlertsSection {
    fn default() -> Self {
        Self {
            terminal_bell: true,
            desktop_notification: true,
        }
    }
}

impl Default for TemplatesSection {
    fn default() -> Self {
        Self {
            default_lead_minutes: 5,
        }
    }
}

impl SchedulerSection {
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms.max(1))
    }

    pub fn rescan_interval(&self) -> Duration {
        Duration::from_secs(self.rescan_interval_secs.max(1))
    }

    pub fn timezone(&self) -> Result<Option<Tz>> {
        self.timezone.as_deref().map(parse_timezone).transpose()
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_daybell_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config() -> Result<()> {
    let cfg = load_config()?;
    let p = config_path()?;
    println!("# {}", p.display());
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    Ok(())
}
