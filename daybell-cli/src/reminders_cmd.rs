use anyhow::{bail, Context, Result};
use clap::{Subcommand, ValueEnum};
use daybell_core::time::{combine_date_time, format_local, local_now, parse_reference};
use daybell_core::{
    definition_from_template, next_fire_instant, upcoming, Recurrence, Reminder,
    ReminderDefinition, ReminderKind,
};
use std::fs;
use std::path::PathBuf;

use crate::config::load_config;
use crate::store::ReminderStore;

#[derive(Subcommand, Debug)]
pub enum RemindersCommand {
    /// Add a reminder
    Add {
        #[arg(long, value_enum)]
        kind: KindArg,

        #[arg(long)]
        title: String,

        /// Date of the first occurrence (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Time of day (HH:MM, 24h)
        #[arg(long)]
        time: String,

        #[arg(long, value_enum, default_value_t = RepeatArg::None)]
        repeat: RepeatArg,

        /// Notify this many minutes before
        #[arg(long, default_value_t = 0)]
        lead: u32,
    },

    /// Quick-add a daily reminder for today from "kind:Title:HH:MM"
    Template {
        template: String,

        /// Lead minutes (default from config.templates.default_lead_minutes)
        #[arg(long)]
        lead: Option<u32>,
    },

    /// List reminders by anchor time, with their next fire time
    List,

    /// Change fields of an existing reminder
    Edit {
        id: String,

        #[arg(long)]
        title: Option<String>,

        /// New date (YYYY-MM-DD); keeps the current time unless --time is given
        #[arg(long)]
        date: Option<String>,

        /// New time (HH:MM); keeps the current date unless --date is given
        #[arg(long)]
        time: Option<String>,

        #[arg(long, value_enum)]
        repeat: Option<RepeatArg>,

        #[arg(long)]
        lead: Option<u32>,
    },

    /// Delete one reminder
    Remove { id: String },

    /// Delete all reminders
    Clear {
        /// Required: confirms deleting everything
        #[arg(long, default_value_t = false)]
        yes: bool,
    },

    /// Write all reminders as JSON to a file (or stdout)
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show upcoming fire times without arming anything
    Next {
        /// Reference instant "YYYY-MM-DD HH:MM" (default: now)
        #[arg(long)]
        at: Option<String>,

        /// Fire times to show per reminder
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Class,
    Meal,
    Wake,
}

impl From<KindArg> for ReminderKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Class => ReminderKind::Class,
            KindArg::Meal => ReminderKind::Meal,
            KindArg::Wake => ReminderKind::Wake,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RepeatArg {
    None,
    Daily,
    Weekdays,
    Weekly,
}

impl From<RepeatArg> for Recurrence {
    fn from(r: RepeatArg) -> Self {
        match r {
            RepeatArg::None => Recurrence::None,
            RepeatArg::Daily => Recurrence::Daily,
            RepeatArg::Weekdays => Recurrence::Weekdays,
            RepeatArg::Weekly => Recurrence::Weekly,
        }
    }
}

pub fn run(store: &ReminderStore, cmd: RemindersCommand) -> Result<()> {
    match cmd {
        RemindersCommand::Add {
            kind,
            title,
            date,
            time,
            repeat,
            lead,
        } => add(store, kind, title, &date, &time, repeat, lead),
        RemindersCommand::Template { template, lead } => add_template(store, &template, lead),
        RemindersCommand::List => list(store),
        RemindersCommand::Edit {
            id,
            title,
            date,
            time,
            repeat,
            lead,
        } => edit(
            store,
            &id,
            EditFields {
                title,
                date,
                time,
                repeat,
                lead,
            },
        ),
        RemindersCommand::Remove { id } => remove(store, &id),
        RemindersCommand::Clear { yes } => clear(store, yes),
        RemindersCommand::Export { out } => export(store, out),
        RemindersCommand::Next { at, count } => next(store, at.as_deref(), count),
    }
}

fn add(
    store: &ReminderStore,
    kind: KindArg,
    title: String,
    date: &str,
    time: &str,
    repeat: RepeatArg,
    lead: u32,
) -> Result<()> {
    let title = title.trim().to_string();
    if title.is_empty() {
        bail!("title must not be empty");
    }
    let anchor = combine_date_time(date, time)?;
    let definition = ReminderDefinition::new(kind.into(), title, anchor)
        .with_recurrence(repeat.into())
        .with_lead_minutes(lead);

    let r = store.add(definition)?;
    println!("Added {}", describe(&r));
    Ok(())
}

fn add_template(store: &ReminderStore, template: &str, lead: Option<u32>) -> Result<()> {
    let cfg = load_config()?;
    let tz = cfg.scheduler.timezone()?;
    let lead = lead.unwrap_or(cfg.templates.default_lead_minutes);
    let today = local_now(tz).date();

    let definition = definition_from_template(template, today, lead)?;
    let r = store.add(definition)?;
    println!("Added {}", describe(&r));
    Ok(())
}

fn list(store: &ReminderStore) -> Result<()> {
    let reminders = store.list_sorted()?;
    if reminders.is_empty() {
        println!("No reminders in {}", store.path().display());
        return Ok(());
    }

    let cfg = load_config()?;
    let now = local_now(cfg.scheduler.timezone()?);
    for r in &reminders {
        let next = next_fire_instant(&r.definition, now)
            .map(format_local)
            .unwrap_or_else(|| "-".to_string());
        println!("{}\n    next alert: {}", describe(r), next);
    }
    Ok(())
}

struct EditFields {
    title: Option<String>,
    date: Option<String>,
    time: Option<String>,
    repeat: Option<RepeatArg>,
    lead: Option<u32>,
}

fn edit(store: &ReminderStore, id: &str, fields: EditFields) -> Result<()> {
    let Some(mut r) = store.find(id)? else {
        bail!("no reminder with id {id}");
    };
    apply_edit(&mut r.definition, fields)?;
    store.update(r.clone())?;
    println!("Updated {}", describe(&r));
    Ok(())
}

/// Apply edits; an unknown stored repeat rule is normalized to `none`.
fn apply_edit(d: &mut ReminderDefinition, fields: EditFields) -> Result<()> {
    if let Some(title) = fields.title {
        let title = title.trim();
        if title.is_empty() {
            bail!("title must not be empty");
        }
        d.title = title.to_string();
    }

    if fields.date.is_some() || fields.time.is_some() {
        let date = fields
            .date
            .unwrap_or_else(|| d.anchor.date().format("%Y-%m-%d").to_string());
        let time = fields
            .time
            .unwrap_or_else(|| d.anchor.time().format("%H:%M").to_string());
        d.anchor = combine_date_time(&date, &time)?;
    }

    d.recurrence = match fields.repeat {
        Some(r) => r.into(),
        None => std::mem::take(&mut d.recurrence).normalized(),
    };

    if let Some(lead) = fields.lead {
        d.lead_minutes = lead;
    }
    Ok(())
}

fn remove(store: &ReminderStore, id: &str) -> Result<()> {
    if !store.remove(id)? {
        bail!("no reminder with id {id}");
    }
    println!("Removed {id}");
    Ok(())
}

fn clear(store: &ReminderStore, yes: bool) -> Result<()> {
    if !yes {
        bail!("refusing to delete all reminders without --yes");
    }
    store.clear()?;
    println!("Deleted all reminders in {}", store.path().display());
    Ok(())
}

fn export(store: &ReminderStore, out: Option<PathBuf>) -> Result<()> {
    let json = store.export_json()?;
    match out {
        Some(p) => {
            fs::write(&p, &json).with_context(|| format!("write {}", p.display()))?;
            println!("Exported to {}", p.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn next(store: &ReminderStore, at: Option<&str>, count: usize) -> Result<()> {
    let reference = match at {
        Some(s) => parse_reference(s)?,
        None => local_now(load_config()?.scheduler.timezone()?),
    };

    let reminders = store.load()?;
    let mut rows: Vec<(Option<chrono::NaiveDateTime>, &Reminder, Vec<chrono::NaiveDateTime>)> =
        Vec::new();
    for r in &reminders {
        let fires = upcoming(&r.definition, reference, count.max(1));
        rows.push((fires.first().copied(), r, fires));
    }
    // Soonest first; reminders that never fire again go last.
    rows.sort_by_key(|(first, _, _)| (first.is_none(), *first));

    println!("Reference: {}\n", format_local(reference));
    for (_, r, fires) in rows {
        if fires.is_empty() {
            println!("- {} [{}]: no further alerts", r.definition.title, r.id);
            continue;
        }
        let when: Vec<String> = fires.into_iter().map(format_local).collect();
        println!("- {} [{}]: {}", r.definition.title, r.id, when.join(", "));
    }
    Ok(())
}

fn describe(r: &Reminder) -> String {
    let d = &r.definition;
    format!(
        "[{}] {} ({}) at {} repeat: {} -{}m",
        r.id,
        d.title,
        d.kind,
        format_local(d.anchor),
        d.recurrence,
        d.lead_minutes
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn definition() -> ReminderDefinition {
        let anchor = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        ReminderDefinition::new(ReminderKind::Class, "Physics", anchor)
            .with_recurrence(Recurrence::Unrecognized("monthly".to_string()))
            .with_lead_minutes(5)
    }

    fn no_changes() -> EditFields {
        EditFields {
            title: None,
            date: None,
            time: None,
            repeat: None,
            lead: None,
        }
    }

    #[test]
    fn edit_normalizes_unknown_repeat() {
        let mut d = definition();
        apply_edit(&mut d, no_changes()).unwrap();
        assert_eq!(d.recurrence, Recurrence::None);
        assert_eq!(d.lead_minutes, 5);
    }

    #[test]
    fn edit_time_keeps_date() {
        let mut d = definition();
        apply_edit(
            &mut d,
            EditFields {
                time: Some("14:15".to_string()),
                repeat: Some(RepeatArg::Weekdays),
                ..no_changes()
            },
        )
        .unwrap();
        assert_eq!(d.anchor.to_string(), "2024-03-01 14:15:00");
        assert_eq!(d.recurrence, Recurrence::Weekdays);
    }

    #[test]
    fn edit_rejects_blank_title() {
        let mut d = definition();
        let err = apply_edit(
            &mut d,
            EditFields {
                title: Some("   ".to_string()),
                ..no_changes()
            },
        );
        assert!(err.is_err());
        assert_eq!(d.title, "Physics");
    }
}
