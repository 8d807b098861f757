//! Quick-add templates of the form `kind:Title:HH:MM`.

use anyhow::{bail, Result};
use chrono::NaiveDate;

use crate::reminder::{Recurrence, ReminderDefinition, ReminderKind};
use crate::time::parse_time_of_day;

/// Build a daily reminder anchored on `today` from a template string.
///
/// The time component keeps its own colon, so only the first two `:` split.
pub fn definition_from_template(
    template: &str,
    today: NaiveDate,
    lead_minutes: u32,
) -> Result<ReminderDefinition> {
    let mut parts = template.splitn(3, ':');
    let (Some(kind), Some(title), Some(time)) = (parts.next(), parts.next(), parts.next()) else {
        bail!("template must look like kind:Title:HH:MM, got '{template}'");
    };

    let kind: ReminderKind = kind.parse()?;
    let title = title.trim();
    if title.is_empty() {
        bail!("template title is empty: '{template}'");
    }
    let time = parse_time_of_day(time)?;

    Ok(ReminderDefinition::new(kind, title, today.and_time(time))
        .with_recurrence(Recurrence::Daily)
        .with_lead_minutes(lead_minutes))
}
