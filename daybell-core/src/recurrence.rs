//! Recurrence resolution: when should a reminder fire next?
//!
//! Occurrences are found by stepping from the anchor one rule-step at a time
//! and retesting, never by closed-form arithmetic. Weekend skipping stays a
//! plain predicate on each candidate that way.

use chrono::{Datelike, Days, Duration, NaiveDateTime, Weekday};

use crate::reminder::{Recurrence, Reminder, ReminderDefinition, ReminderId};

/// Next alert instant for one reminder, as handed back to the harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub id: ReminderId,
    pub fire_at: Option<NaiveDateTime>,
}

/// Compute the next instant at or after `reference` when `definition` fires.
///
/// The fire instant is the occurrence minus the lead time. An occurrence
/// whose fire instant equals `reference` is due now and is returned.
pub fn next_fire_instant(
    definition: &ReminderDefinition,
    reference: NaiveDateTime,
) -> Option<NaiveDateTime> {
    let lead = Duration::minutes(i64::from(definition.lead_minutes));

    let step = match definition.recurrence {
        Recurrence::Daily | Recurrence::Weekdays => Days::new(1),
        Recurrence::Weekly => Days::new(7),
        Recurrence::None | Recurrence::Unrecognized(_) => {
            let fire = definition.anchor.checked_sub_signed(lead)?;
            return (fire >= reference).then_some(fire);
        }
    };
    let weekdays_only = definition.recurrence == Recurrence::Weekdays;

    let mut occurrence = definition.anchor;
    loop {
        if !weekdays_only || is_weekday(occurrence) {
            if let Some(fire) = occurrence.checked_sub_signed(lead) {
                if fire >= reference {
                    return Some(fire);
                }
            }
        }
        // Running off the end of the calendar means there is no next occurrence.
        occurrence = occurrence.checked_add_days(step)?;
    }
}

/// Resolve every reminder against the same reference, preserving input order.
pub fn resolve_all(reminders: &[Reminder], reference: NaiveDateTime) -> Vec<Resolution> {
    reminders
        .iter()
        .map(|r| Resolution {
            id: r.id.clone(),
            fire_at: next_fire_instant(&r.definition, reference),
        })
        .collect()
}

/// The next `count` fire instants, each resolved fresh from just after the
/// previous one.
pub fn upcoming(
    definition: &ReminderDefinition,
    reference: NaiveDateTime,
    count: usize,
) -> Vec<NaiveDateTime> {
    let mut out = Vec::with_capacity(count);
    let mut from = reference;
    while out.len() < count {
        let Some(fire) = next_fire_instant(definition, from) else {
            break;
        };
        out.push(fire);
        if !definition.recurrence.is_repeating() {
            break;
        }
        match fire.checked_add_signed(Duration::milliseconds(1)) {
            Some(next) => from = next,
            None => break,
        }
    }
    out
}

fn is_weekday(at: NaiveDateTime) -> bool {
    !matches!(at.weekday(), Weekday::Sat | Weekday::Sun)
}
