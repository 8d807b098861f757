use std::collections::HashMap;
use std::time::Duration as StdDuration;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use daybell_core::{
    AlertMessage, AlertSink, Elapsed, Recurrence, Reminder, ReminderDefinition, ReminderKind,
    ReminderScheduler, TimerBackend,
};

fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(hh, mm, 0)
        .unwrap()
}

/// Keeps pending timers so the test can "advance the clock" by hand.
#[derive(Default)]
struct ManualTimers {
    pending: HashMap<u64, (String, StdDuration)>,
}

impl TimerBackend for ManualTimers {
    type Handle = u64;

    fn arm(&mut self, reminder_id: &str, generation: u64, delay: StdDuration) -> u64 {
        self.pending
            .insert(generation, (reminder_id.to_string(), delay));
        generation
    }

    fn cancel(&mut self, handle: u64) {
        self.pending.remove(&handle);
    }
}

impl ManualTimers {
    /// Pop the soonest pending timer: (id, generation, delay).
    fn take_soonest(&mut self) -> Option<(String, u64, StdDuration)> {
        let generation = self
            .pending
            .iter()
            .min_by_key(|(generation, (_, delay))| (*delay, **generation))
            .map(|(g, _)| *g)?;
        let (id, delay) = self.pending.remove(&generation)?;
        Some((id, generation, delay))
    }
}

#[derive(Default)]
struct CollectingSink {
    rung: Vec<(String, String)>,
}

impl AlertSink for CollectingSink {
    fn ring(&mut self, reminder: &Reminder, message: &AlertMessage) -> anyhow::Result<()> {
        self.rung.push((reminder.id.clone(), message.title.clone()));
        Ok(())
    }
}

fn reminders() -> Vec<Reminder> {
    vec![
        Reminder::new(
            "breakfast",
            ReminderDefinition::new(ReminderKind::Meal, "Breakfast", at(2024, 1, 5, 7, 30))
                .with_recurrence(Recurrence::Weekdays)
                .with_lead_minutes(10),
        ),
        Reminder::new(
            "exam",
            ReminderDefinition::new(ReminderKind::Class, "Exam", at(2024, 1, 5, 9, 0)),
        ),
    ]
}

/// Drive the scheduler the way the harness does: fire the soonest timer,
/// ring, re-run a pass after repeating reminders.
#[test]
fn harness_loop_rings_each_occurrence_once() {
    let list = reminders();
    let mut scheduler = ReminderScheduler::new(ManualTimers::default());
    let mut sink = CollectingSink::default();

    let mut now = at(2024, 1, 5, 7, 0);
    scheduler.reschedule_all(&list, now);
    assert_eq!(scheduler.armed_count(), 2);

    let mut fired_at = Vec::new();
    for _ in 0..3 {
        let (id, generation, _) = scheduler.backend_mut().take_soonest().unwrap();

        match scheduler.on_elapsed(&id, generation) {
            Elapsed::Due { fire_at, repeating } => {
                now = fire_at;
                let reminder = list.iter().find(|r| r.id == id).unwrap();
                sink.ring(reminder, &AlertMessage::for_reminder(reminder)).unwrap();
                fired_at.push(fire_at);
                if repeating {
                    scheduler.reschedule_all(&list, now);
                }
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    assert_eq!(
        fired_at,
        vec![at(2024, 1, 5, 7, 20), at(2024, 1, 5, 9, 0), at(2024, 1, 8, 7, 20)]
    );
    assert_eq!(sink.rung[0].1, "Meal: Breakfast");
    assert_eq!(sink.rung[1].0, "exam");
    // Only the weekday breakfast remains armed; the exam is spent.
    assert_eq!(scheduler.armed_count(), 1);
    assert!(scheduler.armed("exam").is_none());
}

/// Two reminders due at the same instant: the pass run after the first one
/// rings must keep the second armed.
#[test]
fn simultaneous_reminders_both_ring() {
    let list = vec![
        Reminder::new(
            "a",
            ReminderDefinition::new(ReminderKind::Wake, "Alarm", at(2024, 1, 1, 7, 0))
                .with_recurrence(Recurrence::Daily),
        ),
        Reminder::new(
            "b",
            ReminderDefinition::new(ReminderKind::Meal, "Vitamins", at(2024, 1, 1, 7, 0))
                .with_recurrence(Recurrence::Daily),
        ),
    ];
    let mut scheduler = ReminderScheduler::new(ManualTimers::default());
    scheduler.reschedule_all(&list, at(2024, 1, 2, 6, 0));

    let mut rung = Vec::new();
    for _ in 0..2 {
        let (id, generation, _) = scheduler.backend_mut().take_soonest().unwrap();
        match scheduler.on_elapsed(&id, generation) {
            Elapsed::Due { fire_at, repeating } => {
                rung.push((id, fire_at));
                assert!(repeating);
                // The pass runs a few milliseconds after the instant.
                scheduler.reschedule_all(&list, fire_at + Duration::milliseconds(5));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    rung.sort();
    assert_eq!(
        rung,
        vec![
            ("a".to_string(), at(2024, 1, 2, 7, 0)),
            ("b".to_string(), at(2024, 1, 2, 7, 0)),
        ]
    );
    assert_eq!(scheduler.armed("a").unwrap().fire_at, at(2024, 1, 3, 7, 0));
    assert_eq!(scheduler.armed("b").unwrap().fire_at, at(2024, 1, 3, 7, 0));
}

#[test]
fn capped_wait_rechecks_until_due() {
    let list = vec![Reminder::new(
        "term",
        ReminderDefinition::new(ReminderKind::Class, "Term starts", at(2024, 1, 10, 9, 0)),
    )];
    let cap = StdDuration::from_secs(24 * 3600);
    let mut scheduler = ReminderScheduler::with_max_delay(ManualTimers::default(), cap);

    let mut now = at(2024, 1, 5, 9, 0);
    scheduler.reschedule_all(&list, now);

    let mut checkpoints = 0;
    loop {
        let (id, generation, delay) = scheduler.backend_mut().take_soonest().unwrap();
        now += Duration::from_std(delay).unwrap();
        match scheduler.on_elapsed(&id, generation) {
            Elapsed::Capped => {
                checkpoints += 1;
                scheduler.reschedule_all(&list, now);
            }
            Elapsed::Due { fire_at, .. } => {
                assert_eq!(fire_at, at(2024, 1, 10, 9, 0));
                break;
            }
            Elapsed::Stale => panic!("stale timer"),
        }
    }

    // Five days out with a one-day cap: four checkpoints, then the alert.
    assert_eq!(checkpoints, 4);
    assert_eq!(now, at(2024, 1, 10, 9, 0));
}

/// Timers sleep on a monotonic clock that stops during suspend. On wake the
/// wall clock is days ahead: each reminder may ring its one overdue timer,
/// then resumes from the current time.
#[test]
fn wake_after_suspend_rings_each_reminder_at_most_once() {
    let list = vec![
        Reminder::new(
            "a",
            ReminderDefinition::new(ReminderKind::Wake, "Alarm", at(2024, 1, 1, 7, 0))
                .with_recurrence(Recurrence::Daily),
        ),
        Reminder::new(
            "b",
            ReminderDefinition::new(ReminderKind::Meal, "Breakfast", at(2024, 1, 1, 8, 0))
                .with_recurrence(Recurrence::Daily),
        ),
    ];
    let mut scheduler = ReminderScheduler::new(ManualTimers::default());
    scheduler.reschedule_all(&list, at(2024, 1, 2, 6, 0));

    let now = at(2024, 1, 5, 9, 0);
    // The periodic rescan gets in before the overdue timers are handled.
    scheduler.reschedule_all(&list, now);

    let mut rung = Vec::new();
    for _ in 0..10 {
        let overdue = list
            .iter()
            .any(|r| scheduler.armed(&r.id).is_some_and(|t| t.fire_at <= now));
        if !overdue {
            break;
        }
        let (id, generation, _) = scheduler.backend_mut().take_soonest().unwrap();
        if let Elapsed::Due { fire_at, repeating } = scheduler.on_elapsed(&id, generation) {
            rung.push((id, fire_at));
            if repeating {
                scheduler.reschedule_all(&list, now);
            }
        }
    }

    rung.sort();
    assert_eq!(
        rung,
        vec![
            ("a".to_string(), at(2024, 1, 2, 7, 0)),
            ("b".to_string(), at(2024, 1, 2, 8, 0)),
        ]
    );
    assert_eq!(scheduler.armed("a").unwrap().fire_at, at(2024, 1, 6, 7, 0));
    assert_eq!(scheduler.armed("b").unwrap().fire_at, at(2024, 1, 6, 8, 0));
}

/// A one-off added while another reminder waits on an old timer is judged
/// against the current time only.
#[test]
fn past_one_off_is_not_armed_by_another_reminders_old_timer() {
    let daily = Reminder::new(
        "a",
        ReminderDefinition::new(ReminderKind::Wake, "Alarm", at(2024, 1, 1, 7, 0))
            .with_recurrence(Recurrence::Daily),
    );
    let mut scheduler = ReminderScheduler::new(ManualTimers::default());
    scheduler.reschedule_all(std::slice::from_ref(&daily), at(2024, 1, 2, 6, 0));

    let list = vec![
        daily,
        Reminder::new(
            "dentist",
            ReminderDefinition::new(ReminderKind::Class, "Dentist", at(2024, 1, 3, 10, 0)),
        ),
    ];
    let out = scheduler.reschedule_all(&list, at(2024, 1, 5, 9, 0));
    assert_eq!(out[1].fire_at, None);
    assert!(scheduler.armed("dentist").is_none());
}
