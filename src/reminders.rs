use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::deadline::REMINDER_WINDOW_DAYS;
use crate::models::{Event, Reminder};

/// Ids already reminded during this session. Entries are never removed.
#[derive(Debug, Default)]
pub struct ReminderLedger {
    reminded: HashSet<String>,
}

impl ReminderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session store key for an event.
    pub fn key(id: Uuid) -> String {
        format!("reminded_{id}")
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.reminded.contains(&Self::key(id))
    }

    pub fn len(&self) -> usize {
        self.reminded.len()
    }

    fn record(&mut self, id: Uuid) {
        self.reminded.insert(Self::key(id));
    }
}

pub fn check_reminders<'a>(
    events: &'a [Event],
    ledger: &mut ReminderLedger,
    now: DateTime<Utc>,
) -> Vec<Reminder<'a>> {
    let mut fired = Vec::new();

    for event in events {
        if !event.reminder || event.is_attended() {
            continue;
        }

        let Some(days_left) = event.days_left(now) else {
            continue;
        };

        if !(0..=REMINDER_WINDOW_DAYS).contains(&days_left) || ledger.contains(event.id) {
            continue;
        }
        ledger.record(event.id);

        tracing::info!(event_id = %event.id, days_left, "reminder fired");
        fired.push(Reminder {
            event,
            days_left,
            message: reminder_message(&event.name, days_left),
        });
    }

    fired
}

fn reminder_message(name: &str, days_left: i64) -> String {
    match days_left {
        0 => format!("Reminder: \"{name}\" deadline is today!"),
        1 => format!("Reminder: \"{name}\" deadline is tomorrow!"),
        _ => format!("Reminder: \"{name}\" deadline is near!"),
    }
}
