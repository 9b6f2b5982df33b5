use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::models::{AnnotatedEvent, Event, EventStatus, UrgencyTier};

/// Events due within this many days are urgent.
pub const URGENT_WINDOW_DAYS: i64 = 7;
/// Reminders fire when the deadline is between today and this many days out.
pub const REMINDER_WINDOW_DAYS: i64 = 1;
/// Size of the priority view.
pub const DEFAULT_PRIORITY_LIMIT: usize = 5;

const MILLIS_PER_DAY: i64 = 86_400_000;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Whole days until `deadline`, rounded up. Negative once the deadline has passed.
pub fn days_left(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (deadline - now).num_milliseconds();
    let days = millis / MILLIS_PER_DAY;
    // Integer division truncates toward zero, which is already the ceiling
    // for negative values.
    if millis % MILLIS_PER_DAY > 0 {
        days + 1
    } else {
        days
    }
}

/// Parses a stored deadline. Accepts RFC 3339, datetime-local style
/// timestamps and bare dates; naive values are taken as UTC.
pub fn parse_deadline(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

pub fn urgency_tier(days_left: i64, status: Option<&EventStatus>) -> UrgencyTier {
    if status == Some(&EventStatus::Attended) {
        return UrgencyTier::Settled;
    }

    match days_left {
        d if d < 0 => UrgencyTier::Past,
        d if d <= URGENT_WINDOW_DAYS => UrgencyTier::Critical,
        _ => UrgencyTier::Normal,
    }
}

/// The raw urgency predicate used for counting. Includes passed deadlines.
pub fn is_urgent(days_left: i64, status: Option<&EventStatus>) -> bool {
    days_left <= URGENT_WINDOW_DAYS && status != Some(&EventStatus::Attended)
}

pub fn annotate(event: &Event, now: DateTime<Utc>) -> AnnotatedEvent<'_> {
    let days_left = event.days_left(now);
    let urgency = match days_left {
        _ if event.is_attended() => UrgencyTier::Settled,
        Some(days) => urgency_tier(days, event.status.as_ref()),
        None => UrgencyTier::Unknown,
    };

    AnnotatedEvent {
        event,
        days_left,
        urgency,
    }
}
