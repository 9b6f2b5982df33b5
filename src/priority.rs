use chrono::{DateTime, Utc};

use crate::deadline;
use crate::filters::by_days_left;
use crate::models::{AnnotatedEvent, Event};

/// The `limit` soonest-due events that still need action. Attended events and
/// events with an unparseable deadline are left out.
pub fn top_priority(events: &[Event], limit: usize, now: DateTime<Utc>) -> Vec<AnnotatedEvent<'_>> {
    let mut active: Vec<AnnotatedEvent<'_>> = events
        .iter()
        .filter(|event| !event.is_attended())
        .map(|event| deadline::annotate(event, now))
        .filter(|annotated| annotated.days_left.is_some())
        .collect();

    active.sort_by(|a, b| by_days_left(a.days_left, b.days_left));
    active.truncate(limit);
    active
}
