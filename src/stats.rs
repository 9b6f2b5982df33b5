use chrono::{DateTime, Utc};

use crate::deadline;
use crate::models::{Event, EventStatus, EventStats};

/// Summary counters over the whole snapshot, unfiltered.
///
/// `urgent_count` includes deadlines that have already passed; events whose
/// deadline cannot be parsed are never urgent.
pub fn compute_stats(events: &[Event], now: DateTime<Utc>) -> EventStats {
    events.iter().fold(EventStats::default(), |mut stats, event| {
        stats.total += 1;

        if event
            .days_left(now)
            .is_some_and(|days| deadline::is_urgent(days, event.status.as_ref()))
        {
            stats.urgent_count += 1;
        }

        match event.status {
            Some(EventStatus::Registered) => stats.registered_count += 1,
            Some(EventStatus::Attended) if event.certificate_url.is_none() => {
                stats.pending_certificate_count += 1
            }
            _ => {}
        }

        stats
    })
}
