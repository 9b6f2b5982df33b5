use chrono::{DateTime, Utc};

use crate::filters::{apply_filters, ViewState};
use crate::models::{AnnotatedEvent, Event, EventStats};
use crate::priority::top_priority;
use crate::stats::compute_stats;

/// Everything a dashboard needs from one snapshot at one instant.
#[derive(Debug)]
pub struct Dashboard<'a> {
    pub visible: Vec<AnnotatedEvent<'a>>,
    pub stats: EventStats,
    pub priority: Vec<AnnotatedEvent<'a>>,
}

pub fn derive_dashboard<'a>(
    events: &'a [Event],
    state: &ViewState,
    now: DateTime<Utc>,
    priority_limit: usize,
) -> Dashboard<'a> {
    Dashboard {
        visible: apply_filters(events, state, now),
        stats: compute_stats(events, now),
        priority: top_priority(events, priority_limit, now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::CategorySelector;
    use crate::models::{fixtures, EventStatus, UrgencyTier};

    #[test]
    fn stats_ignore_the_active_filter() {
        let events = vec![
            fixtures::event_in_days("Registered one", 5, Some(EventStatus::Registered)),
            fixtures::event_in_days("Attended one", -3, Some(EventStatus::Attended)),
        ];
        let state = ViewState::default().with_status(Some(EventStatus::Attended));

        let dashboard = derive_dashboard(&events, &state, fixtures::now(), 5);
        assert_eq!(dashboard.visible.len(), 1);
        assert_eq!(dashboard.visible[0].urgency, UrgencyTier::Settled);
        assert_eq!(dashboard.stats.total, 2);
        assert_eq!(dashboard.priority.len(), 1);
        assert_eq!(dashboard.priority[0].event.name, "Registered one");
    }

    #[test]
    fn priority_scenario_keeps_tied_order() {
        let events = vec![
            fixtures::event_in_days("five", 5, None),
            fixtures::event_in_days("two-a", 2, None),
            fixtures::event_in_days("two-b", 2, None),
        ];
        let state = ViewState::default().with_category(CategorySelector::Priority);

        let dashboard = derive_dashboard(&events, &state, fixtures::now(), 5);
        let names: Vec<&str> = dashboard
            .visible
            .iter()
            .map(|entry| entry.event.name.as_str())
            .collect();
        assert_eq!(names, vec!["two-a", "two-b", "five"]);
    }
}
