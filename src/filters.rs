use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::deadline;
use crate::models::{AnnotatedEvent, Event, EventStatus};

/// Category selection for the event list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategorySelector {
    #[default]
    All,
    /// Every category, ordered by days remaining.
    Priority,
    /// Lower-cased category name.
    Named(String),
}

impl CategorySelector {
    fn matches(&self, event: &Event) -> bool {
        match self {
            CategorySelector::All | CategorySelector::Priority => true,
            CategorySelector::Named(name) => event
                .category
                .as_deref()
                .is_some_and(|category| category.to_lowercase() == *name),
        }
    }
}

impl FromStr for CategorySelector {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim().to_lowercase();
        Ok(match value.as_str() {
            "all" | "" => CategorySelector::All,
            "priority" => CategorySelector::Priority,
            _ => CategorySelector::Named(value),
        })
    }
}

impl fmt::Display for CategorySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategorySelector::All => f.write_str("all"),
            CategorySelector::Priority => f.write_str("priority"),
            CategorySelector::Named(name) => f.write_str(name),
        }
    }
}

/// The list selection. Transitions return a new value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub category: CategorySelector,
    pub status: Option<EventStatus>,
}

impl ViewState {
    /// Selecting a category also resets the status selector.
    pub fn with_category(&self, category: CategorySelector) -> Self {
        ViewState {
            category,
            status: None,
        }
    }

    pub fn with_status(&self, status: Option<EventStatus>) -> Self {
        ViewState {
            category: self.category.clone(),
            status,
        }
    }
}

pub fn apply_filters<'a>(
    events: &'a [Event],
    state: &ViewState,
    now: DateTime<Utc>,
) -> Vec<AnnotatedEvent<'a>> {
    let mut filtered: Vec<AnnotatedEvent<'a>> = events
        .iter()
        .filter(|event| state.category.matches(event))
        .filter(|event| match &state.status {
            Some(status) => event.status.as_ref() == Some(status),
            None => true,
        })
        .map(|event| deadline::annotate(event, now))
        .collect();

    if state.category == CategorySelector::Priority {
        filtered.sort_by(|a, b| by_days_left(a.days_left, b.days_left));
    }

    filtered
}

/// Ascending by days remaining; undated events go last.
pub(crate) fn by_days_left(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;

    fn names(view: &[AnnotatedEvent<'_>]) -> Vec<String> {
        view.iter().map(|entry| entry.event.name.clone()).collect()
    }

    fn sample_events() -> Vec<Event> {
        let mut hackathon = fixtures::event_in_days("Hack Night", 5, Some(EventStatus::Registered));
        hackathon.category = Some("Hackathon".to_string());
        let mut workshop = fixtures::event_in_days("Rust Workshop", 2, None);
        workshop.category = Some("Workshop".to_string());
        let mut uncategorized = fixtures::event_in_days("Mystery", 2, Some(EventStatus::Registered));
        uncategorized.category = None;
        vec![hackathon, workshop, uncategorized]
    }

    #[test]
    fn all_keeps_snapshot_order() {
        let events = sample_events();
        let view = apply_filters(&events, &ViewState::default(), fixtures::now());
        assert_eq!(names(&view), vec!["Hack Night", "Rust Workshop", "Mystery"]);
    }

    #[test]
    fn category_match_ignores_case() {
        let events = sample_events();
        let state = ViewState::default().with_category("WORKSHOP".parse().unwrap());
        let view = apply_filters(&events, &state, fixtures::now());
        assert_eq!(names(&view), vec!["Rust Workshop"]);
    }

    #[test]
    fn category_and_status_intersect() {
        let events = sample_events();
        let state = ViewState::default()
            .with_category("hackathon".parse().unwrap())
            .with_status(Some(EventStatus::Registered));
        let view = apply_filters(&events, &state, fixtures::now());
        assert_eq!(names(&view), vec!["Hack Night"]);

        let state = state.with_status(Some(EventStatus::Attended));
        assert!(apply_filters(&events, &state, fixtures::now()).is_empty());
    }

    #[test]
    fn priority_sorts_by_days_left_stably() {
        let events = sample_events();
        let state = ViewState::default().with_category(CategorySelector::Priority);
        let view = apply_filters(&events, &state, fixtures::now());
        assert_eq!(names(&view), vec!["Rust Workshop", "Mystery", "Hack Night"]);

        let again = apply_filters(&events, &state, fixtures::now());
        assert_eq!(view, again);
    }

    #[test]
    fn priority_puts_malformed_deadlines_last() {
        let mut events = sample_events();
        events[1].registration_deadline = "tbd".to_string();
        let state = ViewState::default().with_category(CategorySelector::Priority);
        let view = apply_filters(&events, &state, fixtures::now());
        assert_eq!(names(&view), vec!["Mystery", "Hack Night", "Rust Workshop"]);
    }

    #[test]
    fn selecting_category_resets_status_but_not_the_reverse() {
        let state = ViewState::default()
            .with_category("workshop".parse().unwrap())
            .with_status(Some(EventStatus::Registered));
        assert_eq!(state.category, CategorySelector::Named("workshop".to_string()));
        assert_eq!(state.status, Some(EventStatus::Registered));

        let state = state.with_category(CategorySelector::All);
        assert_eq!(state.status, None);
    }

    #[test]
    fn parses_sentinels() {
        assert_eq!("All".parse::<CategorySelector>().unwrap(), CategorySelector::All);
        assert_eq!(
            "priority".parse::<CategorySelector>().unwrap(),
            CategorySelector::Priority
        );
    }
}
