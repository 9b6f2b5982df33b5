use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::filters::ViewState;
use crate::models::AnnotatedEvent;
use crate::view::Dashboard;

/// Days remaining as shown to a reader. Passed deadlines display as zero.
pub fn display_days(days_left: Option<i64>) -> String {
    match days_left {
        Some(days) => format!("{} days left", days.max(0)),
        None => "deadline unknown".to_string(),
    }
}

pub fn format_entry(entry: &AnnotatedEvent<'_>) -> String {
    let event = entry.event;
    let mut line = format!(
        "{} [{}] {}",
        event.name,
        entry.urgency.label(),
        display_days(entry.days_left)
    );
    if let Some(source) = &event.source {
        let _ = write!(line, " via {source}");
    }
    if let Some(status) = &event.status {
        let _ = write!(line, " ({status})");
    }
    line
}

pub fn build_report(state: &ViewState, now: DateTime<Utc>, dashboard: &Dashboard<'_>) -> String {
    let mut output = String::new();
    let stats = &dashboard.stats;

    let _ = writeln!(output, "# Event Deadline Report");
    let _ = write!(output, "Generated {} for category {}", now.format("%Y-%m-%d %H:%M UTC"), state.category);
    if let Some(status) = &state.status {
        let _ = write!(output, ", status {status}");
    }
    let _ = writeln!(output);
    let _ = writeln!(output);

    let _ = writeln!(output, "## Summary");
    let _ = writeln!(output, "- Total events: {}", stats.total);
    let _ = writeln!(output, "- Urgent: {}", stats.urgent_count);
    let _ = writeln!(output, "- Registered: {}", stats.registered_count);
    let _ = writeln!(output, "- Certificates pending: {}", stats.pending_certificate_count);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Needs Attention");

    if dashboard.priority.is_empty() {
        let _ = writeln!(output, "Nothing pending.");
    } else {
        for (index, entry) in dashboard.priority.iter().enumerate() {
            let _ = writeln!(output, "{}. {}", index + 1, format_entry(entry));
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Events");

    if dashboard.visible.is_empty() {
        let _ = writeln!(output, "No events found.");
    } else {
        for entry in dashboard.visible.iter() {
            let _ = writeln!(output, "- {}", format_entry(entry));
            if let Some(url) = &entry.event.certificate_url {
                let _ = writeln!(output, "  - certificate: {url}");
            }
            if let Some(url) = &entry.event.brochure_url {
                let _ = writeln!(output, "  - brochure: {url}");
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deadline;
    use crate::models::{fixtures, EventStatus};
    use crate::view::derive_dashboard;

    #[test]
    fn display_clamps_negative_days() {
        assert_eq!(display_days(Some(-3)), "0 days left");
        assert_eq!(display_days(Some(4)), "4 days left");
        assert_eq!(display_days(None), "deadline unknown");
    }

    #[test]
    fn entry_shows_tier_source_and_status() {
        let event = fixtures::event_in_days("RustConf", 3, Some(EventStatus::Registered));
        let line = format_entry(&deadline::annotate(&event, fixtures::now()));
        assert_eq!(line, "RustConf [critical] 3 days left via Devpost (Registered)");
    }

    #[test]
    fn report_lists_sections() {
        let mut attended = fixtures::event_in_days("Expo", -3, Some(EventStatus::Attended));
        attended.certificate_url = Some("https://cdn/cert.pdf".to_string());
        let events = vec![fixtures::event_in_days("Meetup", 2, None), attended];
        let state = ViewState::default();
        let dashboard = derive_dashboard(&events, &state, fixtures::now(), 5);

        let report = build_report(&state, fixtures::now(), &dashboard);
        assert!(report.contains("- Total events: 2"));
        assert!(report.contains("- Urgent: 1"));
        assert!(report.contains("1. Meetup [critical] 2 days left"));
        assert!(report.contains("  - certificate: https://cdn/cert.pdf"));
    }

    #[test]
    fn empty_snapshot_reports_nothing_found() {
        let state = ViewState::default();
        let dashboard = derive_dashboard(&[], &state, fixtures::now(), 5);
        let report = build_report(&state, fixtures::now(), &dashboard);
        assert!(report.contains("Nothing pending."));
        assert!(report.contains("No events found."));
    }
}
