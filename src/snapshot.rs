//! Holds the most recent event snapshot fetched from the record store.
//!
//! Each fetch takes a ticket with a sequence number. A completed fetch is
//! applied only when it is newer than the snapshot already held, so a slow
//! older request can never overwrite a newer result. A failed fetch leaves the
//! current snapshot in place.

use std::fmt;

use crate::models::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotUpdate {
    Applied { events: usize },
    Stale,
    Failed,
}

#[derive(Debug, Default)]
pub struct SnapshotHolder {
    events: Vec<Event>,
    next_seq: u64,
    applied_seq: Option<u64>,
}

impl SnapshotHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last successfully applied snapshot; empty before the first load.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn is_loaded(&self) -> bool {
        self.applied_seq.is_some()
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        let ticket = FetchTicket { seq: self.next_seq };
        self.next_seq += 1;
        ticket
    }

    pub fn complete<E: fmt::Display>(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Event>, E>,
    ) -> SnapshotUpdate {
        if self.applied_seq.is_some_and(|applied| ticket.seq <= applied) {
            tracing::debug!(seq = ticket.seq, "dropping stale snapshot");
            return SnapshotUpdate::Stale;
        }

        match result {
            Ok(events) => {
                let count = events.len();
                self.events = events;
                self.applied_seq = Some(ticket.seq);
                tracing::debug!(seq = ticket.seq, events = count, "snapshot applied");
                SnapshotUpdate::Applied { events: count }
            }
            Err(error) => {
                tracing::warn!(
                    seq = ticket.seq,
                    error = %error,
                    "snapshot fetch failed; keeping previous snapshot"
                );
                SnapshotUpdate::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;

    fn snapshot(names: &[&str]) -> Vec<Event> {
        names
            .iter()
            .map(|name| fixtures::event_in_days(name, 3, None))
            .collect()
    }

    #[test]
    fn starts_empty() {
        let holder = SnapshotHolder::new();
        assert!(holder.events().is_empty());
        assert!(!holder.is_loaded());
    }

    #[test]
    fn newer_request_wins_over_late_older_completion() {
        let mut holder = SnapshotHolder::new();
        let older = holder.begin_fetch();
        let newer = holder.begin_fetch();

        let update = holder.complete::<String>(newer, Ok(snapshot(&["new"])));
        assert_eq!(update, SnapshotUpdate::Applied { events: 1 });

        let update = holder.complete::<String>(older, Ok(snapshot(&["old", "older"])));
        assert_eq!(update, SnapshotUpdate::Stale);
        assert_eq!(holder.events()[0].name, "new");
    }

    #[test]
    fn failure_keeps_previous_snapshot() {
        let mut holder = SnapshotHolder::new();
        let first = holder.begin_fetch();
        holder.complete::<String>(first, Ok(snapshot(&["a", "b"])));

        let second = holder.begin_fetch();
        let update = holder.complete(second, Err("connection reset"));
        assert_eq!(update, SnapshotUpdate::Failed);
        assert_eq!(holder.events().len(), 2);
    }

    #[test]
    fn failure_on_first_load_leaves_empty_snapshot() {
        let mut holder = SnapshotHolder::new();
        let ticket = holder.begin_fetch();
        assert_eq!(holder.complete(ticket, Err("timeout")), SnapshotUpdate::Failed);
        assert!(holder.events().is_empty());
        assert!(!holder.is_loaded());
    }
}
