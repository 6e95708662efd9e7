//! Debounced Fetch Coordinator.
//!
//! Pure state machine: it never touches a clock or a socket. The view driver
//! feeds it store changes and deadline ticks, and it answers with what to do
//! next. Every dispatch gets a fresh, strictly increasing sequence tag; only a
//! completion carrying the latest tag may be applied.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::query::QueryDescriptor;
use crate::store::{ApplyMode, StoreChange, Trigger};

/// One request to issue now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub tag: u64,
    pub descriptor: QueryDescriptor,
    pub mode: ApplyMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Dispatch(Dispatch),
    /// A debounced change is pending; wake up at this instant.
    Schedule(Instant),
    /// The coordinator is closed.
    Ignore,
}

#[derive(Debug)]
pub struct FetchCoordinator {
    debounce: Duration,
    last_tag: u64,
    pending: Option<(StoreChange, Instant)>,
    closed: bool,
}

impl FetchCoordinator {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            last_tag: 0,
            pending: None,
            closed: false,
        }
    }

    /// Initial fetch on mount.
    pub fn start(&mut self, descriptor: QueryDescriptor) -> Directive {
        if self.closed {
            return Directive::Ignore;
        }
        Directive::Dispatch(self.dispatch(descriptor, ApplyMode::Replace))
    }

    pub fn on_change(&mut self, change: StoreChange, now: Instant) -> Directive {
        if self.closed {
            return Directive::Ignore;
        }
        match change.trigger {
            Trigger::Debounced if !self.debounce.is_zero() => {
                // Each keystroke restarts the quiet period.
                let deadline = now + self.debounce;
                self.pending = Some((change, deadline));
                Directive::Schedule(deadline)
            }
            _ => {
                // The snapshot already carries the latest committed text.
                self.pending = None;
                Directive::Dispatch(self.dispatch(change.descriptor, change.mode))
            }
        }
    }

    /// When the pending debounce expires, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn on_deadline(&mut self, now: Instant) -> Option<Dispatch> {
        if self.closed {
            return None;
        }
        match self.pending.take() {
            Some((change, deadline)) if deadline <= now => {
                Some(self.dispatch(change.descriptor, change.mode))
            }
            other => {
                self.pending = other;
                None
            }
        }
    }

    /// True only for the most recent dispatch of an open coordinator.
    pub fn accepts(&self, tag: u64) -> bool {
        let accepted = !self.closed && tag == self.last_tag;
        if !accepted {
            debug!(tag, latest = self.last_tag, "discarding stale completion");
        }
        accepted
    }

    pub fn last_tag(&self) -> u64 {
        self.last_tag
    }

    /// Drop any pending debounce and refuse all later work.
    pub fn close(&mut self) {
        self.closed = true;
        self.pending = None;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn dispatch(&mut self, descriptor: QueryDescriptor, mode: ApplyMode) -> Dispatch {
        self.last_tag += 1;
        debug!(
            tag = self.last_tag,
            page_index = descriptor.page_index,
            ?mode,
            "dispatching fetch"
        );
        Dispatch {
            tag: self.last_tag,
            descriptor,
            mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas;

    const DEBOUNCE: Duration = Duration::from_millis(500);

    fn change(search: &str, trigger: Trigger) -> StoreChange {
        let mut descriptor = schemas::events().initial_query();
        descriptor.search_text = search.to_string();
        StoreChange {
            descriptor,
            trigger,
            mode: ApplyMode::Replace,
        }
    }

    #[test]
    fn keystrokes_collapse_into_one_dispatch() {
        let mut c = FetchCoordinator::new(DEBOUNCE);
        let t0 = Instant::now();

        for (i, text) in ["a", "ab", "abc"].iter().enumerate() {
            let now = t0 + Duration::from_millis(100 * i as u64);
            let directive = c.on_change(change(text, Trigger::Debounced), now);
            assert_eq!(directive, Directive::Schedule(now + DEBOUNCE));
        }

        assert_eq!(c.on_deadline(t0 + Duration::from_millis(600)), None);
        let fired = c.on_deadline(t0 + Duration::from_millis(700)).unwrap();
        assert_eq!(fired.descriptor.search_text, "abc");
        assert_eq!(fired.tag, 1);
        assert_eq!(c.deadline(), None);
        assert_eq!(c.on_deadline(t0 + Duration::from_secs(5)), None);
    }

    #[test]
    fn immediate_change_supersedes_pending_debounce() {
        let mut c = FetchCoordinator::new(DEBOUNCE);
        let now = Instant::now();
        c.on_change(change("ab", Trigger::Debounced), now);

        let Directive::Dispatch(d) = c.on_change(change("ab", Trigger::Immediate), now) else {
            panic!("expected dispatch");
        };
        assert_eq!(d.tag, 1);
        assert_eq!(c.deadline(), None);
    }

    #[test]
    fn zero_debounce_dispatches_right_away() {
        let mut c = FetchCoordinator::new(Duration::ZERO);
        let directive = c.on_change(change("a", Trigger::Debounced), Instant::now());
        assert!(matches!(directive, Directive::Dispatch(_)));
    }

    #[test]
    fn only_the_latest_tag_is_accepted() {
        let mut c = FetchCoordinator::new(DEBOUNCE);
        let now = Instant::now();
        let Directive::Dispatch(first) = c.start(schemas::events().initial_query()) else {
            panic!("expected dispatch");
        };
        let Directive::Dispatch(second) = c.on_change(change("y", Trigger::Immediate), now) else {
            panic!("expected dispatch");
        };
        assert!(second.tag > first.tag);
        assert!(!c.accepts(first.tag));
        assert!(c.accepts(second.tag));
    }

    #[test]
    fn closed_coordinator_ignores_everything() {
        let mut c = FetchCoordinator::new(DEBOUNCE);
        let now = Instant::now();
        let Directive::Dispatch(d) = c.on_change(change("x", Trigger::Immediate), now) else {
            panic!("expected dispatch");
        };
        c.on_change(change("xy", Trigger::Debounced), now);
        c.close();

        assert!(c.is_closed());
        assert!(!c.accepts(d.tag));
        assert_eq!(c.deadline(), None);
        assert_eq!(c.on_deadline(now + DEBOUNCE), None);
        assert_eq!(
            c.on_change(change("z", Trigger::Immediate), now),
            Directive::Ignore
        );
    }
}
