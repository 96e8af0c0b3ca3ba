//! Last-write-wins bookkeeping for repeated renders.
//!
//! Callers re-render every time the user nudges a parameter. Renders may
//! finish out of order, so each request takes a ticket and a finished result
//! is only applied while its ticket is still the newest one issued.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

/// Identifies one render request. Later requests get larger tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderTicket(u64);

impl RenderTicket {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Issues [`RenderTicket`]s and answers whether a ticket is still current.
///
/// Shareable across threads behind an `Arc`.
#[derive(Debug, Default)]
pub struct RenderSequence {
    latest: AtomicU64,
}

impl RenderSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding every earlier ticket.
    pub fn begin(&self) -> RenderTicket {
        let id = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(ticket = id, "Render requested");
        RenderTicket(id)
    }

    /// Whether `ticket` is the most recent request.
    pub fn is_current(&self, ticket: RenderTicket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }

    /// Return `result` if `ticket` is still current, dropping stale results.
    pub fn accept<T>(&self, ticket: RenderTicket, result: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(result)
        } else {
            debug!(ticket = ticket.0, "Discarding stale render result");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_latest_ticket_is_current() {
        let seq = RenderSequence::new();
        let first = seq.begin();
        assert!(seq.is_current(first));

        let second = seq.begin();
        assert!(second > first);
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
    }

    #[test]
    fn test_accept_discards_stale_results() {
        let seq = RenderSequence::new();
        let old = seq.begin();
        let new = seq.begin();

        // The newer render finishes first, then the older one
        assert_eq!(seq.accept(new, "new"), Some("new"));
        assert_eq!(seq.accept(old, "old"), None);
    }

    #[test]
    fn test_tickets_unique_across_threads() {
        let seq = Arc::new(RenderSequence::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let seq = Arc::clone(&seq);
                thread::spawn(move || (0..100).map(|_| seq.begin().id()).collect::<Vec<_>>())
            })
            .collect();

        let mut ids: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 800);
        assert!(seq.is_current(RenderTicket(800)));
    }
}
