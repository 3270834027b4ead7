//! Request sequencing for background computations.
//!
//! Every request takes a ticket; a result may only be stored while its ticket
//! is the newest one issued on that channel. Older results are dropped.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// What happened to a finished computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// A newer request was issued while this one was running
    Stale,
}

#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: AtomicU64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket newer than every ticket issued before.
    pub fn next(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn latest(&self) -> Option<Ticket> {
        match self.latest.load(Ordering::SeqCst) {
            0 => None,
            value => Some(Ticket(value)),
        }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_ticket_wins() {
        let sequence = RequestSequence::new();
        assert_eq!(sequence.latest(), None);

        let first = sequence.next();
        assert!(sequence.is_current(first));

        let second = sequence.next();
        assert!(second > first);
        assert!(!sequence.is_current(first));
        assert!(sequence.is_current(second));
        assert_eq!(sequence.latest(), Some(second));
    }

    #[test]
    fn tickets_are_unique_across_threads() {
        let sequence = std::sync::Arc::new(RequestSequence::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let sequence = sequence.clone();
                std::thread::spawn(move || {
                    (0..100)
                        .map(|_| sequence.next().value())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 400);
        assert_eq!(sequence.latest().map(|t| t.value()), Some(400));
    }
}
