//! Events emitted after committed state changes, for subscribers.

use pemilu_types::{CandidateId, VoteId, VoterId};

/// Engine-level events that observers can subscribe to via the [`EventBus`].
///
/// Every variant corresponds to a committed transaction; an event is never
/// emitted for an operation that was rejected or rolled back.
#[derive(Clone, Debug)]
pub enum ElectionEvent {
    /// A ballot was recorded.
    VoteCast {
        voter_id: VoterId,
        candidate_id: CandidateId,
        vote_id: VoteId,
    },
    /// Every ballot was cleared and all tallies zeroed.
    AllVotesReset { votes_cleared: u64 },
    /// One voter's ballot was withdrawn.
    SingleVoteReset {
        voter_id: VoterId,
        candidate_id: Option<CandidateId>,
    },
    /// The store was replaced wholesale from a backup snapshot.
    DataRestored { voters: u64, votes: u64 },
}

/// Synchronous fan-out event bus.
///
/// Listeners are invoked inline on the emitting thread; keep handlers fast to
/// avoid stalling the voting path.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&ElectionEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&ElectionEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &ElectionEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
