//! Property tests for the cast state machine.
//!
//! Whatever sequence of casts and resets arrives, including repeats and
//! references to voters or candidates that do not exist, the store must
//! keep three facts true: every tally equals the ledger rows naming that
//! candidate, no voter ever holds more than one ballot, and each voter's
//! flag agrees with the ledger.

use std::collections::HashMap;

use proptest::prelude::*;

use pemilu_election::{ElectionStore, NewCandidate, NewVoter};
use pemilu_types::{CandidateId, VoterId};

fn store_with(voters: u32, candidates: u32) -> (tempfile::TempDir, ElectionStore) {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = ElectionStore::open(&dir.path().join("election")).expect("open store");
    for i in 1..=voters {
        store
            .add_voter(NewVoter {
                username: format!("v{i:02}"),
                name: format!("Voter {i}"),
                class: format!("class-{}", i % 3),
            })
            .expect("add voter");
    }
    for n in 1..=candidates {
        store
            .add_candidate(NewCandidate {
                number: n,
                name: format!("Candidate {n}"),
                running_mate: String::new(),
                class: String::new(),
                slogan: String::new(),
                tags: Vec::new(),
                vision: String::new(),
                mission: Vec::new(),
                photo: String::new(),
                running_mate_photo: String::new(),
            })
            .expect("add candidate");
    }
    (dir, store)
}

fn assert_consistent(store: &ElectionStore) {
    let snapshot = store.export_voting_data().expect("export");

    let mut per_candidate: HashMap<CandidateId, u64> = HashMap::new();
    let mut per_voter: HashMap<VoterId, u64> = HashMap::new();
    for vote in &snapshot.votes {
        *per_candidate.entry(vote.candidate_id).or_default() += 1;
        *per_voter.entry(vote.voter_id).or_default() += 1;
    }

    for count in per_voter.values() {
        assert_eq!(*count, 1, "a voter holds more than one ledger row");
    }
    for candidate in &snapshot.candidates {
        let ledger = per_candidate.get(&candidate.id).copied().unwrap_or(0);
        assert_eq!(
            candidate.vote_count, ledger,
            "tally for candidate {} disagrees with the ledger",
            candidate.id
        );
    }
    for voter in &snapshot.voters {
        assert!(voter.vote_state_consistent());
        assert_eq!(voter.has_voted, per_voter.contains_key(&voter.id));
    }

    let stats = store.election_stats().expect("stats");
    assert_eq!(stats.total_votes, snapshot.votes.len() as u64);
    assert_eq!(stats.voted_count, stats.total_votes);
    assert_eq!(
        stats.candidates.iter().map(|t| t.votes).sum::<u64>(),
        stats.total_votes
    );
    for tally in &stats.candidates {
        assert!((0.0..=100.0).contains(&tally.share));
    }
    assert!((0.0..=100.0).contains(&stats.participation_rate));
}

/// One step of a randomized admin-and-voter session.
#[derive(Clone, Debug)]
enum Op {
    Cast { voter: u32, candidate: u32 },
    ResetOne { voter: u32 },
    ResetAll,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        // Ids run past the fixture bounds on purpose; unknown voters and
        // candidates must be rejected cleanly.
        6 => (1u32..=8, 1u32..=4).prop_map(|(voter, candidate)| Op::Cast { voter, candidate }),
        2 => (1u32..=8).prop_map(|voter| Op::ResetOne { voter }),
        1 => Just(Op::ResetAll),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Any sequence of cast attempts leaves tallies, ledger and voter flags
    /// in agreement, with at most one ballot per voter.
    #[test]
    fn tallies_match_ledger_under_any_cast_sequence(
        attempts in prop::collection::vec((1u32..=8, 1u32..=4), 0..32),
    ) {
        let (_dir, store) = store_with(6, 3);
        for (voter, candidate) in attempts {
            store
                .cast_vote(VoterId::new(voter), CandidateId::new(candidate))
                .expect("cast must not error");
        }
        assert_consistent(&store);
    }

    /// Interleaving resets with casts never breaks the agreement either,
    /// and a reset voter can always vote again.
    #[test]
    fn resets_interleaved_with_casts_stay_consistent(
        ops in prop::collection::vec(arb_op(), 0..48),
    ) {
        let (_dir, store) = store_with(6, 3);
        for op in ops {
            match op {
                Op::Cast { voter, candidate } => {
                    store
                        .cast_vote(VoterId::new(voter), CandidateId::new(candidate))
                        .expect("cast must not error");
                }
                Op::ResetOne { voter } => {
                    store
                        .reset_single_vote(VoterId::new(voter))
                        .expect("reset must not error");
                }
                Op::ResetAll => {
                    store.reset_all_votes().expect("reset all must not error");
                }
            }
        }
        assert_consistent(&store);
    }

    /// The ballot count only ever changes by one per successful cast: after
    /// n distinct voters vote, the ledger holds exactly n rows.
    #[test]
    fn distinct_voters_produce_exactly_that_many_ballots(
        voters in prop::collection::hash_set(1u32..=6, 0..6),
        candidate in 1u32..=3,
    ) {
        let (_dir, store) = store_with(6, 3);
        for voter in &voters {
            store
                .cast_vote(VoterId::new(*voter), CandidateId::new(candidate))
                .expect("cast must not error");
        }
        let stats = store.election_stats().expect("stats");
        prop_assert_eq!(stats.total_votes, voters.len() as u64);
        assert_consistent(&store);
    }
}
