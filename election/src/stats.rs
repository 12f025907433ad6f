//! Election statistics, recomputed from current state on every request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pemilu_store::candidate::Candidate;
use pemilu_store::vote::VoteRecord;
use pemilu_store::voter::Voter;
use pemilu_types::{CandidateId, Timestamp};

/// A full statistics snapshot. Never cached; derived from the rows passed in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElectionStats {
    pub total_voters: u64,
    pub voted_count: u64,
    pub not_voted_count: u64,
    pub total_candidates: u64,
    /// Ledger row count. Equals `voted_count` whenever the store is consistent.
    pub total_votes: u64,
    /// Voted voters over all voters, one decimal, 0.0 for an empty roster.
    pub participation_rate: f64,
    /// Sorted by votes descending, then candidate id ascending.
    pub candidates: Vec<CandidateTally>,
    /// Sorted by class name.
    pub class_turnout: Vec<ClassTurnout>,
    pub first_vote: Option<Timestamp>,
    pub last_vote: Option<Timestamp>,
    /// Mean ballot timestamp in whole seconds.
    pub average_vote_time: Option<Timestamp>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateTally {
    pub candidate_id: CandidateId,
    pub number: u32,
    pub name: String,
    pub votes: u64,
    /// Share of voted voters, one decimal, 0.0 when nobody has voted.
    pub share: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassTurnout {
    pub class: String,
    pub total: u64,
    pub voted: u64,
    pub rate: f64,
}

/// Percentage of `part` in `whole`, rounded to one decimal place.
pub(crate) fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64 * 1000.0).round() / 10.0
    }
}

/// Compute the statistics snapshot from full collection reads.
pub fn compute_stats(
    voters: &[Voter],
    candidates: &[Candidate],
    votes: &[VoteRecord],
) -> ElectionStats {
    let total_voters = voters.len() as u64;
    let voted_count = voters.iter().filter(|v| v.has_voted).count() as u64;

    let mut by_class: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for voter in voters {
        let entry = by_class.entry(voter.class.as_str()).or_default();
        entry.0 += 1;
        if voter.has_voted {
            entry.1 += 1;
        }
    }
    let class_turnout = by_class
        .into_iter()
        .map(|(class, (total, voted))| ClassTurnout {
            class: class.to_string(),
            total,
            voted,
            rate: percent(voted, total),
        })
        .collect();

    let mut tallies: Vec<CandidateTally> = candidates
        .iter()
        .map(|c| CandidateTally {
            candidate_id: c.id,
            number: c.number,
            name: c.name.clone(),
            votes: c.vote_count,
            share: percent(c.vote_count, voted_count),
        })
        .collect();
    tallies.sort_by(|a, b| {
        b.votes
            .cmp(&a.votes)
            .then(a.candidate_id.cmp(&b.candidate_id))
    });

    let mut times: Vec<u64> = votes.iter().map(|v| v.timestamp.as_secs()).collect();
    times.sort_unstable();
    let first_vote = times.first().map(|&s| Timestamp::new(s));
    let last_vote = times.last().map(|&s| Timestamp::new(s));
    let average_vote_time = if times.is_empty() {
        None
    } else {
        Some(Timestamp::new(
            times.iter().sum::<u64>() / times.len() as u64,
        ))
    };

    ElectionStats {
        total_voters,
        voted_count,
        not_voted_count: total_voters - voted_count,
        total_candidates: candidates.len() as u64,
        total_votes: votes.len() as u64,
        participation_rate: percent(voted_count, total_voters),
        candidates: tallies,
        class_turnout,
        first_vote,
        last_vote,
        average_vote_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pemilu_types::{VoteId, VoterId};

    fn voter(id: u32, class: &str, voted_for: Option<u32>) -> Voter {
        let mut v = Voter::new(
            VoterId::new(id),
            format!("guru{id:02}"),
            format!("Teacher {id}"),
            class,
            Timestamp::new(100),
        );
        if let Some(c) = voted_for {
            v.mark_voted(CandidateId::new(c), Timestamp::new(200 + id as u64));
        }
        v
    }

    fn candidate(id: u32, votes: u64) -> Candidate {
        Candidate {
            id: CandidateId::new(id),
            number: id,
            name: format!("Pair {id}"),
            running_mate: String::new(),
            class: "XI".to_string(),
            slogan: String::new(),
            tags: Vec::new(),
            vision: String::new(),
            mission: Vec::new(),
            photo: String::new(),
            running_mate_photo: String::new(),
            vote_count: votes,
            created_at: Timestamp::new(100),
            updated_at: Timestamp::new(100),
        }
    }

    fn vote(id: u64, voter: u32, cand: u32, at: u64) -> VoteRecord {
        VoteRecord {
            id: VoteId::new(id),
            voter_id: VoterId::new(voter),
            candidate_id: CandidateId::new(cand),
            timestamp: Timestamp::new(at),
            voter_name: format!("Teacher {voter}"),
            voter_class: "diknas".to_string(),
            candidate_name: format!("Pair {cand}"),
            candidate_number: cand,
        }
    }

    #[test]
    fn three_voters_two_candidates_split() {
        let voters = [
            voter(1, "diknas", Some(1)),
            voter(2, "diknas", Some(1)),
            voter(3, "tahfidz", Some(2)),
        ];
        let candidates = [candidate(1, 2), candidate(2, 1)];
        let votes = [vote(1, 1, 1, 201), vote(2, 2, 1, 202), vote(3, 3, 2, 203)];

        let stats = compute_stats(&voters, &candidates, &votes);
        assert_eq!(stats.participation_rate, 100.0);
        assert_eq!(stats.candidates[0].share, 66.7);
        assert_eq!(stats.candidates[1].share, 33.3);
        assert_eq!(stats.total_votes, 3);
        assert_eq!(stats.first_vote, Some(Timestamp::new(201)));
        assert_eq!(stats.last_vote, Some(Timestamp::new(203)));
        assert_eq!(stats.average_vote_time, Some(Timestamp::new(202)));
    }

    #[test]
    fn share_denominator_is_voted_voters_not_roster() {
        let voters = [
            voter(1, "diknas", Some(1)),
            voter(2, "diknas", None),
            voter(3, "diknas", None),
        ];
        let candidates = [candidate(1, 1), candidate(2, 0)];
        let votes = [vote(1, 1, 1, 300)];

        let stats = compute_stats(&voters, &candidates, &votes);
        assert_eq!(stats.participation_rate, 33.3);
        assert_eq!(stats.candidates[0].share, 100.0);
        assert_eq!(stats.candidates[1].share, 0.0);
    }

    #[test]
    fn tie_breaks_on_candidate_id_ascending() {
        let voters = [voter(1, "diknas", Some(2)), voter(2, "diknas", Some(3))];
        let candidates = [candidate(3, 1), candidate(2, 1), candidate(1, 0)];
        let votes = [vote(1, 1, 2, 10), vote(2, 2, 3, 20)];

        let stats = compute_stats(&voters, &candidates, &votes);
        let order: Vec<u32> = stats
            .candidates
            .iter()
            .map(|t| t.candidate_id.get())
            .collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn empty_store_yields_zeroes() {
        let stats = compute_stats(&[], &[], &[]);
        assert_eq!(stats.participation_rate, 0.0);
        assert_eq!(stats.total_voters, 0);
        assert!(stats.candidates.is_empty());
        assert!(stats.class_turnout.is_empty());
        assert_eq!(stats.first_vote, None);
        assert_eq!(stats.average_vote_time, None);
    }

    #[test]
    fn class_turnout_counts_by_unit() {
        let voters = [
            voter(1, "diknas", Some(1)),
            voter(2, "diknas", None),
            voter(3, "pengasuhan", Some(1)),
        ];
        let candidates = [candidate(1, 2)];
        let votes = [vote(1, 1, 1, 10), vote(2, 3, 1, 20)];

        let stats = compute_stats(&voters, &candidates, &votes);
        assert_eq!(stats.class_turnout.len(), 2);
        let diknas = &stats.class_turnout[0];
        assert_eq!(diknas.class, "diknas");
        assert_eq!((diknas.total, diknas.voted), (2, 1));
        assert_eq!(diknas.rate, 50.0);
        let pengasuhan = &stats.class_turnout[1];
        assert_eq!((pengasuhan.total, pengasuhan.voted), (1, 1));
        assert_eq!(pengasuhan.rate, 100.0);
    }
}
