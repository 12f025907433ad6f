use proptest::prelude::*;

use pemilu_types::{AuditAction, CandidateId, Timestamp, VoteId, VoterId};

proptest! {
    /// VoterId roundtrip: new -> get produces the raw value.
    #[test]
    fn voter_id_roundtrip(raw in 0u32..u32::MAX) {
        let id = VoterId::new(raw);
        prop_assert_eq!(id.get(), raw);
    }

    /// CandidateId bincode serialization roundtrip.
    #[test]
    fn candidate_id_bincode_roundtrip(raw in 0u32..u32::MAX) {
        let id = CandidateId::new(raw);
        let encoded = bincode::serialize(&id).unwrap();
        let decoded: CandidateId = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, id);
    }

    /// VoteId ordering matches raw ordering.
    #[test]
    fn vote_id_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let va = VoteId::new(a);
        let vb = VoteId::new(b);
        prop_assert_eq!(va <= vb, a <= b);
        prop_assert_eq!(va == vb, a == b);
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// elapsed_since never underflows when `now` is earlier.
    #[test]
    fn elapsed_since_saturates(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let elapsed = Timestamp::new(a).elapsed_since(Timestamp::new(b));
        prop_assert_eq!(elapsed, b.saturating_sub(a));
    }
}

#[test]
fn audit_action_json_vocabulary() {
    let encoded = serde_json::to_string(&AuditAction::VoteCast).unwrap();
    assert_eq!(encoded, "\"VOTE_CAST\"");
    let decoded: AuditAction = serde_json::from_str("\"RESET_ALL_VOTES\"").unwrap();
    assert_eq!(decoded, AuditAction::ResetAllVotes);
    assert_eq!(AuditAction::DatabaseRepair.as_str(), "DATABASE_REPAIR");
}

#[test]
fn audit_action_destructive_set() {
    assert!(AuditAction::ResetAllVotes.is_destructive());
    assert!(AuditAction::DatabaseRestore.is_destructive());
    assert!(!AuditAction::VoteCast.is_destructive());
    assert!(!AuditAction::AdminLogin.is_destructive());
}
