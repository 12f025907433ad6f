//! Export, backup and restore data shapes, plus the CSV summary renderer.
//!
//! An [`ExportSnapshot`] is the complete externalized state of one election:
//! metadata, a statistics snapshot, and every row of every collection in
//! ascending id order. The same shape serves JSON export, file backups and
//! restore input, so a backup taken on one machine reproduces equivalent
//! statistics when restored on another.

use serde::{Deserialize, Serialize};

use pemilu_store::admin::AdminAccount;
use pemilu_store::audit::AuditLogEntry;
use pemilu_store::candidate::Candidate;
use pemilu_store::vote::VoteRecord;
use pemilu_store::voter::Voter;

use crate::stats::ElectionStats;

/// System label stamped into export metadata.
pub const EXPORT_SYSTEM_NAME: &str = "Election System Database";
/// Export format version. Restore refuses snapshots with any other value.
pub const EXPORT_FORMAT_VERSION: &str = "1.0";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// RFC 3339 export time.
    pub export_date: String,
    pub system: String,
    pub version: String,
}

/// The complete externalized state of the election.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportSnapshot {
    pub metadata: ExportMetadata,
    pub statistics: ElectionStats,
    pub voters: Vec<Voter>,
    pub candidates: Vec<Candidate>,
    pub votes: Vec<VoteRecord>,
    /// Admin accounts travel with the snapshot so a restore reproduces them.
    /// Empty in snapshots taken by older exporters; restore then keeps the
    /// store's current accounts instead of clearing them.
    #[serde(default)]
    pub admins: Vec<AdminAccount>,
    #[serde(default)]
    pub audit_logs: Vec<AuditLogEntry>,
}

/// On-disk backup wrapper.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackupFile {
    /// RFC 3339 backup time.
    pub created_at: String,
    pub data: ExportSnapshot,
}

/// Row counts written by a completed restore.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    pub voters: u64,
    pub candidates: u64,
    pub votes: u64,
    pub admins: u64,
    pub audit_entries: u64,
}

/// Render the spreadsheet-friendly summary of a snapshot.
///
/// Three sections: overview counts, candidate results, per-class turnout.
pub fn render_csv_summary(snapshot: &ExportSnapshot) -> String {
    let stats = &snapshot.statistics;
    let mut csv = String::from("Data,Count\n");
    csv.push_str(&format!("Total Voters,{}\n", stats.total_voters));
    csv.push_str(&format!("Voted Voters,{}\n", stats.voted_count));
    csv.push_str(&format!("Not Voted,{}\n", stats.not_voted_count));
    csv.push_str(&format!("Vote Percentage,{:.1}%\n", stats.participation_rate));
    csv.push_str(&format!("Total Candidates,{}\n", stats.total_candidates));

    csv.push_str("\nCandidate Results\n");
    csv.push_str("Number,Name,Votes,Percentage\n");
    for tally in &stats.candidates {
        csv.push_str(&format!(
            "{},{},{},{:.1}%\n",
            tally.number, tally.name, tally.votes, tally.share
        ));
    }

    csv.push_str("\nVotes by Class\n");
    csv.push_str("Class,Total,Voted,Percentage\n");
    for turnout in &stats.class_turnout {
        csv.push_str(&format!(
            "{},{},{},{:.1}%\n",
            turnout.class, turnout.total, turnout.voted, turnout.rate
        ));
    }

    csv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{CandidateTally, ClassTurnout};
    use pemilu_types::CandidateId;

    fn snapshot_with_stats(stats: ElectionStats) -> ExportSnapshot {
        ExportSnapshot {
            metadata: ExportMetadata {
                export_date: "2026-01-01T00:00:00+00:00".to_string(),
                system: EXPORT_SYSTEM_NAME.to_string(),
                version: EXPORT_FORMAT_VERSION.to_string(),
            },
            statistics: stats,
            voters: Vec::new(),
            candidates: Vec::new(),
            votes: Vec::new(),
            admins: Vec::new(),
            audit_logs: Vec::new(),
        }
    }

    #[test]
    fn csv_summary_has_three_sections() {
        let stats = ElectionStats {
            total_voters: 3,
            voted_count: 3,
            not_voted_count: 0,
            total_candidates: 2,
            total_votes: 3,
            participation_rate: 100.0,
            candidates: vec![
                CandidateTally {
                    candidate_id: CandidateId::new(1),
                    number: 1,
                    name: "First Pair".to_string(),
                    votes: 2,
                    share: 66.7,
                },
                CandidateTally {
                    candidate_id: CandidateId::new(2),
                    number: 2,
                    name: "Second Pair".to_string(),
                    votes: 1,
                    share: 33.3,
                },
            ],
            class_turnout: vec![ClassTurnout {
                class: "diknas".to_string(),
                total: 3,
                voted: 3,
                rate: 100.0,
            }],
            first_vote: None,
            last_vote: None,
            average_vote_time: None,
        };

        let csv = render_csv_summary(&snapshot_with_stats(stats));
        assert!(csv.starts_with("Data,Count\n"));
        assert!(csv.contains("Vote Percentage,100.0%\n"));
        assert!(csv.contains("\nCandidate Results\nNumber,Name,Votes,Percentage\n"));
        assert!(csv.contains("1,First Pair,2,66.7%\n"));
        assert!(csv.contains("2,Second Pair,1,33.3%\n"));
        assert!(csv.contains("\nVotes by Class\nClass,Total,Voted,Percentage\n"));
        assert!(csv.contains("diknas,3,3,100.0%\n"));
    }

    #[test]
    fn snapshot_without_admin_rows_still_parses() {
        // Older exporters wrote no admins or audit_logs arrays.
        let json = r#"{
            "metadata": {"export_date": "2026-01-01T00:00:00+00:00",
                         "system": "Election System Database", "version": "1.0"},
            "statistics": {"total_voters": 0, "voted_count": 0, "not_voted_count": 0,
                           "total_candidates": 0, "total_votes": 0,
                           "participation_rate": 0.0, "candidates": [],
                           "class_turnout": [], "first_vote": null,
                           "last_vote": null, "average_vote_time": null},
            "voters": [], "candidates": [], "votes": []
        }"#;
        let snapshot: ExportSnapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.admins.is_empty());
        assert!(snapshot.audit_logs.is_empty());
    }
}
