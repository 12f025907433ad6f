//! The election engine.
//!
//! [`ElectionStore`] owns the LMDB environment and is the only writer. Every
//! multi-collection change (casting, resets, seeding, restore) goes through a
//! single write batch so it commits in full or not at all; reads go through
//! the per-collection store traits. Constructed explicitly and passed where
//! needed; there is no process-global instance.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use pemilu_store::admin::{AdminAccount, AdminProfile, AdminStore};
use pemilu_store::audit::{AuditLogEntry, AuditStore, NewAuditEntry};
use pemilu_store::candidate::{Candidate, CandidateStore};
use pemilu_store::meta::MetaStore;
use pemilu_store::vote::{VoteRecord, VoteStore};
use pemilu_store::voter::{Voter, VoterStore};
use pemilu_store::StoreError;
use pemilu_store_lmdb::integrity::{check_data_dir, check_integrity};
use pemilu_store_lmdb::LmdbEnvironment;
use pemilu_types::{AdminId, AuditAction, CandidateId, Timestamp, VoterId};
use pemilu_utils::{OpCounters, OpSnapshot};

use crate::error::ElectionError;
use crate::event::{ElectionEvent, EventBus};
use crate::export::{
    BackupFile, ExportMetadata, ExportSnapshot, RestoreReport, EXPORT_FORMAT_VERSION,
    EXPORT_SYSTEM_NAME,
};
use crate::outcome::{
    AdminLoginOutcome, CandidateSummary, CastOutcome, HealthReport, LoginOutcome, ResetOutcome,
    VoteReceipt, VotingStatus,
};
use crate::seed::{self, BootstrapReport};
use crate::stats::{self, ElectionStats};

pub const DEFAULT_MAX_DBS: u32 = 16;
pub const DEFAULT_MAP_SIZE: usize = 64 * 1024 * 1024;

/// Input for creating a voter.
#[derive(Clone, Debug)]
pub struct NewVoter {
    pub username: String,
    pub name: String,
    pub class: String,
}

/// Partial update for a voter's identity fields. Ballot state is not
/// patchable; it changes only through cast and reset transactions.
#[derive(Clone, Debug, Default)]
pub struct VoterPatch {
    pub username: Option<String>,
    pub name: Option<String>,
    pub class: Option<String>,
}

/// Input for creating a candidate. The tally always starts at zero.
#[derive(Clone, Debug)]
pub struct NewCandidate {
    pub number: u32,
    pub name: String,
    pub running_mate: String,
    pub class: String,
    pub slogan: String,
    pub tags: Vec<String>,
    pub vision: String,
    pub mission: Vec<String>,
    pub photo: String,
    pub running_mate_photo: String,
}

/// Partial update for a candidate's profile. `vote_count` is not patchable.
#[derive(Clone, Debug, Default)]
pub struct CandidatePatch {
    pub number: Option<u32>,
    pub name: Option<String>,
    pub running_mate: Option<String>,
    pub class: Option<String>,
    pub slogan: Option<String>,
    pub tags: Option<Vec<String>>,
    pub vision: Option<String>,
    pub mission: Option<Vec<String>>,
    pub photo: Option<String>,
    pub running_mate_photo: Option<String>,
}

/// Input for creating an admin account.
#[derive(Clone, Debug)]
pub struct NewAdmin {
    pub username: String,
    pub name: String,
    pub password: String,
    pub role: String,
    pub permissions: Vec<String>,
    pub email: String,
    pub phone: String,
}

/// Partial update for an admin account.
#[derive(Clone, Debug, Default)]
pub struct AdminPatch {
    pub username: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub permissions: Option<Vec<String>>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// The single-election data store and voting state machine.
pub struct ElectionStore {
    env: LmdbEnvironment,
    data_dir: PathBuf,
    bus: EventBus,
    counters: OpCounters,
}

impl ElectionStore {
    /// Open (or create) the store at `path` with default sizing.
    pub fn open(path: &Path) -> Result<Self, ElectionError> {
        Self::open_with(path, DEFAULT_MAX_DBS, DEFAULT_MAP_SIZE)
    }

    pub fn open_with(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, ElectionError> {
        let env = LmdbEnvironment::open(path, max_dbs, map_size).map_err(StoreError::from)?;
        info!(path = %path.display(), "election store opened");
        Ok(Self {
            env,
            data_dir: path.to_path_buf(),
            bus: EventBus::new(),
            counters: OpCounters::new(),
        })
    }

    /// Open the store, rebuilding from seed data if it cannot be opened.
    ///
    /// An unreadable data directory is moved aside with a timestamped name
    /// rather than deleted, then a fresh store is created and seeded. Returns
    /// the store and whether a rebuild happened.
    pub fn open_or_repair(path: &Path) -> Result<(Self, bool), ElectionError> {
        // A directory without data.mdb would open as an empty store and mask
        // the damage; treat it like a failed open instead.
        let failure = match check_data_dir(path) {
            Ok(()) => match Self::open(path) {
                Ok(store) => return Ok((store, false)),
                Err(e) => e.to_string(),
            },
            Err(reason) => reason,
        };

        warn!(error = %failure, path = %path.display(), "store unreadable, rebuilding");
        if path.exists() {
            let damaged = sibling_path(path, "damaged", "");
            std::fs::rename(path, &damaged)?;
            warn!(moved_to = %damaged.display(), "damaged store moved aside");
        }
        let store = Self::open(path)?;
        store.initialize()?;
        store.soft_audit(NewAuditEntry::new(
            AuditAction::DatabaseRepair,
            "system",
            "System",
            "store rebuilt after failed open",
            Timestamp::now(),
        ));
        Ok((store, true))
    }

    /// Rebuild a store that opens but no longer passes its checks.
    ///
    /// Salvages the current contents to a timestamped JSON file next to the
    /// data directory when they are still readable, then destroys the
    /// directory, reopens fresh and reseeds. Lossy by design: an operable
    /// kiosk beats a perfectly preserved broken one.
    pub fn repair(self) -> Result<(Self, Option<PathBuf>), ElectionError> {
        let now = Timestamp::now();
        let salvage_path = sibling_path(&self.data_dir, "salvage", ".json");
        let salvage = match self.export_voting_data() {
            Ok(snapshot) => match serde_json::to_string_pretty(&snapshot) {
                Ok(json) => match std::fs::write(&salvage_path, json) {
                    Ok(()) => Some(salvage_path),
                    Err(e) => {
                        warn!(error = %e, "salvage write failed");
                        None
                    }
                },
                Err(e) => {
                    warn!(error = %e, "salvage serialization failed");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "salvage export failed, rebuilding without one");
                None
            }
        };

        // The environment must be closed before its directory is removed.
        let Self { env, data_dir, .. } = self;
        drop(env);

        std::fs::remove_dir_all(&data_dir)?;
        let store = Self::open(&data_dir)?;
        store.initialize()?;
        store.soft_audit(NewAuditEntry::new(
            AuditAction::DatabaseRepair,
            "system",
            "System",
            match &salvage {
                Some(p) => format!("store rebuilt, salvage at {}", p.display()),
                None => "store rebuilt, no salvage written".to_string(),
            },
            now,
        ));
        warn!(dir = %data_dir.display(), "store rebuilt from seed data");
        Ok((store, salvage))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Register a listener for committed state changes.
    pub fn subscribe(&mut self, listener: Box<dyn Fn(&ElectionEvent) + Send + Sync>) {
        self.bus.subscribe(listener);
    }

    /// Current in-process operation counters.
    pub fn ops(&self) -> OpSnapshot {
        self.counters.snapshot()
    }

    // ── Seeding ─────────────────────────────────────────────────────────

    /// Seed default data into whichever collections are empty.
    ///
    /// Each entity class is seeded independently, so a store that lost only
    /// its admins gets admins back without touching ballots.
    pub fn initialize(&self) -> Result<BootstrapReport, ElectionError> {
        let now = Timestamp::now();
        let need_candidates = self.env.candidate_store().candidate_count()? == 0;
        let need_voters = self.env.voter_store().voter_count()? == 0;
        let need_admins = self.env.admin_store().admin_count()? == 0;

        let mut report = BootstrapReport::default();
        if !(need_candidates || need_voters || need_admins) {
            return Ok(report);
        }

        let mut batch = self.env.write_batch()?;
        if need_candidates {
            for candidate in seed::default_candidates(now) {
                batch.put_candidate(&candidate)?;
                report.candidates_added += 1;
            }
        }
        if need_voters {
            for voter in seed::default_voters(now) {
                batch.put_voter(&voter)?;
                report.voters_added += 1;
            }
        }
        if need_admins {
            for admin in seed::default_admins(now) {
                batch.put_admin(&admin)?;
                report.admins_added += 1;
            }
        }
        batch.commit()?;

        info!(
            candidates = report.candidates_added,
            voters = report.voters_added,
            admins = report.admins_added,
            "seeded default election data"
        );
        Ok(report)
    }

    // ── Voter login and casting ─────────────────────────────────────────

    /// Look up a voter by username for the login screen.
    pub fn validate_login(&self, username: &str) -> Result<LoginOutcome, ElectionError> {
        let store = self.env.voter_store();
        match store.get_voter_by_username(username)? {
            Some(voter) if voter.has_voted => Ok(LoginOutcome::AlreadyVoted(voter)),
            Some(voter) => {
                self.counters.record_login();
                Ok(LoginOutcome::Success(voter))
            }
            None => {
                let hint = match store.username_bounds()? {
                    Some((first, last)) => format!("valid usernames run {first} through {last}"),
                    None => "the voter roster is empty".to_string(),
                };
                Ok(LoginOutcome::NotFound { hint })
            }
        }
    }

    /// Cast a ballot at the current time.
    pub fn cast_vote(
        &self,
        voter_id: VoterId,
        candidate_id: CandidateId,
    ) -> Result<CastOutcome, ElectionError> {
        self.cast_vote_at(voter_id, candidate_id, Timestamp::now())
    }

    /// Cast a ballot with an explicit timestamp.
    ///
    /// One write batch covers all four updates: the voter's ballot state,
    /// the candidate tally, the ledger row and the audit entry. A failed
    /// precondition returns its outcome with zero mutations committed.
    pub fn cast_vote_at(
        &self,
        voter_id: VoterId,
        candidate_id: CandidateId,
        now: Timestamp,
    ) -> Result<CastOutcome, ElectionError> {
        let mut batch = self.env.write_batch()?;

        let Some(mut voter) = batch.get_voter(voter_id)? else {
            self.counters.record_rejected_cast();
            return Ok(CastOutcome::VoterNotFound);
        };
        if voter.has_voted {
            self.counters.record_rejected_cast();
            return Ok(CastOutcome::AlreadyVoted);
        }
        let Some(mut candidate) = batch.get_candidate(candidate_id)? else {
            self.counters.record_rejected_cast();
            return Ok(CastOutcome::CandidateNotFound);
        };
        // Ledger backstop: a row despite `has_voted == false` means the flag
        // lags the ledger; refuse rather than double-count.
        if batch.vote_id_for_voter(voter_id)?.is_some() {
            self.counters.record_rejected_cast();
            return Ok(CastOutcome::AlreadyVoted);
        }

        let vote_id = batch.next_vote_id()?;
        let record = VoteRecord {
            id: vote_id,
            voter_id,
            candidate_id,
            timestamp: now,
            voter_name: voter.name.clone(),
            voter_class: voter.class.clone(),
            candidate_name: candidate.name.clone(),
            candidate_number: candidate.number,
        };

        voter.mark_voted(candidate_id, now);
        candidate.vote_count += 1;

        batch.put_voter(&voter)?;
        batch.put_candidate(&candidate)?;
        batch.put_vote(&record)?;
        batch.append_audit(&NewAuditEntry::new(
            AuditAction::VoteCast,
            voter_id.to_string(),
            voter.name.clone(),
            format!(
                "ballot for candidate {} - {}",
                candidate.number, candidate.name
            ),
            now,
        ))?;

        // The receipt is read back from the uncommitted transaction state,
        // not assembled from local variables.
        let stored = batch.get_vote(vote_id)?.ok_or_else(|| {
            StoreError::Corruption("ledger row unreadable inside its own transaction".into())
        })?;
        let receipt = VoteReceipt {
            vote_id: stored.id,
            voter_id: stored.voter_id,
            voter_name: stored.voter_name,
            voter_class: stored.voter_class,
            candidate_id: stored.candidate_id,
            candidate_name: stored.candidate_name,
            candidate_number: stored.candidate_number,
            candidate_votes: candidate.vote_count,
            timestamp: stored.timestamp,
        };

        batch.commit()?;
        self.counters.record_ballot();
        info!(voter = %voter_id, candidate = %candidate_id, vote = %vote_id, "ballot recorded");
        self.bus.emit(&ElectionEvent::VoteCast {
            voter_id,
            candidate_id,
            vote_id,
        });
        Ok(CastOutcome::Success(receipt))
    }

    /// A voter's ballot state with their chosen candidate summarized.
    pub fn voting_status(&self, voter_id: VoterId) -> Result<Option<VotingStatus>, ElectionError> {
        let Some(voter) = self.env.voter_store().get_voter(voter_id)? else {
            return Ok(None);
        };
        let choice = match voter.voted_candidate_id {
            Some(candidate_id) => self
                .env
                .candidate_store()
                .get_candidate(candidate_id)?
                .map(|c| CandidateSummary {
                    id: c.id,
                    name: c.name,
                    number: c.number,
                }),
            None => None,
        };
        Ok(Some(VotingStatus {
            voter_id: voter.id,
            has_voted: voter.has_voted,
            vote_time: voter.vote_time,
            choice,
        }))
    }

    // ── Statistics ──────────────────────────────────────────────────────

    /// Recompute the statistics snapshot from current state.
    pub fn election_stats(&self) -> Result<ElectionStats, ElectionError> {
        let voters = self.env.voter_store().iter_voters()?;
        let candidates = self.env.candidate_store().iter_candidates()?;
        let votes = self.env.vote_store().iter_votes()?;
        Ok(stats::compute_stats(&voters, &candidates, &votes))
    }

    // ── Resets ──────────────────────────────────────────────────────────

    /// Clear every ballot: all voters unmarked, all tallies zeroed, the
    /// ledger emptied, one audit entry. Returns the number of ballots
    /// cleared.
    pub fn reset_all_votes(&self) -> Result<u64, ElectionError> {
        let now = Timestamp::now();
        let mut batch = self.env.write_batch()?;

        let mut cleared = 0u64;
        for mut voter in batch.all_voters()? {
            if voter.has_voted {
                voter.clear_vote(now);
                batch.put_voter(&voter)?;
                cleared += 1;
            }
        }
        for mut candidate in batch.all_candidates()? {
            if candidate.vote_count != 0 {
                candidate.vote_count = 0;
                candidate.updated_at = now;
                batch.put_candidate(&candidate)?;
            }
        }
        batch.clear_votes()?;
        batch.append_audit(&NewAuditEntry::new(
            AuditAction::ResetAllVotes,
            "admin",
            "System Admin",
            format!("cleared all voting data ({cleared} ballots)"),
            now,
        ))?;
        batch.commit()?;

        self.counters.record_reset();
        warn!(ballots = cleared, "all votes reset");
        self.bus.emit(&ElectionEvent::AllVotesReset {
            votes_cleared: cleared,
        });
        Ok(cleared)
    }

    /// Withdraw one voter's ballot: voter cleared, tally decremented with a
    /// floor of zero, ledger row removed, one audit entry.
    pub fn reset_single_vote(&self, voter_id: VoterId) -> Result<ResetOutcome, ElectionError> {
        let now = Timestamp::now();
        let mut batch = self.env.write_batch()?;

        let Some(mut voter) = batch.get_voter(voter_id)? else {
            return Ok(ResetOutcome::VoterNotFound);
        };
        let ledger_entry = batch.vote_id_for_voter(voter_id)?;
        if !voter.has_voted && ledger_entry.is_none() {
            return Ok(ResetOutcome::NotVoted);
        }

        let previous_choice = voter.voted_candidate_id;
        if let Some(candidate_id) = previous_choice {
            if let Some(mut candidate) = batch.get_candidate(candidate_id)? {
                candidate.vote_count = candidate.vote_count.saturating_sub(1);
                candidate.updated_at = now;
                batch.put_candidate(&candidate)?;
            }
        }
        if let Some(vote_id) = ledger_entry {
            batch.delete_vote(vote_id, voter_id)?;
        }
        voter.clear_vote(now);
        batch.put_voter(&voter)?;
        batch.append_audit(&NewAuditEntry::new(
            AuditAction::ResetSingleVote,
            "admin",
            "System Admin",
            format!("reset ballot of {} (id {})", voter.name, voter_id),
            now,
        ))?;
        batch.commit()?;

        self.counters.record_reset();
        info!(voter = %voter_id, "single vote reset");
        self.bus.emit(&ElectionEvent::SingleVoteReset {
            voter_id,
            candidate_id: previous_choice,
        });
        Ok(ResetOutcome::Reset {
            voter_id,
            previous_choice,
        })
    }

    // ── Admin accounts ──────────────────────────────────────────────────

    /// Check admin credentials.
    ///
    /// The comparison is plain-text equality, kept byte-for-byte compatible
    /// with the accounts this store inherits. Treat it as an operator
    /// convenience, not hardening; these accounts must never face a network.
    pub fn validate_admin_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AdminLoginOutcome, ElectionError> {
        let Some(account) = self.env.admin_store().get_admin_by_username(username)? else {
            return Ok(AdminLoginOutcome::BadUsername);
        };
        if account.password != password {
            return Ok(AdminLoginOutcome::BadPassword);
        }
        self.soft_audit(NewAuditEntry::new(
            AuditAction::AdminLogin,
            account.id.to_string(),
            account.name.clone(),
            "admin login successful",
            Timestamp::now(),
        ));
        Ok(AdminLoginOutcome::Success(account.profile()))
    }

    /// Sanitized profiles of every admin account.
    pub fn admins(&self) -> Result<Vec<AdminProfile>, ElectionError> {
        Ok(self
            .env
            .admin_store()
            .iter_admins()?
            .iter()
            .map(AdminAccount::profile)
            .collect())
    }

    pub fn add_admin(&self, new: NewAdmin) -> Result<AdminProfile, ElectionError> {
        let now = Timestamp::now();
        let account = AdminAccount {
            id: self.next_admin_id()?,
            username: new.username,
            name: new.name,
            password: new.password,
            role: new.role,
            permissions: new.permissions,
            email: new.email,
            phone: new.phone,
            created_at: now,
            updated_at: now,
        };
        self.env.admin_store().insert_admin(&account)?;
        self.soft_audit(NewAuditEntry::new(
            AuditAction::AdminAdded,
            "system",
            "System",
            format!("admin added: {}", account.username),
            now,
        ));
        Ok(account.profile())
    }

    pub fn update_admin(
        &self,
        id: AdminId,
        patch: AdminPatch,
    ) -> Result<AdminProfile, ElectionError> {
        let store = self.env.admin_store();
        let mut account = store
            .get_admin(id)?
            .ok_or_else(|| StoreError::NotFound(format!("admin {id}")))?;

        if let Some(username) = patch.username {
            if username != account.username {
                if store.get_admin_by_username(&username)?.is_some() {
                    return Err(StoreError::Constraint(format!(
                        "admin username `{username}` is already taken"
                    ))
                    .into());
                }
                account.username = username;
            }
        }
        if let Some(name) = patch.name {
            account.name = name;
        }
        if let Some(password) = patch.password {
            account.password = password;
        }
        if let Some(role) = patch.role {
            account.role = role;
        }
        if let Some(permissions) = patch.permissions {
            account.permissions = permissions;
        }
        if let Some(email) = patch.email {
            account.email = email;
        }
        if let Some(phone) = patch.phone {
            account.phone = phone;
        }
        account.updated_at = Timestamp::now();
        store.put_admin(&account)?;

        self.soft_audit(NewAuditEntry::new(
            AuditAction::AdminUpdated,
            "system",
            "System",
            format!("admin updated: {}", account.username),
            account.updated_at,
        ));
        Ok(account.profile())
    }

    /// Remove an admin account. Returns false when it did not exist.
    pub fn delete_admin(&self, id: AdminId) -> Result<bool, ElectionError> {
        let store = self.env.admin_store();
        let Some(account) = store.get_admin(id)? else {
            return Ok(false);
        };
        store.delete_admin(id)?;
        self.soft_audit(NewAuditEntry::new(
            AuditAction::AdminDeleted,
            "system",
            "System",
            format!("admin deleted: {}", account.username),
            Timestamp::now(),
        ));
        Ok(true)
    }

    // ── Voter management ────────────────────────────────────────────────

    pub fn add_voter(&self, new: NewVoter) -> Result<Voter, ElectionError> {
        let voter = Voter::new(
            self.next_voter_id()?,
            new.username,
            new.name,
            new.class,
            Timestamp::now(),
        );
        self.env.voter_store().insert_voter(&voter)?;
        Ok(voter)
    }

    pub fn update_voter(&self, id: VoterId, patch: VoterPatch) -> Result<Voter, ElectionError> {
        let store = self.env.voter_store();
        let mut voter = store
            .get_voter(id)?
            .ok_or_else(|| StoreError::NotFound(format!("voter {id}")))?;

        if let Some(username) = patch.username {
            if username != voter.username {
                if store.get_voter_by_username(&username)?.is_some() {
                    return Err(StoreError::Constraint(format!(
                        "voter username `{username}` is already taken"
                    ))
                    .into());
                }
                voter.username = username;
            }
        }
        if let Some(name) = patch.name {
            voter.name = name;
        }
        if let Some(class) = patch.class {
            voter.class = class;
        }
        voter.updated_at = Timestamp::now();
        store.put_voter(&voter)?;
        Ok(voter)
    }

    /// Remove a voter. Refused while they hold a ballot; reset it first.
    pub fn delete_voter(&self, id: VoterId) -> Result<bool, ElectionError> {
        Ok(self.env.voter_store().delete_voter(id)?)
    }

    pub fn voters(&self) -> Result<Vec<Voter>, ElectionError> {
        Ok(self.env.voter_store().iter_voters()?)
    }

    pub fn voter_by_username(&self, username: &str) -> Result<Option<Voter>, ElectionError> {
        Ok(self.env.voter_store().get_voter_by_username(username)?)
    }

    pub fn voters_by_class(&self, class: &str) -> Result<Vec<Voter>, ElectionError> {
        Ok(self.env.voter_store().voters_by_class(class)?)
    }

    pub fn voted_voters(&self) -> Result<Vec<Voter>, ElectionError> {
        Ok(self.env.voter_store().voters_by_voted(true)?)
    }

    pub fn not_voted_voters(&self) -> Result<Vec<Voter>, ElectionError> {
        Ok(self.env.voter_store().voters_by_voted(false)?)
    }

    // ── Candidate management ────────────────────────────────────────────

    pub fn add_candidate(&self, new: NewCandidate) -> Result<Candidate, ElectionError> {
        let now = Timestamp::now();
        let candidate = Candidate {
            id: self.next_candidate_id()?,
            number: new.number,
            name: new.name,
            running_mate: new.running_mate,
            class: new.class,
            slogan: new.slogan,
            tags: new.tags,
            vision: new.vision,
            mission: new.mission,
            photo: new.photo,
            running_mate_photo: new.running_mate_photo,
            vote_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.env.candidate_store().insert_candidate(&candidate)?;
        Ok(candidate)
    }

    pub fn update_candidate(
        &self,
        id: CandidateId,
        patch: CandidatePatch,
    ) -> Result<Candidate, ElectionError> {
        let store = self.env.candidate_store();
        let mut candidate = store
            .get_candidate(id)?
            .ok_or_else(|| StoreError::NotFound(format!("candidate {id}")))?;

        if let Some(number) = patch.number {
            if number != candidate.number {
                if store.get_candidate_by_number(number)?.is_some() {
                    return Err(StoreError::Constraint(format!(
                        "ballot number {number} is already taken"
                    ))
                    .into());
                }
                candidate.number = number;
            }
        }
        if let Some(name) = patch.name {
            candidate.name = name;
        }
        if let Some(running_mate) = patch.running_mate {
            candidate.running_mate = running_mate;
        }
        if let Some(class) = patch.class {
            candidate.class = class;
        }
        if let Some(slogan) = patch.slogan {
            candidate.slogan = slogan;
        }
        if let Some(tags) = patch.tags {
            candidate.tags = tags;
        }
        if let Some(vision) = patch.vision {
            candidate.vision = vision;
        }
        if let Some(mission) = patch.mission {
            candidate.mission = mission;
        }
        if let Some(photo) = patch.photo {
            candidate.photo = photo;
        }
        if let Some(running_mate_photo) = patch.running_mate_photo {
            candidate.running_mate_photo = running_mate_photo;
        }
        candidate.updated_at = Timestamp::now();
        store.put_candidate(&candidate)?;
        Ok(candidate)
    }

    /// Remove a candidate. Refused while any ballots name them.
    pub fn delete_candidate(&self, id: CandidateId) -> Result<bool, ElectionError> {
        Ok(self.env.candidate_store().delete_candidate(id)?)
    }

    pub fn candidates(&self) -> Result<Vec<Candidate>, ElectionError> {
        Ok(self.env.candidate_store().iter_candidates()?)
    }

    pub fn candidate_by_number(&self, number: u32) -> Result<Option<Candidate>, ElectionError> {
        Ok(self.env.candidate_store().get_candidate_by_number(number)?)
    }

    // ── Audit trail ─────────────────────────────────────────────────────

    /// All audit entries, newest first.
    pub fn audit_logs(&self) -> Result<Vec<AuditLogEntry>, ElectionError> {
        Ok(self.env.audit_store().iter_audit_logs()?)
    }

    pub fn audit_logs_by_action(
        &self,
        action: AuditAction,
    ) -> Result<Vec<AuditLogEntry>, ElectionError> {
        Ok(self.env.audit_store().audit_logs_by_action(action)?)
    }

    pub fn audit_count(&self) -> Result<u64, ElectionError> {
        Ok(self.env.audit_store().audit_count()?)
    }

    /// Erase the audit trail. An explicit admin action, itself unaudited.
    pub fn clear_audit_logs(&self) -> Result<(), ElectionError> {
        Ok(self.env.audit_store().clear_audit_logs()?)
    }

    pub fn audit_available(&self) -> bool {
        self.env.audit_store().audit_available()
    }

    // ── Export / backup / restore ───────────────────────────────────────

    /// Externalize the complete store state, rows in ascending id order.
    pub fn export_voting_data(&self) -> Result<ExportSnapshot, ElectionError> {
        let voters = self.env.voter_store().iter_voters()?;
        let candidates = self.env.candidate_store().iter_candidates()?;
        let votes = self.env.vote_store().iter_votes()?;
        let admins = self.env.admin_store().iter_admins()?;
        let mut audit_logs = self.env.audit_store().iter_audit_logs()?;
        audit_logs.reverse();

        let statistics = stats::compute_stats(&voters, &candidates, &votes);
        Ok(ExportSnapshot {
            metadata: ExportMetadata {
                export_date: pemilu_utils::format_rfc3339(Timestamp::now()),
                system: EXPORT_SYSTEM_NAME.to_string(),
                version: EXPORT_FORMAT_VERSION.to_string(),
            },
            statistics,
            voters,
            candidates,
            votes,
            admins,
            audit_logs,
        })
    }

    /// Write a pretty-printed backup file and return the exported snapshot.
    pub fn backup_to_file(&self, path: &Path) -> Result<ExportSnapshot, ElectionError> {
        let now = Timestamp::now();
        let snapshot = self.export_voting_data()?;
        let backup = BackupFile {
            created_at: pemilu_utils::format_rfc3339(now),
            data: snapshot.clone(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&backup)?)?;
        info!(path = %path.display(), "backup written");
        self.soft_audit(NewAuditEntry::new(
            AuditAction::DatabaseBackup,
            "system",
            "System",
            format!("backup written to {}", path.display()),
            now,
        ));
        Ok(snapshot)
    }

    /// Restore from a backup file, accepting either the wrapped
    /// [`BackupFile`] shape or a bare snapshot.
    pub fn restore_from_file(&self, path: &Path) -> Result<RestoreReport, ElectionError> {
        let raw = std::fs::read_to_string(path)?;
        let snapshot = match serde_json::from_str::<BackupFile>(&raw) {
            Ok(backup) => backup.data,
            Err(_) => serde_json::from_str::<ExportSnapshot>(&raw)?,
        };
        self.restore_from_snapshot(&snapshot)
    }

    /// Replace the store's contents with a snapshot, in one transaction.
    ///
    /// Every collection is cleared and reinserted with its original ids and
    /// timestamps; id sequences are advanced past the restored maxima so new
    /// rows never collide with restored ones. A snapshot without admin rows
    /// leaves the current admin accounts in place.
    pub fn restore_from_snapshot(
        &self,
        snapshot: &ExportSnapshot,
    ) -> Result<RestoreReport, ElectionError> {
        if snapshot.metadata.version != EXPORT_FORMAT_VERSION {
            return Err(ElectionError::Invalid(format!(
                "unsupported backup version `{}`, expected `{}`",
                snapshot.metadata.version, EXPORT_FORMAT_VERSION
            )));
        }

        let now = Timestamp::now();
        let mut batch = self.env.write_batch()?;
        batch.clear_voters()?;
        batch.clear_candidates()?;
        batch.clear_votes()?;
        batch.clear_audit()?;

        for voter in &snapshot.voters {
            batch.put_voter(voter)?;
        }
        for candidate in &snapshot.candidates {
            batch.put_candidate(candidate)?;
        }
        for vote in &snapshot.votes {
            batch.put_vote(vote)?;
        }
        if !snapshot.admins.is_empty() {
            batch.clear_admins()?;
            for admin in &snapshot.admins {
                batch.put_admin(admin)?;
            }
        }
        for entry in &snapshot.audit_logs {
            batch.put_audit_entry(entry)?;
        }

        let max_vote_id = snapshot.votes.iter().map(|v| v.id.get()).max().unwrap_or(0);
        let max_audit_id = snapshot
            .audit_logs
            .iter()
            .map(|e| e.id.get())
            .max()
            .unwrap_or(0);
        batch.advance_vote_sequence(max_vote_id)?;
        batch.advance_audit_sequence(max_audit_id)?;
        batch.append_audit(&NewAuditEntry::new(
            AuditAction::DatabaseRestore,
            "system",
            "System",
            "database restored from backup",
            now,
        ))?;
        batch.commit()?;

        let report = RestoreReport {
            voters: snapshot.voters.len() as u64,
            candidates: snapshot.candidates.len() as u64,
            votes: snapshot.votes.len() as u64,
            admins: snapshot.admins.len() as u64,
            audit_entries: snapshot.audit_logs.len() as u64,
        };
        warn!(
            voters = report.voters,
            votes = report.votes,
            "store contents replaced from backup"
        );
        self.bus.emit(&ElectionEvent::DataRestored {
            voters: report.voters,
            votes: report.votes,
        });
        Ok(report)
    }

    // ── Health ──────────────────────────────────────────────────────────

    /// Structural health: database presence, row counts, audit availability.
    pub fn check_health(&self) -> Result<HealthReport, ElectionError> {
        let integrity = check_integrity(self.env.env()).map_err(StoreError::from)?;
        Ok(HealthReport {
            healthy: integrity.is_healthy(),
            audit_available: self.audit_available(),
            schema_version: self.env.meta_store().get_schema_version()?,
            voters: self.env.voter_store().voter_count()?,
            candidates: self.env.candidate_store().candidate_count()?,
            votes: self.env.vote_store().vote_count()?,
            admins: self.env.admin_store().admin_count()?,
            audit_entries: self.env.audit_store().audit_count()?,
            missing_databases: integrity.missing,
            ops: self.counters.snapshot(),
        })
    }

    // ── Internals ───────────────────────────────────────────────────────

    /// Append an audit entry outside any pending transaction. Failures are
    /// logged and swallowed; bookkeeping never fails the operation it
    /// describes.
    fn soft_audit(&self, entry: NewAuditEntry) {
        if let Err(e) = self.env.audit_store().append_audit(&entry) {
            warn!(error = %e, action = %entry.action, "audit append failed");
        }
    }

    fn next_voter_id(&self) -> Result<VoterId, ElectionError> {
        let last = self
            .env
            .voter_store()
            .iter_voters()?
            .last()
            .map(|v| v.id.get())
            .unwrap_or(0);
        Ok(VoterId::new(last + 1))
    }

    fn next_candidate_id(&self) -> Result<CandidateId, ElectionError> {
        let last = self
            .env
            .candidate_store()
            .iter_candidates()?
            .last()
            .map(|c| c.id.get())
            .unwrap_or(0);
        Ok(CandidateId::new(last + 1))
    }

    fn next_admin_id(&self) -> Result<AdminId, ElectionError> {
        let last = self
            .env
            .admin_store()
            .iter_admins()?
            .last()
            .map(|a| a.id.get())
            .unwrap_or(0);
        Ok(AdminId::new(last + 1))
    }
}

/// `…/data` becomes `…/data-<label>-<epoch secs><suffix>`.
fn sibling_path(dir: &Path, label: &str, suffix: &str) -> PathBuf {
    let stem = dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("store");
    dir.with_file_name(format!(
        "{stem}-{label}-{}{suffix}",
        Timestamp::now().as_secs()
    ))
}
