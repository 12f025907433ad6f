//! pemilu - command line tools for the single-election vote store.
//!
//! One binary covers the kiosk lifecycle: seeding, voter login checks,
//! casting, statistics, audit inspection, backup and restore, repair, and
//! the background sync loop.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tokio::sync::{broadcast, Notify};

use pemilu_election::export::render_csv_summary;
use pemilu_election::store::DEFAULT_MAX_DBS;
use pemilu_election::{
    AdminLoginOutcome, CastOutcome, ElectionStats, ElectionStore, LoginOutcome, ResetOutcome,
};
use pemilu_sync::{cast_listener, SyncConfig, SyncManager};
use pemilu_types::{AuditAction, CandidateId, VoterId};
use pemilu_utils::{format_duration, format_utc, LogFormat};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "pemilu", about = "Single-election vote store and kiosk tools")]
struct Cli {
    /// Directory holding the election store.
    #[arg(long, env = "PEMILU_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "PEMILU_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "PEMILU_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Path to a TOML configuration file. File settings are the base;
    /// flags and environment variables override them.
    #[arg(long, env = "PEMILU_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the store and seed default data into empty collections.
    Init,
    /// Print the current statistics snapshot.
    Stats {
        /// Emit JSON instead of the table.
        #[arg(long)]
        json: bool,
    },
    /// Export the complete election state.
    Export {
        /// Write the spreadsheet summary instead of the JSON snapshot.
        #[arg(long)]
        csv: bool,
        /// Output file; stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write a timestamped backup file.
    Backup {
        #[arg(long)]
        output: PathBuf,
    },
    /// Replace the store contents from a backup file.
    Restore {
        #[arg(long)]
        input: PathBuf,
        /// Confirm replacing everything currently in the store.
        #[arg(long)]
        yes: bool,
    },
    /// Clear every ballot: voters unmarked, tallies zeroed, ledger emptied.
    ResetAll {
        #[arg(long)]
        yes: bool,
    },
    /// Withdraw one voter's ballot.
    ResetVoter {
        /// Numeric voter id.
        id: u32,
        #[arg(long)]
        yes: bool,
    },
    /// Salvage what is readable, then rebuild the store from seed data.
    Repair {
        #[arg(long)]
        yes: bool,
    },
    /// Structural health check; exits nonzero when the store is unhealthy.
    Health,
    /// Check a voter's login and ballot state.
    Login {
        username: String,
    },
    /// Check admin credentials.
    AdminLogin {
        username: String,
        password: String,
    },
    /// Cast a ballot.
    Cast {
        /// Numeric voter id.
        #[arg(long)]
        voter: u32,
        /// Numeric candidate id.
        #[arg(long)]
        candidate: u32,
    },
    /// Show the audit trail, newest first.
    Audit {
        /// Filter by action, e.g. "vote_cast" or "RESET_ALL_VOTES".
        #[arg(long)]
        action: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Push snapshots to the sync endpoint until interrupted.
    Sync {
        /// Echo endpoint URL; overrides the config file.
        #[arg(long, env = "PEMILU_SYNC_ENDPOINT")]
        endpoint: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, warnings) = load_config(cli.config.as_deref());
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }
    if let Some(log_format) = cli.log_format {
        config.log_format = log_format;
    }

    pemilu_utils::init_tracing(config.log_format, &config.log_level);
    for warning in warnings {
        tracing::warn!("{warning}");
    }

    match cli.command {
        Command::Init => cmd_init(&config),
        Command::Stats { json } => cmd_stats(&config, json),
        Command::Export { csv, output } => cmd_export(&config, csv, output.as_deref()),
        Command::Backup { output } => cmd_backup(&config, &output),
        Command::Restore { input, yes } => cmd_restore(&config, &input, yes),
        Command::ResetAll { yes } => cmd_reset_all(&config, yes),
        Command::ResetVoter { id, yes } => cmd_reset_voter(&config, id, yes),
        Command::Repair { yes } => cmd_repair(&config, yes),
        Command::Health => cmd_health(&config),
        Command::Login { username } => cmd_login(&config, &username),
        Command::AdminLogin { username, password } => cmd_admin_login(&config, &username, &password),
        Command::Cast { voter, candidate } => cmd_cast(&config, voter, candidate),
        Command::Audit { action, limit } => cmd_audit(&config, action.as_deref(), limit),
        Command::Sync { endpoint } => cmd_sync(&config, endpoint).await,
    }
}

fn load_config(path: Option<&Path>) -> (AppConfig, Vec<String>) {
    let mut warnings = Vec::new();
    let config = match path {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(raw) => match AppConfig::from_toml_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    warnings.push(format!(
                        "failed to parse config file {}: {e}; using defaults",
                        path.display()
                    ));
                    AppConfig::default()
                }
            },
            Err(e) => {
                warnings.push(format!(
                    "failed to read config file {}: {e}; using defaults",
                    path.display()
                ));
                AppConfig::default()
            }
        },
        None => AppConfig::default(),
    };
    (config, warnings)
}

fn open_store(config: &AppConfig) -> anyhow::Result<ElectionStore> {
    ElectionStore::open_with(&config.data_dir, DEFAULT_MAX_DBS, config.map_size_bytes())
        .with_context(|| format!("opening election store at {}", config.data_dir.display()))
}

fn require_yes(yes: bool, what: &str) -> anyhow::Result<()> {
    if yes {
        Ok(())
    } else {
        bail!("{what} is destructive; re-run with --yes to confirm");
    }
}

// ── Commands ───────────────────────────────────────────────────────────

fn cmd_init(config: &AppConfig) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let report = store.initialize()?;
    if report.seeded_any() {
        println!(
            "seeded {} candidates, {} voters, {} admin accounts into {}",
            report.candidates_added,
            report.voters_added,
            report.admins_added,
            config.data_dir.display()
        );
    } else {
        println!(
            "store at {} is already initialized",
            config.data_dir.display()
        );
    }
    Ok(())
}

fn cmd_stats(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let stats = store.election_stats()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_stats(&stats);
    }
    Ok(())
}

fn print_stats(stats: &ElectionStats) {
    println!(
        "Voters:        {} total, {} voted, {} remaining",
        stats.total_voters, stats.voted_count, stats.not_voted_count
    );
    println!("Participation: {:.1}%", stats.participation_rate);
    println!("Ballots:       {}", stats.total_votes);
    println!();
    println!("Candidate results:");
    for tally in &stats.candidates {
        println!(
            "  #{:<3} {:<32} {:>5} votes  {:>5.1}%",
            tally.number, tally.name, tally.votes, tally.share
        );
    }
    if !stats.class_turnout.is_empty() {
        println!();
        println!("Turnout by class:");
        for row in &stats.class_turnout {
            println!(
                "  {:<14} {:>3}/{:<3} {:>5.1}%",
                row.class, row.voted, row.total, row.rate
            );
        }
    }
    if let (Some(first), Some(last)) = (stats.first_vote, stats.last_vote) {
        println!();
        println!("First ballot:  {}", format_utc(first));
        println!("Last ballot:   {}", format_utc(last));
        println!("Voting window: {}", format_duration(first.elapsed_since(last)));
    }
}

fn cmd_export(config: &AppConfig, csv: bool, output: Option<&Path>) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let snapshot = store.export_voting_data()?;
    let rendered = if csv {
        render_csv_summary(&snapshot)
    } else {
        serde_json::to_string_pretty(&snapshot)?
    };
    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("writing export to {}", path.display()))?;
            println!(
                "exported {} voters, {} candidates, {} ballots to {}",
                snapshot.voters.len(),
                snapshot.candidates.len(),
                snapshot.votes.len(),
                path.display()
            );
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn cmd_backup(config: &AppConfig, output: &Path) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let snapshot = store.backup_to_file(output)?;
    println!(
        "backup written to {} ({} voters, {} ballots, {} audit entries)",
        output.display(),
        snapshot.voters.len(),
        snapshot.votes.len(),
        snapshot.audit_logs.len()
    );
    Ok(())
}

fn cmd_restore(config: &AppConfig, input: &Path, yes: bool) -> anyhow::Result<()> {
    require_yes(yes, "restoring over the current store")?;
    let store = open_store(config)?;
    let report = store
        .restore_from_file(input)
        .with_context(|| format!("restoring from {}", input.display()))?;
    println!(
        "restored {} voters, {} candidates, {} ballots, {} admins, {} audit entries",
        report.voters, report.candidates, report.votes, report.admins, report.audit_entries
    );
    Ok(())
}

fn cmd_reset_all(config: &AppConfig, yes: bool) -> anyhow::Result<()> {
    require_yes(yes, "clearing every ballot")?;
    let store = open_store(config)?;
    let cleared = store.reset_all_votes()?;
    println!("cleared {cleared} ballots; all tallies are zero");
    Ok(())
}

fn cmd_reset_voter(config: &AppConfig, id: u32, yes: bool) -> anyhow::Result<()> {
    require_yes(yes, "withdrawing the voter's ballot")?;
    let store = open_store(config)?;
    match store.reset_single_vote(VoterId::new(id))? {
        ResetOutcome::Reset {
            voter_id,
            previous_choice,
        } => {
            match previous_choice {
                Some(candidate) => {
                    println!("ballot of voter {voter_id} withdrawn (was for candidate {candidate})")
                }
                None => println!("ballot of voter {voter_id} withdrawn"),
            }
            Ok(())
        }
        ResetOutcome::NotVoted => {
            println!("voter {id} has no ballot; nothing to do");
            Ok(())
        }
        ResetOutcome::VoterNotFound => bail!("no voter with id {id}"),
    }
}

fn cmd_repair(config: &AppConfig, yes: bool) -> anyhow::Result<()> {
    require_yes(yes, "rebuilding the store from seed data")?;
    let store = open_store(config)?;
    let (_store, salvage) = store.repair()?;
    match salvage {
        Some(path) => println!(
            "store rebuilt; previous contents salvaged to {}",
            path.display()
        ),
        None => println!("store rebuilt; previous contents could not be salvaged"),
    }
    Ok(())
}

fn cmd_health(config: &AppConfig) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let health = store.check_health()?;
    println!(
        "store:      {}",
        if health.healthy { "healthy" } else { "UNHEALTHY" }
    );
    match health.schema_version {
        Some(version) => println!("schema:     v{version}"),
        None => println!("schema:     unversioned"),
    }
    println!("voters:     {}", health.voters);
    println!("candidates: {}", health.candidates);
    println!("ballots:    {}", health.votes);
    println!("admins:     {}", health.admins);
    if health.audit_available {
        println!("audit:      available, {} entries", health.audit_entries);
    } else {
        println!("audit:      UNAVAILABLE (operations continue unaudited)");
    }
    if !health.healthy {
        bail!(
            "store is unhealthy; missing databases: {}",
            health.missing_databases.join(", ")
        );
    }
    Ok(())
}

fn cmd_login(config: &AppConfig, username: &str) -> anyhow::Result<()> {
    let store = open_store(config)?;
    match store.validate_login(username)? {
        LoginOutcome::Success(voter) => {
            println!(
                "ok: {} ({}), voter id {}, ballot not yet cast",
                voter.name, voter.class, voter.id
            );
            Ok(())
        }
        LoginOutcome::AlreadyVoted(voter) => {
            match voter.vote_time {
                Some(time) => println!(
                    "{} already cast a ballot at {}",
                    voter.name,
                    format_utc(time)
                ),
                None => println!("{} already cast a ballot", voter.name),
            }
            Ok(())
        }
        LoginOutcome::NotFound { hint } => bail!("unknown username `{username}` ({hint})"),
    }
}

fn cmd_admin_login(config: &AppConfig, username: &str, password: &str) -> anyhow::Result<()> {
    let store = open_store(config)?;
    match store.validate_admin_login(username, password)? {
        AdminLoginOutcome::Success(profile) => {
            println!(
                "ok: {} ({}), permissions: {}",
                profile.name,
                profile.role,
                profile.permissions.join(", ")
            );
            Ok(())
        }
        AdminLoginOutcome::BadUsername => bail!("unknown admin username"),
        AdminLoginOutcome::BadPassword => bail!("wrong password"),
    }
}

fn cmd_cast(config: &AppConfig, voter: u32, candidate: u32) -> anyhow::Result<()> {
    let store = open_store(config)?;
    match store.cast_vote(VoterId::new(voter), CandidateId::new(candidate))? {
        CastOutcome::Success(receipt) => {
            println!("ballot recorded");
            println!("  vote id:   {}", receipt.vote_id);
            println!(
                "  voter:     {} ({})",
                receipt.voter_name, receipt.voter_class
            );
            println!(
                "  candidate: #{} {}",
                receipt.candidate_number, receipt.candidate_name
            );
            println!("  tally now: {}", receipt.candidate_votes);
            println!("  time:      {}", format_utc(receipt.timestamp));
            Ok(())
        }
        CastOutcome::AlreadyVoted => bail!("voter {voter} has already cast a ballot"),
        CastOutcome::VoterNotFound => bail!("no voter with id {voter}"),
        CastOutcome::CandidateNotFound => bail!("no candidate with id {candidate}"),
    }
}

const AUDIT_ACTIONS: [AuditAction; 10] = [
    AuditAction::VoteCast,
    AuditAction::ResetAllVotes,
    AuditAction::ResetSingleVote,
    AuditAction::AdminLogin,
    AuditAction::AdminAdded,
    AuditAction::AdminUpdated,
    AuditAction::AdminDeleted,
    AuditAction::DatabaseBackup,
    AuditAction::DatabaseRestore,
    AuditAction::DatabaseRepair,
];

fn parse_audit_action(raw: &str) -> anyhow::Result<AuditAction> {
    let wanted = raw.to_uppercase();
    AUDIT_ACTIONS
        .into_iter()
        .find(|action| action.as_str() == wanted)
        .with_context(|| {
            let known: Vec<&str> = AUDIT_ACTIONS.iter().map(|a| a.as_str()).collect();
            format!(
                "unknown audit action `{raw}`; expected one of: {}",
                known.join(", ")
            )
        })
}

fn cmd_audit(config: &AppConfig, action: Option<&str>, limit: usize) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let entries = match action {
        Some(raw) => store.audit_logs_by_action(parse_audit_action(raw)?)?,
        None => store.audit_logs()?,
    };
    if entries.is_empty() {
        println!("audit trail is empty");
        return Ok(());
    }
    let shown = entries.len().min(limit);
    for entry in entries.iter().take(limit) {
        println!(
            "[{:>5}] {} {:<18} {}: {}",
            entry.id,
            format_utc(entry.timestamp),
            entry.action.as_str(),
            entry.actor_name,
            entry.details
        );
    }
    if shown < entries.len() {
        println!("... {} more entries (raise --limit)", entries.len() - shown);
    }
    Ok(())
}

async fn cmd_sync(config: &AppConfig, endpoint: Option<String>) -> anyhow::Result<()> {
    let endpoint = endpoint.or_else(|| config.sync_endpoint().map(str::to_string));
    let Some(endpoint) = endpoint else {
        bail!(
            "no sync endpoint configured; enable [sync] in the config file or pass --endpoint"
        );
    };

    let mut store = open_store(config)?;
    let trigger = Arc::new(Notify::new());
    store.subscribe(cast_listener(Arc::clone(&trigger)));

    let manager = Arc::new(SyncManager::with_trigger(
        Arc::new(store),
        SyncConfig {
            endpoint: Some(endpoint),
            interval: config.sync_interval(),
            request_timeout: Duration::from_secs(10),
        },
        trigger,
    ));
    println!(
        "sync running as {} every {}s; ctrl-c to stop",
        manager.device_id(),
        config.sync_interval().as_secs()
    );

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let worker = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.run(shutdown_rx).await }
    });

    tokio::signal::ctrl_c()
        .await
        .context("waiting for ctrl-c")?;
    let _ = shutdown_tx.send(());
    worker.await.context("sync worker")?;

    match manager.last_sync() {
        Some(time) => println!("last successful sync at {}", format_utc(time)),
        None => println!("no successful sync this session"),
    }
    Ok(())
}
