//! Sprints CLI: operate a StableSprints ledger stored in a JSON state file.
//!
//! Commands:
//! - `init`: create a ledger from a TOML config (or defaults)
//! - `tiers`: list the tier catalog
//! - `mint` / `approve`: token setup for an account
//! - `fund`: add to the reward reserve
//! - `open` / `settle` / `withdraw`: position lifecycle
//! - `show` / `list` / `quote` / `stats` / `events` / `digest`: read-only views
//! - `replay`: run a scenario script
//! - `simulate`: seeded random workload
//! - `export`: positions and events as CSV

mod state;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sprint_core::domain::{AccountId, PositionId, TierId, Timestamp};
use sprint_core::token::TokenLedger;
use sprint_runner::{
    export_events_csv, export_positions_csv, simulate, write_csv, EventJournal, LedgerConfig,
    Scenario, WorkloadConfig,
};
use state::{display_amount, format_time, parse_amount, position_line, resolve_now};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "sprints",
    about = "StableSprints: fixed-term yield positions over a mock stablecoin"
)]
struct Cli {
    /// Ledger state file.
    #[arg(long, global = true, default_value = "sprints-state.json")]
    state: PathBuf,

    /// Override the clock (Unix seconds). Defaults to the current time.
    #[arg(long, global = true)]
    now: Option<Timestamp>,

    /// Debug-level logging.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new ledger state file.
    Init {
        /// TOML ledger config. Defaults to the built-in tiers and token.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Overwrite an existing state file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// List the tier catalog.
    Tiers,
    /// Mint tokens to an account.
    Mint {
        account: String,
        /// Amount in token units (e.g. 100.5).
        amount: String,
    },
    /// Approve the custody account to pull tokens from an account.
    Approve { account: String, amount: String },
    /// Move tokens from an account into the reward reserve.
    Fund { account: String, amount: String },
    /// Open a position.
    Open {
        account: String,
        amount: String,
        /// Tier id (0 = Quick, 1 = Standard, 2 = Long with the default catalog).
        #[arg(long, default_value_t = 0)]
        tier: u8,
    },
    /// Settle a matured position.
    Settle { account: String, position: u64 },
    /// Exit a position before maturity at half yield.
    Withdraw { account: String, position: u64 },
    /// Show one position.
    Show { position: u64 },
    /// List positions, optionally for one owner.
    List {
        #[arg(long)]
        owner: Option<String>,
    },
    /// Quote maturity and early-exit payouts for a position.
    Quote { position: u64 },
    /// Ledger totals, custody balance, and audit.
    Stats,
    /// Print the event log.
    Events {
        /// Only events with seq >= this value.
        #[arg(long, default_value_t = 0)]
        since: u64,

        /// Also append new events to this JSONL journal.
        #[arg(long)]
        journal: Option<PathBuf>,
    },
    /// Replay a scenario script against a fresh ledger.
    Replay {
        scenario: PathBuf,

        /// Write the resulting ledger to --state.
        #[arg(long, default_value_t = false)]
        save: bool,

        /// Append the resulting events to this JSONL journal.
        #[arg(long)]
        journal: Option<PathBuf>,
    },
    /// Run a seeded random workload against a fresh ledger.
    Simulate {
        #[arg(long, default_value_t = 42)]
        seed: u64,

        #[arg(long, default_value_t = 1_000)]
        steps: usize,

        #[arg(long, default_value_t = 8)]
        accounts: usize,

        /// TOML ledger config.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Export positions (and optionally events) as CSV.
    Export {
        #[arg(long, default_value = "positions.csv")]
        positions: PathBuf,

        #[arg(long)]
        events: Option<PathBuf>,
    },
    /// Print the BLAKE3 digest of the ledger state.
    Digest,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let path = cli.state.as_path();
    match cli.command {
        Commands::Init { config, force } => run_init(path, config.as_deref(), force),
        Commands::Tiers => run_tiers(path),
        Commands::Mint { account, amount } => run_mint(path, &account, &amount),
        Commands::Approve { account, amount } => run_approve(path, &account, &amount),
        Commands::Fund { account, amount } => run_fund(path, cli.now, &account, &amount),
        Commands::Open {
            account,
            amount,
            tier,
        } => run_open(path, cli.now, &account, &amount, tier),
        Commands::Settle { account, position } => {
            run_close(path, cli.now, &account, position, false)
        }
        Commands::Withdraw { account, position } => {
            run_close(path, cli.now, &account, position, true)
        }
        Commands::Show { position } => run_show(path, position),
        Commands::List { owner } => run_list(path, owner.as_deref()),
        Commands::Quote { position } => run_quote(path, cli.now, position),
        Commands::Stats => run_stats(path),
        Commands::Events { since, journal } => run_events(path, since, journal),
        Commands::Replay {
            scenario,
            save,
            journal,
        } => run_replay(path, &scenario, save, journal),
        Commands::Simulate {
            seed,
            steps,
            accounts,
            config,
        } => run_simulate(seed, steps, accounts, config.as_deref()),
        Commands::Export { positions, events } => run_export(path, &positions, events.as_deref()),
        Commands::Digest => run_digest(path),
    }
}

fn load_config(path: Option<&Path>) -> Result<LedgerConfig> {
    match path {
        Some(p) => LedgerConfig::from_file(p)
            .with_context(|| format!("failed to load config {}", p.display())),
        None => Ok(LedgerConfig::default()),
    }
}

// ── Setup ────────────────────────────────────────────────────────────

fn run_init(path: &Path, config: Option<&Path>, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    let ledger = load_config(config)?.build_ledger()?;
    state::save(&ledger, path)?;
    println!(
        "Initialized ledger at {} ({} tiers, custody {})",
        path.display(),
        ledger.tiers().len(),
        ledger.custody()
    );
    Ok(())
}

fn run_tiers(path: &Path) -> Result<()> {
    let ledger = state::load(path)?;
    println!("{:<4} {:<20} {:>10} {:>8}", "id", "name", "lock (s)", "yield");
    for tier in ledger.tiers().iter() {
        println!(
            "{:<4} {:<20} {:>10} {:>7.2}%",
            tier.id.to_string(),
            tier.name,
            tier.lock_duration,
            tier.yield_rate_bps as f64 / 100.0
        );
    }
    Ok(())
}

fn run_mint(path: &Path, account: &str, amount: &str) -> Result<()> {
    let mut ledger = state::load(path)?;
    let amount = parse_amount(&ledger, amount)?;
    let account = AccountId::new(account);
    ledger.token_mut().mint(&account, amount)?;
    state::save(&ledger, path)?;
    println!(
        "Minted {} to {} (balance {})",
        display_amount(&ledger, amount),
        account,
        display_amount(&ledger, ledger.token().balance_of(&account))
    );
    Ok(())
}

fn run_approve(path: &Path, account: &str, amount: &str) -> Result<()> {
    let mut ledger = state::load(path)?;
    let amount = parse_amount(&ledger, amount)?;
    let account = AccountId::new(account);
    let custody = ledger.custody().clone();
    ledger.token_mut().approve(&account, &custody, amount);
    state::save(&ledger, path)?;
    println!(
        "{} approved {} for {}",
        account,
        custody,
        display_amount(&ledger, amount)
    );
    Ok(())
}

fn run_fund(path: &Path, now: Option<Timestamp>, account: &str, amount: &str) -> Result<()> {
    let mut ledger = state::load(path)?;
    let now = resolve_now(now)?;
    let amount = parse_amount(&ledger, amount)?;
    ledger.fund_rewards(&AccountId::new(account), amount, now)?;
    state::save(&ledger, path)?;
    println!(
        "Funded {} (reserve {})",
        display_amount(&ledger, amount),
        display_amount(&ledger, ledger.reward_reserve())
    );
    Ok(())
}

// ── Lifecycle ────────────────────────────────────────────────────────

fn run_open(
    path: &Path,
    now: Option<Timestamp>,
    account: &str,
    amount: &str,
    tier: u8,
) -> Result<()> {
    let mut ledger = state::load(path)?;
    let now = resolve_now(now)?;
    let principal = parse_amount(&ledger, amount)?;
    let id = ledger.open_position(&AccountId::new(account), principal, TierId(tier), now)?;
    state::save(&ledger, path)?;
    let position = ledger.get_position(id)?;
    println!("Opened {}", position_line(&ledger, position));
    Ok(())
}

fn run_close(
    path: &Path,
    now: Option<Timestamp>,
    account: &str,
    position: u64,
    early: bool,
) -> Result<()> {
    let mut ledger = state::load(path)?;
    let now = resolve_now(now)?;
    let caller = AccountId::new(account);
    let id = PositionId(position);
    let payout = if early {
        ledger.withdraw_early(&caller, id, now)?
    } else {
        ledger.settle(&caller, id, now)?
    };
    state::save(&ledger, path)?;
    println!(
        "{} {} paid {} to {}",
        if early { "Withdrew" } else { "Settled" },
        id,
        display_amount(&ledger, payout),
        caller
    );
    Ok(())
}

// ── Views ────────────────────────────────────────────────────────────

fn run_show(path: &Path, position: u64) -> Result<()> {
    let ledger = state::load(path)?;
    let p = ledger.get_position(PositionId(position))?;
    println!("{}", serde_json::to_string_pretty(p)?);
    Ok(())
}

fn run_list(path: &Path, owner: Option<&str>) -> Result<()> {
    let ledger = state::load(path)?;
    let owner = owner.map(AccountId::new);
    let lines: Vec<String> = match &owner {
        Some(owner) => ledger
            .positions_of(owner)
            .map(|p| position_line(&ledger, p))
            .collect(),
        None => ledger.positions().map(|p| position_line(&ledger, p)).collect(),
    };
    if lines.is_empty() {
        println!("No positions.");
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

fn run_quote(path: &Path, now: Option<Timestamp>, position: u64) -> Result<()> {
    let ledger = state::load(path)?;
    let now = resolve_now(now)?;
    let quote = ledger.quote(PositionId(position), now)?;
    println!("At maturity:  {}", display_amount(&ledger, quote.maturity_payout));
    println!("Early exit:   {}", display_amount(&ledger, quote.early_payout));
    if quote.is_mature {
        println!("Matured.");
    } else {
        println!("Matures in {}s", quote.seconds_to_maturity);
    }
    match quote.redeemable_now {
        Some(amount) => println!("Redeemable:   {}", display_amount(&ledger, amount)),
        None => println!("Closed."),
    }
    Ok(())
}

fn run_stats(path: &Path) -> Result<()> {
    let ledger = state::load(path)?;
    let stats = ledger.stats();
    let audit = ledger.audit()?;
    println!(
        "Positions:        {} ({} open, {} settled, {} early)",
        audit.positions, audit.open, audit.settled, audit.withdrawn_early
    );
    println!("Deposited:        {}", display_amount(&ledger, stats.total_deposited));
    println!("Funded:           {}", display_amount(&ledger, stats.total_funded));
    println!("Paid out:         {}", display_amount(&ledger, stats.total_paid_out));
    println!("Yield paid:       {}", display_amount(&ledger, stats.total_yield_paid));
    println!("Yield forfeited:  {}", display_amount(&ledger, stats.total_forfeited_yield));
    println!("Open principal:   {}", display_amount(&ledger, audit.open_principal));
    println!("Custody balance:  {}", display_amount(&ledger, audit.custody_balance));
    println!("Reward reserve:   {}", display_amount(&ledger, audit.reward_reserve));
    Ok(())
}

fn run_events(path: &Path, since: u64, journal: Option<PathBuf>) -> Result<()> {
    let ledger = state::load(path)?;
    for record in ledger.events_since(since) {
        println!(
            "{:>5}  {}  {}",
            record.seq,
            format_time(record.at),
            serde_json::to_string(&record.event)?
        );
    }
    if let Some(journal_path) = journal {
        let written = EventJournal::new(journal_path.clone()).append(ledger.events())?;
        println!("Appended {written} events to {}", journal_path.display());
    }
    Ok(())
}

fn run_digest(path: &Path) -> Result<()> {
    let ledger = state::load(path)?;
    println!("{}", ledger.snapshot().digest()?);
    Ok(())
}

// ── Runner ───────────────────────────────────────────────────────────

fn run_replay(path: &Path, scenario: &Path, save: bool, journal: Option<PathBuf>) -> Result<()> {
    let scenario = Scenario::from_file(scenario)?;
    let report = scenario.replay()?;

    for step in &report.steps {
        let mark = if step.matched { " " } else { "✗" };
        println!(
            "{mark} {:>3} {:<9} {:<24} {}",
            step.index, step.action, step.outcome, step.detail
        );
    }
    println!(
        "{}: {} steps, {} mismatches, digest {}",
        report.name,
        report.steps.len(),
        report.mismatches,
        report.digest
    );

    if let Some(journal_path) = journal {
        EventJournal::new(journal_path).append(&report.snapshot.events)?;
    }
    if save {
        report
            .snapshot
            .save(path)
            .with_context(|| format!("failed to write ledger state {}", path.display()))?;
        println!("Saved ledger to {}", path.display());
    }
    if !report.passed() {
        bail!("{} expectation(s) not met", report.mismatches);
    }
    Ok(())
}

fn run_simulate(seed: u64, steps: usize, accounts: usize, config: Option<&Path>) -> Result<()> {
    let ledger_config = load_config(config)?;
    let workload = WorkloadConfig {
        seed,
        steps,
        accounts,
        ..WorkloadConfig::default()
    };
    let report = simulate(&workload, &ledger_config)?;

    println!("Seed {}: {} steps", report.seed, report.steps);
    for (outcome, count) in &report.outcomes {
        println!("  {outcome:<32} {count:>6}");
    }
    println!(
        "Open {} / settled {} / early {}",
        report.audit.open, report.audit.settled, report.audit.withdrawn_early
    );
    println!("Digest {}", report.digest);
    Ok(())
}

fn run_export(path: &Path, positions: &Path, events: Option<&Path>) -> Result<()> {
    let ledger = state::load(path)?;
    let decimals = ledger.token().decimals;
    write_csv(positions, &export_positions_csv(ledger.positions(), decimals)?)?;
    println!("Wrote {} positions to {}", ledger.next_position_id(), positions.display());
    if let Some(events_path) = events {
        write_csv(events_path, &export_events_csv(ledger.events())?)?;
        println!("Wrote {} events to {}", ledger.events().len(), events_path.display());
    }
    Ok(())
}
