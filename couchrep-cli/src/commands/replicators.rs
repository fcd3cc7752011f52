//! `couchrep replicators list|show|delete`

use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use clap::{Args, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use couchrep_core::{DirectiveId, RegisteredReplication, ReplicationState};
use couchrep_sync::{delete_all, delete_one, redact_credentials, DirectiveStore, Registry};

use super::{client, load_settings};

/// Inspect or delete registered directives.
#[derive(Subcommand, Debug)]
pub enum ReplicatorsCommand {
    /// List every registered directive, grouped by replication id.
    List(ListArgs),

    /// Show a single directive.
    Show(ShowArgs),

    /// Delete one directive, or all of them with `--all`.
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Host alias or URL.
    pub host: String,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    pub host: String,
    pub id: String,

    /// Fetch a specific revision instead of the current one.
    #[arg(long)]
    pub rev: Option<String>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub host: String,

    /// Directive id (omit when using `--all`).
    pub id: Option<String>,

    /// Delete every registered directive.
    #[arg(long, conflicts_with = "id")]
    pub all: bool,
}

pub fn run(cmd: ReplicatorsCommand) -> Result<()> {
    match cmd {
        ReplicatorsCommand::List(args) => list(args),
        ReplicatorsCommand::Show(args) => show(args),
        ReplicatorsCommand::Delete(args) => delete(args),
    }
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

#[derive(Tabled)]
struct ReplicatorRow {
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "source → target")]
    route: String,
    #[tabled(rename = "state")]
    state: String,
    #[tabled(rename = "continuous")]
    continuous: bool,
    #[tabled(rename = "create target")]
    create_target: bool,
    #[tabled(rename = "since")]
    since: String,
}

#[derive(Serialize)]
struct ReplicatorJson {
    id: String,
    replication_id: Option<String>,
    source: String,
    target: String,
    state: Option<String>,
    state_time: Option<String>,
    continuous: bool,
    create_target: bool,
    owner: Option<String>,
}

fn list(args: ListArgs) -> Result<()> {
    let (_home, settings) = load_settings()?;
    let host = client(&settings, &args.host)?;
    let registry = Registry::load(&host, host.namespace())
        .with_context(|| format!("failed to list directives on {}", host.display_url()))?;

    if args.json {
        let payload: Vec<ReplicatorJson> = registry.iter().map(to_json).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).context("failed to serialize directives")?
        );
        return Ok(());
    }

    println!(
        "{} | {} directives",
        host.display_url().bold(),
        registry.len()
    );
    if registry.is_empty() {
        println!("No directives registered.");
        return Ok(());
    }
    for (replication_id, group) in registry.groups() {
        let heading = if replication_id.is_empty() {
            "(not yet picked up)"
        } else {
            replication_id
        };
        println!("{}", heading.bold());
        let rows: Vec<ReplicatorRow> = group.iter().map(to_row).collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }
    Ok(())
}

fn to_row(r: &RegisteredReplication) -> ReplicatorRow {
    ReplicatorRow {
        id: r.id().to_string(),
        route: format!(
            "{} → {}",
            redact_credentials(&r.directive.source),
            redact_credentials(&r.directive.target)
        ),
        state: state_label(r.replication_state.as_ref()),
        continuous: r.directive.continuous,
        create_target: r.directive.create_target,
        since: r
            .state_time_parsed()
            .map(format_age)
            .or_else(|| r.state_time.clone())
            .unwrap_or_else(|| "-".to_string()),
    }
}

fn to_json(r: &RegisteredReplication) -> ReplicatorJson {
    ReplicatorJson {
        id: r.id().0,
        replication_id: r.replication_id.clone(),
        source: redact_credentials(&r.directive.source),
        target: redact_credentials(&r.directive.target),
        state: r.replication_state.as_ref().map(ToString::to_string),
        state_time: r.state_time.clone(),
        continuous: r.directive.continuous,
        create_target: r.directive.create_target,
        owner: r.owner.clone(),
    }
}

fn state_label(state: Option<&ReplicationState>) -> String {
    match state {
        Some(ReplicationState::Triggered) => "triggered".green().to_string(),
        Some(ReplicationState::Completed) => "completed".cyan().to_string(),
        Some(ReplicationState::Error) => "error".red().to_string(),
        Some(ReplicationState::Other(s)) => s.yellow().to_string(),
        None => "-".bright_black().to_string(),
    }
}

/// `"42s ago"`, `"5m ago"`, `"3h ago"`, `"2d ago"`.
fn format_age(timestamp: DateTime<FixedOffset>) -> String {
    let secs = Utc::now()
        .signed_duration_since(timestamp)
        .num_seconds()
        .max(0);
    match secs {
        s if s < 60 => format!("{s}s ago"),
        s if s < 3_600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3_600),
        s => format!("{}d ago", s / 86_400),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(args: ShowArgs) -> Result<()> {
    let (_home, settings) = load_settings()?;
    let host = client(&settings, &args.host)?;
    let id = DirectiveId::from(args.id);
    let r = host
        .fetch_directive(&id, args.rev.as_deref())
        .with_context(|| format!("failed to fetch directive '{id}'"))?;

    println!("[{}]", r.id());
    println!(
        "  {} → {}",
        redact_credentials(&r.directive.source),
        redact_credentials(&r.directive.target)
    );
    println!("  Revision: {}", r.revision().unwrap_or("-"));
    println!("  Replication State: {}", state_label(r.replication_state.as_ref()));
    println!("  Continuous: {}", r.directive.continuous);
    println!("  Create Target: {}", r.directive.create_target);
    println!(
        "  Replication State Time: {}",
        r.state_time.as_deref().unwrap_or("-")
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// delete
// ---------------------------------------------------------------------------

fn delete(args: DeleteArgs) -> Result<()> {
    let (_home, settings) = load_settings()?;
    let host = client(&settings, &args.host)?;

    if args.all {
        return match delete_all(&host, host.namespace()) {
            Ok(snapshot) => {
                println!("✓ deleted {} directive(s)", snapshot.len());
                for id in snapshot.ids() {
                    println!("  -  {id}");
                }
                Ok(())
            }
            Err(err) => {
                for id in &err.deleted {
                    println!("  -  {id}");
                }
                let total = err.snapshot.len();
                Err(err).with_context(|| format!("deleted only part of {total} directive(s)"))
            }
        };
    }

    let Some(id) = args.id else {
        bail!("provide a directive id or use --all");
    };
    let id = DirectiveId::from(id);
    let removed =
        delete_one(&host, &id).with_context(|| format!("failed to delete directive '{id}'"))?;
    println!(
        "✓ deleted [{}] {} → {}",
        id,
        redact_credentials(&removed.directive.source),
        redact_credentials(&removed.directive.target)
    );
    Ok(())
}
