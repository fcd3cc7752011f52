//! `couchrep replicate` — upsert one directive per database.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use couchrep_core::ReplicationConfig;
use couchrep_sync::{replicate_host, DatabaseOutcome, Disposition, ReconcileReport};

use super::{client, load_settings};

/// Arguments for `couchrep replicate`.
#[derive(Args, Debug)]
pub struct ReplicateArgs {
    /// Local host (alias or URL). Directives are always written here.
    pub local: String,

    /// Remote host (alias or URL).
    pub remote: String,

    /// Replicate local databases to the remote. Without it, remote databases
    /// are pulled into the local host.
    #[arg(long)]
    pub push: bool,

    /// Keep replicating new changes after the initial pass.
    #[arg(long)]
    pub continuous: bool,

    /// Let the engine create missing target databases.
    #[arg(long)]
    pub create_target: bool,

    /// Show what would be submitted without writing any directive.
    #[arg(long)]
    pub dry_run: bool,
}

impl ReplicateArgs {
    pub fn run(self) -> Result<()> {
        let (_home, settings) = load_settings()?;
        let local = client(&settings, &self.local)?;
        let remote = client(&settings, &self.remote)?;
        let config = ReplicationConfig {
            push: self.push,
            continuous: self.continuous,
            create_target: self.create_target,
            cancel: false,
        };

        match replicate_host(&local, &remote, &config, &settings.namespace, self.dry_run) {
            Ok(report) => {
                print_report(&report, self.dry_run);
                Ok(())
            }
            Err(err) => {
                print_report(&err.report, self.dry_run);
                Err(err).with_context(|| {
                    format!(
                        "replication between {} and {} stopped",
                        local.display_url(),
                        remote.display_url(),
                    )
                })
            }
        }
    }
}

fn print_report(report: &ReconcileReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    if report.outcomes.is_empty() {
        println!("{prefix}✓ nothing to do");
        return;
    }

    println!(
        "{prefix}✓ {} created, {} updated, {} skipped",
        report.count(Disposition::Created) + report.count(Disposition::WouldCreate),
        report.count(Disposition::Updated) + report.count(Disposition::WouldUpdate),
        report.count(Disposition::SkippedTriggered),
    );
    for outcome in &report.outcomes {
        println!("  {}", outcome_line(outcome));
    }
}

fn outcome_line(outcome: &DatabaseOutcome) -> String {
    let marker = match outcome.disposition {
        Disposition::Created => "+".green().bold(),
        Disposition::Updated => "✎".cyan().bold(),
        Disposition::SkippedTriggered => "·".bright_black().bold(),
        Disposition::WouldCreate | Disposition::WouldUpdate => "~".yellow().bold(),
    };
    let label = match outcome.disposition {
        Disposition::Created => "created",
        Disposition::Updated => "updated",
        Disposition::SkippedTriggered => "skipped (triggered)",
        Disposition::WouldCreate => "would create",
        Disposition::WouldUpdate => "would update",
    };
    format!(
        "{marker}  {} {} [{}]",
        outcome.database,
        label,
        outcome.directive_id.to_string().bright_black()
    )
}
