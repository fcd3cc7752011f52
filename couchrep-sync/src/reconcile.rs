//! Reconciliation of desired directives against a host's registry.
//!
//! ## `replicate_host` — per pass
//!
//! 1. Pick the master host: local for push, remote for pull.
//! 2. List its databases, dropping reserved names.
//! 3. Load the registry from the local host (directives always live there).
//! 4. Read the local session's user context.
//! 5. Per database, in listing order: compute the directive, look its id up,
//!    skip if triggered, otherwise create or update it.
//!
//! Submission stops at the first failure; the outcomes recorded so far are
//! returned inside the error.

use couchrep_core::{
    DatabaseName, DirectiveId, Namespace, ReplicationConfig, ReplicationDirective, StoreError,
    UserCtx,
};

use crate::error::ReconcileError;
use crate::host::{DatabaseLister, DirectiveStore, SessionProvider};
use crate::registry::Registry;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What reconciliation did for one database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// No directive shared the id; one was created.
    Created,
    /// A non-triggered directive shared the id; it was rewritten at its revision.
    Updated,
    /// The existing directive is triggered and owned by the engine; nothing sent.
    SkippedTriggered,
    /// `dry_run`: a directive *would* have been created.
    WouldCreate,
    /// `dry_run`: a directive *would* have been updated.
    WouldUpdate,
}

impl Disposition {
    /// `true` when a body was sent to the store.
    pub fn is_submitted(self) -> bool {
        matches!(self, Disposition::Created | Disposition::Updated)
    }
}

/// Outcome of reconciling a single database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseOutcome {
    pub database: DatabaseName,
    pub directive_id: DirectiveId,
    pub disposition: Disposition,
}

/// Outcomes of a reconciliation pass, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub outcomes: Vec<DatabaseOutcome>,
}

impl ReconcileReport {
    /// Databases whose directive was submitted; skipped ones are excluded.
    pub fn processed(&self) -> Vec<DatabaseName> {
        self.outcomes
            .iter()
            .filter(|o| o.disposition.is_submitted())
            .map(|o| o.database.clone())
            .collect()
    }

    pub fn count(&self, disposition: Disposition) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.disposition == disposition)
            .count()
    }
}

// ---------------------------------------------------------------------------
// Directive construction and submission
// ---------------------------------------------------------------------------

/// Directive for `database`, with source/target oriented by `config.push`
/// and its id generated.
pub fn desired_directive<R: DatabaseLister + ?Sized>(
    database: &DatabaseName,
    remote: &R,
    config: &ReplicationConfig,
    user_ctx: UserCtx,
) -> ReplicationDirective {
    let remote_locator = remote.locator(database);
    let mut directive = if config.push {
        config.directive(database.0.clone(), remote_locator, user_ctx)
    } else {
        config.directive(remote_locator, database.0.clone(), user_ctx)
    };
    directive.generate_id();
    directive
}

/// Upsert a single directive, generating its id first if it has none.
///
/// Returns the id it was stored under.
pub fn submit<S: DirectiveStore + ?Sized>(
    store: &S,
    directive: &ReplicationDirective,
) -> Result<DirectiveId, StoreError> {
    if directive.has_id() {
        store.put_directive(directive)?;
        return Ok(directive.resolved_id());
    }
    let mut directive = directive.clone();
    directive.generate_id();
    store.put_directive(&directive)?;
    Ok(directive.resolved_id())
}

// ---------------------------------------------------------------------------
// replicate_host
// ---------------------------------------------------------------------------

/// Upsert one directive per database of the master host into the local
/// host's control collection.
///
/// The local session's user context is attached in both directions.
pub fn replicate_host<L, R>(
    local: &L,
    remote: &R,
    config: &ReplicationConfig,
    namespace: &Namespace,
    dry_run: bool,
) -> Result<ReconcileReport, ReconcileError>
where
    L: DirectiveStore + DatabaseLister + SessionProvider + ?Sized,
    R: DatabaseLister + ?Sized,
{
    let mut report = ReconcileReport::default();

    let databases = if config.push {
        local.list_databases()
    } else {
        remote.list_databases()
    };
    let databases = match databases {
        Ok(dbs) => dbs,
        Err(source) => return Err(ReconcileError { report, source }),
    };
    let registry = match Registry::load(local, namespace) {
        Ok(r) => r,
        Err(source) => return Err(ReconcileError { report, source }),
    };
    let session = match local.session() {
        Ok(s) => s,
        Err(source) => return Err(ReconcileError { report, source }),
    };

    for database in databases {
        if namespace.is_reserved(&database.0) {
            tracing::debug!(database = %database, "reserved database ignored");
            continue;
        }

        let mut directive = desired_directive(&database, remote, config, session.user_ctx.clone());
        let id = directive.resolved_id();

        let disposition = match registry.find_by_id(&id) {
            Some(existing) if existing.is_triggered() => {
                tracing::info!(database = %database, id = %id, "skipped: directive is triggered");
                report.outcomes.push(DatabaseOutcome {
                    database,
                    directive_id: id,
                    disposition: Disposition::SkippedTriggered,
                });
                continue;
            }
            Some(existing) => {
                directive.revision = existing.directive.revision.clone();
                if dry_run {
                    Disposition::WouldUpdate
                } else {
                    Disposition::Updated
                }
            }
            None => {
                directive.revision = None;
                if dry_run {
                    Disposition::WouldCreate
                } else {
                    Disposition::Created
                }
            }
        };

        if dry_run {
            tracing::info!(
                database = %database,
                id = %id,
                ?disposition,
                "[dry-run] directive not submitted"
            );
        } else if let Err(source) = submit(local, &directive) {
            tracing::warn!(
                database = %database,
                id = %id,
                error = %source,
                "directive submission failed"
            );
            return Err(ReconcileError { report, source });
        } else {
            tracing::info!(database = %database, id = %id, ?disposition, "directive submitted");
        }

        report.outcomes.push(DatabaseOutcome {
            database,
            directive_id: id,
            disposition,
        });
    }

    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryHost;
    use couchrep_core::{directive_id, ReplicationState};
    use rstest::rstest;
    use serde_json::json;

    fn push() -> ReplicationConfig {
        ReplicationConfig {
            push: true,
            continuous: true,
            ..ReplicationConfig::default()
        }
    }

    fn pull() -> ReplicationConfig {
        ReplicationConfig {
            push: false,
            create_target: true,
            ..ReplicationConfig::default()
        }
    }

    fn names(dbs: &[DatabaseName]) -> Vec<&str> {
        dbs.iter().map(|d| d.0.as_str()).collect()
    }

    #[test]
    fn push_directive_points_local_to_remote() {
        let remote = MemoryHost::new("https://remote.example");
        let d = desired_directive(
            &DatabaseName::from("inventory"),
            &remote,
            &push(),
            UserCtx::default(),
        );
        assert_eq!(d.source, "inventory");
        assert_eq!(d.target, "https://remote.example/inventory");
        assert!(d.push);
        assert!(d.continuous);
        assert_eq!(
            d.id,
            Some(directive_id("inventory", "https://remote.example/inventory"))
        );
    }

    #[test]
    fn pull_directive_points_remote_to_local() {
        let remote = MemoryHost::new("https://remote.example");
        let d = desired_directive(
            &DatabaseName::from("inventory"),
            &remote,
            &pull(),
            UserCtx::default(),
        );
        assert_eq!(d.source, "https://remote.example/inventory");
        assert_eq!(d.target, "inventory");
        assert!(d.create_target);
        assert_ne!(
            d.id,
            Some(directive_id("inventory", "https://remote.example/inventory"))
        );
    }

    #[test]
    fn push_lists_local_and_creates_directives() {
        let local = MemoryHost::new("http://local")
            .with_databases(["_users", "inventory", "orders"])
            .with_user_ctx(json!({"name": "admin", "roles": ["_admin"]}));
        let remote = MemoryHost::new("http://remote").with_databases(["ignored"]);

        let report =
            replicate_host(&local, &remote, &push(), &Namespace::default(), false).unwrap();

        assert_eq!(names(&report.processed()), vec!["inventory", "orders"]);
        assert_eq!(report.count(Disposition::Created), 2);
        let submitted = local.submitted();
        assert_eq!(submitted.len(), 2);
        assert_eq!(submitted[0].target, "http://remote/inventory");
        assert_eq!(submitted[0].revision, None);
        assert_eq!(
            submitted[0].user_ctx.0,
            json!({"name": "admin", "roles": ["_admin"]})
        );
        assert_eq!(remote.directive_count(), 0, "directives live on the local host");
    }

    #[test]
    fn pull_lists_remote_and_uses_local_identity() {
        let local = MemoryHost::new("http://local")
            .with_databases(["local-only"])
            .with_user_ctx(json!({"name": "local-admin"}));
        let remote = MemoryHost::new("http://remote")
            .with_databases(["inventory"])
            .with_user_ctx(json!({"name": "remote-admin"}));

        let report =
            replicate_host(&local, &remote, &pull(), &Namespace::default(), false).unwrap();

        assert_eq!(names(&report.processed()), vec!["inventory"]);
        let submitted = local.submitted();
        assert_eq!(submitted[0].source, "http://remote/inventory");
        assert_eq!(submitted[0].target, "inventory");
        assert_eq!(submitted[0].user_ctx.0, json!({"name": "local-admin"}));
    }

    #[test]
    fn second_pass_updates_with_current_revision() {
        let local = MemoryHost::new("http://local").with_databases(["inventory"]);
        let remote = MemoryHost::new("http://remote");
        let ns = Namespace::default();

        replicate_host(&local, &remote, &push(), &ns, false).unwrap();
        let id = directive_id("inventory", "http://remote/inventory");
        let first_rev = local.get(&id).unwrap().directive.revision;

        let report = replicate_host(&local, &remote, &push(), &ns, false).unwrap();
        assert_eq!(report.outcomes[0].disposition, Disposition::Updated);
        assert_eq!(local.submitted()[1].revision, first_rev);
        assert_eq!(local.directive_count(), 1);
        assert_ne!(local.get(&id).unwrap().directive.revision, first_rev);
    }

    #[test]
    fn triggered_directive_is_skipped() {
        let local = MemoryHost::new("http://local").with_databases(["inventory", "orders"]);
        let remote = MemoryHost::new("http://remote");
        let ns = Namespace::default();
        replicate_host(&local, &remote, &push(), &ns, false).unwrap();

        let id = directive_id("inventory", "http://remote/inventory");
        local.set_state(&id, ReplicationState::Triggered);
        let rev_before = local.get(&id).unwrap().directive.revision;

        let report = replicate_host(&local, &remote, &push(), &ns, false).unwrap();
        assert_eq!(report.outcomes[0].disposition, Disposition::SkippedTriggered);
        assert_eq!(report.outcomes[1].disposition, Disposition::Updated);
        assert_eq!(names(&report.processed()), vec!["orders"]);
        assert_eq!(local.get(&id).unwrap().directive.revision, rev_before);
        assert_eq!(local.submitted().len(), 3);
    }

    #[test]
    fn completed_or_errored_directive_is_updated() {
        let local = MemoryHost::new("http://local").with_databases(["a", "b"]);
        let remote = MemoryHost::new("http://remote");
        let ns = Namespace::default();
        replicate_host(&local, &remote, &push(), &ns, false).unwrap();
        local.set_state(&directive_id("a", "http://remote/a"), ReplicationState::Completed);
        local.set_state(&directive_id("b", "http://remote/b"), ReplicationState::Error);

        let report = replicate_host(&local, &remote, &push(), &ns, false).unwrap();
        assert_eq!(report.count(Disposition::Updated), 2);
    }

    #[test]
    fn failure_stops_and_returns_partial_report() {
        let local = MemoryHost::new("http://local").with_databases(["a", "b", "c", "d"]);
        let remote = MemoryHost::new("http://remote");
        local.fail_put_at(3);

        let err = replicate_host(&local, &remote, &push(), &Namespace::default(), false)
            .unwrap_err();
        assert_eq!(names(&err.report.processed()), vec!["a", "b"]);
        assert!(matches!(err.source, StoreError::Transport { .. }));
        let targets: Vec<String> = local.submitted().into_iter().map(|d| d.source).collect();
        assert_eq!(targets, vec!["a", "b"], "nothing submitted after the failure");
    }

    #[test]
    fn listing_failure_returns_empty_report() {
        let local = MemoryHost::new("http://local").with_databases(["a"]);
        local.fail_listing();
        let remote = MemoryHost::new("http://remote");

        let err = replicate_host(&local, &remote, &push(), &Namespace::default(), false)
            .unwrap_err();
        assert!(err.report.outcomes.is_empty());
        assert!(local.submitted().is_empty());
    }

    #[rstest]
    #[case::push_local_databases(true, "local", "_all_dbs")]
    #[case::pull_remote_databases(false, "remote", "_all_dbs")]
    #[case::local_session(true, "local", "_session")]
    fn setup_failure_returns_empty_report(
        #[case] push_direction: bool,
        #[case] failing: &str,
        #[case] step: &str,
    ) {
        let local = MemoryHost::new("http://local").with_databases(["a"]);
        let remote = MemoryHost::new("http://remote").with_databases(["b"]);
        let host = if failing == "local" { &local } else { &remote };
        if step == "_session" {
            host.fail_session();
        } else {
            host.fail_databases();
        }
        let config = if push_direction { push() } else { pull() };

        let err = replicate_host(&local, &remote, &config, &Namespace::default(), false)
            .unwrap_err();
        assert!(err.report.outcomes.is_empty());
        match &err.source {
            StoreError::Transport { url, .. } => {
                assert_eq!(url, &format!("http://{failing}/{step}"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(local.submitted().is_empty());
        assert_eq!(local.directive_count(), 0);
    }

    #[test]
    fn existing_directive_from_earlier_tooling_is_updated() {
        let local = MemoryHost::new("https://local").with_databases(["inventory"]);
        let remote = MemoryHost::new("https://remote.example");
        local.insert(
            "f61466455f37ea1fa5ec6f95981b5c11",
            ReplicationDirective::new("inventory", "https://remote.example/inventory").into(),
        );

        let report =
            replicate_host(&local, &remote, &push(), &Namespace::default(), false).unwrap();
        assert_eq!(report.outcomes[0].disposition, Disposition::Updated);
        assert_eq!(local.directive_count(), 1);
    }

    #[test]
    fn dry_run_submits_nothing() {
        let local = MemoryHost::new("http://local").with_databases(["a", "b"]);
        let remote = MemoryHost::new("http://remote");
        let ns = Namespace::default();

        let fresh = replicate_host(&local, &remote, &push(), &ns, true).unwrap();
        assert_eq!(fresh.count(Disposition::WouldCreate), 2);
        assert_eq!(local.directive_count(), 0);

        replicate_host(&local, &remote, &push(), &ns, false).unwrap();
        let report = replicate_host(&local, &remote, &push(), &ns, true).unwrap();
        assert_eq!(report.count(Disposition::WouldUpdate), 2);
        assert!(report.processed().is_empty());
        assert_eq!(local.submitted().len(), 2, "dry-run must not write");
    }

    #[test]
    fn submit_generates_missing_id() {
        let store = MemoryHost::new("http://local");
        let id = submit(&store, &ReplicationDirective::new("a", "http://b/a")).unwrap();
        assert_eq!(id, directive_id("a", "http://b/a"));
        assert!(store.get(&id).is_some());
    }
}
