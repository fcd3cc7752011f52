//! In-memory host with document-store revision semantics.
//!
//! Stands in for a real host in tests: revisions advance on every write,
//! stale or missing revisions are rejected with `Conflict`, unknown ids
//! yield `NotFound`. Engine state transitions and transport failures are
//! injected explicitly.

use std::cell::RefCell;
use std::collections::BTreeMap;

use couchrep_core::{
    AllDocs, AllDocsRow, DatabaseName, DirectiveId, RegisteredReplication, ReplicationDirective,
    ReplicationState, Session, StoreError, UserCtx,
};

use crate::host::{DatabaseLister, DirectiveStore, SessionProvider};

#[derive(Debug, Default)]
struct State {
    databases: Vec<DatabaseName>,
    docs: BTreeMap<String, RegisteredReplication>,
    generations: BTreeMap<String, u64>,
    puts: Vec<ReplicationDirective>,
    deletes: Vec<DirectiveId>,
    fail_put_at: Option<usize>,
    fail_delete_at: Option<usize>,
    fail_listing: bool,
    fail_databases: bool,
    fail_session: bool,
}

/// Single-threaded fake host.
#[derive(Debug)]
pub struct MemoryHost {
    base_url: String,
    user_ctx: UserCtx,
    state: RefCell<State>,
}

impl MemoryHost {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user_ctx: UserCtx::default(),
            state: RefCell::new(State::default()),
        }
    }

    pub fn with_databases<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.borrow_mut().databases =
            names.into_iter().map(|n| DatabaseName(n.into())).collect();
        self
    }

    pub fn with_user_ctx(mut self, user_ctx: serde_json::Value) -> Self {
        self.user_ctx = UserCtx(user_ctx);
        self
    }

    /// Store a document directly, bypassing revision checks.
    pub fn insert(&self, id: &str, mut doc: RegisteredReplication) {
        let mut state = self.state.borrow_mut();
        let generation = state.generations.get(id).copied().unwrap_or(0) + 1;
        state.generations.insert(id.to_string(), generation);
        doc.directive.id = Some(DirectiveId::from(id));
        doc.directive.revision = Some(revision(generation, id));
        state.docs.insert(id.to_string(), doc);
    }

    /// Simulate the engine moving a directive to `replication_state`.
    pub fn set_state(&self, id: &DirectiveId, replication_state: ReplicationState) {
        if let Some(doc) = self.state.borrow_mut().docs.get_mut(&id.0) {
            doc.replication_state = Some(replication_state);
        }
    }

    /// Fail the put that follows `n - 1` successful puts, once, with a transport error.
    pub fn fail_put_at(&self, n: usize) {
        self.state.borrow_mut().fail_put_at = Some(n);
    }

    /// Fail the delete that follows `n - 1` successful deletes, once.
    pub fn fail_delete_at(&self, n: usize) {
        self.state.borrow_mut().fail_delete_at = Some(n);
    }

    pub fn fail_listing(&self) {
        self.state.borrow_mut().fail_listing = true;
    }

    pub fn fail_databases(&self) {
        self.state.borrow_mut().fail_databases = true;
    }

    pub fn fail_session(&self) {
        self.state.borrow_mut().fail_session = true;
    }

    /// Every successfully stored directive body, in call order.
    pub fn submitted(&self) -> Vec<ReplicationDirective> {
        self.state.borrow().puts.clone()
    }

    /// Every successfully deleted id, in call order.
    pub fn deleted(&self) -> Vec<DirectiveId> {
        self.state.borrow().deletes.clone()
    }

    pub fn get(&self, id: &DirectiveId) -> Option<RegisteredReplication> {
        self.state.borrow().docs.get(&id.0).cloned()
    }

    pub fn directive_count(&self) -> usize {
        self.state.borrow().docs.len()
    }
}

fn revision(generation: u64, id: &str) -> String {
    let short: String = id.chars().take(8).collect();
    format!("{generation}-{short}")
}

fn transport(method: &'static str, url: String) -> StoreError {
    StoreError::Transport {
        method,
        url,
        message: "connection reset by peer".to_string(),
    }
}

impl DirectiveStore for MemoryHost {
    fn list_directives(&self) -> Result<AllDocs, StoreError> {
        let state = self.state.borrow();
        if state.fail_listing {
            return Err(transport("GET", format!("{}/_replicator/_all_docs", self.base_url)));
        }
        let rows: Vec<AllDocsRow> = state
            .docs
            .iter()
            .map(|(id, doc)| AllDocsRow {
                id: id.clone(),
                doc: Some(doc.clone()),
            })
            .collect();
        Ok(AllDocs {
            total_rows: rows.len() as u64,
            offset: 0,
            rows,
        })
    }

    fn fetch_directive(
        &self,
        id: &DirectiveId,
        revision: Option<&str>,
    ) -> Result<RegisteredReplication, StoreError> {
        let state = self.state.borrow();
        let doc = state.docs.get(&id.0).filter(|doc| match revision {
            Some(rev) => doc.revision() == Some(rev),
            None => true,
        });
        doc.cloned().ok_or_else(|| StoreError::NotFound {
            resource: format!("_replicator/{id}"),
        })
    }

    fn put_directive(&self, directive: &ReplicationDirective) -> Result<(), StoreError> {
        let mut state = self.state.borrow_mut();
        let id = directive.resolved_id();
        let call = state.puts.len() + 1;
        if state.fail_put_at == Some(call) {
            state.fail_put_at = None;
            return Err(transport("PUT", format!("{}/_replicator/{id}", self.base_url)));
        }

        let current = state.docs.get(&id.0).and_then(|d| d.directive.revision.clone());
        if current != directive.revision {
            return Err(StoreError::Conflict {
                resource: format!("_replicator/{id}"),
            });
        }

        let generation = state.generations.get(&id.0).copied().unwrap_or(0) + 1;
        state.generations.insert(id.0.clone(), generation);

        let mut stored = directive.clone();
        stored.id = Some(id.clone());
        stored.revision = Some(revision(generation, &id.0));
        let replication_id = Some(format!("rep-{}", &id.0));
        state.docs.insert(
            id.0.clone(),
            RegisteredReplication {
                owner: None,
                replication_id,
                replication_state: None,
                state_time: None,
                directive: stored,
            },
        );
        state.puts.push(directive.clone());
        Ok(())
    }

    fn delete_directive(&self, id: &DirectiveId, revision: &str) -> Result<(), StoreError> {
        let mut state = self.state.borrow_mut();
        let call = state.deletes.len() + 1;
        if state.fail_delete_at == Some(call) {
            state.fail_delete_at = None;
            return Err(transport("DELETE", format!("{}/_replicator/{id}", self.base_url)));
        }
        let resource = format!("_replicator/{id}");
        let Some(doc) = state.docs.get(&id.0) else {
            return Err(StoreError::NotFound { resource });
        };
        if doc.revision() != Some(revision) {
            return Err(StoreError::Conflict { resource });
        }
        state.docs.remove(&id.0);
        state.deletes.push(id.clone());
        Ok(())
    }
}

impl DatabaseLister for MemoryHost {
    fn list_databases(&self) -> Result<Vec<DatabaseName>, StoreError> {
        let state = self.state.borrow();
        if state.fail_databases {
            return Err(transport("GET", format!("{}/_all_dbs", self.base_url)));
        }
        Ok(state.databases.clone())
    }

    fn locator(&self, database: &DatabaseName) -> String {
        format!("{}/{}", self.base_url, database)
    }
}

impl SessionProvider for MemoryHost {
    fn session(&self) -> Result<Session, StoreError> {
        if self.state.borrow().fail_session {
            return Err(transport("GET", format!("{}/_session", self.base_url)));
        }
        Ok(Session {
            user_ctx: self.user_ctx.clone(),
        })
    }
}
