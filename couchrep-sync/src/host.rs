//! Host seam: the three collaborators a document-store host provides.
//!
//! All calls are blocking and are neither retried nor timed out here.

use couchrep_core::{
    AllDocs, DatabaseName, DirectiveId, RegisteredReplication, ReplicationDirective, Session,
    StoreError,
};

/// The control collection holding directive documents.
pub trait DirectiveStore {
    /// Every document in the control collection, bodies included.
    fn list_directives(&self) -> Result<AllDocs, StoreError>;

    /// One directive, optionally at a specific revision.
    fn fetch_directive(
        &self,
        id: &DirectiveId,
        revision: Option<&str>,
    ) -> Result<RegisteredReplication, StoreError>;

    /// Create (no revision) or update (current revision) a directive.
    ///
    /// The directive must carry its id.
    fn put_directive(&self, directive: &ReplicationDirective) -> Result<(), StoreError>;

    fn delete_directive(&self, id: &DirectiveId, revision: &str) -> Result<(), StoreError>;
}

/// Databases hosted on a host, and how other hosts address them.
pub trait DatabaseLister {
    /// Database names in the host's listing order.
    fn list_databases(&self) -> Result<Vec<DatabaseName>, StoreError>;

    /// Locator other hosts use to reach `database` (URL, credentials included).
    fn locator(&self, database: &DatabaseName) -> String;
}

/// Identity of the session the host is accessed with.
pub trait SessionProvider {
    fn session(&self) -> Result<Session, StoreError>;
}
