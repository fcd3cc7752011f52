//! Removal of registered directives.
//!
//! Deletes are addressed by id and *live* revision, so every delete first
//! re-fetches the record.

use couchrep_core::{DirectiveId, Namespace, RegisteredReplication, StoreError};

use crate::error::DeleteAllError;
use crate::host::DirectiveStore;
use crate::registry::Registry;

/// Delete one directive at its current revision.
///
/// Returns the record as it was just before deletion.
pub fn delete_one<S: DirectiveStore + ?Sized>(
    store: &S,
    id: &DirectiveId,
) -> Result<RegisteredReplication, StoreError> {
    let current = store.fetch_directive(id, None)?;
    let Some(revision) = current.revision() else {
        return Err(StoreError::NotFound {
            resource: format!("revision of directive {id}"),
        });
    };
    store.delete_directive(id, revision)?;
    tracing::info!(id = %id, revision, "directive deleted");
    Ok(current)
}

/// Delete every registered directive, group by group.
///
/// Returns the registry snapshot taken before deleting.
pub fn delete_all<S: DirectiveStore + ?Sized>(
    store: &S,
    namespace: &Namespace,
) -> Result<Registry, DeleteAllError> {
    let snapshot = match Registry::load(store, namespace) {
        Ok(r) => r,
        Err(source) => {
            return Err(DeleteAllError {
                snapshot: Registry::default(),
                deleted: Vec::new(),
                source,
            })
        }
    };

    let mut deleted = Vec::new();
    for id in snapshot.ids() {
        if let Err(source) = delete_one(store, &id) {
            tracing::warn!(id = %id, error = %source, "directive deletion failed");
            return Err(DeleteAllError {
                snapshot,
                deleted,
                source,
            });
        }
        deleted.push(id);
    }
    Ok(snapshot)
}
