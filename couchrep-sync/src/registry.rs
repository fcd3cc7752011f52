//! In-memory index of the directives registered on a host.
//!
//! Rebuilt from a full listing on every pass; never cached between passes
//! because the engine and other writers mutate the control collection.

use std::collections::BTreeMap;

use couchrep_core::{AllDocs, DirectiveId, Namespace, RegisteredReplication, StoreError};

use crate::host::DirectiveStore;

/// Registered directives grouped by engine replication id.
///
/// Directives the engine has not yet picked up group under the empty key.
/// Groups iterate in key order; entries keep listing order within a group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    groups: BTreeMap<String, Vec<RegisteredReplication>>,
}

impl Registry {
    /// Fetch the control collection listing from `store` and index it.
    pub fn load<S: DirectiveStore + ?Sized>(
        store: &S,
        namespace: &Namespace,
    ) -> Result<Self, StoreError> {
        let listing = store.list_directives()?;
        let registry = Self::from_listing(listing, namespace);
        tracing::debug!(
            directives = registry.len(),
            groups = registry.groups.len(),
            "registry loaded"
        );
        Ok(registry)
    }

    /// Index a listing, dropping rows whose id starts with the reserved prefix.
    pub fn from_listing(listing: AllDocs, namespace: &Namespace) -> Self {
        let mut registry = Self::default();
        for row in listing.rows {
            if namespace.is_reserved(&row.id) {
                continue;
            }
            let Some(mut doc) = row.doc else {
                continue;
            };
            if doc.directive.id.is_none() {
                doc.directive.id = Some(DirectiveId(row.id));
            }
            registry.add(doc);
        }
        registry
    }

    fn add(&mut self, replication: RegisteredReplication) {
        let key = replication.replication_id.clone().unwrap_or_default();
        self.groups.entry(key).or_default().push(replication);
    }

    /// Linear scan across all groups.
    pub fn find_by_id(&self, id: &DirectiveId) -> Option<&RegisteredReplication> {
        self.iter().find(|r| r.directive.id.as_ref() == Some(id))
    }

    /// Every registered directive, group by group.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredReplication> {
        self.groups.values().flatten()
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &[RegisteredReplication])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn ids(&self) -> Vec<DirectiveId> {
        self.iter().map(RegisteredReplication::id).collect()
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
