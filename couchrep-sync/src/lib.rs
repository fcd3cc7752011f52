//! # couchrep-sync
//!
//! Registry, reconciliation and deletion of replication directives.
//!
//! Call [`replicate_host`] to upsert one directive per database between two
//! hosts, or [`delete_all`] / [`delete_one`] to remove registered directives.
//! Hosts are reached through the traits in [`host`]; [`http::CouchClient`]
//! implements them over HTTP.

pub mod delete;
pub mod error;
pub mod host;
pub mod http;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod reconcile;
pub mod registry;

pub use delete::{delete_all, delete_one};
pub use error::{DeleteAllError, ReconcileError};
pub use host::{DatabaseLister, DirectiveStore, SessionProvider};
pub use http::{redact_credentials, CouchClient};
pub use reconcile::{
    desired_directive, replicate_host, submit, DatabaseOutcome, Disposition, ReconcileReport,
};
pub use registry::Registry;
