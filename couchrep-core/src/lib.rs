//! couchrep core library — directive model, identifiers, settings, errors.
//!
//! Public API surface:
//! - [`types`] — newtypes, directive and registered-replication records
//! - [`identifier`] — deterministic directive ids
//! - [`config`] — settings file and [`Namespace`]
//! - [`error`] — [`StoreError`] and [`ConfigError`]

pub mod config;
pub mod error;
pub mod identifier;
pub mod types;

pub use config::{Namespace, Settings};
pub use error::{ConfigError, StoreError};
pub use identifier::directive_id;
pub use types::{
    AllDocs, AllDocsRow, DatabaseName, DirectiveId, RegisteredReplication, ReplicationConfig,
    ReplicationDirective, ReplicationState, Session, UserCtx,
};
