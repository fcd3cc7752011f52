//! Domain types for replication directives.
//!
//! Wire names follow the document store's `_replicator` schema; every body
//! field deserializes with a default so that listings containing foreign
//! documents (design docs, partially written records) still parse. Endpoints
//! written as objects (`{"url": ..., "headers": ...}`) are read by their `url`.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::config::Namespace;
use crate::identifier::directive_id;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Document id of a directive in the control collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectiveId(pub String);

impl fmt::Display for DirectiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for DirectiveId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DirectiveId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Name of a database on a host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatabaseName(pub String);

impl fmt::Display for DatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for DatabaseName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DatabaseName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Acting identity of a session, embedded verbatim into submitted directives.
///
/// Opaque to this crate; the engine uses it for authorization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserCtx(pub serde_json::Value);

impl Default for UserCtx {
    fn default() -> Self {
        Self(serde_json::Value::Object(serde_json::Map::new()))
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Engine-owned state of a registered directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReplicationState {
    Triggered,
    Completed,
    Error,
    /// Any state this crate does not gate on (e.g. newer engine states).
    Other(String),
}

impl From<String> for ReplicationState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "triggered" => Self::Triggered,
            "completed" => Self::Completed,
            "error" => Self::Error,
            _ => Self::Other(s),
        }
    }
}

impl From<ReplicationState> for String {
    fn from(s: ReplicationState) -> Self {
        s.to_string()
    }
}

impl fmt::Display for ReplicationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplicationState::Triggered => write!(f, "triggered"),
            ReplicationState::Completed => write!(f, "completed"),
            ReplicationState::Error => write!(f, "error"),
            ReplicationState::Other(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// Directives
// ---------------------------------------------------------------------------

/// Desired configuration of one replication, as submitted to the control
/// collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationDirective {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DirectiveId>,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default, deserialize_with = "endpoint")]
    pub source: String,
    #[serde(default, deserialize_with = "endpoint")]
    pub target: String,
    #[serde(default)]
    pub cancel: bool,
    #[serde(default)]
    pub create_target: bool,
    #[serde(default)]
    pub continuous: bool,
    #[serde(default)]
    pub user_ctx: UserCtx,
    /// Source and target were swapped for a push; never serialized.
    #[serde(skip)]
    pub push: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Endpoint {
    Url(String),
    Object {
        #[serde(default)]
        url: String,
    },
}

fn endpoint<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Endpoint::deserialize(deserializer)? {
        Endpoint::Url(url) | Endpoint::Object { url } => url,
    })
}

impl ReplicationDirective {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: None,
            revision: None,
            source: source.into(),
            target: target.into(),
            cancel: false,
            create_target: false,
            continuous: false,
            user_ctx: UserCtx::default(),
            push: false,
        }
    }

    pub fn has_id(&self) -> bool {
        self.id.is_some()
    }

    /// Assign the deterministic id derived from the current source/target.
    pub fn generate_id(&mut self) {
        self.id = Some(directive_id(&self.source, &self.target));
    }

    /// The assigned id, or the one `generate_id` would assign.
    pub fn resolved_id(&self) -> DirectiveId {
        self.id
            .clone()
            .unwrap_or_else(|| directive_id(&self.source, &self.target))
    }

    /// Address of this directive in the control collection.
    pub fn path(&self, namespace: &Namespace) -> String {
        namespace.directive_path(&self.resolved_id(), self.revision.as_deref())
    }
}

/// A directive as listed by the store, including engine-assigned fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredReplication {
    #[serde(flatten)]
    pub directive: ReplicationDirective,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(rename = "_replication_id", default, skip_serializing_if = "Option::is_none")]
    pub replication_id: Option<String>,
    #[serde(
        rename = "_replication_state",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub replication_state: Option<ReplicationState>,
    #[serde(
        rename = "_replication_state_time",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub state_time: Option<String>,
}

impl RegisteredReplication {
    pub fn id(&self) -> DirectiveId {
        self.directive.resolved_id()
    }

    pub fn revision(&self) -> Option<&str> {
        self.directive.revision.as_deref()
    }

    /// `true` while the engine owns the record and it must not be rewritten.
    pub fn is_triggered(&self) -> bool {
        matches!(self.replication_state, Some(ReplicationState::Triggered))
    }

    /// `_replication_state_time` parsed as RFC 3339, when it is one.
    pub fn state_time_parsed(&self) -> Option<DateTime<FixedOffset>> {
        self.state_time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
    }
}

impl From<ReplicationDirective> for RegisteredReplication {
    fn from(directive: ReplicationDirective) -> Self {
        Self {
            directive,
            owner: None,
            replication_id: None,
            replication_state: None,
            state_time: None,
        }
    }
}

/// Template for the directives computed during reconciliation.
///
/// `push` selects the direction; source and target are filled per database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplicationConfig {
    pub push: bool,
    pub continuous: bool,
    pub create_target: bool,
    pub cancel: bool,
}

impl ReplicationConfig {
    /// Build a directive for `source` → `target` carrying this template's flags.
    pub fn directive(
        &self,
        source: impl Into<String>,
        target: impl Into<String>,
        user_ctx: UserCtx,
    ) -> ReplicationDirective {
        ReplicationDirective {
            cancel: self.cancel,
            create_target: self.create_target,
            continuous: self.continuous,
            user_ctx,
            push: self.push,
            ..ReplicationDirective::new(source, target)
        }
    }
}

// ---------------------------------------------------------------------------
// Wire envelopes
// ---------------------------------------------------------------------------

/// `_all_docs?include_docs=true` response over the control collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AllDocs {
    #[serde(default)]
    pub total_rows: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub rows: Vec<AllDocsRow>,
}

/// One row of [`AllDocs`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    #[serde(default)]
    pub doc: Option<RegisteredReplication>,
}

/// `_session` response; only the acting user context is retained.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "userCtx", default)]
    pub user_ctx: UserCtx,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
