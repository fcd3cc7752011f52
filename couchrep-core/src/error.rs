//! Error types for couchrep-core.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by a host while listing, fetching, submitting or deleting.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request never produced an HTTP response (DNS, refused, reset, TLS).
    #[error("transport failure for {method} {url}: {message}")]
    Transport {
        method: &'static str,
        url: String,
        message: String,
    },

    /// The host answered with a non-success status.
    #[error("{method} {url} returned HTTP {status}: {body}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    /// The addressed document or database does not exist.
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// The submitted revision does not match the one held by the store.
    #[error("revision conflict on {resource}")]
    Conflict { resource: String },

    /// A response body could not be decoded.
    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// A request body could not be encoded.
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

/// All errors that can arise while loading or saving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with the offending file.
    #[error("failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// A host argument is neither a configured alias nor an http(s) URL.
    #[error("unknown host '{name}'; add it with `couchrep host add` or pass an http(s) URL")]
    UnknownHost { name: String },

    /// A host URL that does not use the http or https scheme.
    #[error("invalid host URL '{url}': expected http:// or https://")]
    InvalidUrl { url: String },
}
