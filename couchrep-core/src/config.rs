//! Settings file and control-collection namespace.
//!
//! # Storage layout
//!
//! ```text
//! ~/.couchrep/
//!   config.yaml   (mode 0600 — host URLs may embed credentials)
//! ```
//!
//! # API pattern
//!
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::DirectiveId;

// ---------------------------------------------------------------------------
// Namespace
// ---------------------------------------------------------------------------

/// Where directives live on a host and which names are reserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    /// Collection holding directive documents.
    #[serde(default = "default_control_collection")]
    pub control_collection: String,
    /// Databases and directive ids starting with this character are ignored.
    #[serde(default = "default_reserved_prefix")]
    pub reserved_prefix: char,
}

fn default_control_collection() -> String {
    "_replicator".to_string()
}

fn default_reserved_prefix() -> char {
    '_'
}

impl Default for Namespace {
    fn default() -> Self {
        Self {
            control_collection: default_control_collection(),
            reserved_prefix: default_reserved_prefix(),
        }
    }
}

impl Namespace {
    pub fn is_reserved(&self, name: &str) -> bool {
        name.starts_with(self.reserved_prefix)
    }

    /// `{control}/{id}` or `{control}/{id}?rev={rev}`, id and revision percent-encoded.
    pub fn directive_path(&self, id: &DirectiveId, revision: Option<&str>) -> String {
        let id = urlencoding::encode(&id.0);
        match revision {
            Some(rev) => format!(
                "{}/{}?rev={}",
                self.control_collection,
                id,
                urlencoding::encode(rev)
            ),
            None => format!("{}/{}", self.control_collection, id),
        }
    }

    /// Full listing of the control collection, bodies included.
    pub fn listing_path(&self) -> String {
        format!("{}/_all_docs?include_docs=true", self.control_collection)
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Contents of `~/.couchrep/config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub namespace: Namespace,
    /// Per-request timeout; absent means requests block until the host answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Host aliases → base URLs.
    #[serde(default)]
    pub hosts: BTreeMap<String, String>,
}

impl Settings {
    /// Resolve a host argument: a configured alias first, else a literal URL.
    pub fn resolve_host(&self, name: &str) -> Result<String, ConfigError> {
        if let Some(url) = self.hosts.get(name) {
            return validate_url(url);
        }
        if has_http_scheme(name) {
            return validate_url(name);
        }
        Err(ConfigError::UnknownHost {
            name: name.to_string(),
        })
    }

    /// Register or replace a host alias.
    pub fn add_host(&mut self, name: impl Into<String>, url: &str) -> Result<(), ConfigError> {
        let url = validate_url(url)?;
        self.hosts.insert(name.into(), url);
        Ok(())
    }
}

fn has_http_scheme(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn validate_url(url: &str) -> Result<String, ConfigError> {
    let trimmed = url.trim().trim_end_matches('/');
    let host_part = trimmed.split_once("://").map(|(_, rest)| rest).unwrap_or("");
    if !has_http_scheme(trimmed) || host_part.is_empty() {
        return Err(ConfigError::InvalidUrl {
            url: url.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// `<home>/.couchrep/config.yaml` — pure, no I/O.
pub fn settings_path_at(home: &Path) -> PathBuf {
    home.join(".couchrep").join("config.yaml")
}

/// Load settings; a missing file yields [`Settings::default`].
pub fn load_at(home: &Path) -> Result<Settings, ConfigError> {
    let path = settings_path_at(home);
    if !path.exists() {
        return Ok(Settings::default());
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Settings, ConfigError> {
    load_at(&home()?)
}

/// Atomically save settings.
///
/// Write flow: serialize → `config.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_at(home: &Path, settings: &Settings) -> Result<(), ConfigError> {
    let path = settings_path_at(home);
    let dir = home.join(".couchrep");
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
        set_permissions(&dir, 0o700)?;
    }
    let tmp_path = path.with_file_name("config.yaml.tmp");

    let yaml = serde_yaml::to_string(settings)?;
    std::fs::write(&tmp_path, yaml)?;
    set_permissions(&tmp_path, 0o600)?;
    std::fs::rename(&tmp_path, &path)?;
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(settings: &Settings) -> Result<(), ConfigError> {
    save_at(&home()?, settings)
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_permissions(path: &Path, mode: u32) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_permissions(_path: &Path, _mode: u32) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
