pub mod host;
pub mod replicate;
pub mod replicators;

use std::path::PathBuf;

use anyhow::{Context, Result};
use couchrep_core::{config, Settings};
use couchrep_sync::CouchClient;

/// Settings from `~/.couchrep/config.yaml` (defaults when absent).
pub(crate) fn load_settings() -> Result<(PathBuf, Settings)> {
    let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
    let settings = config::load_at(&home).context("failed to load ~/.couchrep/config.yaml")?;
    tracing::debug!(hosts = settings.hosts.len(), "settings loaded");
    Ok((home, settings))
}

/// Client for a host alias or URL.
pub(crate) fn client(settings: &Settings, host: &str) -> Result<CouchClient> {
    CouchClient::from_settings(settings, host).with_context(|| format!("cannot use host '{host}'"))
}
