//! CLI configuration: thin wrapper around `shopdesk_config`.
//!
//! Applies `GlobalOpts` overrides (--api-url, --session-dir) and assembles
//! the `AdminClient` every backend-bound command uses.

use std::sync::Arc;

use shopdesk_api::{AdminClient, FileStorage, MemoryStorage, SessionStore, TracingUi};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use shopdesk_config::{Config, config_path, load_config};

/// Load the config file and environment, then apply CLI flag overrides.
pub fn resolve_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut config = load_config()?;

    // flag > env > file
    if let Some(url) = global.api_url.as_deref().filter(|u| !u.trim().is_empty()) {
        config.api_base_url = Some(url.to_owned());
    }
    if let Some(ref dir) = global.session_dir {
        config.session_dir = Some(dir.clone());
    }
    Ok(config)
}

/// Durable tier on disk, session tier in memory for this invocation.
pub fn session_store(config: &Config) -> SessionStore {
    SessionStore::new(
        Arc::new(FileStorage::new(config.session_path())),
        Arc::new(MemoryStorage::new()),
    )
}

pub fn build_client(config: &Config) -> Result<AdminClient, CliError> {
    let client_config = config.client_config()?;
    tracing::debug!(
        base_url = %client_config.base_url,
        session = %config.session_path().display(),
        "building admin client"
    );
    Ok(AdminClient::new(
        client_config,
        session_store(config),
        Arc::new(TracingUi),
    )?)
}
