//! Shared configuration for shopdesk tools.
//!
//! Layered settings (defaults, TOML file, `SHOPDESK_` environment), the
//! backend base URL decision, and translation to
//! `shopdesk_api::ClientConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use shopdesk_api::{ClientConfig, RetryPolicy, TlsMode, TransportConfig};

/// Backend used when the dashboard is served from a local machine.
pub const LOCAL_API_URL: &str = "http://localhost:3000";

/// Hosted backend used everywhere else.
pub const PRODUCTION_API_URL: &str = "https://backend-ecommerce-3-2jsk.onrender.com";

const LOCAL_HOSTS: &[&str] = &["localhost", "127.0.0.1"];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("invalid API URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config structs ──────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Explicit backend URL. Wins over the host-based guess when non-blank.
    pub api_base_url: Option<String>,

    /// Host the dashboard is served from (decides local vs production).
    pub dashboard_host: String,

    /// TCP connect timeout.
    pub request_timeout_secs: u64,

    /// Idle period before an automatic logout.
    pub session_idle_timeout_secs: u64,

    pub retry: RetrySettings,

    pub default_page_size: u32,
    pub max_page_size: u32,

    /// Where the persisted session lives. Defaults to the platform data dir.
    pub session_dir: Option<PathBuf>,

    /// Extra CA certificate (PEM) to trust.
    pub ca_cert: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            dashboard_host: "localhost".into(),
            request_timeout_secs: 10,
            session_idle_timeout_secs: 30 * 60,
            retry: RetrySettings::default(),
            default_page_size: 20,
            max_page_size: 100,
            session_dir: None,
            ca_cert: None,
        }
    }
}

/// Retry policy for panel requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrySettings {
    pub retries: u32,
    pub retry_delay_ms: u64,
    pub timeout_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let api = RetryPolicy::api();
        Self {
            retries: api.retries(),
            retry_delay_ms: duration_ms(api.retry_delay()),
            timeout_ms: duration_ms(api.timeout()),
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl RetrySettings {
    pub fn policy(&self) -> Result<RetryPolicy, ConfigError> {
        if self.retry_delay_ms == 0 {
            return Err(validation("retry.retry_delay_ms", "must be greater than zero"));
        }
        if self.timeout_ms == 0 {
            return Err(validation("retry.timeout_ms", "must be greater than zero"));
        }
        RetryPolicy::new(
            self.retries,
            Duration::from_millis(self.retry_delay_ms),
            Duration::from_millis(self.timeout_ms),
        )
        .map_err(|e| validation("retry", &e.to_string()))
    }
}

fn validation(field: &str, reason: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

impl Config {
    /// Backend root this config points at.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        resolve_base_url(self.api_base_url.as_deref(), &self.dashboard_host)
    }

    /// Clamp a requested page size into `1..=max_page_size`, falling back
    /// to the default when absent.
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }

    /// File backing the durable session tier.
    pub fn session_path(&self) -> PathBuf {
        self.session_dir
            .clone()
            .unwrap_or_else(data_dir)
            .join("session.json")
    }

    /// Translate into the API crate's client configuration.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(validation(
                "default_page_size",
                &format!("must be between 1 and max_page_size ({})", self.max_page_size),
            ));
        }
        if self.session_idle_timeout_secs == 0 {
            return Err(validation(
                "session_idle_timeout_secs",
                "must be greater than zero",
            ));
        }

        let mut config = ClientConfig::new(self.base_url()?);
        config.retry = self.retry.policy()?;
        config.session_idle_timeout = Duration::from_secs(self.session_idle_timeout_secs);
        config.transport = TransportConfig {
            tls: self
                .ca_cert
                .clone()
                .map_or(TlsMode::System, TlsMode::CustomCa),
            connect_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
            ..TransportConfig::default()
        };
        Ok(config)
    }
}

// ── Base URL ────────────────────────────────────────────────────────

/// Decide which backend to talk to.
///
/// A non-blank `injected` value wins. Otherwise a dashboard served from
/// `localhost`/`127.0.0.1` talks to [`LOCAL_API_URL`] and anything else to
/// [`PRODUCTION_API_URL`].
pub fn resolve_base_url(injected: Option<&str>, dashboard_host: &str) -> Result<Url, ConfigError> {
    let chosen = match injected.map(str::trim).filter(|s| !s.is_empty()) {
        Some(url) => url,
        None if is_local_host(dashboard_host) => LOCAL_API_URL,
        None => PRODUCTION_API_URL,
    };
    Url::parse(chosen).map_err(|source| ConfigError::InvalidUrl {
        url: chosen.to_owned(),
        source,
    })
}

fn is_local_host(host: &str) -> bool {
    let host = host.trim();
    // tolerate a trailing port, e.g. "localhost:8080"
    let bare = host.rsplit_once(':').map_or(host, |(h, port)| {
        if port.chars().all(|c| c.is_ascii_digit()) {
            h
        } else {
            host
        }
    });
    LOCAL_HOSTS
        .iter()
        .any(|local| bare.eq_ignore_ascii_case(local))
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "shopdesk", "shopdesk")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn data_dir() -> PathBuf {
    project_dirs().map_or_else(home_fallback, |dirs| dirs.data_dir().to_path_buf())
}

fn home_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("shopdesk");
    p
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load the config from the canonical file plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` plus environment. A missing file is not an error.
///
/// Nested keys use a double underscore: `SHOPDESK_RETRY__TIMEOUT_MS`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SHOPDESK_").split("__"));

    Ok(figment.extract()?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn injected_url_wins() {
        let url = resolve_base_url(Some("https://api.example.com"), "localhost").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/");
    }

    #[test]
    fn blank_injected_url_is_ignored() {
        let url = resolve_base_url(Some("   "), "127.0.0.1").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/");
    }

    #[test]
    fn local_hosts_use_local_backend() {
        for host in ["localhost", "127.0.0.1", "localhost:8080", "LOCALHOST"] {
            let url = resolve_base_url(None, host).unwrap();
            assert_eq!(url.as_str(), "http://localhost:3000/", "host {host}");
        }
    }

    #[test]
    fn other_hosts_use_production() {
        let url = resolve_base_url(None, "admin.myshop.com").unwrap();
        assert_eq!(url.as_str(), "https://backend-ecommerce-3-2jsk.onrender.com/");
    }

    #[test]
    fn invalid_injected_url() {
        let err = resolve_base_url(Some("not a url"), "localhost").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn defaults_without_file() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let config = load_config_from(&jail.directory().join("missing.toml")).unwrap();
            assert_eq!(config, Config::default());
            assert_eq!(config.retry.retries, 2);
            assert_eq!(config.retry.retry_delay_ms, 2000);
            assert_eq!(config.retry.timeout_ms, 90_000);
            Ok(())
        });
    }

    #[test]
    fn file_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                "config.toml",
                r#"
                api_base_url = "https://file.example.com"
                dashboard_host = "admin.myshop.com"
                default_page_size = 50

                [retry]
                retries = 5
                "#,
            )?;
            jail.set_env("SHOPDESK_API_BASE_URL", "https://env.example.com");
            jail.set_env("SHOPDESK_RETRY__TIMEOUT_MS", "1500");

            let config = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(config.api_base_url.as_deref(), Some("https://env.example.com"));
            assert_eq!(config.dashboard_host, "admin.myshop.com");
            assert_eq!(config.default_page_size, 50);
            assert_eq!(config.retry.retries, 5);
            assert_eq!(config.retry.timeout_ms, 1500);
            assert_eq!(config.retry.retry_delay_ms, 2000);
            Ok(())
        });
    }

    #[test]
    fn client_config_translation() {
        let config = Config {
            dashboard_host: "admin.myshop.com".into(),
            session_idle_timeout_secs: 60,
            retry: RetrySettings {
                retries: 1,
                retry_delay_ms: 500,
                timeout_ms: 5000,
            },
            ..Config::default()
        };
        let client = config.client_config().unwrap();
        assert_eq!(client.base_url.as_str(), PRODUCTION_API_URL.to_owned() + "/");
        assert_eq!(client.retry.retries(), 1);
        assert_eq!(client.retry.retry_delay(), Duration::from_millis(500));
        assert_eq!(client.retry.timeout(), Duration::from_secs(5));
        assert_eq!(client.session_idle_timeout, Duration::from_secs(60));
    }

    #[test]
    fn zero_retry_values_rejected() {
        let mut config = Config::default();
        config.retry.timeout_ms = 0;
        let err = config.client_config().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation { ref field, .. } if field == "retry.timeout_ms")
        );

        config.retry = RetrySettings {
            retry_delay_ms: 0,
            ..RetrySettings::default()
        };
        assert!(config.client_config().is_err());
    }

    #[test]
    fn page_size_clamped() {
        let config = Config::default();
        assert_eq!(config.page_size(None), 20);
        assert_eq!(config.page_size(Some(500)), 100);
        assert_eq!(config.page_size(Some(0)), 1);
    }

    #[test]
    fn session_path_honours_override() {
        let config = Config {
            session_dir: Some(PathBuf::from("/tmp/shopdesk-test")),
            ..Config::default()
        };
        assert_eq!(
            config.session_path(),
            PathBuf::from("/tmp/shopdesk-test/session.json")
        );
    }
}
