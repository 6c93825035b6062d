//! CLI error types with miette diagnostics.
//!
//! Maps `shopdesk_api::Error` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use shopdesk_api::Error as ApiError;
use shopdesk_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the backend at {url}")]
    #[diagnostic(
        code(shopdesk::connection_failed),
        help(
            "Check your network connection and that the backend is running.\n\
             URL: {url}\n\
             Override with --api-url or SHOPDESK_API_BASE_URL."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Backend did not become healthy after {attempts} attempts")]
    #[diagnostic(
        code(shopdesk::server_unavailable),
        help("Unable to connect to server. Please try again later.")
    )]
    ServerUnavailable { attempts: u32 },

    #[error("Request timed out after {attempts} attempt(s) of {seconds}s each")]
    #[diagnostic(
        code(shopdesk::timeout),
        help(
            "Connection timeout. The server may be starting up, please try again in a moment.\n\
             Run: shopdesk health"
        )
    )]
    Timeout { seconds: u64, attempts: u32 },

    #[error("Timed out talking to the backend at {url}")]
    #[diagnostic(
        code(shopdesk::timeout),
        help(
            "Connection timeout. The server may be starting up, please try again in a moment.\n\
             Run: shopdesk health"
        )
    )]
    TransportTimeout {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not signed in")]
    #[diagnostic(code(shopdesk::not_logged_in), help("Run: shopdesk login --email <EMAIL>"))]
    NotLoggedIn,

    #[error("Session rejected by the backend (HTTP {status})")]
    #[diagnostic(
        code(shopdesk::session_expired),
        help("The stored session was cleared. Run: shopdesk login --email <EMAIL>")
    )]
    SessionExpired { status: u16 },

    #[error("{message}")]
    #[diagnostic(code(shopdesk::auth_failed))]
    AuthFailed { message: String },

    #[error("Too many login attempts")]
    #[diagnostic(
        code(shopdesk::login_throttled),
        help("Please try again in {minutes} minute(s).")
    )]
    Throttled { minutes: i64 },

    #[error("Permission '{permission}' is not granted to role {role}")]
    #[diagnostic(code(shopdesk::permission_denied))]
    PermissionDenied { permission: String, role: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(shopdesk::not_found),
        help("Run: shopdesk {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API request failed: {message}")]
    #[diagnostic(code(shopdesk::api_error))]
    Api { status: Option<u16>, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(shopdesk::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(shopdesk::config),
        help("Check the config file (shopdesk config path) and SHOPDESK_* variables.")
    )]
    Config(#[from] ConfigError),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::ServerUnavailable { .. } => {
                exit_code::CONNECTION
            }
            Self::Timeout { .. } | Self::TransportTimeout { .. } => exit_code::TIMEOUT,
            Self::NotLoggedIn
            | Self::SessionExpired { .. }
            | Self::AuthFailed { .. }
            | Self::Throttled { .. } => exit_code::AUTH,
            Self::PermissionDenied { .. } => exit_code::PERMISSION,
            Self::NotFound { .. } | Self::Api { status: Some(404), .. } => exit_code::NOT_FOUND,
            Self::Api { status: Some(409), .. } => exit_code::CONFLICT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── shopdesk_api::Error → CliError mapping ───────────────────────────

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Timeout {
                timeout_ms,
                attempts,
            } => CliError::Timeout {
                seconds: timeout_ms.div_ceil(1000),
                attempts,
            },

            ApiError::Network(e) if e.is_timeout() => CliError::TransportTimeout {
                url: e
                    .url()
                    .map_or_else(|| "(unknown)".into(), ToString::to_string),
                source: Box::new(e),
            },

            ApiError::Network(e) => CliError::ConnectionFailed {
                url: e
                    .url()
                    .map_or_else(|| "(unknown)".into(), ToString::to_string),
                source: Box::new(e),
            },

            ApiError::ServerUnavailable { attempts } => CliError::ServerUnavailable { attempts },

            ApiError::MissingToken => CliError::NotLoggedIn,

            ApiError::Unauthorized { status } => CliError::SessionExpired { status },

            ApiError::LoginFailed { message, .. } => CliError::AuthFailed { message },

            ApiError::LoginThrottled { retry_in_minutes } => CliError::Throttled {
                minutes: retry_in_minutes,
            },

            ApiError::Validation { field, reason } => CliError::Validation {
                field: field.into(),
                reason,
            },

            ApiError::UnknownEndpoint(name) => CliError::NotFound {
                resource_type: "endpoint".into(),
                identifier: name,
                list_command: "endpoints".into(),
            },

            ApiError::MissingEndpointId(name) => CliError::Validation {
                field: "id".into(),
                reason: format!("endpoint '{name}' needs --id"),
            },

            ApiError::RequestFailed { status, message } => CliError::Api {
                status: Some(status),
                message,
            },

            other => CliError::Api {
                status: other.status(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    use super::*;

    /// A reqwest timeout error from a peer that accepts and never answers.
    async fn stalled_request_error() -> reqwest::Error {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0_u8; 1024];
            while socket.read(&mut buf).await.is_ok_and(|n| n > 0) {}
        });

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();
        client
            .get(format!("http://{addr}/api/admin/orders"))
            .send()
            .await
            .unwrap_err()
    }

    #[tokio::test]
    async fn transport_timeout_is_a_timeout() {
        let source = stalled_request_error().await;
        assert!(source.is_timeout());

        let err = CliError::from(ApiError::Network(source));
        assert!(matches!(err, CliError::TransportTimeout { ref url, .. } if url.contains("/api/admin/orders")));
        assert_eq!(err.exit_code(), exit_code::TIMEOUT);
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        assert_eq!(
            CliError::from(ApiError::MissingToken).exit_code(),
            exit_code::AUTH
        );
        assert_eq!(
            CliError::from(ApiError::Unauthorized { status: 403 }).exit_code(),
            exit_code::AUTH
        );
        assert_eq!(
            CliError::from(ApiError::Timeout {
                timeout_ms: 90_000,
                attempts: 3
            })
            .exit_code(),
            exit_code::TIMEOUT
        );
        assert_eq!(
            CliError::from(ApiError::ServerUnavailable { attempts: 10 }).exit_code(),
            exit_code::CONNECTION
        );
        assert_eq!(
            CliError::from(ApiError::RequestFailed {
                status: 404,
                message: "Order not found".into()
            })
            .exit_code(),
            exit_code::NOT_FOUND
        );
        assert_eq!(
            CliError::from(ApiError::UnknownEndpoint("nope".into())).exit_code(),
            exit_code::NOT_FOUND
        );
        assert_eq!(
            CliError::from(ApiError::MissingEndpointId("orderById".into())).exit_code(),
            exit_code::USAGE
        );
    }

    #[test]
    fn timeout_rounds_up_to_seconds() {
        let err = CliError::from(ApiError::Timeout {
            timeout_ms: 1500,
            attempts: 2,
        });
        assert!(matches!(
            err,
            CliError::Timeout {
                seconds: 2,
                attempts: 2
            }
        ));
    }
}
