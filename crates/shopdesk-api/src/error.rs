use thiserror::Error;

/// Top-level error type for the `shopdesk-api` crate.
///
/// Split the same way the failures are handled: the retry layer produces
/// transport errors, the facade produces HTTP-status errors, and the login
/// flow adds its own validation and throttling errors. Callers display
/// [`Error::user_message`] rather than re-implementing retry or auth logic.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// Every attempt timed out. The backend may still be waking up.
    #[error("Request timed out after {attempts} attempt(s) of {timeout_ms}ms")]
    Timeout { timeout_ms: u64, attempts: u32 },

    /// Non-timeout transport failure (DNS, connection refused, TLS).
    /// Never retried.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// A request with a streaming body cannot be replayed for a retry.
    #[error("Request body cannot be cloned for retry")]
    RequestNotCloneable,

    // ── Authentication ──────────────────────────────────────────────
    /// No bearer token stored; the caller was sent back to the login page.
    #[error("No authentication token found")]
    MissingToken,

    /// Backend rejected the token (401/403). The session has already been
    /// cleared and a login redirect issued when this is returned.
    #[error("Unauthorized (HTTP {status})")]
    Unauthorized { status: u16 },

    /// Login form rejected client-side.
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Too many failed logins inside the throttle window.
    #[error("Too many login attempts. Please try again in {retry_in_minutes} minutes.")]
    LoginThrottled { retry_in_minutes: i64 },

    /// Backend refused the login.
    #[error("{message}")]
    LoginFailed { status: u16, message: String },

    /// Login returned 2xx but without a token or admin profile.
    #[error("Invalid response from server. Please try again or contact support.")]
    InvalidLoginResponse,

    // ── Application ─────────────────────────────────────────────────
    /// Non-2xx, non-auth response. `message` comes from the JSON body when
    /// present.
    #[error("{message}")]
    RequestFailed { status: u16, message: String },

    /// Health probe never succeeded.
    #[error("Unable to connect to server after {attempts} attempts")]
    ServerUnavailable { attempts: u32 },

    /// Name not present in the endpoint table.
    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    /// Parameterized endpoint resolved without an id.
    #[error("Endpoint '{0}' requires an id")]
    MissingEndpointId(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// A session storage tier could not be read or written.
    #[error("Session storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Returns `true` for failures the retry layer treats as
    /// "server might be asleep".
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Network(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns `true` if the session is gone and the user must log in again.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::MissingToken | Self::Unauthorized { .. })
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status }
            | Self::RequestFailed { status, .. }
            | Self::LoginFailed { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Text suitable for a notification toast.
    pub fn user_message(&self) -> String {
        match self {
            e if e.is_timeout() => "Connection timeout. The server may be starting up. \
                 Please wait 30 seconds and try again."
                .into(),
            Self::Network(_) => {
                "Network error. Please check your internet connection and try again.".into()
            }
            other => other.to_string(),
        }
    }
}
