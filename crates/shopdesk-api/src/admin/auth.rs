// Login, logout, session verification and the idle timeout.
//
// Login is the only unauthenticated call besides the health probe, so it
// builds its request directly instead of going through `send`.

use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use reqwest::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::client::{AdminClient, ApiResponse, bearer, body_message, read_json_body};
use crate::auth::{AdminInfo, Session};
use crate::endpoint::Endpoint;
use crate::error::Error;
use crate::retry::{RetryPolicy, fetch_with_retry};
use crate::watchdog::SessionWatchdog;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Deserialize)]
struct LoginPayload {
    token: String,
    admin: AdminInfo,
}

impl AdminClient {
    /// Exchange email + password for a session and persist it.
    ///
    /// `remember` keeps the session in the durable tier; otherwise it only
    /// lives as long as the session tier. Failed attempts count towards the
    /// client-side throttle.
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
        remember: bool,
    ) -> Result<Session, Error> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(Error::Validation {
                field: "email",
                reason: "Please enter a valid email address.".into(),
            });
        }
        if password.expose_secret().chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::Validation {
                field: "password",
                reason: format!("Password must be at least {MIN_PASSWORD_LEN} characters long."),
            });
        }

        let throttle = self.config.throttle;
        let attempts = self.store.durable();
        throttle.check(attempts, Utc::now())?;

        let url = self.url(&Endpoint::Named("login").resolve(self.endpoints)?)?;
        debug!("logging in at {url}");

        let request = self
            .http
            .post(url)
            .json(&json!({
                "email": email,
                "password": password.expose_secret(),
            }))
            .build()?;
        let resp = fetch_with_retry(&self.http, request, &self.config.login_retry).await?;

        let status = resp.status();
        let body = read_json_body(resp).await;

        if !status.is_success() {
            if let Err(e) = throttle.record_failure(attempts, Utc::now()) {
                warn!(error = %e, "failed to record login attempt");
            }
            return Err(Error::LoginFailed {
                status: status.as_u16(),
                message: login_failure_message(status.as_u16(), &body),
            });
        }

        let payload: LoginPayload = body
            .get("data")
            .cloned()
            .and_then(|data| serde_json::from_value(data).ok())
            .filter(|p: &LoginPayload| !p.token.is_empty())
            .ok_or(Error::InvalidLoginResponse)?;

        if let Err(e) = throttle.reset(attempts) {
            warn!(error = %e, "failed to reset login attempts");
        }

        let session = Session {
            token: SecretString::from(payload.token),
            admin: payload.admin,
        };
        self.store.persist(&session, remember)?;

        info!(role = ?session.admin.role, "login successful");
        Ok(session)
    }

    /// Ask the backend whether the stored token is still valid.
    ///
    /// Redirects to login when there is no token or the check fails.
    pub async fn verify_session(&self) -> bool {
        if !self.store.is_authenticated() {
            self.ui.redirect_to_login();
            return false;
        }

        let outcome = self
            .send::<Value>(
                Method::GET,
                Endpoint::Named("verify"),
                &[],
                None,
                &self.config.verify_retry,
            )
            .await
            .and_then(|value| {
                serde_json::from_value::<ApiResponse<Value>>(value.clone()).map_err(|e| {
                    Error::Deserialization {
                        message: e.to_string(),
                        body: value.to_string(),
                    }
                })
            });

        match outcome {
            Ok(resp) => resp.success,
            // 401/403 already cleared the session and redirected.
            Err(e) if e.is_auth_expired() => false,
            Err(e) => {
                warn!(error = %e, "session verification failed");
                self.ui.redirect_to_login();
                false
            }
        }
    }

    /// End the session: notify the backend if possible, then clear both
    /// tiers and redirect. Never fails.
    pub async fn logout(&self) {
        if let Some(token) = self.store.token() {
            match self.notify_logout(&token).await {
                Ok(status) => debug!(status, "backend acknowledged logout"),
                Err(e) => warn!(error = %e, "logout notification failed"),
            }
        }
        self.end_session();
        info!("logged out");
    }

    async fn notify_logout(&self, token: &SecretString) -> Result<u16, Error> {
        let url = self.url(&Endpoint::Named("logout").resolve(self.endpoints)?)?;
        let request = self
            .http
            .post(url)
            .header(AUTHORIZATION, bearer(token)?)
            .json(&json!({}))
            .build()?;
        let resp = fetch_with_retry(&self.http, request, &RetryPolicy::best_effort()).await?;
        Ok(resp.status().as_u16())
    }

    /// Arm the idle timer: after the configured idle period without
    /// activity, warn the user and log out.
    pub fn setup_session_timeout(self: &Arc<Self>) -> SessionWatchdog {
        let client = Arc::clone(self);
        SessionWatchdog::spawn(self.config.session_idle_timeout, move || async move {
            client.ui.warn("Session expired due to inactivity");
            client.logout().await;
        })
    }
}

/// `local@domain.tld` with no whitespace and a single `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

fn login_failure_message(status: u16, body: &Value) -> String {
    match status {
        401 => "Invalid email or password. Please check your credentials.".into(),
        429 => "Too many login attempts. Please try again later.".into(),
        503 => "Server is temporarily unavailable. Please wait a moment and try again.".into(),
        500 => body_message(body)
            .unwrap_or_else(|| "Server error. Please contact support if this persists.".into()),
        _ => body_message(body).unwrap_or_else(|| "Login failed. Please try again.".into()),
    }
}
