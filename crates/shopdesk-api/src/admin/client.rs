// Admin API facade
//
// Every panel call goes through `AdminClient::request`: endpoint resolution,
// bearer injection, the retrying transport, and status handling. Login,
// logout and health probing live in sibling files as further inherent
// methods.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::endpoint::{Endpoint, EndpointTable};
use crate::error::Error;
use crate::retry::{RetryPolicy, fetch_with_retry};
use crate::session::{LoginThrottle, SessionStore};
use crate::transport::TransportConfig;
use crate::ui::{self, UiAdapter};
use crate::watchdog::SESSION_IDLE_TIMEOUT;

/// The `{ success, data, message }` envelope most endpoints return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

/// Everything the facade needs besides the session and UI.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend root, e.g. `http://localhost:3000`.
    pub base_url: Url,
    pub transport: TransportConfig,
    /// Policy for panel calls.
    pub retry: RetryPolicy,
    pub login_retry: RetryPolicy,
    pub verify_retry: RetryPolicy,
    pub session_idle_timeout: Duration,
    pub throttle: LoginThrottle,
}

impl ClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            transport: TransportConfig::default(),
            retry: RetryPolicy::api(),
            login_retry: RetryPolicy::login(),
            verify_retry: RetryPolicy::verify(),
            session_idle_timeout: SESSION_IDLE_TIMEOUT,
            throttle: LoginThrottle::default(),
        }
    }
}

/// Authenticated client for the admin backend.
pub struct AdminClient {
    pub(crate) http: reqwest::Client,
    pub(crate) config: ClientConfig,
    pub(crate) endpoints: &'static EndpointTable,
    pub(crate) store: SessionStore,
    pub(crate) ui: Arc<dyn UiAdapter>,
}

impl AdminClient {
    /// Build a client with its own `reqwest::Client` from `config.transport`.
    pub fn new(
        config: ClientConfig,
        store: SessionStore,
        ui: Arc<dyn UiAdapter>,
    ) -> Result<Self, Error> {
        let http = config.transport.build_client()?;
        Ok(Self::with_client(http, config, store, ui))
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        config: ClientConfig,
        store: SessionStore,
        ui: Arc<dyn UiAdapter>,
    ) -> Self {
        Self {
            http,
            config,
            endpoints: EndpointTable::standard(),
            store,
            ui,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    pub fn endpoints(&self) -> &'static EndpointTable {
        self.endpoints
    }

    /// Hide the UI elements the current role may not use.
    pub fn apply_role_restrictions(&self) {
        ui::apply_role_restrictions(&self.store, self.ui.as_ref());
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Absolute URL for a path already under `/api`.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.config.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    // ── Session transitions ──────────────────────────────────────────

    /// Authenticated → Anonymous without telling the backend.
    pub(crate) fn end_session(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear session");
        }
        self.ui.redirect_to_login();
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Authenticated request returning the parsed JSON body.
    ///
    /// Without a stored token this redirects to login and returns
    /// [`Error::MissingToken`] without touching the network. A 401/403
    /// clears the session and redirects before returning
    /// [`Error::Unauthorized`].
    pub async fn request(
        &self,
        method: Method,
        endpoint: Endpoint<'_>,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, Error> {
        self.send(method, endpoint, query, body, &self.config.retry)
            .await
    }

    /// [`request`](Self::request) with the body deserialized into `T`.
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: Endpoint<'_>,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T, Error> {
        let value = self.request(method, endpoint, query, body).await?;
        decode(value)
    }

    /// GET with query parameters. Parameters with an empty value are
    /// dropped, so `status=""` means "no status filter".
    pub async fn get<'a>(
        &self,
        endpoint: impl Into<Endpoint<'a>>,
        params: &[(&str, String)],
    ) -> Result<Value, Error> {
        self.send::<Value>(Method::GET, endpoint.into(), params, None, &self.config.retry)
            .await
    }

    pub async fn get_as<'a, T: DeserializeOwned>(
        &self,
        endpoint: impl Into<Endpoint<'a>>,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        decode(self.get(endpoint, params).await?)
    }

    pub async fn post<'a, B: Serialize + ?Sized>(
        &self,
        endpoint: impl Into<Endpoint<'a>>,
        body: &B,
    ) -> Result<Value, Error> {
        self.send(Method::POST, endpoint.into(), &[], Some(body), &self.config.retry)
            .await
    }

    pub async fn put<'a, B: Serialize + ?Sized>(
        &self,
        endpoint: impl Into<Endpoint<'a>>,
        body: &B,
    ) -> Result<Value, Error> {
        self.send(Method::PUT, endpoint.into(), &[], Some(body), &self.config.retry)
            .await
    }

    pub async fn delete<'a>(&self, endpoint: impl Into<Endpoint<'a>>) -> Result<Value, Error> {
        self.send::<Value>(Method::DELETE, endpoint.into(), &[], None, &self.config.retry)
            .await
    }

    pub(crate) async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: Endpoint<'_>,
        query: &[(&str, String)],
        body: Option<&B>,
        policy: &RetryPolicy,
    ) -> Result<Value, Error> {
        let Some(token) = self.store.token() else {
            debug!("no token stored, redirecting to login");
            self.ui.redirect_to_login();
            return Err(Error::MissingToken);
        };

        let url = self.url(&endpoint.resolve(self.endpoints)?)?;
        let params = non_empty_params(query);
        debug!("{method} {url} params={params:?}");

        let mut builder = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, bearer(&token)?);
        if !params.is_empty() {
            builder = builder.query(&params);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let resp = fetch_with_retry(&self.http, builder.build()?, policy).await?;
        self.handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response(&self, resp: reqwest::Response) -> Result<Value, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            warn!(status = status.as_u16(), "session rejected by backend");
            self.end_session();
            return Err(Error::Unauthorized {
                status: status.as_u16(),
            });
        }

        let body = read_json_body(resp).await;

        if !status.is_success() {
            let message = body_message(&body)
                .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
            return Err(Error::RequestFailed {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }
}

/// Drop parameters whose value is empty.
pub fn non_empty_params<'a>(params: &'a [(&'a str, String)]) -> Vec<(&'a str, &'a str)> {
    params
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (*k, v.as_str()))
        .collect()
}

pub(crate) fn bearer(token: &SecretString) -> Result<HeaderValue, Error> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret())).map_err(
        |e| Error::Validation {
            field: "token",
            reason: format!("not a valid header value: {e}"),
        },
    )?;
    value.set_sensitive(true);
    Ok(value)
}

/// Parse the body as JSON; an absent or malformed body reads as `{}`.
pub(crate) async fn read_json_body(resp: reqwest::Response) -> Value {
    let text = resp.text().await.unwrap_or_default();
    serde_json::from_str(&text).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

pub(crate) fn body_message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_owned)
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: value.to_string(),
    })
}
