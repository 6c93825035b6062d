// shopdesk-api: Async client for the shop admin backend (retry, session, roles)

pub mod admin;
pub mod auth;
pub mod endpoint;
pub mod error;
pub mod retry;
pub mod session;
pub mod transport;
pub mod ui;
pub mod watchdog;

pub use admin::{AdminClient, ApiResponse, ClientConfig, HealthCheck};
pub use auth::{AdminInfo, Permission, Role, Session};
pub use endpoint::{Endpoint, EndpointTable};
pub use error::Error;
pub use retry::{Backoff, MAX_RETRY_DELAY, RetryPolicy, fetch_with_retry, retry_on_timeout};
pub use session::{FileStorage, LoginThrottle, MemoryStorage, SessionStorage, SessionStore};
pub use transport::{TlsMode, TransportConfig};
pub use ui::{TracingUi, UiAdapter};
pub use watchdog::{ActivityEvent, ActivityHandle, SESSION_IDLE_TIMEOUT, SessionWatchdog};
