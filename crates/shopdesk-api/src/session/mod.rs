// Persisted admin session: storage tiers, the store over them, and the
// client-side login throttle.

mod storage;
mod store;
mod throttle;

pub use storage::{FileStorage, MemoryStorage, SessionStorage};
pub use store::{ADMIN_INFO_KEY, REMEMBER_ME_KEY, SessionStore, TOKEN_KEY};
pub use throttle::{LOGIN_ATTEMPTS_KEY, LoginThrottle};
