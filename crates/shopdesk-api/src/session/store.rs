use std::fmt;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use super::storage::{MemoryStorage, SessionStorage};
use crate::auth::{AdminInfo, Permission, Role, Session};
use crate::error::Error;

pub const TOKEN_KEY: &str = "adminToken";
pub const ADMIN_INFO_KEY: &str = "adminInfo";
pub const REMEMBER_ME_KEY: &str = "rememberMe";

/// Bearer token and admin profile mirrored across two storage tiers.
///
/// Reads check the durable tier first, then the session tier. Reads never
/// fail: a tier that errors or holds garbage is logged and treated as
/// empty, which sends the user back through login.
#[derive(Clone)]
pub struct SessionStore {
    durable: Arc<dyn SessionStorage>,
    session: Arc<dyn SessionStorage>,
}

impl SessionStore {
    pub fn new(durable: Arc<dyn SessionStorage>, session: Arc<dyn SessionStorage>) -> Self {
        Self { durable, session }
    }

    /// Both tiers in memory. Useful for tests and one-shot tools.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()), Arc::new(MemoryStorage::new()))
    }

    pub(crate) fn durable(&self) -> &dyn SessionStorage {
        self.durable.as_ref()
    }

    fn read(&self, key: &str) -> Option<String> {
        for (tier, storage) in [("durable", &self.durable), ("session", &self.session)] {
            match storage.get(key) {
                Ok(Some(value)) if !value.is_empty() => return Some(value),
                Ok(_) => {}
                Err(e) => warn!(tier, key, error = %e, "session tier unreadable"),
            }
        }
        None
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn token(&self) -> Option<SecretString> {
        self.read(TOKEN_KEY).map(SecretString::from)
    }

    pub fn admin_info(&self) -> Option<AdminInfo> {
        let raw = self.read(ADMIN_INFO_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(info) => Some(info),
            Err(e) => {
                warn!(error = %e, "stored admin info is not valid JSON");
                None
            }
        }
    }

    /// The full session, only when token and profile are both present.
    pub fn session(&self) -> Option<Session> {
        Some(Session {
            token: self.token()?,
            admin: self.admin_info()?,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn remember_me(&self) -> bool {
        self.read(REMEMBER_ME_KEY).is_some_and(|v| v == "true")
    }

    // ── Role & permission checks ─────────────────────────────────────

    pub fn role(&self) -> Option<Role> {
        self.admin_info()?.role
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role() == Some(role)
    }

    pub fn is_super_admin(&self) -> bool {
        self.has_role(Role::SuperAdmin)
    }

    pub fn is_staff(&self) -> bool {
        self.has_role(Role::Staff)
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role().is_some_and(|role| role.allows(permission))
    }

    /// Permission check by wire name, e.g. from a `data-permission`
    /// attribute. Super admins pass any name; everyone else needs a known
    /// name on their allow-list.
    pub fn has_permission_named(&self, name: &str) -> bool {
        match self.role() {
            Some(Role::SuperAdmin) => true,
            Some(role) => name
                .parse::<Permission>()
                .is_ok_and(|permission| role.allows(permission)),
            None => false,
        }
    }

    /// An element with no required permission is always accessible.
    pub fn check_element_permission(&self, required: Option<&str>) -> bool {
        required.is_none_or(|name| self.has_permission_named(name))
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Store a freshly issued session.
    ///
    /// `remember` selects the durable tier; otherwise the session tier is
    /// used and any durable copy is removed so precedence cannot resurrect
    /// an older login. The profile is written before the token so a reader
    /// never sees a token without its profile.
    pub fn persist(&self, session: &Session, remember: bool) -> Result<(), Error> {
        let (target, other) = if remember {
            (&self.durable, &self.session)
        } else {
            (&self.session, &self.durable)
        };

        let admin = serde_json::to_string(&session.admin)
            .map_err(|e| Error::Storage(format!("failed to encode admin info: {e}")))?;

        other.remove(TOKEN_KEY)?;
        other.remove(ADMIN_INFO_KEY)?;
        target.set(ADMIN_INFO_KEY, &admin)?;
        target.set(TOKEN_KEY, session.token.expose_secret())?;
        self.durable
            .set(REMEMBER_ME_KEY, if remember { "true" } else { "false" })?;

        debug!(remember, role = ?session.admin.role, "session persisted");
        Ok(())
    }

    /// Drop token and profile from both tiers.
    ///
    /// Every slot is attempted even if one fails; the first error is
    /// returned.
    pub fn clear(&self) -> Result<(), Error> {
        let mut first_err = None;
        for storage in [&self.durable, &self.session] {
            for key in [TOKEN_KEY, ADMIN_INFO_KEY] {
                if let Err(e) = storage.remove(key) {
                    first_err.get_or_insert(e);
                }
            }
        }
        debug!("session cleared");
        first_err.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}
