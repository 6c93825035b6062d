// UI side effects the auth layer triggers but does not own.
//
// The browser build implements this over the DOM; headless hosts log.

use tracing::{info, warn};

use crate::auth::Role;
use crate::session::SessionStore;

/// Capability through which auth code touches the UI.
pub trait UiAdapter: Send + Sync {
    /// Navigate to the login entry point.
    fn redirect_to_login(&self);

    /// Show a user-visible warning notification.
    fn warn(&self, message: &str);

    /// Hide every element matching `selector`.
    fn hide(&self, selector: &str);
}

/// Selectors hidden for each role. Super admins see everything.
pub fn restricted_selectors(role: Role) -> &'static [&'static str] {
    match role {
        Role::SuperAdmin => &[],
        Role::Staff => &[
            ".delete-product-btn",
            ".delete-discount-btn",
            ".delete-customer-btn",
            r#"[data-panel="logs"]"#,
            r#"[data-permission="super_admin"]"#,
        ],
    }
}

/// Hide the elements the current role may not use. Without a known role
/// nothing is hidden; panels still gate their actions on permissions.
pub fn apply_role_restrictions(store: &SessionStore, ui: &dyn UiAdapter) {
    let Some(role) = store.role() else { return };
    for selector in restricted_selectors(role) {
        ui.hide(selector);
    }
}

/// Adapter for headless hosts: every effect becomes a log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingUi;

impl UiAdapter for TracingUi {
    fn redirect_to_login(&self) {
        info!("redirecting to login");
    }

    fn warn(&self, message: &str) {
        warn!("{message}");
    }

    fn hide(&self, selector: &str) {
        info!(selector, "hiding restricted element");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use secrecy::SecretString;

    use super::*;
    use crate::auth::{AdminInfo, Session};

    #[derive(Default)]
    struct Hidden(Mutex<Vec<String>>);

    impl UiAdapter for Hidden {
        fn redirect_to_login(&self) {}
        fn warn(&self, _: &str) {}
        fn hide(&self, selector: &str) {
            self.0.lock().unwrap().push(selector.to_owned());
        }
    }

    fn store_with(role: Option<Role>) -> SessionStore {
        let store = SessionStore::in_memory();
        let session = Session {
            token: SecretString::from("T".to_owned()),
            admin: AdminInfo {
                role,
                ..AdminInfo::default()
            },
        };
        store.persist(&session, true).unwrap();
        store
    }

    #[test]
    fn staff_hides_destructive_controls() {
        let ui = Hidden::default();
        apply_role_restrictions(&store_with(Some(Role::Staff)), &ui);
        let hidden = ui.0.into_inner().unwrap();
        assert_eq!(hidden.len(), 5);
        assert!(hidden.contains(&r#"[data-panel="logs"]"#.to_owned()));
    }

    #[test]
    fn super_admin_and_unknown_role_hide_nothing() {
        for role in [Some(Role::SuperAdmin), None] {
            let ui = Hidden::default();
            apply_role_restrictions(&store_with(role), &ui);
            assert!(ui.0.into_inner().unwrap().is_empty());
        }
    }
}
