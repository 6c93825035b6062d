use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Coarse-grained admin classification returned by the backend at login.
///
/// Closed set: role strings the backend may add later deserialize to
/// `None` on [`AdminInfo::role`] and get no permissions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    /// Full access, including logs, settings and destructive actions.
    SuperAdmin,
    /// Day-to-day operations on orders, products, returns.
    Staff,
}

/// Named capability checked by panels before showing an action.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Permission {
    ViewOrders,
    UpdateOrders,
    ViewProducts,
    UpdateProducts,
    UpdateInventory,
    ViewCustomers,
    ViewPayments,
    ProcessReturns,
    ViewReturns,
    ViewDiscounts,
    DeleteProduct,
    DeleteDiscount,
    DeleteCustomer,
    ViewLogs,
    ManageSettings,
    ExportData,
}

/// Staff allow-list.
pub const STAFF_PERMISSIONS: &[Permission] = &[
    Permission::ViewOrders,
    Permission::UpdateOrders,
    Permission::ViewProducts,
    Permission::UpdateProducts,
    Permission::UpdateInventory,
    Permission::ViewCustomers,
    Permission::ViewPayments,
    Permission::ProcessReturns,
    Permission::ViewReturns,
    Permission::ViewDiscounts,
];

impl Role {
    /// Whether this role grants `permission`.
    pub fn allows(self, permission: Permission) -> bool {
        match self {
            Self::SuperAdmin => true,
            Self::Staff => STAFF_PERMISSIONS.contains(&permission),
        }
    }

    /// Every permission this role grants.
    pub fn permissions(self) -> Vec<Permission> {
        Permission::iter().filter(|p| self.allows(*p)).collect()
    }
}

/// Admin profile stored next to the token (`adminInfo` slot).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminInfo {
    #[serde(
        default,
        alias = "_id",
        deserialize_with = "lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_role",
        skip_serializing_if = "Option::is_none"
    )]
    pub role: Option<Role>,
}

impl AdminInfo {
    /// Name shown in the header: full name, else email.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.email.as_deref())
            .unwrap_or_default()
    }
}

/// A logged-in admin: bearer token plus profile. Expiry lives in the
/// server-side JWT and is only observed as a 401/403.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: SecretString,
    pub admin: AdminInfo,
}

fn lenient_role<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Role>, D::Error> {
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|s| s.parse().ok()))
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn super_admin_allows_everything() {
        for p in Permission::iter() {
            assert!(Role::SuperAdmin.allows(p), "{p} denied");
        }
    }

    #[test]
    fn staff_limited_to_allow_list() {
        assert!(Role::Staff.allows(Permission::ViewOrders));
        assert!(Role::Staff.allows(Permission::ProcessReturns));
        assert!(!Role::Staff.allows(Permission::ViewLogs));
        assert!(!Role::Staff.allows(Permission::DeleteProduct));
        assert_eq!(Role::Staff.permissions(), STAFF_PERMISSIONS.to_vec());
    }

    #[test]
    fn permission_names_are_snake_case() {
        assert_eq!(Permission::ViewLogs.as_ref(), "view_logs");
        assert_eq!(
            "update_inventory".parse::<Permission>().unwrap(),
            Permission::UpdateInventory
        );
        assert!("fly_to_moon".parse::<Permission>().is_err());
    }

    #[test]
    fn admin_info_accepts_backend_shape() {
        let admin: AdminInfo = serde_json::from_value(json!({
            "_id": 42,
            "fullName": "Ada Lovelace",
            "email": "ada@example.com",
            "role": "super_admin"
        }))
        .unwrap();

        assert_eq!(admin.id.as_deref(), Some("42"));
        assert_eq!(admin.role, Some(Role::SuperAdmin));
        assert_eq!(admin.display_name(), "Ada Lovelace");
    }

    #[test]
    fn unknown_role_reads_as_none() {
        let admin: AdminInfo =
            serde_json::from_value(json!({ "email": "x@y.z", "role": "owner" })).unwrap();
        assert_eq!(admin.role, None);
        assert_eq!(admin.display_name(), "x@y.z");
    }

    #[test]
    fn admin_info_round_trips_storage_format() {
        let admin = AdminInfo {
            id: Some("7".into()),
            full_name: None,
            email: Some("s@shop.test".into()),
            role: Some(Role::Staff),
        };
        let stored = serde_json::to_string(&admin).unwrap();
        assert_eq!(stored, r#"{"id":"7","email":"s@shop.test","role":"staff"}"#);
        assert_eq!(serde_json::from_str::<AdminInfo>(&stored).unwrap(), admin);
    }
}
