// Symbolic endpoint table and raw-path normalization.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::Error;

/// Prefix every backend path lives under.
pub const API_PREFIX: &str = "/api";

const ID_PLACEHOLDER: &str = "{id}";

const STANDARD: &[(&str, &str)] = &[
    ("login", "/api/admin/login"),
    ("logout", "/api/admin/logout"),
    ("verify", "/api/admin/verify"),
    // Dashboard
    ("dashboard", "/api/admin/dashboard"),
    ("metrics", "/api/admin/metrics"),
    // Orders
    ("orders", "/api/admin/orders"),
    ("orderById", "/api/admin/orders/{id}"),
    ("updateOrder", "/api/admin/orders/{id}"),
    // Payments
    ("payments", "/api/admin/payments"),
    // Customers
    ("customers", "/api/admin/customers"),
    ("customerById", "/api/admin/customers/{id}"),
    // Products
    ("products", "/api/admin/products"),
    ("productById", "/api/admin/products/{id}"),
    // Discounts
    ("discounts", "/api/admin/discounts"),
    ("discountById", "/api/admin/discounts/{id}"),
    // Returns
    ("returns", "/api/admin/returns"),
    ("returnById", "/api/admin/returns/{id}"),
    // Reports
    ("reports", "/api/admin/reports"),
    ("salesReport", "/api/admin/reports/sales"),
    ("analytics", "/api/admin/reports/analytics"),
    // Compliance
    ("vatRecords", "/api/admin/compliance/vat"),
    ("activityLogs", "/api/admin/compliance/activity-logs"),
    ("vatReport", "/api/admin/compliance/vat-report"),
    // Security
    ("securityEvents", "/api/admin/security/events"),
    ("securityLogs", "/api/admin/security/logs"),
    // Reviews
    ("adminReviews", "/api/admin/reviews"),
    ("approveReview", "/api/admin/reviews/{id}/approve"),
    ("rejectReview", "/api/admin/reviews/{id}/reject"),
    ("flagReview", "/api/admin/reviews/{id}/flag"),
    // Bulk operations
    ("exportProducts", "/api/admin/products/export"),
    ("importProducts", "/api/admin/products/import"),
    ("exportOrders", "/api/admin/orders/export"),
    ("exportSubscribers", "/api/admin/newsletter/export"),
    ("bulkUpdateStock", "/api/admin/products/bulk-stock"),
    // Analytics
    ("revenueChart", "/api/admin/analytics/revenue"),
    ("topProducts", "/api/admin/analytics/top-products"),
    ("salesByCategory", "/api/admin/analytics/sales-by-category"),
    ("customerMetrics", "/api/admin/analytics/customer-metrics"),
    // Newsletter
    ("newsletterSubscribers", "/api/admin/newsletter/subscribers"),
    ("unsubscribeUser", "/api/admin/newsletter/{id}/unsubscribe"),
    // Settings
    ("emailSettings", "/api/admin/settings/email"),
    ("testEmail", "/api/admin/settings/email/test"),
    // Inventory
    ("stockHistory", "/api/admin/inventory/stock-history"),
    ("stockAdjustment", "/api/admin/inventory/adjust"),
    ("reorderAlerts", "/api/admin/inventory/reorder-alerts"),
];

/// Immutable name → path-template map. Templates with an `{id}`
/// placeholder need an id to resolve.
#[derive(Debug)]
pub struct EndpointTable {
    templates: HashMap<&'static str, &'static str>,
}

impl EndpointTable {
    /// The backend's endpoint set, built once per process.
    pub fn standard() -> &'static Self {
        static TABLE: OnceLock<EndpointTable> = OnceLock::new();
        TABLE.get_or_init(|| Self {
            templates: STANDARD.iter().copied().collect(),
        })
    }

    pub fn template(&self, name: &str) -> Option<&'static str> {
        self.templates.get(name).copied()
    }

    pub fn is_parameterized(&self, name: &str) -> bool {
        self.template(name)
            .is_some_and(|t| t.contains(ID_PLACEHOLDER))
    }

    /// Sorted endpoint names.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.templates.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Resolve `name` to a concrete path. An id given for an
    /// unparameterized endpoint is ignored.
    pub fn resolve(&self, name: &str, id: Option<&str>) -> Result<String, Error> {
        let template = self
            .template(name)
            .ok_or_else(|| Error::UnknownEndpoint(name.to_owned()))?;

        if !template.contains(ID_PLACEHOLDER) {
            return Ok(template.to_owned());
        }
        match id.filter(|id| !id.is_empty()) {
            Some(id) => Ok(template.replace(ID_PLACEHOLDER, &encode_segment(id))),
            None => Err(Error::MissingEndpointId(name.to_owned())),
        }
    }
}

/// A request target: a table entry or a raw path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    /// Table entry without an id.
    Named(&'a str),
    /// Parameterized table entry and its id.
    WithId(&'a str, &'a str),
    /// Raw path such as `/admin/orders?page=2`; normalized to live under
    /// [`API_PREFIX`].
    Path(&'a str),
}

impl<'a> From<&'a str> for Endpoint<'a> {
    /// Leading `/` means a raw path, anything else a table name.
    fn from(s: &'a str) -> Self {
        if s.starts_with('/') {
            Self::Path(s)
        } else {
            Self::Named(s)
        }
    }
}

impl Endpoint<'_> {
    /// The absolute path (with leading `/api`) this target refers to.
    pub fn resolve(&self, table: &EndpointTable) -> Result<String, Error> {
        match *self {
            Self::Named(name) => table.resolve(name, None),
            Self::WithId(name, id) => table.resolve(name, Some(id)),
            Self::Path(path) => Ok(normalize_api_path(path)),
        }
    }
}

/// Put `path` under [`API_PREFIX`] unless it already is.
///
/// `""` → `/api`, `/admin/x` → `/api/admin/x`, `admin/x` → `/api/admin/x`,
/// `/api/admin/x` unchanged.
pub fn normalize_api_path(path: &str) -> String {
    if path.is_empty() {
        return API_PREFIX.to_owned();
    }
    if path == API_PREFIX || path.starts_with(&format!("{API_PREFIX}/")) {
        return path.to_owned();
    }
    if path.starts_with('/') {
        format!("{API_PREFIX}{path}")
    } else {
        format!("{API_PREFIX}/{path}")
    }
}

fn encode_segment(id: &str) -> String {
    url::form_urlencoded::byte_serialize(id.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn resolves_plain_and_parameterized_names() {
        let table = EndpointTable::standard();
        assert_eq!(table.resolve("orders", None).unwrap(), "/api/admin/orders");
        assert_eq!(
            table.resolve("approveReview", Some("r-9")).unwrap(),
            "/api/admin/reviews/r-9/approve"
        );
        assert_eq!(
            table.resolve("orders", Some("ignored")).unwrap(),
            "/api/admin/orders"
        );
    }

    #[test]
    fn missing_id_and_unknown_name_are_errors() {
        let table = EndpointTable::standard();
        assert!(matches!(
            table.resolve("orderById", None),
            Err(Error::MissingEndpointId(ref n)) if n == "orderById"
        ));
        assert!(matches!(
            table.resolve("orderById", Some("")),
            Err(Error::MissingEndpointId(_))
        ));
        assert!(matches!(
            table.resolve("nope", None),
            Err(Error::UnknownEndpoint(_))
        ));
    }

    #[test]
    fn ids_are_path_encoded() {
        let table = EndpointTable::standard();
        assert_eq!(
            table.resolve("productById", Some("a b/c")).unwrap(),
            "/api/admin/products/a%20b%2Fc"
        );
    }

    #[test]
    fn raw_paths_gain_api_prefix() {
        assert_eq!(normalize_api_path(""), "/api");
        assert_eq!(normalize_api_path("/admin/orders"), "/api/admin/orders");
        assert_eq!(normalize_api_path("admin/orders"), "/api/admin/orders");
        assert_eq!(normalize_api_path("/api/admin/orders"), "/api/admin/orders");
        assert_eq!(normalize_api_path("/apiary"), "/api/apiary");
    }

    #[test]
    fn str_conversion_picks_variant() {
        assert_eq!(Endpoint::from("orders"), Endpoint::Named("orders"));
        assert_eq!(Endpoint::from("/admin/x"), Endpoint::Path("/admin/x"));
    }

    #[test]
    fn table_lists_parameterized_entries() {
        let table = EndpointTable::standard();
        assert!(table.is_parameterized("unsubscribeUser"));
        assert!(!table.is_parameterized("dashboard"));
        assert!(table.names().contains(&"reorderAlerts"));
    }
}
