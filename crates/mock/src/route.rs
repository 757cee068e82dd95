//! Path-shape classification of intercepted calls
//!
//! Every call the storefront makes is first mapped to a [`RouteKind`] by the
//! shape of its path alone. Segments are compared exactly, ids must be
//! numeric, and the whole remainder after the `api` segment has to match, so
//! a longer pattern can never be swallowed by a shorter one
//! (`/api/order/menu` is never `/api/order`).

use pizza_common::EntityId;

/// One category of backend call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// `/api/auth`
    Auth,
    /// `/api/user/me`
    CurrentUser,
    /// `/api/order/menu`
    Menu,
    /// `/api/franchise`
    Franchises,
    /// `/api/franchise/{id}`
    Franchise { id: EntityId },
    /// `/api/franchise/{id}/store`
    Stores { franchise_id: EntityId },
    /// `/api/franchise/{id}/store/{id}`
    Store { franchise_id: EntityId, store_id: EntityId },
    /// `/api/order`
    Orders,
    /// `/api/order/verify`
    OrderVerify,
    /// `/api/docs`
    Docs,
}

/// Interception patterns in JavaScript regex-literal form, one per
/// [`RouteKind`]. The browser layer registers exactly these.
pub const JS_ROUTE_PATTERNS: &[&str] = &[
    r"/\/api\/auth(\?.*)?$/",
    r"/\/api\/user\/me(\?.*)?$/",
    r"/\/api\/order\/menu(\?.*)?$/",
    r"/\/api\/franchise(\?.*)?$/",
    r"/\/api\/franchise\/\d+(\?.*)?$/",
    r"/\/api\/franchise\/\d+\/store(\?.*)?$/",
    r"/\/api\/franchise\/\d+\/store\/\d+(\?.*)?$/",
    r"/\/api\/order(\?.*)?$/",
    r"/\/api\/order\/verify(\?.*)?$/",
    r"/\/api\/docs(\?.*)?$/",
];

impl RouteKind {
    /// Classify a request path. Any query string is ignored. Returns `None`
    /// for calls no pattern covers.
    pub fn classify(path: &str) -> Option<Self> {
        let path = path.split_once('?').map_or(path, |(p, _)| p);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let api = segments.iter().position(|s| *s == "api")?;

        match &segments[api + 1..] {
            ["auth"] => Some(Self::Auth),
            ["user", "me"] => Some(Self::CurrentUser),
            ["order", "menu"] => Some(Self::Menu),
            ["order", "verify"] => Some(Self::OrderVerify),
            ["order"] => Some(Self::Orders),
            ["franchise"] => Some(Self::Franchises),
            ["franchise", id] => Some(Self::Franchise { id: numeric(id)? }),
            ["franchise", id, "store"] => Some(Self::Stores {
                franchise_id: numeric(id)?,
            }),
            ["franchise", id, "store", store] => Some(Self::Store {
                franchise_id: numeric(id)?,
                store_id: numeric(store)?,
            }),
            ["docs"] => Some(Self::Docs),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RouteKind::Auth => "auth",
            RouteKind::CurrentUser => "current-user",
            RouteKind::Menu => "menu",
            RouteKind::Franchises => "franchise-list",
            RouteKind::Franchise { .. } => "franchise-by-owner",
            RouteKind::Stores { .. } => "store-create",
            RouteKind::Store { .. } => "store-delete",
            RouteKind::Orders => "orders",
            RouteKind::OrderVerify => "order-verify",
            RouteKind::Docs => "docs",
        }
    }
}

fn numeric(segment: &str) -> Option<EntityId> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_segments() {
        assert_eq!(RouteKind::classify("/api/auth"), Some(RouteKind::Auth));
        assert_eq!(RouteKind::classify("/api/user/me"), Some(RouteKind::CurrentUser));
        assert_eq!(RouteKind::classify("/api/docs"), Some(RouteKind::Docs));
    }

    #[test]
    fn test_longer_pattern_wins() {
        assert_eq!(RouteKind::classify("/api/order"), Some(RouteKind::Orders));
        assert_eq!(RouteKind::classify("/api/order/menu"), Some(RouteKind::Menu));
        assert_eq!(RouteKind::classify("/api/order/verify"), Some(RouteKind::OrderVerify));
        assert_eq!(
            RouteKind::classify("/api/franchise/1/store"),
            Some(RouteKind::Stores { franchise_id: 1 })
        );
        assert_eq!(
            RouteKind::classify("/api/franchise/1/store/2"),
            Some(RouteKind::Store { franchise_id: 1, store_id: 2 })
        );
    }

    #[test]
    fn test_query_string_ignored() {
        assert_eq!(
            RouteKind::classify("/api/franchise?page=0&limit=10&name=*"),
            Some(RouteKind::Franchises)
        );
        assert_eq!(RouteKind::classify("/api/franchise/4?x=1"), Some(RouteKind::Franchise { id: 4 }));
    }

    #[test]
    fn test_ids_must_be_numeric() {
        assert_eq!(RouteKind::classify("/api/franchise/abc"), None);
        assert_eq!(RouteKind::classify("/api/franchise/1/store/+2"), None);
        assert_eq!(RouteKind::classify("/api/franchise/-1"), None);
    }

    #[test]
    fn test_unmatched_calls() {
        assert_eq!(RouteKind::classify("/"), None);
        assert_eq!(RouteKind::classify("/api"), None);
        assert_eq!(RouteKind::classify("/api/user"), None);
        assert_eq!(RouteKind::classify("/api/order/menu/extra"), None);
        assert_eq!(RouteKind::classify("/assets/index.js"), None);
    }

    #[test]
    fn test_prefix_before_api() {
        assert_eq!(RouteKind::classify("/service/api/auth"), Some(RouteKind::Auth));
        assert_eq!(RouteKind::classify("/api/auth/"), Some(RouteKind::Auth));
    }

    #[test]
    fn test_one_js_pattern_per_kind() {
        assert_eq!(JS_ROUTE_PATTERNS.len(), 10);
        for pattern in JS_ROUTE_PATTERNS {
            assert!(pattern.starts_with(r"/\/api\/"));
            assert!(pattern.ends_with("$/"));
        }
    }
}
