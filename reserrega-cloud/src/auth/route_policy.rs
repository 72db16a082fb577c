//! Declarative route policy
//!
//! One table, evaluated once per request by the account gate. Rows are
//! checked in order and the first match wins; unlisted paths only need an
//! authenticated session.

use shared::account::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No session required
    Public,
    /// Any signed-in user
    Authenticated,
    /// Signed-in user holding one of these roles
    Roles(&'static [Role]),
}

impl Access {
    pub fn allows(&self, role: Role) -> bool {
        match self {
            Access::Public | Access::Authenticated => true,
            Access::Roles(roles) => roles.contains(&role),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMatch {
    Exact(&'static str),
    /// The path itself or anything below it (`/settings`, `/settings/x`)
    Prefix(&'static str),
}

impl PathMatch {
    pub fn matches(&self, path: &str) -> bool {
        match *self {
            PathMatch::Exact(p) => path == p,
            PathMatch::Prefix(p) => {
                path == p || (path.starts_with(p) && path[p.len()..].starts_with('/'))
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RouteRule {
    pub path: PathMatch,
    pub access: Access,
}

const ADMIN: &[Role] = &[Role::Admin];
const STORE_STAFF: &[Role] = &[Role::Seller, Role::Admin];

pub const ROUTE_POLICY: &[RouteRule] = &[
    RouteRule { path: PathMatch::Exact("/health"), access: Access::Public },
    RouteRule { path: PathMatch::Exact("/login"), access: Access::Public },
    RouteRule { path: PathMatch::Exact("/api/auth/login"), access: Access::Public },
    RouteRule { path: PathMatch::Exact("/api/auth/logout"), access: Access::Public },
    RouteRule { path: PathMatch::Exact("/stripe/webhook"), access: Access::Public },
    // Harness handlers check the environment themselves
    RouteRule { path: PathMatch::Prefix("/api/dev"), access: Access::Public },
    RouteRule { path: PathMatch::Prefix("/settings"), access: Access::Roles(ADMIN) },
    RouteRule { path: PathMatch::Prefix("/api/settings"), access: Access::Roles(ADMIN) },
    RouteRule { path: PathMatch::Prefix("/store"), access: Access::Roles(STORE_STAFF) },
    RouteRule { path: PathMatch::Prefix("/api/store"), access: Access::Roles(STORE_STAFF) },
];

pub fn resolve(path: &str) -> Access {
    ROUTE_POLICY
        .iter()
        .find(|rule| rule.path.matches(path))
        .map_or(Access::Authenticated, |rule| rule.access)
}

/// JSON API paths get status codes; everything else is a page and gets redirects
pub fn is_api_path(path: &str) -> bool {
    PathMatch::Prefix("/api").matches(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_paths() {
        for path in ["/health", "/login", "/api/auth/login", "/stripe/webhook", "/api/dev/time"] {
            assert_eq!(resolve(path), Access::Public, "{path}");
        }
    }

    #[test]
    fn test_prefix_respects_segments() {
        assert_eq!(resolve("/settings"), Access::Roles(ADMIN));
        assert_eq!(resolve("/settings/billing"), Access::Roles(ADMIN));
        assert_eq!(resolve("/settingsx"), Access::Authenticated);
        assert_eq!(resolve("/storefront"), Access::Authenticated);
        assert_eq!(resolve("/login/extra"), Access::Authenticated);
    }

    #[test]
    fn test_role_access() {
        let store = resolve("/api/store/reservations");
        assert!(store.allows(Role::Seller));
        assert!(store.allows(Role::Admin));
        assert!(!store.allows(Role::Buyer));

        let settings = resolve("/api/settings");
        assert!(settings.allows(Role::Admin));
        assert!(!settings.allows(Role::Seller));

        assert!(resolve("/dashboard").allows(Role::Buyer));
    }

    #[test]
    fn test_api_path_detection() {
        assert!(is_api_path("/api/subscription"));
        assert!(is_api_path("/api"));
        assert!(!is_api_path("/apiary"));
        assert!(!is_api_path("/dashboard"));
    }
}
