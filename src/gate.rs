//! Access gate and the console's route table.
//!
//! [`authorize`] is the pure decision; [`navigate`] is what the router does
//! with it. Neither performs navigation, they return where to go.

use crate::error::{ConsoleError, ConsoleResult};
use crate::models::{Identity, Role};

pub const LOGIN_PATH: &str = "/login";
pub const ROOT_PATH: &str = "/";
pub const ADMIN_LANDING: &str = "/admin";
pub const EMPLOYEE_LANDING: &str = "/employee";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectTo(String),
}

/// Decides whether `identity` may open a route requiring `required_roles`.
/// An empty role set only requires a signed-in user.
pub fn authorize(required_roles: &[Role], identity: Option<&Identity>) -> Decision {
    let Some(identity) = identity else {
        return Decision::RedirectTo(LOGIN_PATH.to_owned());
    };
    if !required_roles.is_empty()
        && !identity
            .role
            .is_some_and(|role| required_roles.contains(&role))
    {
        return Decision::RedirectTo(ROOT_PATH.to_owned());
    }
    Decision::Allow
}

/// Where a navigation lands when nothing more specific applies.
pub fn default_landing(identity: Option<&Identity>) -> &'static str {
    match identity {
        None => LOGIN_PATH,
        Some(identity) if identity.role == Some(Role::Admin) => ADMIN_LANDING,
        Some(_) => EMPLOYEE_LANDING,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub title: &'static str,
    /// Empty means public.
    pub roles: &'static [Role],
}

const ADMIN_ONLY: &[Role] = &[Role::Admin];
const EMPLOYEE_ONLY: &[Role] = &[Role::Employee];

pub const ROUTES: &[Route] = &[
    Route { path: LOGIN_PATH, title: "Sign in", roles: &[] },
    Route { path: ADMIN_LANDING, title: "Dashboard", roles: ADMIN_ONLY },
    Route { path: "/admin/employees", title: "Employees", roles: ADMIN_ONLY },
    Route { path: "/admin/assets", title: "Assets", roles: ADMIN_ONLY },
    Route { path: "/admin/allocations", title: "Allocations", roles: ADMIN_ONLY },
    Route { path: "/admin/service-requests", title: "Service Requests", roles: ADMIN_ONLY },
    Route { path: "/admin/audit-requests", title: "Audit Requests", roles: ADMIN_ONLY },
    Route { path: "/admin/admin-logs", title: "Admin Logs", roles: ADMIN_ONLY },
    Route { path: "/admin/profile", title: "Profile", roles: ADMIN_ONLY },
    Route { path: "/admin/settings", title: "Settings", roles: ADMIN_ONLY },
    Route { path: EMPLOYEE_LANDING, title: "My Dashboard", roles: EMPLOYEE_ONLY },
    Route { path: "/employee/my-assets", title: "My Assets", roles: EMPLOYEE_ONLY },
];

/// Case-insensitive lookup, ignoring a trailing slash.
pub fn find_route(path: &str) -> Option<&'static Route> {
    let path = path.trim();
    let path = if path.len() > 1 { path.trim_end_matches('/') } else { path };
    ROUTES.iter().find(|route| route.path.eq_ignore_ascii_case(path))
}

/// Resolves a navigation request to the path that should actually be shown.
///
/// Anonymous users always land on the login page. Unknown paths, the login
/// page itself and refused routes fall through to the identity's default
/// landing. Routes are checked against the identity's screen role, so a
/// signed-in user without a recognized role gets the employee screens.
pub fn navigate(path: &str, identity: Option<&Identity>) -> &'static str {
    let Some(identity) = identity else {
        return LOGIN_PATH;
    };
    let landing = default_landing(Some(identity));
    let viewer = screen_identity(identity);

    match find_route(path) {
        Some(route)
            if route.path != LOGIN_PATH
                && authorize(route.roles, Some(&viewer)) == Decision::Allow =>
        {
            route.path
        }
        _ => landing,
    }
}

/// Guard for a screen: the route when `identity` may open it, otherwise
/// [`ConsoleError::Forbidden`] naming where the console lands instead.
pub fn require(path: &str, identity: Option<&Identity>) -> ConsoleResult<&'static Route> {
    let route = find_route(path)
        .ok_or_else(|| ConsoleError::Validation(format!("no screen at {path}")))?;
    let viewer = identity.map(screen_identity);
    match authorize(route.roles, viewer.as_ref()) {
        Decision::Allow => Ok(route),
        Decision::RedirectTo(_) => Err(ConsoleError::Forbidden {
            title: route.title.to_owned(),
            redirect: navigate(path, identity).to_owned(),
        }),
    }
}

/// Any signed-in identity that is not Admin browses as Employee.
fn screen_identity(identity: &Identity) -> Identity {
    Identity {
        role: Some(identity.role.unwrap_or(Role::Employee)),
        ..identity.clone()
    }
}
