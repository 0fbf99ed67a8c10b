//! Route registry and access requirements.
//!
//! - Public: no session token
//! - Member: valid session token for a loginable member
//! - AtLeast(role): member whose role is `role` or higher

use crate::domain::principal::Role;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Access requirement declared by a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Public,
    Member,
    AtLeast(Role),
}

impl Access {
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Access::Public)
    }

    /// Minimum role beyond plain membership, if any.
    pub fn required_role(&self) -> Option<Role> {
        match self {
            Access::AtLeast(role) => Some(*role),
            _ => None,
        }
    }
}

/// Route metadata
#[derive(Debug, Clone)]
pub struct RouteInfo {
    pub name: &'static str,
    pub access: Access,
    pub description: &'static str,
}

impl RouteInfo {
    const fn new(name: &'static str, access: Access, description: &'static str) -> Self {
        Self {
            name,
            access,
            description,
        }
    }
}

pub mod names {
    pub const SIGNUP: &str = "members.signup";
    pub const LOGIN: &str = "members.login";
    pub const SOCIAL_LOGIN: &str = "members.social_login";
    pub const VERIFY_TOKEN: &str = "members.verify_token";
    pub const ME: &str = "members.me";
    pub const UPDATE: &str = "members.update";
    pub const DEREGISTER: &str = "members.deregister";
    pub const FIND_MEMBER: &str = "members.find";
}

pub static ROUTE_REGISTRY: LazyLock<HashMap<&'static str, RouteInfo>> = LazyLock::new(|| {
    [
        RouteInfo::new(names::SIGNUP, Access::Public, "Create a member account"),
        RouteInfo::new(names::LOGIN, Access::Public, "Exchange credentials for a session token"),
        RouteInfo::new(
            names::SOCIAL_LOGIN,
            Access::Public,
            "Exchange an identity provider code for a session token",
        ),
        RouteInfo::new(names::VERIFY_TOKEN, Access::Public, "Validate a session token"),
        RouteInfo::new(names::ME, Access::Member, "Current member profile"),
        RouteInfo::new(names::UPDATE, Access::Member, "Change own nickname, name or password"),
        RouteInfo::new(
            names::DEREGISTER,
            Access::Member,
            "Deregister own account; admins may name another member",
        ),
        RouteInfo::new(
            names::FIND_MEMBER,
            Access::AtLeast(Role::Manager),
            "Look up any member",
        ),
    ]
    .into_iter()
    .map(|info| (info.name, info))
    .collect()
});

pub fn get_route_info(route: &str) -> Option<&'static RouteInfo> {
    ROUTE_REGISTRY.get(route)
}

pub fn is_route_supported(route: &str) -> bool {
    ROUTE_REGISTRY.contains_key(route)
}
