//! Endpoint paths, relative to the configured base URL (which already ends in
//! `/api/`).

pub mod auth {
    pub const LOGIN: &str = "auth/login";
    pub const VERIFY: &str = "auth/verify";
    pub const REGISTER: &str = "auth/register";
}

pub mod users {
    pub const BASE: &str = "users";
    pub const PAGE: &str = "users/page";
    pub const REGISTER: &str = "users/register";
}

pub mod roles {
    pub const BASE: &str = "roles";
}

pub mod permissions {
    pub const BASE: &str = "permissions";
}

pub mod rbac {
    pub const ASSIGN_USER_ROLES: &str = "rbac/user-role/assign";
    pub const ASSIGN_ROLE_PERMISSIONS: &str = "rbac/role-permission/assign";
}

pub mod logs {
    pub const BASE: &str = "logs";
    pub const SEARCH: &str = "logs/search";
    pub const PAGE: &str = "logs/page";
    pub const ADVANCED: &str = "logs/search/advanced";
}

/// Header carrying the per-request correlation id.
pub const TRACE_HEADER: &str = "X-Trace-Id";
