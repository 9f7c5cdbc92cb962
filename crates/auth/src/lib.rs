//! `jinkops-auth`
//!
//! **Responsibility:** pure authorization core of the console.
//!
//! This crate is intentionally decoupled from HTTP and storage: it holds the
//! session data and the one predicate every consumer asks ("may this session
//! do X?").

pub mod authorize;
pub mod permissions;
pub mod roles;
pub mod session;

pub use authorize::{
    AuthzError, Decision, Requirement, authorize, derive_permissions, explain, has_permission,
    is_admin,
};
pub use permissions::{PermissionCode, PermissionSet};
pub use roles::{ROLE_ADMIN, is_admin_role, role_permission};
pub use session::{Session, SessionState};
