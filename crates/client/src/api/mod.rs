//! Management endpoints used by the console views.
//!
//! Thin request/response plumbing: one method per backend operation, all
//! reporting failures to the operator.

mod auth;
mod logs;
mod permissions;
mod rbac;
mod roles;
mod users;
