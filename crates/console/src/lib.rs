//! `jinkops-console`
//!
//! **Responsibility:** the operator-facing side of the RBAC console.
//!
//! This crate provides:
//! - the session controller (login / bootstrap / logout, permission checks)
//! - the navigation guard, route table and router
//! - the permission gate over declarative views
//! - configuration, wiring ([`Console`]) and the `jinkops` CLI

pub mod app;
pub mod cli;
pub mod config;
pub mod controller;
pub mod gate;
pub mod guard;
pub mod router;
pub mod routes;
pub mod views;

#[cfg(test)]
mod test_support;

pub use app::{Console, ConsoleError, Screen};
pub use config::{ConfigError, ConsoleConfig};
pub use controller::{BootstrapMode, SessionController};
pub use gate::{MountedView, NodeKind, PermissionGate, ViewNode};
pub use guard::{GuardDecision, NavigationGuard};
pub use router::{MAX_REDIRECTS, Navigation, NavigationError, Router};
pub use routes::{LANDING_PATH, LOGIN_PATH, Route, RouteTable};
