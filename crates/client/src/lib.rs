//! `jinkops-client`
//!
//! **Responsibility:** everything that talks to the RBAC backend.
//!
//! This crate provides:
//! - the [`BackendGateway`] contract the session core depends on
//! - its REST implementation ([`RestClient`]) plus the management endpoints
//! - the durable credential mirror ([`SessionStore`])
//! - the operator notice seam ([`Notifier`])

pub mod api;
pub mod endpoints;
pub mod gateway;
pub mod notify;
pub mod rest;
pub mod store;

pub use gateway::{BackendGateway, Reporting};
pub use notify::{Notice, NoticeLevel, Notifier, RecordingNotifier};
pub use rest::{RestClient, RestConfig};
pub use store::{FileSessionStore, MemorySessionStore, PersistedSession, SessionStore, StoreError};
