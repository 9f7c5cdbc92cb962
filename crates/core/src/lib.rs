//! `jinkops-core`
//!
//! **Responsibility:** shared model of the RBAC admin console.
//!
//! This crate is **transport-agnostic**: entities, request bodies, the response
//! envelope and the error taxonomy. No I/O.

pub mod envelope;
pub mod error;
pub mod id;
pub mod model;
pub mod time;

pub use envelope::ApiResponse;
pub use error::{ApiError, ApiResult, ErrorKind};
pub use id::{LogId, PermissionId, RoleId, TraceId, UserId};
pub use model::{
    AdvancedLogQuery, AssignRolePermissionsRequest, AssignUserRolesRequest, LogQueryRequest,
    LoginRequest, LoginResponse, OperationLog, Page, Permission, PermissionCreateRequest,
    RegisterRequest, Role, RoleCreateRequest, RoleUpdateRequest, User, UserForm,
};
