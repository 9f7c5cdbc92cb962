use crate::PermissionCode;

/// Substring that marks a role as administrative.
pub const ADMIN_MARKER: &str = "ADMIN";

/// Synthesized code granted to every holder of the `ADMIN` role.
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

const ROLE_PREFIX: &str = "ROLE_";

/// Pseudo-permission implied by holding a role: `editor` -> `ROLE_EDITOR`.
pub fn role_permission(role_code: &str) -> PermissionCode {
    PermissionCode::new(format!("{ROLE_PREFIX}{role_code}"))
}

/// `true` when the role code contains `ADMIN` in any case
/// (`admin`, `SUPER_ADMIN`, `tenantAdmin`, ...).
pub fn is_admin_role(role_code: &str) -> bool {
    role_code.to_uppercase().contains(ADMIN_MARKER)
}
