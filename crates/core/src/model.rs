//! Backend entities and request bodies (JSON shapes of the REST API).
//!
//! Entities are read-only projections of backend truth: the console never
//! edits them in place, it re-fetches and replaces.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

use crate::id::{LogId, PermissionId, RoleId, UserId};

/// The backend emits `null` for empty collections and blank codes; treat both
/// as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A grantable capability, e.g. `sys:user:list`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[serde(default)]
    pub id: Option<PermissionId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
}

impl Permission {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            id: None,
            code: code.into(),
        }
    }

    pub fn with_id(mut self, id: PermissionId) -> Self {
        self.id = Some(id);
        self
    }
}

/// A named bundle of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[serde(default)]
    pub id: Option<RoleId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub permissions: Vec<Permission>,
}

impl Role {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            id: None,
            code: code.into(),
            permissions: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: RoleId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions.push(permission);
        self
    }
}

/// A user profile with its ordered role list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: Option<UserId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub roles: Vec<Role>,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    /// Profile used when the backend refuses to disclose the user's detail:
    /// a known name and no roles.
    pub fn stub(username: impl Into<String>) -> Self {
        Self::new(username)
    }

    pub fn with_id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    pub fn role_codes(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(|r| r.code.as_str())
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub last: bool,
    #[serde(default)]
    pub number_of_elements: u32,
    #[serde(default)]
    pub empty: bool,
}

/// An audited backend operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationLog {
    pub id: LogId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub trace_id: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub method_name: Option<String>,
    #[serde(default)]
    pub args: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub elapsed_time: i64,
    #[serde(default)]
    pub create_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub http_method: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Partial user body for create/update; absent fields are left untouched by
/// the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCreateRequest {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleUpdateRequest {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionCreateRequest {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignUserRolesRequest {
    pub user_id: UserId,
    pub role_ids: Vec<RoleId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRolePermissionsRequest {
    pub role_id: RoleId,
    pub permission_ids: Vec<PermissionId>,
}

/// Body of `POST logs/page`. Times use the `YYYY-MM-DDTHH:mm:ss` local format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogQueryRequest {
    pub page: u32,
    pub size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl Default for LogQueryRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: 10,
            keyword: None,
            start_time: None,
            end_time: None,
        }
    }
}

/// Query of `GET logs/search/advanced`; bounds are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedLogQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_detail_decodes_backend_shape() {
        let user: User = serde_json::from_value(json!({
            "id": 1,
            "username": "admin",
            "password": "$2a$10$hash",
            "email": "admin@test.com",
            "roles": [
                { "id": 1, "code": "ADMIN", "permissions": [
                    { "id": 1, "code": "sys:user:list" },
                    { "id": 2, "code": "sys:user:update" }
                ]}
            ]
        }))
        .unwrap();

        assert_eq!(user.id, Some(UserId::new(1)));
        assert_eq!(user.roles.len(), 1);
        assert_eq!(user.roles[0].permissions[1].code, "sys:user:update");
        assert_eq!(user.role_codes().collect::<Vec<_>>(), vec!["ADMIN"]);
    }

    #[test]
    fn nulls_become_empty() {
        let user: User = serde_json::from_value(json!({
            "username": "bob",
            "roles": [{ "code": null, "permissions": null }]
        }))
        .unwrap();

        assert_eq!(user.roles[0].code, "");
        assert!(user.roles[0].permissions.is_empty());

        let user: User = serde_json::from_value(json!({ "username": "bob", "roles": null })).unwrap();
        assert!(user.roles.is_empty());
    }

    #[test]
    fn stub_user_has_no_roles() {
        let user = User::stub("carol");
        assert_eq!(user.username, "carol");
        assert!(user.roles.is_empty());
        assert_eq!(user.id, None);
    }

    #[test]
    fn assign_requests_use_camel_case() {
        let body = serde_json::to_value(AssignUserRolesRequest {
            user_id: UserId::new(3),
            role_ids: vec![RoleId::new(1), RoleId::new(2)],
        })
        .unwrap();
        assert_eq!(body, json!({ "userId": 3, "roleIds": [1, 2] }));
    }

    #[test]
    fn operation_log_parses_local_timestamps() {
        let log: OperationLog = serde_json::from_value(json!({
            "id": 9,
            "username": "admin",
            "operation": "delete user",
            "traceId": "abc",
            "className": "UserController",
            "methodName": "deleteUser",
            "elapsedTime": 12,
            "createTime": "2025-03-01T08:30:00"
        }))
        .unwrap();

        assert_eq!(log.id, LogId::new(9));
        assert_eq!(log.elapsed_time, 12);
        assert_eq!(
            log.create_time.unwrap().format("%Y-%m-%d %H:%M").to_string(),
            "2025-03-01 08:30"
        );
    }

    #[test]
    fn user_form_omits_absent_fields() {
        let body = serde_json::to_value(UserForm {
            username: Some("dave".into()),
            ..UserForm::default()
        })
        .unwrap();
        assert_eq!(body, json!({ "username": "dave" }));
    }
}
