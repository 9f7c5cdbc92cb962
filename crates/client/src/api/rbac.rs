use jinkops_core::{ApiResult, AssignRolePermissionsRequest, AssignUserRolesRequest};

use crate::endpoints;
use crate::gateway::Reporting;
use crate::rest::RestClient;

impl RestClient {
    /// Replace the role set of a user.
    pub async fn assign_user_roles(&self, request: &AssignUserRolesRequest) -> ApiResult<()> {
        let _: Option<serde_json::Value> = self
            .post(self.url(endpoints::rbac::ASSIGN_USER_ROLES)?, request, Reporting::Report)
            .await?;
        Ok(())
    }

    /// Replace the permission set of a role.
    pub async fn assign_role_permissions(
        &self,
        request: &AssignRolePermissionsRequest,
    ) -> ApiResult<()> {
        let _: Option<serde_json::Value> = self
            .post(
                self.url(endpoints::rbac::ASSIGN_ROLE_PERMISSIONS)?,
                request,
                Reporting::Report,
            )
            .await?;
        Ok(())
    }
}
