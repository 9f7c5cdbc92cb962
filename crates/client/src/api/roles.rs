use jinkops_core::{ApiResult, Role, RoleCreateRequest, RoleId, RoleUpdateRequest};

use crate::endpoints;
use crate::gateway::Reporting;
use crate::rest::{RestClient, required};

impl RestClient {
    pub async fn list_roles(&self) -> ApiResult<Vec<Role>> {
        let roles: Option<Vec<Role>> = self
            .get(self.url(endpoints::roles::BASE)?, &[], Reporting::Report)
            .await?;
        Ok(roles.unwrap_or_default())
    }

    pub async fn create_role(&self, request: &RoleCreateRequest) -> ApiResult<Role> {
        let role: Option<Role> = self
            .post(self.url(endpoints::roles::BASE)?, request, Reporting::Report)
            .await?;
        required(role, "create role")
    }

    pub async fn update_role(&self, id: RoleId, request: &RoleUpdateRequest) -> ApiResult<Role> {
        let url = self.url_with_segment(endpoints::roles::BASE, &id.to_string())?;
        let role: Option<Role> = self.put(url, request, Reporting::Report).await?;
        required(role, "update role")
    }

    pub async fn delete_role(&self, id: RoleId) -> ApiResult<()> {
        let url = self.url_with_segment(endpoints::roles::BASE, &id.to_string())?;
        let _: Option<serde_json::Value> = self.delete(url, Reporting::Report).await?;
        Ok(())
    }
}
