use jinkops_core::{ApiResult, Permission, PermissionCreateRequest, PermissionId};

use crate::endpoints;
use crate::gateway::Reporting;
use crate::rest::{RestClient, required};

impl RestClient {
    pub async fn list_permissions(&self) -> ApiResult<Vec<Permission>> {
        let perms: Option<Vec<Permission>> = self
            .get(self.url(endpoints::permissions::BASE)?, &[], Reporting::Report)
            .await?;
        Ok(perms.unwrap_or_default())
    }

    pub async fn create_permission(&self, request: &PermissionCreateRequest) -> ApiResult<Permission> {
        let perm: Option<Permission> = self
            .post(self.url(endpoints::permissions::BASE)?, request, Reporting::Report)
            .await?;
        required(perm, "create permission")
    }

    pub async fn delete_permission(&self, id: PermissionId) -> ApiResult<()> {
        let url = self.url_with_segment(endpoints::permissions::BASE, &id.to_string())?;
        let _: Option<serde_json::Value> = self.delete(url, Reporting::Report).await?;
        Ok(())
    }
}
