use jinkops_core::{ApiResult, RegisterRequest};

use crate::endpoints;
use crate::gateway::Reporting;
use crate::rest::RestClient;

impl RestClient {
    /// Self-service account creation (no token required).
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<()> {
        let _: Option<serde_json::Value> = self
            .post(self.url(endpoints::auth::REGISTER)?, request, Reporting::Report)
            .await?;
        Ok(())
    }
}
