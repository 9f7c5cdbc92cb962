use jinkops_core::{AdvancedLogQuery, ApiResult, LogQueryRequest, OperationLog, Page};

use crate::endpoints;
use crate::gateway::Reporting;
use crate::rest::{RestClient, required};

impl RestClient {
    /// Newest first.
    pub async fn logs(&self, page: u32, size: u32) -> ApiResult<Page<OperationLog>> {
        let logs: Option<Page<OperationLog>> = self
            .get(
                self.url(endpoints::logs::BASE)?,
                &[("page", page.to_string()), ("size", size.to_string())],
                Reporting::Report,
            )
            .await?;
        required(logs, "logs")
    }

    pub async fn search_logs(&self, keyword: &str, page: u32, size: u32) -> ApiResult<Page<OperationLog>> {
        let logs: Option<Page<OperationLog>> = self
            .get(
                self.url(endpoints::logs::SEARCH)?,
                &[
                    ("keyword", keyword.to_string()),
                    ("page", page.to_string()),
                    ("size", size.to_string()),
                ],
                Reporting::Report,
            )
            .await?;
        required(logs, "search logs")
    }

    pub async fn page_logs(&self, query: &LogQueryRequest) -> ApiResult<Page<OperationLog>> {
        let logs: Option<Page<OperationLog>> = self
            .post(self.url(endpoints::logs::PAGE)?, query, Reporting::Report)
            .await?;
        required(logs, "page logs")
    }

    pub async fn advanced_search_logs(&self, query: &AdvancedLogQuery) -> ApiResult<Vec<OperationLog>> {
        let mut params = Vec::new();
        if let Some(keyword) = &query.keyword {
            params.push(("keyword", keyword.clone()));
        }
        if let Some(start) = query.start_time {
            params.push(("startTime", start.to_string()));
        }
        if let Some(end) = query.end_time {
            params.push(("endTime", end.to_string()));
        }
        let logs: Option<Vec<OperationLog>> = self
            .get(self.url(endpoints::logs::ADVANCED)?, &params, Reporting::Report)
            .await?;
        Ok(logs.unwrap_or_default())
    }
}
