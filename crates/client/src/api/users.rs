use jinkops_core::{ApiResult, Page, User, UserForm};

use crate::endpoints;
use crate::gateway::Reporting;
use crate::rest::{RestClient, required};

impl RestClient {
    pub async fn list_users(&self) -> ApiResult<Vec<User>> {
        let users: Option<Vec<User>> = self
            .get(self.url(endpoints::users::BASE)?, &[], Reporting::Report)
            .await?;
        Ok(users.unwrap_or_default())
    }

    pub async fn get_user(&self, username: &str) -> ApiResult<User> {
        let user: Option<User> = self
            .get(
                self.url_with_segment(endpoints::users::BASE, username)?,
                &[],
                Reporting::Report,
            )
            .await?;
        required(user, "get user")
    }

    pub async fn create_user(&self, form: &UserForm) -> ApiResult<User> {
        let user: Option<User> = self
            .post(self.url(endpoints::users::BASE)?, form, Reporting::Report)
            .await?;
        required(user, "create user")
    }

    /// Admin-side registration (`users/register`), distinct from `auth/register`.
    pub async fn register_user(&self, form: &UserForm) -> ApiResult<User> {
        let user: Option<User> = self
            .post(self.url(endpoints::users::REGISTER)?, form, Reporting::Report)
            .await?;
        required(user, "register user")
    }

    pub async fn update_user(&self, form: &UserForm) -> ApiResult<User> {
        let user: Option<User> = self
            .put(self.url(endpoints::users::BASE)?, form, Reporting::Report)
            .await?;
        required(user, "update user")
    }

    pub async fn delete_user(&self, username: &str) -> ApiResult<()> {
        let _: Option<serde_json::Value> = self
            .delete(
                self.url_with_segment(endpoints::users::BASE, username)?,
                Reporting::Report,
            )
            .await?;
        Ok(())
    }

    pub async fn page_users(&self, page: u32, size: u32) -> ApiResult<Page<User>> {
        let page: Option<Page<User>> = self
            .get(
                self.url(endpoints::users::PAGE)?,
                &[("page", page.to_string()), ("size", size.to_string())],
                Reporting::Report,
            )
            .await?;
        required(page, "page users")
    }
}
