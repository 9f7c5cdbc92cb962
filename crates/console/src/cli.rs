//! `jinkops` command line.
//!
//! Every management command first opens the route that owns it, so the
//! navigation guard (and its bootstrap) runs exactly as it would for a page
//! visit, and then checks that the gate kept the action it is about to use.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{Local, TimeZone};
use clap::{Args, Parser, Subcommand};
use jinkops_auth::authorize;
use jinkops_client::{Notice, NoticeLevel, Notifier};
use jinkops_core::time::{format_display, format_local, parse_local};
use jinkops_core::{
    AdvancedLogQuery, AssignRolePermissionsRequest, AssignUserRolesRequest, LogQueryRequest,
    OperationLog, Page, Permission, PermissionCreateRequest, PermissionId, RegisterRequest, Role,
    RoleCreateRequest, RoleId, RoleUpdateRequest, User, UserForm, UserId,
};
use serde::Serialize;

use crate::app::{Console, Screen};
use crate::config::ConsoleConfig;
use crate::routes::LOGIN_PATH;
use crate::views;

#[derive(Debug, Parser)]
#[command(name = "jinkops", version, about = "RBAC admin console")]
pub struct Cli {
    /// Backend base URL, e.g. http://localhost:8080/api/
    #[arg(long, global = true)]
    pub api_base_url: Option<String>,

    /// File holding the persisted token and username.
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    #[arg(long, global = true)]
    pub request_timeout_ms: Option<u64>,

    #[arg(long, global = true)]
    pub bootstrap_timeout_ms: Option<u64>,

    /// Let overlapping bootstraps run independently (last one wins).
    #[arg(long, global = true)]
    pub no_coalesce: bool,

    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Flags win over the environment.
    pub fn apply(&self, mut config: ConsoleConfig) -> ConsoleConfig {
        if let Some(url) = &self.api_base_url {
            config.api_base_url = url.clone();
        }
        if let Some(path) = &self.session_file {
            config.session_file = path.clone();
        }
        if let Some(ms) = self.request_timeout_ms.filter(|ms| *ms > 0) {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.bootstrap_timeout_ms.filter(|ms| *ms > 0) {
            config.bootstrap_timeout = Duration::from_millis(ms);
        }
        if self.no_coalesce {
            config.coalesce_bootstrap = false;
        }
        config
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and persist the session.
    Login {
        #[arg(long, short)]
        username: String,
        /// Read from stdin when omitted.
        #[arg(long, env = "JINKOPS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Self-service account registration.
    Register(NewAccount),
    Logout,
    /// Show the signed-in user and what they may do.
    Whoami,
    /// Navigate to a console path and render the mounted view.
    Open { path: String },
    #[command(subcommand)]
    Users(UsersCommand),
    #[command(subcommand)]
    Roles(RolesCommand),
    #[command(subcommand)]
    Permissions(PermissionsCommand),
    #[command(subcommand)]
    Rbac(RbacCommand),
    #[command(subcommand)]
    Logs(LogsCommand),
}

#[derive(Debug, Args)]
pub struct NewAccount {
    #[arg(long, short)]
    pub username: String,
    #[arg(long, env = "JINKOPS_PASSWORD", hide_env_values = true)]
    pub password: String,
    #[arg(long)]
    pub email: Option<String>,
}

#[derive(Debug, Args)]
pub struct Paging {
    #[arg(long, default_value_t = 0)]
    pub page: u32,
    #[arg(long, default_value_t = 10)]
    pub size: u32,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    List,
    Get { username: String },
    Page(Paging),
    Create(NewAccount),
    Update {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    Delete { username: String },
    /// Admin-side registration.
    Register(NewAccount),
}

#[derive(Debug, Subcommand)]
pub enum RolesCommand {
    List,
    Create { code: String },
    Update { id: i64, code: String },
    Delete { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum PermissionsCommand {
    List,
    Create { code: String },
    Delete { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum RbacCommand {
    AssignRoles {
        #[arg(long)]
        user_id: i64,
        #[arg(long, value_delimiter = ',')]
        role_ids: Vec<i64>,
    },
    AssignPermissions {
        #[arg(long)]
        role_id: i64,
        #[arg(long, value_delimiter = ',')]
        permission_ids: Vec<i64>,
    },
}

#[derive(Debug, Subcommand)]
pub enum LogsCommand {
    List(Paging),
    Search {
        keyword: String,
        #[command(flatten)]
        paging: Paging,
    },
    Page {
        #[command(flatten)]
        paging: Paging,
        #[arg(long)]
        keyword: Option<String>,
        /// `YYYY-MM-DD HH:mm:ss` or `YYYY-MM-DDTHH:mm:ss`
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    Advanced {
        #[arg(long)]
        keyword: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
}

/// Run one command against `console`, writing results to `out`.
pub async fn run(console: &Console, command: Command, json: bool, out: &mut dyn Write) -> Result<()> {
    let mut printer = Printer { as_json: json, out };
    match command {
        Command::Login { username, password } => {
            let password = match password {
                Some(p) => p,
                None => read_password()?,
            };
            console
                .controller()
                .login(&username, &password)
                .await
                .context("login failed")?;
            let permissions = console.session().permissions();
            printer.line(&format!(
                "Signed in as {} ({} permissions{})",
                console.session().username(),
                permissions.len(),
                if console.controller().is_admin() { ", admin" } else { "" }
            ))
        }
        Command::Register(account) => {
            console
                .client()
                .register(&RegisterRequest {
                    username: account.username.clone(),
                    password: account.password,
                    email: account.email,
                })
                .await
                .context("registration failed")?;
            printer.line(&format!("Registered {}", account.username))
        }
        Command::Logout => {
            console.controller().logout();
            printer.line("Signed out")
        }
        Command::Whoami => {
            let screen = enter(console, "/overview", None).await?;
            printer.text(&screen.render())
        }
        Command::Open { path } => {
            let screen = console.open(&path).await?;
            printer.text(&screen.render())
        }
        Command::Users(cmd) => users(console, cmd, &mut printer).await,
        Command::Roles(cmd) => roles(console, cmd, &mut printer).await,
        Command::Permissions(cmd) => permissions(console, cmd, &mut printer).await,
        Command::Rbac(cmd) => rbac(console, cmd, &mut printer).await,
        Command::Logs(cmd) => logs(console, cmd, &mut printer).await,
    }
}

/// Open `path` and require that navigation ends there with `action` mounted.
async fn enter(console: &Console, path: &str, action: Option<&str>) -> Result<Screen> {
    let screen = console.open(path).await?;
    if !screen.arrived_at(path) {
        if screen.arrived_at(LOGIN_PATH) {
            bail!("not signed in; run `jinkops login` first");
        }
        bail!(
            "access to {path} denied (redirected to {})",
            screen.navigation.path()
        );
    }
    if let Some(action) = action {
        if !screen.contains(action) {
            let reason = console.session().read(|state| {
                let required = screen
                    .navigation
                    .route()
                    .and_then(|route| views::for_route(route, state))
                    .and_then(|view| view.find(action).map(|node| node.requires.clone()))?;
                authorize(state, &required).err()
            });
            match reason {
                Some(reason) => bail!("permission denied: '{action}' ({reason})"),
                None => bail!("permission denied: '{action}' is not available to this account"),
            }
        }
    }
    Ok(screen)
}

async fn users(console: &Console, cmd: UsersCommand, printer: &mut Printer<'_>) -> Result<()> {
    let client = console.client();
    match cmd {
        UsersCommand::List => {
            enter(console, "/users", Some("List users")).await?;
            printer.users(&client.list_users().await?)
        }
        UsersCommand::Get { username } => {
            enter(console, "/users", Some("List users")).await?;
            printer.users(&[client.get_user(&username).await?])
        }
        UsersCommand::Page(paging) => {
            enter(console, "/users", Some("Page through users")).await?;
            let page = client.page_users(paging.page, paging.size).await?;
            printer.page(&page, |p, items| p.users(items))
        }
        UsersCommand::Create(account) => {
            enter(console, "/users", Some("Create user")).await?;
            let user = client.create_user(&account_form(account)).await?;
            printer.users(&[user])
        }
        UsersCommand::Register(account) => {
            enter(console, "/users", Some("Create user")).await?;
            let user = client.register_user(&account_form(account)).await?;
            printer.users(&[user])
        }
        UsersCommand::Update {
            id,
            username,
            password,
            email,
        } => {
            enter(console, "/users", Some("Edit user")).await?;
            let form = UserForm {
                id: Some(UserId::new(id)),
                username,
                password,
                email,
            };
            printer.users(&[client.update_user(&form).await?])
        }
        UsersCommand::Delete { username } => {
            enter(console, "/users", Some("Delete user")).await?;
            client.delete_user(&username).await?;
            printer.line(&format!("Deleted user {username}"))
        }
    }
}

async fn roles(console: &Console, cmd: RolesCommand, printer: &mut Printer<'_>) -> Result<()> {
    let client = console.client();
    match cmd {
        RolesCommand::List => {
            enter(console, "/roles", Some("List roles")).await?;
            printer.roles(&client.list_roles().await?)
        }
        RolesCommand::Create { code } => {
            enter(console, "/roles", Some("Create role")).await?;
            printer.roles(&[client.create_role(&RoleCreateRequest { code }).await?])
        }
        RolesCommand::Update { id, code } => {
            enter(console, "/roles", Some("Edit role")).await?;
            let role = client
                .update_role(RoleId::new(id), &RoleUpdateRequest { code })
                .await?;
            printer.roles(&[role])
        }
        RolesCommand::Delete { id } => {
            enter(console, "/roles", Some("Delete role")).await?;
            client.delete_role(RoleId::new(id)).await?;
            printer.line(&format!("Deleted role {id}"))
        }
    }
}

async fn permissions(console: &Console, cmd: PermissionsCommand, printer: &mut Printer<'_>) -> Result<()> {
    let client = console.client();
    match cmd {
        PermissionsCommand::List => {
            enter(console, "/permissions", Some("List permissions")).await?;
            printer.permissions(&client.list_permissions().await?)
        }
        PermissionsCommand::Create { code } => {
            enter(console, "/permissions", Some("Create permission")).await?;
            let created = client
                .create_permission(&PermissionCreateRequest { code })
                .await?;
            printer.permissions(&[created])
        }
        PermissionsCommand::Delete { id } => {
            enter(console, "/permissions", Some("Delete permission")).await?;
            client.delete_permission(PermissionId::new(id)).await?;
            printer.line(&format!("Deleted permission {id}"))
        }
    }
}

async fn rbac(console: &Console, cmd: RbacCommand, printer: &mut Printer<'_>) -> Result<()> {
    let client = console.client();
    match cmd {
        RbacCommand::AssignRoles { user_id, role_ids } => {
            enter(console, "/users", Some("Assign roles")).await?;
            client
                .assign_user_roles(&AssignUserRolesRequest {
                    user_id: UserId::new(user_id),
                    role_ids: role_ids.into_iter().map(RoleId::new).collect(),
                })
                .await?;
            printer.line(&format!("Roles assigned to user {user_id}"))
        }
        RbacCommand::AssignPermissions {
            role_id,
            permission_ids,
        } => {
            enter(console, "/roles", Some("Assign permissions")).await?;
            client
                .assign_role_permissions(&AssignRolePermissionsRequest {
                    role_id: RoleId::new(role_id),
                    permission_ids: permission_ids.into_iter().map(PermissionId::new).collect(),
                })
                .await?;
            printer.line(&format!("Permissions assigned to role {role_id}"))
        }
    }
}

async fn logs(console: &Console, cmd: LogsCommand, printer: &mut Printer<'_>) -> Result<()> {
    let client = console.client();
    enter(console, "/logs", None).await?;
    match cmd {
        LogsCommand::List(paging) => {
            let page = client.logs(paging.page, paging.size).await?;
            printer.page(&page, |p, items| p.logs(items))
        }
        LogsCommand::Search { keyword, paging } => {
            let page = client.search_logs(&keyword, paging.page, paging.size).await?;
            printer.page(&page, |p, items| p.logs(items))
        }
        LogsCommand::Page {
            paging,
            keyword,
            start,
            end,
        } => {
            let query = LogQueryRequest {
                page: paging.page,
                size: paging.size,
                keyword,
                start_time: start.as_deref().map(local_bound).transpose()?,
                end_time: end.as_deref().map(local_bound).transpose()?,
            };
            let page = client.page_logs(&query).await?;
            printer.page(&page, |p, items| p.logs(items))
        }
        LogsCommand::Advanced {
            keyword,
            start,
            end,
        } => {
            let query = AdvancedLogQuery {
                keyword,
                start_time: start.as_deref().map(epoch_bound).transpose()?,
                end_time: end.as_deref().map(epoch_bound).transpose()?,
            };
            printer.logs(&client.advanced_search_logs(&query).await?)
        }
    }
}

fn account_form(account: NewAccount) -> UserForm {
    UserForm {
        id: None,
        username: Some(account.username),
        password: Some(account.password),
        email: account.email,
    }
}

/// Normalize an operator-typed bound to `YYYY-MM-DDTHH:mm:ss`.
pub(crate) fn local_bound(raw: &str) -> Result<String> {
    let parsed = parse_local(raw).with_context(|| format!("invalid time '{raw}'"))?;
    Ok(format_local(Some(parsed)))
}

/// Operator-typed local time as epoch milliseconds.
pub(crate) fn epoch_bound(raw: &str) -> Result<i64> {
    let parsed = parse_local(raw).with_context(|| format!("invalid time '{raw}'"))?;
    let local = Local
        .from_local_datetime(&parsed)
        .earliest()
        .with_context(|| format!("'{raw}' does not exist in the local time zone"))?;
    Ok(local.timestamp_millis())
}

fn read_password() -> Result<String> {
    let password =
        rpassword::prompt_password("Password: ").context("failed to read password")?;
    checked_password(password)
}

fn checked_password(password: String) -> Result<String> {
    let password = password.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("password must not be empty");
    }
    Ok(password)
}

/// Operator notices on stderr, keeping stdout for command output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, notice: Notice) {
        let prefix = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        eprintln!("{prefix}: {}", notice.message);
    }
}

struct Printer<'a> {
    as_json: bool,
    out: &'a mut dyn Write,
}

impl Printer<'_> {
    fn line(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{text}")?;
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<()> {
        write!(self.out, "{text}")?;
        Ok(())
    }

    fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer_pretty(&mut *self.out, value)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn page<T: Serialize>(&mut self, page: &Page<T>, items: impl FnOnce(&mut Self, &[T]) -> Result<()>) -> Result<()> {
        if self.as_json {
            return self.json(page);
        }
        items(self, &page.content)?;
        self.line(&format!(
            "page {}/{} ({} total)",
            page.number + 1,
            page.total_pages.max(1),
            page.total_elements
        ))
    }

    fn users(&mut self, users: &[User]) -> Result<()> {
        if self.as_json {
            return self.json(users);
        }
        for user in users {
            let id = user.id.map(|id| id.to_string()).unwrap_or_else(|| "-".into());
            let roles = user.role_codes().collect::<Vec<_>>().join(",");
            self.line(&format!(
                "{id:>5}  {:<20} {:<28} {roles}",
                user.username,
                user.email.as_deref().unwrap_or("")
            ))?;
        }
        Ok(())
    }

    fn roles(&mut self, roles: &[Role]) -> Result<()> {
        if self.as_json {
            return self.json(roles);
        }
        for role in roles {
            let id = role.id.map(|id| id.to_string()).unwrap_or_else(|| "-".into());
            let codes: Vec<&str> = role.permissions.iter().map(|p| p.code.as_str()).collect();
            self.line(&format!("{id:>5}  {:<20} {}", role.code, codes.join(",")))?;
        }
        Ok(())
    }

    fn permissions(&mut self, permissions: &[Permission]) -> Result<()> {
        if self.as_json {
            return self.json(permissions);
        }
        for permission in permissions {
            let id = permission.id.map(|id| id.to_string()).unwrap_or_else(|| "-".into());
            self.line(&format!("{id:>5}  {}", permission.code))?;
        }
        Ok(())
    }

    fn logs(&mut self, logs: &[OperationLog]) -> Result<()> {
        if self.as_json {
            return self.json(logs);
        }
        for log in logs {
            self.line(&format!(
                "{}  {:<12} {:<24} {:>6}ms  {}",
                format_display(log.create_time),
                log.username.as_deref().unwrap_or("-"),
                log.operation.as_deref().unwrap_or("-"),
                log.elapsed_time,
                log.trace_id.as_deref().unwrap_or("")
            ))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_nested_commands() {
        let cli = Cli::try_parse_from([
            "jinkops",
            "rbac",
            "assign-roles",
            "--user-id",
            "7",
            "--role-ids",
            "1,2",
        ])
        .unwrap();
        match cli.command {
            Command::Rbac(RbacCommand::AssignRoles { user_id, role_ids }) => {
                assert_eq!(user_id, 7);
                assert_eq!(role_ids, vec![1, 2]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "jinkops",
            "--api-base-url",
            "http://example.test/api",
            "--bootstrap-timeout-ms",
            "250",
            "--no-coalesce",
            "logout",
        ])
        .unwrap();
        let config = cli.apply(ConsoleConfig::default());
        assert_eq!(config.api_base_url, "http://example.test/api");
        assert_eq!(config.bootstrap_timeout, Duration::from_millis(250));
        assert!(!config.coalesce_bootstrap);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
    }

    #[test]
    fn time_bounds_are_normalized() {
        assert_eq!(local_bound("2025-03-01 08:00:00").unwrap(), "2025-03-01T08:00:00");
        assert!(local_bound("yesterday").is_err());

        let a = epoch_bound("2025-03-01T08:00:00").unwrap();
        let b = epoch_bound("2025-03-01T08:00:01").unwrap();
        assert_eq!(b - a, 1000);
    }

    #[test]
    fn prompted_password_must_not_be_empty() {
        assert_eq!(checked_password("s3cret\n".into()).unwrap(), "s3cret");
        assert_eq!(checked_password(" pw ".into()).unwrap(), " pw ");
        let err = checked_password("\r\n".into()).unwrap_err();
        assert_eq!(err.to_string(), "password must not be empty");
    }
}
