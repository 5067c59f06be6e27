use clap::{Args, Subcommand};
use serde_json::json;

use super::record_id;
use crate::api::users::{self, User, UserInput};
use crate::cli::utils::{confirm, output_collection, output_success, prompt_line};
use crate::cli::{Context, Screen};
use crate::permissions::Action;
use crate::types::RecordId;
use crate::validation::{validate_field, ValidationContext};

const SCREEN: Screen = Screen::USERS;
const PAGE_SIZE: u32 = 50;

#[derive(Args, Debug, Clone)]
pub struct UserArgs {
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    #[arg(long)]
    pub user_name: String,
    #[arg(long, default_value = "")]
    pub contact_no: String,
    #[arg(long)]
    pub email: String,
    #[arg(long, default_value = "")]
    pub address: String,
    #[arg(long, help = "Role id")]
    pub role: i64,
    #[arg(long, default_value = "")]
    pub employee_no: String,
    #[arg(long, default_value = "")]
    pub department: String,
    #[arg(long, default_value = "")]
    pub designation: String,
    #[arg(long, default_value = "")]
    pub notes: String,
}

impl UserArgs {
    fn input(self, password: Option<String>) -> anyhow::Result<UserInput> {
        let ctx = ValidationContext::at_local_now().with_required(&["firstname", "lastname", "email"]);
        for (field, value) in [
            ("firstname", &self.first_name),
            ("lastname", &self.last_name),
            ("email", &self.email),
            ("contactnumber", &self.contact_no),
            ("notes", &self.notes),
        ] {
            let error = validate_field(field, value, &ctx);
            if !error.is_empty() {
                return Err(anyhow::anyhow!(error));
            }
        }
        if self.user_name.trim().is_empty() {
            return Err(anyhow::anyhow!("Username is required"));
        }

        Ok(UserInput {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            user_name: self.user_name.trim().to_string(),
            password,
            contact_no: self.contact_no.trim().to_string(),
            email_id: self.email.trim().to_string(),
            address: self.address.trim().to_string(),
            user_role_id: self.role,
            employee_no: self.employee_no.trim().to_string(),
            department: self.department.trim().to_string(),
            designation: self.designation.trim().to_string(),
            notes: self.notes.trim().to_string(),
        })
    }
}

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "List users")]
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
        #[arg(long)]
        search: Option<String>,
    },

    #[command(about = "Search users by name (person-to-meet lookup)")]
    Search {
        query: String,
    },

    #[command(about = "Create a user")]
    Create {
        #[command(flatten)]
        user: UserArgs,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Update a user")]
    Update {
        id: String,
        #[command(flatten)]
        user: UserArgs,
    },

    #[command(about = "Activate or deactivate a user")]
    Toggle {
        id: String,
    },

    #[command(about = "Delete a user")]
    Delete {
        id: String,
        #[arg(long, short = 'y', help = "Do not ask for confirmation")]
        yes: bool,
    },
}

/// There is no single-user endpoint; page through the list instead.
async fn find(ctx: &Context, id: &RecordId) -> anyhow::Result<User> {
    let mut page = 1;
    loop {
        let batch = users::list(&ctx.client, page, PAGE_SIZE, None).await?;
        if batch.is_empty() {
            return Err(anyhow::anyhow!("User {} not found", id));
        }
        let last_page = batch.len() < PAGE_SIZE as usize;
        if let Some(user) = batch.into_iter().find(|u| u.id == *id) {
            return Ok(user);
        }
        if last_page {
            return Err(anyhow::anyhow!("User {} not found", id));
        }
        page += 1;
    }
}

fn row(user: &User) -> String {
    format!(
        "{:>6}  {:<16} {} {}  {}",
        user.id,
        user.user_name.as_deref().unwrap_or("-"),
        user.first_name.as_deref().unwrap_or(""),
        user.last_name.as_deref().unwrap_or(""),
        if user.is_active { "active" } else { "inactive" }
    )
}

pub async fn handle(cmd: UserCommands, ctx: &mut Context) -> anyhow::Result<()> {
    match cmd {
        UserCommands::List { page, limit, search } => {
            ctx.authorize(SCREEN, Action::Read, "users")?;
            let users = users::list(&ctx.client, page, limit, search.as_deref()).await?;
            output_collection(&ctx.output, "users", &users, "No users found", row)
        }
        UserCommands::Search { query } => {
            ctx.authorize(SCREEN, Action::Read, "users")?;
            let suggestions = users::search(&ctx.client, query.trim()).await?;
            output_collection(&ctx.output, "users", &suggestions, "No matching users", |s| s.label())
        }
        UserCommands::Create { user, password } => {
            ctx.authorize(SCREEN, Action::Create, "users")?;
            let password = match password {
                Some(password) => password,
                None => prompt_line("Password: ")?,
            };
            let input = user.input(Some(password))?;
            users::create(&ctx.client, &input).await?;
            output_success(
                &ctx.output,
                &format!("User '{}' created successfully", input.user_name),
                Some(json!({ "user_name": input.user_name })),
            )
        }
        UserCommands::Update { id, user } => {
            ctx.authorize(SCREEN, Action::Update, "users")?;
            let id = record_id(&id)?;
            let input = user.input(None)?;
            users::update(&ctx.client, &id, &input).await?;
            output_success(&ctx.output, &format!("User {} updated successfully", id), Some(json!({ "id": id })))
        }
        UserCommands::Toggle { id } => {
            ctx.authorize(SCREEN, Action::Update, "users")?;
            let id = record_id(&id)?;
            let mut user = find(ctx, &id).await?;

            users::toggle_active(&ctx.client, &mut user).await?;
            let state = if user.is_active { "activated" } else { "deactivated" };
            output_success(
                &ctx.output,
                &format!("User {} {}", id, state),
                Some(json!({ "id": id, "isActive": user.is_active })),
            )
        }
        UserCommands::Delete { id, yes } => {
            ctx.authorize(SCREEN, Action::Delete, "users")?;
            let id = record_id(&id)?;
            if !confirm(&format!("Delete user {}?", id), yes)? {
                return output_success(&ctx.output, "Delete cancelled", None);
            }
            users::delete(&ctx.client, &id).await?;
            output_success(&ctx.output, &format!("User {} deleted successfully", id), Some(json!({ "id": id })))
        }
    }
}
