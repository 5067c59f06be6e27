use clap::{Args, Subcommand};
use serde_json::{json, Value};

use super::record_id;
use crate::api::roles::{self, Role, RoleInput};
use crate::cli::utils::{confirm, output_collection, output_item, output_success};
use crate::cli::{Context, Screen};
use crate::permissions::{Action, PermissionRecord};

const SCREEN: Screen = Screen::ROLES;

/// Parse `Module=rcud`; any subset of the four letters, or `none`.
pub fn parse_grant(raw: &str) -> Result<PermissionRecord, String> {
    let (module, flags) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected MODULE=FLAGS, got '{}'", raw))?;
    let module = module.trim();
    if module.is_empty() {
        return Err("module name is empty".into());
    }

    let mut record = PermissionRecord::uniform(module, false);
    let flags = flags.trim().to_lowercase();
    if flags != "none" {
        for flag in flags.chars() {
            match flag {
                'r' => record.can_read = true,
                'c' => record.can_create = true,
                'u' => record.can_update = true,
                'd' => record.can_delete = true,
                other => return Err(format!("unknown permission flag '{}' (use r, c, u, d)", other)),
            }
        }
    }
    Ok(record)
}

#[derive(Args, Debug, Clone)]
pub struct RoleArgs {
    #[arg(help = "Role name")]
    pub name: String,
    #[arg(long, help = "Create the role inactive")]
    pub inactive: bool,
    #[arg(long = "grant", value_parser = parse_grant, help = "Module permissions, e.g. SpotEntry=rcu (repeatable)")]
    pub grants: Vec<PermissionRecord>,
}

impl RoleArgs {
    fn input(self) -> RoleInput {
        RoleInput {
            name: self.name.trim().to_string(),
            active: Some(!self.inactive),
            permissions: self.grants,
        }
    }
}

#[derive(Subcommand)]
pub enum RoleCommands {
    #[command(about = "List roles")]
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
        #[arg(long)]
        search: Option<String>,
    },

    #[command(about = "Show a role and its permissions")]
    Show { id: String },

    #[command(about = "List every module a role can carry permissions for")]
    Modules,

    #[command(about = "Create a role")]
    Create {
        #[command(flatten)]
        role: RoleArgs,
    },

    #[command(about = "Replace a role's name and permissions")]
    Update {
        id: String,
        #[command(flatten)]
        role: RoleArgs,
    },

    #[command(about = "Delete a role")]
    Delete {
        id: String,
        #[arg(long, short = 'y', help = "Do not ask for confirmation")]
        yes: bool,
    },
}

fn row(role: &Role) -> String {
    let granted: Vec<&str> = role
        .permissions
        .iter()
        .filter(|p| p.allows(Action::Read))
        .map(|p| p.name.as_str())
        .collect();
    format!(
        "{:>6}  {:<20} {:<8} {}",
        role.id,
        role.name,
        if role.active.unwrap_or(true) { "active" } else { "inactive" },
        granted.join(", ")
    )
}

pub async fn handle(cmd: RoleCommands, ctx: &mut Context) -> anyhow::Result<()> {
    match cmd {
        RoleCommands::List { page, limit, search } => {
            ctx.authorize(SCREEN, Action::Read, "roles")?;
            let roles = roles::list(&ctx.client, page, limit, search.as_deref()).await?;
            output_collection(&ctx.output, "roles", &roles, "No roles found", row)
        }
        RoleCommands::Show { id } => {
            ctx.authorize(SCREEN, Action::Read, "roles")?;
            let role = roles::get(&ctx.client, &record_id(&id)?).await?;
            output_item(&ctx.output, "role", &role)
        }
        RoleCommands::Modules => {
            ctx.authorize(SCREEN, Action::Read, "roles")?;
            let modules = roles::all_permissions(&ctx.client).await?;
            output_collection(&ctx.output, "permissions", &modules, "No modules", |m| match m {
                Value::String(name) => name.clone(),
                other => other
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_owned)
                    .unwrap_or_else(|| other.to_string()),
            })
        }
        RoleCommands::Create { role } => {
            ctx.authorize(SCREEN, Action::Create, "roles")?;
            let input = role.input();
            roles::create(&ctx.client, &input).await?;
            output_success(
                &ctx.output,
                &format!("Role '{}' created successfully", input.name),
                Some(json!({ "name": input.name })),
            )
        }
        RoleCommands::Update { id, role } => {
            ctx.authorize(SCREEN, Action::Update, "roles")?;
            let id = record_id(&id)?;
            roles::update(&ctx.client, &id, &role.input()).await?;
            output_success(&ctx.output, &format!("Role {} updated successfully", id), Some(json!({ "id": id })))
        }
        RoleCommands::Delete { id, yes } => {
            ctx.authorize(SCREEN, Action::Delete, "roles")?;
            let id = record_id(&id)?;
            if !confirm(&format!("Delete role {}?", id), yes)? {
                return output_success(&ctx.output, "Delete cancelled", None);
            }
            roles::delete(&ctx.client, &id).await?;
            output_success(&ctx.output, &format!("Role {} deleted successfully", id), Some(json!({ "id": id })))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_grant() {
        let record = parse_grant("SpotEntry=rc").unwrap();
        assert_eq!(record.name, "SpotEntry");
        assert!(record.can_read && record.can_create);
        assert!(!record.can_update && !record.can_delete);

        let none = parse_grant("Dashboard=none").unwrap();
        assert!(!none.allows(Action::Read));

        assert!(parse_grant("SpotEntry").is_err());
        assert!(parse_grant("SpotEntry=rx").is_err());
        assert!(parse_grant("=r").is_err());
    }
}
