use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_collection, output_item, output_success, prompt_line};
use crate::cli::Context;
use crate::permissions::Action;
use crate::session;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login to server")]
    Login {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
        #[arg(long, help = "Sign in again even when a session exists")]
        force: bool,
    },

    #[command(about = "Logout and clear the stored session")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Show current user information")]
    Whoami,

    #[command(about = "List the permission records stored at login")]
    Permissions,

    #[command(about = "Check whether the current user may perform an action on a module")]
    Can {
        #[arg(help = "Module name, e.g. SpotEntry")]
        module: String,
        #[arg(value_enum, default_value_t = Action::Read)]
        action: Action,
    },
}

pub async fn handle(cmd: AuthCommands, ctx: &mut Context) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { username, password, force } => {
            if ctx.store.has_session() && !force {
                return Err(anyhow::anyhow!(
                    "Already signed in as {}. Use --force to sign in again",
                    ctx.store.state().user_name.as_deref().unwrap_or("current user")
                ));
            }

            let password = match password {
                Some(password) => password,
                None => prompt_line("Password: ")?,
            };

            let session = session::login(&ctx.client, &mut ctx.store, &username, &password).await?;
            ctx.refresh_client()?;

            output_success(
                &ctx.output,
                &format!("Signed in as {}", session.user_name.as_deref().unwrap_or(&username)),
                Some(json!({
                    "user_name": session.user_name,
                    "role": session.role,
                    "permissions": session.permissions.records().len(),
                })),
            )
        }
        AuthCommands::Logout => {
            let decision = ctx.guard.sign_out(&mut ctx.store)?;
            tracing::debug!("Sign-out decision: {:?}", decision);
            output_success(&ctx.output, "Signed out", None)
        }
        AuthCommands::Status => {
            let state = ctx.store.state();
            if ctx.store.has_session() {
                output_success(
                    &ctx.output,
                    &format!("Signed in as {}", state.user_name.as_deref().unwrap_or("unknown user")),
                    Some(json!({ "signed_in": true, "user_name": state.user_name, "role": state.role })),
                )
            } else {
                output_success(&ctx.output, "Not signed in", Some(json!({ "signed_in": false })))
            }
        }
        AuthCommands::Whoami => {
            if !ctx.store.has_session() {
                return Err(crate::error::ClientError::NotSignedIn.into());
            }
            let state = ctx.store.state();
            output_item(
                &ctx.output,
                "user",
                &json!({ "user_name": state.user_name, "role": state.role }),
            )
        }
        AuthCommands::Permissions => output_collection(
            &ctx.output,
            "permissions",
            ctx.store.permissions().records(),
            "No permission records stored",
            |r| {
                format!(
                    "{:<24} read={} create={} update={} delete={}",
                    r.name, r.can_read, r.can_create, r.can_update, r.can_delete
                )
            },
        ),
        AuthCommands::Can { module, action } => {
            let allowed = ctx.store.permissions().can(&module, action, &ctx.policy);
            let source = if ctx.store.permissions().get(&module).is_some() {
                "stored record"
            } else {
                "default policy"
            };
            output_success(
                &ctx.output,
                &format!("{} {} on {}: {} ({})", action, if allowed { "allowed" } else { "denied" }, module, allowed, source),
                Some(json!({ "module": module, "action": action.verb(), "allowed": allowed, "source": source })),
            )
        }
    }
}
