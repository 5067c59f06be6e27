use clap::Subcommand;
use serde_json::json;

use crate::api::health::{self, HealthStatus};
use crate::cli::config::{load_server_state, save_server_state};
use crate::cli::utils::{output_item, output_success};
use crate::cli::Context;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Show the configured API server and timeouts")]
    Info,

    #[command(about = "Check server health status from API /health endpoint")]
    Health,
}

pub async fn handle(cmd: ServerCommands, ctx: &mut Context) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Info => {
            let base_url = ctx.client.base_url().to_string();
            let state = load_server_state(&ctx.config_dir, &base_url)?;
            output_item(
                &ctx.output,
                "server",
                &json!({
                    "url": base_url,
                    "environment": ctx.config.environment,
                    "request_timeout_secs": ctx.config.api.request_timeout_secs,
                    "health_timeout_secs": ctx.config.api.health_timeout_secs,
                    "retry_attempts": ctx.config.retry.attempts,
                    "last_ping": state.last_ping,
                    "status": state.status,
                }),
            )
        }
        ServerCommands::Health => {
            let base_url = ctx.client.base_url().to_string();
            let mut state = load_server_state(&ctx.config_dir, &base_url)?;

            let status = health::check(&ctx.client).await;
            state.update_ping(status);
            save_server_state(&ctx.config_dir, &state)?;

            match status {
                HealthStatus::Up => output_success(
                    &ctx.output,
                    &format!("{} is up", base_url),
                    Some(json!({ "status": status })),
                ),
                HealthStatus::Down => Err(anyhow::anyhow!("{} is down", base_url)),
            }
        }
    }
}
