use clap::Subcommand;
use serde_json::json;

use crate::cli::config::{get_config_dir, init_config_dir};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum InitCommands {
    #[command(about = "Initialize configuration directory")]
    Config,
}

pub async fn handle(cmd: InitCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        InitCommands::Config => {
            let config_dir = get_config_dir()?;
            let created = init_config_dir(&config_dir)?;
            let created: Vec<String> = created.iter().map(|p| p.display().to_string()).collect();

            let message = if created.is_empty() {
                format!("Configuration directory {} already initialized", config_dir.display())
            } else {
                format!("Initialized {} ({} file(s) created)", config_dir.display(), created.len())
            };
            output_success(
                &output_format,
                &message,
                Some(json!({ "config_dir": config_dir.display().to_string(), "created": created })),
            )
        }
    }
}
