pub mod commands;
pub mod config;
pub mod context;
pub mod utils;

pub use context::{Context, Reported, Screen};

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "vms")]
#[command(about = "VMS CLI - Command-line client for the Visitor Management System API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Initialize configuration directory with required files")]
    Init {
        #[command(subcommand)]
        cmd: commands::init::InitCommands,
    },

    #[command(about = "API server health and configuration")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },

    #[command(about = "Sign in, sign out and inspect the session")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Visitor NDA, safety and verification acknowledgements")]
    Ack {
        #[command(subcommand)]
        cmd: commands::ack::AckCommands,
    },

    #[command(about = "Visitor counts per dashboard card")]
    Dashboard,

    #[command(about = "Pre-approved appointments")]
    Appointment {
        #[command(subcommand)]
        cmd: commands::appointment::AppointmentCommands,
    },

    #[command(about = "Spot-entry visitors and master records")]
    Visitor {
        #[command(subcommand)]
        cmd: commands::visitor::VisitorCommands,
    },

    #[command(about = "Dictionary settings (genders, departments, ...)")]
    Dictionary {
        #[command(subcommand)]
        cmd: commands::dictionary::DictionaryCommands,
    },

    #[command(about = "User management")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },

    #[command(about = "User roles and their permissions")]
    Role {
        #[command(subcommand)]
        cmd: commands::role::RoleCommands,
    },
}

impl Commands {
    /// Screen a command belongs to. `None` for commands usable while signed out.
    pub fn screen(&self) -> Option<Screen> {
        match self {
            Commands::Init { .. } | Commands::Server { .. } | Commands::Auth { .. } | Commands::Ack { .. } => None,
            Commands::Dashboard => Some(Screen::DASHBOARD),
            Commands::Appointment { .. } => Some(Screen::PRE_APPROVAL),
            Commands::Visitor { .. } => Some(Screen::SPOT_ENTRY),
            Commands::Dictionary { .. } => Some(Screen::DICTIONARY),
            Commands::User { .. } => Some(Screen::USERS),
            Commands::Role { .. } => Some(Screen::ROLES),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    if let Commands::Init { cmd } = cli.command {
        return commands::init::handle(cmd, output_format).await;
    }

    let mut ctx = Context::load(output_format)?;
    if let Some(screen) = cli.command.screen() {
        ctx.enter(screen)?;
    }

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Server { cmd } => commands::server::handle(cmd, &mut ctx).await,
        Commands::Auth { cmd } => commands::auth::handle(cmd, &mut ctx).await,
        Commands::Ack { cmd } => commands::ack::handle(cmd, &mut ctx).await,
        Commands::Dashboard => commands::dashboard::handle(&mut ctx).await,
        Commands::Appointment { cmd } => commands::appointment::handle(cmd, &mut ctx).await,
        Commands::Visitor { cmd } => commands::visitor::handle(cmd, &mut ctx).await,
        Commands::Dictionary { cmd } => commands::dictionary::handle(cmd, &mut ctx).await,
        Commands::User { cmd } => commands::user::handle(cmd, &mut ctx).await,
        Commands::Role { cmd } => commands::role::handle(cmd, &mut ctx).await,
    }
}
