//! Visitor-facing acknowledgements. These pages are public, so no session
//! is required.

use clap::{Args, Subcommand, ValueEnum};
use serde_json::json;

use crate::api::appointments::{self, Acknowledgement, VisitKey};
use crate::cli::utils::output_success;
use crate::cli::Context;
use crate::validation::{validate_field, ValidationContext};

#[derive(Args, Debug, Clone)]
pub struct VisitKeyArgs {
    #[arg(long, help = "Email the invitation was sent to")]
    pub email: String,
    #[arg(long, help = "Visit date (YYYY-MM-DD)")]
    pub date: String,
    #[arg(long, help = "Visit time (HH:MM)")]
    pub time: String,
}

impl VisitKeyArgs {
    fn key(self) -> anyhow::Result<VisitKey> {
        let error = validate_field("email", &self.email, &ValidationContext::at_local_now());
        if !error.is_empty() {
            return Err(anyhow::anyhow!(error));
        }
        Ok(VisitKey {
            email: self.email.trim().to_string(),
            date: self.date.trim().to_string(),
            time: self.time.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AckKind {
    Nda,
    Safety,
    Form,
}

impl From<AckKind> for Acknowledgement {
    fn from(kind: AckKind) -> Self {
        match kind {
            AckKind::Nda => Acknowledgement::Nda,
            AckKind::Safety => Acknowledgement::Safety,
            AckKind::Form => Acknowledgement::Form,
        }
    }
}

#[derive(Subcommand)]
pub enum AckCommands {
    #[command(about = "Check whether a visitor completed the NDA, safety briefing or verification form")]
    Status {
        #[arg(value_enum)]
        kind: AckKind,
        #[command(flatten)]
        visit: VisitKeyArgs,
    },

    #[command(about = "Submit the visitor's NDA agreement")]
    Nda {
        #[command(flatten)]
        visit: VisitKeyArgs,
        #[arg(long, help = "The visitor agrees to the NDA")]
        agree: bool,
    },

    #[command(about = "Submit the visitor's safety acknowledgement")]
    Safety {
        #[command(flatten)]
        visit: VisitKeyArgs,
        #[arg(long, help = "The visitor watched the safety video")]
        agree: bool,
    },
}

pub async fn handle(cmd: AckCommands, ctx: &mut Context) -> anyhow::Result<()> {
    match cmd {
        AckCommands::Status { kind, visit } => {
            let key = visit.key()?;
            let completed = appointments::is_completed(&ctx.client, &key, kind.into()).await?;
            output_success(
                &ctx.output,
                &format!("{:?} {}", kind, if completed { "completed" } else { "not completed" }),
                Some(json!({ "completed": completed })),
            )
        }
        AckCommands::Nda { visit, agree } => {
            if !agree {
                return Err(anyhow::anyhow!("The NDA must be agreed to (--agree)"));
            }
            let key = visit.key()?;
            if appointments::is_completed(&ctx.client, &key, Acknowledgement::Nda).await? {
                return output_success(&ctx.output, "NDA already submitted for this visit", None);
            }
            appointments::submit_nda(&ctx.client, &key, agree).await?;
            output_success(&ctx.output, "NDA submitted successfully", None)
        }
        AckCommands::Safety { visit, agree } => {
            if !agree {
                return Err(anyhow::anyhow!("The safety briefing must be acknowledged (--agree)"));
            }
            let key = visit.key()?;
            if appointments::is_completed(&ctx.client, &key, Acknowledgement::Safety).await? {
                return output_success(&ctx.output, "Safety acknowledgement already submitted for this visit", None);
            }
            appointments::submit_safety(&ctx.client, &key, agree).await?;
            output_success(&ctx.output, "Safety acknowledgement submitted successfully", None)
        }
    }
}
