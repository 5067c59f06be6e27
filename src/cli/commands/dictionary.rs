use clap::Subcommand;
use serde_json::json;

use super::record_id;
use crate::api::dictionary::{self, DictionaryKind};
use crate::cli::utils::{confirm, output_collection, output_item, output_success};
use crate::cli::{Context, Screen};
use crate::permissions::Action;

const SCREEN: Screen = Screen::DICTIONARY;
const SUBJECT: &str = "dictionary entries";

#[derive(Subcommand)]
pub enum DictionaryCommands {
    #[command(about = "List entries of one dictionary")]
    List {
        #[arg(value_enum)]
        kind: DictionaryKind,
    },

    #[command(about = "Show one entry")]
    Show {
        #[arg(value_enum)]
        kind: DictionaryKind,
        id: String,
    },

    #[command(about = "Add an entry")]
    Add {
        #[arg(value_enum)]
        kind: DictionaryKind,
        name: String,
    },

    #[command(about = "Rename an entry")]
    Update {
        #[arg(value_enum)]
        kind: DictionaryKind,
        id: String,
        name: String,
    },

    #[command(about = "Delete an entry")]
    Delete {
        #[arg(value_enum)]
        kind: DictionaryKind,
        id: String,
        #[arg(long, short = 'y', help = "Do not ask for confirmation")]
        yes: bool,
    },
}

pub async fn handle(cmd: DictionaryCommands, ctx: &mut Context) -> anyhow::Result<()> {
    match cmd {
        DictionaryCommands::List { kind } => {
            ctx.authorize(SCREEN, Action::Read, SUBJECT)?;
            let entries = dictionary::list(&ctx.client, kind).await?;
            output_collection(
                &ctx.output,
                kind.path(),
                &entries,
                &format!("No {} entries", kind),
                |e| format!("{:>6}  {}", e.id, e.name),
            )
        }
        DictionaryCommands::Show { kind, id } => {
            ctx.authorize(SCREEN, Action::Read, SUBJECT)?;
            let entry = dictionary::get(&ctx.client, kind, &record_id(&id)?).await?;
            output_item(&ctx.output, kind.path(), &entry)
        }
        DictionaryCommands::Add { kind, name } => {
            ctx.authorize(SCREEN, Action::Create, SUBJECT)?;
            dictionary::create(&ctx.client, kind, &name).await?;
            output_success(
                &ctx.output,
                &format!("{} '{}' added successfully", kind, name.trim()),
                Some(json!({ "kind": kind, "name": name.trim() })),
            )
        }
        DictionaryCommands::Update { kind, id, name } => {
            ctx.authorize(SCREEN, Action::Update, SUBJECT)?;
            let id = record_id(&id)?;
            dictionary::update(&ctx.client, kind, &id, &name).await?;
            output_success(
                &ctx.output,
                &format!("{} {} updated successfully", kind, id),
                Some(json!({ "kind": kind, "id": id, "name": name.trim() })),
            )
        }
        DictionaryCommands::Delete { kind, id, yes } => {
            ctx.authorize(SCREEN, Action::Delete, SUBJECT)?;
            let id = record_id(&id)?;
            if !confirm(&format!("Delete {} {}?", kind, id), yes)? {
                return output_success(&ctx.output, "Delete cancelled", None);
            }
            dictionary::delete(&ctx.client, kind, &id).await?;
            output_success(
                &ctx.output,
                &format!("{} {} deleted successfully", kind, id),
                Some(json!({ "kind": kind, "id": id })),
            )
        }
    }
}
