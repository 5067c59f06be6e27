use chrono::Local;
use clap::Subcommand;
use serde_json::{json, Value};

use super::{
    check_update, finish_submit, output_actions, prefill_from_master, record_id, report_workflow_error,
    upload, DriverArgs, VisitArgs,
};
use crate::api::{entity_of, master_records, visitors, Freshness, VisitRecord};
use crate::cli::utils::{confirm, output_collection, output_item, output_success};
use crate::cli::{Context, Screen};
use crate::notify::Toast;
use crate::permissions::Action;
use crate::types::{EntityKind, RecordId};
use crate::validation::{FormSchema, FormValues, SuggestionBinding, SPOT_ENTRY, SPOT_ENTRY_WITH_DRIVER};
use crate::workflow::{FormSubmitter, StatusWorkflow, VisitorStatus};

const SCREEN: Screen = Screen::SPOT_ENTRY;

#[derive(Subcommand)]
pub enum VisitorCommands {
    #[command(about = "List spot-entry visitors, newest first")]
    List,

    #[command(about = "Show one visitor")]
    Show {
        #[arg(help = "Visitor id")]
        id: String,
    },

    #[command(about = "Register a walk-in visitor")]
    Create {
        #[command(flatten)]
        form: VisitArgs,
        #[command(flatten)]
        driver: DriverArgs,
        #[arg(long, help = "The visitor arrives with a driver and vehicle")]
        with_driver: bool,
    },

    #[command(about = "Update visitor details")]
    Update {
        #[arg(help = "Visitor id")]
        id: String,
        #[command(flatten)]
        form: VisitArgs,
        #[command(flatten)]
        driver: DriverArgs,
    },

    #[command(about = "Approve, disapprove, complete or exit a visitor")]
    Status {
        #[arg(help = "Visitor id")]
        id: String,
        #[arg(value_enum)]
        status: VisitorStatus,
    },

    #[command(about = "Show which actions the visitor currently offers")]
    Actions {
        #[arg(help = "Visitor id")]
        id: String,
    },

    #[command(about = "Delete a visitor")]
    Delete {
        #[arg(help = "Visitor id")]
        id: String,
        #[arg(long, short = 'y', help = "Do not ask for confirmation")]
        yes: bool,
    },

    #[command(about = "List master records of previous visitors")]
    Records,

    #[command(about = "Find the master record for a contact number")]
    Lookup {
        #[arg(help = "Contact number")]
        contactnumber: String,
    },
}

async fn find(ctx: &mut Context, id: &RecordId) -> anyhow::Result<VisitRecord> {
    let (records, _) = visitors::list(&ctx.client, &mut ctx.store).await?;
    records
        .into_iter()
        .find(|r| r.id == *id)
        .ok_or_else(|| anyhow::anyhow!("Visitor {} not found", id))
}

/// Confirm the typed person name against the user directory and fill the
/// department from the match when none was given.
async fn confirm_person(ctx: &Context, values: &mut FormValues) -> anyhow::Result<bool> {
    let Some(typed) = values.get("personname").cloned() else {
        return Ok(false);
    };

    let mut binding = SuggestionBinding::new();
    if !binding.confirm(&ctx.client, &typed).await? {
        return Ok(false);
    }

    if let Some(selected) = binding.selected() {
        if !values.contains_key("department") {
            if let Some(department) = &selected.department {
                values.insert("department".into(), department.clone());
            }
        }
        values.insert("personname".into(), selected.display_name());
    }
    Ok(true)
}

fn schema_for(with_driver: bool) -> &'static FormSchema {
    if with_driver {
        &SPOT_ENTRY_WITH_DRIVER
    } else {
        &SPOT_ENTRY
    }
}

pub async fn handle(cmd: VisitorCommands, ctx: &mut Context) -> anyhow::Result<()> {
    match cmd {
        VisitorCommands::List => {
            ctx.authorize(SCREEN, Action::Read, "visitors")?;
            let (records, freshness) = visitors::list(&ctx.client, &mut ctx.store).await?;
            if freshness == Freshness::Cached {
                ctx.notifier.notify(Toast::warning("Server unreachable, showing cached visitors"));
            }
            output_collection(&ctx.output, "visitors", &records, "No visitors found", |r| {
                format!(
                    "{:>6}  {:<24} {}  {}",
                    r.id,
                    r.full_name(),
                    r.date.as_deref().unwrap_or("-"),
                    r.status.label(ctx.store.is_disapproved(&entity_of(EntityKind::Visitor, &r.id)))
                )
            })
        }
        VisitorCommands::Show { id } => {
            ctx.authorize(SCREEN, Action::Read, "visitors")?;
            let record = find(ctx, &record_id(&id)?).await?;
            output_item(&ctx.output, "visitor", &record)
        }
        VisitorCommands::Create { form, driver, with_driver } => {
            ctx.authorize(SCREEN, Action::Create, "visitors")?;
            let schema = schema_for(with_driver);

            let mut values = form.values();
            if with_driver {
                driver.extend(&mut values);
            }
            if form.prefill {
                prefill_from_master(ctx, schema, &mut values).await?;
            }
            let confirmed = confirm_person(ctx, &mut values).await?;

            let submitter = FormSubmitter::new(ctx.notifier.clone());
            let client = ctx.client.clone();
            let (photo, driver_photo) = (form.photo.clone(), driver.driver_photo.clone());
            let result = submitter
                .submit(
                    "visitors/create",
                    schema,
                    &values,
                    Local::now().naive_local(),
                    confirmed,
                    "Visitor registered successfully",
                    move |payload| async move {
                        visitors::create(&client, upload(payload, photo, driver_photo)).await
                    },
                )
                .await;
            finish_submit(ctx, result).map(|_| ())
        }
        VisitorCommands::Update { id, form, driver } => {
            ctx.authorize(SCREEN, Action::Update, "visitors")?;
            let id = record_id(&id)?;

            let mut values = form.values();
            driver.extend(&mut values);
            let confirmed = confirm_person(ctx, &mut values).await?;
            check_update(ctx, &SPOT_ENTRY_WITH_DRIVER, &values, confirmed)?;

            let payload = SPOT_ENTRY_WITH_DRIVER.payload(&values);
            visitors::update(&ctx.client, &id, upload(payload, form.photo, driver.driver_photo)).await?;
            ctx.notifier.notify(Toast::success("Visitor updated successfully"));
            Ok(())
        }
        VisitorCommands::Status { id, status } => {
            ctx.authorize(SCREEN, Action::Update, "visitors")?;
            let id = record_id(&id)?;
            let record = find(ctx, &id).await?;
            let entity = entity_of(EntityKind::Visitor, &id);

            let workflow = StatusWorkflow::new(ctx.client.clone(), ctx.retry_policy(), ctx.notifier.clone());
            workflow
                .transition(&mut ctx.store, &entity, record.status, status)
                .await
                .map_err(report_workflow_error)?;
            Ok(())
        }
        VisitorCommands::Actions { id } => {
            ctx.authorize(SCREEN, Action::Read, "visitors")?;
            let id = record_id(&id)?;
            let record = find(ctx, &id).await?;
            let disapproved = ctx.store.is_disapproved(&entity_of(EntityKind::Visitor, &id));
            output_actions(ctx, SCREEN, &record.status, disapproved, "visitors")
        }
        VisitorCommands::Delete { id, yes } => {
            ctx.authorize(SCREEN, Action::Delete, "visitors")?;
            let id = record_id(&id)?;
            if !confirm(&format!("Delete visitor {}?", id), yes)? {
                return output_success(&ctx.output, "Delete cancelled", None);
            }

            visitors::delete(&ctx.client, &id).await?;
            ctx.store.set_disapproved(&entity_of(EntityKind::Visitor, &id), false)?;
            output_success(&ctx.output, &format!("Visitor {} deleted", id), Some(json!({ "id": id })))
        }
        VisitorCommands::Records => {
            ctx.authorize(SCREEN, Action::Read, "visitors")?;
            let records = master_records::list(&ctx.client).await?;
            output_collection(&ctx.output, "records", &records, "No master records", |r| {
                let text = |field: &str| r.get(field).and_then(Value::as_str).unwrap_or("").to_string();
                format!(
                    "{:<14} {} {}  {}",
                    text("contactnumber"),
                    text("firstname"),
                    text("lastname"),
                    text("email")
                )
            })
        }
        VisitorCommands::Lookup { contactnumber } => {
            ctx.authorize(SCREEN, Action::Read, "visitors")?;
            match master_records::by_contact(&ctx.client, contactnumber.trim()).await? {
                Some(record) => output_item(&ctx.output, "record", &record),
                None => Err(anyhow::anyhow!("No master record for {}", contactnumber.trim())),
            }
        }
    }
}
