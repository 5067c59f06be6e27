use chrono::Local;
use clap::Subcommand;
use serde_json::json;

use super::{
    check_update, finish_submit, output_actions, prefill_from_master, record_id, report_workflow_error,
    upload, VisitArgs,
};
use crate::api::{appointments, entity_of, Freshness};
use crate::cli::utils::{output_collection, output_item, output_success};
use crate::cli::{Context, Screen};
use crate::notify::Toast;
use crate::permissions::Action;
use crate::types::EntityKind;
use crate::validation::PRE_APPROVAL;
use crate::workflow::{FormSubmitter, StatusWorkflow, VisitorStatus};

const SCREEN: Screen = Screen::PRE_APPROVAL;

#[derive(Subcommand)]
pub enum AppointmentCommands {
    #[command(about = "List appointments, newest first")]
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },

    #[command(about = "Show one appointment")]
    Show {
        #[arg(help = "Appointment id")]
        id: String,
    },

    #[command(about = "Schedule a pre-approved visit")]
    Create {
        #[command(flatten)]
        form: VisitArgs,
    },

    #[command(about = "Save changed appointment details")]
    Update {
        #[arg(help = "Appointment id")]
        id: String,
        #[command(flatten)]
        form: VisitArgs,
    },

    #[command(about = "Approve, disapprove, complete or exit an appointment")]
    Status {
        #[arg(help = "Appointment id")]
        id: String,
        #[arg(value_enum)]
        status: VisitorStatus,
    },

    #[command(about = "Show which actions the appointment currently offers")]
    Actions {
        #[arg(help = "Appointment id")]
        id: String,
    },

    #[command(about = "Attach a note to an appointment")]
    Note {
        #[arg(help = "Appointment id")]
        id: String,
        #[arg(help = "Note text")]
        text: String,
    },
}

pub async fn handle(cmd: AppointmentCommands, ctx: &mut Context) -> anyhow::Result<()> {
    match cmd {
        AppointmentCommands::List { page, limit } => {
            ctx.authorize(SCREEN, Action::Read, "appointments")?;
            let page = appointments::list(&ctx.client, &mut ctx.store, page, limit).await?;
            tracing::debug!("{} appointment(s) in total", page.total);
            if page.freshness == Freshness::Cached {
                ctx.notifier.notify(Toast::warning("Server unreachable, showing cached appointments"));
            }
            output_collection(&ctx.output, "appointments", &page.records, "No appointments found", |r| {
                format!(
                    "{:>6}  {:<24} {} {}  {}",
                    r.id,
                    r.full_name(),
                    r.date.as_deref().unwrap_or("-"),
                    r.time.as_deref().unwrap_or("-"),
                    r.status.label(ctx.store.is_disapproved(&entity_of(EntityKind::Appointment, &r.id)))
                )
            })
        }
        AppointmentCommands::Show { id } => {
            ctx.authorize(SCREEN, Action::Read, "appointments")?;
            let record = appointments::get(&ctx.client, &record_id(&id)?).await?;
            output_item(&ctx.output, "appointment", &record)
        }
        AppointmentCommands::Create { form } => {
            ctx.authorize(SCREEN, Action::Create, "appointments")?;

            let mut values = form.values();
            if form.prefill {
                prefill_from_master(ctx, &PRE_APPROVAL, &mut values).await?;
            }

            let submitter = FormSubmitter::new(ctx.notifier.clone());
            let client = ctx.client.clone();
            let photo = form.photo.clone();
            let result = submitter
                .submit(
                    "appointment/create",
                    &PRE_APPROVAL,
                    &values,
                    Local::now().naive_local(),
                    false,
                    "Appointment created successfully",
                    move |payload| async move { appointments::create(&client, upload(payload, photo, None)).await },
                )
                .await;
            finish_submit(ctx, result).map(|_| ())
        }
        AppointmentCommands::Update { id, form } => {
            ctx.authorize(SCREEN, Action::Update, "appointments")?;
            let id = record_id(&id)?;
            let values = form.values();
            check_update(ctx, &PRE_APPROVAL, &values, false)?;

            appointments::update(&ctx.client, &id, upload(PRE_APPROVAL.payload(&values), form.photo, None)).await?;
            ctx.notifier.notify(Toast::success("Appointment Details saved successfully!"));
            Ok(())
        }
        AppointmentCommands::Status { id, status } => {
            ctx.authorize(SCREEN, Action::Update, "appointments")?;
            let id = record_id(&id)?;
            let record = appointments::get(&ctx.client, &id).await?;
            let entity = entity_of(EntityKind::Appointment, &id);

            let workflow = StatusWorkflow::new(ctx.client.clone(), ctx.retry_policy(), ctx.notifier.clone());
            let flags = workflow
                .transition(&mut ctx.store, &entity, record.status, status)
                .await
                .map_err(report_workflow_error)?;
            tracing::debug!("{} flags now {:?}", entity, flags);
            Ok(())
        }
        AppointmentCommands::Actions { id } => {
            ctx.authorize(SCREEN, Action::Read, "appointments")?;
            let id = record_id(&id)?;
            let record = appointments::get(&ctx.client, &id).await?;
            let disapproved = ctx.store.is_disapproved(&entity_of(EntityKind::Appointment, &id));
            output_actions(ctx, SCREEN, &record.status, disapproved, "appointments")
        }
        AppointmentCommands::Note { id, text } => {
            ctx.authorize(SCREEN, Action::Update, "appointments")?;
            let id = record_id(&id)?;
            let text = text.trim();
            if text.is_empty() {
                return Err(anyhow::anyhow!("Note cannot be empty"));
            }

            appointments::save_note(&ctx.client, &id, text).await?;
            output_success(&ctx.output, "Note saved successfully", Some(json!({ "id": id })))
        }
    }
}
