pub mod ack;
pub mod appointment;
pub mod auth;
pub mod dashboard;
pub mod dictionary;
pub mod init;
pub mod role;
pub mod server;
pub mod user;
pub mod visitor;

use clap::Args;
use serde_json::{json, Value};
use std::path::PathBuf;

use crate::api::{master_records, VisitUpload};
use crate::cli::{Context, OutputFormat, Reported};
use crate::error::ClientError;
use crate::notify::Toast;
use crate::permissions::Action;
use crate::types::RecordId;
use crate::validation::{FieldErrors, FormSchema, FormValues};
use crate::workflow::{available_actions, StatusFlags, SubmitError};

pub(crate) fn record_id(raw: &str) -> Result<RecordId, ClientError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ClientError::Validation("Record id is required".into()));
    }
    Ok(RecordId::from(raw))
}

/// Visitor details shared by the pre-approval and spot-entry forms.
#[derive(Args, Debug, Clone, Default)]
pub struct VisitArgs {
    #[arg(long)]
    pub firstname: Option<String>,
    #[arg(long)]
    pub lastname: Option<String>,
    #[arg(long)]
    pub gender: Option<String>,
    #[arg(long)]
    pub contactnumber: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long, help = "Visit date (YYYY-MM-DD)")]
    pub date: Option<String>,
    #[arg(long, help = "Visit time (HH:MM)")]
    pub time: Option<String>,
    #[arg(long)]
    pub nationalid: Option<String>,
    #[arg(long, help = "Purpose of visit")]
    pub visit: Option<String>,
    #[arg(long, help = "Person to meet; must match a user")]
    pub personname: Option<String>,
    #[arg(long)]
    pub department: Option<String>,
    #[arg(long)]
    pub durationunit: Option<String>,
    #[arg(long, help = "Duration as minutes or H:MM")]
    pub durationtime: Option<String>,
    #[arg(long)]
    pub visitortype: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long, help = "Visitor photo (JPG or PNG)")]
    pub photo: Option<PathBuf>,
    #[arg(long, help = "Fill missing fields from the master record for --contactnumber")]
    pub prefill: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DriverArgs {
    #[arg(long)]
    pub drivername: Option<String>,
    #[arg(long)]
    pub drivermobile: Option<String>,
    #[arg(long)]
    pub drivernationalid: Option<String>,
    #[arg(long)]
    pub vehicletype: Option<String>,
    #[arg(long)]
    pub vehiclenumber: Option<String>,
    #[arg(long, help = "Driver photo (JPG or PNG)")]
    pub driver_photo: Option<PathBuf>,
}

fn insert_all(values: &mut FormValues, pairs: [(&str, &Option<String>); 5]) {
    for (field, value) in pairs {
        if let Some(value) = value {
            values.insert(field.to_string(), value.clone());
        }
    }
}

impl VisitArgs {
    pub fn values(&self) -> FormValues {
        let mut values = FormValues::new();
        insert_all(
            &mut values,
            [
                ("firstname", &self.firstname),
                ("lastname", &self.lastname),
                ("gender", &self.gender),
                ("contactnumber", &self.contactnumber),
                ("email", &self.email),
            ],
        );
        insert_all(
            &mut values,
            [
                ("date", &self.date),
                ("time", &self.time),
                ("nationalid", &self.nationalid),
                ("visit", &self.visit),
                ("personname", &self.personname),
            ],
        );
        insert_all(
            &mut values,
            [
                ("department", &self.department),
                ("durationunit", &self.durationunit),
                ("durationtime", &self.durationtime),
                ("visitortype", &self.visitortype),
                ("notes", &self.notes),
            ],
        );
        values
    }
}

impl DriverArgs {
    pub fn extend(&self, values: &mut FormValues) {
        insert_all(
            values,
            [
                ("drivername", &self.drivername),
                ("drivermobile", &self.drivermobile),
                ("drivernationalid", &self.drivernationalid),
                ("vehicletype", &self.vehicletype),
                ("vehiclenumber", &self.vehiclenumber),
            ],
        );
    }
}

/// Fill fields missing from `values` with the visitor's master record, if any.
pub(crate) async fn prefill_from_master(
    ctx: &Context,
    schema: &FormSchema,
    values: &mut FormValues,
) -> anyhow::Result<()> {
    let Some(contact) = values.get("contactnumber").cloned() else {
        return Err(anyhow::anyhow!("--prefill needs --contactnumber"));
    };

    match master_records::by_contact(&ctx.client, &contact).await? {
        Some(record) => {
            let filled = fill_missing(schema, values, &record);
            ctx.notifier.notify(Toast::info(format!("Master record loaded ({} field(s) filled)", filled)));
        }
        None => ctx.notifier.notify(Toast::info(format!("No master record for {}", contact))),
    }
    Ok(())
}

fn fill_missing(schema: &FormSchema, values: &mut FormValues, record: &Value) -> usize {
    let mut filled = 0;
    for field in schema.fields {
        if values.get(*field).is_some_and(|v| !v.trim().is_empty()) {
            continue;
        }
        if let Some(value) = record.get(*field).and_then(Value::as_str).filter(|v| !v.is_empty()) {
            values.insert(field.to_string(), value.to_string());
            filled += 1;
        }
    }
    filled
}

pub(crate) fn upload(values: FormValues, photo: Option<PathBuf>, driver_photo: Option<PathBuf>) -> VisitUpload {
    VisitUpload {
        fields: values,
        photo,
        driver_photo,
    }
}

fn print_field_errors(output_format: &OutputFormat, errors: &FieldErrors) {
    match output_format {
        OutputFormat::Json => {
            println!("{}", json!({ "field_errors": errors.errors }));
        }
        OutputFormat::Text => {
            for (field, message) in &errors.errors {
                eprintln!("  {}: {}", field, message);
            }
        }
    }
}

/// Translate a submission outcome; toasts have already been raised.
pub(crate) fn finish_submit<T>(ctx: &Context, result: Result<T, SubmitError>) -> anyhow::Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(SubmitError::Invalid(errors)) => {
            print_field_errors(&ctx.output, &errors);
            Err(Reported(errors.toast().message).into())
        }
        Err(SubmitError::Client(e)) => Err(Reported(e.to_string()).into()),
    }
}

/// Validate a partial update; on failure show every field error plus one toast.
pub(crate) fn check_update(
    ctx: &Context,
    schema: &FormSchema,
    values: &FormValues,
    person_name_confirmed: bool,
) -> anyhow::Result<()> {
    let now = chrono::Local::now().naive_local();
    if let Err(errors) = schema.validate_present(values, now, person_name_confirmed) {
        ctx.notifier.notify(errors.toast());
        print_field_errors(&ctx.output, &errors);
        return Err(Reported(errors.toast().message).into());
    }
    if values.is_empty() {
        return Err(anyhow::anyhow!("Nothing to update"));
    }
    Ok(())
}

/// Print the actions a record offers and whether each is enabled.
pub(crate) fn output_actions(
    ctx: &Context,
    screen: crate::cli::Screen,
    flags: &StatusFlags,
    disapproved: bool,
    subject: &str,
) -> anyhow::Result<()> {
    let rows: Vec<Value> = available_actions(flags, disapproved)
        .into_iter()
        .map(|action| {
            let affordance = ctx.affordance(screen, Action::Update, subject);
            json!({ "action": action, "enabled": affordance.enabled, "tooltip": affordance.tooltip })
        })
        .collect();

    match ctx.output {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "state": flags.label(disapproved), "actions": rows }))?
            );
        }
        OutputFormat::Text => {
            println!("State: {}", flags.label(disapproved));
            for row in &rows {
                let name = row["action"].as_str().unwrap_or_default();
                match row["tooltip"].as_str() {
                    None => println!("  {}", name),
                    Some(reason) => println!("  {} (disabled: {})", name, reason),
                }
            }
        }
    }
    Ok(())
}

pub(crate) fn report_workflow_error(e: crate::workflow::WorkflowError) -> anyhow::Error {
    match e {
        // The workflow already raised the error toast
        crate::workflow::WorkflowError::Client(e) => Reported(e.to_string()).into(),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::PRE_APPROVAL;

    #[test]
    fn test_visit_args_only_carry_given_fields() {
        let args = VisitArgs {
            firstname: Some("Jane".into()),
            email: Some("jane@example.com".into()),
            ..Default::default()
        };
        let values = args.values();
        assert_eq!(values.len(), 2);
        assert_eq!(values.get("firstname").map(String::as_str), Some("Jane"));
    }

    #[test]
    fn test_fill_missing_keeps_typed_values() {
        let mut values: FormValues = [("firstname".to_string(), "Janet".to_string())].into();
        let record = json!({ "firstname": "Jane", "lastname": "Doe", "gender": "", "unrelated": "x" });

        assert_eq!(fill_missing(&PRE_APPROVAL, &mut values, &record), 1);
        assert_eq!(values.get("firstname").map(String::as_str), Some("Janet"));
        assert_eq!(values.get("lastname").map(String::as_str), Some("Doe"));
        assert!(!values.contains_key("gender"));
    }

    #[test]
    fn test_record_id() {
        assert_eq!(record_id(" 12 ").unwrap(), RecordId::Int(12));
        assert!(record_id("").is_err());
    }
}
