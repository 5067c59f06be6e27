use serde::Serialize;
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};

use crate::cli::OutputFormat;
use crate::notify::{Notifier, Toast, ToastKind};

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            match data {
                Some(Value::Object(fields)) => {
                    if let Some(obj) = response.as_object_mut() {
                        obj.extend(fields);
                    }
                }
                Some(other) => response["data"] = other,
                None => {}
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(
    output_format: &OutputFormat,
    message: &str,
    error_code: Option<&str>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Output a collection: pretty JSON, or one `row` line per item
pub fn output_collection<T: Serialize>(
    output_format: &OutputFormat,
    collection_name: &str,
    items: &[T],
    empty_message: &str,
    row: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ collection_name: items }))?
            );
        }
        OutputFormat::Text if items.is_empty() => println!("{}", empty_message),
        OutputFormat::Text => {
            for item in items {
                println!("{}", row(item));
            }
        }
    }
    Ok(())
}

/// Output a single record: pretty JSON in both formats, under `item_type` for JSON
pub fn output_item<T: Serialize>(
    output_format: &OutputFormat,
    item_type: &str,
    item: &T,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ item_type: item }))?);
        }
        OutputFormat::Text => {
            println!("{}", serde_json::to_string_pretty(item)?);
        }
    }
    Ok(())
}

/// Prints toasts as they are raised
#[derive(Debug, Clone)]
pub struct ConsoleNotifier {
    output_format: OutputFormat,
}

impl ConsoleNotifier {
    pub fn new(output_format: OutputFormat) -> Self {
        Self { output_format }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, toast: Toast) {
        let printed = match toast.kind {
            ToastKind::Error => output_error(&self.output_format, &toast.message, None),
            ToastKind::Success => output_success(&self.output_format, &toast.message, None),
            ToastKind::Info | ToastKind::Warning => match self.output_format {
                OutputFormat::Json => serde_json::to_string(&json!({ "toast": toast }))
                    .map(|line| eprintln!("{}", line))
                    .map_err(anyhow::Error::from),
                OutputFormat::Text => {
                    eprintln!("{}", toast.message);
                    Ok(())
                }
            },
        };

        if let Err(e) = printed {
            tracing::warn!("Could not print notification: {}", e);
        }
    }
}

/// Read one trimmed line from stdin after printing `prompt`
pub fn prompt_line(prompt: &str) -> anyhow::Result<String> {
    eprint!("{}", prompt);
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Ask before a destructive operation. `assume_yes` skips the prompt.
pub fn confirm(message: &str, assume_yes: bool) -> anyhow::Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    let answer = prompt_line(&format!("{} [y/N] ", message))?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
