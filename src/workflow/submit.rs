use chrono::NaiveDateTime;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use crate::client::{ApiResponse, InFlight};
use crate::error::ClientError;
use crate::notify::{Notifier, Toast};
use crate::validation::{FieldErrors, FormSchema, FormValues};

#[derive(Error, Debug, Clone)]
pub enum SubmitError {
    /// Rejected locally; no request was sent.
    #[error("Form rejected: {0}")]
    Invalid(FieldErrors),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Validates forms and sends them at most once per logical operation.
///
/// A second submit under the same key while the first is still in flight
/// joins the first request instead of issuing another. The success or error
/// toast is raised once by the request itself, not once per caller.
pub struct FormSubmitter {
    notifier: Arc<dyn Notifier>,
    inflight: InFlight<String, ApiResponse>,
}

impl FormSubmitter {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            inflight: InFlight::new(),
        }
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.inflight.is_pending(&key.to_string())
    }

    /// Validate `values` against `schema`, then hand the trimmed payload to `send`.
    ///
    /// On validation failure a single aggregate toast is raised and `send`
    /// is never called.
    #[allow(clippy::too_many_arguments)]
    pub async fn submit<F, Fut>(
        &self,
        key: &str,
        schema: &FormSchema,
        values: &FormValues,
        now: NaiveDateTime,
        person_name_confirmed: bool,
        success_message: &str,
        send: F,
    ) -> Result<ApiResponse, SubmitError>
    where
        F: FnOnce(FormValues) -> Fut,
        Fut: Future<Output = Result<ApiResponse, ClientError>> + Send + 'static,
    {
        if let Err(errors) = schema.validate(values, now, person_name_confirmed) {
            self.notifier.notify(errors.toast());
            return Err(SubmitError::Invalid(errors));
        }

        let payload = schema.payload(values);
        let notifier = Arc::clone(&self.notifier);
        let success_message = success_message.to_string();
        let form = schema.name;

        let response = self
            .inflight
            .run(key.to_string(), move || {
                let request = send(payload);
                async move {
                    let result = request.await;
                    match &result {
                        Ok(_) => notifier.notify(Toast::success(success_message)),
                        Err(e) => {
                            tracing::error!("Submitting {} form failed: {}", form, e);
                            notifier.notify(Toast::error(e.to_string()));
                        }
                    }
                    result
                }
            })
            .await?;

        Ok(response)
    }
}
