use clap::ValueEnum;
use reqwest::Method;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

use super::WorkflowError;
use crate::client::{InFlight, ResourceClient, RetryPolicy};
use crate::error::ClientError;
use crate::notify::{Notifier, Toast};
use crate::store::{CacheKey, StateStore};
use crate::types::{EntityKind, EntityRef};

/// Status transitions the server accepts under `…/:id/status/:status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum VisitorStatus {
    Approve,
    Disapprove,
    Complete,
    Exit,
}

impl VisitorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitorStatus::Approve => "approve",
            VisitorStatus::Disapprove => "disapprove",
            VisitorStatus::Complete => "complete",
            VisitorStatus::Exit => "exit",
        }
    }

    fn past_tense(&self) -> &'static str {
        match self {
            VisitorStatus::Approve => "approved",
            VisitorStatus::Disapprove => "disapproved",
            VisitorStatus::Complete => "completed",
            VisitorStatus::Exit => "exited",
        }
    }
}

impl fmt::Display for VisitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn null_as_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Approval flags as the server reports them on a visitor or appointment.
///
/// `is_approved` is tri-state: `None` until a decision is made. The server
/// does not persist "disapproved" reliably, so the store keeps its own flag
/// per entity (see [`StateStore::is_disapproved`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusFlags {
    #[serde(default)]
    pub is_approved: Option<bool>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub complete: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub exit: bool,
}

impl StatusFlags {
    /// Flags after `status` has been accepted by the server.
    pub fn after(self, status: VisitorStatus) -> Self {
        match status {
            VisitorStatus::Approve => Self { is_approved: Some(true), complete: false, ..self },
            VisitorStatus::Disapprove => Self { is_approved: Some(false), complete: false, ..self },
            VisitorStatus::Complete => Self { complete: true, ..self },
            VisitorStatus::Exit => Self { exit: true, ..self },
        }
    }

    pub fn label(&self, disapproved: bool) -> &'static str {
        if self.exit {
            "exited"
        } else if self.complete {
            "completed"
        } else if self.is_approved == Some(true) {
            "approved"
        } else if disapproved || self.is_approved == Some(false) {
            "disapproved"
        } else {
            "pending"
        }
    }
}

/// Controls offered on a record's detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitAction {
    Approve,
    Disapprove,
    Complete,
    Exit,
    Save,
    Note,
}

impl VisitAction {
    pub fn status(&self) -> Option<VisitorStatus> {
        match self {
            VisitAction::Approve => Some(VisitorStatus::Approve),
            VisitAction::Disapprove => Some(VisitorStatus::Disapprove),
            VisitAction::Complete => Some(VisitorStatus::Complete),
            VisitAction::Exit => Some(VisitorStatus::Exit),
            VisitAction::Save | VisitAction::Note => None,
        }
    }
}

impl From<VisitorStatus> for VisitAction {
    fn from(status: VisitorStatus) -> Self {
        match status {
            VisitorStatus::Approve => VisitAction::Approve,
            VisitorStatus::Disapprove => VisitAction::Disapprove,
            VisitorStatus::Complete => VisitAction::Complete,
            VisitorStatus::Exit => VisitAction::Exit,
        }
    }
}

/// Which actions a record in state `flags` offers.
///
/// Exited records only take notes. Otherwise the next step follows the
/// lifecycle: pending → approve/disapprove, approved → complete,
/// completed or disapproved → exit.
pub fn available_actions(flags: &StatusFlags, disapproved: bool) -> Vec<VisitAction> {
    if flags.exit {
        return vec![VisitAction::Note];
    }

    let mut actions = if flags.complete {
        vec![VisitAction::Exit]
    } else if flags.is_approved == Some(true) {
        vec![VisitAction::Complete]
    } else if disapproved {
        vec![VisitAction::Exit]
    } else {
        vec![VisitAction::Approve, VisitAction::Disapprove]
    };
    actions.extend([VisitAction::Save, VisitAction::Note]);
    actions
}

/// Request body for a status PATCH.
pub fn status_payload(status: VisitorStatus) -> Value {
    match status {
        VisitorStatus::Approve => json!({ "sendEmail": false, "isApproved": true, "complete": false }),
        VisitorStatus::Disapprove => json!({ "sendEmail": false, "isApproved": false, "complete": false }),
        VisitorStatus::Complete => json!({ "sendEmail": false, "complete": true }),
        VisitorStatus::Exit => json!({ "sendEmail": false, "exit": true }),
    }
}

/// Endpoint for a status PATCH on `entity`.
pub fn status_endpoint(entity: &EntityRef, status: VisitorStatus) -> String {
    match entity.kind {
        EntityKind::Appointment => format!("{}/status/{}", entity.path(), status),
        EntityKind::Visitor => format!("{}/status/{}?sendEmail=false", entity.path(), status),
    }
}

fn cache_key(kind: EntityKind) -> CacheKey {
    match kind {
        EntityKind::Appointment => CacheKey::Appointments,
        EntityKind::Visitor => CacheKey::Visitors,
    }
}

/// Drives status transitions with retry and per-record coalescing.
///
/// Nothing is written to the store until the server has accepted the
/// transition. Each transition produces exactly one toast, whether it
/// succeeds or exhausts its retries.
pub struct StatusWorkflow {
    client: ResourceClient,
    policy: RetryPolicy,
    notifier: Arc<dyn Notifier>,
    inflight: InFlight<(EntityRef, VisitorStatus), Value>,
}

impl StatusWorkflow {
    pub fn new(client: ResourceClient, policy: RetryPolicy, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            policy,
            notifier,
            inflight: InFlight::new(),
        }
    }

    pub fn is_pending(&self, entity: &EntityRef, status: VisitorStatus) -> bool {
        self.inflight.is_pending(&(entity.clone(), status))
    }

    /// Send the PATCH, retrying under the workflow's policy. Concurrent calls
    /// for the same record and status share one request.
    pub async fn send(&self, entity: &EntityRef, status: VisitorStatus) -> Result<Value, ClientError> {
        let client = self.client.clone();
        let policy = self.policy;
        let notifier = Arc::clone(&self.notifier);
        let endpoint = status_endpoint(entity, status);
        let label = entity.to_string();

        self.inflight
            .run((entity.clone(), status), move || async move {
                let body = status_payload(status);
                let result = client
                    .request_with_retry(&endpoint, Method::PATCH, Some(&body), &policy)
                    .await;

                match &result {
                    Ok(_) => notifier.notify(Toast::success(format!("Visitor {} successfully", status.past_tense()))),
                    Err(e) => {
                        tracing::error!("Status '{}' for {} failed: {}", status, label, e);
                        notifier.notify(Toast::error(format!("Failed to {} visitor: {}", status, e)));
                    }
                }
                result.map(|response| response.into_value())
            })
            .await
    }

    /// Check the transition is offered, send it, then commit the disapproval
    /// flag and the cached record. Returns the record's new flags.
    pub async fn transition(
        &self,
        store: &mut StateStore,
        entity: &EntityRef,
        current: StatusFlags,
        status: VisitorStatus,
    ) -> Result<StatusFlags, WorkflowError> {
        let disapproved = store.is_disapproved(entity);
        if !available_actions(&current, disapproved).contains(&status.into()) {
            return Err(WorkflowError::NotAvailable {
                status,
                state: current.label(disapproved).to_string(),
            });
        }

        self.send(entity, status).await?;

        let next = current.after(status);
        match status {
            VisitorStatus::Approve | VisitorStatus::Complete => store.set_disapproved(entity, false)?,
            VisitorStatus::Disapprove => store.set_disapproved(entity, true)?,
            VisitorStatus::Exit => {}
        }
        commit_cached(store, entity, next)?;

        tracing::info!("{} is now {}", entity, next.label(store.is_disapproved(entity)));
        Ok(next)
    }
}

/// Write `flags` into the cached copy of `entity`, if one is cached.
fn commit_cached(store: &mut StateStore, entity: &EntityRef, flags: StatusFlags) -> Result<(), WorkflowError> {
    let key = cache_key(entity.kind);
    let mut items = store.cached(key).to_vec();

    let Some(item) = items.iter_mut().find(|item| {
        item.get("id")
            .map(|id| match id {
                Value::String(s) => *s == entity.id,
                other => other.to_string() == entity.id,
            })
            .unwrap_or(false)
    }) else {
        return Ok(());
    };

    if let (Some(obj), Value::Object(patch)) = (item.as_object_mut(), serde_json::to_value(flags).map_err(ClientError::from)?) {
        obj.extend(patch);
    }
    store.put_cache(key, items)?;
    Ok(())
}
