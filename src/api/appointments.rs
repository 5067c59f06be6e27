//! Pre-approved appointments (`/appointment`) and the visitor-facing
//! NDA and safety acknowledgements.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{newest_first, with_cache_fallback, Freshness, VisitRecord, VisitUpload};
use crate::client::{endpoint_with_query, ApiResponse, ResourceClient};
use crate::error::ClientError;
use crate::store::{CacheKey, StateStore};
use crate::types::RecordId;

#[derive(Debug, Clone, Deserialize)]
struct PageBody {
    data: Vec<Value>,
    total: u64,
}

/// One page of appointments, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentPage {
    pub records: Vec<VisitRecord>,
    /// Server-side total; the cached page's length when served from cache.
    pub total: u64,
    pub freshness: Freshness,
}

async fn fetch_page(client: &ResourceClient, page: u32, limit: u32) -> Result<PageBody, ClientError> {
    let endpoint = endpoint_with_query(
        "appointment",
        &[("page", &page.to_string()), ("limit", &limit.to_string())],
    );
    let body = client.request(&endpoint, Method::GET, None).await?.into_value();
    serde_json::from_value(body).map_err(|_| ClientError::UnexpectedShape("expected { data, total }".into()))
}

/// One page of appointments, falling back to the last cached page when the
/// fetch fails.
pub async fn list(
    client: &ResourceClient,
    store: &mut StateStore,
    page: u32,
    limit: u32,
) -> Result<AppointmentPage, ClientError> {
    let (total, fetched) = match fetch_page(client, page, limit).await {
        Ok(body) => (Some(body.total), Ok(body.data)),
        Err(e) => (None, Err(e)),
    };
    let (items, freshness) = with_cache_fallback(store, CacheKey::Appointments, fetched)?;

    Ok(AppointmentPage {
        total: total.unwrap_or(items.len() as u64),
        records: newest_first(items)?,
        freshness,
    })
}

pub async fn get(client: &ResourceClient, id: &RecordId) -> Result<VisitRecord, ClientError> {
    client.get_json(&format!("appointment/{}", id)).await
}

pub async fn create(client: &ResourceClient, upload: VisitUpload) -> Result<ApiResponse, ClientError> {
    client
        .multipart("appointment/create", Method::POST, upload.into_form().await?)
        .await
}

/// Replace the appointment's details ("Save").
pub async fn update(
    client: &ResourceClient,
    id: &RecordId,
    upload: VisitUpload,
) -> Result<ApiResponse, ClientError> {
    client
        .multipart(&format!("appointment/{}", id), Method::PUT, upload.into_form().await?)
        .await
}

pub async fn save_note(client: &ResourceClient, id: &RecordId, note: &str) -> Result<ApiResponse, ClientError> {
    let body = json!({ "notes": note });
    client
        .request(&format!("appointment/{}", id), Method::PUT, Some(&body))
        .await
}

/// Identifies one visit from the visitor's side: the invitation email plus
/// the scheduled date and time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitKey {
    pub email: String,
    pub date: String,
    pub time: String,
}

impl VisitKey {
    fn query(&self, path: &str) -> String {
        endpoint_with_query(
            path,
            &[("email", &self.email), ("date", &self.date), ("time", &self.time)],
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Acknowledgement {
    Nda,
    Safety,
    /// The visitor's own verification form.
    Form,
}

impl Acknowledgement {
    fn status_path(&self) -> &'static str {
        match self {
            Acknowledgement::Nda => "appointment/nda-status",
            Acknowledgement::Safety => "appointment/safety-status",
            Acknowledgement::Form => "appointment/check-status",
        }
    }

    fn status_field(&self) -> &'static str {
        match self {
            Acknowledgement::Nda => "isNdaCompleted",
            Acknowledgement::Safety => "isSafetyCompleted",
            Acknowledgement::Form => "isFormCompleted",
        }
    }
}

/// Whether the visitor has completed `kind` for the visit.
pub async fn is_completed(
    client: &ResourceClient,
    key: &VisitKey,
    kind: Acknowledgement,
) -> Result<bool, ClientError> {
    let body: Value = client.get_json(&key.query(kind.status_path())).await?;
    body.get(kind.status_field())
        .and_then(Value::as_bool)
        .ok_or_else(|| ClientError::UnexpectedShape(format!("missing {}", kind.status_field())))
}

pub async fn submit_nda(client: &ResourceClient, key: &VisitKey, agreed: bool) -> Result<ApiResponse, ClientError> {
    let body = json!({ "email": key.email, "date": key.date, "time": key.time, "ndaApproved": agreed });
    client.request("appointment/nda", Method::PATCH, Some(&body)).await
}

pub async fn submit_safety(
    client: &ResourceClient,
    key: &VisitKey,
    agreed: bool,
) -> Result<ApiResponse, ClientError> {
    // Field name is misspelled on the server side
    let body = json!({ "email": key.email, "date": key.date, "time": key.time, "SaftyApproval": agreed });
    client.request("appointment/safety", Method::PATCH, Some(&body)).await
}
