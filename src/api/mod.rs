//! Typed wrappers over the VMS REST endpoints.
//!
//! Each wrapper is a thin function over [`ResourceClient`](crate::client::ResourceClient);
//! response bodies keep unknown server fields in a flattened `extra` map so
//! nothing the API adds is lost on a round trip.

pub mod appointments;
pub mod auth;
pub mod dashboard;
pub mod dictionary;
pub mod health;
pub mod master_records;
pub mod roles;
pub mod users;
pub mod visitors;

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::error::ClientError;
use crate::store::{CacheKey, StateStore};
use crate::types::{EntityRef, RecordId};
use crate::validation::FormValues;
use crate::workflow::StatusFlags;

/// A visitor or appointment as the API returns it. Form fields keep their
/// lower-case wire names; everything else lands in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub id: RecordId,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    #[serde(default)]
    pub contactnumber: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(flatten)]
    pub status: StatusFlags,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VisitRecord {
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.firstname.as_deref().unwrap_or(""),
            self.lastname.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }
}

/// Decode a JSON array of records, newest (highest id) first.
pub(crate) fn newest_first(items: Vec<Value>) -> Result<Vec<VisitRecord>, ClientError> {
    let mut records = items
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<VisitRecord>, _>>()?;
    records.sort_by_key(|r| std::cmp::Reverse(r.id.ordinal()));
    Ok(records)
}

/// Where a collection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    Live,
    /// The fetch failed and the last cached copy was used.
    Cached,
}

/// Cache a successful fetch under `key`, or fall back to the cached copy when
/// the fetch failed. Fails only when there is nothing cached to fall back to.
pub fn with_cache_fallback(
    store: &mut StateStore,
    key: CacheKey,
    fetched: Result<Vec<Value>, ClientError>,
) -> Result<(Vec<Value>, Freshness), ClientError> {
    match fetched {
        Ok(items) => {
            if let Err(e) = store.put_cache(key, items.clone()) {
                tracing::warn!("Could not cache {:?}: {}", key, e);
            }
            Ok((items, Freshness::Live))
        }
        Err(e) if !store.cached(key).is_empty() => {
            tracing::warn!("Fetching {:?} failed ({}), using cached copy", key, e);
            Ok((store.cached(key).to_vec(), Freshness::Cached))
        }
        Err(e) => Err(e),
    }
}

/// Text fields plus optional photos, as the create/update endpoints expect.
#[derive(Debug, Clone, Default)]
pub struct VisitUpload {
    pub fields: FormValues,
    pub photo: Option<PathBuf>,
    pub driver_photo: Option<PathBuf>,
}

impl VisitUpload {
    pub fn new(fields: FormValues) -> Self {
        Self { fields, ..Default::default() }
    }

    pub async fn into_form(self) -> Result<Form, ClientError> {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        if let Some(path) = &self.photo {
            form = form.part("photo", photo_part(path).await?);
        }
        if let Some(path) = &self.driver_photo {
            form = form.part("driverphoto", photo_part(path).await?);
        }
        Ok(form)
    }
}

pub(crate) fn entity_of(kind: crate::types::EntityKind, id: &RecordId) -> EntityRef {
    EntityRef { kind, id: id.to_string() }
}

/// Read an image file into a multipart part. Only jpg/jpeg/png are accepted.
pub async fn photo_part(path: &Path) -> Result<Part, ClientError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let mime = match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => {
            return Err(ClientError::Validation(format!(
                "{} must be a JPG or PNG image",
                path.display()
            )))
        }
    };

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ClientError::Validation(format!("Cannot read {}: {}", path.display(), e)))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("photo")
        .to_string();

    Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(mime)
        .map_err(|e| ClientError::Validation(e.to_string()))
}
