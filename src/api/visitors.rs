//! Spot-entry visitors (`/visitors`).

use reqwest::Method;
use serde_json::Value;

use super::{newest_first, with_cache_fallback, Freshness, VisitRecord, VisitUpload};
use crate::client::{ApiResponse, ResourceClient};
use crate::error::ClientError;
use crate::store::{CacheKey, StateStore};
use crate::types::RecordId;

pub async fn fetch_all(client: &ResourceClient) -> Result<Vec<Value>, ClientError> {
    client.get_json("visitors").await
}

/// All visitors, newest first, falling back to the cached list on failure.
pub async fn list(
    client: &ResourceClient,
    store: &mut StateStore,
) -> Result<(Vec<VisitRecord>, Freshness), ClientError> {
    let fetched = fetch_all(client).await;
    let (items, freshness) = with_cache_fallback(store, CacheKey::Visitors, fetched)?;
    Ok((newest_first(items)?, freshness))
}

pub async fn create(client: &ResourceClient, upload: VisitUpload) -> Result<ApiResponse, ClientError> {
    client.multipart("visitors", Method::POST, upload.into_form().await?).await
}

pub async fn update(
    client: &ResourceClient,
    id: &RecordId,
    upload: VisitUpload,
) -> Result<ApiResponse, ClientError> {
    client
        .multipart(&format!("visitors/{}", id), Method::PATCH, upload.into_form().await?)
        .await
}

pub async fn delete(client: &ResourceClient, id: &RecordId) -> Result<ApiResponse, ClientError> {
    client.delete(&format!("visitors/{}", id)).await
}
