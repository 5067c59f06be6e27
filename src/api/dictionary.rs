//! Lookup lists managed on the dictionary settings screen.

use clap::ValueEnum;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

use crate::client::{ApiResponse, ResourceClient};
use crate::error::ClientError;
use crate::types::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DictionaryKind {
    Gender,
    Department,
    Designation,
    VisitorType,
    PurposeOfVisit,
    TimeDurationUnit,
}

impl DictionaryKind {
    pub const ALL: [DictionaryKind; 6] = [
        DictionaryKind::Gender,
        DictionaryKind::Department,
        DictionaryKind::Designation,
        DictionaryKind::VisitorType,
        DictionaryKind::PurposeOfVisit,
        DictionaryKind::TimeDurationUnit,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            DictionaryKind::Gender => "gender",
            DictionaryKind::Department => "department",
            DictionaryKind::Designation => "designation",
            DictionaryKind::VisitorType => "visitor-type",
            DictionaryKind::PurposeOfVisit => "purpose-of-visit",
            DictionaryKind::TimeDurationUnit => "time-duration-unit",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DictionaryKind::Gender => "Gender",
            DictionaryKind::Department => "Department",
            DictionaryKind::Designation => "Designation",
            DictionaryKind::VisitorType => "Visitor Type",
            DictionaryKind::PurposeOfVisit => "Purpose of Visit",
            DictionaryKind::TimeDurationUnit => "Time Duration Unit",
        }
    }
}

impl fmt::Display for DictionaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub id: RecordId,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn checked_name(kind: DictionaryKind, name: &str) -> Result<Value, ClientError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ClientError::Validation(format!("{} name is required", kind.label())));
    }
    Ok(json!({ "name": name }))
}

pub async fn list(client: &ResourceClient, kind: DictionaryKind) -> Result<Vec<DictionaryEntry>, ClientError> {
    client.get_json(kind.path()).await
}

pub async fn get(client: &ResourceClient, kind: DictionaryKind, id: &RecordId) -> Result<DictionaryEntry, ClientError> {
    client.get_json(&format!("{}/{}", kind.path(), id)).await
}

pub async fn create(client: &ResourceClient, kind: DictionaryKind, name: &str) -> Result<ApiResponse, ClientError> {
    let body = checked_name(kind, name)?;
    client.request(kind.path(), Method::POST, Some(&body)).await
}

pub async fn update(
    client: &ResourceClient,
    kind: DictionaryKind,
    id: &RecordId,
    name: &str,
) -> Result<ApiResponse, ClientError> {
    let body = checked_name(kind, name)?;
    client
        .request(&format!("{}/{}", kind.path(), id), Method::PUT, Some(&body))
        .await
}

pub async fn delete(client: &ResourceClient, kind: DictionaryKind, id: &RecordId) -> Result<ApiResponse, ClientError> {
    client.delete(&format!("{}/{}", kind.path(), id)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(DictionaryKind::VisitorType.path(), "visitor-type");
        assert_eq!(DictionaryKind::TimeDurationUnit.path(), "time-duration-unit");
        assert_eq!(DictionaryKind::ALL.len(), 6);
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(checked_name(DictionaryKind::Gender, "  ").is_err());
        assert_eq!(
            checked_name(DictionaryKind::Gender, " Other ").unwrap(),
            json!({ "name": "Other" })
        );
    }
}
