//! User roles and the permission records attached to them.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::{endpoint_with_query, ApiResponse, ResourceClient};
use crate::error::ClientError;
use crate::permissions::PermissionRecord;
use crate::types::RecordId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: RecordId,
    #[serde(rename = "userRoleName", alias = "UserRoleName", default)]
    pub name: String,
    #[serde(rename = "active", alias = "Active", default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub permissions: Vec<PermissionRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body for create and update. The server expects Pascal-case names here.
#[derive(Debug, Clone, Serialize)]
pub struct RoleInput {
    #[serde(rename = "UserRoleName")]
    pub name: String,
    #[serde(rename = "Active", skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    pub permissions: Vec<PermissionRecord>,
}

#[derive(Debug, Deserialize)]
struct RolesBody {
    roles: Vec<Role>,
}

pub async fn list(
    client: &ResourceClient,
    page: u32,
    limit: u32,
    search: Option<&str>,
) -> Result<Vec<Role>, ClientError> {
    let (page, limit) = (page.to_string(), limit.to_string());
    let endpoint = endpoint_with_query(
        "userroles",
        &[
            ("page", page.as_str()),
            ("limit", limit.as_str()),
            ("search", search.unwrap_or("")),
            ("sortBy", "userRoleName"),
            ("sortOrder", "asc"),
        ],
    );

    let body = client.request(&endpoint, Method::GET, None).await?.into_value();
    serde_json::from_value::<RolesBody>(body)
        .map(|b| b.roles)
        .map_err(|_| ClientError::UnexpectedShape("expected an object with a roles array".into()))
}

pub async fn get(client: &ResourceClient, id: &RecordId) -> Result<Role, ClientError> {
    client.get_json(&format!("userroles/{}", id)).await
}

/// Every module name a role can carry permissions for.
pub async fn all_permissions(client: &ResourceClient) -> Result<Vec<Value>, ClientError> {
    client.get_json("userroles/permissions/all").await
}

fn checked(input: &RoleInput) -> Result<Value, ClientError> {
    if input.name.trim().is_empty() {
        return Err(ClientError::Validation("Role name is required".into()));
    }
    Ok(serde_json::to_value(input)?)
}

pub async fn create(client: &ResourceClient, input: &RoleInput) -> Result<ApiResponse, ClientError> {
    let body = checked(input)?;
    client.request("userroles", Method::POST, Some(&body)).await
}

pub async fn update(client: &ResourceClient, id: &RecordId, input: &RoleInput) -> Result<ApiResponse, ClientError> {
    let body = checked(input)?;
    client
        .request(&format!("userroles/{}", id), Method::PUT, Some(&body))
        .await
}

pub async fn delete(client: &ResourceClient, id: &RecordId) -> Result<ApiResponse, ClientError> {
    client.delete(&format!("userroles/{}", id)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_accepts_either_casing() {
        let role: Role = serde_json::from_value(json!({
            "id": 3,
            "UserRoleName": "Security",
            "Active": true,
            "permissions": [{ "name": "SpotEntry", "canRead": true }]
        }))
        .unwrap();
        assert_eq!(role.name, "Security");
        assert_eq!(role.active, Some(true));
        assert!(role.permissions[0].can_read);
        assert!(!role.permissions[0].can_delete);
    }

    #[test]
    fn test_input_requires_name() {
        let input = RoleInput { name: " ".into(), active: None, permissions: vec![] };
        assert!(checked(&input).is_err());

        let input = RoleInput { name: "Guard".into(), active: Some(false), permissions: vec![] };
        assert_eq!(
            checked(&input).unwrap(),
            json!({ "UserRoleName": "Guard", "Active": false, "permissions": [] })
        );
    }
}
