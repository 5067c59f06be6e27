//! User accounts (`/users`) and the person-name lookup behind typeahead fields.

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::client::{endpoint_with_query, ApiResponse, ResourceClient};
use crate::error::ClientError;
use crate::types::RecordId;
use crate::validation::{SuggestionSource, UserSuggestion};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: RecordId,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email_id: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body for create and update. `user_role_id` goes over the wire as a number.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub contact_no: String,
    pub email_id: String,
    pub address: String,
    pub user_role_id: i64,
    pub employee_no: String,
    pub department: String,
    pub designation: String,
    pub notes: String,
}

#[derive(Debug, Deserialize)]
struct UsersBody {
    users: Vec<Value>,
}

fn users_of(body: ApiResponse) -> Result<Vec<Value>, ClientError> {
    serde_json::from_value::<UsersBody>(body.into_value())
        .map(|b| b.users)
        .map_err(|_| ClientError::UnexpectedShape("expected an object with a users array".into()))
}

pub async fn list(
    client: &ResourceClient,
    page: u32,
    limit: u32,
    search: Option<&str>,
) -> Result<Vec<User>, ClientError> {
    let (page, limit) = (page.to_string(), limit.to_string());
    let mut query = vec![("page", page.as_str()), ("limit", limit.as_str())];
    if let Some(search) = search.filter(|s| !s.is_empty()) {
        query.push(("search", search));
    }

    let body = client
        .request(&endpoint_with_query("users", &query), Method::GET, None)
        .await?;
    users_of(body)?
        .into_iter()
        .map(|v| serde_json::from_value(v).map_err(ClientError::from))
        .collect()
}

pub async fn search(client: &ResourceClient, query: &str) -> Result<Vec<UserSuggestion>, ClientError> {
    let body = client
        .request(&endpoint_with_query("users/search", &[("query", query)]), Method::GET, None)
        .await?;
    users_of(body)?
        .into_iter()
        .map(|v| serde_json::from_value(v).map_err(ClientError::from))
        .collect()
}

#[async_trait]
impl SuggestionSource for ResourceClient {
    async fn suggest(&self, query: &str) -> Result<Vec<UserSuggestion>, ClientError> {
        search(self, query).await
    }
}

pub async fn create(client: &ResourceClient, input: &UserInput) -> Result<ApiResponse, ClientError> {
    if input.password.as_deref().unwrap_or("").is_empty() {
        return Err(ClientError::Validation("Password is required".into()));
    }
    let body = serde_json::to_value(input)?;
    client.request("users", Method::POST, Some(&body)).await
}

pub async fn update(client: &ResourceClient, id: &RecordId, input: &UserInput) -> Result<ApiResponse, ClientError> {
    let body = serde_json::to_value(input)?;
    client.request(&format!("users/{}", id), Method::PATCH, Some(&body)).await
}

pub async fn delete(client: &ResourceClient, id: &RecordId) -> Result<ApiResponse, ClientError> {
    client.delete(&format!("users/{}", id)).await
}

/// Flip `user.is_active` in place, then PATCH the new value. When the request
/// fails the flag is restored and the error returned.
pub async fn toggle_active(client: &ResourceClient, user: &mut User) -> Result<ApiResponse, ClientError> {
    let previous = user.is_active;
    user.is_active = !previous;

    let body = json!({ "isActive": user.is_active });
    match client
        .request(&format!("users/{}/toggle", user.id), Method::PATCH, Some(&body))
        .await
    {
        Ok(response) => Ok(response),
        Err(e) => {
            tracing::warn!("Toggling user {} failed, rolling back: {}", user.id, e);
            user.is_active = previous;
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_users_shape_checked() {
        let ok = ApiResponse::Json(json!({ "users": [{ "id": 1 }] }));
        assert_eq!(users_of(ok).unwrap().len(), 1);

        let bad = ApiResponse::Json(json!([{ "id": 1 }]));
        assert!(matches!(users_of(bad), Err(ClientError::UnexpectedShape(_))));
    }

    #[test]
    fn test_input_wire_names() {
        let body = serde_json::to_value(UserInput {
            user_name: "jdoe".into(),
            user_role_id: 2,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(body["userName"], json!("jdoe"));
        assert_eq!(body["userRoleId"], json!(2));
        assert!(body.get("password").is_none());
    }
}
