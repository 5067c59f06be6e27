use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::ResourceClient;
use crate::error::ClientError;
use crate::permissions::PermissionSet;
use crate::store::Session;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    #[serde(default)]
    pub user_name: Option<String>,
    // Either a role name or a role object depending on server version
    #[serde(default)]
    pub role: Option<Value>,
    #[serde(default)]
    pub permissions: PermissionSet,
}

impl LoginResponse {
    pub fn into_session(self) -> Session {
        let role = self.user.role.and_then(|role| match role {
            Value::String(name) => Some(name),
            Value::Null => None,
            Value::Object(ref obj) => obj
                .get("userRoleName")
                .or_else(|| obj.get("name"))
                .and_then(Value::as_str)
                .map(str::to_owned)
                .or_else(|| Some(role.to_string())),
            other => Some(other.to_string()),
        });

        Session {
            token: self.token,
            role,
            user_name: self.user.user_name,
            permissions: self.user.permissions,
        }
    }
}

pub async fn login(client: &ResourceClient, request: &LoginRequest) -> Result<LoginResponse, ClientError> {
    client.send_json("auth/login", Method::POST, request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::Action;
    use serde_json::json;

    #[test]
    fn test_login_payload_becomes_session() {
        let response: LoginResponse = serde_json::from_value(json!({
            "token": "t0k3n",
            "user": {
                "userName": "reception",
                "role": "Receptionist",
                "permissions": [
                    { "name": "SpotEntry", "canRead": true, "canCreate": true, "canUpdate": false, "canDelete": false }
                ]
            }
        }))
        .unwrap();

        let session = response.into_session();
        assert_eq!(session.token, "t0k3n");
        assert_eq!(session.role.as_deref(), Some("Receptionist"));
        assert_eq!(session.user_name.as_deref(), Some("reception"));
        let record = session.permissions.get("SpotEntry").unwrap();
        assert!(record.allows(Action::Create));
        assert!(!record.allows(Action::Delete));
    }

    #[test]
    fn test_role_object_uses_name() {
        let response: LoginResponse = serde_json::from_value(json!({
            "token": "t",
            "user": { "role": { "id": 1, "userRoleName": "Admin" } }
        }))
        .unwrap();
        assert_eq!(response.into_session().role.as_deref(), Some("Admin"));
    }

    #[test]
    fn test_request_uses_camel_case() {
        let body = serde_json::to_value(LoginRequest {
            user_name: "a".into(),
            password: "b".into(),
        })
        .unwrap();
        assert_eq!(body, json!({ "userName": "a", "password": "b" }));
    }
}
