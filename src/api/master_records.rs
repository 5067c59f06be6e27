use serde_json::Value;

use crate::client::{endpoint_with_query, ResourceClient};
use crate::error::ClientError;

/// Every previously registered visitor.
pub async fn list(client: &ResourceClient) -> Result<Vec<Value>, ClientError> {
    client.get_json("master-records").await
}

/// The master record for a contact number, if the visitor has been here before.
pub async fn by_contact(client: &ResourceClient, contact_number: &str) -> Result<Option<Value>, ClientError> {
    let endpoint = endpoint_with_query("master-records/by-contact", &[("contactnumber", contact_number)]);
    match client.get_json::<Value>(&endpoint).await {
        Ok(Value::Null) => Ok(None),
        Ok(record) => Ok(Some(record)),
        Err(e) if e.status_code() == Some(404) => Ok(None),
        Err(e) => Err(e),
    }
}
