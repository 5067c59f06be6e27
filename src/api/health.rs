use serde::{Deserialize, Serialize};

use crate::client::ResourceClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

/// Probe `GET /health` under the client's health timeout. Any 2xx counts as
/// up, whatever the body (some deployments answer in plain text).
pub async fn check(client: &ResourceClient) -> HealthStatus {
    let url = match client.url("health") {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Health check skipped: {}", e);
            return HealthStatus::Down;
        }
    };

    match client
        .http()
        .get(url)
        .timeout(client.health_timeout())
        .send()
        .await
    {
        Ok(response) if response.status().is_success() => HealthStatus::Up,
        Ok(response) => {
            tracing::warn!("Health check returned {}", response.status());
            HealthStatus::Down
        }
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            HealthStatus::Down
        }
    }
}
