use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::health::HealthStatus;
use crate::permissions::DefaultPolicy;
use crate::store::StateStore;

const POLICY_FILE: &str = "permissions.yaml";
const SERVER_FILE: &str = "server.json";

const DEFAULT_POLICY: &str = "\
# Capabilities for modules missing from the login response.
# Anything not listed here falls back to `fallback`.
fallback:
  canRead: false
  canCreate: false
  canUpdate: false
  canDelete: false
modules: {}
";

/// Last health check of the configured API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerState {
    pub base_url: String,
    pub last_ping: Option<DateTime<Utc>>,
    pub status: Option<HealthStatus>,
}

impl ServerState {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            last_ping: None,
            status: None,
        }
    }

    pub fn update_ping(&mut self, status: HealthStatus) {
        self.last_ping = Some(Utc::now());
        self.status = Some(status);
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("VMS_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("vms").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn open_store(config_dir: &Path) -> anyhow::Result<StateStore> {
    Ok(StateStore::open(config_dir)?)
}

/// Load the fallback permission policy, fail-closed when the file is absent.
pub fn load_policy(config_dir: &Path) -> anyhow::Result<DefaultPolicy> {
    let policy_file = config_dir.join(POLICY_FILE);

    if !policy_file.exists() {
        return Ok(DefaultPolicy::fail_closed());
    }

    let content = fs::read_to_string(&policy_file)?;
    DefaultPolicy::from_yaml(&content)
        .map_err(|e| anyhow::anyhow!("Invalid {}: {}", policy_file.display(), e))
}

/// Write the default files that are missing. Returns the files created.
pub fn init_config_dir(config_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut created = Vec::new();

    let policy_file = config_dir.join(POLICY_FILE);
    if !policy_file.exists() {
        fs::write(&policy_file, DEFAULT_POLICY)?;
        created.push(policy_file);
    }

    Ok(created)
}

pub fn load_server_state(config_dir: &Path, base_url: &str) -> anyhow::Result<ServerState> {
    let server_file = config_dir.join(SERVER_FILE);

    if !server_file.exists() {
        return Ok(ServerState::new(base_url));
    }

    let content = fs::read_to_string(server_file)?;
    let state: ServerState = serde_json::from_str(&content)?;
    // A different base URL means the recorded ping is for another server
    if state.base_url != base_url {
        return Ok(ServerState::new(base_url));
    }
    Ok(state)
}

pub fn save_server_state(config_dir: &Path, state: &ServerState) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(state)?;
    fs::write(config_dir.join(SERVER_FILE), content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::Action;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vms-cli-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_default_policy_file_is_fail_closed() {
        let dir = temp_dir().join("policy");
        fs::create_dir_all(&dir).unwrap();

        assert_eq!(load_policy(&dir).unwrap(), DefaultPolicy::fail_closed());

        let created = init_config_dir(&dir).unwrap();
        assert_eq!(created.len(), 1);
        assert!(init_config_dir(&dir).unwrap().is_empty());

        let policy = load_policy(&dir).unwrap();
        assert!(!policy.for_module("Dashboard").allows(Action::Read));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_server_state_resets_on_new_url() {
        let dir = temp_dir().join("server");
        fs::create_dir_all(&dir).unwrap();

        let mut state = ServerState::new("https://a.example");
        state.update_ping(HealthStatus::Up);
        save_server_state(&dir, &state).unwrap();

        assert_eq!(load_server_state(&dir, "https://a.example").unwrap().status, Some(HealthStatus::Up));
        assert!(load_server_state(&dir, "https://b.example").unwrap().status.is_none());
        fs::remove_dir_all(&dir).ok();
    }
}
