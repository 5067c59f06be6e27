//! Application-state store.
//!
//! Holds the session token, role, user name, permission list, per-dataset
//! cached collections and per-entity disapproval flags. Every write is
//! persisted immediately to `state.json` in the store directory; concurrent
//! writers are last-writer-wins.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::permissions::PermissionSet;
use crate::types::EntityRef;

const STATE_FILE: &str = "state.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store contents are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Collections cached as fetch-failure fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CacheKey {
    Visitors,
    AllVisitors,
    ApprovedVisitors,
    DisapprovedVisitors,
    ExitVisitors,
    Appointments,
}

/// Credentials and permissions captured from a login response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub role: Option<String>,
    pub user_name: Option<String>,
    pub permissions: PermissionSet,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub permissions: PermissionSet,
    #[serde(default)]
    pub caches: BTreeMap<CacheKey, Vec<Value>>,
    #[serde(default)]
    pub disapproved: BTreeSet<EntityRef>,
}

#[derive(Debug)]
pub struct StateStore {
    path: Option<PathBuf>,
    state: AppState,
}

impl StateStore {
    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: AppState::default(),
        }
    }

    /// Open (or create) the store under `dir`.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }

        let path = dir.join(STATE_FILE);
        let state = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            AppState::default()
        };

        tracing::debug!("Opened state store at {}", path.display());
        Ok(Self {
            path: Some(path),
            state,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The stored token, if it is present and not blank.
    pub fn token(&self) -> Option<&str> {
        self.state
            .token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }

    pub fn has_session(&self) -> bool {
        self.token().is_some()
    }

    pub fn permissions(&self) -> &PermissionSet {
        &self.state.permissions
    }

    /// Replace the whole session in one write. The permission list is never
    /// merged with a previous one, and disapproval flags start empty.
    pub fn begin_session(&mut self, session: Session) -> Result<(), StoreError> {
        self.state.token = Some(session.token);
        self.state.role = session.role;
        self.state.user_name = session.user_name;
        self.state.permissions = session.permissions;
        self.state.disapproved.clear();
        self.save()
    }

    /// Drop the session along with its disapproval flags.
    pub fn end_session(&mut self) -> Result<(), StoreError> {
        self.state.token = None;
        self.state.role = None;
        self.state.user_name = None;
        self.state.permissions = PermissionSet::default();
        self.state.disapproved.clear();
        self.save()
    }

    pub fn cached(&self, key: CacheKey) -> &[Value] {
        self.state
            .caches
            .get(&key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn put_cache(&mut self, key: CacheKey, items: Vec<Value>) -> Result<(), StoreError> {
        self.state.caches.insert(key, items);
        self.save()
    }

    pub fn is_disapproved(&self, entity: &EntityRef) -> bool {
        self.state.disapproved.contains(entity)
    }

    pub fn set_disapproved(&mut self, entity: &EntityRef, flag: bool) -> Result<(), StoreError> {
        let changed = if flag {
            self.state.disapproved.insert(entity.clone())
        } else {
            self.state.disapproved.remove(entity)
        };

        if changed {
            self.save()?;
        }
        Ok(())
    }

    fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let content = serde_json::to_string_pretty(&self.state)?;
        fs::write(path, content)?;
        tracing::debug!("Saved state store to {}", path.display());
        Ok(())
    }
}
