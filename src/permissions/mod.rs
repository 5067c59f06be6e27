//! Per-module permission records and the resolver that answers
//! "can the current user perform this action on this module".
//!
//! Records are written once at login and read-only until the next login or
//! sign-out. Absent modules resolve through an explicit [`DefaultPolicy`]
//! instead of a per-screen guess.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The four capabilities a permission record grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    #[default]
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn verb(&self) -> &'static str {
        match self {
            Action::Read => "view",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Read => "canRead",
            Action::Create => "canCreate",
            Action::Update => "canUpdate",
            Action::Delete => "canDelete",
        })
    }
}

/// One named bundle of capabilities, as delivered in the login payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRecord {
    pub name: String,
    #[serde(default)]
    pub can_read: bool,
    #[serde(default)]
    pub can_create: bool,
    #[serde(default)]
    pub can_update: bool,
    #[serde(default)]
    pub can_delete: bool,
}

impl PermissionRecord {
    pub fn uniform(name: impl Into<String>, allowed: bool) -> Self {
        Self {
            name: name.into(),
            can_read: allowed,
            can_create: allowed,
            can_update: allowed,
            can_delete: allowed,
        }
    }

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Read => self.can_read,
            Action::Create => self.can_create,
            Action::Update => self.can_update,
            Action::Delete => self.can_delete,
        }
    }
}

/// Capabilities used when a module has no stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    #[serde(default)]
    pub can_read: bool,
    #[serde(default)]
    pub can_create: bool,
    #[serde(default)]
    pub can_update: bool,
    #[serde(default)]
    pub can_delete: bool,
}

impl Capabilities {
    pub const NONE: Capabilities = Capabilities {
        can_read: false,
        can_create: false,
        can_update: false,
        can_delete: false,
    };

    pub const ALL: Capabilities = Capabilities {
        can_read: true,
        can_create: true,
        can_update: true,
        can_delete: true,
    };

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Read => self.can_read,
            Action::Create => self.can_create,
            Action::Update => self.can_update,
            Action::Delete => self.can_delete,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities::NONE
    }
}

/// Fallback policy for modules absent from the stored permission list.
///
/// Fail-closed unless a module is explicitly listed in `modules`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DefaultPolicy {
    #[serde(default)]
    pub fallback: Capabilities,
    #[serde(default)]
    pub modules: BTreeMap<String, Capabilities>,
}

impl DefaultPolicy {
    pub fn fail_closed() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, module: impl Into<String>, caps: Capabilities) -> Self {
        self.modules.insert(module.into(), caps);
        self
    }

    pub fn for_module(&self, module: &str) -> Capabilities {
        self.modules.get(module).copied().unwrap_or(self.fallback)
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }
}

/// The full permission list stored at login.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
    records: Vec<PermissionRecord>,
}

impl PermissionSet {
    pub fn new(records: Vec<PermissionRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[PermissionRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exact-name lookup.
    pub fn get(&self, module: &str) -> Option<&PermissionRecord> {
        self.records.iter().find(|r| r.name == module)
    }

    pub fn can(&self, module: &str, action: Action, policy: &DefaultPolicy) -> bool {
        match self.get(module) {
            Some(record) => record.allows(action),
            None => policy.for_module(module).allows(action),
        }
    }

    /// Resolve `module`, falling back to the first present record in `chain`
    /// before consulting the policy. Dashboard cards use this to inherit the
    /// `Dashboard` record.
    pub fn can_with_fallback(
        &self,
        module: &str,
        chain: &[&str],
        action: Action,
        policy: &DefaultPolicy,
    ) -> bool {
        std::iter::once(module)
            .chain(chain.iter().copied())
            .find_map(|name| self.get(name))
            .map(|record| record.allows(action))
            .unwrap_or_else(|| policy.for_module(module).allows(action))
    }
}

/// Render rule for a permission-gated control: disabled controls stay visible
/// and carry the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Affordance {
    pub enabled: bool,
    pub tooltip: Option<String>,
}

impl Affordance {
    pub fn for_action(allowed: bool, action: Action, subject: &str) -> Self {
        if allowed {
            Self {
                enabled: true,
                tooltip: None,
            }
        } else {
            Self {
                enabled: false,
                tooltip: Some(format!(
                    "You do not have permission to {} {}",
                    action.verb(),
                    subject
                )),
            }
        }
    }

    pub fn resolve(
        permissions: &PermissionSet,
        module: &str,
        action: Action,
        policy: &DefaultPolicy,
        subject: &str,
    ) -> Self {
        Self::for_action(permissions.can(module, action, policy), action, subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> PermissionSet {
        serde_json::from_value(json!([
            { "name": "PreApprovalEntry", "canRead": true, "canCreate": false, "canUpdate": true, "canDelete": false },
            { "name": "Dashboard", "canRead": true, "canCreate": false, "canUpdate": false, "canDelete": false }
        ]))
        .unwrap()
    }

    #[test]
    fn test_stored_record_wins() {
        let set = sample();
        let policy = DefaultPolicy::default().with_module("PreApprovalEntry", Capabilities::NONE);
        assert!(set.can("PreApprovalEntry", Action::Read, &policy));
        assert!(!set.can("PreApprovalEntry", Action::Create, &policy));
        assert!(set.can("PreApprovalEntry", Action::Update, &policy));
        assert!(!set.can("PreApprovalEntry", Action::Delete, &policy));
    }

    #[test]
    fn test_absent_module_uses_policy() {
        let set = sample();
        let closed = DefaultPolicy::fail_closed();
        assert!(!set.can("UserManagement", Action::Read, &closed));

        let open = DefaultPolicy::fail_closed().with_module("UserManagement", Capabilities::ALL);
        assert!(open.for_module("UserManagement").can_delete);
        assert!(set.can("UserManagement", Action::Delete, &open));
        assert!(!set.can("UserRole", Action::Delete, &open));
    }

    #[test]
    fn test_lookup_is_exact() {
        let set = sample();
        assert!(set.get("preapprovalentry").is_none());
        assert!(set.get("PreApprovalEntry ").is_none());
    }

    #[test]
    fn test_fallback_chain() {
        let set = sample();
        let policy = DefaultPolicy::fail_closed();
        assert!(set.can_with_fallback("TotalVisitors", &["Dashboard"], Action::Read, &policy));
        assert!(!set.can_with_fallback("TotalVisitors", &["Dashboard"], Action::Delete, &policy));
        assert!(!set.can_with_fallback("TotalVisitors", &["Missing"], Action::Read, &policy));
    }

    #[test]
    fn test_default_action_is_read() {
        assert_eq!(Action::default(), Action::Read);
    }

    #[test]
    fn test_policy_from_yaml() {
        let policy = DefaultPolicy::from_yaml(
            "fallback:\n  canRead: true\nmodules:\n  Dashboard:\n    canRead: false\n",
        )
        .unwrap();
        assert!(policy.fallback.can_read);
        assert!(!policy.fallback.can_create);
        assert!(!policy.for_module("Dashboard").can_read);
    }

    #[test]
    fn test_disabled_affordance_carries_reason() {
        let set = sample();
        let policy = DefaultPolicy::fail_closed();
        let create = Affordance::resolve(&set, "PreApprovalEntry", Action::Create, &policy, "appointments");
        assert!(!create.enabled);
        assert_eq!(
            create.tooltip.as_deref(),
            Some("You do not have permission to create appointments")
        );

        let update = Affordance::resolve(&set, "PreApprovalEntry", Action::Update, &policy, "appointments");
        assert!(update.enabled);
        assert!(update.tooltip.is_none());
    }
}
