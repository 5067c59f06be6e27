use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::config::{get_config_dir, load_policy, open_store};
use crate::cli::utils::ConsoleNotifier;
use crate::cli::OutputFormat;
use crate::client::{ResourceClient, RetryPolicy};
use crate::config::AppConfig;
use crate::notify::Notifier;
use crate::permissions::{Action, Affordance, DefaultPolicy};
use crate::session::{GuardDecision, SessionGuard};
use crate::store::StateStore;

/// A protected screen: the page identifier the guard checks and the
/// permission module its controls are gated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Screen {
    pub page: &'static str,
    pub module: &'static str,
}

impl Screen {
    pub const DASHBOARD: Screen = Screen { page: "index.html", module: "Dashboard" };
    pub const PRE_APPROVAL: Screen = Screen { page: "PreApprovalEntry.html", module: "PreApprovalEntry" };
    pub const SPOT_ENTRY: Screen = Screen { page: "SpotEntry.html", module: "SpotEntry" };
    pub const DICTIONARY: Screen = Screen { page: "Dictionarysettings.html", module: "Dictionarysettings" };
    pub const USERS: Screen = Screen { page: "UserManagement.html", module: "UserManagement" };
    pub const ROLES: Screen = Screen { page: "UserRole.html", module: "UserRole" };
}

/// The failure was already shown to the user as a toast.
#[derive(Debug)]
pub struct Reported(pub String);

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for Reported {}

/// Everything a command handler needs: settings, session state, the API client.
pub struct Context {
    pub config: &'static AppConfig,
    pub config_dir: PathBuf,
    pub store: StateStore,
    pub policy: DefaultPolicy,
    pub guard: SessionGuard,
    pub client: ResourceClient,
    pub notifier: Arc<dyn Notifier>,
    pub output: OutputFormat,
}

impl Context {
    pub fn load(output: OutputFormat) -> anyhow::Result<Self> {
        let config = crate::config::config();
        let config_dir = get_config_dir()?;
        let store = open_store(&config_dir)?;
        let policy = load_policy(&config_dir)?;
        let client = ResourceClient::from_config(config)?.with_token(store.token());

        tracing::debug!("Using {} with state in {}", client.base_url(), config_dir.display());

        Ok(Self {
            config,
            config_dir,
            store,
            policy,
            guard: SessionGuard::from_config(&config.session),
            client,
            notifier: Arc::new(ConsoleNotifier::new(output)),
            output,
        })
    }

    /// Run the session guard for `screen`.
    pub fn enter(&self, screen: Screen) -> anyhow::Result<()> {
        match self.guard.check(screen.page, &self.store) {
            GuardDecision::Allow => Ok(()),
            GuardDecision::Redirect(sign_in) => Err(anyhow::anyhow!(
                "{}: not signed in (redirect to {}). Run `vms auth login <username>` first",
                screen.page,
                sign_in
            )),
        }
    }

    pub fn affordance(&self, screen: Screen, action: Action, subject: &str) -> Affordance {
        Affordance::resolve(self.store.permissions(), screen.module, action, &self.policy, subject)
    }

    /// Fail with the control's tooltip when `action` is not permitted.
    pub fn authorize(&self, screen: Screen, action: Action, subject: &str) -> anyhow::Result<()> {
        match self.affordance(screen, action, subject).tooltip {
            None => Ok(()),
            Some(reason) => Err(anyhow::anyhow!(reason)),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_config(&self.config.retry)
    }

    /// Re-create the client after the session token changed.
    pub fn refresh_client(&mut self) -> anyhow::Result<()> {
        self.client = ResourceClient::from_config(self.config)?.with_token(self.store.token());
        Ok(())
    }
}
