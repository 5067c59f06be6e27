use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub retry: RetryConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub health_timeout_secs: u64,
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub attempts: u32,
    pub base_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub sign_in_page: String,
    pub protected_pages: Vec<String>,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Ok(v) = env::var("VMS_API_BASE_URL") {
            self.api.base_url = v;
        }
        if let Ok(v) = env::var("VMS_REQUEST_TIMEOUT_SECS") {
            self.api.request_timeout_secs = v.parse().unwrap_or(self.api.request_timeout_secs);
        }
        if let Ok(v) = env::var("VMS_HEALTH_TIMEOUT_SECS") {
            self.api.health_timeout_secs = v.parse().unwrap_or(self.api.health_timeout_secs);
        }
        if let Ok(v) = env::var("VMS_ACCEPT_INVALID_CERTS") {
            self.api.accept_invalid_certs = v.parse().unwrap_or(self.api.accept_invalid_certs);
        }

        // Retry overrides
        if let Ok(v) = env::var("VMS_RETRY_ATTEMPTS") {
            self.retry.attempts = v.parse().unwrap_or(self.retry.attempts);
        }
        if let Ok(v) = env::var("VMS_RETRY_BASE_MS") {
            self.retry.base_delay_ms = v.parse().unwrap_or(self.retry.base_delay_ms);
        }

        // Session overrides
        if let Ok(v) = env::var("VMS_SIGN_IN_PAGE") {
            self.session.sign_in_page = v;
        }

        self
    }

    fn default_protected_pages() -> Vec<String> {
        [
            "index.html",
            "PreApprovalEntry.html",
            "SpotEntry.html",
            "UserManagement.html",
            "UserRole.html",
            "Dictionarysettings.html",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                base_url: "https://localhost:3001".to_string(),
                request_timeout_secs: 30,
                health_timeout_secs: 5,
                accept_invalid_certs: true,
            },
            retry: RetryConfig {
                attempts: 3,
                base_delay_ms: 1000,
            },
            session: SessionConfig {
                sign_in_page: "signin.html".to_string(),
                protected_pages: Self::default_protected_pages(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                base_url: "https://vms-staging.example.com".to_string(),
                request_timeout_secs: 15,
                health_timeout_secs: 5,
                accept_invalid_certs: false,
            },
            retry: RetryConfig {
                attempts: 3,
                base_delay_ms: 1000,
            },
            session: SessionConfig {
                sign_in_page: "signin.html".to_string(),
                protected_pages: Self::default_protected_pages(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                base_url: "https://vms.example.com".to_string(),
                request_timeout_secs: 10,
                health_timeout_secs: 5,
                accept_invalid_certs: false,
            },
            retry: RetryConfig {
                attempts: 3,
                base_delay_ms: 1000,
            },
            session: SessionConfig {
                sign_in_page: "signin.html".to_string(),
                protected_pages: Self::default_protected_pages(),
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
