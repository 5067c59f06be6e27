use std::collections::HashSet;

use crate::config::SessionConfig;
use crate::store::{StateStore, StoreError};

/// Outcome of checking a screen against the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Navigate to the sign-in screen.
    Redirect(String),
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }
}

/// Last path segment of `path`, `index.html` when the path ends in `/` or is empty.
pub fn page_identifier(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or("");
    match path.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment,
        _ => "index.html",
    }
}

/// Redirects protected screens to sign-in when no session token is present.
///
/// This only keeps signed-out users away from protected screens in this
/// client. It is not an authorization boundary: the API must enforce access
/// on every request.
#[derive(Debug, Clone)]
pub struct SessionGuard {
    protected: HashSet<String>,
    sign_in_page: String,
}

impl SessionGuard {
    pub fn new<I, S>(protected: I, sign_in_page: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            protected: protected.into_iter().map(Into::into).collect(),
            sign_in_page: sign_in_page.into(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.protected_pages.iter().cloned(), config.sign_in_page.clone())
    }

    pub fn sign_in_page(&self) -> &str {
        &self.sign_in_page
    }

    pub fn is_protected(&self, page: &str) -> bool {
        self.protected.contains(page)
    }

    pub fn check(&self, path: &str, store: &StateStore) -> GuardDecision {
        let page = page_identifier(path);
        if self.is_protected(page) && !store.has_session() {
            tracing::info!("No valid token for '{}', redirecting to {}", page, self.sign_in_page);
            return GuardDecision::Redirect(self.sign_in_page.clone());
        }
        GuardDecision::Allow
    }

    /// Clear the session and send the user to sign-in.
    pub fn sign_out(&self, store: &mut StateStore) -> Result<GuardDecision, StoreError> {
        tracing::info!("Signing out");
        store.end_session()?;
        Ok(GuardDecision::Redirect(self.sign_in_page.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::PermissionSet;
    use crate::store::Session;

    const PROTECTED: [&str; 5] = [
        "index.html",
        "PreApprovalEntry.html",
        "SpotEntry.html",
        "UserManagement.html",
        "UserRole.html",
    ];

    fn guard() -> SessionGuard {
        SessionGuard::new(PROTECTED, "signin.html")
    }

    fn signed_in(token: &str) -> StateStore {
        let mut store = StateStore::in_memory();
        store
            .begin_session(Session {
                token: token.into(),
                role: None,
                user_name: None,
                permissions: PermissionSet::default(),
            })
            .unwrap();
        store
    }

    #[test]
    fn test_page_identifier() {
        assert_eq!(page_identifier("/vms/PreApprovalEntry.html"), "PreApprovalEntry.html");
        assert_eq!(page_identifier("/vms/"), "index.html");
        assert_eq!(page_identifier(""), "index.html");
        assert_eq!(page_identifier("/UserRole.html?page=2"), "UserRole.html");
    }

    #[test]
    fn test_protected_pages_redirect_without_token() {
        let store = StateStore::in_memory();
        for page in PROTECTED {
            assert_eq!(
                guard().check(&format!("/app/{}", page), &store),
                GuardDecision::Redirect("signin.html".into())
            );
        }
    }

    #[test]
    fn test_any_non_empty_token_allows() {
        let store = signed_in("x");
        for page in PROTECTED {
            assert!(guard().check(page, &store).is_allowed());
        }

        let blank = signed_in("  ");
        assert!(!guard().check("index.html", &blank).is_allowed());
    }

    #[test]
    fn test_unprotected_pages_always_allowed() {
        let store = StateStore::in_memory();
        assert!(guard().check("/signin.html", &store).is_allowed());
        assert!(guard().check("/nda-form.html", &store).is_allowed());
    }

    #[test]
    fn test_sign_out_clears_token() {
        let mut store = signed_in("abc");
        let decision = guard().sign_out(&mut store).unwrap();
        assert_eq!(decision, GuardDecision::Redirect("signin.html".into()));
        assert!(!guard().check("index.html", &store).is_allowed());
    }
}
