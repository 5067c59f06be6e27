//! Session lifecycle: login writes the token and the full permission list,
//! the guard gates protected screens, sign-out clears everything.

pub mod guard;

pub use guard::{page_identifier, GuardDecision, SessionGuard};

use thiserror::Error;

use crate::api::auth::{self, LoginRequest};
use crate::client::ResourceClient;
use crate::error::ClientError;
use crate::store::{Session, StateStore, StoreError};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Authenticate and replace the stored session with the response's token,
/// role, user name and permission list.
pub async fn login(
    client: &ResourceClient,
    store: &mut StateStore,
    user_name: &str,
    password: &str,
) -> Result<Session, SessionError> {
    if user_name.trim().is_empty() {
        return Err(ClientError::Validation("Username must be a non-empty string.".into()).into());
    }
    if password.is_empty() {
        return Err(ClientError::Validation("Password cannot be empty.".into()).into());
    }

    let response = auth::login(
        client,
        &LoginRequest {
            user_name: user_name.trim().to_string(),
            password: password.to_string(),
        },
    )
    .await?;

    let session = response.into_session();
    store.begin_session(session.clone())?;
    tracing::info!(
        "Signed in as {} ({} permission records)",
        session.user_name.as_deref().unwrap_or(user_name),
        session.permissions.records().len()
    );
    Ok(session)
}
