//! Approval lifecycle and guarded form submission.

pub mod status;
pub mod submit;

pub use status::{
    available_actions, status_endpoint, status_payload, StatusFlags, StatusWorkflow, VisitAction,
    VisitorStatus,
};
pub use submit::{FormSubmitter, SubmitError};

use thiserror::Error;

use crate::error::ClientError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Cannot {status}: visitor is {state}")]
    NotAvailable { status: VisitorStatus, state: String },

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
